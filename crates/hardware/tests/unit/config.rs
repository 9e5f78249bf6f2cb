//! Configuration Unit Tests.
//!
//! Defaults, JSON loading with partial documents, write policy spellings and the
//! geometry checks run before any level is built.

use std::io::Write;

use pretty_assertions::assert_eq;
use rstest::rstest;

use memsim_core::common::MemError;
use memsim_core::config::{CacheConfig, Config, ConfigError, WritePolicy};

#[test]
fn defaults_describe_reference_hierarchy() {
    let config = Config::default();
    let [l1, l2] = config.cache.levels.as_slice() else {
        panic!("expected two levels");
    };

    assert_eq!((l1.size_bytes, l1.ways, l1.latency), (64, 2, 1));
    assert_eq!(l1.policy, WritePolicy::WriteThrough);
    assert_eq!(l1.sets(), 32);
    assert_eq!((l2.size_bytes, l2.ways, l2.latency), (256, 4, 10));
    assert_eq!(l2.policy, WritePolicy::WriteBack);
    assert_eq!(l2.sets(), 64);
    assert_eq!(config.memory.capacity, 1024);
    assert_eq!(config.memory.latency, 100);
    assert_eq!(config.general.max_steps, 100_000);
    assert!(!config.general.trace_accesses);
    assert!(config.validate().is_ok());
}

#[test]
fn empty_document_is_default() {
    assert_eq!(Config::from_json_str("{}").unwrap(), Config::default());
}

#[test]
fn partial_level_fills_defaults() {
    let config = Config::from_json_str(
        r#"{ "cache": { "levels": [ { "name": "only", "size_bytes": 16, "ways": 4 } ] } }"#,
    )
    .unwrap();
    let level = &config.cache.levels[0];
    assert_eq!(level.name, "only");
    assert_eq!(level.line_bytes, 1);
    assert_eq!(level.policy, WritePolicy::WriteThrough);
    assert_eq!(level.latency, 1);
    assert_eq!(config.memory.capacity, 1024);
}

#[test]
fn explicit_empty_level_list_is_kept() {
    let config = Config::from_json_str(r#"{ "cache": { "levels": [] } }"#).unwrap();
    assert!(config.cache.levels.is_empty());
}

#[rstest]
#[case("write-through", WritePolicy::WriteThrough)]
#[case("WriteThrough", WritePolicy::WriteThrough)]
#[case("write_back", WritePolicy::WriteBack)]
#[case("write-back", WritePolicy::WriteBack)]
#[case("WriteBack", WritePolicy::WriteBack)]
fn write_policy_spellings(#[case] text: &str, #[case] expected: WritePolicy) {
    let policy: WritePolicy = serde_json::from_str(&format!("\"{text}\"")).unwrap();
    assert_eq!(policy, expected);
}

#[test]
fn policy_serializes_kebab_case() {
    let json = serde_json::to_string(&WritePolicy::WriteBack).unwrap();
    assert_eq!(json, "\"write-back\"");
}

#[rstest]
#[case(0, 1, 1, "size must be positive")]
#[case(8, 0, 1, "associativity must be positive")]
#[case(8, 1, 0, "line size must be positive")]
#[case(8, 1, 2, "line size 2 unsupported")]
#[case(6, 4, 1, "associativity 4 does not divide 6 lines")]
fn invalid_geometry_is_rejected(
    #[case] size: usize,
    #[case] ways: usize,
    #[case] line: usize,
    #[case] message: &str,
) {
    let level = CacheConfig {
        name: "Lx".to_string(),
        size_bytes: size,
        line_bytes: line,
        ways,
        policy: WritePolicy::WriteBack,
        latency: 3,
    };
    let err = level.validate().unwrap_err();
    let MemError::Configuration { level, reason } = &err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(level, "Lx");
    assert!(reason.contains(message), "{reason}");
}

#[test]
fn zero_capacity_memory_is_rejected() {
    let err = Config::from_json_str(r#"{ "memory": { "capacity": 0 } }"#).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid(MemError::Configuration { .. })
    ));
}

#[test]
fn malformed_json_is_a_json_error() {
    let err = Config::from_json_str(r#"{ "memory": "#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
    let err = Config::from_json_str(r#"{ "memory": { "latency": "fast" } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "general": {{ "max_steps": 7 }}, "memory": {{ "capacity": 64, "latency": 20 }} }}"#
    )
    .unwrap();

    let config = Config::from_json_file(file.path()).unwrap();
    assert_eq!(config.general.max_steps, 7);
    assert_eq!(config.memory.capacity, 64);
    assert_eq!(config.memory.latency, 20);
    assert_eq!(config.cache, Config::default().cache);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn json_round_trips_through_serde() {
    let config = Config::default();
    let text = serde_json::to_string_pretty(&config).unwrap();
    assert_eq!(Config::from_json_str(&text).unwrap(), config);
}

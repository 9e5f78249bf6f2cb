//! Configuration system for the memory hierarchy simulator.
//!
//! This module defines all configuration structures used to build a simulator. It provides:
//! 1. **Defaults:** The reference geometry (64-unit write-through L1, 256-unit write-back L2,
//!    1024-unit main store) and executor limits.
//! 2. **Structures:** General, cache hierarchy and main memory configuration.
//! 3. **Validation:** Construction-time checks that reject inconsistent geometry before any
//!    level is built.
//!
//! Configuration is supplied as JSON (`Config::from_json_str` / `Config::from_json_file`) or
//! via `Config::default()`. Once a hierarchy has been built from it, it is never consulted again.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::MemError;

/// Default configuration constants for the simulator.
mod defaults {
    /// L1 capacity in units.
    pub const L1_SIZE: usize = 64;

    /// L1 associativity.
    pub const L1_WAYS: usize = 2;

    /// L1 access latency in nanoseconds.
    pub const L1_LATENCY: u64 = 1;

    /// L2 capacity in units.
    pub const L2_SIZE: usize = 256;

    /// L2 associativity.
    pub const L2_WAYS: usize = 4;

    /// L2 access latency in nanoseconds.
    pub const L2_LATENCY: u64 = 10;

    /// Units held by one cache line. Only single-unit lines are modelled.
    pub const LINE_UNITS: usize = 1;

    /// Main store capacity in units.
    pub const MEMORY_CAPACITY: usize = 1024;

    /// Main store access latency in nanoseconds.
    pub const MEMORY_LATENCY: u64 = 100;

    /// Executor step budget before a run is aborted.
    pub const MAX_STEPS: u64 = 100_000;
}

/// Write policy of a single cache level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Every write is forwarded to the next level immediately.
    #[default]
    #[serde(alias = "WriteThrough", alias = "write_through")]
    WriteThrough,
    /// Writes stay in this level, marked dirty, until eviction or flush.
    #[serde(alias = "WriteBack", alias = "write_back")]
    WriteBack,
}

/// Errors produced while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration text is not valid JSON for [`Config`].
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The configuration parsed but describes an impossible hierarchy.
    #[error(transparent)]
    Invalid(#[from] MemError),
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use memsim_core::config::{Config, WritePolicy};
///
/// let config = Config::default();
/// assert_eq!(config.cache.levels.len(), 2);
/// assert_eq!(config.cache.levels[1].policy, WritePolicy::WriteBack);
/// assert_eq!(config.memory.capacity, 1024);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use memsim_core::config::{Config, WritePolicy};
///
/// let json = r#"{
///     "general": { "trace_accesses": true },
///     "cache": {
///         "levels": [
///             { "name": "L1", "size_bytes": 8, "ways": 2, "policy": "write-back", "latency": 2 }
///         ]
///     },
///     "memory": { "capacity": 64, "latency": 50 }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert!(config.general.trace_accesses);
/// assert_eq!(config.cache.levels[0].policy, WritePolicy::WriteBack);
/// assert_eq!(config.cache.levels[0].sets(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Cache hierarchy configuration
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
    /// Main store configuration
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed input and [`ConfigError::Invalid`] when
    /// the described hierarchy fails [`Config::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`Config::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks every level and the main store for consistent geometry.
    ///
    /// # Errors
    ///
    /// Returns the first [`MemError::Configuration`] found, naming the offending level.
    pub fn validate(&self) -> Result<(), MemError> {
        for level in &self.cache.levels {
            level.validate()?;
        }
        self.memory.validate()
    }
}

/// General simulation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Record every demand access in the simulator's in-memory trace.
    #[serde(default)]
    pub trace_accesses: bool,

    /// Number of executed instructions after which a run is aborted.
    #[serde(default = "GeneralConfig::default_max_steps")]
    pub max_steps: u64,
}

impl GeneralConfig {
    /// Returns the default step budget.
    fn default_max_steps() -> u64 {
        defaults::MAX_STEPS
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_accesses: false,
            max_steps: defaults::MAX_STEPS,
        }
    }
}

/// Cache hierarchy configuration: levels ordered from the CPU outwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheHierarchyConfig {
    /// Cache levels, top (closest to the executor) first.
    #[serde(default = "CacheHierarchyConfig::default_levels")]
    pub levels: Vec<CacheConfig>,
}

impl CacheHierarchyConfig {
    /// Returns the reference two-level hierarchy.
    fn default_levels() -> Vec<CacheConfig> {
        vec![CacheConfig::l1(), CacheConfig::l2()]
    }
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            levels: Self::default_levels(),
        }
    }
}

/// Individual cache level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Display name used in statistics, snapshots and errors
    #[serde(default = "CacheConfig::default_name")]
    pub name: String,

    /// Total capacity in addressable units
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,

    /// Units per cache line (only 1 is supported)
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,

    /// Associativity (number of ways)
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,

    /// Write policy
    #[serde(default)]
    pub policy: WritePolicy,

    /// Access latency in nanoseconds
    #[serde(default = "CacheConfig::default_latency")]
    pub latency: u64,
}

impl CacheConfig {
    /// Reference L1: 64 units, 2-way, write-through, 1 ns.
    pub fn l1() -> Self {
        Self {
            name: "L1".to_string(),
            size_bytes: defaults::L1_SIZE,
            line_bytes: defaults::LINE_UNITS,
            ways: defaults::L1_WAYS,
            policy: WritePolicy::WriteThrough,
            latency: defaults::L1_LATENCY,
        }
    }

    /// Reference L2: 256 units, 4-way, write-back, 10 ns.
    pub fn l2() -> Self {
        Self {
            name: "L2".to_string(),
            size_bytes: defaults::L2_SIZE,
            line_bytes: defaults::LINE_UNITS,
            ways: defaults::L2_WAYS,
            policy: WritePolicy::WriteBack,
            latency: defaults::L2_LATENCY,
        }
    }

    /// Number of sets implied by the geometry.
    ///
    /// Only meaningful after [`CacheConfig::validate`] has succeeded.
    pub const fn sets(&self) -> usize {
        self.size_bytes / (self.ways * self.line_bytes)
    }

    /// Checks that the level's geometry is positive and self-consistent.
    ///
    /// # Errors
    ///
    /// Returns [`MemError::Configuration`] when the size, way count or line size is zero,
    /// the line size is not one unit, or the way count does not evenly divide the number
    /// of lines.
    pub fn validate(&self) -> Result<(), MemError> {
        if self.size_bytes == 0 {
            return Err(MemError::config(&self.name, "size must be positive"));
        }
        if self.ways == 0 {
            return Err(MemError::config(&self.name, "associativity must be positive"));
        }
        if self.line_bytes == 0 {
            return Err(MemError::config(&self.name, "line size must be positive"));
        }
        if self.line_bytes != defaults::LINE_UNITS {
            return Err(MemError::config(
                &self.name,
                format!("line size {} unsupported, lines hold one unit", self.line_bytes),
            ));
        }
        if self.size_bytes % self.line_bytes != 0 {
            return Err(MemError::config(
                &self.name,
                format!(
                    "size {} is not a multiple of line size {}",
                    self.size_bytes, self.line_bytes
                ),
            ));
        }
        let lines = self.size_bytes / self.line_bytes;
        if lines % self.ways != 0 {
            return Err(MemError::config(
                &self.name,
                format!("associativity {} does not divide {} lines", self.ways, lines),
            ));
        }
        Ok(())
    }

    /// Returns the default level name.
    fn default_name() -> String {
        "cache".to_string()
    }

    /// Returns the default level size in units.
    fn default_size() -> usize {
        defaults::L1_SIZE
    }

    /// Returns the default line size in units.
    fn default_line() -> usize {
        defaults::LINE_UNITS
    }

    /// Returns the default associativity.
    fn default_ways() -> usize {
        1
    }

    /// Returns the default access latency in nanoseconds.
    fn default_latency() -> u64 {
        defaults::L1_LATENCY
    }
}

/// Main store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MemoryConfig {
    /// Number of addressable units
    #[serde(default = "MemoryConfig::default_capacity")]
    pub capacity: usize,

    /// Access latency in nanoseconds
    #[serde(default = "MemoryConfig::default_latency")]
    pub latency: u64,
}

impl MemoryConfig {
    /// Returns the default capacity in units.
    fn default_capacity() -> usize {
        defaults::MEMORY_CAPACITY
    }

    /// Returns the default access latency in nanoseconds.
    fn default_latency() -> u64 {
        defaults::MEMORY_LATENCY
    }

    /// Checks that the main store has at least one unit and is addressable.
    ///
    /// # Errors
    ///
    /// Returns [`MemError::Configuration`] for a zero capacity or one that does not fit
    /// a signed 32-bit address register.
    pub fn validate(&self) -> Result<(), MemError> {
        if self.capacity == 0 {
            return Err(MemError::config("memory", "capacity must be positive"));
        }
        if self.capacity > i32::MAX as usize {
            return Err(MemError::config(
                "memory",
                format!("capacity {} exceeds the addressable range", self.capacity),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    /// Returns the reference 1024-unit, 100 ns main store.
    fn default() -> Self {
        Self {
            capacity: defaults::MEMORY_CAPACITY,
            latency: defaults::MEMORY_LATENCY,
        }
    }
}

//! Memory Hierarchy Unit Tests.
//!
//! Verifies the read path (lookup, backfill, latency), the write path (write-allocate,
//! write-through propagation, write-back stop), write-back cascades, flush, bounds
//! checking and the preload path, on both the reference geometry and tiny hierarchies
//! whose sets fill after a few accesses.

use pretty_assertions::assert_eq;
use rstest::rstest;

use memsim_core::MemoryHierarchy;
use memsim_core::common::{LevelOutcome, MemError};
use memsim_core::config::{CacheConfig, Config, WritePolicy};

use crate::common::builder::{config, default_hierarchy, level, single, tiny};

use LevelOutcome::{Hit, Miss, Skipped};
use WritePolicy::{WriteBack, WriteThrough};

// ══════════════════════════════════════════════════════════
// 1. Read path
// ══════════════════════════════════════════════════════════

/// A cold read misses in every level, pays every latency and backfills every level.
#[test]
fn cold_read_misses_everywhere_and_backfills() {
    let mut mem = default_hierarchy();

    let access = mem.read(5).unwrap();
    assert_eq!(access.value, 0);
    assert_eq!(access.latency_ns, 1 + 10 + 100);
    assert_eq!(access.levels, vec![Miss, Miss]);
    assert_eq!(access.hit_level(), None);

    for level in mem.levels() {
        assert_eq!(level.probe(5), Some(0), "{} not backfilled", level.name());
        assert_eq!(level.stats().read_misses, 1);
        assert_eq!(level.stats().fills, 1);
    }
    assert_eq!(mem.main_store().stats().reads, 1);
}

/// A warm read is served by the top level alone.
#[test]
fn warm_read_hits_top_level_only() {
    let mut mem = default_hierarchy();
    let _ = mem.read(5).unwrap();

    let access = mem.read(5).unwrap();
    assert_eq!(access.latency_ns, 1);
    assert_eq!(access.levels, vec![Hit, Skipped]);
    assert_eq!(mem.level(0).unwrap().stats().read_hits, 1);
    assert_eq!(mem.level(1).unwrap().stats().lookups(), 1);
    assert_eq!(mem.main_store().stats().reads, 1);
}

/// Toy L1 (2 sets, 2 ways): writes to 0, 2, 4 evict 0; reading 0 misses in L1, hits
/// in L2 and refills L1.
#[test]
fn toy_l1_conflict_evicts_least_recent_and_refills() {
    let mut mem = MemoryHierarchy::new(&config(
        vec![level("L1", 4, 2, WriteThrough, 1), CacheConfig::l2()],
        1024,
    ))
    .unwrap();

    let _ = mem.write(0, 10).unwrap();
    let _ = mem.write(2, 20).unwrap();
    let _ = mem.write(4, 30).unwrap();

    let l1 = mem.level(0).unwrap();
    assert_eq!(l1.probe(0), None);
    assert_eq!(l1.probe(2), Some(20));
    assert_eq!(l1.probe(4), Some(30));

    let access = mem.read(0).unwrap();
    assert_eq!(access.value, 10);
    assert_eq!(access.levels, vec![Miss, Hit]);
    assert_eq!(access.latency_ns, 11);
    assert_eq!(access.hit_level(), Some(1));

    let l1 = mem.level(0).unwrap();
    assert_eq!(l1.probe(0), Some(10));
    assert_eq!(l1.probe(2), None, "2 was least recently used");
    assert_eq!(l1.probe(4), Some(30));
}

/// Touching an address before the conflicting access protects it from eviction.
#[test]
fn recent_touch_protects_from_eviction() {
    let mut mem = MemoryHierarchy::new(&config(
        vec![level("L1", 4, 2, WriteThrough, 1), CacheConfig::l2()],
        1024,
    ))
    .unwrap();

    let _ = mem.write(0, 10).unwrap();
    let _ = mem.write(2, 20).unwrap();
    assert_eq!(mem.read(0).unwrap().levels, vec![Hit, Skipped]);
    let _ = mem.write(4, 30).unwrap();

    let l1 = mem.level(0).unwrap();
    assert_eq!(l1.probe(0), Some(10));
    assert_eq!(l1.probe(2), None);
}

// ══════════════════════════════════════════════════════════
// 2. Write path
// ══════════════════════════════════════════════════════════

/// Write-through L1 forwards to the write-back L2, which absorbs the write dirty.
#[test]
fn write_through_then_write_back_stops_at_l2() {
    let mut mem = default_hierarchy();

    let access = mem.write(600, 55).unwrap();
    assert_eq!(access.levels, vec![Miss, Miss]);
    assert_eq!(access.latency_ns, 11);

    let l1 = mem.level(0).unwrap();
    let l2 = mem.level(1).unwrap();
    assert_eq!(l1.probe(600), Some(55));
    assert!(!l1.block(600).unwrap().is_dirty());
    assert_eq!(l2.probe(600), Some(55));
    assert!(l2.block(600).unwrap().is_dirty());

    assert_eq!(mem.main_store().get(600), Some(0));
    assert_eq!(mem.main_store().stats().writes, 0);
}

/// With every level write-through the main store is updated on each write.
#[test]
fn all_write_through_reaches_main_store() {
    let mut mem = MemoryHierarchy::new(&config(
        vec![
            level("L1", 64, 2, WriteThrough, 1),
            level("L2", 256, 4, WriteThrough, 10),
        ],
        1024,
    ))
    .unwrap();

    let access = mem.write(7, -3).unwrap();
    assert_eq!(access.latency_ns, 111);
    assert_eq!(mem.main_store().get(7), Some(-3));
    assert_eq!(mem.main_store().stats().writes, 1);

    let _ = mem.write(7, 4).unwrap();
    assert_eq!(mem.main_store().get(7), Some(4));
    assert_eq!(mem.level(1).unwrap().stats().write_hits, 1);
}

/// A write-back top level keeps the write to itself.
#[test]
fn write_back_top_level_skips_lower_levels() {
    let mut mem = tiny(WriteBack, WriteThrough, 64);

    let access = mem.write(1, 7).unwrap();
    assert_eq!(access.levels, vec![Miss, Skipped]);
    assert_eq!(access.latency_ns, 1);
    assert_eq!(mem.level(1).unwrap().probe(1), None);
    assert_eq!(mem.main_store().get(1), Some(0));
    assert_eq!(mem.peek(1), Ok(7));
}

/// Overwriting a resident address is a write hit and keeps one copy.
#[test]
fn write_hit_overwrites_in_place() {
    let mut mem = default_hierarchy();
    let _ = mem.write(9, 1).unwrap();
    let access = mem.write(9, 2).unwrap();

    assert_eq!(access.levels, vec![Hit, Hit]);
    assert_eq!(mem.read(9).unwrap().value, 2);
    let l1 = mem.level(0).unwrap();
    let copies = l1
        .sets()
        .iter()
        .flat_map(|s| s.ways())
        .filter(|b| b.is_valid())
        .count();
    assert_eq!(copies, 1);
}

// ══════════════════════════════════════════════════════════
// 3. Write-back cascades
// ══════════════════════════════════════════════════════════

/// 55 written to 600, then four conflicting writes to L2 set 24 push it out: exactly
/// one write-back reaches the main store, and a later read fetches 55 from it.
#[test]
fn l2_eviction_writes_back_once_and_read_refetches() {
    let mut mem = default_hierarchy();

    let _ = mem.write(600, 55).unwrap();
    for (i, addr) in [664, 728, 792, 856].into_iter().enumerate() {
        let _ = mem.write(addr, i as i32 + 1).unwrap();
    }

    assert_eq!(mem.main_store().stats().writes, 1);
    assert_eq!(mem.main_store().get(600), Some(55));
    assert_eq!(mem.level(1).unwrap().stats().writebacks, 1);
    assert_eq!(mem.level(1).unwrap().probe(600), None);

    let access = mem.read(600).unwrap();
    assert_eq!(access.value, 55);
    assert_eq!(access.levels, vec![Miss, Miss]);
    assert_eq!(access.latency_ns, 111);
    assert_eq!(mem.main_store().stats().reads, 1);

    assert_eq!(mem.level(0).unwrap().probe(600), Some(55));
    let l2_copy = mem.level(1).unwrap().block(600).unwrap();
    assert_eq!(l2_copy.value(), 55);
    assert!(!l2_copy.is_dirty());
}

/// Dirty victims of a write-back L1 land in a write-back L2, whose own victims reach
/// the main store.
#[test]
fn cascade_through_two_write_back_levels() {
    let mut mem = tiny(WriteBack, WriteBack, 64);

    for addr in [0, 4, 8, 12] {
        let _ = mem.write(addr, 100 + addr as i32).unwrap();
    }
    assert_eq!(mem.main_store().stats().writes, 0);
    assert_eq!(mem.level(1).unwrap().probe(0), Some(100));

    let _ = mem.write(16, 116).unwrap();
    assert_eq!(mem.main_store().stats().writes, 1);
    assert_eq!(mem.main_store().get(0), Some(100));

    for addr in [0, 4, 8, 12, 16] {
        assert_eq!(mem.read(addr).unwrap().value, 100 + addr as i32);
    }
}

/// A read miss whose backfill displaces a dirty L1 block writes it through L2.
#[test]
fn backfill_victim_is_written_back() {
    let mut mem = tiny(WriteBack, WriteThrough, 64);
    let _ = mem.write(0, 1).unwrap();
    let _ = mem.write(2, 2).unwrap();

    let access = mem.read(4).unwrap();
    assert_eq!(access.value, 0);

    assert_eq!(mem.level(0).unwrap().probe(0), None);
    assert_eq!(mem.level(1).unwrap().probe(0), Some(1));
    assert_eq!(mem.main_store().get(0), Some(1));
    assert_eq!(mem.peek(0), Ok(1));
    assert_eq!(mem.peek(2), Ok(2));
}

/// A stale copy displaced from L1 never overwrites a newer value already below it.
#[test]
fn stale_victim_does_not_overwrite_newer_value() {
    let mut mem = tiny(WriteBack, WriteBack, 64);
    for round in 0..4 {
        for addr in [0, 2, 4, 6] {
            let _ = mem.write(addr, round * 10 + addr as i32).unwrap();
        }
    }
    mem.flush();
    for addr in [0_i64, 2, 4, 6] {
        assert_eq!(mem.main_store().get(addr as u64), Some(30 + addr as i32));
        assert_eq!(mem.read(addr).unwrap().value, 30 + addr as i32);
    }
}

// ══════════════════════════════════════════════════════════
// 4. Flush
// ══════════════════════════════════════════════════════════

/// Flush clears every dirty flag, updates the main store and keeps blocks resident.
#[test]
fn flush_cleans_everything_and_keeps_blocks() {
    let mut mem = tiny(WriteBack, WriteBack, 64);
    let _ = mem.write(1, 11).unwrap();
    let _ = mem.write(3, 33).unwrap();
    let _ = mem.write(5, 55).unwrap();

    mem.flush();

    let snapshot = mem.snapshot();
    for level in &snapshot.levels {
        assert_eq!(level.dirty_count(), 0, "{} still dirty", level.name);
    }
    assert_eq!(mem.main_store().get(1), Some(11));
    assert_eq!(mem.main_store().get(3), Some(33));
    assert_eq!(mem.main_store().get(5), Some(55));
    assert_eq!(mem.level(0).unwrap().probe(5), Some(55));

    let writes = mem.main_store().stats().writes;
    mem.flush();
    assert_eq!(mem.main_store().stats().writes, writes, "second flush is a no-op");
}

/// Flushing a write-back L1 into a write-back L2 drains L2 as well.
#[test]
fn flush_drains_level_below() {
    let mut mem = tiny(WriteBack, WriteBack, 64);
    let _ = mem.write(6, 66).unwrap();
    mem.flush();
    assert_eq!(mem.main_store().get(6), Some(66));
    assert!(!mem.level(1).unwrap().block(6).unwrap().is_dirty());
    assert_eq!(mem.level(0).unwrap().stats().writebacks, 1);
    assert_eq!(mem.level(1).unwrap().stats().writebacks, 1);
}

// ══════════════════════════════════════════════════════════
// 5. Bounds and configuration
// ══════════════════════════════════════════════════════════

/// Out-of-range accesses fail before touching any state or counter.
#[rstest]
#[case(-1)]
#[case(1024)]
#[case(i64::MAX)]
fn out_of_range_leaves_state_unchanged(#[case] addr: i64) {
    let mut mem = default_hierarchy();
    let _ = mem.write(3, 3).unwrap();
    let before = mem.snapshot();
    let store_before = *mem.main_store().stats();

    let expected = Err(MemError::OutOfRange {
        addr,
        capacity: 1024,
    });
    assert_eq!(mem.read(addr).map(|a| a.value), expected);
    assert_eq!(mem.write(addr, 9).map(|a| a.value), expected);
    assert_eq!(mem.peek(addr), expected);

    assert_eq!(mem.snapshot(), before);
    assert_eq!(*mem.main_store().stats(), store_before);
}

/// Boundary addresses are accepted.
#[rstest]
#[case(0)]
#[case(1023)]
fn boundary_addresses_are_valid(#[case] addr: i64) {
    let mut mem = default_hierarchy();
    let _ = mem.write(addr, -1).unwrap();
    assert_eq!(mem.read(addr).unwrap().value, -1);
}

/// Invalid geometry is rejected at construction.
#[test]
fn construction_rejects_bad_geometry() {
    let err =
        MemoryHierarchy::new(&config(vec![level("L9", 6, 4, WriteBack, 1)], 64)).unwrap_err();
    assert!(matches!(err, MemError::Configuration { ref level, .. } if level == "L9"));
}

/// Without cache levels every access goes straight to the main store.
#[test]
fn no_levels_goes_straight_to_main_store() {
    let mut mem = MemoryHierarchy::new(&config(Vec::new(), 16)).unwrap();
    let write = mem.write(2, 5).unwrap();
    assert_eq!(write.latency_ns, 100);
    assert!(write.levels.is_empty());
    assert_eq!(mem.read(2).unwrap().value, 5);
    assert_eq!(mem.main_store().stats().reads, 1);
}

// ══════════════════════════════════════════════════════════
// 6. Inspection, preload and statistics reset
// ══════════════════════════════════════════════════════════

/// `peek` returns the coherent value without side effects.
#[test]
fn peek_has_no_side_effects() {
    let mut mem = tiny(WriteBack, WriteBack, 64);
    let _ = mem.write(4, 44).unwrap();
    let before = mem.snapshot();
    assert_eq!(mem.peek(4), Ok(44));
    assert_eq!(mem.peek(5), Ok(0));
    assert_eq!(mem.snapshot(), before);
}

/// Preloading replaces cached copies so later reads see the preloaded value.
#[test]
fn load_data_invalidates_cached_copies() {
    let mut mem = default_hierarchy();
    let _ = mem.write(3, 9).unwrap();

    mem.load_data(3, &[42, 43]).unwrap();
    assert_eq!(mem.peek(3), Ok(42));
    assert_eq!(mem.level(0).unwrap().probe(3), None);
    assert_eq!(mem.level(1).unwrap().probe(3), None);
    assert_eq!(mem.read(3).unwrap().value, 42);
    assert_eq!(mem.read(4).unwrap().value, 43);
}

/// An empty preload still checks its base and touches nothing.
#[test]
fn load_data_empty_only_checks_base() {
    let mut mem = single(WriteBack, 4, 2, 8);
    let _ = mem.write(2, 7).unwrap();
    let before = mem.snapshot();

    assert_eq!(mem.load_data(2, &[]), Ok(()));
    assert_eq!(mem.snapshot(), before);
    assert_eq!(mem.peek(2), Ok(7));
    assert!(matches!(
        mem.load_data(8, &[]),
        Err(MemError::OutOfRange { addr: 8, .. })
    ));
}

/// Preloading evicts only the targeted addresses; neighbours stay cached and dirty.
#[test]
fn load_data_keeps_unrelated_blocks() {
    let mut mem = single(WriteBack, 4, 2, 8);
    let _ = mem.write(1, 10).unwrap();
    let _ = mem.write(2, 20).unwrap();

    mem.load_data(2, &[5]).unwrap();
    assert_eq!(mem.level(0).unwrap().probe(1), Some(10));
    assert_eq!(mem.level(0).unwrap().probe(2), None);
    assert_eq!(mem.main_store().get(1), Some(0));
    assert_eq!(mem.peek(2), Ok(5));
}

/// A preload running past the end writes nothing.
#[test]
fn load_data_out_of_range_is_atomic() {
    let mut mem = single(WriteThrough, 4, 2, 8);
    let result = mem.load_data(6, &[1, 2, 3]);
    assert_eq!(
        result,
        Err(MemError::OutOfRange {
            addr: 8,
            capacity: 8
        })
    );
    assert_eq!(mem.main_store().cells(), &[0; 8]);
}

/// Resetting statistics keeps contents.
#[test]
fn reset_stats_keeps_contents() {
    let mut cfg = Config::default();
    cfg.memory.latency = 50;
    let mut mem = MemoryHierarchy::new(&cfg).unwrap();
    let _ = mem.write(8, 8).unwrap();
    let _ = mem.read(8).unwrap();

    mem.reset_stats();
    for level in mem.levels() {
        assert_eq!(level.stats().lookups(), 0);
        assert!(level.stats().hit_rate().abs() < f64::EPSILON);
    }
    assert_eq!(mem.main_store().stats().reads, 0);
    assert_eq!(mem.read(8).unwrap().levels, vec![Hit, Skipped]);
}

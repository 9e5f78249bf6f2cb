//! Read-only views of hierarchy state for debug and trace consumers.
//!
//! Snapshots are plain serializable data. Taking one never touches recency or
//! statistics.

use std::fmt;

use serde::Serialize;

use crate::config::WritePolicy;
use crate::core::units::cache::{CacheLevel, LevelStats};

/// One way of one set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BlockSnapshot {
    /// Whether the block holds live data.
    pub valid: bool,
    /// Stored tag.
    pub tag: u64,
    /// Address rebuilt from set index and tag. `None` for invalid blocks.
    pub addr: Option<u64>,
    /// Cached value.
    pub value: i32,
    /// Dirty flag.
    pub dirty: bool,
}

/// One set of a level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SetSnapshot {
    /// Ways in way order.
    pub ways: Vec<BlockSnapshot>,
}

/// One cache level.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelSnapshot {
    /// Level name.
    pub name: String,
    /// Write policy.
    pub policy: WritePolicy,
    /// Access latency in nanoseconds.
    pub latency_ns: u64,
    /// Statistics at the time of the snapshot.
    pub stats: LevelStats,
    /// Sets in index order.
    pub sets: Vec<SetSnapshot>,
}

impl LevelSnapshot {
    /// Captures `level`.
    pub fn capture(level: &CacheLevel) -> Self {
        let mapping = level.mapping();
        let sets = level
            .sets()
            .iter()
            .enumerate()
            .map(|(index, set)| SetSnapshot {
                ways: set
                    .ways()
                    .iter()
                    .map(|b| BlockSnapshot {
                        valid: b.is_valid(),
                        tag: b.tag(),
                        addr: b.is_valid().then(|| mapping.address(index, b.tag())),
                        value: b.value(),
                        dirty: b.is_dirty(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            name: level.name().to_string(),
            policy: level.policy(),
            latency_ns: level.latency(),
            stats: *level.stats(),
            sets,
        }
    }

    /// Valid blocks with their set index, in set then way order.
    pub fn valid_blocks(&self) -> impl Iterator<Item = (usize, &BlockSnapshot)> + '_ {
        self.sets.iter().enumerate().flat_map(|(index, set)| {
            set.ways.iter().filter(|b| b.valid).map(move |b| (index, b))
        })
    }

    /// Number of dirty blocks.
    pub fn dirty_count(&self) -> usize {
        self.valid_blocks().filter(|(_, b)| b.dirty).count()
    }
}

/// Whole hierarchy, top level first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HierarchySnapshot {
    /// Cache levels.
    pub levels: Vec<LevelSnapshot>,
}

impl fmt::Display for HierarchySnapshot {
    /// Prints every valid block as `set/way addr=value`, one level per section.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in &self.levels {
            writeln!(
                f,
                "[{}] {:?} hits={} misses={} dirty={}",
                level.name,
                level.policy,
                level.stats.hits(),
                level.stats.misses(),
                level.dirty_count()
            )?;
            for (index, set) in level.sets.iter().enumerate() {
                for (way, block) in set.ways.iter().enumerate() {
                    if let Some(addr) = block.addr {
                        writeln!(
                            f,
                            "  set {index:>3} way {way}: addr {addr:>5} = {:<11}{}",
                            block.value,
                            if block.dirty { " (dirty)" } else { "" }
                        )?;
                    }
                }
            }
        }
        Ok(())
    }
}

//! Set-Associative Cache Level.
//!
//! This module implements one level of the cache hierarchy. A level owns its sets,
//! its write policy, its access latency and its cumulative statistics. It models:
//! 1. **Lookup:** Tag match within the addressed set, counted as a hit or a miss.
//! 2. **Install:** Write-allocate and read fills, with LRU victim selection.
//! 3. **Dirty tracking:** Write-back levels mark installed values dirty and hand
//!    dirty victims back to the caller for propagation to the next level.
//!
//! The level never talks to its neighbours: the hierarchy decides where returned
//! write-backs go.

/// Cache block state.
pub mod block;

/// Cache replacement policy implementations.
pub mod policies;

/// Associative set and eviction.
pub mod set;

use serde::Serialize;
use tracing::{debug, trace};

use self::block::Block;
use self::policies::{LruPolicy, ReplacementPolicy};
use self::set::{CacheSet, Evicted};
use crate::common::{AccessType, AddressMapping, LevelOutcome, MemError};
use crate::config::{CacheConfig, WritePolicy};

/// A dirty value leaving a level, destined for the level below.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteBack {
    /// Address the value belongs to.
    pub addr: u64,
    /// Value to write.
    pub value: i32,
}

/// Cumulative per-level counters.
///
/// Only demand lookups (executor reads, and executor writes including their
/// write-through propagation) count as hits or misses. Fills and write-backs are
/// traffic, tracked separately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LevelStats {
    /// Demand reads that found the address.
    pub read_hits: u64,
    /// Demand reads that did not find the address.
    pub read_misses: u64,
    /// Demand writes that found the address.
    pub write_hits: u64,
    /// Demand writes that had to allocate.
    pub write_misses: u64,
    /// Blocks installed because of a read miss.
    pub fills: u64,
    /// Valid blocks displaced by an install.
    pub evictions: u64,
    /// Dirty values sent to the next level (by eviction or flush).
    pub writebacks: u64,
}

impl LevelStats {
    /// Total hits.
    pub const fn hits(&self) -> u64 {
        self.read_hits + self.write_hits
    }

    /// Total misses.
    pub const fn misses(&self) -> u64 {
        self.read_misses + self.write_misses
    }

    /// Total lookups issued to the level.
    pub const fn lookups(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// `hits / lookups`, or 0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    fn record(&mut self, kind: AccessType, hit: bool) {
        let counter = match (kind, hit) {
            (AccessType::Read, true) => &mut self.read_hits,
            (AccessType::Read, false) => &mut self.read_misses,
            (AccessType::Write, true) => &mut self.write_hits,
            (AccessType::Write, false) => &mut self.write_misses,
        };
        *counter += 1;
    }
}

/// One level of the cache hierarchy.
#[derive(Debug)]
pub struct CacheLevel {
    name: String,
    policy: WritePolicy,
    latency: u64,
    ways: usize,
    mapping: AddressMapping,
    sets: Vec<CacheSet>,
    replacement: Box<dyn ReplacementPolicy>,
    clock: u64,
    stats: LevelStats,
}

impl CacheLevel {
    /// Builds an empty level from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MemError::Configuration`] when the geometry fails
    /// [`CacheConfig::validate`].
    pub fn new(config: &CacheConfig) -> Result<Self, MemError> {
        config.validate()?;
        let num_sets = config.sets();
        Ok(Self {
            name: config.name.clone(),
            policy: config.policy,
            latency: config.latency,
            ways: config.ways,
            mapping: AddressMapping::new(num_sets, config.line_bytes),
            sets: (0..num_sets).map(|_| CacheSet::new(config.ways)).collect(),
            replacement: Box::new(LruPolicy::new()),
            clock: 0,
            stats: LevelStats::default(),
        })
    }

    /// Level name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write policy.
    pub const fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Access latency in nanoseconds.
    pub const fn latency(&self) -> u64 {
        self.latency
    }

    /// Associativity.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Number of sets.
    pub const fn num_sets(&self) -> usize {
        self.mapping.sets()
    }

    /// Address mapping used by this level.
    pub const fn mapping(&self) -> AddressMapping {
        self.mapping
    }

    /// Sets of the level, in index order.
    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }

    /// Cumulative statistics.
    pub const fn stats(&self) -> &LevelStats {
        &self.stats
    }

    /// Zeroes the statistics. Cache contents and recency are untouched.
    pub fn reset_stats(&mut self) {
        self.stats = LevelStats::default();
    }

    /// Returns the cached value of `addr` without touching recency or statistics.
    pub fn probe(&self, addr: u64) -> Option<i32> {
        let (set, tag) = self.mapping.split(addr);
        let way = self.sets[set].find(tag)?;
        Some(self.sets[set].value(way))
    }

    /// Returns the block caching `addr`, if any, without side effects.
    pub fn block(&self, addr: u64) -> Option<&Block> {
        let (set, tag) = self.mapping.split(addr);
        let way = self.sets[set].find(tag)?;
        Some(&self.sets[set].ways()[way])
    }

    /// Demand read lookup. Records a read hit or miss.
    pub fn read(&mut self, addr: u64) -> Option<i32> {
        let (set, tag) = self.mapping.split(addr);
        let now = self.tick();
        let found = self.sets[set].lookup(tag, now);
        self.stats.record(AccessType::Read, found.is_some());
        trace!(
            cache = %self.name,
            addr,
            set,
            tag,
            hit = found.is_some(),
            "read lookup"
        );
        found.map(|way| self.sets[set].value(way))
    }

    /// Demand write: lookup (recorded), then overwrite on hit or allocate on miss.
    ///
    /// The stored block is dirty iff the level is write-back.
    ///
    /// # Returns
    ///
    /// The lookup outcome and the dirty victim displaced by the allocation, if any.
    pub fn write(&mut self, addr: u64, value: i32) -> (LevelOutcome, Option<WriteBack>) {
        let (set, tag) = self.mapping.split(addr);
        let now = self.tick();
        let hit = self.sets[set].lookup(tag, now).is_some();
        self.stats.record(AccessType::Write, hit);
        trace!(cache = %self.name, addr, set, tag, hit, value, "write lookup");

        let outcome = if hit {
            LevelOutcome::Hit
        } else {
            LevelOutcome::Miss
        };
        (outcome, self.install(addr, value, self.is_write_back()))
    }

    /// Installs a clean copy of `addr` after a read miss.
    ///
    /// # Returns
    ///
    /// The dirty victim displaced by the allocation, if any.
    pub(crate) fn fill(&mut self, addr: u64, value: i32) -> Option<WriteBack> {
        self.stats.fills += 1;
        self.install(addr, value, false)
    }

    /// Accepts a value written back (or written through) from the level above.
    ///
    /// Not a demand lookup: statistics only see the traffic it causes.
    pub(crate) fn absorb(&mut self, addr: u64, value: i32) -> Option<WriteBack> {
        self.install(addr, value, self.is_write_back())
    }

    /// Clears every dirty flag and returns the values that must move down.
    pub(crate) fn take_dirty(&mut self) -> Vec<WriteBack> {
        let mapping = self.mapping;
        let mut out = Vec::new();
        for (index, set) in self.sets.iter_mut().enumerate() {
            out.extend(set.take_dirty().into_iter().map(|(tag, value)| WriteBack {
                addr: mapping.address(index, tag),
                value,
            }));
        }
        self.stats.writebacks += out.len() as u64;
        if !out.is_empty() {
            debug!(cache = %self.name, count = out.len(), "flushing dirty blocks");
        }
        out
    }

    /// Drops any copy of `addr`, dirty or not.
    pub(crate) fn invalidate(&mut self, addr: u64) {
        let (set, tag) = self.mapping.split(addr);
        if self.sets[set].invalidate(tag) {
            trace!(cache = %self.name, addr, "invalidated");
        }
    }

    const fn is_write_back(&self) -> bool {
        matches!(self.policy, WritePolicy::WriteBack)
    }

    const fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn install(&mut self, addr: u64, value: i32, dirty: bool) -> Option<WriteBack> {
        let (set, tag) = self.mapping.split(addr);
        let now = self.tick();
        let evicted = self.sets[set].install(tag, value, dirty, now, self.replacement.as_ref())?;
        self.stats.evictions += 1;
        self.spill(set, evicted)
    }

    fn spill(&mut self, set: usize, evicted: Evicted) -> Option<WriteBack> {
        let addr = self.mapping.address(set, evicted.tag);
        if !evicted.dirty {
            trace!(cache = %self.name, addr, "evicted clean block");
            return None;
        }
        self.stats.writebacks += 1;
        debug!(
            cache = %self.name,
            addr,
            value = evicted.value,
            "evicted dirty block, writing back"
        );
        Some(WriteBack {
            addr,
            value: evicted.value,
        })
    }
}

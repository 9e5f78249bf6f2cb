//! Memory Hierarchy.
//!
//! Composes the configured cache levels, top first, over the main store and exposes
//! the only operations that mutate them. It implements:
//! 1. **Read path:** top-down lookup, backfill of every level above the hit, and
//!    latency accumulation over the visited levels.
//! 2. **Write path:** write-allocate at the top, propagation through write-through
//!    levels, and a stop (with the dirty flag set) at the first write-back level.
//! 3. **Write-back cascade:** dirty victims move down one level at a time through an
//!    explicit work queue, so deep hierarchies never recurse.
//! 4. **Flush:** top-down drain of every dirty block into the main store.
//!
//! Invariant: for every address, the topmost valid cached copy (or the main store
//! entry when no copy exists) holds the most recently written value.

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::memory::MainStore;
use super::snapshot::{HierarchySnapshot, LevelSnapshot};
use crate::common::{Access, LevelOutcome, MemError};
use crate::config::{Config, WritePolicy};
use crate::core::units::cache::{CacheLevel, WriteBack};

/// A value on its way into `level` (`level == levels.len()` is the main store).
#[derive(Clone, Copy, Debug)]
struct PendingStore {
    level: usize,
    addr: u64,
    value: i32,
}

/// Cache levels over a main store.
#[derive(Debug)]
pub struct MemoryHierarchy {
    levels: Vec<CacheLevel>,
    memory: MainStore,
}

impl MemoryHierarchy {
    /// Builds an empty hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`MemError::Configuration`] for the first level (or the main store)
    /// whose geometry is invalid. Nothing is built in that case.
    pub fn new(config: &Config) -> Result<Self, MemError> {
        config.validate()?;
        let levels = config
            .cache
            .levels
            .iter()
            .map(CacheLevel::new)
            .collect::<Result<Vec<_>, _>>()?;
        let memory = MainStore::new(&config.memory)?;
        debug!(
            levels = levels.len(),
            capacity = memory.capacity(),
            "memory hierarchy built"
        );
        Ok(Self { levels, memory })
    }

    /// Cache levels, top first.
    pub fn levels(&self) -> &[CacheLevel] {
        &self.levels
    }

    /// Cache level `index`, if it exists.
    pub fn level(&self, index: usize) -> Option<&CacheLevel> {
        self.levels.get(index)
    }

    /// The backing store.
    pub const fn main_store(&self) -> &MainStore {
        &self.memory
    }

    /// Number of addressable units.
    pub fn capacity(&self) -> usize {
        self.memory.capacity()
    }

    /// Reads `addr` through the hierarchy.
    ///
    /// Levels are searched top-down. Every level above the one that hits (all of them
    /// when the value comes from the main store) records a miss and receives a clean
    /// copy afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`MemError::OutOfRange`] without touching any state when `addr` is
    /// negative or not below the main store capacity.
    pub fn read(&mut self, addr: i64) -> Result<Access, MemError> {
        let addr = self.memory.check(addr)?;
        let mut levels = vec![LevelOutcome::Skipped; self.levels.len()];
        let mut latency_ns = 0;
        let mut found = None;

        for (index, level) in self.levels.iter_mut().enumerate() {
            latency_ns += level.latency();
            if let Some(value) = level.read(addr) {
                levels[index] = LevelOutcome::Hit;
                found = Some((index, value));
                break;
            }
            levels[index] = LevelOutcome::Miss;
        }

        let (source, value) = match found {
            Some(hit) => hit,
            None => {
                latency_ns += self.memory.latency();
                (self.levels.len(), self.memory.read(addr))
            }
        };

        let mut spills = Vec::new();
        for index in (0..source).rev() {
            if let Some(wb) = self.levels[index].fill(addr, value) {
                spills.push(Self::below(index, wb));
            }
        }
        self.drain(spills);

        trace!(addr, value, latency_ns, source, "read complete");
        Ok(Access {
            value,
            latency_ns,
            levels,
        })
    }

    /// Writes `value` to `addr` through the hierarchy.
    ///
    /// The write allocates at the top level and continues down while levels are
    /// write-through. It stops, dirty, at the first write-back level; if every level is
    /// write-through it reaches the main store.
    ///
    /// # Errors
    ///
    /// Returns [`MemError::OutOfRange`] without touching any state when `addr` is
    /// negative or not below the main store capacity.
    pub fn write(&mut self, addr: i64, value: i32) -> Result<Access, MemError> {
        let addr = self.memory.check(addr)?;
        let mut levels = vec![LevelOutcome::Skipped; self.levels.len()];
        let mut latency_ns = 0;
        let mut spills = Vec::new();
        let mut reaches_memory = true;

        for (index, level) in self.levels.iter_mut().enumerate() {
            latency_ns += level.latency();
            let (outcome, victim) = level.write(addr, value);
            levels[index] = outcome;
            if let Some(wb) = victim {
                spills.push(Self::below(index, wb));
            }
            match level.policy() {
                WritePolicy::WriteThrough => {}
                WritePolicy::WriteBack => {
                    reaches_memory = false;
                    break;
                }
            }
        }

        if reaches_memory {
            latency_ns += self.memory.latency();
            self.memory.write(addr, value);
        }
        self.drain(spills);

        trace!(addr, value, latency_ns, reaches_memory, "write complete");
        Ok(Access {
            value,
            latency_ns,
            levels,
        })
    }

    /// Writes every dirty block down to the main store and clears its dirty flag.
    ///
    /// Levels are drained top-down so a value flushed from one write-back level into
    /// another is flushed again by the second. Clean blocks stay resident.
    pub fn flush(&mut self) {
        for index in 0..self.levels.len() {
            let dirty = self.levels[index].take_dirty();
            if dirty.is_empty() {
                continue;
            }
            debug!(
                cache = self.levels[index].name(),
                count = dirty.len(),
                "flush"
            );
            self.drain(dirty.into_iter().map(|wb| Self::below(index, wb)).collect());
        }
    }

    /// Returns the coherent value of `addr` without touching recency or statistics.
    ///
    /// # Errors
    ///
    /// Returns [`MemError::OutOfRange`] for addresses outside the main store.
    pub fn peek(&self, addr: i64) -> Result<i32, MemError> {
        let addr = self.memory.check(addr)?;
        Ok(self
            .levels
            .iter()
            .find_map(|level| level.probe(addr))
            .or_else(|| self.memory.get(addr))
            .unwrap_or_default())
    }

    /// Stores `values` at consecutive addresses starting at `base`, directly in the
    /// main store, discarding any cached copies of those addresses.
    ///
    /// # Errors
    ///
    /// Returns [`MemError::OutOfRange`] if any target address is out of range; nothing
    /// is written in that case.
    pub fn load_data(&mut self, base: i64, values: &[i32]) -> Result<(), MemError> {
        let first = self.memory.check(base)?;
        let last = match values.len().checked_sub(1) {
            Some(n) => self.memory.check(base.saturating_add(n as i64))?,
            None => first,
        };
        for (addr, &value) in (first..=last).zip(values) {
            for level in &mut self.levels {
                level.invalidate(addr);
            }
            self.memory.write(addr, value);
        }
        debug!(base, count = values.len(), "preloaded main store");
        Ok(())
    }

    /// Captures the contents and statistics of every cache level.
    pub fn snapshot(&self) -> HierarchySnapshot {
        HierarchySnapshot {
            levels: self.levels.iter().map(LevelSnapshot::capture).collect(),
        }
    }

    /// Zeroes the statistics of every level and of the main store.
    pub fn reset_stats(&mut self) {
        for level in &mut self.levels {
            level.reset_stats();
        }
        self.memory.reset_stats();
    }

    const fn below(index: usize, wb: WriteBack) -> PendingStore {
        PendingStore {
            level: index + 1,
            addr: wb.addr,
            value: wb.value,
        }
    }

    /// Pushes values down until each lands in a write-back level or the main store.
    ///
    /// Installing into a level may displace another dirty block, which is queued one
    /// level further down. Entries are processed in the order they were queued: a
    /// stale copy displaced from a level is always queued before a newer copy of the
    /// same address can pass through that level, so the newer value lands last.
    fn drain(&mut self, pending: Vec<PendingStore>) {
        let mut queue = VecDeque::from(pending);
        while let Some(store) = queue.pop_front() {
            let Some(level) = self.levels.get_mut(store.level) else {
                self.memory.write(store.addr, store.value);
                continue;
            };
            if let Some(wb) = level.absorb(store.addr, store.value) {
                queue.push_back(Self::below(store.level, wb));
            }
            match level.policy() {
                WritePolicy::WriteBack => {}
                WritePolicy::WriteThrough => queue.push_back(PendingStore {
                    level: store.level + 1,
                    ..store
                }),
            }
        }
    }
}

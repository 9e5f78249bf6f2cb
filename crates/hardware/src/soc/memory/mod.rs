//! Main Store.
//!
//! This module implements the backing store at the bottom of the hierarchy. It provides:
//! 1. **Storage:** A flat, fixed-length array of signed 32-bit units, zero initialised.
//! 2. **Bounds checking:** The single place where demand addresses are validated.
//! 3. **Accounting:** Read and write counters and a fixed access latency.
//!
//! The main store has no miss state: every in-range access succeeds.

use serde::Serialize;

use crate::common::MemError;
use crate::config::MemoryConfig;

/// Main store access counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Values read (demand misses in every cache level).
    pub reads: u64,
    /// Values written (write-through chains, write-backs, preloads).
    pub writes: u64,
}

/// The authoritative backing store.
#[derive(Clone, Debug)]
pub struct MainStore {
    cells: Vec<i32>,
    latency: u64,
    stats: StoreStats,
}

impl MainStore {
    /// Creates a zero-filled store.
    ///
    /// # Errors
    ///
    /// Returns [`MemError::Configuration`] when the capacity fails
    /// [`MemoryConfig::validate`].
    pub fn new(config: &MemoryConfig) -> Result<Self, MemError> {
        config.validate()?;
        Ok(Self {
            cells: vec![0; config.capacity],
            latency: config.latency,
            stats: StoreStats::default(),
        })
    }

    /// Number of addressable units.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Access latency in nanoseconds.
    #[inline]
    pub const fn latency(&self) -> u64 {
        self.latency
    }

    /// Access counters.
    pub const fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Zeroes the access counters.
    pub fn reset_stats(&mut self) {
        self.stats = StoreStats::default();
    }

    /// Validates a signed address against the store's capacity.
    ///
    /// # Errors
    ///
    /// Returns [`MemError::OutOfRange`] for negative addresses and addresses at or past
    /// the capacity.
    pub fn check(&self, addr: i64) -> Result<u64, MemError> {
        match u64::try_from(addr) {
            Ok(a) if a < self.cells.len() as u64 => Ok(a),
            _ => Err(MemError::OutOfRange {
                addr,
                capacity: self.cells.len(),
            }),
        }
    }

    /// Returns the stored value without counting an access.
    pub fn get(&self, addr: u64) -> Option<i32> {
        self.cells.get(addr as usize).copied()
    }

    /// Full contents, index = address.
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Reads a checked address.
    pub(crate) fn read(&mut self, addr: u64) -> i32 {
        self.stats.reads += 1;
        self.cells[addr as usize]
    }

    /// Writes a checked address.
    pub(crate) fn write(&mut self, addr: u64, value: i32) {
        self.stats.writes += 1;
        self.cells[addr as usize] = value;
    }
}

//! Memory access classification.
//!
//! Distinguishes demand reads from demand writes so per-level statistics can keep
//! separate read and write hit/miss counters, and so trace consumers can tell the
//! two apart.

use serde::Serialize;

/// Kind of demand access issued by the executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Load from memory.
    Read,
    /// Store to memory.
    Write,
}

/// Outcome of a demand access at a single cache level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelOutcome {
    /// The level held a valid copy of the address.
    Hit,
    /// The level was looked up and did not hold the address.
    Miss,
    /// The access never reached this level (served above it, or stopped at a
    /// write-back level above it).
    Skipped,
}

impl LevelOutcome {
    /// Returns `true` for [`LevelOutcome::Hit`].
    #[inline]
    pub const fn is_hit(self) -> bool {
        matches!(self, Self::Hit)
    }
}

/// Result of a single `read` or `write` on the hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Access {
    /// Value read, or value written.
    pub value: i32,
    /// Sum of the access latencies of every storage level the access visited.
    pub latency_ns: u64,
    /// Per cache level outcome, top level first.
    pub levels: Vec<LevelOutcome>,
}

impl Access {
    /// Index of the first cache level that hit, if any.
    pub fn hit_level(&self) -> Option<usize> {
        self.levels.iter().position(|o| o.is_hit())
    }
}

//! Least Recently Used (LRU) Replacement Policy.
//!
//! Every lookup hit and every install stamps the block with the level's current
//! tick. The victim is the way with the smallest stamp; equal stamps resolve to the
//! lowest way index.
//!
//! # Performance
//!
//! - **Time Complexity:** `victim()` is O(W) where W is the associativity.
//! - **Space Complexity:** one `u64` per block, held in the block itself.

use super::ReplacementPolicy;
use crate::core::units::cache::block::Block;

/// LRU policy. Carries no state of its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct LruPolicy;

impl LruPolicy {
    /// Creates a new LRU policy instance.
    pub const fn new() -> Self {
        Self
    }
}

impl ReplacementPolicy for LruPolicy {
    /// Returns the way with the oldest recency, lowest index first on ties.
    fn victim(&self, ways: &[Block]) -> usize {
        let mut victim = 0;
        let mut oldest = u64::MAX;
        for (way, block) in ways.iter().enumerate() {
            if block.recency() < oldest {
                oldest = block.recency();
                victim = way;
            }
        }
        victim
    }
}

//! Cache Replacement Policies.
//!
//! Victim selection for full sets. Invalid ways are always filled first by the set
//! itself; a policy is only consulted once every way holds live data.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used, driven by the per-block recency tick.

/// Least Recently Used replacement policy.
pub mod lru;

pub use lru::LruPolicy;

use super::block::Block;

/// Trait for cache replacement policies.
///
/// Policies are stateless over the set: everything they need (validity, recency)
/// is stored in the blocks, so one policy value serves every set of a level.
pub trait ReplacementPolicy: Send + Sync + std::fmt::Debug {
    /// Selects the way to evict from a set whose ways are all valid.
    ///
    /// # Arguments
    ///
    /// * `ways` - The blocks of the set, in way order. Never empty.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn victim(&self, ways: &[Block]) -> usize;
}

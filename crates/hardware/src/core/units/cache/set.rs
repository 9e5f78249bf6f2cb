//! Associative cache set.
//!
//! A set is a fixed-width group of blocks searched linearly by tag. It enforces the
//! set-level invariants: at most one valid block per tag, invalid blocks never match,
//! and exactly one block is displaced per install into a full set.

use super::block::Block;
use super::policies::ReplacementPolicy;

/// Contents of a block displaced by an install.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evicted {
    /// Tag of the displaced occupant.
    pub tag: u64,
    /// Its value at the time of eviction.
    pub value: i32,
    /// Whether the value still has to be written to the next level.
    pub dirty: bool,
}

/// A group of `N` associative blocks.
#[derive(Clone, Debug)]
pub struct CacheSet {
    ways: Vec<Block>,
}

impl CacheSet {
    /// Creates a set of `ways` invalid blocks.
    pub fn new(ways: usize) -> Self {
        Self {
            ways: vec![Block::default(); ways],
        }
    }

    /// Blocks of the set in way order.
    #[inline]
    pub fn ways(&self) -> &[Block] {
        &self.ways
    }

    /// Finds the way holding `tag` without touching recency.
    pub fn find(&self, tag: u64) -> Option<usize> {
        self.ways.iter().position(|b| b.matches(tag))
    }

    /// Looks up `tag`, marking the matching block most recently used at `now`.
    ///
    /// # Returns
    ///
    /// The matching way, or `None` on a miss.
    pub fn lookup(&mut self, tag: u64, now: u64) -> Option<usize> {
        let way = self.find(tag)?;
        self.ways[way].touch(now);
        Some(way)
    }

    /// Chooses the way an install will use: the first invalid way, otherwise the
    /// policy's victim.
    pub fn victim_way(&self, policy: &dyn ReplacementPolicy) -> usize {
        self.ways
            .iter()
            .position(|b| !b.is_valid())
            .unwrap_or_else(|| policy.victim(&self.ways))
    }

    /// Writes `value` under `tag`, allocating a way if the tag is absent.
    ///
    /// A present tag is overwritten in place (its dirty flag only ever becomes set).
    /// An absent tag takes [`CacheSet::victim_way`]; the displaced valid block, if any,
    /// is returned so the caller can write it back when dirty.
    pub fn install(
        &mut self,
        tag: u64,
        value: i32,
        dirty: bool,
        now: u64,
        policy: &dyn ReplacementPolicy,
    ) -> Option<Evicted> {
        if let Some(way) = self.find(tag) {
            self.ways[way].update(value, dirty, now);
            return None;
        }

        let way = self.victim_way(policy);
        let old = self.ways[way];
        self.ways[way].reset(tag, value, dirty, now);

        old.is_valid().then_some(Evicted {
            tag: old.tag(),
            value: old.value(),
            dirty: old.is_dirty(),
        })
    }

    /// Reads the value held in `way`.
    #[inline]
    pub fn value(&self, way: usize) -> i32 {
        self.ways[way].value()
    }

    /// Clears every dirty flag and returns the `(tag, value)` pairs that were dirty,
    /// in way order.
    pub fn take_dirty(&mut self) -> Vec<(u64, i32)> {
        let mut dirty = Vec::new();
        for block in self.ways.iter_mut().filter(|b| b.is_valid() && b.is_dirty()) {
            dirty.push((block.tag(), block.value()));
            block.clean();
        }
        dirty
    }

    /// Drops the block holding `tag`. Returns `true` if one was present.
    pub fn invalidate(&mut self, tag: u64) -> bool {
        match self.find(tag) {
            Some(way) => {
                self.ways[way].invalidate();
                true
            }
            None => false,
        }
    }
}

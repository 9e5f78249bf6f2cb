//! Address-to-set/tag mapping.
//!
//! Every cache level translates a flat unit address into a set index and a tag.
//! The translation lives here, apart from lookup and eviction, so that a future
//! multi-unit line size only changes this file:
//! 1. **Forward mapping:** `set = (addr / line) % sets`, `tag = addr / (line * sets)`.
//! 2. **Inverse mapping:** rebuilds the line address from a set index and a tag,
//!    used when a dirty victim has to be written back.

/// Set/tag decomposition for one cache level.
///
/// Lines currently hold exactly one addressable unit, so `line_units` is always 1
/// and the mapping reduces to `set = addr % sets`, `tag = addr / sets`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressMapping {
    sets: usize,
    line_units: usize,
}

impl AddressMapping {
    /// Creates a mapping for a level with `sets` sets and `line_units` units per line.
    ///
    /// Both values must be non-zero; `Config::validate` guarantees this before any
    /// level is built.
    pub const fn new(sets: usize, line_units: usize) -> Self {
        Self { sets, line_units }
    }

    /// Number of sets the mapping distributes addresses over.
    #[inline]
    pub const fn sets(&self) -> usize {
        self.sets
    }

    /// Returns the set index for `addr`.
    #[inline]
    pub const fn set_index(&self, addr: u64) -> usize {
        ((addr as usize) / self.line_units) % self.sets
    }

    /// Returns the tag stored alongside the line holding `addr`.
    #[inline]
    pub const fn tag(&self, addr: u64) -> u64 {
        addr / (self.line_units * self.sets) as u64
    }

    /// Splits `addr` into `(set, tag)`.
    #[inline]
    pub const fn split(&self, addr: u64) -> (usize, u64) {
        (self.set_index(addr), self.tag(addr))
    }

    /// Rebuilds the base address of the line identified by `set` and `tag`.
    #[inline]
    pub const fn address(&self, set: usize, tag: u64) -> u64 {
        (tag * self.sets as u64 + set as u64) * self.line_units as u64
    }
}

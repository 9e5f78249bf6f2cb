//! Cache block (one line) state.

/// State of one cache line.
///
/// Lines hold a single addressable unit. A block starts invalid, becomes valid on a
/// fill, is overwritten in place on a hit and is reused after eviction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Block {
    valid: bool,
    tag: u64,
    value: i32,
    dirty: bool,
    recency: u64,
}

impl Block {
    /// Returns `true` if the block holds live data.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Tag of the address occupying the block. Meaningless while invalid.
    #[inline]
    pub const fn tag(&self) -> u64 {
        self.tag
    }

    /// Cached value.
    #[inline]
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// Returns `true` if the value has not yet reached the next level down.
    #[inline]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Tick of the last lookup hit or install. Higher is more recent.
    #[inline]
    pub const fn recency(&self) -> u64 {
        self.recency
    }

    /// Returns `true` if the block is valid and holds `tag`.
    #[inline]
    pub const fn matches(&self, tag: u64) -> bool {
        self.valid && self.tag == tag
    }

    /// Marks the block as the most recently used at tick `now`.
    #[inline]
    pub(crate) const fn touch(&mut self, now: u64) {
        self.recency = now;
    }

    /// Overwrites the value of a valid block. Dirtiness is sticky until written back.
    pub(crate) const fn update(&mut self, value: i32, dirty: bool, now: u64) {
        self.value = value;
        self.dirty |= dirty;
        self.recency = now;
    }

    /// Reinitialises the block for a new occupant.
    pub(crate) const fn reset(&mut self, tag: u64, value: i32, dirty: bool, now: u64) {
        *self = Self {
            valid: true,
            tag,
            value,
            dirty,
            recency: now,
        };
    }

    /// Clears the dirty flag after the value has been written downward.
    #[inline]
    pub(crate) const fn clean(&mut self) {
        self.dirty = false;
    }

    /// Drops the block's contents.
    #[inline]
    pub(crate) const fn invalidate(&mut self) {
        self.valid = false;
        self.dirty = false;
    }
}

//! Functional units used by the executor.
//!
//! The cache level lives here; the executor itself never touches a level directly and
//! reaches it only through [`crate::soc::MemoryHierarchy`].

/// Set-associative cache level with LRU replacement and write policies.
pub mod cache;

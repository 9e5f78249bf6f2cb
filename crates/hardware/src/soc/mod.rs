//! Memory System Components.
//!
//! This module organizes the storage below the executor: the main store, the
//! hierarchy that composes cache levels over it, and the read-only snapshot types
//! handed to debug consumers.

/// Cache levels composed over the main store.
pub mod hierarchy;

/// Main store (backing memory).
pub mod memory;

/// Read-only state views.
pub mod snapshot;

pub use hierarchy::MemoryHierarchy;
pub use memory::MainStore;
pub use snapshot::{BlockSnapshot, HierarchySnapshot, LevelSnapshot, SetSnapshot};

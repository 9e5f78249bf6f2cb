//! Common types shared by the cache levels, the hierarchy and the executor.
//!
//! This module provides:
//! 1. **Address Mapping:** Set index and tag extraction, isolated from lookup logic.
//! 2. **Access Types:** Demand access kinds and per-level outcomes.
//! 3. **Error Handling:** Typed errors for the hierarchy, the parser and the executor.

/// Address to set/tag mapping.
pub mod addr;

/// Memory access type definitions.
pub mod data;

/// Error types.
pub mod error;

pub use addr::AddressMapping;
pub use data::{Access, AccessType, LevelOutcome};
pub use error::{ExecError, MemError, ParseError, SimError};

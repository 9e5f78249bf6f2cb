//! Architectural state of the executor.
//!
//! This module contains the state visible to programs:
//! 1. **GPRs:** The seven 32-bit general-purpose registers.
//! 2. **Flags:** Zero, sign, carry and overflow, read by conditional jumps.

/// Condition flags.
pub mod flags;

/// General-Purpose Register file implementation.
pub mod gpr;

pub use flags::Flags;
pub use gpr::Gpr;

//! Core processor implementation.
//!
//! This module contains the executor: the architectural state it exposes to programs,
//! the CPU that steps through a parsed program, and the cache level unit the memory
//! hierarchy is built from.

/// Architectural state (register file, flags).
pub mod arch;

/// CPU core implementation and execution.
pub mod cpu;

/// Functional units (cache level).
pub mod units;

pub use self::cpu::Cpu;

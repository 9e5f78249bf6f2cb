//! Cache hierarchy simulator library.
//!
//! This crate models a stack of set-associative cache levels over a flat main store
//! and a small register machine that drives it. It provides:
//! 1. **Memory:** LRU cache levels with write-through or write-back policies, composed
//!    into a coherent hierarchy with backfill, write-back cascades and flush.
//! 2. **Core:** Register file, flags and an executor that issues every load and store
//!    through the hierarchy.
//! 3. **ISA:** Parsing and disassembly of the assembly language programs are written in.
//! 4. **Simulation:** Loader, configuration, access tracing and statistics reporting.
//!
//! # Example
//!
//! ```
//! use memsim_core::{Config, MemoryHierarchy};
//!
//! let mut memory = MemoryHierarchy::new(&Config::default()).unwrap();
//! let _ = memory.write(600, 55).unwrap();
//! assert_eq!(memory.read(600).unwrap().value, 55);
//! ```

/// Common types (address mapping, access outcomes, errors).
pub mod common;
/// Simulator configuration (defaults, write policies, hierarchy and memory geometry).
pub mod config;
/// CPU core (architectural state, executor, cache level unit).
pub mod core;
/// Assembly language (instructions, parser, disassembler).
pub mod isa;
/// Program loading, the simulator driver and access tracing.
pub mod sim;
/// Memory system (hierarchy, main store, snapshots).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Executor state; registers, flags, pc and stats.
pub use crate::core::Cpu;
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::Simulator;
/// Cache levels over the main store.
pub use crate::soc::MemoryHierarchy;

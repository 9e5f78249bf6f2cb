//! Simulation driver and program loading.
//!
//! Provides the loader that turns a file into a program, the simulator that runs it
//! against a memory hierarchy, and the optional access trace it records.

/// Program file loading.
pub mod loader;

/// Top-level simulator.
pub mod simulator;

/// Access trace entries.
pub mod trace;

pub use loader::load_program;
pub use simulator::Simulator;
pub use trace::TraceEntry;

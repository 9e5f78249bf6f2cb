//! CPU Core Definition and Initialization.
//!
//! This module defines the central `Cpu` structure, which holds the executor state.
//! It coordinates the following:
//! 1. **State Management:** Maintains registers, flags, program counter and halt state.
//! 2. **Memory Hierarchy:** Issues every load and store through [`MemoryHierarchy`].
//! 3. **Observability:** Records the accesses of the last step and every `dump` snapshot.

/// Instruction execution.
pub mod execution;

/// Memory access handling, operands and the stack.
pub mod memory;

use serde::Serialize;

pub use crate::common::ExecError;
use crate::common::{Access, AccessType};
use crate::core::arch::{Flags, Gpr};
use crate::soc::{HierarchySnapshot, MemoryHierarchy};
use crate::stats::SimStats;

/// A demand access issued while executing one instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemAccess {
    /// Read or write.
    pub kind: AccessType,
    /// Address as issued.
    pub addr: i64,
    /// Hierarchy result.
    pub access: Access,
}

/// Executor state.
#[derive(Clone, Debug)]
pub struct Cpu {
    /// General-purpose registers.
    pub regs: Gpr,
    /// Condition flags.
    pub flags: Flags,
    /// Index of the next instruction.
    pub pc: usize,
    /// Set by `halt` or by running past the last instruction.
    pub halted: bool,
    /// Retirement and memory statistics.
    pub stats: SimStats,
    /// Snapshots taken by `dump`, oldest first.
    pub dumps: Vec<HierarchySnapshot>,
    accesses: Vec<MemAccess>,
}

impl Cpu {
    /// Creates a CPU at `pc = 0` with `esp` one past the last address of `memory`.
    pub fn new(memory: &MemoryHierarchy) -> Self {
        let stack_top = i32::try_from(memory.capacity()).unwrap_or(i32::MAX);
        Self {
            regs: Gpr::new(stack_top),
            flags: Flags::default(),
            pc: 0,
            halted: false,
            stats: SimStats::default(),
            dumps: Vec::new(),
            accesses: Vec::new(),
        }
    }

    /// Demand accesses issued by the most recent [`Cpu::step`], in issue order.
    pub fn accesses(&self) -> &[MemAccess] {
        &self.accesses
    }
}

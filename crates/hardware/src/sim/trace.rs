//! In-memory access trace.
//!
//! When `general.trace_accesses` is set, the simulator appends one entry per demand
//! access. The trace lives only as long as the simulator.

use std::fmt;

use serde::Serialize;

use crate::common::{AccessType, LevelOutcome};
use crate::core::cpu::MemAccess;

/// One demand access together with the instruction that issued it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    /// Retired instruction count before the issuing instruction.
    pub step: u64,
    /// Index of the issuing instruction.
    pub pc: usize,
    /// Disassembled instruction.
    pub instruction: String,
    /// Read or write.
    pub kind: AccessType,
    /// Address.
    pub addr: i64,
    /// Value read or written.
    pub value: i32,
    /// Access latency in nanoseconds.
    pub latency_ns: u64,
    /// Per cache level outcome, top first.
    pub levels: Vec<LevelOutcome>,
}

impl TraceEntry {
    pub(crate) fn new(step: u64, pc: usize, instruction: String, access: &MemAccess) -> Self {
        Self {
            step,
            pc,
            instruction,
            kind: access.kind,
            addr: access.addr,
            value: access.access.value,
            latency_ns: access.access.latency_ns,
            levels: access.access.levels.clone(),
        }
    }

    /// Index of the first cache level that hit, if any.
    pub fn hit_level(&self) -> Option<usize> {
        self.levels.iter().position(|o| o.is_hit())
    }
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            AccessType::Read => 'R',
            AccessType::Write => 'W',
        };
        let outcome: String = self
            .levels
            .iter()
            .map(|o| match o {
                LevelOutcome::Hit => 'H',
                LevelOutcome::Miss => 'M',
                LevelOutcome::Skipped => '-',
            })
            .collect();
        write!(
            f,
            "{:>6} {:>4}  {kind} {:>5} = {:<11} {outcome:<4} {:>4} ns  {}",
            self.step, self.pc, self.addr, self.value, self.latency_ns, self.instruction
        )
    }
}

//! Simulator: owns the CPU, the memory hierarchy and the program side by side.
//!
//! Keeping the hierarchy outside the CPU lets the executor borrow it mutably per step
//! while callers inspect either one between steps.

use tracing::info;

use super::trace::TraceEntry;
use crate::common::{ExecError, SimError};
use crate::config::Config;
use crate::core::Cpu;
use crate::isa::Program;
use crate::soc::MemoryHierarchy;

/// Top-level simulator.
#[derive(Debug)]
pub struct Simulator {
    /// Executor state.
    pub cpu: Cpu,
    /// Cache levels and main store.
    pub memory: MemoryHierarchy,
    /// Program being run.
    pub program: Program,
    /// Access trace, present when `general.trace_accesses` is set.
    pub trace: Option<Vec<TraceEntry>>,
    max_steps: u64,
}

impl Simulator {
    /// Builds the hierarchy described by `config` and applies the program's `.data`
    /// segments to the main store.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Memory`] if the configuration is invalid or a segment lies
    /// outside the main store.
    pub fn new(config: &Config, program: Program) -> Result<Self, SimError> {
        let mut memory = MemoryHierarchy::new(config)?;
        for segment in program.data() {
            memory.load_data(segment.base, &segment.values)?;
        }
        let cpu = Cpu::new(&memory);
        Ok(Self {
            cpu,
            memory,
            program,
            trace: config.general.trace_accesses.then(Vec::new),
            max_steps: config.general.max_steps,
        })
    }

    /// Whether the program has stopped.
    pub const fn is_halted(&self) -> bool {
        self.cpu.halted
    }

    /// Recorded accesses, empty when tracing is off.
    pub fn trace(&self) -> &[TraceEntry] {
        self.trace.as_deref().unwrap_or_default()
    }

    /// Executes one instruction, recording its accesses when tracing.
    ///
    /// # Errors
    ///
    /// Propagates the [`ExecError`] raised by the instruction.
    pub fn step(&mut self) -> Result<(), ExecError> {
        let pc = self.cpu.pc;
        let step = self.cpu.stats.instructions_retired;
        self.cpu.step(&self.program, &mut self.memory)?;

        if let Some(trace) = &mut self.trace {
            if let Some(instruction) = self.program.get(pc) {
                let text = instruction.to_string();
                trace.extend(
                    self.cpu
                        .accesses()
                        .iter()
                        .map(|a| TraceEntry::new(step, pc, text.clone(), a)),
                );
            }
        }
        Ok(())
    }

    /// Runs until the program halts or falls off its end.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::StepLimitExceeded`] once `general.max_steps` instructions
    /// have retired without halting, or the first fault raised by an instruction.
    pub fn run(&mut self) -> Result<(), ExecError> {
        info!(
            instructions = self.program.len(),
            max_steps = self.max_steps,
            "run start"
        );
        while !self.cpu.halted {
            if self.cpu.stats.instructions_retired >= self.max_steps
                && self.program.get(self.cpu.pc).is_some()
            {
                return Err(ExecError::StepLimitExceeded {
                    limit: self.max_steps,
                });
            }
            self.step()?;
        }
        info!(
            retired = self.cpu.stats.instructions_retired,
            mem_latency_ns = self.cpu.stats.mem_latency_ns,
            "run complete"
        );
        Ok(())
    }
}

//! Instruction Execution.
//!
//! This module implements the execute step of the CPU. It performs the following:
//! 1. **Fetch:** Selects the instruction at `pc`; running past the end halts.
//! 2. **Execute:** Applies the instruction to registers, flags and memory.
//! 3. **Control Flow:** Evaluates jump conditions and maintains the call stack.
//! 4. **Retirement:** Advances `pc` and counts the instruction by class.

use tracing::{info, trace};

use super::Cpu;
use crate::common::ExecError;
use crate::core::arch::Flags;
use crate::isa::instruction::{AluOp, Instruction, UnaryOp};
use crate::isa::Program;
use crate::soc::MemoryHierarchy;

/// Result of a shift: value and last bit shifted out, or `None` for a zero count.
fn shift(op: AluOp, value: i32, count: i32) -> Option<(i32, bool)> {
    let count = (count & 31) as u32;
    if count == 0 {
        return None;
    }
    let bits = value as u32;
    match op {
        AluOp::Shl => Some(((bits << count) as i32, (bits >> (32 - count)) & 1 == 1)),
        _ => Some(((bits >> count) as i32, (bits >> (count - 1)) & 1 == 1)),
    }
}

impl Cpu {
    /// Executes one instruction.
    ///
    /// Does nothing once halted. Stepping with `pc` at or past the end of the program
    /// halts without retiring anything.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecError`] when a memory access faults or `ret` pops an invalid
    /// target. The faulting instruction is not retired and `pc` is left on it.
    pub fn step(
        &mut self,
        program: &Program,
        memory: &mut MemoryHierarchy,
    ) -> Result<(), ExecError> {
        self.accesses.clear();
        if self.halted {
            return Ok(());
        }
        let Some(&instruction) = program.get(self.pc) else {
            info!(pc = self.pc, "ran past the last instruction");
            self.halted = true;
            return Ok(());
        };
        trace!(pc = self.pc, %instruction, "execute");

        let mut next = self.pc + 1;
        match instruction {
            Instruction::Mov { dst, src } => {
                let value = self.read_operand(memory, src)?;
                self.write_operand(memory, dst, value)?;
            }
            Instruction::Alu { op, dst, src } => {
                let lhs = self.read_operand(memory, dst)?;
                let rhs = self.read_operand(memory, src)?;
                let (result, flags) = match op {
                    AluOp::Add => (lhs.wrapping_add(rhs), Some(Flags::add(lhs, rhs))),
                    AluOp::Sub => (lhs.wrapping_sub(rhs), Some(Flags::sub(lhs, rhs))),
                    AluOp::And => (lhs & rhs, Some(Flags::logic(lhs & rhs))),
                    AluOp::Or => (lhs | rhs, Some(Flags::logic(lhs | rhs))),
                    AluOp::Xor => (lhs ^ rhs, Some(Flags::logic(lhs ^ rhs))),
                    AluOp::Shl | AluOp::Shr => match shift(op, lhs, rhs) {
                        Some((result, carry)) => (
                            result,
                            Some(Flags {
                                carry,
                                ..Flags::logic(result)
                            }),
                        ),
                        None => (lhs, None),
                    },
                };
                self.write_operand(memory, dst, result)?;
                if let Some(flags) = flags {
                    self.flags = flags;
                }
            }
            Instruction::Cmp { lhs, rhs } => {
                let a = self.read_operand(memory, lhs)?;
                let b = self.read_operand(memory, rhs)?;
                self.flags = Flags::sub(a, b);
            }
            Instruction::Unary { op, dst } => {
                let value = self.read_operand(memory, dst)?;
                let carry = self.flags.carry;
                // inc and dec keep the carry flag; not leaves every flag unchanged.
                let (result, flags) = match op {
                    UnaryOp::Inc => (
                        value.wrapping_add(1),
                        Some(Flags {
                            carry,
                            ..Flags::add(value, 1)
                        }),
                    ),
                    UnaryOp::Dec => (
                        value.wrapping_sub(1),
                        Some(Flags {
                            carry,
                            ..Flags::sub(value, 1)
                        }),
                    ),
                    UnaryOp::Not => (!value, None),
                    UnaryOp::Neg => (value.wrapping_neg(), Some(Flags::sub(0, value))),
                };
                self.write_operand(memory, dst, result)?;
                if let Some(flags) = flags {
                    self.flags = flags;
                }
            }
            Instruction::Push(src) => {
                let value = self.read_operand(memory, src)?;
                self.push(memory, value)?;
            }
            Instruction::Pop(dst) => {
                let value = self.pop(memory)?;
                self.write_operand(memory, dst, value)?;
            }
            Instruction::Jump { cond, target } => {
                if self.flags.holds(cond) {
                    next = target;
                    self.stats.branches_taken += 1;
                }
            }
            Instruction::Call { target } => {
                self.push(memory, i32::try_from(next).unwrap_or(i32::MAX))?;
                next = target;
                self.stats.branches_taken += 1;
            }
            Instruction::Ret => {
                let target = self.pop(memory)?;
                next = usize::try_from(target)
                    .ok()
                    .filter(|&t| t <= program.len())
                    .ok_or(ExecError::BadReturn {
                        pc: self.pc,
                        target,
                    })?;
                self.stats.branches_taken += 1;
            }
            Instruction::Flush => memory.flush(),
            Instruction::Dump => {
                let snapshot = memory.snapshot();
                info!(pc = self.pc, regs = %self.regs, flags = %self.flags, "dump\n{snapshot}");
                self.dumps.push(snapshot);
            }
            Instruction::Nop => {}
            Instruction::Halt => {
                info!(pc = self.pc, "halt");
                self.halted = true;
            }
        }

        self.stats.retire(instruction.class());
        self.pc = next;
        Ok(())
    }
}

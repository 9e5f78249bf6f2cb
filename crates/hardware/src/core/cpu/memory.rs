//! Memory Access Helpers.
//!
//! This module provides the interface between the CPU and the memory hierarchy.
//! It performs the following:
//! 1. **Address Generation:** Computes effective addresses from memory operands.
//! 2. **Demand Accesses:** Issues reads and writes, attributing faults to the current pc.
//! 3. **Accounting:** Adds each access latency to the statistics and records the access
//!    for trace consumers.
//! 4. **Stack:** Push and pop on the downward-growing stack addressed by `esp`.

use super::{Cpu, MemAccess};
use crate::common::{AccessType, ExecError, MemError};
use crate::isa::instruction::MemRef;
use crate::isa::{Operand, Reg};
use crate::soc::MemoryHierarchy;

impl Cpu {
    /// Effective address of a memory operand. Wraps on 32-bit overflow.
    #[inline]
    pub fn effective_address(&self, mem: MemRef) -> i64 {
        let base = mem.base.map_or(0, |r| self.regs.read(r));
        i64::from(base.wrapping_add(mem.disp))
    }

    const fn fault(&self, source: MemError) -> ExecError {
        ExecError::Memory {
            pc: self.pc,
            source,
        }
    }

    /// Demand read through the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Memory`] when the address is out of range.
    pub fn load(&mut self, memory: &mut MemoryHierarchy, addr: i64) -> Result<i32, ExecError> {
        let access = memory.read(addr).map_err(|e| self.fault(e))?;
        self.stats.mem_reads += 1;
        self.stats.mem_latency_ns += access.latency_ns;
        let value = access.value;
        self.accesses.push(MemAccess {
            kind: AccessType::Read,
            addr,
            access,
        });
        Ok(value)
    }

    /// Demand write through the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Memory`] when the address is out of range.
    pub fn store(
        &mut self,
        memory: &mut MemoryHierarchy,
        addr: i64,
        value: i32,
    ) -> Result<(), ExecError> {
        let access = memory.write(addr, value).map_err(|e| self.fault(e))?;
        self.stats.mem_writes += 1;
        self.stats.mem_latency_ns += access.latency_ns;
        self.accesses.push(MemAccess {
            kind: AccessType::Write,
            addr,
            access,
        });
        Ok(())
    }

    /// Reads an operand, loading from memory for memory operands.
    pub(super) fn read_operand(
        &mut self,
        memory: &mut MemoryHierarchy,
        operand: Operand,
    ) -> Result<i32, ExecError> {
        match operand {
            Operand::Reg(r) => Ok(self.regs.read(r)),
            Operand::Imm(v) => Ok(v),
            Operand::Mem(m) => {
                let addr = self.effective_address(m);
                self.load(memory, addr)
            }
        }
    }

    /// Writes an operand, storing to memory for memory operands.
    pub(super) fn write_operand(
        &mut self,
        memory: &mut MemoryHierarchy,
        operand: Operand,
        value: i32,
    ) -> Result<(), ExecError> {
        match operand {
            Operand::Reg(r) => {
                self.regs.write(r, value);
                Ok(())
            }
            Operand::Imm(_) => Err(ExecError::ImmediateDestination { pc: self.pc }),
            Operand::Mem(m) => {
                let addr = self.effective_address(m);
                self.store(memory, addr, value)
            }
        }
    }

    /// Pushes `value`. `esp` only moves once the store succeeds.
    pub(super) fn push(
        &mut self,
        memory: &mut MemoryHierarchy,
        value: i32,
    ) -> Result<(), ExecError> {
        let esp = self.regs.read(Reg::Esp).wrapping_sub(1);
        self.store(memory, i64::from(esp), value)?;
        self.regs.write(Reg::Esp, esp);
        Ok(())
    }

    /// Pops the top of the stack. `esp` only moves once the load succeeds.
    pub(super) fn pop(&mut self, memory: &mut MemoryHierarchy) -> Result<i32, ExecError> {
        let esp = self.regs.read(Reg::Esp);
        let value = self.load(memory, i64::from(esp))?;
        self.regs.write(Reg::Esp, esp.wrapping_add(1));
        Ok(value)
    }
}

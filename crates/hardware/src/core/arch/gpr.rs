//! General-Purpose Register File.
//!
//! This module implements the register file of the executor. It performs the following:
//! 1. **Storage:** Maintains the seven 32-bit registers (`eax`-`edi`, `esp`).
//! 2. **Stack Setup:** Points `esp` one past the last main store address at reset.
//! 3. **Debugging:** Renders the complete register state for dumps and traces.

use std::fmt;

use serde::Serialize;

use crate::isa::Reg;

/// General-Purpose Register file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Gpr {
    regs: [i32; 7],
}

impl Gpr {
    /// Creates a register file with every register zero except `esp`, which is set to
    /// `stack_top`.
    pub const fn new(stack_top: i32) -> Self {
        let mut regs = [0; 7];
        regs[Reg::Esp.index()] = stack_top;
        Self { regs }
    }

    /// Reads a register.
    #[inline]
    pub const fn read(&self, reg: Reg) -> i32 {
        self.regs[reg.index()]
    }

    /// Writes a register.
    #[inline]
    pub const fn write(&mut self, reg: Reg, value: i32) {
        self.regs[reg.index()] = value;
    }

    /// Register values in [`Reg::ALL`] order.
    pub const fn values(&self) -> &[i32; 7] {
        &self.regs
    }
}

impl fmt::Display for Gpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, reg) in Reg::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{reg}={}", self.read(*reg))?;
        }
        Ok(())
    }
}

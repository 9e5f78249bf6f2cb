//! Condition flags.
//!
//! Set by arithmetic, logic, shift and compare instructions with x86 conventions and
//! read by the conditional jumps. Conditions compare signed values.

use std::fmt;

use serde::Serialize;

use crate::isa::instruction::Cond;

/// Zero, sign, carry and overflow flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Flags {
    /// Result was zero.
    pub zero: bool,
    /// Result was negative.
    pub sign: bool,
    /// Unsigned carry or borrow out of bit 31 (last bit shifted out for shifts).
    pub carry: bool,
    /// Signed overflow.
    pub overflow: bool,
}

impl Flags {
    /// Flags after a logic operation: carry and overflow cleared.
    pub const fn logic(result: i32) -> Self {
        Self {
            zero: result == 0,
            sign: result < 0,
            carry: false,
            overflow: false,
        }
    }

    /// Flags after `lhs + rhs`.
    pub const fn add(lhs: i32, rhs: i32) -> Self {
        let (result, overflow) = lhs.overflowing_add(rhs);
        let (_, carry) = (lhs as u32).overflowing_add(rhs as u32);
        Self {
            zero: result == 0,
            sign: result < 0,
            carry,
            overflow,
        }
    }

    /// Flags after `lhs - rhs` (also `cmp lhs, rhs`).
    pub const fn sub(lhs: i32, rhs: i32) -> Self {
        let (result, overflow) = lhs.overflowing_sub(rhs);
        Self {
            zero: result == 0,
            sign: result < 0,
            carry: (lhs as u32) < (rhs as u32),
            overflow,
        }
    }

    /// Evaluates a jump condition.
    pub const fn holds(&self, cond: Cond) -> bool {
        match cond {
            Cond::Always => true,
            Cond::Eq => self.zero,
            Cond::Ne => !self.zero,
            Cond::Lt => self.sign != self.overflow,
            Cond::Le => self.zero || self.sign != self.overflow,
            Cond::Gt => !self.zero && self.sign == self.overflow,
            Cond::Ge => self.sign == self.overflow,
        }
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bit = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}{}",
            bit(self.zero, 'Z'),
            bit(self.sign, 'S'),
            bit(self.carry, 'C'),
            bit(self.overflow, 'O')
        )
    }
}

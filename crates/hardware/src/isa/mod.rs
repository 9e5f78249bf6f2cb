//! Assembly language definitions.
//!
//! A small register machine language used to drive the memory hierarchy:
//!
//! * `instruction`: registers, operands and the decoded instruction forms.
//! * `parse`: the two-pass text parser producing a resolved [`parse::Program`].
//! * `disasm`: `Display` implementations rendering instructions back to text.

/// Instruction disassembler for trace output and diagnostics.
pub mod disasm;

/// Registers, operands and decoded instructions.
pub mod instruction;

/// Program text parser and label resolution.
pub mod parse;

pub use instruction::{Instruction, Operand, Reg};
pub use parse::{DataSegment, Program, parse_program};

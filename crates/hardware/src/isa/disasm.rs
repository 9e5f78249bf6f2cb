//! Instruction disassembler.
//!
//! Renders parsed instructions back to assembly text for trace output and test
//! diagnostics. Resolved targets print as `@index`.
//!
//! # Usage
//!
//! ```
//! use memsim_core::isa::parse::parse_program;
//!
//! let program = parse_program("top: add [eax-4], 0x10\njne top").unwrap();
//! assert_eq!(program.instructions()[0].to_string(), "add [eax-4], 16");
//! assert_eq!(program.instructions()[1].to_string(), "jne @0");
//! ```

use std::fmt;

use super::instruction::{AluOp, Cond, Instruction, MemRef, Operand, Reg, UnaryOp};

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for MemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.base, self.disp) {
            (None, disp) => write!(f, "[{disp}]"),
            (Some(base), 0) => write!(f, "[{base}]"),
            (Some(base), disp) if disp < 0 => write!(f, "[{base}{disp}]"),
            (Some(base), disp) => write!(f, "[{base}+{disp}]"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reg(r) => write!(f, "{r}"),
            Self::Imm(v) => write!(f, "{v}"),
            Self::Mem(m) => write!(f, "{m}"),
        }
    }
}

const fn alu_name(op: AluOp) -> &'static str {
    match op {
        AluOp::Add => "add",
        AluOp::Sub => "sub",
        AluOp::And => "and",
        AluOp::Or => "or",
        AluOp::Xor => "xor",
        AluOp::Shl => "shl",
        AluOp::Shr => "shr",
    }
}

const fn unary_name(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Inc => "inc",
        UnaryOp::Dec => "dec",
        UnaryOp::Not => "not",
        UnaryOp::Neg => "neg",
    }
}

const fn jump_name(cond: Cond) -> &'static str {
    match cond {
        Cond::Always => "jmp",
        Cond::Eq => "je",
        Cond::Ne => "jne",
        Cond::Lt => "jl",
        Cond::Le => "jle",
        Cond::Gt => "jg",
        Cond::Ge => "jge",
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mov { dst, src } => write!(f, "mov {dst}, {src}"),
            Self::Alu { op, dst, src } => write!(f, "{} {dst}, {src}", alu_name(*op)),
            Self::Cmp { lhs, rhs } => write!(f, "cmp {lhs}, {rhs}"),
            Self::Unary { op, dst } => write!(f, "{} {dst}", unary_name(*op)),
            Self::Push(src) => write!(f, "push {src}"),
            Self::Pop(dst) => write!(f, "pop {dst}"),
            Self::Jump { cond, target } => write!(f, "{} @{target}", jump_name(*cond)),
            Self::Call { target } => write!(f, "call @{target}"),
            Self::Ret => f.write_str("ret"),
            Self::Flush => f.write_str("flush"),
            Self::Dump => f.write_str("dump"),
            Self::Nop => f.write_str("nop"),
            Self::Halt => f.write_str("halt"),
        }
    }
}

//! Decoded instruction forms.
//!
//! Programs are parsed once into these types; the executor never sees source text.
//! Jump and call targets are already resolved to instruction indices.

use serde::Serialize;

/// General-purpose register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reg {
    /// Accumulator.
    Eax,
    /// Base.
    Ebx,
    /// Counter.
    Ecx,
    /// Data.
    Edx,
    /// Source index.
    Esi,
    /// Destination index.
    Edi,
    /// Stack pointer.
    Esp,
}

impl Reg {
    /// Every register in register-file order.
    pub const ALL: [Self; 7] = [
        Self::Eax,
        Self::Ebx,
        Self::Ecx,
        Self::Edx,
        Self::Esi,
        Self::Edi,
        Self::Esp,
    ];

    /// Slot in the register file.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Assembly name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eax => "eax",
            Self::Ebx => "ebx",
            Self::Ecx => "ecx",
            Self::Edx => "edx",
            Self::Esi => "esi",
            Self::Edi => "edi",
            Self::Esp => "esp",
        }
    }

    /// Looks a register up by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(name))
    }
}

/// Memory operand: `[disp]`, `[base]` or `[base±disp]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemRef {
    /// Base register, if any.
    pub base: Option<Reg>,
    /// Signed displacement added to the base.
    pub disp: i32,
}

/// Instruction operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Register.
    Reg(Reg),
    /// Immediate value.
    Imm(i32),
    /// Memory location.
    Mem(MemRef),
}

impl Operand {
    /// Whether the operand names a memory location.
    #[inline]
    pub const fn is_mem(&self) -> bool {
        matches!(self, Self::Mem(_))
    }
}

/// Two-operand arithmetic and logic operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AluOp {
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise exclusive or.
    Xor,
    /// Logical shift left.
    Shl,
    /// Logical shift right.
    Shr,
}

/// Single-operand operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Add one.
    Inc,
    /// Subtract one.
    Dec,
    /// Bitwise complement.
    Not,
    /// Two's complement negation.
    Neg,
}

/// Jump condition, evaluated on the flags left by the last flag-setting instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cond {
    /// Unconditional.
    Always,
    /// ZF.
    Eq,
    /// !ZF.
    Ne,
    /// SF != OF.
    Lt,
    /// ZF or SF != OF.
    Le,
    /// !ZF and SF == OF.
    Gt,
    /// SF == OF.
    Ge,
}

/// Retirement class used by the statistics report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstrClass {
    /// Register-only arithmetic, logic, compares and moves.
    Alu,
    /// Moves reading memory.
    Load,
    /// Moves writing memory.
    Store,
    /// Jumps, calls and returns.
    Branch,
    /// Push and pop.
    Stack,
    /// Flush, dump, nop and halt.
    System,
}

/// A parsed instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `mov dst, src`.
    Mov {
        /// Destination.
        dst: Operand,
        /// Source.
        src: Operand,
    },
    /// `add/sub/and/or/xor/shl/shr dst, src`.
    Alu {
        /// Operation.
        op: AluOp,
        /// Destination (also the left operand).
        dst: Operand,
        /// Right operand.
        src: Operand,
    },
    /// `cmp lhs, rhs`: subtraction that only sets flags.
    Cmp {
        /// Left operand.
        lhs: Operand,
        /// Right operand.
        rhs: Operand,
    },
    /// `inc/dec/not/neg dst`.
    Unary {
        /// Operation.
        op: UnaryOp,
        /// Operand, read and written in place.
        dst: Operand,
    },
    /// `push src`.
    Push(Operand),
    /// `pop dst`.
    Pop(Operand),
    /// `jmp` and the conditional jumps.
    Jump {
        /// Condition.
        cond: Cond,
        /// Instruction index.
        target: usize,
    },
    /// `call label`: pushes the return index and jumps.
    Call {
        /// Instruction index.
        target: usize,
    },
    /// `ret`: pops the return index.
    Ret,
    /// `flush`: writes every dirty block back to the main store.
    Flush,
    /// `dump`: logs a snapshot of the hierarchy.
    Dump,
    /// `nop`.
    Nop,
    /// `halt`.
    Halt,
}

impl Instruction {
    /// Statistics class of the instruction.
    pub const fn class(&self) -> InstrClass {
        match self {
            Self::Mov { src, .. } if src.is_mem() => InstrClass::Load,
            Self::Mov { dst, .. } if dst.is_mem() => InstrClass::Store,
            Self::Mov { .. } | Self::Alu { .. } | Self::Cmp { .. } | Self::Unary { .. } => {
                InstrClass::Alu
            }
            Self::Push(_) | Self::Pop(_) => InstrClass::Stack,
            Self::Jump { .. } | Self::Call { .. } | Self::Ret => InstrClass::Branch,
            Self::Flush | Self::Dump | Self::Nop | Self::Halt => InstrClass::System,
        }
    }
}

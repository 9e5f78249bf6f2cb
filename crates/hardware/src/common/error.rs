//! Error definitions.
//!
//! The memory hierarchy raises two failure classes, both before any state is touched:
//! 1. **Out of range:** a demand access names an address outside the main store.
//! 2. **Configuration:** a level's geometry is non-positive or inconsistent; only
//!    raised while building a hierarchy, never at access time.
//!
//! Above it sit program parse errors, execution faults, and the umbrella error
//! returned by the loader and simulator.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the memory hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MemError {
    /// Address lies outside `[0, capacity)`.
    ///
    /// Signed so that negative addresses computed by the executor are reported as
    /// they were issued.
    #[error("address {addr} out of range [0, {capacity})")]
    OutOfRange {
        /// Offending address.
        addr: i64,
        /// Capacity of the main store, in units.
        capacity: usize,
    },

    /// Construction-time configuration problem.
    #[error("invalid configuration for {level}: {reason}")]
    Configuration {
        /// Name of the level (or `"memory"` for the main store).
        level: String,
        /// Human readable description of the inconsistency.
        reason: String,
    },
}

impl MemError {
    /// Builds a [`MemError::Configuration`] for `level`.
    pub fn config(level: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            level: level.into(),
            reason: reason.into(),
        }
    }
}

/// Assembly source errors. Lines are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    /// First word of an instruction line is not a known mnemonic.
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic {
        /// Source line.
        line: usize,
        /// Offending word.
        mnemonic: String,
    },

    /// Wrong number of operands.
    #[error("line {line}: `{mnemonic}` takes {expected} operand(s), found {found}")]
    OperandCount {
        /// Source line.
        line: usize,
        /// Mnemonic.
        mnemonic: String,
        /// Required count.
        expected: usize,
        /// Count present.
        found: usize,
    },

    /// Operand text is not a register, immediate or memory reference.
    #[error("line {line}: invalid operand `{text}`")]
    InvalidOperand {
        /// Source line.
        line: usize,
        /// Offending text.
        text: String,
    },

    /// Operands are individually valid but not in this combination.
    #[error("line {line}: {reason}")]
    IllegalOperands {
        /// Source line.
        line: usize,
        /// What is wrong.
        reason: &'static str,
    },

    /// Label name is malformed.
    #[error("line {line}: invalid label `{label}`")]
    InvalidLabel {
        /// Source line.
        line: usize,
        /// Offending name.
        label: String,
    },

    /// Label defined more than once.
    #[error("line {line}: label `{label}` already defined")]
    DuplicateLabel {
        /// Line of the second definition.
        line: usize,
        /// Label name.
        label: String,
    },

    /// Jump or call names a label that is never defined.
    #[error("line {line}: undefined label `{label}`")]
    UndefinedLabel {
        /// Line of the reference.
        line: usize,
        /// Label name.
        label: String,
    },

    /// Malformed or unknown directive.
    #[error("line {line}: {reason}")]
    Directive {
        /// Source line.
        line: usize,
        /// What is wrong.
        reason: String,
    },
}

/// Faults raised while executing a program.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExecError {
    /// A memory access was rejected by the hierarchy.
    #[error("memory fault at pc {pc}: {source}")]
    Memory {
        /// Index of the faulting instruction.
        pc: usize,
        /// Hierarchy error.
        #[source]
        source: MemError,
    },

    /// `ret` popped a value that is not an instruction index.
    #[error("return to invalid address {target} at pc {pc}")]
    BadReturn {
        /// Index of the `ret`.
        pc: usize,
        /// Popped value.
        target: i32,
    },

    /// An instruction built outside the parser names an immediate as its destination.
    #[error("immediate destination at pc {pc}")]
    ImmediateDestination {
        /// Index of the instruction.
        pc: usize,
    },

    /// The configured step budget ran out before the program halted.
    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded {
        /// Budget.
        limit: u64,
    },
}

/// Errors surfaced by the loader and the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// Program file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Program text is invalid.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Hierarchy could not be built or preloaded.
    #[error(transparent)]
    Memory(#[from] MemError),

    /// Execution fault.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

//! Assembly parser.
//!
//! Turns program text into a [`Program`] in two passes:
//! 1. **Scan:** strips comments, records label definitions and `.data` directives, and
//!    parses each instruction with its jump targets left symbolic.
//! 2. **Resolve:** replaces every symbolic target with an instruction index.
//!
//! A label may be defined on its own line or in front of an instruction, and refers
//! to the next instruction. A label after the last instruction is legal; jumping to
//! it ends the program.

use std::collections::BTreeMap;

use super::instruction::{AluOp, Cond, Instruction, MemRef, Operand, Reg, UnaryOp};
pub use crate::common::ParseError;

/// Values placed in the main store before execution by a `.data` directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataSegment {
    /// First address.
    pub base: i64,
    /// Values for consecutive addresses.
    pub values: Vec<i32>,
    /// Source line of the directive.
    pub line: usize,
}

/// A parsed, fully resolved program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    lines: Vec<usize>,
    labels: BTreeMap<String, usize>,
    data: Vec<DataSegment>,
}

impl Program {
    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Instruction at `pc`.
    #[inline]
    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    /// Source line of the instruction at `pc`.
    pub fn line(&self, pc: usize) -> Option<usize> {
        self.lines.get(pc).copied()
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction index a label refers to.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// All labels, by name.
    pub const fn labels(&self) -> &BTreeMap<String, usize> {
        &self.labels
    }

    /// `.data` segments in source order.
    pub fn data(&self) -> &[DataSegment] {
        &self.data
    }
}

/// Jump or call whose label is resolved in the second pass.
#[derive(Debug)]
struct Fixup {
    index: usize,
    line: usize,
    label: String,
}

/// Parses program text.
///
/// # Errors
///
/// Returns the first [`ParseError`] in source order; undefined labels are reported
/// after the whole text has been scanned.
///
/// # Examples
///
/// ```
/// use memsim_core::isa::parse::parse_program;
///
/// let program = parse_program("mov eax, 5\nloop: dec eax\njne loop\nhalt").unwrap();
/// assert_eq!(program.len(), 4);
/// assert_eq!(program.label("loop"), Some(1));
/// ```
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let mut program = Program::default();
    let mut fixups = Vec::new();

    for (number, raw) in source.lines().enumerate() {
        let line = number + 1;
        let mut text = raw.split_once(';').map_or(raw, |(code, _)| code).trim();

        while let Some((head, rest)) = split_label(text) {
            if !is_identifier(head) {
                return Err(ParseError::InvalidLabel {
                    line,
                    label: head.to_string(),
                });
            }
            if program
                .labels
                .insert(head.to_string(), program.instructions.len())
                .is_some()
            {
                return Err(ParseError::DuplicateLabel {
                    line,
                    label: head.to_string(),
                });
            }
            text = rest.trim_start();
        }
        if text.is_empty() {
            continue;
        }

        let (word, rest) = text
            .split_once(char::is_whitespace)
            .map_or((text, ""), |(w, r)| (w, r.trim()));
        let mnemonic = word.to_ascii_lowercase();
        let operands = split_operands(rest, line)?;

        if mnemonic.starts_with('.') {
            program.data.push(parse_directive(&mnemonic, &operands, line)?);
            continue;
        }

        let index = program.instructions.len();
        let instruction = match parse_instruction(&mnemonic, &operands, line)? {
            Parsed::Ready(instruction) => instruction,
            Parsed::Branch(instruction, label) => {
                fixups.push(Fixup { index, line, label });
                instruction
            }
        };
        program.instructions.push(instruction);
        program.lines.push(line);
    }

    for fixup in fixups {
        let Some(&resolved) = program.labels.get(&fixup.label) else {
            return Err(ParseError::UndefinedLabel {
                line: fixup.line,
                label: fixup.label,
            });
        };
        match &mut program.instructions[fixup.index] {
            Instruction::Jump { target, .. } | Instruction::Call { target } => *target = resolved,
            _ => {}
        }
    }

    Ok(program)
}

enum Parsed {
    Ready(Instruction),
    Branch(Instruction, String),
}

/// Splits `name:` off the front of a line. Colons inside operands never occur.
fn split_label(text: &str) -> Option<(&str, &str)> {
    let (head, rest) = text.split_once(':')?;
    Some((head.trim(), rest))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '.')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Splits on commas and whitespace outside brackets.
fn split_operands(text: &str, line: usize) -> Result<Vec<String>, ParseError> {
    let mut operands = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;

    for c in text.chars() {
        match c {
            '[' if !in_brackets => {
                in_brackets = true;
                current.push(c);
            }
            ']' if in_brackets => {
                in_brackets = false;
                current.push(c);
            }
            c if in_brackets && c.is_whitespace() => {}
            c if !in_brackets && (c == ',' || c.is_whitespace()) => {
                if !current.is_empty() {
                    operands.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if in_brackets {
        return Err(ParseError::InvalidOperand {
            line,
            text: current,
        });
    }
    if !current.is_empty() {
        operands.push(current);
    }
    Ok(operands)
}

/// Parses an immediate: decimal or `0x` hex, optionally signed and `#` prefixed.
///
/// Values up to `u32::MAX` are accepted and reinterpreted as two's complement.
fn parse_imm(text: &str) -> Option<i32> {
    let text = text.strip_prefix('#').unwrap_or(text);
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) if hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            i64::from_str_radix(hex, 16).ok()?
        }
        None if digits.chars().all(|c| c.is_ascii_digit()) => digits.parse::<i64>().ok()?,
        _ => return None,
    };
    let value = if negative { -magnitude } else { magnitude };
    if value < i64::from(i32::MIN) || value > i64::from(u32::MAX) {
        return None;
    }
    Some(value as u32 as i32)
}

fn parse_mem(inner: &str) -> Option<MemRef> {
    if let Some(disp) = parse_imm(inner) {
        return Some(MemRef { base: None, disp });
    }
    let split = inner
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '+' || c == '-')
        .map(|(i, _)| i);
    let (base, disp) = match split {
        Some(i) => {
            let (reg, offset) = inner.split_at(i);
            (reg, parse_imm(offset)?)
        }
        None => (inner, 0),
    };
    Some(MemRef {
        base: Some(Reg::from_name(base)?),
        disp,
    })
}

fn parse_operand(text: &str, line: usize) -> Result<Operand, ParseError> {
    let operand = if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        parse_mem(inner).map(Operand::Mem)
    } else if let Some(reg) = Reg::from_name(text) {
        Some(Operand::Reg(reg))
    } else {
        parse_imm(text).map(Operand::Imm)
    };
    operand.ok_or_else(|| ParseError::InvalidOperand {
        line,
        text: text.to_string(),
    })
}

fn expect_count(
    mnemonic: &str,
    operands: &[String],
    expected: usize,
    line: usize,
) -> Result<(), ParseError> {
    if operands.len() == expected {
        Ok(())
    } else {
        Err(ParseError::OperandCount {
            line,
            mnemonic: mnemonic.to_string(),
            expected,
            found: operands.len(),
        })
    }
}

/// Two operands, the first writable, at most one in memory.
fn binary(
    mnemonic: &str,
    operands: &[String],
    line: usize,
) -> Result<(Operand, Operand), ParseError> {
    expect_count(mnemonic, operands, 2, line)?;
    let dst = parse_operand(&operands[0], line)?;
    let src = parse_operand(&operands[1], line)?;
    if matches!(dst, Operand::Imm(_)) {
        return Err(ParseError::IllegalOperands {
            line,
            reason: "first operand cannot be an immediate",
        });
    }
    if dst.is_mem() && src.is_mem() {
        return Err(ParseError::IllegalOperands {
            line,
            reason: "at most one memory operand is allowed",
        });
    }
    Ok((dst, src))
}

fn unary(mnemonic: &str, operands: &[String], line: usize) -> Result<Operand, ParseError> {
    expect_count(mnemonic, operands, 1, line)?;
    let dst = parse_operand(&operands[0], line)?;
    if matches!(dst, Operand::Imm(_)) {
        return Err(ParseError::IllegalOperands {
            line,
            reason: "operand cannot be an immediate",
        });
    }
    Ok(dst)
}

fn branch_target(mnemonic: &str, operands: &[String], line: usize) -> Result<String, ParseError> {
    expect_count(mnemonic, operands, 1, line)?;
    let label = &operands[0];
    if !is_identifier(label) {
        return Err(ParseError::InvalidLabel {
            line,
            label: label.clone(),
        });
    }
    Ok(label.clone())
}

fn parse_instruction(
    mnemonic: &str,
    operands: &[String],
    line: usize,
) -> Result<Parsed, ParseError> {
    let alu = |op| {
        binary(mnemonic, operands, line).map(|(dst, src)| Instruction::Alu { op, dst, src })
    };
    let single = |op| unary(mnemonic, operands, line).map(|dst| Instruction::Unary { op, dst });
    let jump = |cond| {
        branch_target(mnemonic, operands, line)
            .map(|label| Parsed::Branch(Instruction::Jump { cond, target: 0 }, label))
    };
    let bare = |instruction| expect_count(mnemonic, operands, 0, line).map(|()| instruction);

    let instruction = match mnemonic {
        "mov" => binary(mnemonic, operands, line).map(|(dst, src)| Instruction::Mov { dst, src }),
        "add" => alu(AluOp::Add),
        "sub" => alu(AluOp::Sub),
        "and" => alu(AluOp::And),
        "or" => alu(AluOp::Or),
        "xor" => alu(AluOp::Xor),
        "shl" => alu(AluOp::Shl),
        "shr" => alu(AluOp::Shr),
        "cmp" => {
            binary(mnemonic, operands, line).map(|(lhs, rhs)| Instruction::Cmp { lhs, rhs })
        }
        "inc" => single(UnaryOp::Inc),
        "dec" => single(UnaryOp::Dec),
        "not" => single(UnaryOp::Not),
        "neg" => single(UnaryOp::Neg),
        "push" => {
            expect_count(mnemonic, operands, 1, line)?;
            parse_operand(&operands[0], line).map(Instruction::Push)
        }
        "pop" => unary(mnemonic, operands, line).map(Instruction::Pop),
        "jmp" => return jump(Cond::Always),
        "je" | "jz" => return jump(Cond::Eq),
        "jne" | "jnz" => return jump(Cond::Ne),
        "jl" => return jump(Cond::Lt),
        "jle" => return jump(Cond::Le),
        "jg" => return jump(Cond::Gt),
        "jge" => return jump(Cond::Ge),
        "call" => {
            return branch_target(mnemonic, operands, line)
                .map(|label| Parsed::Branch(Instruction::Call { target: 0 }, label));
        }
        "ret" => bare(Instruction::Ret),
        "flush" => bare(Instruction::Flush),
        "dump" => bare(Instruction::Dump),
        "nop" => bare(Instruction::Nop),
        "halt" | "hlt" => bare(Instruction::Halt),
        _ => Err(ParseError::UnknownMnemonic {
            line,
            mnemonic: mnemonic.to_string(),
        }),
    }?;
    Ok(Parsed::Ready(instruction))
}

fn parse_directive(
    directive: &str,
    operands: &[String],
    line: usize,
) -> Result<DataSegment, ParseError> {
    if directive != ".data" {
        return Err(ParseError::Directive {
            line,
            reason: format!("unknown directive `{directive}`"),
        });
    }
    let Some((base, values)) = operands.split_first().filter(|(_, v)| !v.is_empty()) else {
        return Err(ParseError::Directive {
            line,
            reason: "`.data` takes an address and at least one value".to_string(),
        });
    };
    let base = parse_imm(base).ok_or_else(|| ParseError::InvalidOperand {
        line,
        text: base.clone(),
    })?;
    let values = values
        .iter()
        .map(|v| {
            parse_imm(v).ok_or_else(|| ParseError::InvalidOperand {
                line,
                text: v.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DataSegment {
        base: i64::from(base),
        values,
        line,
    })
}

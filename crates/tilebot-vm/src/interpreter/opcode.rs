// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use tilebot_core::Direction;

/// One of the sixteen registers `r0`..`rf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(u8);

impl Register {
    /// The register with the given index, if it is below 16.
    pub fn new(index: u8) -> Option<Self> {
        (index < 16).then_some(Self(index))
    }

    /// Parses `r0`..`r9`, `ra`..`rf` (case-insensitive).
    pub fn parse(token: &str) -> Option<Self> {
        let mut chars = token.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some('r' | 'R'), Some(digit), None) => {
                digit.to_digit(16).map(|index| Self(index as u8))
            }
            _ => None,
        }
    }

    /// Position in the register file.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{:x}", self.0)
    }
}

/// An instruction argument: a register (read for its value, or written) or an
/// integer literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// A register.
    Register(Register),
    /// A literal value.
    Literal(i64),
}

impl Operand {
    /// Parses a token. Returns `None` when it is neither a register nor an
    /// integer.
    pub fn parse(token: &str) -> Option<Self> {
        if let Some(register) = Register::parse(token) {
            return Some(Operand::Register(register));
        }
        token.parse::<i64>().ok().map(Operand::Literal)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(register) => write!(f, "{register}"),
            Operand::Literal(value) => write!(f, "{value}"),
        }
    }
}

/// A reference to a label, resolved against the label table at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRef {
    /// The label as written.
    pub name: String,
    /// The instruction index the label is bound to; `None` when undefined.
    pub target: Option<usize>,
}

/// Arithmetic opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// `reg ← val`
    Copy,
    /// `reg ← reg + val`
    Add,
    /// `reg ← reg - val`
    Sub,
    /// `reg ← reg * val`
    Mul,
}

impl ArithOp {
    /// Combines the current register value with the operand value.
    pub fn apply(self, current: i64, value: i64) -> i64 {
        match self {
            ArithOp::Copy => value,
            ArithOp::Add => current.wrapping_add(value),
            ArithOp::Sub => current.wrapping_sub(value),
            ArithOp::Mul => current.wrapping_mul(value),
        }
    }
}

/// One parsed program line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `up`, `down`, `left`, `right` and their arrow aliases.
    Move(Direction),
    /// `interact`
    Interact,
    /// `copy`, `add`, `sub`, `mul`.
    Arith {
        /// The operation.
        op: ArithOp,
        /// Destination; writing to a literal is a no-op.
        dst: Operand,
        /// Source value.
        src: Operand,
    },
    /// `jump label`
    Jump(LabelRef),
    /// `call label`
    Call(LabelRef),
    /// `return`
    Return,
    /// `ifZero val label`
    IfZero {
        /// Tested value.
        value: Operand,
        /// Branch target.
        label: LabelRef,
    },
    /// `ifEmpty label`
    IfEmpty(LabelRef),
    /// `push val`
    Push(Operand),
    /// `pop reg`
    Pop(Operand),
    /// An unknown opcode, executed as a no-op.
    Nop {
        /// The opcode as written.
        opcode: String,
    },
}

impl Instruction {
    /// Returns the label reference of a control-transfer instruction.
    pub fn label(&self) -> Option<&LabelRef> {
        match self {
            Instruction::Jump(label)
            | Instruction::Call(label)
            | Instruction::IfEmpty(label)
            | Instruction::IfZero { label, .. } => Some(label),
            _ => None,
        }
    }

    pub(crate) fn label_mut(&mut self) -> Option<&mut LabelRef> {
        match self {
            Instruction::Jump(label)
            | Instruction::Call(label)
            | Instruction::IfEmpty(label)
            | Instruction::IfZero { label, .. } => Some(label),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_are_hex_digits() {
        assert_eq!(Register::parse("r0").map(Register::index), Some(0));
        assert_eq!(Register::parse("RF").map(Register::index), Some(15));
        assert_eq!(Register::parse("rg"), None);
        assert_eq!(Register::parse("r10"), None);
        assert_eq!(Register::new(11).map(|r| r.to_string()), Some("rb".to_string()));
    }

    #[test]
    fn operands_prefer_registers() {
        assert_eq!(Operand::parse("ra"), Register::parse("ra").map(Operand::Register));
        assert_eq!(Operand::parse("-7"), Some(Operand::Literal(-7)));
        assert_eq!(Operand::parse("seven"), None);
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(ArithOp::Add.apply(i64::MAX, 1), i64::MIN);
        assert_eq!(ArithOp::Copy.apply(3, 9), 9);
        assert_eq!(ArithOp::Mul.apply(-2, 4), -8);
    }
}

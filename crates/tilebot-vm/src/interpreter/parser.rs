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

use super::opcode::{ArithOp, Instruction, LabelRef, Operand};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tilebot_core::Direction;

/// Something questionable found while parsing. Diagnostics never stop a
/// program from running; each case has a defined runtime behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    /// The opcode is not part of the instruction set; it runs as a no-op.
    #[error("unknown opcode '{0}'")]
    UnknownOpcode(String),
    /// A control transfer names a label that is never defined; it falls
    /// through.
    #[error("undefined label '{0}'")]
    UndefinedLabel(String),
    /// A label is defined twice; the first definition wins.
    #[error("label '{0}' is already defined")]
    DuplicateLabel(String),
    /// An operand is neither a register nor an integer; it reads as `0`.
    #[error("'{0}' is neither a register nor an integer")]
    InvalidOperand(String),
    /// A destination is not a register; the write is skipped.
    #[error("'{0}' is not a register")]
    NotARegister(String),
    /// Wrong number of arguments. Missing ones read as `0`, extra ones are
    /// ignored.
    #[error("'{opcode}' takes {expected} argument(s), found {found}")]
    Arity {
        /// The opcode.
        opcode: String,
        /// Expected arguments.
        expected: usize,
        /// Arguments found.
        found: usize,
    },
}

/// A [`DiagnosticKind`] with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Source line, starting at 1.
    pub line: usize,
    /// What was found.
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// A parsed program: instructions, label table and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    lines: Vec<usize>,
    labels: BTreeMap<String, usize>,
    diagnostics: Vec<Diagnostic>,
}

fn is_comment(line: &str) -> bool {
    line.starts_with("//") || line.starts_with('#')
}

struct LineParser<'a> {
    line: usize,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl LineParser<'_> {
    fn report(&mut self, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic {
            line: self.line,
            kind,
        });
    }

    fn operand(&mut self, token: Option<&str>) -> Operand {
        match token {
            Some(token) => Operand::parse(token).unwrap_or_else(|| {
                self.report(DiagnosticKind::InvalidOperand(token.to_string()));
                Operand::Literal(0)
            }),
            None => Operand::Literal(0),
        }
    }

    fn destination(&mut self, token: Option<&str>) -> Operand {
        let operand = self.operand(token);
        if let (Operand::Literal(_), Some(token)) = (operand, token) {
            self.report(DiagnosticKind::NotARegister(token.to_string()));
        }
        operand
    }

    fn label(token: Option<&str>) -> LabelRef {
        LabelRef {
            name: token.unwrap_or_default().to_string(),
            target: None,
        }
    }

    fn instruction(&mut self, opcode: &str, args: &[&str]) -> Instruction {
        let lower = opcode.to_ascii_lowercase();
        let expected = match lower.as_str() {
            "copy" | "add" | "sub" | "mul" | "ifzero" => 2,
            "jump" | "call" | "ifempty" | "push" | "pop" => 1,
            _ => 0,
        };
        let known = Direction::from_token(&lower).is_some()
            || matches!(
                lower.as_str(),
                "interact" | "return" | "copy" | "add" | "sub" | "mul" | "jump" | "call"
                    | "ifzero" | "ifempty" | "push" | "pop"
            );
        if known && args.len() != expected {
            self.report(DiagnosticKind::Arity {
                opcode: opcode.to_string(),
                expected,
                found: args.len(),
            });
        }

        let first = args.first().copied();
        let second = args.get(1).copied();
        if let Some(direction) = Direction::from_token(&lower) {
            return Instruction::Move(direction);
        }
        match lower.as_str() {
            "interact" => Instruction::Interact,
            "copy" | "add" | "sub" | "mul" => {
                let op = match lower.as_str() {
                    "copy" => ArithOp::Copy,
                    "add" => ArithOp::Add,
                    "sub" => ArithOp::Sub,
                    _ => ArithOp::Mul,
                };
                Instruction::Arith {
                    op,
                    dst: self.destination(first),
                    src: self.operand(second),
                }
            }
            "jump" => Instruction::Jump(Self::label(first)),
            "call" => Instruction::Call(Self::label(first)),
            "return" => Instruction::Return,
            "ifzero" => Instruction::IfZero {
                value: self.operand(first),
                label: Self::label(second),
            },
            "ifempty" => Instruction::IfEmpty(Self::label(first)),
            "push" => Instruction::Push(self.operand(first)),
            "pop" => Instruction::Pop(self.destination(first)),
            _ => {
                self.report(DiagnosticKind::UnknownOpcode(opcode.to_string()));
                Instruction::Nop {
                    opcode: opcode.to_string(),
                }
            }
        }
    }
}

impl Program {
    /// Parses program text.
    ///
    /// Blank lines and lines starting with `//` or `#` are dropped. A line
    /// ending in `:` binds a label to the index of the next instruction.
    /// Every other line is split on whitespace into an opcode and its
    /// arguments. Label references are resolved once every line is read.
    pub fn parse(text: &str) -> Self {
        let mut program = Program::default();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || is_comment(line) {
                continue;
            }
            let mut parser = LineParser {
                line: index + 1,
                diagnostics: &mut program.diagnostics,
            };

            if let Some(name) = line.strip_suffix(':') {
                let name = name.trim().to_string();
                if program.labels.contains_key(&name) {
                    parser.report(DiagnosticKind::DuplicateLabel(name));
                } else {
                    program.labels.insert(name, program.instructions.len());
                }
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            let Some((opcode, args)) = tokens.split_first() else {
                continue;
            };
            let instruction = parser.instruction(opcode, args);
            program.instructions.push(instruction);
            program.lines.push(index + 1);
        }

        for (instruction, line) in program.instructions.iter_mut().zip(&program.lines) {
            let Some(label) = instruction.label_mut() else {
                continue;
            };
            label.target = program.labels.get(&label.name).copied();
            if label.target.is_none() && !label.name.is_empty() {
                program.diagnostics.push(Diagnostic {
                    line: *line,
                    kind: DiagnosticKind::UndefinedLabel(label.name.clone()),
                });
            }
        }
        program.diagnostics.sort_by_key(|diagnostic| diagnostic.line);

        log::debug!(
            "Parsed {} instruction(s), {} label(s), {} diagnostic(s).",
            program.instructions.len(),
            program.labels.len(),
            program.diagnostics.len()
        );
        program
    }

    /// The instruction list.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The instruction at `pc`.
    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` when the program has no instruction.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Source line of the instruction at `pc`.
    pub fn line_of(&self, pc: usize) -> Option<usize> {
        self.lines.get(pc).copied()
    }

    /// The instruction index a label is bound to.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// The label table.
    pub fn labels(&self) -> &BTreeMap<String, usize> {
        &self.labels
    }

    /// Everything questionable found while parsing, by line.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

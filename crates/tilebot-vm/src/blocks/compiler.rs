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

//! One-way block to program text compiler.
//!
//! A block sequence always compiles. Blank label names are synthesized. A
//! label reference to a name no `label` block defines becomes
//! [`LABEL_PLACEHOLDER`], which the parser reports as an undefined label.

use super::palette::{ArgKind, LABEL_PLACEHOLDER};
use super::program::Block;
use std::collections::BTreeSet;

/// Hands out `labelN` names that collide with no user-defined label.
struct LabelNames<'a> {
    taken: &'a BTreeSet<&'a str>,
    counter: usize,
}

impl LabelNames<'_> {
    fn fresh(&mut self) -> String {
        loop {
            self.counter += 1;
            let name = format!("label{}", self.counter);
            if !self.taken.contains(name.as_str()) {
                return name;
            }
        }
    }
}

/// Compiles `blocks`, in order, into line-oriented program text.
pub fn compile(blocks: &[Block]) -> String {
    let defined: BTreeSet<&str> = blocks.iter().filter_map(Block::defined_label).collect();
    let mut names = LabelNames {
        taken: &defined,
        counter: 0,
    };
    let mut lines = Vec::with_capacity(blocks.len());

    for block in blocks {
        let Some(template) = block.template() else {
            log::warn!("Skipping block {} with unknown opcode '{}'.", block.id, block.opcode);
            continue;
        };

        if template.is_label() {
            let name = match block.defined_label() {
                Some(name) => name.to_string(),
                None => names.fresh(),
            };
            lines.push(format!("{name}:"));
            continue;
        }

        let mut line = template.opcode.to_string();
        for (position, kind) in template.args.iter().enumerate() {
            let raw = block
                .inputs
                .get(position)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty());
            let value = match kind {
                ArgKind::LabelRef => match raw {
                    Some(name) if defined.contains(name) => name,
                    _ => {
                        log::debug!("Block {} references no defined label.", block.id);
                        LABEL_PLACEHOLDER
                    }
                },
                other => raw.unwrap_or(other.default_value()),
            };
            line.push(' ');
            line.push_str(value);
        }
        lines.push(line);
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockProgram;

    #[test]
    fn blank_labels_get_unique_names() {
        let mut program = BlockProgram::new();
        program.add("label", None).unwrap();
        let named = program.add("label", None).unwrap();
        program.set_input(named, 0, "label1").unwrap();
        program.add("label", None).unwrap();

        assert_eq!(program.compile(), "label2:\nlabel1:\nlabel3:");
    }

    #[test]
    fn stale_label_reference_emits_placeholder() {
        let mut program = BlockProgram::new();
        let jump = program.add("jump", None).unwrap();
        program.set_input(jump, 0, "gone").unwrap();
        assert_eq!(program.compile(), format!("jump {LABEL_PLACEHOLDER}"));
    }

    #[test]
    fn blank_value_inputs_fall_back_to_defaults() {
        let mut program = BlockProgram::new();
        let copy = program.add("copy", None).unwrap();
        program.set_input(copy, 0, "").unwrap();
        program.set_input(copy, 1, "").unwrap();
        assert_eq!(program.compile(), "copy r0 0");
    }
}

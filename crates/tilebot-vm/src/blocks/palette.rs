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

/// The kind of value a block input holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A register name, `r0`..`rf`.
    Register,
    /// The name of a label defined by a `label` block.
    LabelRef,
    /// The name a `label` block defines.
    LabelDef,
    /// A register or an integer literal.
    Value,
}

impl ArgKind {
    /// Initial value of a fresh input.
    pub fn default_value(self) -> &'static str {
        match self {
            ArgKind::Register => "r0",
            ArgKind::LabelRef => LABEL_PLACEHOLDER,
            ArgKind::LabelDef => "",
            ArgKind::Value => "0",
        }
    }
}

/// Text emitted for a label reference that names no defined label.
pub const LABEL_PLACEHOLDER: &str = "<label>";

/// A palette entry: an opcode and the kinds of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTemplate {
    /// Opcode, as written in program text.
    pub opcode: &'static str,
    /// Input kinds, in order.
    pub args: &'static [ArgKind],
}

impl BlockTemplate {
    /// Returns `true` for the block that defines a label instead of emitting
    /// an instruction.
    pub fn is_label(&self) -> bool {
        matches!(self.args, [ArgKind::LabelDef])
    }
}

const fn template(opcode: &'static str, args: &'static [ArgKind]) -> BlockTemplate {
    BlockTemplate { opcode, args }
}

/// Every block the editor offers.
pub const PALETTE: &[BlockTemplate] = &[
    template("up", &[]),
    template("down", &[]),
    template("left", &[]),
    template("right", &[]),
    template("interact", &[]),
    template("copy", &[ArgKind::Register, ArgKind::Value]),
    template("add", &[ArgKind::Register, ArgKind::Value]),
    template("sub", &[ArgKind::Register, ArgKind::Value]),
    template("mul", &[ArgKind::Register, ArgKind::Value]),
    template("jump", &[ArgKind::LabelRef]),
    template("call", &[ArgKind::LabelRef]),
    template("return", &[]),
    template("ifZero", &[ArgKind::Value, ArgKind::LabelRef]),
    template("ifEmpty", &[ArgKind::LabelRef]),
    template("push", &[ArgKind::Value]),
    template("pop", &[ArgKind::Register]),
    template("label", &[ArgKind::LabelDef]),
];

/// Looks up a palette entry (case-insensitive).
pub fn lookup(opcode: &str) -> Option<&'static BlockTemplate> {
    PALETTE
        .iter()
        .find(|template| template.opcode.eq_ignore_ascii_case(opcode))
}

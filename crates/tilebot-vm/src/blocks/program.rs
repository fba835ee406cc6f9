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

use super::compiler;
use super::palette::{self, BlockTemplate};
use crate::error::BlockError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One block instance in the editor sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Stable id, unique within its sequence.
    pub id: u32,
    /// Palette opcode.
    pub opcode: String,
    /// Current input values.
    #[serde(default)]
    pub inputs: Vec<String>,
}

impl Block {
    /// The palette entry of the block.
    pub fn template(&self) -> Option<&'static BlockTemplate> {
        palette::lookup(&self.opcode)
    }

    /// The label a `label` block defines, if it has a name.
    pub fn defined_label(&self) -> Option<&str> {
        let template = self.template()?;
        if !template.is_label() {
            return None;
        }
        self.inputs
            .first()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
    }
}

/// The reorderable block sequence of the block editor.
///
/// Serializes as the bare array of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Block>", into = "Vec<Block>")]
pub struct BlockProgram {
    blocks: Vec<Block>,
    next_id: u32,
}

impl TryFrom<Vec<Block>> for BlockProgram {
    type Error = BlockError;

    /// Adopts a stored sequence.
    ///
    /// ## Arguments
    /// * `blocks` - The blocks in visual order, with their stored ids.
    ///
    /// ## Returns
    /// The sequence, with new ids handed out after the largest stored one.
    /// [`BlockError::IdsExhausted`] when a stored id is `u32::MAX`.
    fn try_from(blocks: Vec<Block>) -> Result<Self, Self::Error> {
        let next_id = match blocks.iter().map(|block| block.id).max() {
            Some(max) => max.checked_add(1).ok_or(BlockError::IdsExhausted)?,
            None => 0,
        };
        Ok(Self { blocks, next_id })
    }
}

impl From<BlockProgram> for Vec<Block> {
    fn from(program: BlockProgram) -> Self {
        program.blocks
    }
}

impl BlockProgram {
    /// An empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// The blocks in visual order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` when the sequence holds no block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn position(&self, id: u32) -> Result<usize, BlockError> {
        self.blocks
            .iter()
            .position(|block| block.id == id)
            .ok_or(BlockError::NoSuchBlock(id))
    }

    /// Adds a block with default inputs.
    ///
    /// ## Arguments
    /// * `opcode` - Palette opcode, matched case-insensitively.
    /// * `index` - Insert position. `None` or an index past the end appends.
    ///
    /// ## Returns
    /// The new block id, [`BlockError::UnknownOpcode`] for an opcode outside
    /// the palette or [`BlockError::IdsExhausted`] once every id is used.
    pub fn add(&mut self, opcode: &str, index: Option<usize>) -> Result<u32, BlockError> {
        let template =
            palette::lookup(opcode).ok_or_else(|| BlockError::UnknownOpcode(opcode.to_string()))?;
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(BlockError::IdsExhausted)?;
        let block = Block {
            id,
            opcode: template.opcode.to_string(),
            inputs: template
                .args
                .iter()
                .map(|kind| kind.default_value().to_string())
                .collect(),
        };
        let at = index.unwrap_or(self.blocks.len()).min(self.blocks.len());
        self.blocks.insert(at, block);
        Ok(id)
    }

    /// Removes a block.
    pub fn remove(&mut self, id: u32) -> Result<Block, BlockError> {
        let at = self.position(id)?;
        Ok(self.blocks.remove(at))
    }

    /// Moves a block to `index` (clamped to the end of the sequence).
    pub fn move_to(&mut self, id: u32, index: usize) -> Result<(), BlockError> {
        let block = self.remove(id)?;
        let at = index.min(self.blocks.len());
        self.blocks.insert(at, block);
        Ok(())
    }

    /// Sets the value of one input.
    pub fn set_input(&mut self, id: u32, input: usize, value: &str) -> Result<(), BlockError> {
        let at = self.position(id)?;
        let block = &mut self.blocks[at];
        let arity = block.inputs.len();
        let slot = block
            .inputs
            .get_mut(input)
            .ok_or(BlockError::NoSuchInput { id, input, arity })?;
        *slot = value.trim().to_string();
        Ok(())
    }

    /// Removes every block. Ids keep increasing.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Names defined by `label` blocks with a non-blank name.
    pub fn defined_labels(&self) -> BTreeSet<&str> {
        self.blocks.iter().filter_map(Block::defined_label).collect()
    }

    /// Compiles the sequence into program text.
    pub fn compile(&self) -> String {
        compiler::compile(&self.blocks)
    }
}

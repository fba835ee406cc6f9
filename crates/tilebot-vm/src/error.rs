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

//! Errors of the block editor model.

use thiserror::Error;

/// An invalid edit of a [`BlockProgram`](crate::BlockProgram).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    /// The opcode is not in the palette.
    #[error("no palette entry for opcode '{0}'")]
    UnknownOpcode(String),
    /// No block carries this id.
    #[error("no block with id {0}")]
    NoSuchBlock(u32),
    /// The block has fewer inputs than requested.
    #[error("block {id} has {arity} input(s), cannot set input {input}")]
    NoSuchInput {
        /// Block id.
        id: u32,
        /// Requested input.
        input: usize,
        /// Inputs of the block.
        arity: usize,
    },
    /// Every block id up to `u32::MAX` is taken.
    #[error("block ids exhausted")]
    IdsExhausted,
}

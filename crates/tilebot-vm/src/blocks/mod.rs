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

//! # Programming Blocks
//!
//! A palette of opcode templates, an editable sequence of block instances and
//! the compiler from that sequence to program text. Compilation only goes one
//! way: blocks to text.

mod compiler;
mod palette;
mod program;

pub use self::compiler::compile;
pub use self::palette::{lookup, ArgKind, BlockTemplate, LABEL_PLACEHOLDER, PALETTE};
pub use self::program::{Block, BlockProgram};

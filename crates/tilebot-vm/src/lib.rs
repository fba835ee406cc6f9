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

//! # Tilebot VM
//!
//! The register machine that drives the hero from user programs, and the
//! compiler that turns a block sequence into the same program text.
//!
//! - [`interpreter`] parses line-oriented program text into a [`Program`]
//!   and executes it one instruction per [`Machine::step`].
//! - [`blocks`] holds the block palette, the editable [`BlockProgram`] and
//!   the one-way block-to-text compiler.

#![warn(missing_docs)]

pub mod blocks;
pub mod error;
pub mod interpreter;

pub use blocks::{ArgKind, Block, BlockProgram, BlockTemplate};
pub use error::BlockError;
pub use interpreter::{
    Action, Diagnostic, DiagnosticKind, Instruction, Limits, Machine, MachineSnapshot, Operand,
    Program, Register, Step, World,
};

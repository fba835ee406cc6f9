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

//! # Interpreter
//!
//! Program text is one instruction or label per line:
//!
//! ```text
//! // walk right until something blocks the way
//! loop:
//!     ifEmpty step
//!     return
//! step:
//!     right
//!     jump loop
//! ```
//!
//! [`Program::parse`] builds the instruction list and label table, and
//! reports [`Diagnostic`]s instead of failing. A [`Machine`] then executes the
//! program one instruction per [`step`](Machine::step), reading the world
//! through the [`World`] trait and handing movement back to the caller as an
//! [`Action`].

mod machine;
mod opcode;
mod parser;

pub use self::machine::{Action, Limits, Machine, MachineSnapshot, Step, World, REGISTER_COUNT};
pub use self::opcode::{ArithOp, Instruction, LabelRef, Operand, Register};
pub use self::parser::{Diagnostic, DiagnosticKind, Program};

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

//! # Tilebot Extensions
//!
//! The concrete extensions of the engine. Each one owns a slice of the state
//! tree or a family of events and never refers to a sibling directly:
//!
//! | extension | owns |
//! |---|---|
//! | [`GridExtension`] | grid nodes, unknown type warnings |
//! | [`HeroExtension`] | `hero.*`, movement animation, pickup and drop |
//! | [`ViewportExtension`] | `scale`, `offsetX`, `offsetY`, `activeCell` |
//! | [`EditorExtension`] | `editor.*`, map painting |
//! | [`InterpreterExtension`] | the register machine, `program.running` |
//! | [`ProgrammingBlockExtension`] | `program.blocks` and the compiled `program.code` |
//! | [`KeyboardExtension`] | key bindings |
//! | [`PersistenceExtension`] | `store.*`, map and homework storage |
//! | [`NotificationExtension`] | `alerts` |

pub mod blocks;
pub mod editor;
pub mod grid;
pub mod hero;
pub mod interpreter;
pub mod keyboard;
pub mod notifications;
pub mod persistence;
pub mod viewport;

pub use blocks::ProgrammingBlockExtension;
pub use editor::EditorExtension;
pub use grid::GridExtension;
pub use hero::HeroExtension;
pub use interpreter::InterpreterExtension;
pub use keyboard::KeyboardExtension;
pub use notifications::NotificationExtension;
pub use persistence::{
    DirectoryStore, MapStore, MemoryStore, PersistenceExtension, StoreError, StoreResponse,
};
pub use viewport::ViewportExtension;

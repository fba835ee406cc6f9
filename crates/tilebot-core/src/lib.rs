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

//! # Tilebot Core
//!
//! Foundational crate containing the primitives every other Tilebot crate is
//! built on: the synchronous event bus, the observable state tree, the map
//! model, the frame loop and the extension contract.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod extension;
pub mod game_loop;
pub mod map;
pub mod state;
pub mod subscription;
pub mod surface;

pub use clock::FrameClock;
pub use config::EngineConfig;
pub use error::{ConfigError, MapError, StateError};
pub use event::{BusEvent, Delivery, EventBus, EventKind, GameBus, GameEvent, Key};
pub use extension::{Extension, ExtensionContext, ExtensionState};
pub use game_loop::{FrameReport, GameLoop, LoopStatus};
pub use map::{Cell, CellItem, MapData, TileType};
pub use state::{
    ApplicationState, CellPos, Direction, EditorState, HaltReason, Hero, Mode, ObservableState,
    ProgramState, StoreListing, ViewportState,
};
pub use subscription::Subscription;
pub use surface::{Node, NodeId, Surface};

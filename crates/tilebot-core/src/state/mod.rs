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

//! The observable application state.
//!
//! [`ObservableState`] stores the whole application as one JSON value tree
//! with path-based access and ancestor notification. [`model`] holds the
//! typed views of each slice and [`paths`] the well-known paths.

pub mod model;
mod observable;
pub mod paths;
mod slices;

pub use self::model::{
    ApplicationState, CellPos, Direction, EditorState, HaltReason, Hero, Mode, ProgramState,
    StoreListing, ViewportState,
};
pub use self::observable::{ObservableState, Observer};

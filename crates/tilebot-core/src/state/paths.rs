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

//! Well-known paths into the application state tree.

/// Current [`Mode`](super::Mode).
pub const MODE: &str = "mode";
/// Viewport zoom.
pub const SCALE: &str = "scale";
/// Viewport horizontal offset.
pub const OFFSET_X: &str = "offsetX";
/// Viewport vertical offset.
pub const OFFSET_Y: &str = "offsetY";
/// Tracked cell.
pub const ACTIVE_CELL: &str = "activeCell";
/// The map document.
pub const MAP_DATA: &str = "mapData";
/// The grid inside the map document.
pub const MAP_GRID: &str = "mapData.map";
/// The tile type catalogue.
pub const ITEM_TYPES: &str = "mapData.itemTypes";
/// The hero.
pub const HERO: &str = "hero";
/// Whether the hero is mid-move.
pub const HERO_MOVING: &str = "hero.moving";
/// What the hero carries.
pub const HERO_CARRYING: &str = "hero.carrying";
/// Editor state.
pub const EDITOR: &str = "editor";
/// Program state.
pub const PROGRAM: &str = "program";
/// Program text.
pub const PROGRAM_CODE: &str = "program.code";
/// Timed execution flag.
pub const PROGRAM_RUNNING: &str = "program.running";
/// Pause flag.
pub const PROGRAM_PAUSED: &str = "program.paused";
/// Instructions per second.
pub const PROGRAM_SPEED: &str = "program.speed";
/// Serialized block sequence.
pub const PROGRAM_BLOCKS: &str = "program.blocks";
/// Recent alerts.
pub const ALERTS: &str = "alerts";
/// Store listings.
pub const STORE: &str = "store";
/// Stored map names.
pub const STORE_MAPS: &str = "store.maps";
/// Stored homework names.
pub const STORE_HOMEWORK: &str = "store.homework";

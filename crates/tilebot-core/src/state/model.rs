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

use crate::map::{CellItem, MapData};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The mutually exclusive top-level UI mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Free play: keyboard drives the hero.
    #[default]
    Play,
    /// Map editing.
    Edit,
    /// Program authoring and execution.
    Program,
    /// Homework assignment view.
    Homework,
}

/// A facing / movement direction on the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards row 0.
    Up,
    /// Towards the last row.
    #[default]
    Down,
    /// Towards column 0.
    Left,
    /// Towards the last column.
    Right,
}

impl Direction {
    /// The `(dx, dy)` grid delta of one step.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Parses a direction word or its arrow alias (`^`, `v`, `<`, `>`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "up" | "^" => Some(Direction::Up),
            "down" | "v" => Some(Direction::Down),
            "left" | "<" => Some(Direction::Left),
            "right" | ">" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Why a program stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HaltReason {
    /// The program counter ran past the last instruction.
    EndOfProgram,
    /// `return` was executed with an empty call stack.
    ReturnFromTop,
}

/// A grid coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPos {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
}

/// The hero sprite: position, facing, animation and carried item.
///
/// `x`/`y` are fractional while a move animation runs and integral at rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hero {
    /// Column (fractional while moving).
    pub x: f64,
    /// Row (fractional while moving).
    pub y: f64,
    /// Facing.
    pub dir: Direction,
    /// Sprite animation frame.
    pub frame: u32,
    /// A move animation is in progress.
    pub moving: bool,
    /// Destination column of the current move.
    pub target_x: i64,
    /// Destination row of the current move.
    pub target_y: i64,
    /// Sprite sheet name.
    pub sheet: String,
    /// The item in the hero's hands.
    pub carrying: Option<CellItem>,
}

impl Default for Hero {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            dir: Direction::default(),
            frame: 0,
            moving: false,
            target_x: 0,
            target_y: 0,
            sheet: "hero".to_string(),
            carrying: None,
        }
    }
}

impl Hero {
    /// A hero at rest on `(x, y)`.
    pub fn at(x: i64, y: i64, dir: Direction) -> Self {
        Self {
            x: x as f64,
            y: y as f64,
            dir,
            target_x: x,
            target_y: y,
            ..Self::default()
        }
    }

    /// The cell the hero stands on (rounded position).
    pub fn cell(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

/// Transient state of the map editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorState {
    /// The tile type code painted on click.
    pub selected_type: Option<String>,
    /// Clicking removes the top item instead of painting.
    pub eraser: bool,
    /// Free text stamped with painted items.
    pub text: String,
}

/// Program text, execution flags and the block editor's sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgramState {
    /// Timed execution is active.
    pub running: bool,
    /// Timed execution is suspended.
    pub paused: bool,
    /// Instructions per second.
    pub speed: f64,
    /// The authoritative line-oriented program text.
    pub code: String,
    /// Serialized block sequence of the block editor.
    pub blocks: Value,
}

impl Default for ProgramState {
    fn default() -> Self {
        Self {
            running: false,
            paused: false,
            speed: 2.0,
            code: String::new(),
            blocks: Value::Array(Vec::new()),
        }
    }
}

/// The viewport transform and tracked cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    /// Zoom level.
    pub scale: f64,
    /// Horizontal camera offset.
    pub offset_x: f64,
    /// Vertical camera offset.
    pub offset_y: f64,
    /// The cell the camera tracks.
    pub active_cell: CellPos,
}

/// Listings returned by the persistence store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreListing {
    /// Stored map names.
    pub maps: Vec<String>,
    /// Stored homework names.
    pub homework: Vec<String>,
}

/// The whole application state, used to seed an [`ObservableState`].
///
/// [`ObservableState`]: super::ObservableState
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationState {
    /// Current UI mode.
    pub mode: Mode,
    /// Zoom level.
    pub scale: f64,
    /// Horizontal camera offset.
    pub offset_x: f64,
    /// Vertical camera offset.
    pub offset_y: f64,
    /// The cell the camera tracks.
    pub active_cell: CellPos,
    /// The loaded map.
    pub map_data: MapData,
    /// The hero.
    pub hero: Hero,
    /// Editor state.
    pub editor: EditorState,
    /// Program state.
    pub program: ProgramState,
    /// Recent user-visible messages, oldest first.
    pub alerts: Vec<String>,
    /// Store listings.
    pub store: StoreListing,
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            active_cell: CellPos::default(),
            map_data: MapData::default(),
            hero: Hero::default(),
            editor: EditorState::default(),
            program: ProgramState::default(),
            alerts: Vec::new(),
            store: StoreListing::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_aliases_parse() {
        assert_eq!(Direction::from_token("^"), Some(Direction::Up));
        assert_eq!(Direction::from_token("v"), Some(Direction::Down));
        assert_eq!(Direction::from_token("<"), Some(Direction::Left));
        assert_eq!(Direction::from_token("RIGHT"), Some(Direction::Right));
        assert_eq!(Direction::from_token("north"), None);
    }

    #[test]
    fn hero_serializes_camel_case() {
        let hero = Hero::at(2, 1, Direction::Left);
        let value = serde_json::to_value(&hero).unwrap();
        assert_eq!(value["targetX"], 2);
        assert_eq!(value["dir"], "left");
        assert!(value["carrying"].is_null());
    }

    #[test]
    fn hero_cell_rounds_position() {
        let mut hero = Hero::at(1, 1, Direction::Right);
        hero.x = 1.6;
        assert_eq!(hero.cell(), (2, 1));
    }
}

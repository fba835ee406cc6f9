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

use super::bus::{BusEvent, EventBus};
use crate::map::TileType;
use crate::state::{Direction, HaltReason, Mode};

/// The bus every Tilebot extension talks over.
pub type GameBus = EventBus<GameEvent>;

/// A key press translated from the host input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Space bar.
    Space,
    /// Any other printable key.
    Char(char),
}

/// The closed set of semantic events exchanged between extensions.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    // --- Hero ---
    /// Turn the hero and, when the target cell allows it, step one cell.
    HeroMove(Direction),
    /// Pick up or drop an item on the hero's cell.
    HeroInteract,
    /// The hero finished a move animation on the given cell.
    HeroArrived {
        /// Column of the reached cell.
        x: i64,
        /// Row of the reached cell.
        y: i64,
    },
    /// Put the hero back on its spawn cell.
    HeroReset,

    // --- Interpreter ---
    /// Parse `program.code` and start timed execution.
    InterpreterRun,
    /// Execute exactly one instruction.
    InterpreterStep,
    /// Stop execution and discard the parsed program.
    InterpreterStop,
    /// Suspend timed execution.
    InterpreterPause,
    /// Resume timed execution.
    InterpreterResume,
    /// Stop, discard the program and reset the hero.
    InterpreterReset,
    /// The program stopped on its own.
    InterpreterHalted(HaltReason),

    // --- Mode policy ---
    /// Request a mode; requesting the current mode falls back to `play`.
    ModeToggle(Mode),
    /// The mode changed.
    ModeChange {
        /// Previous mode.
        from: Mode,
        /// New mode.
        to: Mode,
    },
    /// Programming mode was left for the editor.
    ProgrammingStop,
    /// The editor was left for programming mode.
    EditorClose,

    // --- Editor ---
    /// A grid cell was clicked while editing.
    EditorCellClick {
        /// Column of the clicked cell.
        x: i64,
        /// Row of the clicked cell.
        y: i64,
    },
    /// Choose the tile type to paint (`None` clears the selection).
    EditorSelectType(Option<String>),
    /// Flip the eraser.
    EditorToggleEraser,
    /// Set the free text stamped with new items.
    EditorSetText(String),
    /// Resize the map, padding with empty cells.
    EditorResize {
        /// New column count.
        width: usize,
        /// New row count.
        height: usize,
    },
    /// Add or replace a tile type definition.
    EditorDefineType {
        /// Single uppercase letter code.
        code: String,
        /// The descriptor.
        tile: TileType,
    },

    // --- Grid ---
    /// Rebuild the grid nodes from `mapData`.
    GridRender,

    // --- Viewport ---
    /// Multiply the zoom level.
    ViewportZoom {
        /// Zoom multiplier.
        factor: f64,
    },
    /// Move the camera by an offset.
    ViewportPan {
        /// Horizontal offset.
        dx: f64,
        /// Vertical offset.
        dy: f64,
    },
    /// Track a specific cell.
    ViewportFocus {
        /// Column.
        x: i64,
        /// Row.
        y: i64,
    },

    // --- Block editor ---
    /// Add a block from the palette.
    BlockAdd {
        /// Palette opcode.
        opcode: String,
        /// Insert position; `None` appends.
        index: Option<usize>,
    },
    /// Remove a block.
    BlockRemove {
        /// Block id.
        id: u32,
    },
    /// Move a block to another position.
    BlockMove {
        /// Block id.
        id: u32,
        /// Target position.
        index: usize,
    },
    /// Change the value of one block input.
    BlockSetInput {
        /// Block id.
        id: u32,
        /// Input position.
        input: usize,
        /// New value.
        value: String,
    },
    /// Remove every block.
    BlockClear,

    // --- Input ---
    /// A key was pressed.
    KeyPress(Key),

    // --- Persistence ---
    /// Save the current map under `name`.
    MapSave {
        /// Map name.
        name: String,
    },
    /// Load the map stored under `name`.
    MapLoad {
        /// Map name.
        name: String,
    },
    /// Refresh the list of stored maps.
    MapList,
    /// Replace the map with pasted JSON.
    MapImport {
        /// Raw JSON text.
        json: String,
    },
    /// A new map replaced `mapData`.
    MapLoaded {
        /// Where the map came from.
        name: String,
    },
    /// Save the current map and program as a homework assignment.
    HomeworkSave {
        /// Assignment name.
        name: String,
    },
    /// Load a homework assignment.
    HomeworkLoad {
        /// Assignment name.
        name: String,
    },
    /// Refresh the list of homework assignments.
    HomeworkList,
    /// Submit the current program as a solution.
    HomeworkSubmit {
        /// Assignment name.
        name: String,
        /// Student identifier.
        student: String,
    },

    // --- UI ---
    /// A user-visible, non-fatal message.
    Alert(String),
}

/// The subscription key of a [`GameEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum EventKind {
    HeroMove,
    HeroInteract,
    HeroArrived,
    HeroReset,
    InterpreterRun,
    InterpreterStep,
    InterpreterStop,
    InterpreterPause,
    InterpreterResume,
    InterpreterReset,
    InterpreterHalted,
    ModeToggle,
    ModeChange,
    ProgrammingStop,
    EditorClose,
    EditorCellClick,
    EditorSelectType,
    EditorToggleEraser,
    EditorSetText,
    EditorResize,
    EditorDefineType,
    GridRender,
    ViewportZoom,
    ViewportPan,
    ViewportFocus,
    BlockAdd,
    BlockRemove,
    BlockMove,
    BlockSetInput,
    BlockClear,
    KeyPress,
    MapSave,
    MapLoad,
    MapList,
    MapImport,
    MapLoaded,
    HomeworkSave,
    HomeworkLoad,
    HomeworkList,
    HomeworkSubmit,
    Alert,
}

impl EventKind {
    /// The wire name of the event, as it appears in logs and traces.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::HeroMove => "hero:move",
            EventKind::HeroInteract => "hero:interact",
            EventKind::HeroArrived => "hero:arrived",
            EventKind::HeroReset => "hero:reset",
            EventKind::InterpreterRun => "interpreter:run",
            EventKind::InterpreterStep => "interpreter:step",
            EventKind::InterpreterStop => "interpreter:stop",
            EventKind::InterpreterPause => "interpreter:pause",
            EventKind::InterpreterResume => "interpreter:resume",
            EventKind::InterpreterReset => "interpreter:reset",
            EventKind::InterpreterHalted => "interpreter:halted",
            EventKind::ModeToggle => "mode:toggle",
            EventKind::ModeChange => "mode:change",
            EventKind::ProgrammingStop => "programming:stop",
            EventKind::EditorClose => "editor:close",
            EventKind::EditorCellClick => "editor:cellClick",
            EventKind::EditorSelectType => "editor:selectType",
            EventKind::EditorToggleEraser => "editor:toggleEraser",
            EventKind::EditorSetText => "editor:setText",
            EventKind::EditorResize => "editor:resize",
            EventKind::EditorDefineType => "editor:defineType",
            EventKind::GridRender => "grid:render",
            EventKind::ViewportZoom => "viewport:zoom",
            EventKind::ViewportPan => "viewport:pan",
            EventKind::ViewportFocus => "viewport:focus",
            EventKind::BlockAdd => "blocks:add",
            EventKind::BlockRemove => "blocks:remove",
            EventKind::BlockMove => "blocks:move",
            EventKind::BlockSetInput => "blocks:setInput",
            EventKind::BlockClear => "blocks:clear",
            EventKind::KeyPress => "input:key",
            EventKind::MapSave => "store:saveMap",
            EventKind::MapLoad => "store:loadMap",
            EventKind::MapList => "store:listMaps",
            EventKind::MapImport => "store:importMap",
            EventKind::MapLoaded => "map:loaded",
            EventKind::HomeworkSave => "store:saveHomework",
            EventKind::HomeworkLoad => "store:loadHomework",
            EventKind::HomeworkList => "store:listHomework",
            EventKind::HomeworkSubmit => "store:submitHomework",
            EventKind::Alert => "ui:alert",
        }
    }
}

impl BusEvent for GameEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            GameEvent::HeroMove(_) => EventKind::HeroMove,
            GameEvent::HeroInteract => EventKind::HeroInteract,
            GameEvent::HeroArrived { .. } => EventKind::HeroArrived,
            GameEvent::HeroReset => EventKind::HeroReset,
            GameEvent::InterpreterRun => EventKind::InterpreterRun,
            GameEvent::InterpreterStep => EventKind::InterpreterStep,
            GameEvent::InterpreterStop => EventKind::InterpreterStop,
            GameEvent::InterpreterPause => EventKind::InterpreterPause,
            GameEvent::InterpreterResume => EventKind::InterpreterResume,
            GameEvent::InterpreterReset => EventKind::InterpreterReset,
            GameEvent::InterpreterHalted(_) => EventKind::InterpreterHalted,
            GameEvent::ModeToggle(_) => EventKind::ModeToggle,
            GameEvent::ModeChange { .. } => EventKind::ModeChange,
            GameEvent::ProgrammingStop => EventKind::ProgrammingStop,
            GameEvent::EditorClose => EventKind::EditorClose,
            GameEvent::EditorCellClick { .. } => EventKind::EditorCellClick,
            GameEvent::EditorSelectType(_) => EventKind::EditorSelectType,
            GameEvent::EditorToggleEraser => EventKind::EditorToggleEraser,
            GameEvent::EditorSetText(_) => EventKind::EditorSetText,
            GameEvent::EditorResize { .. } => EventKind::EditorResize,
            GameEvent::EditorDefineType { .. } => EventKind::EditorDefineType,
            GameEvent::GridRender => EventKind::GridRender,
            GameEvent::ViewportZoom { .. } => EventKind::ViewportZoom,
            GameEvent::ViewportPan { .. } => EventKind::ViewportPan,
            GameEvent::ViewportFocus { .. } => EventKind::ViewportFocus,
            GameEvent::BlockAdd { .. } => EventKind::BlockAdd,
            GameEvent::BlockRemove { .. } => EventKind::BlockRemove,
            GameEvent::BlockMove { .. } => EventKind::BlockMove,
            GameEvent::BlockSetInput { .. } => EventKind::BlockSetInput,
            GameEvent::BlockClear => EventKind::BlockClear,
            GameEvent::KeyPress(_) => EventKind::KeyPress,
            GameEvent::MapSave { .. } => EventKind::MapSave,
            GameEvent::MapLoad { .. } => EventKind::MapLoad,
            GameEvent::MapList => EventKind::MapList,
            GameEvent::MapImport { .. } => EventKind::MapImport,
            GameEvent::MapLoaded { .. } => EventKind::MapLoaded,
            GameEvent::HomeworkSave { .. } => EventKind::HomeworkSave,
            GameEvent::HomeworkLoad { .. } => EventKind::HomeworkLoad,
            GameEvent::HomeworkList => EventKind::HomeworkList,
            GameEvent::HomeworkSubmit { .. } => EventKind::HomeworkSubmit,
            GameEvent::Alert(_) => EventKind::Alert,
        }
    }

    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_follow_namespace_convention() {
        assert_eq!(GameEvent::HeroMove(Direction::Up).name(), "hero:move");
        assert_eq!(GameEvent::ProgrammingStop.name(), "programming:stop");
        assert_eq!(
            GameEvent::EditorCellClick { x: 0, y: 0 }.name(),
            "editor:cellClick"
        );
    }

    #[test]
    fn payload_does_not_change_kind() {
        assert_eq!(
            GameEvent::HeroMove(Direction::Left).kind(),
            GameEvent::HeroMove(Direction::Right).kind()
        );
    }
}

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

//! Typed accessors for the well-known slices of the state tree.
//!
//! Each accessor is a thin wrapper over the path API, so observers of the
//! underlying paths (and their ancestors) are notified exactly as for a raw
//! [`ObservableState::set`].

use super::model::{
    ApplicationState, CellPos, EditorState, Hero, Mode, ProgramState, StoreListing, ViewportState,
};
use super::observable::ObservableState;
use super::paths;
use crate::error::StateError;
use crate::map::MapData;
use serde_json::{json, Map, Value};

impl ObservableState {
    /// Seeds a state tree from a typed application state.
    pub fn from_application(app: &ApplicationState) -> Result<Self, StateError> {
        Self::from_typed(app)
    }

    /// Current mode.
    pub fn mode(&self) -> Result<Mode, StateError> {
        self.get_as(paths::MODE)
    }

    /// Writes the mode.
    pub fn set_mode(&self, mode: Mode) -> Result<(), StateError> {
        self.set_as(paths::MODE, &mode)
    }

    /// The hero.
    pub fn hero(&self) -> Result<Hero, StateError> {
        self.get_as(paths::HERO)
    }

    /// Replaces the whole hero in one notification pass.
    pub fn set_hero(&self, hero: &Hero) -> Result<(), StateError> {
        self.set_as(paths::HERO, hero)
    }

    /// The map document.
    pub fn map_data(&self) -> Result<MapData, StateError> {
        self.get_as(paths::MAP_DATA)
    }

    /// Replaces the map document wholesale.
    pub fn set_map_data(&self, map: &MapData) -> Result<(), StateError> {
        self.set_as(paths::MAP_DATA, map)
    }

    /// Replaces only the grid of the map document.
    pub fn set_map_grid(&self, map: &MapData) -> Result<(), StateError> {
        self.set_as(paths::MAP_GRID, &map.map)
    }

    /// Program state.
    pub fn program(&self) -> Result<ProgramState, StateError> {
        self.get_as(paths::PROGRAM)
    }

    /// Replaces the program state.
    pub fn set_program(&self, program: &ProgramState) -> Result<(), StateError> {
        self.set_as(paths::PROGRAM, program)
    }

    /// Writes `running` and `paused` together in one notification pass.
    pub fn set_program_flags(&self, running: bool, paused: bool) -> Result<(), StateError> {
        let mut partial = Map::new();
        partial.insert("running".into(), Value::Bool(running));
        partial.insert("paused".into(), Value::Bool(paused));
        self.update(paths::PROGRAM, partial)
    }

    /// The program text.
    pub fn program_code(&self) -> Result<String, StateError> {
        self.get_as(paths::PROGRAM_CODE)
    }

    /// Replaces the program text.
    pub fn set_program_code(&self, code: &str) -> Result<(), StateError> {
        self.set(paths::PROGRAM_CODE, code)
    }

    /// Editor state.
    pub fn editor(&self) -> Result<EditorState, StateError> {
        self.get_as(paths::EDITOR)
    }

    /// Replaces the editor state.
    pub fn set_editor(&self, editor: &EditorState) -> Result<(), StateError> {
        self.set_as(paths::EDITOR, editor)
    }

    /// The viewport transform and tracked cell.
    pub fn viewport(&self) -> Result<ViewportState, StateError> {
        Ok(ViewportState {
            scale: self.get_as(paths::SCALE)?,
            offset_x: self.get_as(paths::OFFSET_X)?,
            offset_y: self.get_as(paths::OFFSET_Y)?,
            active_cell: self.get_as(paths::ACTIVE_CELL)?,
        })
    }

    /// Writes the zoom level.
    pub fn set_scale(&self, scale: f64) -> Result<(), StateError> {
        self.set(paths::SCALE, scale)
    }

    /// Writes both camera offsets.
    pub fn set_offset(&self, x: f64, y: f64) -> Result<(), StateError> {
        self.set(paths::OFFSET_X, x)?;
        self.set(paths::OFFSET_Y, y)
    }

    /// Writes the tracked cell.
    pub fn set_active_cell(&self, cell: CellPos) -> Result<(), StateError> {
        self.set_as(paths::ACTIVE_CELL, &cell)
    }

    /// Store listings.
    pub fn store_listing(&self) -> Result<StoreListing, StateError> {
        self.get_as(paths::STORE)
    }

    /// Appends an alert, keeping at most `cap` of the most recent ones.
    pub fn push_alert(&self, message: &str, cap: usize) -> Result<(), StateError> {
        let mut alerts: Vec<String> = self.get_as(paths::ALERTS).unwrap_or_default();
        alerts.push(message.to_string());
        if alerts.len() > cap {
            let excess = alerts.len() - cap;
            alerts.drain(..excess);
        }
        self.set(paths::ALERTS, json!(alerts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Direction;
    use std::cell::Cell;
    use std::rc::Rc;

    fn seeded() -> ObservableState {
        ObservableState::from_application(&ApplicationState::default()).unwrap()
    }

    #[test]
    fn seeded_tree_has_every_slice() {
        let state = seeded();
        assert_eq!(state.mode().unwrap(), Mode::Play);
        assert_eq!(state.viewport().unwrap().scale, 1.0);
        assert!(!state.program().unwrap().running);
        assert!(state.contains("mapData.itemTypes"));
    }

    #[test]
    fn set_hero_is_a_single_pass() {
        let state = seeded();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let _sub = state.observe(paths::HERO, move |_| h.set(h.get() + 1));

        state.set_hero(&Hero::at(3, 4, Direction::Up)).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(state.hero().unwrap().cell(), (3, 4));
    }

    #[test]
    fn program_flags_notify_program_observers_once() {
        let state = seeded();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let _sub = state.observe(paths::PROGRAM, move |_| h.set(h.get() + 1));

        state.set_program_flags(true, false).unwrap();
        assert_eq!(hits.get(), 1);
        let program = state.program().unwrap();
        assert!(program.running && !program.paused);
    }

    #[test]
    fn alerts_are_capped() {
        let state = seeded();
        for n in 0..5 {
            state.push_alert(&format!("alert {n}"), 3).unwrap();
        }
        let alerts: Vec<String> = state.get_as(paths::ALERTS).unwrap();
        assert_eq!(alerts, vec!["alert 2", "alert 3", "alert 4"]);
    }
}

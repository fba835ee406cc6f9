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

//! The map editor: painting and erasing items, resizing the grid and
//! defining tile types.

use std::any::Any;
use tilebot_core::map::is_type_code;
use tilebot_core::state::paths;
use tilebot_core::{
    CellItem, EditorState, EventKind, Extension, ExtensionContext, GameEvent, Mode,
    ObservableState,
};

/// Largest grid the editor creates.
pub const MAX_MAP_SIDE: usize = 64;

/// Owns `editor.*`; writes `mapData` on edits.
#[derive(Debug, Default)]
pub struct EditorExtension;

/// Paints or erases at `(x, y)`. Returns a user-facing message when the
/// click cannot be applied.
fn cell_click(state: &ObservableState, x: i64, y: i64) -> anyhow::Result<Option<String>> {
    if state.mode()? != Mode::Edit {
        log::trace!("Ignoring cell click outside edit mode.");
        return Ok(None);
    }
    let editor = state.editor()?;
    let mut map = state.map_data()?;

    let changed = if editor.eraser {
        map.erase_top(x, y).is_some()
    } else {
        let Some(code) = editor.selected_type else {
            return Ok(Some("Select a tile type first.".to_string()));
        };
        if map.tile_type(&code).is_none() {
            return Ok(Some(format!("Unknown tile type '{code}'.")));
        }
        map.stamp(x, y, CellItem::new(code, editor.text.trim()))
    };

    if changed {
        state.set_map_grid(&map)?;
    }
    Ok(None)
}

fn edit_editor(
    state: &ObservableState,
    f: impl FnOnce(&mut EditorState),
) -> anyhow::Result<()> {
    let mut editor = state.editor()?;
    f(&mut editor);
    state.set_editor(&editor)?;
    Ok(())
}

impl EditorExtension {
    /// Creates the extension.
    pub fn new() -> Self {
        Self
    }
}

impl Extension for EditorExtension {
    fn name(&self) -> &'static str {
        "editor"
    }

    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        let c = ctx.clone();
        ctx.on(EventKind::EditorCellClick, move |event| {
            if let GameEvent::EditorCellClick { x, y } = event {
                if let Some(message) = cell_click(c.state(), *x, *y)? {
                    c.emit(GameEvent::Alert(message));
                }
            }
            Ok(())
        });

        let c = ctx.clone();
        ctx.on(EventKind::EditorSelectType, move |event| {
            if let GameEvent::EditorSelectType(selected) = event {
                edit_editor(c.state(), |editor| {
                    editor.selected_type = selected.clone();
                    editor.eraser = false;
                })?;
            }
            Ok(())
        });

        let c = ctx.clone();
        ctx.on(EventKind::EditorToggleEraser, move |_| {
            edit_editor(c.state(), |editor| editor.eraser = !editor.eraser)
        });

        let c = ctx.clone();
        ctx.on(EventKind::EditorSetText, move |event| {
            if let GameEvent::EditorSetText(text) = event {
                edit_editor(c.state(), |editor| editor.text = text.clone())?;
            }
            Ok(())
        });

        let c = ctx.clone();
        ctx.on(EventKind::EditorResize, move |event| {
            let GameEvent::EditorResize { width, height } = *event else {
                return Ok(());
            };
            if !(1..=MAX_MAP_SIDE).contains(&width) || !(1..=MAX_MAP_SIDE).contains(&height) {
                c.emit(GameEvent::Alert(format!(
                    "Map size must be between 1 and {MAX_MAP_SIDE}."
                )));
                return Ok(());
            }
            let mut map = c.state().map_data()?;
            map.resize(width, height);
            c.state().set_map_grid(&map)?;
            log::info!("Map resized to {width}x{height}.");
            Ok(())
        });

        let c = ctx.clone();
        ctx.on(EventKind::EditorDefineType, move |event| {
            let GameEvent::EditorDefineType { code, tile } = event else {
                return Ok(());
            };
            if !is_type_code(code) {
                c.emit(GameEvent::Alert(format!(
                    "'{code}' is not a tile type code (one uppercase letter)."
                )));
                return Ok(());
            }
            c.state()
                .set_as(&format!("{}.{code}", paths::ITEM_TYPES), tile)?;
            Ok(())
        });

        let c = ctx.clone();
        ctx.on(EventKind::EditorClose, move |_| {
            c.state().set_editor(&EditorState::default())?;
            log::debug!("Editor closed, transient state cleared.");
            Ok(())
        });

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tilebot_core::{ApplicationState, MapData, TileType};

    fn editing() -> ObservableState {
        let app = ApplicationState {
            mode: Mode::Edit,
            map_data: MapData::blank(2, 2).with_type("A", TileType::default()),
            ..ApplicationState::default()
        };
        ObservableState::from_application(&app).unwrap()
    }

    #[test]
    fn click_stamps_selected_type_with_text() {
        let state = editing();
        edit_editor(&state, |e| {
            e.selected_type = Some("A".into());
            e.text = "hi".into();
        })
        .unwrap();

        assert_eq!(cell_click(&state, 1, 0).unwrap(), None);
        assert_eq!(state.get("mapData.map.0.1"), Some(json!("A:hi")));
    }

    #[test]
    fn eraser_removes_top_item() {
        let state = editing();
        let mut map = state.map_data().unwrap();
        map.stamp(0, 0, CellItem::new("A", ""));
        map.stamp(0, 0, CellItem::new("A", "top"));
        state.set_map_data(&map).unwrap();
        edit_editor(&state, |e| e.eraser = true).unwrap();

        cell_click(&state, 0, 0).unwrap();
        assert_eq!(state.get("mapData.map.0.0"), Some(json!("A")));
    }

    #[test]
    fn clicks_outside_edit_mode_do_nothing() {
        let state = editing();
        state.set_mode(Mode::Play).unwrap();
        edit_editor(&state, |e| e.selected_type = Some("A".into())).unwrap();

        cell_click(&state, 0, 0).unwrap();
        assert_eq!(state.get("mapData.map.0.0"), Some(json!(0)));
    }

    #[test]
    fn unknown_type_is_reported_not_painted() {
        let state = editing();
        edit_editor(&state, |e| e.selected_type = Some("Z".into())).unwrap();
        let message = cell_click(&state, 0, 0).unwrap();
        assert!(message.is_some_and(|m| m.contains("'Z'")));
    }
}

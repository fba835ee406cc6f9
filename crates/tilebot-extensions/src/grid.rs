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

//! Renders the map as one node per non-empty cell.

use anyhow::Context;
use serde_json::Value;
use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use tilebot_core::state::paths;
use tilebot_core::{EventKind, Extension, ExtensionContext, MapData, NodeId};

/// Node role of the grid root.
pub const GRID_ROLE: &str = "grid";
/// Node role of a rendered cell.
pub const CELL_ROLE: &str = "grid-cell";

#[derive(Default)]
struct GridView {
    root: Option<NodeId>,
    cells: Vec<NodeId>,
    warned: BTreeSet<String>,
}

impl GridView {
    fn render(&mut self, ctx: &ExtensionContext, map: &MapData) {
        let Some(root) = self.root else {
            return;
        };
        for id in self.cells.drain(..) {
            ctx.surface().remove(id);
        }

        for code in map.unknown_type_codes() {
            if self.warned.insert(code.clone()) {
                log::warn!("Map references unknown tile type '{code}', its items are skipped.");
            }
        }

        for (y, row) in map.map.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let visible: Vec<&str> = map
                    .known_items(cell)
                    .map(|(item, _)| item.type_code.as_str())
                    .collect();
                if visible.is_empty() {
                    continue;
                }
                let id = ctx.surface().create(CELL_ROLE, Some(root));
                ctx.surface().set_attr(id, "x", x.to_string());
                ctx.surface().set_attr(id, "y", y.to_string());
                ctx.surface().set_attr(id, "items", visible.join(","));
                self.cells.push(id);
            }
        }
        log::trace!("Grid rendered {} cell node(s).", self.cells.len());
    }
}

/// Keeps the grid nodes in sync with `mapData`.
#[derive(Default)]
pub struct GridExtension {
    view: Rc<RefCell<GridView>>,
}

impl GridExtension {
    /// Creates the extension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Type codes already reported as unknown.
    pub fn warned_types(&self) -> BTreeSet<String> {
        self.view.borrow().warned.clone()
    }
}

impl Extension for GridExtension {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        let root = ctx.create_node(GRID_ROLE, None);
        self.view.borrow_mut().root = Some(root);

        let map = ctx.state().map_data().context("grid needs mapData")?;
        self.view.borrow_mut().render(ctx, &map);

        let view = self.view.clone();
        let c = ctx.clone();
        ctx.observe(paths::MAP_DATA, move |value: &Value| {
            match serde_json::from_value::<MapData>(value.clone()) {
                Ok(map) => view.borrow_mut().render(&c, &map),
                Err(e) => log::warn!("Cannot render malformed mapData: {e}"),
            }
        });

        let view = self.view.clone();
        let c = ctx.clone();
        ctx.on(EventKind::GridRender, move |_| {
            let map = c.state().map_data()?;
            view.borrow_mut().render(&c, &map);
            Ok(())
        });
        Ok(())
    }

    fn destroy(&mut self) {
        let mut view = self.view.borrow_mut();
        view.root = None;
        view.cells.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

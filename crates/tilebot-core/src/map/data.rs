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

use super::cell::{Cell, CellItem};
use super::tile::TileType;
use crate::error::MapError;
use crate::state::Direction;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// The map document: metadata, tile type catalogue and the cell grid.
///
/// `map[y][x]` addresses a cell. Rows may be ragged; a position inside the
/// widest row but past the end of a shorter one has no cell data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapData {
    /// Free-form category label.
    pub category: String,
    /// Free-form difficulty label.
    pub difficulty: String,
    /// Description shown to the player.
    pub description: String,
    /// Tile type catalogue keyed by single-letter code.
    pub item_types: BTreeMap<String, TileType>,
    /// The grid, row-major.
    pub map: Vec<Vec<Cell>>,
    /// Unknown fields, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MapData {
    /// An empty map of the given size with no tile types.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            map: vec![vec![Cell::empty(); width]; height],
            ..Self::default()
        }
    }

    /// Adds a tile type, builder style.
    pub fn with_type(mut self, code: impl Into<String>, tile: TileType) -> Self {
        self.item_types.insert(code.into(), tile);
        self
    }

    /// Places a parsed token list at `(x, y)`, builder style.
    pub fn with_cell(mut self, x: i64, y: i64, tokens: &str) -> Self {
        if let Some(cell) = self.cell_mut(x, y) {
            *cell = Cell::parse(tokens);
        }
        self
    }

    /// Decodes a pasted or stored map document.
    ///
    /// The document must carry at least one row. Unknown type codes are
    /// accepted and reported with a warning.
    pub fn from_json(text: &str) -> Result<Self, MapError> {
        let map: MapData = serde_json::from_str(text)?;
        if map.map.is_empty() {
            return Err(MapError::Empty);
        }
        let unknown = map.unknown_type_codes();
        if !unknown.is_empty() {
            log::warn!("Map references unknown tile types: {unknown:?}");
        }
        Ok(map)
    }

    /// Encodes the map as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, MapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.map.len()
    }

    /// Length of the widest row.
    pub fn width(&self) -> usize {
        self.map.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns `true` when `(x, y)` lies inside the map rectangle.
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width() && (y as usize) < self.height()
    }

    /// The cell at `(x, y)`, or `None` when there is no cell data there.
    pub fn cell(&self, x: i64, y: i64) -> Option<&Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.map.get(y as usize)?.get(x as usize)
    }

    /// Mutable access to the cell at `(x, y)`, padding a short row with empty
    /// cells. `None` when `(x, y)` is outside the map.
    pub fn cell_mut(&mut self, x: i64, y: i64) -> Option<&mut Cell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let row = self.map.get_mut(y as usize)?;
        let x = x as usize;
        if row.len() <= x {
            row.resize(x + 1, Cell::empty());
        }
        row.get_mut(x)
    }

    /// Looks up a tile type by code.
    pub fn tile_type(&self, code: &str) -> Option<&TileType> {
        self.item_types.get(code)
    }

    /// The items of `cell` whose type is defined, paired with that type.
    /// Items with an unknown code are skipped.
    pub fn known_items<'a>(
        &'a self,
        cell: &'a Cell,
    ) -> impl Iterator<Item = (&'a CellItem, &'a TileType)> + 'a {
        cell.items().iter().filter_map(move |item| {
            let tile = self.tile_type(&item.type_code);
            if tile.is_none() {
                log::debug!("Skipping item with unknown type '{}'.", item.type_code);
            }
            tile.map(|tile| (item, tile))
        })
    }

    /// Every type code referenced by the grid but missing from `itemTypes`.
    pub fn unknown_type_codes(&self) -> BTreeSet<String> {
        self.map
            .iter()
            .flatten()
            .flat_map(|cell| cell.items())
            .filter(|item| !self.item_types.contains_key(&item.type_code))
            .map(|item| item.type_code.clone())
            .collect()
    }

    /// The in-bounds neighbour of `(x, y)` in direction `dir`.
    pub fn neighbour(&self, x: i64, y: i64, dir: Direction) -> Option<(i64, i64)> {
        let (dx, dy) = dir.delta();
        let (nx, ny) = (x + dx, y + dy);
        self.in_bounds(nx, ny).then_some((nx, ny))
    }

    /// Returns `true` when the hero may stand on `(x, y)`: the position is in
    /// bounds and every known occupant is `stepable`.
    pub fn is_walkable(&self, x: i64, y: i64) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        match self.cell(x, y) {
            Some(cell) => self.known_items(cell).all(|(_, tile)| tile.stepable),
            None => true,
        }
    }

    /// Returns `true` when the cell one step from `(x, y)` in direction `dir`
    /// is empty or has no cell data. Facing the map edge counts as not empty.
    pub fn is_facing_empty(&self, x: i64, y: i64, dir: Direction) -> bool {
        match self.neighbour(x, y, dir) {
            Some((nx, ny)) => self.cell(nx, ny).map_or(true, Cell::is_empty),
            None => false,
        }
    }

    /// Returns `true` when `item` may be dropped on `(x, y)`.
    ///
    /// An empty cell always accepts. Otherwise every known occupant must be
    /// `stackable`, and the item must fit on the top occupant unless that
    /// occupant allows bigger items.
    pub fn can_drop(&self, x: i64, y: i64, item: &CellItem) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let Some(incoming) = self.tile_type(&item.type_code) else {
            log::warn!("Cannot drop item of unknown type '{}'.", item.type_code);
            return false;
        };
        let Some(cell) = self.cell(x, y) else {
            return true;
        };
        let occupants: Vec<_> = self.known_items(cell).collect();
        let Some((_, top)) = occupants.last() else {
            return true;
        };
        occupants.iter().all(|(_, tile)| tile.stackable)
            && (incoming.fits_on(top) || top.allow_bigger_to_stack)
    }

    /// Removes and returns the top item of `(x, y)` when its type is known and
    /// `pickable`.
    pub fn pick_up(&mut self, x: i64, y: i64) -> Option<CellItem> {
        let top = self.cell(x, y)?.top()?;
        let pickable = self.tile_type(&top.type_code).is_some_and(|t| t.pickable);
        if !pickable {
            return None;
        }
        self.cell_mut(x, y)?.pop()
    }

    /// Drops `item` on top of `(x, y)` if the stacking rule allows it.
    ///
    /// ## Returns
    /// `Err(item)` handing the item back when the cell does not accept it.
    pub fn drop_item(&mut self, x: i64, y: i64, item: CellItem) -> Result<(), CellItem> {
        if !self.can_drop(x, y, &item) {
            return Err(item);
        }
        match self.cell_mut(x, y) {
            Some(cell) => {
                cell.push(item);
                Ok(())
            }
            None => Err(item),
        }
    }

    /// Places `item` on top of `(x, y)` without any stacking rule. Returns
    /// `false` outside the map.
    pub fn stamp(&mut self, x: i64, y: i64, item: CellItem) -> bool {
        match self.cell_mut(x, y) {
            Some(cell) => {
                cell.push(item);
                true
            }
            None => false,
        }
    }

    /// Removes the top item of `(x, y)` whatever its type.
    pub fn erase_top(&mut self, x: i64, y: i64) -> Option<CellItem> {
        self.cell_mut(x, y)?.pop()
    }

    /// Resizes the grid to `width` × `height`, padding with empty cells and
    /// truncating what falls outside.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.map.resize_with(height, Vec::new);
        for row in &mut self.map {
            row.resize(width, Cell::empty());
        }
    }

    /// Clamps a position into the map rectangle. An empty map clamps to the
    /// origin.
    pub fn clamp(&self, x: i64, y: i64) -> (i64, i64) {
        let max_x = self.width().saturating_sub(1) as i64;
        let max_y = self.height().saturating_sub(1) as i64;
        (x.clamp(0, max_x), y.clamp(0, max_y))
    }
}

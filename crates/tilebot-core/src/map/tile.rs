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

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Template describing a placeable item: its look and how the hero may
/// interact with it.
///
/// Fields this crate does not interpret are kept in `extra` so a map survives
/// a load/save round trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TileType {
    /// Width as a percentage of the cell.
    pub width: f64,
    /// Height as a percentage of the cell.
    pub height: f64,
    /// CSS-like color string.
    pub color: String,
    /// Whether the item is drawn see-through.
    pub transparent: bool,
    /// Border style name.
    pub border: String,
    /// The hero can pick the item up.
    pub pickable: bool,
    /// The hero can walk onto a cell holding the item.
    pub stepable: bool,
    /// Other items can be stacked on top of the item.
    pub stackable: bool,
    /// Items larger than this one may still be stacked on it.
    pub allow_bigger_to_stack: bool,
    /// Unknown fields, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TileType {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            color: "#888888".to_string(),
            transparent: false,
            border: "none".to_string(),
            pickable: false,
            stepable: false,
            stackable: false,
            allow_bigger_to_stack: false,
            extra: Map::new(),
        }
    }
}

impl TileType {
    /// A tile type of the given size with every behavioural flag off.
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Sets the `pickable` flag.
    pub fn pickable(mut self) -> Self {
        self.pickable = true;
        self
    }

    /// Sets the `stepable` flag.
    pub fn stepable(mut self) -> Self {
        self.stepable = true;
        self
    }

    /// Sets the `stackable` flag.
    pub fn stackable(mut self) -> Self {
        self.stackable = true;
        self
    }

    /// Sets the `allowBiggerToStack` flag.
    pub fn allow_bigger(mut self) -> Self {
        self.allow_bigger_to_stack = true;
        self
    }

    /// Returns `true` when an item of this type is no larger than `below` in
    /// both dimensions.
    pub fn fits_on(&self, below: &TileType) -> bool {
        self.width <= below.width && self.height <= below.height
    }
}

/// Returns `true` for a valid type code: exactly one ASCII uppercase letter.
pub fn is_type_code(code: &str) -> bool {
    let mut chars = code.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

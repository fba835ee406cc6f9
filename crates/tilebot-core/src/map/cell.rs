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

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One item placed in a cell: a type code plus optional free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellItem {
    /// Key into `itemTypes`.
    #[serde(rename = "type")]
    pub type_code: String,
    /// Free text carried by the item (may be empty).
    #[serde(default)]
    pub text: String,
}

impl CellItem {
    /// Creates an item.
    pub fn new(type_code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            type_code: type_code.into(),
            text: text.into(),
        }
    }

    /// Parses a `Code[:text]` token. The first colon separates code from text.
    pub fn parse_token(token: &str) -> Option<Self> {
        let token = token.trim();
        let (code, text) = match token.split_once(':') {
            Some((code, text)) => (code.trim(), text),
            None => (token, ""),
        };
        if code.is_empty() {
            return None;
        }
        Some(Self::new(code, text))
    }

    /// Formats the item back into its `Code[:text]` token.
    pub fn to_token(&self) -> String {
        if self.text.is_empty() {
            self.type_code.clone()
        } else {
            format!("{}:{}", self.type_code, self.text)
        }
    }
}

/// A grid cell: a bottom-to-top stack of items (index 0 is the bottom).
///
/// Serialized as `0` when empty and as the comma-joined token list otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    items: Vec<CellItem>,
}

impl Cell {
    /// An empty cell.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A cell holding the given stack.
    pub fn from_items(items: Vec<CellItem>) -> Self {
        Self { items }
    }

    /// Parses a comma-joined token list. Blank tokens are ignored.
    pub fn parse(raw: &str) -> Self {
        Self {
            items: raw.split(',').filter_map(CellItem::parse_token).collect(),
        }
    }

    /// Returns `true` when nothing is placed in the cell.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The stack, bottom first.
    pub fn items(&self) -> &[CellItem] {
        &self.items
    }

    /// The topmost item.
    pub fn top(&self) -> Option<&CellItem> {
        self.items.last()
    }

    /// Places an item on top of the stack.
    pub fn push(&mut self, item: CellItem) {
        self.items.push(item);
    }

    /// Removes the topmost item.
    pub fn pop(&mut self) -> Option<CellItem> {
        self.items.pop()
    }

    /// The comma-joined token string, or `None` for an empty cell.
    pub fn to_token_string(&self) -> Option<String> {
        if self.items.is_empty() {
            return None;
        }
        Some(
            self.items
                .iter()
                .map(CellItem::to_token)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_token_string() {
            Some(tokens) => serializer.serialize_str(&tokens),
            None => serializer.serialize_u8(0),
        }
    }
}

struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0 or a comma-joined list of item tokens")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Cell, E> {
        Ok(Cell::parse(value))
    }

    fn visit_u64<E: de::Error>(self, _value: u64) -> Result<Cell, E> {
        Ok(Cell::empty())
    }

    fn visit_i64<E: de::Error>(self, _value: i64) -> Result<Cell, E> {
        Ok(Cell::empty())
    }

    fn visit_f64<E: de::Error>(self, _value: f64) -> Result<Cell, E> {
        Ok(Cell::empty())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Cell, E> {
        Ok(Cell::empty())
    }

    fn visit_none<E: de::Error>(self) -> Result<Cell, E> {
        Ok(Cell::empty())
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }
}

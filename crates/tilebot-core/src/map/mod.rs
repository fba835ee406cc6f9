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

//! The tile map model: tile type catalogue, cell stacks and the world
//! queries the hero and the interpreter rely on.

mod cell;
mod data;
mod tile;

pub use self::cell::{Cell, CellItem};
pub use self::data::MapData;
pub use self::tile::{is_type_code, TileType};

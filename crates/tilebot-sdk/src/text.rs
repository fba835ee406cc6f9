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

//! Plain text rendering of the world, one character per cell.
//!
//! The hero is drawn as an arrow (`^ v < >`) facing its direction. A cell
//! shows the first letter of its top known item, `.` when empty and `?`
//! when it only holds items of unknown types.

use tilebot_core::{Direction, Hero, MapData};

fn hero_glyph(dir: Direction) -> char {
    match dir {
        Direction::Up => '^',
        Direction::Down => 'v',
        Direction::Left => '<',
        Direction::Right => '>',
    }
}

/// Renders `map` with `hero` on top, rows separated by newlines.
pub fn render_text(map: &MapData, hero: &Hero) -> String {
    let (hx, hy) = hero.cell();
    let width = map.width();
    let mut out = String::with_capacity((width + 1) * map.height());

    for (y, row) in map.map.iter().enumerate() {
        if y > 0 {
            out.push('\n');
        }
        for x in 0..width {
            if (x as i64, y as i64) == (hx, hy) {
                out.push(hero_glyph(hero.dir));
                continue;
            }
            let glyph = match row.get(x) {
                None => ' ',
                Some(cell) if cell.is_empty() => '.',
                Some(cell) => map
                    .known_items(cell)
                    .last()
                    .and_then(|(item, _)| item.type_code.chars().next())
                    .unwrap_or('?'),
            };
            out.push(glyph);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilebot_core::TileType;

    #[test]
    fn renders_hero_items_and_unknowns() {
        let map = MapData::blank(4, 2)
            .with_type("A", TileType::default())
            .with_type("B", TileType::default())
            .with_cell(1, 0, "A,B")
            .with_cell(3, 1, "Z");
        let hero = Hero::at(0, 1, Direction::Right);

        assert_eq!(render_text(&map, &hero), ".B..\n>..?");
    }
}

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

//! The hero: turning, moving with an interpolated animation, picking items up
//! and dropping them.
//!
//! Keyboard input and the interpreter drive the hero through the same
//! `HeroMove` / `HeroInteract` events, so both behave identically. A move
//! animation always completes once started; stopping a program does not roll
//! it back.

use anyhow::Context;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use tilebot_core::config::HeroConfig;
use tilebot_core::state::paths;
use tilebot_core::{
    Direction, EventKind, Extension, ExtensionContext, GameEvent, Hero, NodeId, ObservableState,
};

/// Node role of the hero sprite.
pub const HERO_ROLE: &str = "hero";

/// Progress of the current move.
#[derive(Debug, Clone, Copy, Default)]
struct Animation {
    from: (f64, f64),
    elapsed_ms: f64,
}

#[derive(Debug, Default)]
struct HeroRuntime {
    animation: Option<Animation>,
    spawn: (i64, i64, Direction),
}

/// Owns `hero.*`.
pub struct HeroExtension {
    runtime: Rc<RefCell<HeroRuntime>>,
    config: HeroConfig,
    ctx: Option<ExtensionContext>,
}

impl Default for HeroExtension {
    fn default() -> Self {
        Self::new(HeroConfig::default())
    }
}

fn try_move(
    state: &ObservableState,
    runtime: &RefCell<HeroRuntime>,
    dir: Direction,
    instant: bool,
) -> anyhow::Result<Option<(i64, i64)>> {
    let mut hero = state.hero()?;
    if hero.moving {
        log::debug!("Hero is already moving, ignoring move {dir:?}.");
        return Ok(None);
    }
    hero.dir = dir;

    let map = state.map_data()?;
    let (x, y) = hero.cell();
    let target = map
        .neighbour(x, y, dir)
        .filter(|&(nx, ny)| map.is_walkable(nx, ny));
    let Some((nx, ny)) = target else {
        log::debug!("Hero at ({x}, {y}) cannot move {dir:?}.");
        state.set_hero(&hero)?;
        return Ok(None);
    };

    hero.target_x = nx;
    hero.target_y = ny;
    if instant {
        hero.x = nx as f64;
        hero.y = ny as f64;
        state.set_hero(&hero)?;
        return Ok(Some((nx, ny)));
    }

    runtime.borrow_mut().animation = Some(Animation {
        from: (hero.x, hero.y),
        elapsed_ms: 0.0,
    });
    hero.moving = true;
    state.set_hero(&hero)?;
    Ok(None)
}

fn interact(state: &ObservableState) -> anyhow::Result<()> {
    let mut hero = state.hero()?;
    let mut map = state.map_data()?;
    let (x, y) = hero.cell();

    match hero.carrying.take() {
        None => match map.pick_up(x, y) {
            Some(item) => {
                log::debug!("Hero picked up '{}' at ({x}, {y}).", item.to_token());
                hero.carrying = Some(item);
            }
            None => {
                log::debug!("Nothing to pick up at ({x}, {y}).");
                return Ok(());
            }
        },
        Some(item) => match map.drop_item(x, y, item) {
            Ok(()) => log::debug!("Hero dropped an item at ({x}, {y})."),
            Err(item) => {
                log::debug!("Cannot drop '{}' at ({x}, {y}).", item.to_token());
                return Ok(());
            }
        },
    }

    state.set_map_grid(&map)?;
    state.set_hero(&hero)?;
    Ok(())
}

/// Pulls the recorded spawn and, when it fell outside, the hero back onto
/// the map. A move aimed outside the map is abandoned.
fn keep_on_map(state: &ObservableState, runtime: &RefCell<HeroRuntime>) -> anyhow::Result<()> {
    let map = state.map_data()?;
    {
        let mut runtime = runtime.borrow_mut();
        let (sx, sy, dir) = runtime.spawn;
        let (sx, sy) = map.clamp(sx, sy);
        runtime.spawn = (sx, sy, dir);
    }

    let hero = state.hero()?;
    let (x, y) = hero.cell();
    if map.in_bounds(x, y) && map.in_bounds(hero.target_x, hero.target_y) {
        return Ok(());
    }
    runtime.borrow_mut().animation = None;
    let (x, y) = map.clamp(x, y);
    let dir = hero.dir;
    let moved = Hero {
        sheet: hero.sheet,
        carrying: hero.carrying,
        ..Hero::at(x, y, dir)
    };
    state.set_hero(&moved)?;
    log::debug!("Map shrank under the hero, moved it to ({x}, {y}).");
    Ok(())
}

impl HeroExtension {
    /// Creates the extension with the given animation settings.
    pub fn new(config: HeroConfig) -> Self {
        Self {
            runtime: Rc::new(RefCell::new(HeroRuntime::default())),
            config,
            ctx: None,
        }
    }

    /// The cell and facing `HeroReset` returns to.
    pub fn spawn(&self) -> (i64, i64, Direction) {
        self.runtime.borrow().spawn
    }

    fn sync_node(ctx: &ExtensionContext, node: NodeId, hero: &Hero) {
        let surface = ctx.surface();
        surface.set_attr(node, "x", format!("{:.3}", hero.x));
        surface.set_attr(node, "y", format!("{:.3}", hero.y));
        surface.set_attr(node, "dir", format!("{:?}", hero.dir).to_lowercase());
        surface.set_attr(node, "frame", hero.frame.to_string());
        let carrying = hero
            .carrying
            .as_ref()
            .map(|item| item.to_token())
            .unwrap_or_default();
        surface.set_attr(node, "carrying", carrying);
    }
}

impl Extension for HeroExtension {
    fn name(&self) -> &'static str {
        "hero"
    }

    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        self.config = ctx.config().hero.clone();
        let hero = ctx.state().hero().context("hero needs a hero slice")?;
        let (x, y) = hero.cell();
        self.runtime.borrow_mut().spawn = (x, y, hero.dir);

        let node = ctx.create_node(HERO_ROLE, None);
        Self::sync_node(ctx, node, &hero);

        let c = ctx.clone();
        ctx.observe(paths::HERO, move |value| {
            match serde_json::from_value::<Hero>(value.clone()) {
                Ok(hero) => Self::sync_node(&c, node, &hero),
                Err(e) => log::warn!("Malformed hero state: {e}"),
            }
        });

        let runtime = self.runtime.clone();
        let c = ctx.clone();
        ctx.observe(paths::MAP_DATA, move |_| {
            if let Err(e) = keep_on_map(c.state(), &runtime) {
                log::warn!("Cannot keep the hero on the map: {e:#}");
            }
        });

        let runtime = self.runtime.clone();
        let c = ctx.clone();
        let instant = self.config.move_duration_ms <= 0.0;
        ctx.on(EventKind::HeroMove, move |event| {
            let GameEvent::HeroMove(dir) = event else {
                return Ok(());
            };
            if let Some((x, y)) = try_move(c.state(), &runtime, *dir, instant)? {
                c.emit(GameEvent::HeroArrived { x, y });
            }
            Ok(())
        });

        let c = ctx.clone();
        ctx.on(EventKind::HeroInteract, move |_| interact(c.state()));

        let runtime = self.runtime.clone();
        let c = ctx.clone();
        ctx.on(EventKind::HeroReset, move |_| {
            let map = c.state().map_data()?;
            let (sx, sy, dir) = runtime.borrow().spawn;
            let (x, y) = map.clamp(sx, sy);
            runtime.borrow_mut().animation = None;
            let previous = c.state().hero()?;
            let hero = Hero {
                sheet: previous.sheet,
                ..Hero::at(x, y, dir)
            };
            c.state().set_hero(&hero)?;
            log::debug!("Hero reset to ({x}, {y}).");
            Ok(())
        });

        self.ctx = Some(ctx.clone());
        Ok(())
    }

    fn wants_update(&self) -> bool {
        true
    }

    fn update(&mut self, delta_secs: f64, _now_ms: f64) -> anyhow::Result<()> {
        let Some(ctx) = &self.ctx else {
            return Ok(());
        };
        let Some(mut animation) = self.runtime.borrow().animation else {
            return Ok(());
        };

        let mut hero = ctx.state().hero()?;
        animation.elapsed_ms += delta_secs * 1000.0;
        let duration = self.config.move_duration_ms.max(f64::EPSILON);
        let t = (animation.elapsed_ms / duration).min(1.0);
        let (fx, fy) = animation.from;
        let (tx, ty) = (hero.target_x as f64, hero.target_y as f64);

        let arrived = t >= 1.0;
        if arrived {
            hero.x = tx;
            hero.y = ty;
            hero.moving = false;
            hero.frame = 0;
            self.runtime.borrow_mut().animation = None;
        } else {
            hero.x = fx + (tx - fx) * t;
            hero.y = fy + (ty - fy) * t;
            let interval = self.config.frame_interval_ms.max(1.0);
            let frames = self.config.walk_frames.max(1);
            hero.frame = (animation.elapsed_ms / interval) as u32 % frames;
            self.runtime.borrow_mut().animation = Some(animation);
        }
        ctx.state().set_hero(&hero)?;

        if arrived {
            ctx.emit(GameEvent::HeroArrived {
                x: hero.target_x,
                y: hero.target_y,
            });
        }
        Ok(())
    }

    fn destroy(&mut self) {
        self.ctx = None;
        self.runtime.borrow_mut().animation = None;
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
    use tilebot_core::{ApplicationState, CellItem, MapData, TileType};

    fn state_with(map: MapData, hero: Hero) -> ObservableState {
        let app = ApplicationState {
            map_data: map,
            hero,
            ..ApplicationState::default()
        };
        ObservableState::from_application(&app).unwrap()
    }

    #[test]
    fn instant_move_lands_on_target() {
        let state = state_with(MapData::blank(3, 1), Hero::at(0, 0, Direction::Down));
        let runtime = RefCell::new(HeroRuntime::default());

        let arrived = try_move(&state, &runtime, Direction::Right, true).unwrap();

        assert_eq!(arrived, Some((1, 0)));
        let hero = state.hero().unwrap();
        assert_eq!((hero.cell(), hero.dir, hero.moving), ((1, 0), Direction::Right, false));
    }

    #[test]
    fn blocked_move_only_turns() {
        let map = MapData::blank(2, 1)
            .with_type("W", TileType::default())
            .with_cell(1, 0, "W");
        let state = state_with(map, Hero::at(0, 0, Direction::Down));
        let runtime = RefCell::new(HeroRuntime::default());

        assert_eq!(try_move(&state, &runtime, Direction::Right, true).unwrap(), None);
        let hero = state.hero().unwrap();
        assert_eq!((hero.cell(), hero.dir), ((0, 0), Direction::Right));
    }

    #[test]
    fn animated_move_marks_hero_moving() {
        let state = state_with(MapData::blank(3, 1), Hero::at(0, 0, Direction::Right));
        let runtime = RefCell::new(HeroRuntime::default());

        try_move(&state, &runtime, Direction::Right, false).unwrap();

        assert!(state.hero().unwrap().moving);
        assert!(runtime.borrow().animation.is_some());
        assert_eq!(try_move(&state, &runtime, Direction::Right, false).unwrap(), None);
    }

    #[test]
    fn shrinking_the_map_pulls_hero_and_spawn_inside() {
        let state = state_with(MapData::blank(4, 4), Hero::at(3, 3, Direction::Left));
        let runtime = RefCell::new(HeroRuntime {
            animation: None,
            spawn: (3, 2, Direction::Up),
        });
        let mut map = state.map_data().unwrap();
        map.resize(2, 2);
        state.set_map_grid(&map).unwrap();

        keep_on_map(&state, &runtime).unwrap();

        let hero = state.hero().unwrap();
        assert_eq!((hero.cell(), hero.dir), ((1, 1), Direction::Left));
        assert_eq!((hero.target_x, hero.target_y), (1, 1));
        assert_eq!(runtime.borrow().spawn, (1, 1, Direction::Up));
    }

    #[test]
    fn interact_picks_up_then_drops_back() {
        let map = MapData::blank(1, 1)
            .with_type("A", TileType::default().pickable().stackable())
            .with_type("B", TileType::sized(50.0, 50.0).pickable())
            .with_cell(0, 0, "A,B:tag");
        let state = state_with(map, Hero::at(0, 0, Direction::Down));

        interact(&state).unwrap();
        assert_eq!(state.hero().unwrap().carrying, Some(CellItem::new("B", "tag")));
        assert_eq!(state.get("mapData.map.0.0"), Some(serde_json::json!("A")));

        interact(&state).unwrap();
        assert_eq!(state.hero().unwrap().carrying, None);
        assert_eq!(state.get("mapData.map.0.0"), Some(serde_json::json!("A,B:tag")));
    }
}

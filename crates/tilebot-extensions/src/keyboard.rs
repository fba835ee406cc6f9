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

//! Arrow keys move the hero, space interacts.

use std::any::Any;
use tilebot_core::{Direction, EventKind, Extension, ExtensionContext, GameEvent, Key, Mode};

/// Translates key presses into hero events.
#[derive(Debug, Default)]
pub struct KeyboardExtension;

impl KeyboardExtension {
    /// Creates the extension.
    pub fn new() -> Self {
        Self
    }
}

/// The hero event bound to `key`, if any.
pub fn binding(key: Key) -> Option<GameEvent> {
    match key {
        Key::Up => Some(GameEvent::HeroMove(Direction::Up)),
        Key::Down => Some(GameEvent::HeroMove(Direction::Down)),
        Key::Left => Some(GameEvent::HeroMove(Direction::Left)),
        Key::Right => Some(GameEvent::HeroMove(Direction::Right)),
        Key::Space => Some(GameEvent::HeroInteract),
        Key::Char(_) => None,
    }
}

impl Extension for KeyboardExtension {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        let c = ctx.clone();
        ctx.on(EventKind::KeyPress, move |event| {
            let GameEvent::KeyPress(key) = event else {
                return Ok(());
            };
            // Typing in the editor must not walk the hero around.
            if c.state().mode()? == Mode::Edit {
                return Ok(());
            }
            if let Some(bound) = binding(*key) {
                c.emit(bound);
            }
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
    use std::cell::Cell;
    use std::rc::Rc;
    use tilebot_core::{EngineConfig, GameBus, ObservableState, Surface};

    fn run(mode: Mode, key: Key) -> usize {
        let state = ObservableState::new(serde_json::json!({ "mode": mode }));
        let ctx = ExtensionContext::new(
            "keyboard",
            state,
            GameBus::new(),
            Surface::new(),
            Rc::new(EngineConfig::default()),
        );
        KeyboardExtension::new().init(&ctx).unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        ctx.on(EventKind::HeroMove, move |_| {
            h.set(h.get() + 1);
            Ok(())
        });
        ctx.emit(GameEvent::KeyPress(key));
        hits.get()
    }

    #[test]
    fn arrows_move_outside_the_editor() {
        assert_eq!(run(Mode::Play, Key::Left), 1);
        assert_eq!(run(Mode::Program, Key::Up), 1);
        assert_eq!(run(Mode::Edit, Key::Left), 0);
        assert_eq!(run(Mode::Play, Key::Char('w')), 0);
    }

    #[test]
    fn space_interacts() {
        assert_eq!(binding(Key::Space), Some(GameEvent::HeroInteract));
    }
}

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

use serde_json::{json, Value};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use tilebot_core::{
    Direction, EngineConfig, EventKind, Extension, ExtensionContext, GameBus, GameEvent, GameLoop,
    ObservableState, Surface,
};

/// Counts hero moves into `hero.steps` and mirrors the count on a node.
#[derive(Default)]
struct StepCounter {
    ticks: u32,
}

impl Extension for StepCounter {
    fn name(&self) -> &'static str {
        "step-counter"
    }

    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        let node = ctx.create_node("counter", None);

        let c = ctx.clone();
        ctx.on(EventKind::HeroMove, move |_| {
            let steps = c.state().get_as::<u64>("hero.steps").unwrap_or(0);
            c.state().set("hero.steps", steps + 1)?;
            Ok(())
        });

        let c = ctx.clone();
        ctx.observe("hero", move |hero| {
            let steps = hero.get("steps").cloned().unwrap_or(Value::Null);
            c.surface().set_attr(node, "steps", steps.to_string());
        });
        Ok(())
    }

    fn wants_update(&self) -> bool {
        true
    }

    fn update(&mut self, _delta_secs: f64, _now_ms: f64) -> anyhow::Result<()> {
        self.ticks += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn events_flow_into_state_and_out_to_the_surface() {
    let state = ObservableState::new(json!({ "hero": { "x": 0 } }));
    let bus = GameBus::new();
    let surface = Surface::new();
    let ctx = ExtensionContext::new(
        "step-counter",
        state.clone(),
        bus.clone(),
        surface.clone(),
        Rc::new(EngineConfig::default()),
    );

    let counter = Rc::new(RefCell::new(StepCounter::default()));
    counter.borrow_mut().init(&ctx).unwrap();
    let mut game_loop = GameLoop::default();
    let updater = counter.clone();
    game_loop.register("step-counter", move |dt, now| updater.borrow_mut().update(dt, now));

    bus.emit(GameEvent::HeroMove(Direction::Left));
    bus.publish(GameEvent::HeroMove(Direction::Right));
    assert_eq!(state.get("hero.steps"), Some(json!(1)));

    assert_eq!(bus.drain_queued(), 1);
    game_loop.start();
    game_loop.frame(0.0);
    game_loop.frame(16.0);

    assert_eq!(state.get("hero.steps"), Some(json!(2)));
    let node = &surface.nodes_with_role("counter")[0];
    assert_eq!(node.attrs.get("steps").map(String::as_str), Some("2"));
    assert_eq!(counter.borrow().ticks, 2);

    ctx.teardown();
    bus.emit(GameEvent::HeroMove(Direction::Up));
    assert_eq!(state.get("hero.steps"), Some(json!(2)));
    assert!(surface.is_empty());
}

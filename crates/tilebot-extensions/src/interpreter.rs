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

//! Runs `program.code` on the register machine, one instruction at a time.
//!
//! Timed execution happens in [`Extension::update`]: while `program.running`
//! is set and `program.paused` is not, at most one instruction executes per
//! frame, and only once `1000 / program.speed` milliseconds have elapsed since
//! the previous one. Dropped frames are not caught up. Nothing executes while
//! the hero is mid-move.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use tilebot_core::state::paths;
use tilebot_core::{EventKind, Extension, ExtensionContext, GameEvent, ObservableState};
use tilebot_vm::{Action, Diagnostic, Limits, Machine, MachineSnapshot, Program, Step, World};

/// Lowest accepted speed, in instructions per second.
pub const MIN_SPEED: f64 = 0.1;

/// The world as seen through the state tree.
struct StateWorld<'a> {
    state: &'a ObservableState,
}

impl World for StateWorld<'_> {
    fn hero_moving(&self) -> bool {
        self.state.get_as(paths::HERO_MOVING).unwrap_or(false)
    }

    fn facing_cell_empty(&self) -> bool {
        match (self.state.hero(), self.state.map_data()) {
            (Ok(hero), Ok(map)) => {
                let (x, y) = hero.cell();
                map.is_facing_empty(x, y, hero.dir)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct Runner {
    machine: Option<Machine>,
    last_step_ms: Option<f64>,
    diagnostics: Vec<Diagnostic>,
}

impl Runner {
    /// Parses `program.code` into a fresh machine.
    fn load(&mut self, state: &ObservableState, limits: Limits) -> anyhow::Result<()> {
        let code = state.program_code()?;
        let program = Program::parse(&code);
        for diagnostic in program.diagnostics() {
            log::warn!("Program {diagnostic}");
        }
        self.diagnostics = program.diagnostics().to_vec();
        self.machine = Some(Machine::new(program, limits));
        self.last_step_ms = None;
        Ok(())
    }

    fn discard(&mut self) {
        self.machine = None;
        self.last_step_ms = None;
    }

    fn step(&mut self, state: &ObservableState) -> Option<Step> {
        let machine = self.machine.as_mut()?;
        Some(machine.step(&StateWorld { state }))
    }
}

/// The event a machine action turns into.
fn action_event(action: Action) -> GameEvent {
    match action {
        Action::Move(dir) => GameEvent::HeroMove(dir),
        Action::Interact => GameEvent::HeroInteract,
    }
}

/// Emits what a step produced; returns `true` when the program halted.
fn publish(ctx: &ExtensionContext, step: Step) -> anyhow::Result<bool> {
    match step {
        Step::Continue(Some(action)) => {
            ctx.emit(action_event(action));
            Ok(false)
        }
        Step::Continue(None) | Step::Waiting => Ok(false),
        Step::Halted(reason) => {
            ctx.state().set_program_flags(false, false)?;
            log::info!("Program halted: {reason:?}.");
            ctx.emit(GameEvent::InterpreterHalted(reason));
            Ok(true)
        }
    }
}

/// Owns the register machine and `program.running` / `program.paused`.
#[derive(Default)]
pub struct InterpreterExtension {
    runner: Rc<RefCell<Runner>>,
    limits: Limits,
    default_speed: f64,
    ctx: Option<ExtensionContext>,
}

impl InterpreterExtension {
    /// Creates the extension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers and stacks of the loaded machine, for a debug view.
    pub fn snapshot(&self) -> Option<MachineSnapshot> {
        self.runner.borrow().machine.as_ref().map(Machine::snapshot)
    }

    /// Diagnostics of the last parsed program.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.runner.borrow().diagnostics.clone()
    }

    fn stop(ctx: &ExtensionContext, runner: &RefCell<Runner>) -> anyhow::Result<()> {
        runner.borrow_mut().discard();
        ctx.state().set_program_flags(false, false)?;
        Ok(())
    }
}

impl Extension for InterpreterExtension {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        self.limits = Limits::from(&ctx.config().interpreter);
        self.default_speed = ctx.config().interpreter.default_speed;
        let limits = self.limits;

        let runner = self.runner.clone();
        let c = ctx.clone();
        ctx.on(EventKind::InterpreterRun, move |_| {
            runner.borrow_mut().load(c.state(), limits)?;
            c.state().set_program_flags(true, false)?;
            log::info!("Program started.");
            Ok(())
        });

        let runner = self.runner.clone();
        let c = ctx.clone();
        ctx.on(EventKind::InterpreterStep, move |_| {
            let fresh = runner
                .borrow()
                .machine
                .as_ref()
                .map_or(true, |machine| machine.halted().is_some());
            if fresh {
                runner.borrow_mut().load(c.state(), limits)?;
            }
            let step = runner.borrow_mut().step(c.state());
            match step {
                Some(Step::Waiting) => log::debug!("Hero is moving, step deferred."),
                Some(step) => {
                    publish(&c, step)?;
                }
                None => {}
            }
            Ok(())
        });

        for kind in [EventKind::InterpreterStop, EventKind::ProgrammingStop] {
            let runner = self.runner.clone();
            let c = ctx.clone();
            ctx.on(kind, move |_| {
                Self::stop(&c, &runner)?;
                log::info!("Program stopped.");
                Ok(())
            });
        }

        let c = ctx.clone();
        ctx.on(EventKind::InterpreterPause, move |_| {
            if c.state().program()?.running {
                c.state().set(paths::PROGRAM_PAUSED, true)?;
            }
            Ok(())
        });

        let runner = self.runner.clone();
        let c = ctx.clone();
        ctx.on(EventKind::InterpreterResume, move |_| {
            runner.borrow_mut().last_step_ms = None;
            c.state().set(paths::PROGRAM_PAUSED, false)?;
            Ok(())
        });

        let runner = self.runner.clone();
        let c = ctx.clone();
        ctx.on(EventKind::InterpreterReset, move |_| {
            Self::stop(&c, &runner)?;
            c.emit(GameEvent::HeroReset);
            Ok(())
        });

        self.ctx = Some(ctx.clone());
        Ok(())
    }

    fn wants_update(&self) -> bool {
        true
    }

    fn update(&mut self, _delta_secs: f64, now_ms: f64) -> anyhow::Result<()> {
        let Some(ctx) = &self.ctx else {
            return Ok(());
        };
        let program = ctx.state().program()?;
        if !program.running || program.paused {
            return Ok(());
        }

        let speed = if program.speed.is_finite() && program.speed > 0.0 {
            program.speed
        } else {
            self.default_speed
        };
        let interval_ms = 1000.0 / speed.max(MIN_SPEED);

        let step = {
            let mut runner = self.runner.borrow_mut();
            if runner.machine.is_none() {
                runner.load(ctx.state(), self.limits)?;
            }
            if let Some(last) = runner.last_step_ms {
                if now_ms - last < interval_ms {
                    return Ok(());
                }
            }
            let step = runner.step(ctx.state());
            if matches!(step, Some(Step::Continue(_))) {
                runner.last_step_ms = Some(now_ms);
            }
            step
        };

        if let Some(step) = step {
            publish(ctx, step)?;
        }
        Ok(())
    }

    fn destroy(&mut self) {
        self.runner.borrow_mut().discard();
        self.ctx = None;
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
    use tilebot_core::{
        ApplicationState, Direction, EngineConfig, GameBus, HaltReason, MapData, ProgramState,
        Surface,
    };

    fn setup(code: &str) -> (InterpreterExtension, ExtensionContext, Rc<RefCell<Vec<GameEvent>>>) {
        let app = ApplicationState {
            map_data: MapData::blank(4, 1),
            program: ProgramState {
                code: code.to_string(),
                ..ProgramState::default()
            },
            ..ApplicationState::default()
        };
        let ctx = ExtensionContext::new(
            "interpreter",
            ObservableState::from_application(&app).unwrap(),
            GameBus::new(),
            Surface::new(),
            Rc::new(EngineConfig::default()),
        );
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        ctx.events()
            .on_any(move |event| {
                sink.borrow_mut().push(event.clone());
                Ok(())
            })
            .detach();
        let mut ext = InterpreterExtension::new();
        ext.init(&ctx).unwrap();
        (ext, ctx, seen)
    }

    fn moves(seen: &RefCell<Vec<GameEvent>>) -> usize {
        seen.borrow()
            .iter()
            .filter(|e| matches!(e, GameEvent::HeroMove(_)))
            .count()
    }

    #[test]
    fn timed_run_respects_speed_and_halts() {
        let (mut ext, ctx, seen) = setup("right\nright");
        ctx.emit(GameEvent::InterpreterRun);
        assert!(ctx.state().program().unwrap().running);

        ext.update(0.0, 0.0).unwrap();
        assert_eq!(moves(&seen), 1);
        ext.update(0.1, 100.0).unwrap();
        assert_eq!(moves(&seen), 1, "2 instructions per second");
        ext.update(0.4, 500.0).unwrap();
        assert_eq!(moves(&seen), 2);
        ext.update(0.5, 1000.0).unwrap();

        assert!(!ctx.state().program().unwrap().running);
        assert!(seen
            .borrow()
            .contains(&GameEvent::InterpreterHalted(HaltReason::EndOfProgram)));
    }

    #[test]
    fn paused_program_does_not_advance() {
        let (mut ext, ctx, seen) = setup("left");
        ctx.emit(GameEvent::InterpreterRun);
        ctx.emit(GameEvent::InterpreterPause);
        ext.update(0.0, 0.0).unwrap();
        assert_eq!(moves(&seen), 0);

        ctx.emit(GameEvent::InterpreterResume);
        ext.update(0.0, 10.0).unwrap();
        assert_eq!(seen.borrow().last(), Some(&GameEvent::HeroMove(Direction::Left)));
    }

    #[test]
    fn step_waits_for_a_moving_hero() {
        let (_ext, ctx, seen) = setup("down");
        ctx.state().set(paths::HERO_MOVING, true).unwrap();
        ctx.emit(GameEvent::InterpreterStep);
        assert_eq!(moves(&seen), 0);

        ctx.state().set(paths::HERO_MOVING, false).unwrap();
        ctx.emit(GameEvent::InterpreterStep);
        assert_eq!(moves(&seen), 1);
    }

    #[test]
    fn programming_stop_discards_the_machine() {
        let (ext, ctx, _seen) = setup("copy r0 7\nright");
        ctx.emit(GameEvent::InterpreterStep);
        assert_eq!(ext.snapshot().map(|s| s.registers[0]), Some(7));

        ctx.emit(GameEvent::ProgrammingStop);
        assert!(ext.snapshot().is_none());
        assert!(!ctx.state().program().unwrap().running);
    }

    #[test]
    fn reset_sends_the_hero_home() {
        let (_ext, ctx, seen) = setup("right");
        ctx.emit(GameEvent::InterpreterRun);
        ctx.emit(GameEvent::InterpreterReset);
        assert!(!ctx.state().program().unwrap().running);
        assert!(seen.borrow().contains(&GameEvent::HeroReset));
    }

    #[test]
    fn diagnostics_are_kept() {
        let (ext, ctx, _seen) = setup("fly\nright");
        ctx.emit(GameEvent::InterpreterRun);
        assert_eq!(ext.diagnostics().len(), 1);
    }
}

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

//! The public-facing SDK of Tilebot.
//!
//! [`AppBuilder`] collects the initial state, the configuration and an
//! explicit, ordered list of extension factories. [`App`] owns the shared
//! state tree, event bus, render surface and game loop, tracks the lifecycle
//! of every extension and drives frames either headless (fixed timestamps)
//! or in real time (a [`FrameClock`]).

pub mod mode;
pub mod text;

pub use mode::next_mode;
pub use text::render_text;

use anyhow::Context;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;
use std::time::Duration;
use tilebot_core::{
    ApplicationState, Delivery, EngineConfig, Extension, ExtensionContext, ExtensionState,
    FrameClock, FrameReport, GameBus, GameEvent, GameLoop, MapData, ObservableState, Surface,
};
use tilebot_extensions::{
    DirectoryStore, EditorExtension, GridExtension, HeroExtension, InterpreterExtension,
    KeyboardExtension, MemoryStore, NotificationExtension, PersistenceExtension,
    ProgrammingBlockExtension, ViewportExtension,
};

/// Re-exports for applications built on the SDK.
pub mod prelude {
    pub use tilebot_core::{
        ApplicationState, Direction, EngineConfig, Extension, ExtensionContext, GameEvent, Hero,
        Key, MapData, Mode, TileType,
    };
    pub use tilebot_extensions::*;
    pub use tilebot_vm::{BlockProgram, Program};

    pub use crate::{App, AppBuilder};
}

/// Builds an extension once the configuration is known.
pub type ExtensionFactory = Box<dyn FnOnce(&EngineConfig) -> anyhow::Result<Box<dyn Extension>>>;

type SharedExtension = Rc<RefCell<Box<dyn Extension>>>;

/// Collects everything an [`App`] starts from.
pub struct AppBuilder {
    config: EngineConfig,
    state: ApplicationState,
    factories: Vec<(String, ExtensionFactory)>,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    /// A builder with default configuration, default state and no
    /// extensions.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            state: ApplicationState::default(),
            factories: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the whole initial state.
    pub fn state(mut self, state: ApplicationState) -> Self {
        self.state = state;
        self
    }

    /// Sets the initial map.
    pub fn map(mut self, map: MapData) -> Self {
        self.state.map_data = map;
        self
    }

    /// Sets the initial program text.
    pub fn program(mut self, code: impl Into<String>) -> Self {
        self.state.program.code = code.into();
        self
    }

    /// Registers an already constructed extension.
    pub fn extension<E: Extension>(self, extension: E) -> Self {
        let label = std::any::type_name::<E>().to_string();
        self.extension_with(label, move |_| Ok(Box::new(extension) as Box<dyn Extension>))
    }

    /// Registers a factory. `label` names the factory in logs when it fails.
    pub fn extension_with<F>(mut self, label: impl Into<String>, factory: F) -> Self
    where
        F: FnOnce(&EngineConfig) -> anyhow::Result<Box<dyn Extension>> + 'static,
    {
        self.factories.push((label.into(), Box::new(factory)));
        self
    }

    /// Registers the standard extension set, in dependency-free order.
    ///
    /// The persistence extension uses a [`DirectoryStore`] when
    /// `store.directory` is configured and a [`MemoryStore`] otherwise.
    pub fn with_default_extensions(self) -> Self {
        self.extension(NotificationExtension::new())
            .extension(GridExtension::new())
            .extension_with("hero", |config| {
                Ok(Box::new(HeroExtension::new(config.hero.clone())) as Box<dyn Extension>)
            })
            .extension(ViewportExtension::new())
            .extension(EditorExtension::new())
            .extension(InterpreterExtension::new())
            .extension(ProgrammingBlockExtension::new())
            .extension(KeyboardExtension::new())
            .extension_with("persistence", |config| {
                let extension = match &config.store.directory {
                    Some(dir) => PersistenceExtension::new(DirectoryStore::new(dir)),
                    None => PersistenceExtension::new(MemoryStore::new()),
                };
                Ok(Box::new(extension) as Box<dyn Extension>)
            })
    }

    /// Creates the shared services and initializes every extension in
    /// registration order. A failing factory or `init` is logged and the
    /// extension is left out.
    pub fn build(self) -> anyhow::Result<App> {
        let state = ObservableState::from_application(&self.state)
            .context("initial application state cannot be encoded")?;
        let config = Rc::new(self.config);
        let bus = GameBus::new();
        let surface = Surface::new();
        let game_loop = GameLoop::new(config.game_loop.max_frame_delta_secs);

        let policy = ExtensionContext::new(
            "app",
            state.clone(),
            bus.clone(),
            surface.clone(),
            config.clone(),
        );
        mode::install(&policy);

        let mut app = App {
            state,
            bus,
            surface,
            config,
            game_loop,
            policy,
            extensions: Vec::new(),
            shut_down: false,
        };
        for (label, factory) in self.factories {
            app.load(&label, factory);
        }
        for name in app.extension_names() {
            app.enable(name);
        }
        log::info!(
            "Tilebot app built with {} extension(s).",
            app.extensions.len()
        );
        Ok(app)
    }
}

struct Registered {
    name: &'static str,
    extension: SharedExtension,
    ctx: ExtensionContext,
    enabled: Rc<Cell<bool>>,
    lifecycle: ExtensionState,
}

/// The running application.
pub struct App {
    state: ObservableState,
    bus: GameBus,
    surface: Surface,
    config: Rc<EngineConfig>,
    game_loop: GameLoop,
    policy: ExtensionContext,
    extensions: Vec<Registered>,
    shut_down: bool,
}

impl App {
    /// Shorthand for [`AppBuilder::new`].
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Instantiates and initializes one extension, leaving it
    /// [`ExtensionState::Initialized`]. Updates start once it is enabled.
    ///
    /// ## Arguments
    /// * `label` - Names the factory in logs when it fails.
    /// * `factory` - Builds the extension from the configuration.
    ///
    /// ## Returns
    /// `true` when the extension was registered.
    fn load(&mut self, label: &str, factory: ExtensionFactory) -> bool {
        let mut extension = match factory(&self.config) {
            Ok(extension) => extension,
            Err(e) => {
                log::error!("Extension factory '{label}' failed: {e:#}");
                return false;
            }
        };
        let name = extension.name();
        if self.extensions.iter().any(|r| r.name == name) {
            log::warn!("Extension '{name}' is already registered, skipping duplicate.");
            return false;
        }
        let mut lifecycle = ExtensionState::Unloaded;

        let ctx = ExtensionContext::new(
            name,
            self.state.clone(),
            self.bus.clone(),
            self.surface.clone(),
            self.config.clone(),
        );
        if let Err(e) = extension.init(&ctx) {
            log::error!("Extension '{name}' failed to initialize: {e:#}");
            ctx.teardown();
            return false;
        }
        if lifecycle.can_transition_to(ExtensionState::Initialized) {
            lifecycle = ExtensionState::Initialized;
        }

        let wants_update = extension.wants_update();
        let extension: SharedExtension = Rc::new(RefCell::new(extension));
        let enabled = Rc::new(Cell::new(false));
        if wants_update {
            let updater = extension.clone();
            self.game_loop
                .register_gated(name, enabled.clone(), move |delta, now| {
                    match updater.try_borrow_mut() {
                        Ok(mut extension) => extension.update(delta, now),
                        Err(_) => {
                            log::warn!("Extension '{name}' is busy, skipping its update.");
                            Ok(())
                        }
                    }
                });
        }

        log::debug!("Extension '{name}' {lifecycle}.");
        self.extensions.push(Registered {
            name,
            extension,
            ctx,
            enabled,
            lifecycle,
        });
        true
    }

    /// The shared state tree.
    pub fn state(&self) -> &ObservableState {
        &self.state
    }

    /// The shared event bus.
    pub fn events(&self) -> &GameBus {
        &self.bus
    }

    /// The shared render surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// The configuration the app was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Emits an event synchronously.
    pub fn emit(&self, event: GameEvent) -> Delivery {
        self.bus.emit(event)
    }

    /// Queues an event for the start of the next frame.
    pub fn queue(&self, event: GameEvent) {
        self.bus.publish(event);
    }

    /// Names of the loaded extensions, in registration order.
    pub fn extension_names(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|r| r.name).collect()
    }

    /// Lifecycle state of the extension named `name`.
    pub fn lifecycle(&self, name: &str) -> Option<ExtensionState> {
        self.find(name).map(|r| r.lifecycle)
    }

    fn find(&self, name: &str) -> Option<&Registered> {
        self.extensions.iter().find(|r| r.name == name)
    }

    /// Borrows the loaded extension of type `T`.
    ///
    /// Returns `None` when no such extension is loaded or it is currently
    /// borrowed mutably.
    pub fn extension<T: Extension>(&self) -> Option<Ref<'_, T>> {
        self.extensions.iter().find_map(|r| {
            let borrowed = r.extension.try_borrow().ok()?;
            Ref::filter_map(borrowed, |e| e.as_any().downcast_ref::<T>()).ok()
        })
    }

    /// Mutably borrows the loaded extension of type `T`.
    pub fn extension_mut<T: Extension>(&self) -> Option<RefMut<'_, T>> {
        self.extensions.iter().find_map(|r| {
            let borrowed = r.extension.try_borrow_mut().ok()?;
            RefMut::filter_map(borrowed, |e| e.as_any_mut().downcast_mut::<T>()).ok()
        })
    }

    fn transition(&mut self, name: &str, next: ExtensionState) -> bool {
        let Some(registered) = self.extensions.iter_mut().find(|r| r.name == name) else {
            log::warn!("No extension named '{name}'.");
            return false;
        };
        if !registered.lifecycle.can_transition_to(next) {
            log::warn!(
                "Extension '{name}' cannot go from {} to {next}.",
                registered.lifecycle
            );
            return false;
        }
        registered.lifecycle = next;
        registered.enabled.set(next == ExtensionState::Enabled);
        log::info!("Extension '{name}' {next}.");
        true
    }

    /// Resumes per-frame updates of a disabled extension.
    pub fn enable(&mut self, name: &str) -> bool {
        self.transition(name, ExtensionState::Enabled)
    }

    /// Stops per-frame updates of an extension. Its handlers stay subscribed.
    pub fn disable(&mut self, name: &str) -> bool {
        self.transition(name, ExtensionState::Disabled)
    }

    /// Starts the game loop.
    pub fn start(&mut self) {
        self.game_loop.start();
    }

    /// Stops the game loop.
    pub fn stop(&mut self) {
        self.game_loop.stop();
    }

    /// Pauses the game loop.
    pub fn pause(&mut self) {
        self.game_loop.pause();
    }

    /// Resumes the game loop.
    pub fn resume(&mut self) {
        self.game_loop.resume();
    }

    /// Number of frames processed.
    pub fn frame_count(&self) -> u64 {
        self.game_loop.frame_count()
    }

    /// Delivers queued events, then runs one frame at `now_ms`.
    pub fn frame(&mut self, now_ms: f64) -> FrameReport {
        let drained = self.bus.drain_queued();
        if drained > 0 {
            log::trace!("Delivered {drained} queued event(s).");
        }
        self.game_loop.frame(now_ms)
    }

    /// Runs frames `step_ms` apart, starting at 0, until `done` returns
    /// `true` or `max_frames` frames ran.
    ///
    /// ## Arguments
    /// * `step_ms` - Timestamp increment between frames.
    /// * `max_frames` - Upper bound on the frames run.
    /// * `done` - Checked after every frame.
    ///
    /// ## Returns
    /// The number of frames run.
    pub fn run_until<F>(&mut self, step_ms: f64, max_frames: u64, mut done: F) -> u64
    where
        F: FnMut(&App) -> bool,
    {
        self.start();
        let mut frames = 0;
        let mut now = 0.0;
        while frames < max_frames {
            self.frame(now);
            frames += 1;
            now += step_ms;
            if done(self) {
                break;
            }
        }
        frames
    }

    /// Like [`run_until`](Self::run_until), paced by a [`FrameClock`] at the
    /// configured target frame rate.
    pub fn run_realtime<F>(&mut self, max_frames: u64, mut done: F) -> u64
    where
        F: FnMut(&App) -> bool,
    {
        let fps = self.config.game_loop.target_fps.max(1);
        let budget = Duration::from_secs_f64(1.0 / f64::from(fps));
        let clock = FrameClock::new();
        self.start();
        let mut frames = 0;
        while frames < max_frames {
            let started = clock.elapsed();
            self.frame(clock.now_ms());
            frames += 1;
            if done(self) {
                break;
            }
            let spent = clock.elapsed().saturating_sub(started);
            if let Some(rest) = budget.checked_sub(spent) {
                std::thread::sleep(rest);
            }
        }
        frames
    }

    /// Destroys every extension in reverse registration order and stops the
    /// loop. Calling it again does nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.game_loop.stop();
        for registered in self.extensions.iter_mut().rev() {
            self.game_loop.unregister(registered.name);
            match registered.extension.try_borrow_mut() {
                Ok(mut extension) => extension.destroy(),
                Err(_) => log::warn!("Extension '{}' is busy during shutdown.", registered.name),
            }
            registered.ctx.teardown();
            registered.enabled.set(false);
            registered.lifecycle = ExtensionState::Destroyed;
        }
        self.policy.teardown();
        log::info!("Tilebot app shut down.");
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use tilebot_core::{EventKind, Mode};

    struct Failing;

    impl Extension for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
            ctx.create_node("leftover", None);
            anyhow::bail!("no luck")
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct Counter {
        updates: u32,
    }

    impl Extension for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn init(&mut self, _ctx: &ExtensionContext) -> anyhow::Result<()> {
            Ok(())
        }

        fn wants_update(&self) -> bool {
            true
        }

        fn update(&mut self, _delta_secs: f64, _now_ms: f64) -> anyhow::Result<()> {
            self.updates += 1;
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
    fn failing_extensions_are_skipped() {
        let app = App::builder()
            .extension(Failing)
            .extension_with("broken factory", |_| anyhow::bail!("cannot build"))
            .extension(Counter::default())
            .build()
            .unwrap();

        assert_eq!(app.extension_names(), ["counter"]);
        assert!(app.surface().is_empty(), "failed init is torn down");
        assert_eq!(app.lifecycle("counter"), Some(ExtensionState::Enabled));
    }

    #[test]
    fn loaded_extensions_wait_initialized_until_enabled() {
        let mut app = App::builder().build().unwrap();
        let loaded = app.load(
            "counter",
            Box::new(|_| Ok(Box::new(Counter::default()) as Box<dyn Extension>)),
        );
        assert!(loaded);
        assert_eq!(app.lifecycle("counter"), Some(ExtensionState::Initialized));
        assert!(!app.disable("counter"));

        app.start();
        app.frame(0.0);
        assert_eq!(app.extension::<Counter>().map(|c| c.updates), Some(0));

        assert!(app.enable("counter"));
        app.frame(16.0);
        assert_eq!(app.lifecycle("counter"), Some(ExtensionState::Enabled));
        assert_eq!(app.extension::<Counter>().map(|c| c.updates), Some(1));
    }

    #[test]
    fn disabled_extensions_skip_updates() {
        let mut app = App::builder()
            .extension(Counter::default())
            .build()
            .unwrap();
        app.start();
        app.frame(0.0);
        assert!(app.disable("counter"));
        app.frame(16.0);
        assert!(!app.disable("counter"));
        assert!(app.enable("counter"));
        app.frame(32.0);

        assert_eq!(app.extension::<Counter>().map(|c| c.updates), Some(2));
    }

    #[test]
    fn shutdown_destroys_in_reverse_and_once() {
        let mut app = App::builder()
            .with_default_extensions()
            .build()
            .unwrap();
        assert!(!app.surface().is_empty());

        app.shutdown();
        app.shutdown();

        assert!(app.surface().is_empty());
        assert_eq!(app.events().len(), 0);
        assert_eq!(app.lifecycle("hero"), Some(ExtensionState::Destroyed));
        assert!(!app.enable("hero"));
    }

    #[test]
    fn queued_events_are_delivered_on_the_next_frame() {
        let mut app = App::builder().build().unwrap();
        app.queue(GameEvent::ModeToggle(Mode::Edit));
        assert_eq!(app.state().mode().unwrap(), Mode::Play);

        app.start();
        app.frame(0.0);
        assert_eq!(app.state().mode().unwrap(), Mode::Edit);
    }

    #[test]
    fn leaving_program_mode_for_the_editor_stops_the_program() {
        let app = App::builder().build().unwrap();
        let stops = Rc::new(Cell::new(0));
        let s = stops.clone();
        let _sub = app.events().on(EventKind::ProgrammingStop, move |_| {
            s.set(s.get() + 1);
            Ok(())
        });

        app.emit(GameEvent::ModeToggle(Mode::Program));
        app.emit(GameEvent::ModeToggle(Mode::Edit));
        app.emit(GameEvent::ModeToggle(Mode::Edit));

        assert_eq!(stops.get(), 1);
        assert_eq!(app.state().mode().unwrap(), Mode::Play);
    }
}

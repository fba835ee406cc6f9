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

//! # Game Loop
//!
//! A single cooperative scheduler driven by frame timestamps. The loop does
//! not own a clock: the host calls [`GameLoop::frame`] with a high resolution
//! timestamp in milliseconds (the display refresh callback in a browser, a
//! [`FrameClock`](crate::FrameClock) in the runtime, a fixed sequence in
//! tests).

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A per-frame callback: `(delta_seconds, timestamp_ms)`.
pub type Updater = Box<dyn FnMut(f64, f64) -> anyhow::Result<()>>;

/// Scheduling state of a [`GameLoop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopStatus {
    /// Frames are ignored.
    #[default]
    Stopped,
    /// Frames run every enabled updater.
    Running,
    /// Frames are ignored until [`GameLoop::resume`].
    Paused,
}

/// Summary of one [`GameLoop::frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Updaters that returned `Ok`.
    pub ran: usize,
    /// Updaters skipped because their owner is disabled.
    pub skipped: usize,
    /// Updaters that returned an error (logged and contained).
    pub failed: usize,
    /// The delta handed to the updaters, after clamping.
    pub delta_secs: f64,
}

struct UpdaterEntry {
    name: String,
    enabled: Option<Rc<Cell<bool>>>,
    updater: Updater,
}

/// The frame scheduler.
pub struct GameLoop {
    updaters: Vec<UpdaterEntry>,
    status: LoopStatus,
    last_timestamp: Option<f64>,
    max_delta_secs: Option<f64>,
    frames: u64,
}

impl GameLoop {
    /// Creates a stopped loop. `max_delta_secs` bounds the delta handed to
    /// updaters; `None` leaves it unclamped.
    pub fn new(max_delta_secs: Option<f64>) -> Self {
        Self {
            updaters: Vec::new(),
            status: LoopStatus::Stopped,
            last_timestamp: None,
            max_delta_secs,
            frames: 0,
        }
    }

    /// Registers an updater that runs on every frame.
    pub fn register<F>(&mut self, name: impl Into<String>, updater: F)
    where
        F: FnMut(f64, f64) -> anyhow::Result<()> + 'static,
    {
        self.push(name.into(), None, Box::new(updater));
    }

    /// Registers an updater that runs only while `enabled` holds `true`.
    ///
    /// ## Arguments
    /// * `name` - Identifies the updater in logs and for `unregister`.
    /// * `enabled` - Flag shared with the owner; read at every frame.
    /// * `updater` - Called with the clamped delta in seconds and the frame
    ///   timestamp in milliseconds.
    pub fn register_gated<F>(&mut self, name: impl Into<String>, enabled: Rc<Cell<bool>>, updater: F)
    where
        F: FnMut(f64, f64) -> anyhow::Result<()> + 'static,
    {
        self.push(name.into(), Some(enabled), Box::new(updater));
    }

    fn push(&mut self, name: String, enabled: Option<Rc<Cell<bool>>>, updater: Updater) {
        log::debug!("Registered updater '{name}'.");
        self.updaters.push(UpdaterEntry {
            name,
            enabled,
            updater,
        });
    }

    /// Removes every updater registered under `name`. Returns how many were
    /// removed.
    pub fn unregister(&mut self, name: &str) -> usize {
        let before = self.updaters.len();
        self.updaters.retain(|entry| entry.name != name);
        before - self.updaters.len()
    }

    /// Starts scheduling frames.
    pub fn start(&mut self) {
        if self.status != LoopStatus::Running {
            log::info!("Game loop started.");
        }
        self.status = LoopStatus::Running;
    }

    /// Stops scheduling. The pending frame is cancelled and the next start
    /// begins with a zero delta.
    pub fn stop(&mut self) {
        if self.status != LoopStatus::Stopped {
            log::info!("Game loop stopped after {} frame(s).", self.frames);
        }
        self.status = LoopStatus::Stopped;
        self.last_timestamp = None;
    }

    /// Suspends a running loop.
    pub fn pause(&mut self) {
        if self.status == LoopStatus::Running {
            self.status = LoopStatus::Paused;
            log::debug!("Game loop paused.");
        }
    }

    /// Resumes a paused loop. The first frame after resuming has a zero
    /// delta.
    pub fn resume(&mut self) {
        if self.status == LoopStatus::Paused {
            self.status = LoopStatus::Running;
            self.last_timestamp = None;
            log::debug!("Game loop resumed.");
        }
    }

    /// Current scheduling state.
    pub fn status(&self) -> LoopStatus {
        self.status
    }

    /// Returns `true` while frames are processed.
    pub fn is_running(&self) -> bool {
        self.status == LoopStatus::Running
    }

    /// Number of frames processed since creation.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Number of registered updaters.
    pub fn len(&self) -> usize {
        self.updaters.len()
    }

    /// Returns `true` when no updater is registered.
    pub fn is_empty(&self) -> bool {
        self.updaters.is_empty()
    }

    /// Processes one frame at `timestamp_ms`.
    ///
    /// Each enabled updater runs once, in registration order. An updater
    /// error is logged and the remaining updaters still run. Does nothing
    /// unless the loop is running.
    ///
    /// ## Returns
    /// The delta used for this frame and the updater counts (ran, skipped
    /// and failed).
    pub fn frame(&mut self, timestamp_ms: f64) -> FrameReport {
        if self.status != LoopStatus::Running {
            return FrameReport::default();
        }

        let raw = match self.last_timestamp {
            Some(last) => ((timestamp_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last_timestamp = Some(timestamp_ms);
        let delta_secs = match self.max_delta_secs {
            Some(max) if raw > max => {
                log::debug!("Clamping frame delta {raw:.3}s to {max:.3}s.");
                max
            }
            _ => raw,
        };

        let mut report = FrameReport {
            delta_secs,
            ..FrameReport::default()
        };
        for entry in &mut self.updaters {
            if entry.enabled.as_ref().is_some_and(|flag| !flag.get()) {
                report.skipped += 1;
                continue;
            }
            match (entry.updater)(delta_secs, timestamp_ms) {
                Ok(()) => report.ran += 1,
                Err(e) => {
                    report.failed += 1;
                    log::error!("Updater '{}' failed: {e:#}", entry.name);
                }
            }
        }
        self.frames += 1;
        log::trace!("Frame {} done: {:?}", self.frames, report);
        report
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new(Some(0.25))
    }
}

impl fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameLoop")
            .field("status", &self.status)
            .field("updaters", &self.updaters.len())
            .field("frames", &self.frames)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recording_loop(max: Option<f64>) -> (GameLoop, Rc<RefCell<Vec<f64>>>) {
        let deltas = Rc::new(RefCell::new(Vec::new()));
        let mut game_loop = GameLoop::new(max);
        let d = deltas.clone();
        game_loop.register("recorder", move |delta, _| {
            d.borrow_mut().push(delta);
            Ok(())
        });
        (game_loop, deltas)
    }

    #[test]
    fn stopped_loop_ignores_frames() {
        let (mut game_loop, deltas) = recording_loop(None);
        assert_eq!(game_loop.frame(16.0), FrameReport::default());
        assert!(deltas.borrow().is_empty());
    }

    #[test]
    fn delta_is_seconds_between_frames() {
        let (mut game_loop, deltas) = recording_loop(None);
        game_loop.start();
        game_loop.frame(1000.0);
        game_loop.frame(1016.0);
        assert_eq!(*deltas.borrow(), vec![0.0, 0.016]);
    }

    #[test]
    fn large_delta_is_clamped() {
        let (mut game_loop, deltas) = recording_loop(Some(0.25));
        game_loop.start();
        game_loop.frame(0.0);
        let report = game_loop.frame(5000.0);
        assert_eq!(report.delta_secs, 0.25);
        assert_eq!(deltas.borrow()[1], 0.25);
    }

    #[test]
    fn resume_restarts_with_zero_delta() {
        let (mut game_loop, deltas) = recording_loop(None);
        game_loop.start();
        game_loop.frame(0.0);
        game_loop.pause();
        assert_eq!(game_loop.frame(100.0).ran, 0);
        game_loop.resume();
        game_loop.frame(9000.0);
        assert_eq!(*deltas.borrow(), vec![0.0, 0.0]);
    }

    #[test]
    fn failing_updater_does_not_abort_frame() {
        let mut game_loop = GameLoop::new(None);
        let order = Rc::new(RefCell::new(Vec::new()));
        game_loop.register("broken", |_, _| anyhow::bail!("exploded"));
        let o = order.clone();
        game_loop.register("healthy", move |_, _| {
            o.borrow_mut().push("healthy");
            Ok(())
        });
        game_loop.start();

        let report = game_loop.frame(0.0);

        assert_eq!(report.failed, 1);
        assert_eq!(report.ran, 1);
        assert_eq!(*order.borrow(), vec!["healthy"]);
        assert!(game_loop.is_running());
    }

    #[test]
    fn gated_updater_is_skipped_while_disabled() {
        let mut game_loop = GameLoop::new(None);
        let enabled = Rc::new(Cell::new(false));
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        game_loop.register_gated("gated", enabled.clone(), move |_, _| {
            h.set(h.get() + 1);
            Ok(())
        });
        game_loop.start();

        assert_eq!(game_loop.frame(0.0).skipped, 1);
        enabled.set(true);
        game_loop.frame(16.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(game_loop.len(), 1, "disabled updaters stay registered");
    }
}

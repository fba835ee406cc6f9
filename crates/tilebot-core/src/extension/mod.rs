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

//! # Extension Abstraction
//!
//! An **Extension** is an independently registered component with an
//! `init` / `update` / `destroy` lifecycle. Extensions never hold references
//! to each other: they talk through [`GameEvent`](crate::GameEvent)s and
//! state paths, using the capabilities handed to them in an
//! [`ExtensionContext`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tilebot_core::{Extension, ExtensionContext, EventKind};
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! impl Extension for Greeter {
//!     fn name(&self) -> &'static str { "greeter" }
//!
//!     fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
//!         ctx.on(EventKind::HeroArrived, |event| {
//!             log::info!("{event:?}");
//!             Ok(())
//!         });
//!         Ok(())
//!     }
//!
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//!     fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
//! }
//! ```

mod context;

pub use self::context::ExtensionContext;

use std::any::Any;
use std::fmt;

/// Lifecycle of a registered extension.
///
/// `Unloaded → Initialized → Enabled ⇄ Disabled → Destroyed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionState {
    /// Instantiated, `init` not called yet.
    Unloaded,
    /// `init` succeeded.
    Initialized,
    /// Receives per-frame updates.
    Enabled,
    /// Skipped by the loop; subscriptions stay in place.
    Disabled,
    /// Torn down.
    Destroyed,
}

impl ExtensionState {
    /// Returns `true` when a transition to `next` is part of the lifecycle.
    pub fn can_transition_to(self, next: ExtensionState) -> bool {
        use ExtensionState::*;
        matches!(
            (self, next),
            (Unloaded, Initialized)
                | (Initialized, Enabled)
                | (Enabled, Disabled)
                | (Disabled, Enabled)
                | (Initialized | Enabled | Disabled, Destroyed)
        )
    }
}

impl fmt::Display for ExtensionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtensionState::Unloaded => "unloaded",
            ExtensionState::Initialized => "initialized",
            ExtensionState::Enabled => "enabled",
            ExtensionState::Disabled => "disabled",
            ExtensionState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// The lifecycle contract of every extension.
pub trait Extension: Any {
    /// Unique, human-readable name used in logs and lookups.
    fn name(&self) -> &'static str;

    /// Wires subscriptions and render nodes. Everything registered through
    /// `ctx` is undone automatically on teardown.
    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()>;

    /// Opts in to per-frame updates. Default is `false`.
    fn wants_update(&self) -> bool {
        false
    }

    /// Per-frame work: `delta_secs` since the previous frame and the frame
    /// timestamp in milliseconds.
    ///
    /// Default is a no-op.
    fn update(&mut self, _delta_secs: f64, _now_ms: f64) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called before the context is torn down.
    ///
    /// Default is a no-op.
    fn destroy(&mut self) {}

    /// Downcast to a concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to a concrete type (mutable).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::ExtensionState::*;

    #[test]
    fn lifecycle_transitions() {
        assert!(Unloaded.can_transition_to(Initialized));
        assert!(Enabled.can_transition_to(Disabled));
        assert!(Disabled.can_transition_to(Enabled));
        assert!(Disabled.can_transition_to(Destroyed));
        assert!(!Unloaded.can_transition_to(Enabled));
        assert!(!Destroyed.can_transition_to(Enabled));
    }
}

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

//! The mode policy: one mode at a time, and the side effects of switching.

use tilebot_core::{EventKind, ExtensionContext, GameEvent, Mode};

/// The mode a `ModeToggle(requested)` leads to. Requesting the current mode
/// toggles back to [`Mode::Play`].
pub fn next_mode(current: Mode, requested: Mode) -> Mode {
    if current == requested {
        Mode::Play
    } else {
        requested
    }
}

/// Wires the mode handlers on the application context.
pub(crate) fn install(ctx: &ExtensionContext) {
    let c = ctx.clone();
    ctx.on(EventKind::ModeToggle, move |event| {
        let GameEvent::ModeToggle(requested) = event else {
            return Ok(());
        };
        let from = c.state().mode()?;
        let to = next_mode(from, *requested);
        if from == to {
            return Ok(());
        }
        c.state().set_mode(to)?;
        log::info!("Mode changed from {from:?} to {to:?}.");
        c.emit(GameEvent::ModeChange { from, to });
        Ok(())
    });

    let c = ctx.clone();
    ctx.on(EventKind::ModeChange, move |event| {
        match event {
            GameEvent::ModeChange {
                from: Mode::Program,
                to: Mode::Edit,
            } => {
                c.emit(GameEvent::ProgrammingStop);
            }
            GameEvent::ModeChange {
                from: Mode::Edit,
                to: Mode::Program,
            } => {
                c.emit(GameEvent::EditorClose);
            }
            _ => {}
        }
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggling_the_current_mode_returns_to_play() {
        assert_eq!(next_mode(Mode::Edit, Mode::Edit), Mode::Play);
        assert_eq!(next_mode(Mode::Play, Mode::Play), Mode::Play);
        assert_eq!(next_mode(Mode::Play, Mode::Program), Mode::Program);
        assert_eq!(next_mode(Mode::Program, Mode::Edit), Mode::Edit);
    }
}

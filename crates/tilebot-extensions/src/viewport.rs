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

//! Camera: zoom, pan and the tracked cell.

use std::any::Any;
use tilebot_core::config::ViewportConfig;
use tilebot_core::state::paths;
use tilebot_core::{CellPos, EventKind, Extension, ExtensionContext, GameEvent, ObservableState};

/// Node role of the camera.
pub const VIEWPORT_ROLE: &str = "viewport";

/// Owns `scale`, `offsetX`, `offsetY` and `activeCell`.
#[derive(Debug, Default)]
pub struct ViewportExtension {
    limits: ViewportConfig,
}

fn zoom(state: &ObservableState, limits: &ViewportConfig, factor: f64) -> anyhow::Result<()> {
    if !factor.is_finite() || factor <= 0.0 {
        log::debug!("Ignoring zoom factor {factor}.");
        return Ok(());
    }
    let current = state.viewport()?.scale;
    let scale = (current * factor).clamp(limits.min_zoom, limits.max_zoom);
    state.set_scale(scale)?;
    Ok(())
}

/// Moves `activeCell` to `(x, y)`, clamped into the map.
fn focus(state: &ObservableState, x: i64, y: i64) -> anyhow::Result<()> {
    let map = state.map_data()?;
    let (x, y) = map.clamp(x, y);
    let cell = CellPos { x, y };
    if state.viewport()?.active_cell != cell {
        state.set_active_cell(cell)?;
    }
    Ok(())
}

impl ViewportExtension {
    /// Creates the extension.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Extension for ViewportExtension {
    fn name(&self) -> &'static str {
        "viewport"
    }

    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        self.limits = ctx.config().viewport.clone();
        let node = ctx.create_node(VIEWPORT_ROLE, None);

        let c = ctx.clone();
        ctx.observe(paths::SCALE, move |value| {
            c.surface().set_attr(node, "scale", value.to_string());
        });

        let limits = self.limits.clone();
        let c = ctx.clone();
        ctx.on(EventKind::ViewportZoom, move |event| match event {
            GameEvent::ViewportZoom { factor } => zoom(c.state(), &limits, *factor),
            _ => Ok(()),
        });

        let c = ctx.clone();
        ctx.on(EventKind::ViewportPan, move |event| {
            if let GameEvent::ViewportPan { dx, dy } = event {
                let view = c.state().viewport()?;
                c.state().set_offset(view.offset_x + dx, view.offset_y + dy)?;
            }
            Ok(())
        });

        let c = ctx.clone();
        ctx.on(EventKind::ViewportFocus, move |event| match event {
            GameEvent::ViewportFocus { x, y } => focus(c.state(), *x, *y),
            _ => Ok(()),
        });

        let c = ctx.clone();
        ctx.on(EventKind::HeroArrived, move |event| match event {
            GameEvent::HeroArrived { x, y } => focus(c.state(), *x, *y),
            _ => Ok(()),
        });

        // A resized or replaced map may leave the tracked cell outside.
        let c = ctx.clone();
        ctx.on(EventKind::MapLoaded, move |_| {
            let cell = c.state().viewport()?.active_cell;
            focus(c.state(), cell.x, cell.y)
        });

        let c = ctx.clone();
        ctx.observe(paths::MAP_GRID, move |_| {
            let refocus = c
                .state()
                .viewport()
                .map_err(anyhow::Error::from)
                .and_then(|view| focus(c.state(), view.active_cell.x, view.active_cell.y));
            if let Err(e) = refocus {
                log::warn!("Cannot keep the active cell inside the map: {e:#}");
            }
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
    use tilebot_core::{ApplicationState, MapData};

    fn state() -> ObservableState {
        let app = ApplicationState {
            map_data: MapData::blank(4, 3),
            ..ApplicationState::default()
        };
        ObservableState::from_application(&app).unwrap()
    }

    #[test]
    fn zoom_is_clamped() {
        let state = state();
        let limits = ViewportConfig::default();
        zoom(&state, &limits, 100.0).unwrap();
        assert_eq!(state.viewport().unwrap().scale, limits.max_zoom);
        zoom(&state, &limits, 0.0001).unwrap();
        assert_eq!(state.viewport().unwrap().scale, limits.min_zoom);
        zoom(&state, &limits, -1.0).unwrap();
        assert_eq!(state.viewport().unwrap().scale, limits.min_zoom);
    }

    #[test]
    fn focus_stays_inside_the_map() {
        let state = state();
        focus(&state, 10, -5).unwrap();
        assert_eq!(state.viewport().unwrap().active_cell, CellPos { x: 3, y: 0 });
    }
}

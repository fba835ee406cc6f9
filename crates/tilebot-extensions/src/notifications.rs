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

//! User-visible alerts: logged, kept in `alerts` and mirrored on a node.

use std::any::Any;
use tilebot_core::{EventKind, Extension, ExtensionContext, GameEvent};

/// Node role of the alert banner.
pub const ALERTS_ROLE: &str = "alerts";

/// Owns `alerts`.
#[derive(Debug, Default)]
pub struct NotificationExtension;

impl NotificationExtension {
    /// Creates the extension.
    pub fn new() -> Self {
        Self
    }
}

impl Extension for NotificationExtension {
    fn name(&self) -> &'static str {
        "notifications"
    }

    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        let node = ctx.create_node(ALERTS_ROLE, None);
        let cap = ctx.config().store.alert_history.max(1);

        let c = ctx.clone();
        ctx.on(EventKind::Alert, move |event| {
            let GameEvent::Alert(message) = event else {
                return Ok(());
            };
            log::warn!("{message}");
            c.state().push_alert(message, cap)?;
            c.surface().set_attr(node, "latest", message.as_str());
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
    use std::rc::Rc;
    use tilebot_core::config::StoreConfig;
    use tilebot_core::{EngineConfig, GameBus, ObservableState, Surface};

    #[test]
    fn alerts_are_capped_and_mirrored() {
        let config = EngineConfig {
            store: StoreConfig {
                alert_history: 2,
                ..StoreConfig::default()
            },
            ..EngineConfig::default()
        };
        let ctx = ExtensionContext::new(
            "notifications",
            ObservableState::new(serde_json::json!({ "alerts": [] })),
            GameBus::new(),
            Surface::new(),
            Rc::new(config),
        );
        NotificationExtension::new().init(&ctx).unwrap();

        for message in ["one", "two", "three"] {
            ctx.emit(GameEvent::Alert(message.to_string()));
        }

        let alerts: Vec<String> = ctx.state().get_as("alerts").unwrap();
        assert_eq!(alerts, ["two", "three"]);
        let banner = &ctx.surface().nodes_with_role(ALERTS_ROLE)[0];
        assert_eq!(banner.attrs.get("latest").map(String::as_str), Some("three"));
    }
}

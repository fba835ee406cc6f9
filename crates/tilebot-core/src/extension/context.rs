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

use crate::config::EngineConfig;
use crate::event::{Delivery, EventKind, GameBus, GameEvent};
use crate::state::ObservableState;
use crate::subscription::Subscription;
use crate::surface::{NodeId, Surface};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
struct Scope {
    subscriptions: Vec<Subscription>,
    nodes: Vec<NodeId>,
}

/// The capabilities handed to one extension.
///
/// Every handler, observer and node created through the context is recorded
/// so that [`teardown`](Self::teardown) can undo all of them. Clones share
/// the same record, which lets handlers capture the context they were
/// registered with.
#[derive(Clone)]
pub struct ExtensionContext {
    owner: &'static str,
    state: ObservableState,
    events: GameBus,
    surface: Surface,
    config: Rc<EngineConfig>,
    scope: Rc<RefCell<Scope>>,
}

impl ExtensionContext {
    /// Creates a context for the extension named `owner`.
    pub fn new(
        owner: &'static str,
        state: ObservableState,
        events: GameBus,
        surface: Surface,
        config: Rc<EngineConfig>,
    ) -> Self {
        Self {
            owner,
            state,
            events,
            surface,
            config,
            scope: Rc::new(RefCell::new(Scope::default())),
        }
    }

    /// Name of the owning extension.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// The shared state tree.
    pub fn state(&self) -> &ObservableState {
        &self.state
    }

    /// The shared event bus.
    pub fn events(&self) -> &GameBus {
        &self.events
    }

    /// The shared render surface.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscribes to an event kind for the lifetime of the extension.
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&GameEvent) -> anyhow::Result<()> + 'static,
    {
        let sub = self.events.on(kind, handler);
        self.scope.borrow_mut().subscriptions.push(sub);
    }

    /// Observes a state path for the lifetime of the extension.
    pub fn observe<F>(&self, path: &str, callback: F)
    where
        F: Fn(&Value) + 'static,
    {
        let sub = self.state.observe(path, callback);
        self.scope.borrow_mut().subscriptions.push(sub);
    }

    /// Emits an event synchronously.
    pub fn emit(&self, event: GameEvent) -> Delivery {
        self.events.emit(event)
    }

    /// Creates a render node owned by the extension.
    pub fn create_node(&self, role: &str, parent: Option<NodeId>) -> NodeId {
        let id = self.surface.create(role, parent);
        self.scope.borrow_mut().nodes.push(id);
        id
    }

    /// Removes a node (and its subtree) before teardown.
    pub fn remove_node(&self, id: NodeId) {
        self.scope.borrow_mut().nodes.retain(|node| *node != id);
        self.surface.remove(id);
    }

    /// Number of live subscriptions recorded by the context.
    pub fn subscription_count(&self) -> usize {
        self.scope.borrow().subscriptions.len()
    }

    /// Number of nodes recorded by the context.
    pub fn node_count(&self) -> usize {
        self.scope.borrow().nodes.len()
    }

    /// Drops every recorded subscription and removes every recorded node.
    pub fn teardown(&self) {
        let Scope {
            subscriptions,
            nodes,
        } = std::mem::take(&mut *self.scope.borrow_mut());
        let (subs, node_count) = (subscriptions.len(), nodes.len());
        drop(subscriptions);
        for id in nodes {
            self.surface.remove(id);
        }
        log::debug!(
            "Tore down '{}': {subs} subscription(s), {node_count} node(s).",
            self.owner
        );
    }
}

impl fmt::Debug for ExtensionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionContext")
            .field("owner", &self.owner)
            .field("subscriptions", &self.subscription_count())
            .field("nodes", &self.node_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn context() -> ExtensionContext {
        ExtensionContext::new(
            "test",
            ObservableState::default(),
            GameBus::new(),
            Surface::new(),
            Rc::new(EngineConfig::default()),
        )
    }

    #[test]
    fn teardown_undoes_everything() {
        let ctx = context();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        ctx.on(EventKind::GridRender, move |_| {
            h.set(h.get() + 1);
            Ok(())
        });
        let h = hits.clone();
        ctx.observe("hero", move |_| h.set(h.get() + 1));
        let node = ctx.create_node("grid", None);
        ctx.surface().create("grid-cell", Some(node));

        ctx.teardown();

        ctx.emit(GameEvent::GridRender);
        ctx.state().set("hero.x", 1).unwrap();
        assert_eq!(hits.get(), 0);
        assert!(ctx.surface().is_empty());
        assert_eq!(ctx.subscription_count(), 0);
    }

    #[test]
    fn clones_share_the_record() {
        let ctx = context();
        let clone = ctx.clone();
        clone.create_node("hero", None);
        assert_eq!(ctx.node_count(), 1);
    }
}

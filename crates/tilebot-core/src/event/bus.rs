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

use crate::subscription::Subscription;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// An event that can travel over an [`EventBus`].
///
/// Every event exposes a `Kind` (the discriminant handlers subscribe to) and a
/// stable wire name used in logs.
pub trait BusEvent: fmt::Debug + 'static {
    /// The subscription key of the event.
    type Kind: Copy + Eq + fmt::Debug + 'static;

    /// Returns the subscription key of this event.
    fn kind(&self) -> Self::Kind;

    /// Returns the wire name of this event, e.g. `"hero:move"`.
    fn name(&self) -> &'static str;
}

/// A registered event handler.
pub type Handler<E> = Rc<dyn Fn(&E) -> anyhow::Result<()>>;

/// Outcome of a single [`EventBus::emit`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned an error (logged and contained).
    pub failed: usize,
}

struct HandlerEntry<E: BusEvent> {
    id: u64,
    /// `None` means the handler receives every event.
    kind: Option<E::Kind>,
    handler: Handler<E>,
}

struct BusInner<E: BusEvent> {
    handlers: RefCell<Vec<HandlerEntry<E>>>,
    next_id: Cell<u64>,
    sender: flume::Sender<E>,
    receiver: flume::Receiver<E>,
}

/// A synchronous publish/subscribe dispatcher.
///
/// The bus is generic over the event type `E` so that this crate stays
/// decoupled from any particular event set. It is a cheap, clonable handle:
/// every clone dispatches to the same handler list.
///
/// [`emit`](Self::emit) runs the matching handlers immediately, in
/// registration order, over a snapshot taken when the emit starts. Events can
/// also be queued through a [`flume`] sender (from another thread, for
/// instance) and delivered later with [`drain_queued`](Self::drain_queued).
pub struct EventBus<E: BusEvent> {
    inner: Rc<BusInner<E>>,
}

impl<E: BusEvent> EventBus<E> {
    /// Creates a new bus with no handlers and an unbounded deferred queue.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus initialized.");
        Self {
            inner: Rc::new(BusInner {
                handlers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                sender,
                receiver,
            }),
        }
    }

    /// Registers `handler` for every event of the given kind.
    ///
    /// ## Arguments
    /// * `kind` - The kind of event the handler listens to.
    /// * `handler` - Called synchronously, in registration order, on each emit.
    ///
    /// ## Returns
    /// A [`Subscription`] that removes the handler when dropped.
    pub fn on<F>(&self, kind: E::Kind, handler: F) -> Subscription
    where
        F: Fn(&E) -> anyhow::Result<()> + 'static,
    {
        self.subscribe(Some(kind), Rc::new(handler))
    }

    /// Registers `handler` for every event, whatever its kind.
    pub fn on_any<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) -> anyhow::Result<()> + 'static,
    {
        self.subscribe(None, Rc::new(handler))
    }

    fn subscribe(&self, kind: Option<E::Kind>, handler: Handler<E>) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .handlers
            .borrow_mut()
            .push(HandlerEntry { id, kind, handler });

        let weak: Weak<BusInner<E>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.handlers.borrow_mut().retain(|entry| entry.id != id);
            }
        })
    }

    /// Dispatches `event` to every handler registered for its kind.
    ///
    /// Handlers registered while the emit is running are not called in this
    /// pass. A handler returning an error is logged and the remaining
    /// handlers still run.
    ///
    /// ## Arguments
    /// * `event` - The event to deliver.
    ///
    /// ## Returns
    /// How many handlers succeeded and how many failed.
    pub fn emit(&self, event: E) -> Delivery {
        let kind = event.kind();
        let snapshot: Vec<Handler<E>> = self
            .inner
            .handlers
            .borrow()
            .iter()
            .filter(|entry| entry.kind.map_or(true, |k| k == kind))
            .map(|entry| entry.handler.clone())
            .collect();

        let mut delivery = Delivery::default();
        if snapshot.is_empty() {
            log::trace!("No handler for '{}'.", event.name());
            return delivery;
        }

        log::trace!("Emitting '{}' to {} handler(s).", event.name(), snapshot.len());
        for handler in snapshot {
            match handler(&event) {
                Ok(()) => delivery.delivered += 1,
                Err(e) => {
                    delivery.failed += 1;
                    log::error!("Handler for '{}' failed: {e:#}", event.name());
                }
            }
        }
        delivery
    }

    /// Queues an event for the next [`drain_queued`](Self::drain_queued).
    pub fn publish(&self, event: E) {
        if let Err(e) = self.inner.sender.send(event) {
            log::error!("Failed to queue event: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a clone of the sender end of the deferred queue.
    /// Use this to feed events from outside the frame, another thread
    /// included.
    ///
    /// ## Returns
    /// A clone of the sender end of the channel.
    pub fn sender(&self) -> flume::Sender<E> {
        self.inner.sender.clone()
    }

    /// Emits every event that was queued before this call, in arrival order.
    ///
    /// Events queued by the handlers themselves wait for the next drain.
    /// Returns the number of events emitted.
    pub fn drain_queued(&self) -> usize {
        let pending = self.inner.receiver.len();
        let mut emitted = 0;
        for _ in 0..pending {
            match self.inner.receiver.try_recv() {
                Ok(event) => {
                    self.emit(event);
                    emitted += 1;
                }
                Err(_) => break,
            }
        }
        emitted
    }

    /// Returns the number of handlers that would receive an event of `kind`.
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.inner
            .handlers
            .borrow()
            .iter()
            .filter(|entry| entry.kind.map_or(true, |k| k == kind))
            .count()
    }

    /// Returns the total number of registered handlers.
    pub fn len(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    /// Returns `true` when no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.handlers.borrow().is_empty()
    }
}

impl<E: BusEvent> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.len())
            .field("queued", &self.inner.receiver.len())
            .finish()
    }
}

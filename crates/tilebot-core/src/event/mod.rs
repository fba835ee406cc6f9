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

//! Provides the synchronous publish/subscribe layer.
//!
//! [`EventBus`] is generic over its event type; [`GameEvent`] is the closed
//! set of events the Tilebot extensions exchange, and [`GameBus`] is the bus
//! specialised for it.

mod bus;
mod game_event;

pub use self::bus::{BusEvent, Delivery, EventBus, Handler};
pub use self::game_event::{EventKind, GameBus, GameEvent, Key};

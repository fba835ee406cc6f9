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

//! Map and homework storage.
//!
//! The [`MapStore`] trait is the storage boundary. Every operation answers
//! with a [`StoreResponse`] envelope (`{success, error?, ...payload}`), the
//! shape the web endpoints returned. [`DirectoryStore`] keeps JSON files on
//! disk, [`MemoryStore`] keeps everything in memory.
//!
//! [`PersistenceExtension`] turns store events into store calls. A failed
//! call raises an `Alert` and leaves the state untouched.

mod directory;
mod memory;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;
use tilebot_core::state::paths;
use tilebot_core::{EventKind, Extension, ExtensionContext, GameEvent, MapData, MapError};

/// Longest accepted map, homework or student name.
pub const MAX_NAME_LEN: usize = 64;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a file failed.
    #[error("storage I/O failed for '{path}': {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A stored document could not be encoded or decoded.
    #[error("malformed stored document: {0}")]
    Json(#[from] serde_json::Error),
    /// A stored map is not a valid map document.
    #[error(transparent)]
    Map(#[from] MapError),
    /// The name cannot be used as a storage key.
    #[error("invalid name '{0}': use 1 to 64 letters, digits, '-' or '_'")]
    InvalidName(String),
    /// Nothing is stored under the name.
    #[error("no {kind} named '{name}'")]
    NotFound {
        /// What was looked up (`map`, `homework`).
        kind: &'static str,
        /// The missing name.
        name: String,
    },
}

/// Checks that `name` is a safe storage key.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

/// A homework assignment: a map and the starting program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Homework {
    /// The map to solve.
    pub map: MapData,
    /// Program text handed to the student.
    pub code: String,
}

/// A student's solution to a homework assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Student identifier.
    pub student: String,
    /// Submitted program text.
    pub code: String,
}

/// The envelope every store operation answers with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreResponse {
    /// The operation succeeded.
    pub success: bool,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Operation-specific fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl StoreResponse {
    /// A successful response with no payload.
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// A failed response.
    pub fn failure(error: &StoreError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            payload: Map::new(),
        }
    }

    /// Wraps `result`, storing the value under `key` on success.
    pub fn from_result<T: Serialize>(key: &str, result: Result<T, StoreError>) -> Self {
        let value = result.and_then(|value| Ok(serde_json::to_value(value)?));
        match value {
            Ok(value) => {
                let mut response = Self::ok();
                response.payload.insert(key.to_string(), value);
                response
            }
            Err(e) => Self::failure(&e),
        }
    }

    /// Wraps a result without payload.
    pub fn from_unit(result: Result<(), StoreError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::failure(&e),
        }
    }

    /// Decodes the payload field `key` of a successful response.
    pub fn take<T: DeserializeOwned>(mut self, key: &str) -> anyhow::Result<T> {
        if !self.success {
            anyhow::bail!(self.error.unwrap_or_else(|| "store request failed".to_string()));
        }
        let value = self
            .payload
            .remove(key)
            .ok_or_else(|| anyhow::anyhow!("store response has no '{key}' field"))?;
        Ok(serde_json::from_value(value)?)
    }

    /// The failure message, if the operation failed.
    pub fn failure_message(&self) -> Option<String> {
        (!self.success).then(|| {
            self.error
                .clone()
                .unwrap_or_else(|| "store request failed".to_string())
        })
    }
}

/// Storage backend for maps, homework and submissions.
pub trait MapStore {
    /// Stores `map` under `name`, replacing any previous one. Payload: none.
    fn save_map(&mut self, name: &str, map: &MapData) -> StoreResponse;
    /// Payload: `map`.
    fn load_map(&self, name: &str) -> StoreResponse;
    /// Payload: `maps`, sorted names.
    fn list_maps(&self) -> StoreResponse;
    /// Stores an assignment under `name`. Payload: none.
    fn save_homework(&mut self, name: &str, homework: &Homework) -> StoreResponse;
    /// Payload: `homework`.
    fn load_homework(&self, name: &str) -> StoreResponse;
    /// Payload: `homework`, sorted names.
    fn list_homework(&self) -> StoreResponse;
    /// Records a solution for an existing assignment. Payload: none.
    fn submit_homework(&mut self, name: &str, submission: &Submission) -> StoreResponse;
}

type SharedStore = Rc<RefCell<Box<dyn MapStore>>>;

/// Owns `store.*`; loads and saves maps and homework through a [`MapStore`].
pub struct PersistenceExtension {
    store: SharedStore,
    last: Rc<RefCell<Option<StoreResponse>>>,
}

impl PersistenceExtension {
    /// Creates the extension over `store`.
    pub fn new(store: impl MapStore + 'static) -> Self {
        let store: Box<dyn MapStore> = Box::new(store);
        Self {
            store: Rc::new(RefCell::new(store)),
            last: Rc::new(RefCell::new(None)),
        }
    }

    /// The response of the most recent store call.
    pub fn last_response(&self) -> Option<StoreResponse> {
        self.last.borrow().clone()
    }
}

/// Replaces the map and tells the other extensions about it.
fn install_map(ctx: &ExtensionContext, map: &MapData, name: &str) -> anyhow::Result<()> {
    ctx.state().set_map_data(map)?;
    log::info!("Loaded map '{name}' ({}x{}).", map.width(), map.height());
    ctx.emit(GameEvent::MapLoaded {
        name: name.to_string(),
    });
    ctx.emit(GameEvent::HeroReset);
    ctx.emit(GameEvent::GridRender);
    Ok(())
}

fn refresh_maps(ctx: &ExtensionContext, store: &SharedStore) -> anyhow::Result<()> {
    let response = store.borrow().list_maps();
    let maps: Vec<String> = response.take("maps")?;
    ctx.state().set(paths::STORE_MAPS, maps)?;
    Ok(())
}

fn refresh_homework(ctx: &ExtensionContext, store: &SharedStore) -> anyhow::Result<()> {
    let response = store.borrow().list_homework();
    let homework: Vec<String> = response.take("homework")?;
    ctx.state().set(paths::STORE_HOMEWORK, homework)?;
    Ok(())
}

impl PersistenceExtension {
    /// Registers a handler that runs `call` against the store and `apply` on
    /// success. Failures become alerts.
    fn handle<C, A>(&self, ctx: &ExtensionContext, kind: EventKind, call: C, apply: A)
    where
        C: Fn(&mut dyn MapStore, &ExtensionContext, &GameEvent) -> anyhow::Result<StoreResponse>
            + 'static,
        A: Fn(&ExtensionContext, &SharedStore, &GameEvent, StoreResponse) -> anyhow::Result<()>
            + 'static,
    {
        let store = self.store.clone();
        let last = self.last.clone();
        let c = ctx.clone();
        ctx.on(kind, move |event| {
            let response = {
                let mut guard = store.borrow_mut();
                call(&mut **guard, &c, event)?
            };
            *last.borrow_mut() = Some(response.clone());
            log::debug!(
                "Store answered '{}' with success={}.",
                kind.name(),
                response.success
            );
            if let Some(message) = response.failure_message() {
                c.emit(GameEvent::Alert(message));
                return Ok(());
            }
            if let Err(e) = apply(&c, &store, event, response) {
                c.emit(GameEvent::Alert(format!("{e:#}")));
            }
            Ok(())
        });
    }
}

fn name_of(event: &GameEvent) -> &str {
    match event {
        GameEvent::MapSave { name }
        | GameEvent::MapLoad { name }
        | GameEvent::HomeworkSave { name }
        | GameEvent::HomeworkLoad { name }
        | GameEvent::HomeworkSubmit { name, .. } => name,
        _ => "",
    }
}

impl Extension for PersistenceExtension {
    fn name(&self) -> &'static str {
        "persistence"
    }

    fn init(&mut self, ctx: &ExtensionContext) -> anyhow::Result<()> {
        let listed = refresh_maps(ctx, &self.store).and_then(|()| refresh_homework(ctx, &self.store));
        if let Err(e) = listed {
            log::warn!("Cannot list stored maps and homework: {e:#}");
        }

        self.handle(
            ctx,
            EventKind::MapSave,
            |store, c, event| Ok(store.save_map(name_of(event), &c.state().map_data()?)),
            |c, store, event, _| {
                log::info!("Saved map '{}'.", name_of(event));
                refresh_maps(c, store)
            },
        );

        self.handle(
            ctx,
            EventKind::MapLoad,
            |store, _, event| Ok(store.load_map(name_of(event))),
            |c, _, event, response| {
                let map: MapData = response.take("map")?;
                install_map(c, &map, name_of(event))
            },
        );

        self.handle(
            ctx,
            EventKind::MapList,
            |store, _, _| Ok(store.list_maps()),
            |c, _, _, response| {
                let maps: Vec<String> = response.take("maps")?;
                c.state().set(paths::STORE_MAPS, maps)?;
                Ok(())
            },
        );

        self.handle(
            ctx,
            EventKind::HomeworkSave,
            |store, c, event| {
                let homework = Homework {
                    map: c.state().map_data()?,
                    code: c.state().program_code()?,
                };
                Ok(store.save_homework(name_of(event), &homework))
            },
            |c, store, event, _| {
                log::info!("Saved homework '{}'.", name_of(event));
                refresh_homework(c, store)
            },
        );

        self.handle(
            ctx,
            EventKind::HomeworkLoad,
            |store, _, event| Ok(store.load_homework(name_of(event))),
            |c, _, event, response| {
                let homework: Homework = response.take("homework")?;
                c.state().set_program_code(&homework.code)?;
                install_map(c, &homework.map, name_of(event))
            },
        );

        self.handle(
            ctx,
            EventKind::HomeworkList,
            |store, _, _| Ok(store.list_homework()),
            |c, _, _, response| {
                let homework: Vec<String> = response.take("homework")?;
                c.state().set(paths::STORE_HOMEWORK, homework)?;
                Ok(())
            },
        );

        self.handle(
            ctx,
            EventKind::HomeworkSubmit,
            |store, c, event| {
                let GameEvent::HomeworkSubmit { name, student } = event else {
                    return Ok(StoreResponse::ok());
                };
                let submission = Submission {
                    student: student.clone(),
                    code: c.state().program_code()?,
                };
                Ok(store.submit_homework(name, &submission))
            },
            |_, _, event, _| {
                if let GameEvent::HomeworkSubmit { name, student } = event {
                    log::info!("Submitted '{student}' solution for '{name}'.");
                }
                Ok(())
            },
        );

        let c = ctx.clone();
        ctx.on(EventKind::MapImport, move |event| {
            let GameEvent::MapImport { json } = event else {
                return Ok(());
            };
            match MapData::from_json(json) {
                Ok(map) => install_map(&c, &map, "import"),
                Err(e) => {
                    c.emit(GameEvent::Alert(format!("Cannot import map: {e}")));
                    Ok(())
                }
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

    #[test]
    fn names_are_restricted() {
        assert!(validate_name("level-1_b").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn response_envelope_flattens_payload() {
        let response = StoreResponse::from_result("maps", Ok(vec!["a", "b"]));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({ "success": true, "maps": ["a", "b"] })
        );

        let failed = StoreResponse::from_result::<()>(
            "map",
            Err(StoreError::NotFound {
                kind: "map",
                name: "x".into(),
            }),
        );
        assert_eq!(failed.failure_message().as_deref(), Some("no map named 'x'"));
        assert!(failed.take::<MapData>("map").is_err());
    }
}

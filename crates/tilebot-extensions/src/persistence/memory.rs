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

use super::{validate_name, Homework, MapStore, StoreError, StoreResponse, Submission};
use std::collections::BTreeMap;
use tilebot_core::MapData;

/// A store that keeps every document in memory. Used by tests and by the
/// headless runtime when no store directory is configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    maps: BTreeMap<String, MapData>,
    homework: BTreeMap<String, Homework>,
    submissions: BTreeMap<String, Vec<Submission>>,
}

fn not_found(kind: &'static str, name: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        name: name.to_string(),
    }
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a map, builder style.
    pub fn with_map(mut self, name: impl Into<String>, map: MapData) -> Self {
        self.maps.insert(name.into(), map);
        self
    }

    /// Solutions submitted for `name`, oldest first.
    pub fn submissions(&self, name: &str) -> &[Submission] {
        self.submissions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl MapStore for MemoryStore {
    fn save_map(&mut self, name: &str, map: &MapData) -> StoreResponse {
        StoreResponse::from_unit(validate_name(name).map(|()| {
            self.maps.insert(name.to_string(), map.clone());
        }))
    }

    fn load_map(&self, name: &str) -> StoreResponse {
        let map = self.maps.get(name).ok_or_else(|| not_found("map", name));
        StoreResponse::from_result("map", map)
    }

    fn list_maps(&self) -> StoreResponse {
        StoreResponse::from_result("maps", Ok(self.maps.keys().collect::<Vec<_>>()))
    }

    fn save_homework(&mut self, name: &str, homework: &Homework) -> StoreResponse {
        StoreResponse::from_unit(validate_name(name).map(|()| {
            self.homework.insert(name.to_string(), homework.clone());
        }))
    }

    fn load_homework(&self, name: &str) -> StoreResponse {
        let homework = self
            .homework
            .get(name)
            .ok_or_else(|| not_found("homework", name));
        StoreResponse::from_result("homework", homework)
    }

    fn list_homework(&self) -> StoreResponse {
        StoreResponse::from_result("homework", Ok(self.homework.keys().collect::<Vec<_>>()))
    }

    fn submit_homework(&mut self, name: &str, submission: &Submission) -> StoreResponse {
        let result = validate_name(&submission.student).and_then(|()| {
            if !self.homework.contains_key(name) {
                return Err(not_found("homework", name));
            }
            self.submissions
                .entry(name.to_string())
                .or_default()
                .push(submission.clone());
            Ok(())
        });
        StoreResponse::from_unit(result)
    }
}

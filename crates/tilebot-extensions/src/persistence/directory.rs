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
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tilebot_core::MapData;

const MAPS_DIR: &str = "maps";
const HOMEWORK_DIR: &str = "homework";
const SUBMISSIONS_DIR: &str = "submissions";

/// A store keeping one pretty-printed JSON file per document under a root
/// directory:
///
/// ```text
/// <root>/maps/<name>.json
/// <root>/homework/<name>.json
/// <root>/submissions/<homework>/<student>.json
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl DirectoryStore {
    /// Creates a store rooted at `root`. Directories are created on first
    /// write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document(&self, dir: &str, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(dir).join(format!("{name}.json")))
    }

    fn write<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).map_err(io_error(path))?;
        log::debug!("Wrote {}.", path.display());
        Ok(())
    }

    fn read_text(&self, path: &Path, kind: &'static str, name: &str) -> Result<String, StoreError> {
        fs::read_to_string(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::NotFound {
                    kind,
                    name: name.to_string(),
                }
            } else {
                io_error(path)(e)
            }
        })
    }

    fn read<T: DeserializeOwned>(
        &self,
        path: &Path,
        kind: &'static str,
        name: &str,
    ) -> Result<T, StoreError> {
        let text = self.read_text(path, kind, name)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sorted names of the `.json` documents in `dir`; a missing directory
    /// lists nothing.
    fn names(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        let path = self.root.join(dir);
        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&path)(e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let file = entry.map_err(io_error(&path))?.path();
            if file.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = file.file_stem().and_then(|stem| stem.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_map(&self, name: &str) -> Result<MapData, StoreError> {
        let path = self.document(MAPS_DIR, name)?;
        let text = self.read_text(&path, "map", name)?;
        Ok(MapData::from_json(&text)?)
    }

    fn write_submission(&self, name: &str, submission: &Submission) -> Result<(), StoreError> {
        validate_name(&submission.student)?;
        let assignment = self.document(HOMEWORK_DIR, name)?;
        if !assignment.is_file() {
            return Err(StoreError::NotFound {
                kind: "homework",
                name: name.to_string(),
            });
        }
        let path = self
            .root
            .join(SUBMISSIONS_DIR)
            .join(name)
            .join(format!("{}.json", submission.student));
        self.write(&path, submission)
    }
}

impl MapStore for DirectoryStore {
    fn save_map(&mut self, name: &str, map: &MapData) -> StoreResponse {
        StoreResponse::from_unit(
            self.document(MAPS_DIR, name)
                .and_then(|path| self.write(&path, map)),
        )
    }

    fn load_map(&self, name: &str) -> StoreResponse {
        StoreResponse::from_result("map", self.read_map(name))
    }

    fn list_maps(&self) -> StoreResponse {
        StoreResponse::from_result("maps", self.names(MAPS_DIR))
    }

    fn save_homework(&mut self, name: &str, homework: &Homework) -> StoreResponse {
        StoreResponse::from_unit(
            self.document(HOMEWORK_DIR, name)
                .and_then(|path| self.write(&path, homework)),
        )
    }

    fn load_homework(&self, name: &str) -> StoreResponse {
        let homework = self
            .document(HOMEWORK_DIR, name)
            .and_then(|path| self.read::<Homework>(&path, "homework", name));
        StoreResponse::from_result("homework", homework)
    }

    fn list_homework(&self) -> StoreResponse {
        StoreResponse::from_result("homework", self.names(HOMEWORK_DIR))
    }

    fn submit_homework(&mut self, name: &str, submission: &Submission) -> StoreResponse {
        StoreResponse::from_unit(self.write_submission(name, submission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn maps_round_trip_through_files() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());
        let map = MapData::blank(2, 1);

        assert!(store.save_map("first", &map).success);
        assert!(dir.path().join("maps/first.json").is_file());

        let loaded: MapData = store.load_map("first").take("map").unwrap();
        assert_eq!(loaded, map);
        let names: Vec<String> = store.list_maps().take("maps").unwrap();
        assert_eq!(names, ["first"]);
    }

    #[test]
    fn missing_and_invalid_names_fail() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());

        let missing = store.load_map("nowhere");
        assert!(!missing.success);
        assert_eq!(missing.error.as_deref(), Some("no map named 'nowhere'"));

        assert!(!store.save_map("../escape", &MapData::blank(1, 1)).success);
        let names: Vec<String> = store.list_maps().take("maps").unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn submissions_need_an_existing_assignment() {
        let dir = tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());
        let submission = Submission {
            student: "ada".into(),
            code: "right".into(),
        };

        assert!(!store.submit_homework("week1", &submission).success);

        let homework = Homework {
            map: MapData::blank(1, 1),
            code: String::new(),
        };
        assert!(store.save_homework("week1", &homework).success);
        assert!(store.submit_homework("week1", &submission).success);
        assert!(dir.path().join("submissions/week1/ada.json").is_file());
    }
}

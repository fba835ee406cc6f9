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

//! Error types of the foundational layer.

use std::path::PathBuf;
use thiserror::Error;

/// An error raised while reading or writing the state tree.
#[derive(Debug, Error)]
pub enum StateError {
    /// Nothing is stored at the requested path.
    #[error("no value at state path '{path}'")]
    Missing {
        /// The requested path.
        path: String,
    },
    /// A numeric segment addressed an array element that does not exist.
    #[error("index {index} out of bounds (len {len}) at state path '{path}'")]
    IndexOutOfBounds {
        /// The path being written.
        path: String,
        /// The offending index.
        index: usize,
        /// The array length.
        len: usize,
    },
    /// A segment addressing an array is not a number.
    #[error("segment '{segment}' of state path '{path}' is not an array index")]
    NotAnIndex {
        /// The path being written.
        path: String,
        /// The offending segment.
        segment: String,
    },
    /// The stored value does not have the expected shape.
    #[error("value at state path '{path}' has an unexpected shape: {source}")]
    Decode {
        /// The requested path.
        path: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// A typed value could not be turned into a JSON value.
    #[error("cannot encode value for state path '{path}': {source}")]
    Encode {
        /// The target path.
        path: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// An error raised while loading an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    Io {
        /// The file path.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration text is not valid.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An error raised while decoding a map document.
#[derive(Debug, Error)]
pub enum MapError {
    /// The text is not a valid map document.
    #[error("malformed map JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The document has no rows.
    #[error("map has no rows")]
    Empty,
}

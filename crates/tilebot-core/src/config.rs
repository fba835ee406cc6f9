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

//! Engine Configuration Module
//!
//! One serde document with a section per subsystem. Every field has a
//! default, so a partial (or empty) JSON file is valid.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Frame loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Upper bound applied to a frame delta, in seconds. `None` disables the
    /// clamp.
    pub max_frame_delta_secs: Option<f64>,
    /// Frames per second targeted by the real-time driver.
    pub target_fps: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_frame_delta_secs: Some(0.25),
            target_fps: 60,
        }
    }
}

/// Hero animation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    /// Duration of a one-cell move, in milliseconds. `0` moves instantly.
    pub move_duration_ms: f64,
    /// Number of frames in a walk cycle.
    pub walk_frames: u32,
    /// Milliseconds per walk frame.
    pub frame_interval_ms: f64,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            move_duration_ms: 250.0,
            walk_frames: 4,
            frame_interval_ms: 80.0,
        }
    }
}

/// Interpreter limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Instructions per second used when the state carries no speed.
    pub default_speed: f64,
    /// Maximum depth of the call stack; deeper calls are ignored.
    pub max_call_stack_depth: usize,
    /// Maximum depth of the data stack; deeper pushes are ignored.
    pub max_data_stack_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            default_speed: 2.0,
            max_call_stack_depth: 64,
            max_data_stack_depth: 256,
        }
    }
}

/// Camera limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Smallest zoom level.
    pub min_zoom: f64,
    /// Largest zoom level.
    pub max_zoom: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.25,
            max_zoom: 4.0,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory of the directory-backed store.
    pub directory: Option<PathBuf>,
    /// Number of alerts kept in state.
    pub alert_history: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: None,
            alert_history: 20,
        }
    }
}

/// The complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frame loop.
    pub game_loop: LoopConfig,
    /// Hero animation.
    pub hero: HeroConfig,
    /// Interpreter limits.
    pub interpreter: InterpreterConfig,
    /// Camera limits.
    pub viewport: ViewportConfig,
    /// Persistence.
    pub store: StoreConfig,
}

impl EngineConfig {
    /// Parses a JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded engine config from '{}'.", path.display());
        Ok(config)
    }
}

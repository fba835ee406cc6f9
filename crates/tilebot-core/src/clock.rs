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

//! A monotonic frame clock, the stand-in for a display refresh timestamp.

use std::time::{Duration, Instant};

/// Monotonic clock reporting high-resolution timestamps since its creation.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
}

impl FrameClock {
    /// Creates a clock whose origin is now.
    #[inline]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Returns the elapsed time since the clock was created.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Returns the current timestamp in milliseconds, with sub-millisecond
    /// precision.
    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SLEEP_DURATION_MS: u64 = 20;

    #[test]
    fn timestamps_are_monotonic() {
        let clock = FrameClock::new();
        let first = clock.now_ms();
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));
        let second = clock.now_ms();
        assert!(
            second - first >= SLEEP_DURATION_MS as f64,
            "Second timestamp ({second}) should be at least {SLEEP_DURATION_MS}ms after the first ({first})"
        );
    }
}

//! Notification timing configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunable timings for the notification state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// How long the "speeding up" animation stays before reverting to the
    /// plain progress message, in milliseconds.
    pub accelerating_ms: u64,
    /// How long a result (complete/failed/pending) stays on screen before
    /// the machine re-evaluates, in milliseconds.
    pub result_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            accelerating_ms: 3000,
            result_ms: 6000,
        }
    }
}

impl NotifyConfig {
    /// Creates a configuration with default timings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the accelerating-animation duration in milliseconds.
    #[must_use]
    pub const fn with_accelerating_ms(mut self, ms: u64) -> Self {
        self.accelerating_ms = ms;
        self
    }

    /// Sets the result-display duration in milliseconds.
    #[must_use]
    pub const fn with_result_ms(mut self, ms: u64) -> Self {
        self.result_ms = ms;
        self
    }

    /// Duration of the accelerating animation.
    #[must_use]
    pub const fn accelerating_duration(&self) -> Duration {
        Duration::from_millis(self.accelerating_ms)
    }

    /// Duration a result stays on screen.
    #[must_use]
    pub const fn result_duration(&self) -> Duration {
        Duration::from_millis(self.result_ms)
    }

    /// Default config file path under the user's config directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dlbar")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults; unknown or absent keys fall
    /// back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

//! Panel settings for VisionPanel.
//!
//! These are the client's own preferences (where the backend lives, how long
//! autosave waits). The inference configuration itself is owned by the
//! backend and never stored here. Settings are persisted as a JSON file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::configuration::DisplayBounds;

// =============================================================================
// Defaults
// =============================================================================

/// Backend address used when none is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Trailing-edge delay between the last control change and the autosave.
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 500;

/// Per-request timeout for backend calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Panel Settings
// =============================================================================

/// Panel settings - persisted to `panel.json` in the config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    /// Base URL of the inference backend (without the `/api` prefix).
    pub backend_url: String,

    /// Timeout applied to every backend request, in seconds.
    pub request_timeout_secs: u64,

    /// Autosave debounce delay, in milliseconds.
    pub autosave_delay_ms: u64,

    /// Display resolution override. When unset the front end detects it.
    pub display: Option<DisplayBounds>,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            display: None,
        }
    }
}

impl PanelSettings {
    /// Default settings file location.
    ///
    /// Returns `~/.config/visionpanel/panel.json` (or platform equivalent).
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("visionpanel").join("panel.json"))
    }

    /// Load settings from the default location, using defaults on any failure.
    pub fn load() -> Self {
        match Self::default_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                tracing::warn!(error = %e, "No config directory, using default panel settings");
                Self::default()
            }
        }
    }

    /// Load settings from a specific file.
    ///
    /// A missing or unparsable file yields defaults; loaded values are validated.
    pub fn load_from(path: &Path) -> Self {
        let mut settings = Self::default();

        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<PanelSettings>(&json) {
                Ok(loaded) => settings = loaded,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse panel settings, using defaults");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No panel settings file yet");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read panel settings, using defaults");
            }
        }

        settings.validate();
        settings
    }

    /// Save settings to the default location.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Save settings to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validate and clamp settings to valid ranges.
    pub fn validate(&mut self) {
        self.autosave_delay_ms = self.autosave_delay_ms.clamp(50, 5000);
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 300);

        let trimmed = self.backend_url.trim().trim_end_matches('/');
        self.backend_url = if trimmed.is_empty() {
            DEFAULT_BACKEND_URL.to_string()
        } else {
            trimmed.to_string()
        };
    }

    /// Autosave delay as a `Duration`.
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Tests
// =============================================================================

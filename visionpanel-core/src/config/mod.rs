//! Configuration module for VisionPanel.
//!
//! Manages the panel's own settings stored as JSON.

mod settings;

pub use settings::{
    PanelSettings, DEFAULT_AUTOSAVE_DELAY_MS, DEFAULT_BACKEND_URL, DEFAULT_REQUEST_TIMEOUT_SECS,
};

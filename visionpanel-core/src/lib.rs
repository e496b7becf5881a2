//! VisionPanel Core Library
//!
//! Settings synchronization and input capture for the VisionPanel control
//! panel of a vision-inference backend. It includes:
//!
//! - The configuration data model and markup defaults
//! - Two-way bound range and toggle controls
//! - Hotkey capture state machine
//! - Model registry view-model (refresh, import, delete)
//! - Debounced autosave scheduling
//! - The settings controller tying it together with the inference lifecycle
//! - The backend gateway trait and its HTTP implementation
//! - Panel settings (backend URL, timeouts, display override)

pub mod binding;
pub mod config;
pub mod configuration;
pub mod controller;
pub mod gateway;
pub mod hotkey;
pub mod models;
pub mod notify;
pub mod scheduler;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use config::PanelSettings;
pub use configuration::{
    Configuration, DisplayBounds, PartialConfiguration, RangeName, ToggleName,
};
pub use controller::{InitState, SettingsController};
pub use gateway::{BackendGateway, GatewayError, HttpGateway};
pub use hotkey::{HotkeyCapture, InterceptFlag, KeyDown, KeyInterceptor, Modifiers};
pub use models::{ModelEntry, ModelMap, ModelRegistry, ModelUpload};
pub use notify::{NotificationSink, NotifyLevel};
pub use scheduler::{Clock, Debouncer, ManualClock, SystemClock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

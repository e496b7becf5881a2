//! UI components for VisionPanel.

pub mod controls;
pub mod models;
pub mod notifications;
pub mod status;

// Theme-aware colors for the UI
pub mod colors {
    use eframe::egui::{Color32, Visuals};
    use visionpanel_core::NotifyLevel;

    /// Primary accent (buttons, selection)
    pub const ACCENT: Color32 = Color32::from_rgb(59, 130, 246); // Blue

    /// Success green, also the "inference running" marker
    pub const SUCCESS: Color32 = Color32::from_rgb(34, 197, 94);

    /// Error red
    pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68);

    /// Info amber
    pub const INFO: Color32 = Color32::from_rgb(245, 158, 11);

    pub fn level(level: NotifyLevel) -> Color32 {
        match level {
            NotifyLevel::Error => ERROR,
            NotifyLevel::Info => INFO,
            NotifyLevel::Success => SUCCESS,
        }
    }

    /// Get toast/card background based on theme
    pub fn panel_bg(visuals: &Visuals) -> Color32 {
        if visuals.dark_mode {
            Color32::from_rgb(40, 40, 45)
        } else {
            Color32::from_rgb(245, 245, 250)
        }
    }

    /// Get muted text color based on theme
    pub fn muted(visuals: &Visuals) -> Color32 {
        if visuals.dark_mode {
            Color32::from_rgb(156, 163, 175)
        } else {
            Color32::from_rgb(100, 100, 110)
        }
    }
}

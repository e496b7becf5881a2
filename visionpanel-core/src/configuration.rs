//! The inference configuration shared with the backend.
//!
//! `Configuration` is the complete snapshot the panel writes; the backend
//! hands back a `PartialConfiguration` on load, where any field may be absent.
//! Field names on the wire are camelCase (`rangeWidth`, `showScope`, ...).

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Display Bounds
// =============================================================================

/// Display resolution, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayBounds {
    pub width: u32,
    pub height: u32,
}

impl DisplayBounds {
    /// Used when the resolution cannot be detected.
    pub const FALLBACK: DisplayBounds = DisplayBounds {
        width: 1920,
        height: 1080,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for DisplayBounds {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Which display dimension bounds a range control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayAxis {
    Width,
    Height,
}

// =============================================================================
// Range Controls
// =============================================================================

/// Static bounds and markup default of one range control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub min: i64,
    /// Upper bound before the display resolution is known.
    pub max: i64,
    pub default: i64,
    /// Set for controls whose upper bound follows the display resolution.
    pub display_axis: Option<DisplayAxis>,
}

impl RangeSpec {
    /// Upper bound once the display resolution is known.
    pub fn max_for(&self, display: DisplayBounds) -> i64 {
        match self.display_axis {
            Some(DisplayAxis::Width) => i64::from(display.width).max(self.min),
            Some(DisplayAxis::Height) => i64::from(display.height).max(self.min),
            None => self.max,
        }
    }
}

/// The declared numeric controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RangeName {
    RangeWidth,
    RangeHeight,
    AimSpeed,
    OffsetX,
    OffsetY,
}

impl RangeName {
    pub const ALL: [RangeName; 5] = [
        Self::RangeWidth,
        Self::RangeHeight,
        Self::AimSpeed,
        Self::OffsetX,
        Self::OffsetY,
    ];

    /// Wire key of this control.
    pub fn key(self) -> &'static str {
        match self {
            Self::RangeWidth => "rangeWidth",
            Self::RangeHeight => "rangeHeight",
            Self::AimSpeed => "aimSpeed",
            Self::OffsetX => "offsetX",
            Self::OffsetY => "offsetY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RangeWidth => "Range width",
            Self::RangeHeight => "Range height",
            Self::AimSpeed => "Tracking speed",
            Self::OffsetX => "Offset X (%)",
            Self::OffsetY => "Offset Y (%)",
        }
    }

    pub fn spec(self) -> RangeSpec {
        match self {
            Self::RangeWidth => RangeSpec {
                min: 1,
                max: 3840,
                default: 320,
                display_axis: Some(DisplayAxis::Width),
            },
            Self::RangeHeight => RangeSpec {
                min: 1,
                max: 2160,
                default: 320,
                display_axis: Some(DisplayAxis::Height),
            },
            Self::AimSpeed => RangeSpec {
                min: 1,
                max: 200,
                default: 100,
                display_axis: None,
            },
            Self::OffsetX => RangeSpec {
                min: 0,
                max: 100,
                default: 50,
                display_axis: None,
            },
            Self::OffsetY => RangeSpec {
                min: 0,
                max: 100,
                default: 30,
                display_axis: None,
            },
        }
    }
}

impl std::fmt::Display for RangeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Toggles
// =============================================================================

/// The declared boolean switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToggleName {
    ShowScope,
    EnableDraw,
}

impl ToggleName {
    pub const ALL: [ToggleName; 2] = [Self::ShowScope, Self::EnableDraw];

    pub fn key(self) -> &'static str {
        match self {
            Self::ShowScope => "showScope",
            Self::EnableDraw => "enableDraw",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ShowScope => "Show scope overlay",
            Self::EnableDraw => "Draw detections",
        }
    }

    /// Markup default.
    pub fn default_value(self) -> bool {
        match self {
            Self::ShowScope => true,
            Self::EnableDraw => false,
        }
    }
}

impl std::fmt::Display for ToggleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Complete configuration snapshot. Every declared field is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub model: String,
    pub hotkey: String,
    pub range_width: i64,
    pub range_height: i64,
    pub aim_speed: i64,
    pub offset_x: i64,
    pub offset_y: i64,
    pub show_scope: bool,
    pub enable_draw: bool,
}

impl Configuration {
    pub fn range(&self, name: RangeName) -> i64 {
        match name {
            RangeName::RangeWidth => self.range_width,
            RangeName::RangeHeight => self.range_height,
            RangeName::AimSpeed => self.aim_speed,
            RangeName::OffsetX => self.offset_x,
            RangeName::OffsetY => self.offset_y,
        }
    }

    pub fn set_range(&mut self, name: RangeName, value: i64) {
        let slot = match name {
            RangeName::RangeWidth => &mut self.range_width,
            RangeName::RangeHeight => &mut self.range_height,
            RangeName::AimSpeed => &mut self.aim_speed,
            RangeName::OffsetX => &mut self.offset_x,
            RangeName::OffsetY => &mut self.offset_y,
        };
        *slot = value;
    }

    pub fn toggle(&self, name: ToggleName) -> bool {
        match name {
            ToggleName::ShowScope => self.show_scope,
            ToggleName::EnableDraw => self.enable_draw,
        }
    }

    pub fn set_toggle(&mut self, name: ToggleName, value: bool) {
        match name {
            ToggleName::ShowScope => self.show_scope = value,
            ToggleName::EnableDraw => self.enable_draw = value,
        }
    }
}

/// Configuration as loaded from the backend. Absent or `null` fields are `None`.
///
/// Range values are accepted as numbers or numeric strings, since older
/// clients persisted the raw text-field contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialConfiguration {
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hotkey: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub range_width: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub range_height: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub aim_speed: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub offset_x: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub offset_y: Option<i64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub show_scope: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub enable_draw: Option<bool>,
}

impl PartialConfiguration {
    pub fn range(&self, name: RangeName) -> Option<i64> {
        match name {
            RangeName::RangeWidth => self.range_width,
            RangeName::RangeHeight => self.range_height,
            RangeName::AimSpeed => self.aim_speed,
            RangeName::OffsetX => self.offset_x,
            RangeName::OffsetY => self.offset_y,
        }
    }

    pub fn toggle(&self, name: ToggleName) -> Option<bool> {
        match name {
            ToggleName::ShowScope => self.show_scope,
            ToggleName::EnableDraw => self.enable_draw,
        }
    }
}

impl From<Configuration> for PartialConfiguration {
    fn from(config: Configuration) -> Self {
        Self {
            model: Some(config.model),
            hotkey: Some(config.hotkey),
            range_width: Some(config.range_width),
            range_height: Some(config.range_height),
            aim_speed: Some(config.aim_speed),
            offset_x: Some(config.offset_x),
            offset_y: Some(config.offset_y),
            show_scope: Some(config.show_scope),
            enable_draw: Some(config.enable_draw),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }))
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Bool(b) => Some(b),
        serde_json::Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Configuration {
        Configuration {
            model: "yolo.onnx".to_string(),
            hotkey: "Ctrl + Alt + X".to_string(),
            range_width: 640,
            range_height: 480,
            aim_speed: 120,
            offset_x: 50,
            offset_y: 25,
            show_scope: true,
            enable_draw: false,
        }
    }

    #[test]
    fn test_configuration_uses_camel_case_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        let obj = json.as_object().unwrap();
        for name in RangeName::ALL {
            assert!(obj.contains_key(name.key()), "missing {}", name.key());
        }
        for name in ToggleName::ALL {
            assert!(obj.contains_key(name.key()), "missing {}", name.key());
        }
        assert_eq!(obj["hotkey"], "Ctrl + Alt + X");
        assert_eq!(obj.len(), 9);
    }

    #[test]
    fn test_partial_configuration_missing_fields_are_none() {
        let partial: PartialConfiguration =
            serde_json::from_str(r#"{"model": "a.pt", "aimSpeed": 80}"#).unwrap();
        assert_eq!(partial.model.as_deref(), Some("a.pt"));
        assert_eq!(partial.aim_speed, Some(80));
        assert!(partial.hotkey.is_none());
        assert!(partial.range_width.is_none());
        assert!(partial.show_scope.is_none());
    }

    #[test]
    fn test_partial_configuration_accepts_string_numbers() {
        let partial: PartialConfiguration = serde_json::from_str(
            r#"{"rangeWidth": "640", "rangeHeight": 480.6, "offsetX": "abc", "offsetY": null, "enableDraw": "true"}"#,
        )
        .unwrap();
        assert_eq!(partial.range_width, Some(640));
        assert_eq!(partial.range_height, Some(481));
        assert_eq!(partial.offset_x, None);
        assert_eq!(partial.offset_y, None);
        assert_eq!(partial.enable_draw, Some(true));
    }

    #[test]
    fn test_partial_configuration_drops_malformed_strings() {
        let partial: PartialConfiguration =
            serde_json::from_str(r#"{"model": 3, "hotkey": ["Ctrl"], "aimSpeed": 80}"#).unwrap();
        assert!(partial.model.is_none());
        assert!(partial.hotkey.is_none());
        assert_eq!(partial.aim_speed, Some(80));
    }

    #[test]
    fn test_partial_configuration_ignores_unknown_keys() {
        let partial: PartialConfiguration =
            serde_json::from_str(r#"{"confidenceThreshold": 0.5, "showScope": false}"#).unwrap();
        assert_eq!(partial.show_scope, Some(false));
    }

    #[test]
    fn test_accessors_cover_every_field() {
        let mut config = sample();
        for (i, name) in RangeName::ALL.into_iter().enumerate() {
            config.set_range(name, i as i64);
        }
        for (i, name) in RangeName::ALL.into_iter().enumerate() {
            assert_eq!(config.range(name), i as i64);
        }
        config.set_toggle(ToggleName::EnableDraw, true);
        assert!(config.toggle(ToggleName::EnableDraw));

        let partial = PartialConfiguration::from(config.clone());
        assert_eq!(partial.range(RangeName::OffsetY), Some(config.offset_y));
        assert_eq!(partial.toggle(ToggleName::EnableDraw), Some(true));
    }

    #[test]
    fn test_range_spec_display_bound() {
        let display = DisplayBounds::new(2560, 1440);
        assert_eq!(RangeName::RangeWidth.spec().max_for(display), 2560);
        assert_eq!(RangeName::RangeHeight.spec().max_for(display), 1440);
        assert_eq!(RangeName::AimSpeed.spec().max_for(display), 200);
    }

    #[test]
    fn test_defaults_within_bounds() {
        for name in RangeName::ALL {
            let spec = name.spec();
            assert!(spec.min <= spec.default && spec.default <= spec.max, "{name}");
            let max = spec.max_for(DisplayBounds::FALLBACK);
            assert!(spec.default <= max, "{name}");
        }
    }
}

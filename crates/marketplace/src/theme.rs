//! Storefront theme settings
//!
//! Display-only configuration decoded from stored JSON with per-field
//! fallback to defaults. The leniency is deliberate and confined to this
//! module: a vendor's broken theme blob renders as the default storefront,
//! while corrupt financial records always surface as errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Product listing layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Tile the products in a grid.
    #[default]
    Grid,
    /// Stack the products in a single column.
    List,
}

/// Visual configuration for a storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSettings {
    /// Name shown in the storefront header.
    pub store_name: String,
    /// Main accent color, CSS hex.
    pub primary_color: String,
    /// Secondary accent color, CSS hex.
    pub secondary_color: String,
    /// Product listing layout.
    pub layout: Layout,
    /// Whether the announcement banner is shown.
    pub show_banner: bool,
    /// Announcement banner contents.
    pub banner_text: String,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            store_name: "My Storefront".to_string(),
            primary_color: "#1a1a2e".to_string(),
            secondary_color: "#e94560".to_string(),
            layout: Layout::Grid,
            show_banner: true,
            banner_text: String::new(),
        }
    }
}

impl ThemeSettings {
    /// Decode settings from a raw JSON blob, falling back per field.
    ///
    /// Never fails: an absent blob, unparsable JSON, a non-object value, or
    /// any missing or mistyped field yields that field's default while the
    /// rest decode normally.
    pub fn from_json_lossy(raw: Option<&str>) -> Self {
        let defaults = Self::default();
        let Some(raw) = raw else {
            return defaults;
        };
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return defaults;
        };
        let Some(map) = value.as_object() else {
            return defaults;
        };
        Self {
            store_name: string_field(map, "store_name", defaults.store_name),
            primary_color: string_field(map, "primary_color", defaults.primary_color),
            secondary_color: string_field(map, "secondary_color", defaults.secondary_color),
            layout: map
                .get("layout")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or(defaults.layout),
            show_banner: map
                .get("show_banner")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.show_banner),
            banner_text: string_field(map, "banner_text", defaults.banner_text),
        }
    }

    /// Serialize the effective settings.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn string_field(map: &serde_json::Map<String, Value>, key: &str, default: String) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or(default)
}

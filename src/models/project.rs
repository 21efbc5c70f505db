//! Project and page data structures.

use crate::constants::DEFAULT_DEVICE_ID;
use crate::models::Widget;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Requested screen orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Wider than tall, native rotation
    #[default]
    Landscape,
    /// Taller than wide
    Portrait,
    /// Landscape rotated by 180°
    LandscapeInverted,
    /// Portrait rotated by 180°
    PortraitInverted,
}

impl Orientation {
    /// All orientations in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Landscape,
        Self::Portrait,
        Self::LandscapeInverted,
        Self::PortraitInverted,
    ];

    /// Returns true for the two portrait variants.
    pub const fn is_portrait(self) -> bool {
        matches!(self, Self::Portrait | Self::PortraitInverted)
    }

    /// Returns true for the two upside-down variants.
    pub const fn is_inverted(self) -> bool {
        matches!(self, Self::LandscapeInverted | Self::PortraitInverted)
    }

    /// Name as written in project files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::LandscapeInverted => "landscape_inverted",
            Self::PortraitInverted => "portrait_inverted",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.as_str() == s.trim())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid orientation '{}'. Must be landscape, portrait, landscape_inverted or portrait_inverted",
                    s
                )
            })
    }
}

/// Rendering mode preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderingMode {
    /// Detect from profile and widgets
    #[default]
    Auto,
    /// Imperative per-frame display lambda
    Direct,
    /// Declarative LVGL toolkit
    Lvgl,
}

impl RenderingMode {
    /// Name as written in project files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Direct => "direct",
            Self::Lvgl => "lvgl",
        }
    }
}

impl fmt::Display for RenderingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(Self::Auto),
            "direct" => Ok(Self::Direct),
            "lvgl" => Ok(Self::Lvgl),
            other => anyhow::bail!(
                "Invalid rendering mode '{}'. Must be auto, direct or lvgl",
                other
            ),
        }
    }
}

/// Pin assignments for a custom board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
#[allow(missing_docs)]
pub struct CustomPins {
    pub sda: Option<String>,
    pub scl: Option<String>,
    pub clk: Option<String>,
    pub mosi: Option<String>,
    pub cs: Option<String>,
    pub dc: Option<String>,
    pub rst: Option<String>,
    pub busy: Option<String>,
    pub backlight: Option<String>,
    pub touch_int: Option<String>,
    pub touch_rst: Option<String>,
}

/// Hardware description used when the device model is "custom".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CustomHardware {
    /// Chip family, defaults to esp32-s3
    pub chip: Option<String>,
    /// ESPHome display platform
    #[serde(alias = "displayDriver")]
    pub display_driver: Option<String>,
    /// Horizontal resolution
    #[serde(alias = "resWidth")]
    pub res_width: Option<u32>,
    /// Vertical resolution
    #[serde(alias = "resHeight")]
    pub res_height: Option<u32>,
    /// "rect" or "round"
    pub shape: Option<String>,
    /// "lcd" or "epaper"
    pub tech: Option<String>,
    /// Touch controller platform, or "none"
    #[serde(alias = "touchTech")]
    pub touch_tech: Option<String>,
    /// Board has PSRAM
    pub psram: bool,
    /// Pin assignments
    pub pins: CustomPins,
}

/// Snapshot of an entity's observed state, supplied with the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EntityState {
    /// Current state value
    pub state: Option<Value>,
    /// Attribute values
    pub attributes: BTreeMap<String, Value>,
}

/// A page of widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Page {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Widgets in paint order
    #[serde(default)]
    pub widgets: Vec<Widget>,
    /// Optional grid layout descriptor (e.g. "4x4")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    /// Page-level dark mode override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<String>,
    /// Refresh strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_type: Option<String>,
    /// Refresh time for scheduled refreshes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_time: Option<String>,
}

impl Page {
    /// Creates an empty page.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Visible widgets that take part in export.
    pub fn exported_widgets(&self) -> impl Iterator<Item = &Widget> {
        self.widgets.iter().filter(|w| !w.hidden && !w.is_group())
    }
}

fn default_device() -> String {
    DEFAULT_DEVICE_ID.to_string()
}

/// A complete screen layout project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project name
    #[serde(default)]
    pub name: String,
    /// Hardware profile id ("custom" synthesizes from `custom_hardware`)
    #[serde(default = "default_device", alias = "deviceModel")]
    pub device_model: String,
    /// Custom hardware fields
    #[serde(
        default,
        alias = "customHardware",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_hardware: Option<CustomHardware>,
    /// Requested orientation
    #[serde(default)]
    pub orientation: Orientation,
    /// Rendering mode preference
    #[serde(default, alias = "renderingMode")]
    pub rendering_mode: RenderingMode,
    /// Page refresh interval in seconds
    #[serde(
        default,
        alias = "refreshInterval",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_interval: Option<u32>,
    /// Deep sleep interval in seconds (e-paper)
    #[serde(
        default,
        alias = "deepSleepInterval",
        skip_serializing_if = "Option::is_none"
    )]
    pub deep_sleep_interval: Option<u32>,
    /// Swap black and white in the display body
    #[serde(default, alias = "invertedColors")]
    pub inverted_colors: bool,
    /// Restore a dimmed backlight on touch (toolkit mode)
    #[serde(default, alias = "wakeOnTouch")]
    pub wake_on_touch: bool,
    /// Pages in display order
    #[serde(default)]
    pub pages: Vec<Page>,
    /// Observed entity states used to classify ambiguous references
    #[serde(
        default,
        alias = "entityStates",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub entity_states: BTreeMap<String, EntityState>,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            name: String::new(),
            device_model: default_device(),
            custom_hardware: None,
            orientation: Orientation::default(),
            rendering_mode: RenderingMode::default(),
            refresh_interval: None,
            deep_sleep_interval: None,
            inverted_colors: false,
            wake_on_touch: false,
            pages: Vec::new(),
            entity_states: BTreeMap::new(),
        }
    }
}

impl Project {
    /// Creates an empty project for the given device.
    pub fn new(name: impl Into<String>, device_model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_model: device_model.into(),
            ..Self::default()
        }
    }

    /// All widgets across all pages, hidden ones included.
    pub fn all_widgets(&self) -> impl Iterator<Item = &Widget> {
        self.pages.iter().flat_map(|p| p.widgets.iter())
    }

    /// Visible widgets across all pages.
    pub fn visible_widgets(&self) -> impl Iterator<Item = &Widget> {
        self.all_widgets().filter(|w| !w.hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_orientation_flags() {
        assert!(!Orientation::Landscape.is_portrait());
        assert!(Orientation::Portrait.is_portrait());
        assert!(Orientation::PortraitInverted.is_portrait());
        assert!(Orientation::PortraitInverted.is_inverted());
        assert!(Orientation::LandscapeInverted.is_inverted());
        assert!(!Orientation::Portrait.is_inverted());
    }

    #[test]
    fn test_orientation_from_str() {
        assert_eq!(
            "landscape_inverted".parse::<Orientation>().unwrap(),
            Orientation::LandscapeInverted
        );
        assert!("sideways".parse::<Orientation>().is_err());
    }

    #[test]
    fn test_project_accepts_camel_case_aliases() {
        let project: Project = serde_json::from_value(json!({
            "deviceModel": "custom",
            "renderingMode": "lvgl",
            "refreshInterval": 30,
            "customHardware": { "resWidth": 320, "resHeight": 240, "tech": "lcd" },
            "pages": [{ "name": "Main", "widgets": [] }]
        }))
        .unwrap();

        assert_eq!(project.device_model, "custom");
        assert_eq!(project.rendering_mode, RenderingMode::Lvgl);
        assert_eq!(project.refresh_interval, Some(30));
        let hw = project.custom_hardware.unwrap();
        assert_eq!(hw.res_width, Some(320));
        assert_eq!(hw.tech.as_deref(), Some("lcd"));
    }

    #[test]
    fn test_project_defaults() {
        let project: Project = serde_json::from_value(json!({})).unwrap();
        assert_eq!(project.device_model, DEFAULT_DEVICE_ID);
        assert_eq!(project.orientation, Orientation::Landscape);
        assert_eq!(project.rendering_mode, RenderingMode::Auto);
        assert!(project.pages.is_empty());
    }

    #[test]
    fn test_exported_widgets_skip_hidden_and_groups() {
        let mut page = Page::new("Main");
        page.widgets.push(Widget::new("a", "text", 0, 0, 10, 10));
        page.widgets.push(Widget::new("b", "group", 0, 0, 10, 10));
        let mut hidden = Widget::new("c", "text", 0, 0, 10, 10);
        hidden.hidden = true;
        page.widgets.push(hidden);

        let ids: Vec<_> = page.exported_widgets().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }
}

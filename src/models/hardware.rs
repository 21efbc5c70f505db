//! Hardware profile data structures.

use serde::{Deserialize, Serialize};

/// Pixel resolution of a panel in its native orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Horizontal pixels
    pub width: u32,
    /// Vertical pixels
    pub height: u32,
}

impl Resolution {
    /// Creates a resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Native orientation is portrait when the panel is taller than wide.
    pub const fn is_portrait(self) -> bool {
        self.height > self.width
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(800, 480)
    }
}

/// Capability flags of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Features {
    /// Board has PSRAM
    pub psram: bool,
    /// Panel is an LCD
    pub lcd: bool,
    /// Panel is e-paper
    pub epaper: bool,
    /// Panel has a touch controller
    pub touch: bool,
    /// Profile renders through LVGL by default
    pub lvgl: bool,
    /// Panel expects inverted black/white
    pub inverted_colors: bool,
    /// Onboard SHT4x temperature/humidity sensor
    pub onboard_sensors: bool,
    /// Battery voltage divider on an ADC pin
    pub battery: bool,
}

/// I²C bus pins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct I2cPins {
    pub sda: String,
    pub scl: String,
}

/// SPI bus pins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SpiPins {
    pub clk: String,
    pub mosi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miso: Option<String>,
}

/// Display control pins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
#[allow(missing_docs)]
pub struct DisplayPins {
    pub cs: Option<String>,
    pub dc: Option<String>,
    pub reset: Option<String>,
    pub busy: Option<String>,
}

/// Board pin map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Pins {
    /// I²C bus
    pub i2c: Option<I2cPins>,
    /// SPI bus
    pub spi: Option<SpiPins>,
    /// Display control lines
    pub display: DisplayPins,
    /// Battery sense ADC pin
    pub battery_adc: Option<String>,
    /// Hardware page buttons (left, right, ...)
    pub buttons: Vec<String>,
}

/// Backlight driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backlight {
    /// Output platform (gpio, ledc)
    pub platform: String,
    /// Backlight pin
    pub pin: String,
}

/// Touch controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchController {
    /// ESPHome touchscreen platform (gt911, cst816, ...)
    pub platform: String,
    /// Interrupt pin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt_pin: Option<String>,
    /// Reset pin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_pin: Option<String>,
}

/// Where a hardware template comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateRef {
    /// Template text already in memory (offline import)
    Inline(String),
    /// File path or URL fetched at compile time
    Location(String),
}

/// Everything the compiler needs to know about a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    /// Catalog id
    pub id: String,
    /// Display name
    pub name: String,
    /// Chip family (esp32, esp32-s3, ...)
    pub chip: String,
    /// ESPHome display platform
    pub display_platform: String,
    /// Optional display model passed to the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_model: Option<String>,
    /// Native resolution
    pub resolution: Resolution,
    /// "rect" or "round"
    #[serde(default = "default_shape")]
    pub shape: String,
    /// Capability flags
    #[serde(default)]
    pub features: Features,
    /// Pin map
    #[serde(default)]
    pub pins: Pins,
    /// Backlight driver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backlight: Option<Backlight>,
    /// Touch controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touch: Option<TouchController>,
    /// Hardware template for package-based profiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateRef>,
    /// Base rotation of the display block for generated documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<u16>,
}

fn default_shape() -> String {
    "rect".to_string()
}

impl HardwareProfile {
    /// Creates a profile with default pins and features.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        chip: impl Into<String>,
        display_platform: impl Into<String>,
        resolution: Resolution,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            chip: chip.into(),
            display_platform: display_platform.into(),
            display_model: None,
            resolution,
            shape: default_shape(),
            features: Features::default(),
            pins: Pins::default(),
            backlight: None,
            touch: None,
            template: None,
            rotation: None,
        }
    }

    /// Returns true for e-paper panels.
    pub const fn is_epaper(&self) -> bool {
        self.features.epaper
    }

    /// LCD unless the profile declares e-paper.
    pub const fn is_lcd(&self) -> bool {
        self.features.lcd || !self.features.epaper
    }

    /// Returns true when the document is spliced into a hardware template.
    pub const fn is_package_based(&self) -> bool {
        self.template.is_some()
    }

    /// Component id of the display.
    pub const fn display_id(&self) -> &'static str {
        if self.features.lcd {
            "my_display"
        } else {
            "epaper_display"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_orientation() {
        assert!(!Resolution::new(800, 480).is_portrait());
        assert!(Resolution::new(480, 800).is_portrait());
        assert!(!Resolution::new(480, 480).is_portrait());
    }

    #[test]
    fn test_display_id_follows_panel_type() {
        let mut profile = HardwareProfile::new("t", "T", "esp32", "st7789v", Resolution::default());
        profile.features.epaper = true;
        assert_eq!(profile.display_id(), "epaper_display");
        assert!(!profile.is_lcd());

        profile.features.epaper = false;
        profile.features.lcd = true;
        assert_eq!(profile.display_id(), "my_display");
        assert!(profile.is_lcd());
    }

    #[test]
    fn test_profile_deserializes_with_defaults() {
        let yaml = "id: x\nname: X\nchip: esp32\ndisplay_platform: ili9xxx\nresolution: {width: 320, height: 240}\n";
        let profile: HardwareProfile = serde_yml::from_str(yaml).unwrap();
        assert_eq!(profile.shape, "rect");
        assert!(!profile.is_package_based());
        assert!(profile.touch.is_none());
    }
}

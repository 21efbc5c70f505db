//! Hardware profiles.
//!
//! The catalog combines the profiles embedded in the binary with hardware
//! recipes discovered on disk. It also resolves the effective profile of a
//! project, synthesizing one from custom hardware fields when the project asks
//! for the `custom` device.

pub mod recipe;
pub mod sections;
pub mod template;

pub use recipe::{load_recipes, parse_recipe};
pub use template::{DefaultTemplateSource, StaticTemplateSource, TemplateSource};

use crate::constants::CUSTOM_DEVICE_ID;
use crate::models::{
    Backlight, CustomHardware, DisplayPins, HardwareProfile, I2cPins, Pins, Project, Resolution,
    SpiPins, TouchController,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Profile id used when a project names a device the catalog does not know.
pub const GENERIC_EPAPER_ID: &str = "generic_epaper";

/// Database schema of the embedded profiles.json.
#[derive(Debug, Deserialize)]
struct ProfileDatabase {
    #[allow(dead_code)]
    version: String,
    profiles: Vec<HardwareProfile>,
}

/// Where a catalog entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    /// Embedded in the binary
    Builtin,
    /// Parsed from a template file on disk
    Recipe,
}

/// A profile together with its origin.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    /// The profile
    #[serde(flatten)]
    pub profile: HardwareProfile,
    /// Origin of the profile
    pub source: ProfileSource,
}

/// Effective profile of a project.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    /// Profile to compile against
    pub profile: HardwareProfile,
    /// False when the requested id was unknown and the generic fallback is used
    pub known: bool,
}

/// Known hardware profiles with O(1) lookup by id.
#[derive(Debug, Clone, Default)]
pub struct HardwareCatalog {
    entries: Vec<CatalogEntry>,
    lookup: HashMap<String, usize>,
}

impl HardwareCatalog {
    /// Creates a catalog without any profile.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the profiles embedded in the binary.
    pub fn load() -> Result<Self> {
        let json_data = include_str!("profiles.json");
        let db: ProfileDatabase =
            serde_json::from_str(json_data).context("Failed to parse embedded profiles.json")?;

        let mut catalog = Self::empty();
        for profile in db.profiles {
            catalog.insert(profile, ProfileSource::Builtin);
        }
        debug!("Loaded {} built-in hardware profiles", catalog.len());
        Ok(catalog)
    }

    /// Adds a profile. Returns false (and keeps the existing one) on an id clash.
    pub fn insert(&mut self, profile: HardwareProfile, source: ProfileSource) -> bool {
        if self.lookup.contains_key(&profile.id) {
            return false;
        }
        self.lookup.insert(profile.id.clone(), self.entries.len());
        self.entries.push(CatalogEntry { profile, source });
        true
    }

    /// Adds every hardware recipe found in `dir`. Returns how many were new.
    pub fn load_recipes_from(&mut self, dir: &Path) -> Result<usize> {
        let mut added = 0;
        for profile in load_recipes(dir)? {
            let id = profile.id.clone();
            if self.insert(profile, ProfileSource::Recipe) {
                added += 1;
            } else {
                debug!("Recipe '{}' shadowed by an existing profile", id);
            }
        }
        info!("Loaded {} hardware recipes from {}", added, dir.display());
        Ok(added)
    }

    /// Looks up a profile by id.
    pub fn get(&self, id: &str) -> Option<&HardwareProfile> {
        self.lookup.get(id).map(|&idx| &self.entries[idx].profile)
    }

    /// Returns true if a profile with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains_key(id)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the catalog holds no profile.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves the profile a project compiles against.
    pub fn resolve(&self, project: &Project) -> ResolvedProfile {
        if project.device_model == CUSTOM_DEVICE_ID {
            let custom = project.custom_hardware.clone().unwrap_or_default();
            return ResolvedProfile {
                profile: synthesize_custom(&custom),
                known: true,
            };
        }

        match self.get(&project.device_model) {
            Some(profile) => ResolvedProfile {
                profile: profile.clone(),
                known: true,
            },
            None => ResolvedProfile {
                profile: generic_epaper(),
                known: false,
            },
        }
    }
}

/// Builds a profile from the custom hardware fields of a project.
///
/// Missing fields default to an ESP32-S3 driving an 800×480 `generic_st7789`.
pub fn synthesize_custom(hw: &CustomHardware) -> HardwareProfile {
    let resolution = Resolution::new(hw.res_width.unwrap_or(800), hw.res_height.unwrap_or(480));
    let mut profile = HardwareProfile::new(
        CUSTOM_DEVICE_ID,
        "Custom Device",
        hw.chip.clone().unwrap_or_else(|| "esp32-s3".to_string()),
        hw.display_driver
            .clone()
            .unwrap_or_else(|| "generic_st7789".to_string()),
        resolution,
    );
    if let Some(shape) = &hw.shape {
        profile.shape.clone_from(shape);
    }

    let tech = hw.tech.as_deref().unwrap_or_default();
    profile.features.lcd = tech == "lcd";
    profile.features.epaper = tech == "epaper";
    profile.features.psram = hw.psram;

    let pins = &hw.pins;
    profile.pins = Pins {
        i2c: match (&pins.sda, &pins.scl) {
            (Some(sda), Some(scl)) => Some(I2cPins {
                sda: sda.clone(),
                scl: scl.clone(),
            }),
            _ => None,
        },
        spi: match (&pins.clk, &pins.mosi) {
            (Some(clk), Some(mosi)) => Some(SpiPins {
                clk: clk.clone(),
                mosi: mosi.clone(),
                miso: None,
            }),
            _ => None,
        },
        display: DisplayPins {
            cs: pins.cs.clone(),
            dc: pins.dc.clone(),
            reset: pins.rst.clone(),
            busy: pins.busy.clone(),
        },
        battery_adc: None,
        buttons: Vec::new(),
    };
    profile.backlight = pins.backlight.as_ref().map(|pin| Backlight {
        platform: "gpio".to_string(),
        pin: pin.clone(),
    });

    if let Some(touch) = hw.touch_tech.as_deref().filter(|t| !t.is_empty() && *t != "none") {
        profile.features.touch = true;
        profile.touch = Some(TouchController {
            platform: touch.to_string(),
            interrupt_pin: pins.touch_int.clone(),
            reset_pin: pins.touch_rst.clone(),
        });
    }

    profile
}

/// Fallback profile for unknown device ids.
pub fn generic_epaper() -> HardwareProfile {
    let mut profile = HardwareProfile::new(
        GENERIC_EPAPER_ID,
        "Generic E-Paper",
        "esp32",
        "waveshare_epaper",
        Resolution::default(),
    );
    profile.display_model = Some("7.50inv2".to_string());
    profile.features.epaper = true;
    profile
}

/// Compact listing row for a catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    /// Profile id
    pub id: String,
    /// Display name
    pub name: String,
    /// Chip family
    pub chip: String,
    /// Display driver platform
    pub display_platform: String,
    /// Native resolution as `WxH`
    pub resolution: String,
    /// Panel shape
    pub shape: String,
    /// E-paper panel
    pub epaper: bool,
    /// Touch input
    pub touch: bool,
    /// Toolkit rendering by default
    pub lvgl: bool,
    /// Compiled through a hardware template
    pub package: bool,
    /// Origin of the profile
    pub source: ProfileSource,
}

impl From<&CatalogEntry> for ProfileSummary {
    fn from(entry: &CatalogEntry) -> Self {
        let p = &entry.profile;
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            chip: p.chip.clone(),
            display_platform: p.display_platform.clone(),
            resolution: format!("{}x{}", p.resolution.width, p.resolution.height),
            shape: p.shape.clone(),
            epaper: p.is_epaper(),
            touch: p.features.touch,
            lvgl: p.features.lvgl,
            package: p.is_package_based(),
            source: entry.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomPins, TemplateRef};

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = HardwareCatalog::load().unwrap();
        assert!(catalog.len() >= 5);

        let e1001 = catalog.get("reterminal_e1001").unwrap();
        assert!(e1001.is_epaper());
        assert_eq!(e1001.pins.buttons.len(), 3);
        assert!(!e1001.is_package_based());

        let lcd = catalog.get("waveshare_esp32_s3_touch_lcd_7").unwrap();
        assert!(lcd.features.lvgl);
        assert!(matches!(lcd.template, Some(TemplateRef::Location(_))));
    }

    #[test]
    fn test_insert_keeps_first_profile() {
        let mut catalog = HardwareCatalog::empty();
        let first = HardwareProfile::new("a", "First", "esp32", "x", Resolution::default());
        let second = HardwareProfile::new("a", "Second", "esp32", "x", Resolution::default());
        assert!(catalog.insert(first, ProfileSource::Builtin));
        assert!(!catalog.insert(second, ProfileSource::Recipe));
        assert_eq!(catalog.get("a").unwrap().name, "First");
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let catalog = HardwareCatalog::load().unwrap();
        let project = Project::new("P", "does_not_exist");
        let resolved = catalog.resolve(&project);
        assert!(!resolved.known);
        assert_eq!(resolved.profile.id, GENERIC_EPAPER_ID);
        assert!(resolved.profile.is_epaper());
    }

    #[test]
    fn test_synthesize_custom_defaults() {
        let profile = synthesize_custom(&CustomHardware::default());
        assert_eq!(profile.chip, "esp32-s3");
        assert_eq!(profile.display_platform, "generic_st7789");
        assert_eq!(profile.resolution, Resolution::new(800, 480));
        assert!(profile.touch.is_none());
        assert!(profile.pins.i2c.is_none());
    }

    #[test]
    fn test_synthesize_custom_pins_and_touch() {
        let hw = CustomHardware {
            chip: Some("esp32".to_string()),
            tech: Some("lcd".to_string()),
            touch_tech: Some("cst816".to_string()),
            res_width: Some(240),
            res_height: Some(320),
            pins: CustomPins {
                sda: Some("GPIO21".to_string()),
                scl: Some("GPIO22".to_string()),
                backlight: Some("GPIO4".to_string()),
                touch_int: Some("GPIO5".to_string()),
                ..CustomPins::default()
            },
            ..CustomHardware::default()
        };
        let profile = synthesize_custom(&hw);
        assert!(profile.features.lcd);
        assert!(profile.features.touch);
        assert_eq!(profile.pins.i2c.unwrap().sda, "GPIO21");
        assert_eq!(profile.backlight.unwrap().platform, "gpio");
        assert_eq!(profile.touch.unwrap().interrupt_pin.as_deref(), Some("GPIO5"));
        assert!(profile.resolution.is_portrait());
    }

    #[test]
    fn test_resolve_custom_without_fields() {
        let catalog = HardwareCatalog::empty();
        let project = Project::new("P", CUSTOM_DEVICE_ID);
        let resolved = catalog.resolve(&project);
        assert!(resolved.known);
        assert_eq!(resolved.profile.id, CUSTOM_DEVICE_ID);
    }
}

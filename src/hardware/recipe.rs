//! Hardware recipe import.
//!
//! A recipe is a device template file whose header comments describe the
//! board:
//!
//! ```yaml
//! # Name: Waveshare Touch LCD 7
//! # Resolution: 800x480
//! # Shape: rect
//! # Inverted: false
//! ```
//!
//! Everything else (PSRAM, touch, panel technology) is inferred from the
//! template body.

use crate::constants::LAMBDA_PLACEHOLDER;
use crate::models::{HardwareProfile, Resolution, TemplateRef, TouchController};
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            PATTERN.get_or_init(|| Regex::new($pattern).expect("valid recipe regex"))
        }
    };
}

static_regex!(name_comment, r"(?im)^\s*#\s*Name:\s*(.+?)\s*$");
static_regex!(resolution_comment, r"(?i)#\s*Resolution:\s*(\d+)x(\d+)");
static_regex!(shape_comment, r"(?i)#\s*Shape:\s*(rect|round)");
static_regex!(inverted_comment, r"(?i)#\s*Inverted:\s*(true|yes|1)\b");
static_regex!(chip_variant, r"(?im)^\s*variant:\s*(esp32[a-z0-9-]*)");
static_regex!(display_platform, r"(?m)^display:\s*\n\s*-\s*platform:\s*([\w-]+)");
static_regex!(touch_platform, r"(?m)^touchscreen:\s*\n\s*-\s*platform:\s*([\w-]+)");

const EPAPER_PLATFORMS: [&str; 2] = ["waveshare_epaper", "epaper_spi"];

/// Profile id for a recipe file name: stem, non-alphanumerics → `_`, lowercased.
pub fn recipe_id(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_lowercase()
}

/// Normalizes an ESPHome chip variant (`ESP32S3` → `esp32-s3`).
fn normalize_chip(variant: &str) -> String {
    let lower = variant.to_lowercase();
    match lower.strip_prefix("esp32") {
        Some(rest) if !rest.is_empty() && !rest.starts_with('-') => format!("esp32-{rest}"),
        _ => lower,
    }
}

/// Extracts a profile from recipe text. The text becomes the inline template.
pub fn parse_recipe(yaml: &str, filename: &str) -> HardwareProfile {
    let id = recipe_id(filename);

    let name = name_comment()
        .captures(yaml)
        .and_then(|c| c.get(1))
        .map_or_else(|| id.clone(), |m| m.as_str().to_string());

    let resolution = resolution_comment()
        .captures(yaml)
        .and_then(|c| {
            let width = c.get(1)?.as_str().parse().ok()?;
            let height = c.get(2)?.as_str().parse().ok()?;
            Some(Resolution::new(width, height))
        })
        .unwrap_or_default();

    let chip = chip_variant()
        .captures(yaml)
        .and_then(|c| c.get(1))
        .map_or_else(|| "esp32-s3".to_string(), |m| normalize_chip(m.as_str()));

    let platform = display_platform()
        .captures(yaml)
        .and_then(|c| c.get(1))
        .map_or("unknown", |m| m.as_str())
        .to_string();

    let mut profile = HardwareProfile::new(id, name, chip, platform, resolution);
    if let Some(shape) = shape_comment().captures(yaml).and_then(|c| c.get(1)) {
        profile.shape = shape.as_str().to_lowercase();
    }

    let epaper = EPAPER_PLATFORMS.iter().any(|p| yaml.contains(p));
    profile.features.epaper = epaper;
    profile.features.lcd = !epaper;
    profile.features.lvgl = yaml.contains("lvgl:") || !epaper;
    profile.features.psram = yaml.contains("psram:");
    profile.features.touch = yaml.contains("touchscreen:");
    profile.features.inverted_colors = inverted_comment().is_match(yaml);

    if profile.features.touch {
        let platform = touch_platform()
            .captures(yaml)
            .and_then(|c| c.get(1))
            .map_or("unknown", |m| m.as_str());
        profile.touch = Some(TouchController {
            platform: platform.to_string(),
            interrupt_pin: None,
            reset_pin: None,
        });
    }

    profile.template = Some(TemplateRef::Inline(yaml.to_string()));
    profile
}

/// Parses every `*.yaml` / `*.yml` recipe in a directory, sorted by file name.
///
/// Loaded profiles reference their file by path so the template is read again
/// at compile time. Files without a display body marker or toolkit section are
/// skipped.
pub fn load_recipes(dir: &Path) -> Result<Vec<HardwareProfile>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to read hardware directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if path.is_file() && is_yaml {
            paths.push(path);
        }
    }
    paths.sort();

    let mut profiles = Vec::new();
    for path in paths {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read recipe {}", path.display()))?;
        if !text.contains(LAMBDA_PLACEHOLDER) && !text.contains("lvgl:") {
            warn!(
                "Skipping {}: no display body marker or lvgl section",
                path.display()
            );
            continue;
        }
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let mut profile = parse_recipe(&text, &filename);
        profile.template = Some(TemplateRef::Location(path.display().to_string()));
        debug!("Recipe {} → profile '{}'", filename, profile.id);
        profiles.push(profile);
    }
    Ok(profiles)
}

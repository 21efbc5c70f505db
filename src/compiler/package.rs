//! Hardware template assembly.
//!
//! A package-based profile ships an opaque template containing placeholder
//! markers. The template is never parsed: this module splices the generated
//! display body into it, rewrites orientation dependent fields with targeted
//! regex rewrites, comments out document-scope sections and finally merges the
//! generated sections into the template's own.

use crate::constants::{LAMBDA_PLACEHOLDER, TOUCH_SENSORS_PLACEHOLDER};
use crate::models::{HardwareProfile, Orientation, Resolution};
use regex::{NoExpand, Regex};
use std::sync::OnceLock;

/// Top-level sections whose list items are merged instead of duplicated.
pub const MERGEABLE_SECTIONS: [&str; 26] = [
    "sensor",
    "binary_sensor",
    "text_sensor",
    "font",
    "image",
    "output",
    "light",
    "switch",
    "button",
    "script",
    "globals",
    "i2c",
    "spi",
    "external_components",
    "time",
    "interval",
    "fan",
    "cover",
    "climate",
    "number",
    "select",
    "datetime",
    "lock",
    "alarm_control_panel",
    "siren",
    "media_player",
];

/// Template sections that belong to the user's own device document.
pub const SYSTEM_SECTIONS: [&str; 13] = [
    "esphome:",
    "esp32:",
    "psram:",
    "wifi:",
    "api:",
    "ota:",
    "logger:",
    "web_server:",
    "captive_portal:",
    "platformio_options:",
    "preferences:",
    "substitutions:",
    "deep_sleep:",
];

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static PATTERN: OnceLock<Regex> = OnceLock::new();
            PATTERN.get_or_init(|| Regex::new($pattern).expect("valid template regex"))
        }
    };
}

static_regex!(lambda_marker, r"(?m)^([ \t]*)# __LAMBDA_PLACEHOLDER__[ \t]*$");
static_regex!(lambda_header, r"lambda:\s*\|-\s*[\r\n]+\s*# __LAMBDA_PLACEHOLDER__");
static_regex!(touch_marker, r"(?m)^([ \t]*)# __TOUCH_SENSORS_PLACEHOLDER__[ \t]*$");
static_regex!(auto_clear, r"auto_clear_enabled:\s*true");
static_regex!(base_rotation_field, r"display:(?s:.)*?rotation:\s*(\d+)");
static_regex!(rotation_field, r"(display:(?s:.)*?rotation:\s*)\d+");
static_regex!(touchscreen_id, r"(?m)^([ \t]*)id:\s*my_touchscreen[^\n]*");
static_regex!(touchscreen_header, r"(?m)^touchscreen:");
static_regex!(top_level_key, r"(?m)^\w");
static_regex!(section_header, r"^([a-z0-9_]+):(\s*#.*)?$");

/// Everything [`apply_overrides`] needs to know about the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideDirectives {
    /// Declared panel resolution of the profile
    pub resolution: Resolution,
    /// Requested orientation
    pub orientation: Orientation,
    /// Toolkit mode owns rendering
    pub toolkit_mode: bool,
    /// Inject the touch wakeup trigger (toolkit mode only)
    pub wake_on_touch: bool,
}

impl OverrideDirectives {
    /// Directives for a profile and orientation.
    pub fn new(profile: &HardwareProfile, orientation: Orientation, toolkit_mode: bool) -> Self {
        Self {
            resolution: profile.resolution,
            orientation,
            toolkit_mode,
            wake_on_touch: false,
        }
    }

    /// Enables the wake-on-touch trigger.
    #[must_use]
    pub const fn with_wake_on_touch(mut self, enabled: bool) -> Self {
        self.wake_on_touch = enabled;
        self
    }
}

/// Final rotation for a requested orientation.
///
/// +90 when portrait-ness differs from the native panel, +180 when inverted,
/// added to the template's own base rotation.
pub fn compute_rotation(native: Resolution, orientation: Orientation, base: u16) -> u16 {
    let mut offset = 0;
    if native.is_portrait() != orientation.is_portrait() {
        offset += 90;
    }
    if orientation.is_inverted() {
        offset += 180;
    }
    (base + offset) % 360
}

/// Rotation declared under the first `display:` of a template (0 if none).
pub fn base_rotation(template: &str) -> u16 {
    base_rotation_field()
        .captures(template)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
        .map_or(0, |r| r % 360)
}

/// Touch axis flags `(swap_xy, mirror_x, mirror_y)` for a rotation.
pub const fn touch_transform(rotation: u16) -> Option<(bool, bool, bool)> {
    match rotation {
        0 => Some((false, false, false)),
        90 => Some((true, false, true)),
        180 => Some((false, true, true)),
        270 => Some((true, true, false)),
        _ => None,
    }
}

fn transform_block(indent: &str, rotation: u16) -> Option<String> {
    let (swap, mx, my) = touch_transform(rotation)?;
    Some(format!(
        "{indent}transform:\n{indent}  swap_xy: {swap}\n{indent}  mirror_x: {mx}\n{indent}  mirror_y: {my}"
    ))
}

/// Applies the orientation and mode rewrites to template text.
pub fn apply_overrides(template: &str, directives: &OverrideDirectives) -> String {
    let mut yaml = template.to_string();

    if directives.toolkit_mode {
        yaml = auto_clear()
            .replace_all(&yaml, "auto_clear_enabled: false")
            .into_owned();
    }

    let base = base_rotation(&yaml);
    let rotation = compute_rotation(directives.resolution, directives.orientation, base);
    tracing::debug!(
        "Orientation {}: base rotation {}, final {}",
        directives.orientation,
        base,
        rotation
    );
    yaml = rotation_field()
        .replace_all(&yaml, format!("${{1}}{rotation}").as_str())
        .into_owned();

    let Some(caps) = touchscreen_id().captures(&yaml) else {
        return yaml;
    };
    let indent = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let id_line = caps.get(0).map_or("", |m| m.as_str()).to_string();

    if let Some(block) = transform_block(&indent, rotation) {
        yaml = replace_transform(&yaml, &indent, &id_line, &block);
    }

    if directives.toolkit_mode && directives.wake_on_touch && !yaml.contains("on_release:") {
        yaml = inject_wakeup(&yaml, &indent);
    }

    yaml
}

fn replace_transform(yaml: &str, indent: &str, id_line: &str, block: &str) -> String {
    let escaped = regex::escape(indent);
    let existing = Regex::new(&format!("(?m)^{escaped}transform:"));
    let has_transform = existing.map(|re| re.is_match(yaml)).unwrap_or(false);

    if has_transform {
        // only the three transform keys are consumed, never sibling blocks
        let old = Regex::new(&format!(
            r"(?m)^{escaped}transform:\n(?:{escaped}  (?:swap_xy|mirror_x|mirror_y):.*\n?)+"
        ));
        match old {
            Ok(re) if re.is_match(yaml) => re
                .replace(yaml, NoExpand(&format!("{block}\n")))
                .into_owned(),
            _ => yaml.to_string(),
        }
    } else {
        yaml.replacen(id_line, &format!("{id_line}\n{block}"), 1)
    }
}

fn inject_wakeup(yaml: &str, indent: &str) -> String {
    let trigger = [
        format!("{indent}on_release:"),
        format!("{indent}  - if:"),
        format!("{indent}      condition: lvgl.is_paused"),
        format!("{indent}      then:"),
        format!("{indent}        - lvgl.resume:"),
        format!("{indent}        - lvgl.widget.redraw:"),
        format!("{indent}        - light.turn_on: display_backlight"),
    ]
    .join("\n");

    let Some(start) = touchscreen_header().find(yaml).map(|m| m.end()) else {
        return yaml.to_string();
    };
    match top_level_key().find(&yaml[start..]) {
        Some(next) => {
            let at = start + next.start();
            format!("{}{trigger}\n\n{}", &yaml[..at], &yaml[at..])
        }
        None => format!("{}\n{trigger}\n", yaml.trim_end()),
    }
}

/// Replaces the two placeholder markers.
///
/// The body marker becomes `lambda: |-` plus the body indented two spaces past
/// the marker (no header when the template already has one right above it).
/// In toolkit mode the marker is removed. The touch marker is replaced with the
/// fragments verbatim, or removed when there are none.
pub fn substitute_placeholders(
    template: &str,
    body: &[String],
    touch_fragments: &[String],
    toolkit_mode: bool,
) -> String {
    let mut text = template.to_string();

    if let Some(caps) = lambda_marker().captures(&text) {
        let indent = caps.get(1).map_or("", |m| m.as_str()).to_string();
        let replacement = if toolkit_mode {
            String::new()
        } else {
            let mut out = Vec::with_capacity(body.len() + 1);
            if !lambda_header().is_match(&text) {
                out.push(format!("{indent}lambda: |-"));
            }
            out.extend(body.iter().map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    format!("{indent}  {line}")
                }
            }));
            out.join("\n")
        };
        text = lambda_marker()
            .replacen(&text, 1, NoExpand(&replacement))
            .into_owned();
    }

    let fragments: Vec<&str> = touch_fragments
        .iter()
        .map(String::as_str)
        .filter(|l| !l.trim().is_empty())
        .collect();
    text = touch_marker()
        .replacen(&text, 1, NoExpand(&fragments.join("\n")))
        .into_owned();

    text
}

/// Comments out document-scope template sections.
pub fn sanitize_template(yaml: &str) -> String {
    let mut out = Vec::new();
    let mut in_system = false;

    for line in yaml.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push(line.to_string());
            continue;
        }
        let top_level = !line.starts_with(|c: char| c.is_whitespace());
        if top_level && trimmed.ends_with(':') {
            in_system = SYSTEM_SECTIONS.iter().any(|k| trimmed.starts_with(k));
            if in_system {
                out.push(format!("# {line} # (Auto-commented)"));
            } else {
                out.push(line.to_string());
            }
        } else if in_system {
            out.push(format!("# {line}"));
        } else {
            out.push(line.to_string());
        }
    }
    out.join("\n")
}

fn header_name(line: &str) -> Option<String> {
    if line.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    section_header()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Default)]
struct SplitDocument {
    sections: Vec<(String, Vec<String>)>,
    other: Vec<String>,
}

impl SplitDocument {
    fn parse(yaml: &str) -> Self {
        let mut doc = Self::default();
        let mut current: Option<usize> = None;

        for line in yaml.split('\n') {
            match header_name(line) {
                Some(name) if MERGEABLE_SECTIONS.contains(&name.as_str()) => {
                    let idx = match doc.sections.iter().position(|(n, _)| *n == name) {
                        Some(idx) => idx,
                        None => {
                            doc.sections.push((name, Vec::new()));
                            doc.sections.len() - 1
                        }
                    };
                    current = Some(idx);
                }
                Some(_) => {
                    current = None;
                    doc.other.push(line.to_string());
                }
                None => match current {
                    Some(idx) => doc.sections[idx].1.push(line.to_string()),
                    None => doc.other.push(line.to_string()),
                },
            }
        }
        doc
    }
}

/// Merges generated text into template text without duplicating headers.
///
/// Output: template non-section lines, merged mergeable sections (template
/// order first), then the generated non-section lines minus blanks and
/// top-level comments. A generated section whose header the template already
/// has is nested under the template's header instead.
pub fn merge_sections(base: &str, extra: &str) -> String {
    if extra.trim().is_empty() {
        return base.to_string();
    }
    if base.trim().is_empty() {
        return extra.to_string();
    }

    let base_doc = SplitDocument::parse(base);
    let extra_doc = SplitDocument::parse(extra);

    let mut merged = base_doc.sections.clone();
    for (name, content) in extra_doc.sections {
        match merged.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => existing.extend(content),
            None => merged.push((name, content)),
        }
    }

    let base_headers: Vec<String> = base_doc.other.iter().filter_map(|l| header_name(l)).collect();
    let mut owned: Vec<(String, Vec<String>)> = Vec::new();
    let mut passthrough = Vec::new();
    let mut target: Option<usize> = None;
    for line in extra_doc.other {
        if let Some(header) = header_name(&line) {
            target = None;
            if base_headers.contains(&header) {
                let idx = match owned.iter().position(|(n, _)| *n == header) {
                    Some(idx) => idx,
                    None => {
                        owned.push((header, Vec::new()));
                        owned.len() - 1
                    }
                };
                target = Some(idx);
                continue;
            }
        }
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        match target {
            Some(idx) => owned[idx].1.push(line),
            None => passthrough.push(line),
        }
    }

    let mut result: Vec<String> = Vec::new();
    let mut open: Option<String> = None;
    for line in base_doc.other {
        if let Some(header) = header_name(&line) {
            append_owned(&mut result, open.take(), &mut owned);
            open = Some(header);
        }
        result.push(line);
    }
    append_owned(&mut result, open, &mut owned);

    for (name, content) in merged {
        if result.last().is_some_and(|l| !l.trim().is_empty()) {
            result.push(String::new());
        }
        result.push(format!("{name}:"));
        result.extend(content);
    }
    result.extend(passthrough);

    result
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Appends the generated body owned by `header` after the last non-blank line
/// of the template section that was just closed.
fn append_owned(
    result: &mut Vec<String>,
    header: Option<String>,
    owned: &mut Vec<(String, Vec<String>)>,
) {
    let Some(header) = header else {
        return;
    };
    let Some(pos) = owned.iter().position(|(n, _)| *n == header) else {
        return;
    };
    let (_, body) = owned.remove(pos);
    let at = result
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(result.len(), |i| i + 1);
    result.splice(at..at, body);
}

/// Splices generated output into a hardware template.
#[derive(Debug, Clone)]
pub struct PackageProcessor {
    directives: OverrideDirectives,
}

impl PackageProcessor {
    /// Creates a processor for the given target.
    pub const fn new(directives: OverrideDirectives) -> Self {
        Self { directives }
    }

    /// Assembles the final document.
    ///
    /// `body` is the display lambda body, `touch_fragments` are pre-indented
    /// binary sensor lines and `generated` is the rendered generated document
    /// without its `display:` section.
    pub fn apply(
        &self,
        template: &str,
        body: &[String],
        touch_fragments: &[String],
        generated: &str,
    ) -> String {
        let text = substitute_placeholders(
            template,
            body,
            touch_fragments,
            self.directives.toolkit_mode,
        );
        let text = apply_overrides(&text, &self.directives);
        let text = sanitize_template(&text);
        merge_sections(&text, generated)
    }
}

/// Returns true if the template text still carries a marker.
pub fn has_placeholders(template: &str) -> bool {
    template.contains(LAMBDA_PLACEHOLDER) || template.contains(TOUCH_SENSORS_PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landscape() -> Resolution {
        Resolution {
            width: 800,
            height: 480,
        }
    }

    fn directives(orientation: Orientation) -> OverrideDirectives {
        OverrideDirectives {
            resolution: landscape(),
            orientation,
            toolkit_mode: false,
            wake_on_touch: false,
        }
    }

    const TEMPLATE: &str = "display:\n  - platform: waveshare_epaper\n    id: epaper_display\n    rotation: 0\n    # __LAMBDA_PLACEHOLDER__\n";

    #[test]
    fn test_rotation_table() {
        let native = landscape();
        assert_eq!(compute_rotation(native, Orientation::Landscape, 0), 0);
        assert_eq!(compute_rotation(native, Orientation::Portrait, 0), 90);
        assert_eq!(compute_rotation(native, Orientation::LandscapeInverted, 0), 180);
        assert_eq!(compute_rotation(native, Orientation::PortraitInverted, 0), 270);
    }

    #[test]
    fn test_rotation_respects_native_portrait_and_base() {
        let native = Resolution {
            width: 480,
            height: 800,
        };
        assert_eq!(compute_rotation(native, Orientation::Portrait, 0), 0);
        assert_eq!(compute_rotation(native, Orientation::Landscape, 180), 270);
        assert_eq!(compute_rotation(native, Orientation::PortraitInverted, 270), 90);
    }

    #[test]
    fn test_apply_overrides_rewrites_rotation_only() {
        let template = "display:\n  - platform: st7701s\n    rotation: 0\n    dimensions:\n      width: 800\n      height: 480\n";
        let out = apply_overrides(template, &directives(Orientation::Portrait));
        assert!(out.contains("rotation: 90"));
        assert!(out.contains("width: 800"));
        assert!(out.contains("height: 480"));
    }

    #[test]
    fn test_base_rotation_read_from_template() {
        let template = "display:\n  - platform: qspi_dbi\n    rotation: 180\n";
        assert_eq!(base_rotation(template), 180);
        let out = apply_overrides(template, &directives(Orientation::LandscapeInverted));
        assert!(out.contains("rotation: 0"));
    }

    #[test]
    fn test_touch_transform_injected_after_id() {
        let template = "display:\n  - rotation: 0\ntouchscreen:\n  - platform: gt911\n    id: my_touchscreen\n    interrupt_pin: GPIO3\n";
        let out = apply_overrides(template, &directives(Orientation::Portrait));
        assert!(out.contains(
            "    id: my_touchscreen\n    transform:\n      swap_xy: true\n      mirror_x: false\n      mirror_y: true\n    interrupt_pin: GPIO3"
        ));
    }

    #[test]
    fn test_touch_transform_replaces_existing_but_keeps_siblings() {
        let template = "display:\n  - rotation: 0\ntouchscreen:\n  - platform: gt911\n    id: my_touchscreen\n    transform:\n      swap_xy: false\n      mirror_x: false\n      mirror_y: false\n    on_release:\n      - logger.log: released\n";
        let out = apply_overrides(template, &directives(Orientation::LandscapeInverted));
        assert_eq!(out.matches("transform:").count(), 1);
        assert!(out.contains(
            "      swap_xy: false\n      mirror_x: true\n      mirror_y: true\n    on_release:"
        ));
        assert!(out.contains("- logger.log: released"));
    }

    #[test]
    fn test_toolkit_mode_disables_auto_clear_and_wakes_on_touch() {
        let template = "display:\n  - rotation: 0\n    auto_clear_enabled: true\ntouchscreen:\n  - platform: gt911\n    id: my_touchscreen\nlight:\n  - platform: monochromatic\n";
        let mut d = directives(Orientation::Landscape).with_wake_on_touch(true);
        d.toolkit_mode = true;
        let out = apply_overrides(template, &d);

        assert!(out.contains("auto_clear_enabled: false"));
        assert!(out.contains("    on_release:\n      - if:\n          condition: lvgl.is_paused"));
        let release = out.find("on_release:").unwrap();
        assert!(release < out.find("light:").unwrap());
    }

    #[test]
    fn test_lambda_placeholder_indentation() {
        let body = vec![
            "it.fill(COLOR_WHITE);".to_string(),
            String::new(),
            "  nested();".to_string(),
        ];
        let out = substitute_placeholders(TEMPLATE, &body, &[], false);
        assert!(out.contains(
            "    lambda: |-\n      it.fill(COLOR_WHITE);\n\n        nested();"
        ));
        assert!(!out.contains(LAMBDA_PLACEHOLDER));
    }

    #[test]
    fn test_lambda_placeholder_with_existing_header() {
        let template = "display:\n  - id: d\n    lambda: |-\n      # __LAMBDA_PLACEHOLDER__\n";
        let body = vec!["it.print(0, 0, \"$x\");".to_string()];
        let out = substitute_placeholders(template, &body, &[], false);
        assert_eq!(out.matches("lambda: |-").count(), 1);
        assert!(out.contains("      it.print(0, 0, \"$x\");"));
    }

    #[test]
    fn test_lambda_placeholder_removed_in_toolkit_mode() {
        let body = vec!["it.fill(COLOR_WHITE);".to_string()];
        let out = substitute_placeholders(TEMPLATE, &body, &[], true);
        assert!(!out.contains("lambda"));
        assert!(!out.contains(LAMBDA_PLACEHOLDER));
    }

    #[test]
    fn test_touch_placeholder() {
        let template = "binary_sensor:\n  # __TOUCH_SENSORS_PLACEHOLDER__\n";
        let fragments = vec![
            "  - platform: touchscreen".to_string(),
            "    id: touch_next".to_string(),
        ];
        let out = substitute_placeholders(template, &[], &fragments, false);
        assert_eq!(out, "binary_sensor:\n  - platform: touchscreen\n    id: touch_next\n");

        let removed = substitute_placeholders(template, &[], &[], false);
        assert!(!removed.contains(TOUCH_SENSORS_PLACEHOLDER));
        assert!(!has_placeholders(&removed));
    }

    #[test]
    fn test_sanitize_comments_system_sections() {
        let template = "esphome:\n  name: panel\nwifi:\n  ssid: x\n\ndisplay:\n  - id: d\n";
        let out = sanitize_template(template);
        assert_eq!(
            out,
            "# esphome: # (Auto-commented)\n#   name: panel\n# wifi: # (Auto-commented)\n#   ssid: x\n\ndisplay:\n  - id: d\n"
        );
    }

    #[test]
    fn test_merge_two_plus_one_sensors() {
        let base = "sensor:\n  - platform: adc\n    id: a\n  - platform: adc\n    id: b\n";
        let extra = "sensor:\n  - platform: homeassistant\n    id: c\n";
        let out = merge_sections(base, extra);

        assert_eq!(out.matches("sensor:").count(), 1);
        assert_eq!(out.matches("- platform:").count(), 3);
        assert!(out.find("id: a").unwrap() < out.find("id: c").unwrap());
    }

    #[test]
    fn test_merge_suppresses_duplicate_headers_and_passes_through() {
        let base = "display:\n  - id: d\nfont:\n  - id: f1\n";
        let extra = "# generated\ndisplay:\ntext_sensor:\n  - id: t\nlvgl:\n  pages:\n    # widget:lvgl_label id:l1\n    - id: page_0\n";
        let out = merge_sections(base, extra);

        assert_eq!(out.matches("display:").count(), 1);
        assert!(out.contains("text_sensor:\n  - id: t"));
        assert!(out.contains("lvgl:\n  pages:\n    # widget:lvgl_label id:l1"));
        assert!(!out.contains("# generated"));
    }

    #[test]
    fn test_merge_nests_body_under_template_header() {
        let base = "lvgl:\n  buffer_size: 25%\n\ntouchscreen:\n  - id: t\n";
        let extra = "script:\n  - id: s\nlvgl:\n  id: my_lvgl\n  pages:\n    - id: page_0\n";
        let out = merge_sections(base, extra);

        assert_eq!(out.matches("lvgl:").count(), 1);
        assert!(out.contains(
            "lvgl:\n  buffer_size: 25%\n  id: my_lvgl\n  pages:\n    - id: page_0\n\ntouchscreen:"
        ));
        assert!(out.contains("script:\n  - id: s"));
        assert!(!out.contains("  - id: s\n  id: my_lvgl"));
        assert!(out.trim_end().ends_with("  - id: s"));
    }

    #[test]
    fn test_merge_header_with_comment() {
        let base = "sensor: # hardware\n  - id: a\n";
        let extra = "sensor:\n  - id: b\n";
        let out = merge_sections(base, extra);
        assert_eq!(out, "sensor:\n  - id: a\n\n  - id: b\n");
    }

    #[test]
    fn test_processor_end_to_end() {
        let template = "esphome:\n  name: x\ndisplay:\n  - platform: waveshare_epaper\n    rotation: 0\n    # __LAMBDA_PLACEHOLDER__\nsensor:\n  - platform: adc\n    id: battery_voltage\n";
        let processor = PackageProcessor::new(directives(Orientation::Portrait));
        let out = processor.apply(
            template,
            &["it.fill(COLOR_WHITE);".to_string()],
            &[],
            "sensor:\n  - platform: homeassistant\n    id: sensor_temp\n",
        );

        assert!(out.starts_with("# esphome: # (Auto-commented)"));
        assert!(out.contains("rotation: 90"));
        assert!(out.contains("      it.fill(COLOR_WHITE);"));
        assert_eq!(out.matches("sensor:").count(), 1);
        assert!(out.contains("id: sensor_temp"));
    }
}

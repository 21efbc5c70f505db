//! Hardware section generators for profiles without a template.
//!
//! Package-based profiles bring their own bus, display and sensor blocks; for
//! every other profile these generators describe the board from its pin map
//! and feature flags.

use crate::compiler::annotation::project_annotation;
use crate::compiler::ir::{Node, Section};
use crate::compiler::package::{compute_rotation, touch_transform};
use crate::constants::APP_NAME;
use crate::models::{HardwareProfile, Orientation, Project};

/// Ids declared by the onboard SHT4x block.
pub const ONBOARD_SENSOR_IDS: [&str; 2] = ["onboard_temperature", "onboard_humidity"];

/// Battery voltage mapped to 0 % and 100 %.
const BATTERY_CALIBRATION: (f64, f64) = (3.27, 4.15);

/// Width of the page-turn touch strips at the screen edges.
const TOUCH_STRIP_WIDTH: u32 = 80;

/// Default page refresh in seconds.
///
/// The project interval wins; otherwise LCDs refresh every minute and e-paper
/// panels follow the deep sleep interval (ten minutes without one).
pub fn default_refresh(project: &Project, profile: &HardwareProfile) -> u32 {
    project.refresh_interval.unwrap_or_else(|| {
        if profile.is_lcd() {
            60
        } else {
            project.deep_sleep_interval.unwrap_or(600)
        }
    })
}

/// Instruction header for generated documents, ending with the settings line.
pub fn header(project: &Project, profile: &HardwareProfile) -> Vec<String> {
    let rule = format!("# {}", "=".repeat(76));
    vec![
        rule.clone(),
        format!("# {APP_NAME} generated configuration"),
        format!("# Device: {} ({})", profile.name, profile.id),
        format!(
            "# Resolution: {}x{}, orientation: {}",
            profile.resolution.width, profile.resolution.height, project.orientation
        ),
        "#".to_string(),
        "# Paste this below the esphome:, esp32:, wifi:, api: and ota: blocks of".to_string(),
        "# your device configuration. Those blocks are not generated.".to_string(),
        rule,
        project_annotation(project),
        String::new(),
    ]
}

/// A `globals:` item.
pub fn global(id: &str, kind: &str, restore: bool, initial: impl std::fmt::Display) -> Node {
    Node::map()
        .with("id", Node::scalar(id))
        .with("type", Node::scalar(kind))
        .with("restore_value", Node::scalar(restore))
        .with("initial_value", Node::single_quoted(initial))
}

/// The page bookkeeping globals every document carries.
pub fn core_globals(default_refresh: u32) -> Vec<Node> {
    vec![
        global("display_page", "int", true, 0),
        global("page_refresh_default_s", "int", true, default_refresh),
        global("page_refresh_current_s", "int", false, 60),
        global("last_page_switch_time", "uint32_t", false, 0),
    ]
}

/// `psram:` block.
pub fn psram(profile: &HardwareProfile) -> Section {
    if profile.chip == "esp32-s3" {
        Section::new(
            "psram",
            Node::map()
                .with("mode", Node::scalar("octal"))
                .with("speed", Node::scalar("80MHz")),
        )
    } else {
        Section::new("psram", Node::map())
    }
}

/// `http_request:` block used by online images and remote data widgets.
pub fn http_request() -> Section {
    Section::new(
        "http_request",
        Node::map()
            .with("verify_ssl", Node::scalar(false))
            .with("timeout", Node::scalar("20s")),
    )
}

/// `i2c:` bus, if the profile has one.
pub fn i2c(profile: &HardwareProfile) -> Option<Section> {
    let pins = profile.pins.i2c.as_ref()?;
    Some(Section::new(
        "i2c",
        Node::map()
            .with("id", Node::scalar("bus_a"))
            .with("sda", Node::scalar(&pins.sda))
            .with("scl", Node::scalar(&pins.scl))
            .with("scan", Node::scalar(false)),
    ))
}

/// `spi:` bus, if the profile has one.
pub fn spi(profile: &HardwareProfile) -> Option<Section> {
    let pins = profile.pins.spi.as_ref()?;
    Some(Section::new(
        "spi",
        Node::map()
            .with("clk_pin", Node::scalar(&pins.clk))
            .with("mosi_pin", Node::scalar(&pins.mosi))
            .with_opt("miso_pin", pins.miso.as_ref().map(Node::scalar)),
    ))
}

/// Backlight `output:` and `light:` blocks.
///
/// The light id `display_backlight` is what the wake-on-touch trigger turns on.
pub fn backlight(profile: &HardwareProfile) -> Option<(Section, Section)> {
    let backlight = profile.backlight.as_ref()?;
    let mut output = Section::list("output");
    output.push(
        Node::map()
            .with("platform", Node::scalar(&backlight.platform))
            .with("id", Node::scalar("backlight_output"))
            .with("pin", Node::scalar(&backlight.pin)),
    );

    let light_platform = if backlight.platform == "ledc" {
        "monochromatic"
    } else {
        "binary"
    };
    let mut light = Section::list("light");
    light.push(
        Node::map()
            .with("platform", Node::scalar(light_platform))
            .with("id", Node::scalar("display_backlight"))
            .with("name", Node::quoted("Display Backlight"))
            .with("output", Node::scalar("backlight_output"))
            .with("restore_mode", Node::scalar("ALWAYS_ON")),
    );
    Some((output, light))
}

/// `time:` block with the Home Assistant clock.
pub fn time() -> Section {
    let mut section = Section::list("time");
    section.push(
        Node::map()
            .with("platform", Node::scalar("homeassistant"))
            .with("id", Node::scalar("ha_time")),
    );
    section
}

/// On-device sensors: battery voltage and level, onboard climate sensor.
pub fn hardware_sensors(profile: &HardwareProfile) -> Vec<Node> {
    let mut items = Vec::new();

    if let Some(pin) = profile.pins.battery_adc.as_ref().filter(|_| profile.features.battery) {
        let attenuation = if profile.chip == "esp32-c3" { "11db" } else { "12db" };
        items.push(
            Node::map()
                .with("platform", Node::scalar("adc"))
                .with("pin", Node::scalar(pin))
                .with("name", Node::quoted("Battery Voltage"))
                .with("id", Node::scalar("battery_voltage"))
                .with("update_interval", Node::scalar("60s"))
                .with("attenuation", Node::scalar(attenuation))
                .with(
                    "filters",
                    Node::list().item(Node::map().with("multiply", Node::scalar("2.0"))),
                ),
        );

        let (empty, full) = BATTERY_CALIBRATION;
        items.push(
            Node::map()
                .with("platform", Node::scalar("copy"))
                .with("source_id", Node::scalar("battery_voltage"))
                .with("id", Node::scalar("battery_level"))
                .with("name", Node::quoted("Battery Level"))
                .with("unit_of_measurement", Node::quoted("%"))
                .with("accuracy_decimals", Node::scalar(0))
                .with(
                    "filters",
                    Node::list()
                        .item(Node::map().with(
                            "calibrate_linear",
                            Node::list()
                                .item(Node::scalar(format!("{empty:.2} -> 0.0")))
                                .item(Node::scalar(format!("{full:.2} -> 100.0"))),
                        ))
                        .item(Node::map().with(
                            "clamp",
                            Node::map()
                                .with("min_value", Node::scalar(0))
                                .with("max_value", Node::scalar(100)),
                        )),
                ),
        );
    }

    if profile.features.onboard_sensors {
        let [temperature, humidity] = ONBOARD_SENSOR_IDS;
        items.push(
            Node::map()
                .with("platform", Node::scalar("sht4x"))
                .with(
                    "temperature",
                    Node::map()
                        .with("name", Node::quoted("Temperature"))
                        .with("id", Node::scalar(temperature)),
                )
                .with(
                    "humidity",
                    Node::map()
                        .with("name", Node::quoted("Humidity"))
                        .with("id", Node::scalar(humidity)),
                )
                .with("update_interval", Node::scalar("60s")),
        );
    }

    items
}

/// Action list running `change_page_to` with a target page expression.
pub fn change_page(expression: &str) -> Node {
    Node::list().item(
        Node::map().with(
            "script.execute",
            Node::map()
                .with("id", Node::scalar("change_page_to"))
                .with(
                    "target_page",
                    Node::Scalar(format!("!lambda 'return {expression};'")),
                ),
        ),
    )
}

/// GPIO page buttons: previous, next, refresh (in pin order).
pub fn buttons(profile: &HardwareProfile) -> Vec<Node> {
    const ROLES: [(&str, &str); 3] = [
        ("button_prev_page", "Previous Page"),
        ("button_next_page", "Next Page"),
        ("button_refresh", "Refresh"),
    ];

    profile
        .pins
        .buttons
        .iter()
        .zip(ROLES)
        .enumerate()
        .map(|(index, (pin, (id, name)))| {
            let action = match index {
                0 => change_page("id(display_page) - 1"),
                1 => change_page("id(display_page) + 1"),
                _ => Node::list().item(
                    Node::map().with("component.update", Node::scalar(profile.display_id())),
                ),
            };
            Node::map()
                .with("platform", Node::scalar("gpio"))
                .with(
                    "pin",
                    Node::map()
                        .with("number", Node::scalar(pin))
                        .with("mode", Node::scalar("INPUT_PULLUP"))
                        .with("inverted", Node::scalar(true)),
                )
                .with("id", Node::scalar(id))
                .with("name", Node::quoted(name))
                .with("on_press", action)
        })
        .collect()
}

/// Logical screen size after rotation.
fn logical_size(profile: &HardwareProfile, orientation: Orientation) -> (u32, u32) {
    let res = profile.resolution;
    if res.is_portrait() == orientation.is_portrait() {
        (res.width, res.height)
    } else {
        (res.height, res.width)
    }
}

/// Touch strips at the left and right edges that turn pages.
///
/// Only generated for touch profiles with more than one page.
pub fn touch_page_areas(
    profile: &HardwareProfile,
    orientation: Orientation,
    page_count: usize,
) -> Vec<Node> {
    if page_count < 2 || !(profile.features.touch || profile.touch.is_some()) {
        return Vec::new();
    }
    let (width, height) = logical_size(profile, orientation);
    let strip = TOUCH_STRIP_WIDTH.min(width / 2);

    [
        ("touch_prev_page", 0, strip, "id(display_page) - 1"),
        ("touch_next_page", width - strip, width, "id(display_page) + 1"),
    ]
    .into_iter()
    .map(|(id, x_min, x_max, expression)| {
        Node::map()
            .with("platform", Node::scalar("touchscreen"))
            .with("id", Node::scalar(id))
            .with("touchscreen_id", Node::scalar("my_touchscreen"))
            .with("x_min", Node::scalar(x_min))
            .with("x_max", Node::scalar(x_max))
            .with("y_min", Node::scalar(0))
            .with("y_max", Node::scalar(height))
            .with("on_press", change_page(expression))
    })
    .collect()
}

/// Renders touch strips as lines indented for a `binary_sensor:` list.
pub fn touch_fragments(areas: Vec<Node>) -> Vec<String> {
    if areas.is_empty() {
        return Vec::new();
    }
    Section::new("binary_sensor", Node::List(areas))
        .render()
        .into_iter()
        .skip(1)
        .collect()
}

/// Returns true when the document needs the page switch script.
pub fn needs_page_script(profile: &HardwareProfile, page_count: usize) -> bool {
    page_count > 1 || !profile.pins.buttons.is_empty()
}

/// `script:` with `change_page_to`, wrapping around at both ends.
pub fn page_script(profile: &HardwareProfile, page_count: usize, toolkit_mode: bool) -> Section {
    let body = vec![
        format!("int pages = {};", page_count.max(1)),
        "int page = target_page;".to_string(),
        "if (page < 0) page = pages - 1;".to_string(),
        "if (page >= pages) page = 0;".to_string(),
        "id(display_page) = page;".to_string(),
        "id(last_page_switch_time) = millis();".to_string(),
    ];
    let mut then = Node::list().item(Node::map().with("lambda", Node::Block(body)));
    if !toolkit_mode {
        then.push(Node::map().with("component.update", Node::scalar(profile.display_id())));
    }

    let mut section = Section::list("script");
    section.push(
        Node::map()
            .with("id", Node::scalar("change_page_to"))
            .with(
                "parameters",
                Node::map().with("target_page", Node::scalar("int")),
            )
            .with("then", then),
    );
    section
}

/// `display:` block.
///
/// E-paper panels refresh on the page interval, LCDs every second. In toolkit
/// mode there is no lambda and the display never clears itself.
pub fn display(
    profile: &HardwareProfile,
    orientation: Orientation,
    refresh_s: u32,
    lambda: Option<Vec<String>>,
) -> Section {
    let pins = &profile.pins.display;
    let rotation = compute_rotation(
        profile.resolution,
        orientation,
        profile.rotation.unwrap_or(0),
    );
    let update_interval = match (&lambda, profile.is_epaper()) {
        (None, _) => "never".to_string(),
        (Some(_), true) => format!("{refresh_s}s"),
        (Some(_), false) => "1s".to_string(),
    };

    let mut node = Node::map()
        .with("platform", Node::scalar(&profile.display_platform))
        .with("id", Node::scalar(profile.display_id()))
        .with_opt("model", profile.display_model.as_deref().map(Node::quoted))
        .with_opt("cs_pin", pins.cs.as_ref().map(Node::scalar))
        .with_opt("dc_pin", pins.dc.as_ref().map(Node::scalar))
        .with_opt("reset_pin", pins.reset.as_ref().map(Node::scalar))
        .with_opt(
            "busy_pin",
            pins.busy.as_ref().map(|pin| {
                Node::map()
                    .with("number", Node::scalar(pin))
                    .with("inverted", Node::scalar(true))
            }),
        )
        .with("rotation", Node::scalar(rotation))
        .with("update_interval", Node::scalar(update_interval));

    match lambda {
        Some(lines) => node.insert("lambda", Node::Block(lines)),
        None => node.insert("auto_clear_enabled", Node::scalar(false)),
    }

    let mut section = Section::list("display");
    section.push(node);
    section
}

/// `touchscreen:` block for touch profiles, transformed for the rotation.
pub fn touchscreen(profile: &HardwareProfile, orientation: Orientation) -> Option<Section> {
    let touch = profile.touch.as_ref()?;
    let rotation = compute_rotation(
        profile.resolution,
        orientation,
        profile.rotation.unwrap_or(0),
    );

    let mut node = Node::map()
        .with("platform", Node::scalar(&touch.platform))
        .with("id", Node::scalar("my_touchscreen"))
        .with("display", Node::scalar(profile.display_id()))
        .with_opt("interrupt_pin", touch.interrupt_pin.as_ref().map(Node::scalar))
        .with_opt("reset_pin", touch.reset_pin.as_ref().map(Node::scalar));
    if let Some((swap, mirror_x, mirror_y)) = touch_transform(rotation) {
        node.insert(
            "transform",
            Node::map()
                .with("swap_xy", Node::scalar(swap))
                .with("mirror_x", Node::scalar(mirror_x))
                .with("mirror_y", Node::scalar(mirror_y)),
        );
    }

    let mut section = Section::list("touchscreen");
    section.push(node);
    Some(section)
}

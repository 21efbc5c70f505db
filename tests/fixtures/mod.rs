//! Shared test fixtures for integration tests.
#![allow(dead_code)] // not every test binary uses every fixture

use lazyesp::compiler::Compiler;
use lazyesp::hardware::{HardwareCatalog, StaticTemplateSource};
use lazyesp::models::{Page, Project, RenderingMode, Widget};
use lazyesp::parser::save_project;
use std::path::{Path, PathBuf};

/// Template location of the 7" LCD profile in the built-in catalog.
pub const LCD_TEMPLATE_LOCATION: &str = "waveshare-esp32-s3-touch-lcd-7.yaml";

/// Minimal package template with both placeholders.
pub const LCD_TEMPLATE: &str = "\
# Name: Test LCD
esphome:
  name: panel
esp32:
  board: esp32-s3-devkitc-1
psram:
  mode: octal
sensor:
  - platform: uptime
    id: uptime_s
  - platform: wifi_signal
    id: wifi_rssi
binary_sensor:
  # __TOUCH_SENSORS_PLACEHOLDER__
display:
  - platform: rpi_dpi_rgb
    id: my_display
    rotation: 0
    update_interval: never
    auto_clear_enabled: true
    # __LAMBDA_PLACEHOLDER__
touchscreen:
  - platform: gt911
    id: my_touchscreen
";

/// Compiler over the built-in catalog with the LCD template registered.
pub fn test_compiler() -> Compiler {
    Compiler::new(
        HardwareCatalog::load().expect("built-in catalog"),
        Box::new(StaticTemplateSource::new().with(LCD_TEMPLATE_LOCATION, LCD_TEMPLATE)),
    )
}

fn page(name: &str, widgets: Vec<Widget>) -> Page {
    let mut page = Page::new(name);
    page.widgets = widgets;
    page
}

/// Two-page e-paper project made of widgets whose output depends only on
/// their own fields.
pub fn test_project_pure() -> Project {
    let mut project = Project::new("Hallway", "reterminal_e1001");
    project.refresh_interval = Some(300);
    project.pages.push(page(
        "Home",
        vec![
            Widget::new("title", "text", 10, 10, 300, 40)
                .with_prop("text", "Good morning")
                .with_prop("font_size", 28),
            Widget::new("frame", "shape_rect", 0, 60, 800, 2).with_prop("fill", true),
            Widget::new("temp", "sensor_text", 10, 80, 200, 40)
                .with_entity("sensor.outdoor_temperature")
                .with_prop("unit", "°C"),
        ],
    ));
    let mut second = page(
        "Energy",
        vec![Widget::new("solar", "progress_bar", 20, 20, 400, 30).with_entity("sensor.solar_pct")],
    );
    second.dark_mode = Some("dark".to_string());
    project.pages.push(second);
    project
}

/// One text-domain widget plus an unqualified numeric reference.
pub fn test_project_mixed_domains() -> Project {
    let mut project = Project::new("Mixed", "reterminal_e1001");
    project.pages.push(page(
        "Main",
        vec![
            Widget::new("forecast", "sensor_text", 0, 0, 300, 40).with_entity("weather.home"),
            Widget::new("cpu", "progress_bar", 0, 50, 300, 20).with_entity("cpu_usage"),
            Widget::new("cpu_label", "sensor_text", 0, 80, 300, 40).with_entity("sensor.cpu_usage"),
        ],
    ));
    project
}

/// Toolkit project on the 7" LCD profile.
pub fn test_project_toolkit() -> Project {
    let mut project = Project::new("Panel", "waveshare_esp32_s3_touch_lcd_7");
    project.rendering_mode = RenderingMode::Lvgl;
    project.pages.push(page(
        "Main",
        vec![
            Widget::new("hello", "lvgl_label", 10, 10, 200, 40).with_prop("text", "Hello"),
            Widget::new("power", "lvgl_bar", 10, 60, 300, 20).with_entity("sensor.power"),
        ],
    ));
    project.pages.push(page("Empty", Vec::new()));
    project
}

/// Writes a project as JSON under `dir` and returns the path.
pub fn write_project_file(dir: &Path, name: &str, project: &Project) -> PathBuf {
    let path = dir.join(name);
    save_project(project, &path).expect("write project");
    path
}

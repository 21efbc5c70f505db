//! End-to-end compiler tests.

mod fixtures;

use fixtures::*;
use lazyesp::compiler::{toolkit_mode, Severity};
use lazyesp::compiler::Compiler;
use lazyesp::hardware::{HardwareCatalog, StaticTemplateSource};
use lazyesp::models::{Orientation, Widget};
use lazyesp::parser::import_document;

fn section_count(doc: &str, header: &str) -> usize {
    doc.lines().filter(|l| *l == header).count()
}

/// Lines of a top-level section, header excluded.
fn section_body<'a>(doc: &'a str, header: &str) -> Vec<&'a str> {
    doc.lines()
        .skip_while(|l| *l != header)
        .skip(1)
        .take_while(|l| l.is_empty() || l.starts_with(' '))
        .collect()
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_round_trip_is_byte_identical() {
    let compiler = test_compiler();
    let project = test_project_pure();

    let first = compiler.compile(&project);
    let imported = import_document(&first.document);
    assert!(imported.has_settings);
    assert!(imported.skipped.is_empty(), "{:?}", imported.skipped);
    assert_eq!(imported.project.pages.len(), 2);

    let second = compiler.compile(&imported.project);
    assert_eq!(first.document, second.document);
}

#[test]
fn test_round_trip_restores_page_settings() {
    let compiler = test_compiler();
    let out = compiler.compile(&test_project_pure());
    let project = import_document(&out.document).project;

    assert_eq!(project.name, "Hallway");
    assert_eq!(project.refresh_interval, Some(300));
    assert_eq!(project.pages[0].name, "Home");
    assert_eq!(project.pages[1].dark_mode.as_deref(), Some("dark"));
    let ids: Vec<_> = project.pages[0].widgets.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["title", "frame", "temp"]);
}

#[test]
fn test_toolkit_round_trip_through_template() {
    let compiler = test_compiler();
    let first = compiler.compile(&test_project_toolkit());
    assert!(first.toolkit_mode);

    let imported = import_document(&first.document).project;
    assert_eq!(imported.device_model, "waveshare_esp32_s3_touch_lcd_7");
    assert_eq!(imported.pages.len(), 2);
    assert_eq!(imported.pages[0].widgets.len(), 2);

    let second = compiler.compile(&imported);
    assert_eq!(first.document, second.document);
}

// ============================================================================
// Entity deduplication
// ============================================================================

#[test]
fn test_mixed_domains_declared_once_each() {
    let out = test_compiler().compile(&test_project_mixed_domains());
    let doc = &out.document;

    assert_eq!(section_count(doc, "text_sensor:"), 1);
    assert_eq!(section_count(doc, "sensor:"), 1);

    let text = section_body(doc, "text_sensor:").join("\n");
    assert_eq!(text.matches("entity_id: weather.home").count(), 1);

    let numeric = section_body(doc, "sensor:").join("\n");
    assert_eq!(numeric.matches("entity_id: sensor.cpu_usage").count(), 1);
    assert_eq!(numeric.matches("id: sensor_cpu_usage\n").count(), 1);
    assert!(!numeric.contains("entity_id: cpu_usage"));
}

#[test]
fn test_long_entity_ids_truncated_and_declared_once() {
    let mut project = test_project_mixed_domains();
    let long = format!("sensor.{}", "kitchen_fridge_compressor_".repeat(4));
    project.pages[0].widgets = vec![
        Widget::new("a", "sensor_text", 0, 0, 100, 20).with_entity(long.clone()),
        Widget::new("b", "progress_bar", 0, 30, 100, 20).with_entity(long.clone()),
    ];
    let out = test_compiler().compile(&project);

    let declared: Vec<&str> = section_body(&out.document, "sensor:")
        .into_iter()
        .filter(|l| l.trim_start().starts_with("entity_id: sensor.kitchen"))
        .collect();
    assert_eq!(declared.len(), 1);

    let id_line = section_body(&out.document, "sensor:")
        .into_iter()
        .find(|l| l.trim_start().starts_with("id: sensor_kitchen"))
        .expect("truncated id declared");
    assert_eq!(id_line.trim_start().trim_start_matches("id: ").len(), 63);
}

// ============================================================================
// Profiles and modes
// ============================================================================

#[test]
fn test_generated_profile_has_hardware_blocks() {
    let out = test_compiler().compile(&test_project_pure());
    let doc = &out.document;
    assert!(doc.contains("\ni2c:\n"));
    assert!(doc.contains("    id: battery_voltage"));
    assert!(doc.contains("    id: button_next_page"));
    assert!(doc.contains("  - id: change_page_to"));
    assert!(
        doc.contains("    platform: waveshare_epaper")
            || doc.contains("  - platform: waveshare_epaper")
    );
    assert!(doc.contains("    update_interval: 300s"));
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
}

#[test]
fn test_package_profile_merges_sensor_sections() {
    let mut project = test_project_toolkit();
    project.pages[0].widgets.push(
        Widget::new("grid_power", "lvgl_label", 0, 100, 100, 20).with_entity("sensor.grid"),
    );
    let out = test_compiler().compile(&project);
    let doc = &out.document;

    assert_eq!(section_count(doc, "sensor:"), 1);
    let sensors = section_body(doc, "sensor:").join("\n");
    assert!(sensors.contains("id: uptime_s"));
    assert!(sensors.contains("id: wifi_rssi"));
    assert!(sensors.contains("entity_id: sensor.power"));

    assert!(doc.contains("# esphome: # (Auto-commented)"));
    assert!(doc.contains("auto_clear_enabled: false"));
    assert!(!doc.contains("__LAMBDA_PLACEHOLDER__"));
    assert!(!doc.contains("__TOUCH_SENSORS_PLACEHOLDER__"));
    // the template's own psram block is commented out with the other system sections
    assert_eq!(section_count(doc, "psram:"), 0);
    assert!(doc.contains("# psram: # (Auto-commented)"));
    assert!(doc.contains("\nlvgl:\n"));
}

#[test]
fn test_template_lvgl_section_keeps_generated_body() {
    let template = LCD_TEMPLATE.replace(
        "touchscreen:",
        "lvgl:\n  buffer_size: 25%\ntouchscreen:",
    );
    let compiler = Compiler::new(
        HardwareCatalog::load().unwrap(),
        Box::new(StaticTemplateSource::new().with(LCD_TEMPLATE_LOCATION, template)),
    );
    let doc = compiler.compile(&test_project_toolkit()).document;

    assert_eq!(section_count(&doc, "lvgl:"), 1);
    let lvgl = section_body(&doc, "lvgl:");
    assert_eq!(lvgl[0], "  buffer_size: 25%");
    assert_eq!(lvgl[1], "  id: my_lvgl");
    assert!(lvgl.contains(&"  pages:"));

    let script = section_body(&doc, "script:").join("\n");
    assert!(!script.contains("my_lvgl"));
    assert!(!script.contains("  pages:"));
}

#[test]
fn test_rotation_follows_orientation() {
    let compiler = test_compiler();
    let expected = [
        (Orientation::Landscape, 0),
        (Orientation::Portrait, 90),
        (Orientation::LandscapeInverted, 180),
        (Orientation::PortraitInverted, 270),
    ];
    for (orientation, rotation) in expected {
        let mut project = test_project_toolkit();
        project.orientation = orientation;
        let doc = compiler.compile(&project).document;
        assert!(
            doc.contains(&format!("    rotation: {rotation}\n")),
            "{orientation}: {doc}"
        );
    }
}

#[test]
fn test_direct_mode_on_package_profile_fills_lambda() {
    let mut project = test_project_toolkit();
    project.rendering_mode = lazyesp::models::RenderingMode::Direct;
    project.pages[0].widgets =
        vec![Widget::new("t", "text", 0, 0, 100, 30).with_prop("text", "Hi")];

    let out = test_compiler().compile(&project);
    assert!(!out.toolkit_mode);
    assert!(out.document.contains("    lambda: |-\n"));
    assert!(out.document.contains("// widget:text id:t"));
    // two pages with touch: page strips land in the template's binary_sensor block
    assert!(out.document.contains("id: touch_next_page"));
    assert!(!out.document.contains("\nlvgl:"));
}

#[test]
fn test_auto_mode_follows_profile() {
    let catalog = HardwareCatalog::load().unwrap();
    let mut project = test_project_pure();
    assert!(!toolkit_mode(&project, catalog.get("reterminal_e1001").unwrap()));
    project.device_model = "waveshare_esp32_s3_touch_lcd_7".to_string();
    assert!(toolkit_mode(
        &project,
        catalog.get("waveshare_esp32_s3_touch_lcd_7").unwrap()
    ));
}

#[test]
fn test_unsupported_widget_is_contained() {
    let mut project = test_project_pure();
    project.pages[0]
        .widgets
        .push(Widget::new("mystery", "hologram", 0, 0, 10, 10));
    let out = test_compiler().compile(&project);

    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.widget.as_deref() == Some("mystery") && d.severity == Severity::Warning));
    assert!(out.document.contains("// widget:text id:title"));
    assert!(out.document.lines().map(str::trim).any(|l| {
        l.starts_with("// widget:hologram id:mystery") && l.ends_with("status:unsupported")
    }));
}

#[test]
fn test_compilations_share_no_state() {
    let compiler = test_compiler();
    let a = compiler.compile(&test_project_mixed_domains());
    let _ = compiler.compile(&test_project_pure());
    let b = compiler.compile(&test_project_mixed_domains());
    assert_eq!(a.document, b.document);
}

//! Ready-made bars: page navigation and device status.

use super::symbols::glyph;
use super::{
    color_const, prop_px, DirectContext, DirectExport, PluginRegistry, SectionContext,
    WidgetPlugin,
};
use crate::compiler::fonts::FontRegistry;
use crate::compiler::ir::Node;
use crate::hardware::sections::{change_page, ONBOARD_SENSOR_IDS};
use crate::models::{HardwareProfile, Widget};
use anyhow::Result;

pub(super) fn register(registry: &mut PluginRegistry) {
    registry.register(Box::new(NavBarPlugin));
    registry.register(Box::new(SensorBarPlugin));
}

fn background(widget: &Widget, ctx: &mut DirectContext<'_>) {
    let bg = widget.prop_str_or("background_color", "white");
    if bg != "transparent" {
        ctx.push(format!(
            "it.filled_rectangle({}, {}, {}, {}, {});",
            widget.x,
            widget.y,
            widget.width,
            widget.height,
            color_const(&bg)
        ));
    }
    if widget.flag("show_border") {
        ctx.push(format!(
            "it.rectangle({}, {}, {}, {}, {});",
            widget.x,
            widget.y,
            widget.width,
            widget.height,
            color_const(&widget.prop_str_or("border_color", "black"))
        ));
    }
}

// ============================================================================
// template_nav_bar
// ============================================================================

/// Previous / home / next buttons.
///
/// On touch panels with several pages each button also gets a touch area
/// that switches pages.
#[derive(Debug, Default)]
pub struct NavBarPlugin;

/// A navigation button: prop toggling it, glyph, touch id prefix, page expression.
const NAV_BUTTONS: [(&str, &str, &str, &str); 3] = [
    ("show_prev", "F0141", "nav_prev", "id(display_page) - 1"),
    ("show_home", "F02DC", "nav_home", "0"),
    ("show_next", "F0142", "nav_next", "id(display_page) + 1"),
];

impl NavBarPlugin {
    fn buttons(widget: &Widget) -> Vec<(&'static str, &'static str, &'static str)> {
        NAV_BUTTONS
            .iter()
            .filter(|(prop, ..)| widget.prop_bool(prop) != Some(false))
            .map(|&(_, code, id, expression)| (code, id, expression))
            .collect()
    }

    fn icon_size(widget: &Widget) -> u32 {
        prop_px(widget, "icon_size", 24)
    }
}

impl WidgetPlugin for NavBarPlugin {
    fn kind(&self) -> &'static str {
        "template_nav_bar"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        let size = Self::icon_size(widget);
        for (code, ..) in Self::buttons(widget) {
            fonts.track_icon(code, size);
        }
    }

    fn on_export_binary_sensors(&self, ctx: &mut SectionContext<'_>) {
        let profile = ctx.profile;
        let has_touch = profile.features.touch || profile.touch.is_some();
        if !has_touch || ctx.page_count < 2 || ctx.toolkit_mode {
            return;
        }
        let mut areas = Vec::new();
        for widget in ctx.widgets_of("template_nav_bar") {
            let buttons = Self::buttons(widget);
            let n = buttons.len() as i32;
            for (i, (_, prefix, expression)) in (0_i32..).zip(buttons) {
                let x_min = widget.x + widget.width * i / n;
                let x_max = widget.x + widget.width * (i + 1) / n;
                areas.push(
                    Node::map()
                        .with("platform", Node::scalar("touchscreen"))
                        .with("id", Node::scalar(format!("{prefix}_{}", widget.id)))
                        .with("touchscreen_id", Node::scalar("my_touchscreen"))
                        .with("x_min", Node::scalar(x_min))
                        .with("x_max", Node::scalar(x_max))
                        .with("y_min", Node::scalar(widget.y))
                        .with("y_max", Node::scalar(widget.y + widget.height))
                        .with("on_press", change_page(expression)),
                );
            }
        }
        for area in areas {
            ctx.push_item(area);
        }
    }
}

impl DirectExport for NavBarPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        background(widget, ctx);
        let buttons = Self::buttons(widget);
        if buttons.is_empty() {
            return Ok(());
        }
        let font = ctx.icon_font(Self::icon_size(widget));
        let color = color_const(&widget.prop_str_or("color", "black"));
        let n = buttons.len() as i32;
        let cy = widget.y + widget.height / 2;
        for (i, (code, ..)) in (0_i32..).zip(buttons) {
            let cx = widget.x + widget.width * (2 * i + 1) / (2 * n);
            ctx.push(format!(
                "it.print({cx}, {cy}, id({font}), {color}, TextAlign::CENTER, \"{}\");",
                glyph(code)
            ));
        }
        Ok(())
    }
}

// ============================================================================
// template_sensor_bar
// ============================================================================

/// Status strip with Wi-Fi strength, on-board climate and battery level.
///
/// Readings the profile cannot provide are left out.
#[derive(Debug, Default)]
pub struct SensorBarPlugin;

/// One reading on the bar.
struct Reading {
    glyph: &'static str,
    sensor: &'static str,
    format: &'static str,
    value: String,
}

impl Reading {
    fn new(glyph: &'static str, sensor: &'static str, format: &'static str) -> Self {
        Self {
            glyph,
            sensor,
            format,
            value: format!("id({sensor}).state"),
        }
    }
}

impl SensorBarPlugin {
    fn readings(widget: &Widget, profile: &HardwareProfile) -> Vec<Reading> {
        let show = |prop: &str| widget.prop_bool(prop) != Some(false);
        let mut readings = Vec::new();
        if show("show_wifi") {
            readings.push(Reading::new("F05A9", "wifi_signal_dbm", "%.0fdB"));
        }
        if profile.features.onboard_sensors {
            let [temperature, humidity] = ONBOARD_SENSOR_IDS;
            if show("show_temperature") {
                let fahrenheit = widget.prop_str_or("temperature_unit", "°C").ends_with('F');
                let mut reading = Reading::new(
                    "F050F",
                    temperature,
                    if fahrenheit { "%.1f°F" } else { "%.1f°C" },
                );
                if fahrenheit {
                    reading.value = format!("id({temperature}).state * 9.0 / 5.0 + 32.0");
                }
                readings.push(reading);
            }
            if show("show_humidity") {
                readings.push(Reading::new("F058E", humidity, "%.0f%%"));
            }
        }
        if profile.features.battery && profile.pins.battery_adc.is_some() && show("show_battery")
        {
            readings.push(Reading::new("F0079", "battery_level", "%.0f%%"));
        }
        readings
    }

    fn sizes(widget: &Widget) -> (u32, u32) {
        (prop_px(widget, "icon_size", 20), prop_px(widget, "font_size", 14))
    }
}

impl WidgetPlugin for SensorBarPlugin {
    fn kind(&self) -> &'static str {
        "template_sensor_bar"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        let (icon, text) = Self::sizes(widget);
        fonts.add_font(&widget.prop_str_or("font_family", "Roboto"), 400, text, false);
        for code in ["F05A9", "F050F", "F058E", "F0079"] {
            fonts.track_icon(code, icon);
        }
    }

    fn on_export_numeric_sensors(&self, ctx: &mut SectionContext<'_>) {
        if ctx
            .widgets_of("template_sensor_bar")
            .any(|w| w.prop_bool("show_wifi") != Some(false))
        {
            ctx.push_item(
                Node::map()
                    .with("platform", Node::scalar("wifi_signal"))
                    .with("name", Node::quoted("WiFi Signal"))
                    .with("id", Node::scalar("wifi_signal_dbm"))
                    .with("update_interval", Node::scalar("60s")),
            );
        }
    }
}

impl DirectExport for SensorBarPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        background(widget, ctx);
        let readings = Self::readings(widget, ctx.profile);
        if readings.is_empty() {
            return Ok(());
        }
        let (icon_size, text_size) = Self::sizes(widget);
        let icon_font = ctx.icon_font(icon_size);
        let font = ctx.font(
            &widget.prop_str_or("font_family", "Roboto"),
            400,
            text_size,
            false,
        );
        let color = color_const(&widget.prop_str_or("color", "black"));
        let n = readings.len() as i32;
        let cy = widget.y + widget.height / 2;
        let text_offset = icon_size as i32 + 4;
        for (i, reading) in (0_i32..).zip(readings) {
            let x = widget.x + widget.width * i / n + 4;
            ctx.push(format!(
                "it.print({x}, {cy}, id({icon_font}), {color}, TextAlign::CENTER_LEFT, \"{}\");",
                glyph(reading.glyph)
            ));
            ctx.push(format!("if (id({}).has_state()) {{", reading.sensor));
            ctx.push(format!(
                "  it.printf({}, {cy}, id({font}), {color}, TextAlign::CENTER_LEFT, \"{}\", {});",
                x + text_offset,
                reading.format,
                reading.value
            ));
            ctx.push("}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::entities::EntityTable;
    use crate::models::Resolution;
    use crate::plugins::PluginWidget;

    fn lcd() -> HardwareProfile {
        let mut p = HardwareProfile::new("t", "T", "esp32", "st7789v", Resolution::default());
        p.features.lcd = true;
        p
    }

    fn direct(
        plugin: &dyn DirectExport,
        widget: &Widget,
        profile: &HardwareProfile,
    ) -> Vec<String> {
        let table = EntityTable::new();
        let mut fonts = FontRegistry::new();
        let mut ctx = DirectContext::new(&mut fonts, &table, profile);
        plugin.export(widget, &mut ctx).unwrap();
        ctx.into_lines()
    }

    fn binary(
        widget: &Widget,
        profile: &HardwareProfile,
        toolkit: bool,
        pages: usize,
    ) -> Vec<Node> {
        let widgets = [PluginWidget {
            kind: "template_nav_bar",
            page: 0,
            widget,
        }];
        let mut table = EntityTable::new();
        let mut ctx = SectionContext::new(&widgets, &mut table, profile, toolkit, pages);
        NavBarPlugin.on_export_binary_sensors(&mut ctx);
        ctx.into_parts().0
    }

    #[test]
    fn test_nav_bar_spaces_buttons_evenly() {
        let w = Widget::new("nav", "template_nav_bar", 0, 200, 300, 40);
        let lines = direct(&NavBarPlugin, &w, &lcd());
        assert_eq!(lines[0], "it.filled_rectangle(0, 200, 300, 40, COLOR_WHITE);");
        assert_eq!(
            lines[1],
            "it.print(50, 220, id(font_material_design_icons_400_24), COLOR_BLACK, \
            TextAlign::CENTER, \"\\U000F0141\");"
        );
        assert!(lines[2].starts_with("it.print(150, 220,"));
        assert!(lines[3].ends_with("\"\\U000F0142\");"));
    }

    #[test]
    fn test_nav_bar_hides_home() {
        let w = Widget::new("nav", "template_nav_bar", 0, 0, 200, 40)
            .with_prop("show_home", false)
            .with_prop("background_color", "transparent");
        let lines = direct(&NavBarPlugin, &w, &lcd());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("it.print(50, 20,"));
        assert!(lines[1].starts_with("it.print(150, 20,"));
    }

    #[test]
    fn test_nav_bar_touch_areas() {
        let mut profile = lcd();
        profile.features.touch = true;
        let w = Widget::new("nav", "template_nav_bar", 0, 200, 300, 40);

        let areas = binary(&w, &profile, false, 3);
        assert_eq!(areas.len(), 3);
        assert_eq!(areas[1].get("id").and_then(Node::as_scalar), Some("nav_home_nav"));
        assert_eq!(areas[1].get("x_min").and_then(Node::as_scalar), Some("100"));
        assert_eq!(areas[2].get("y_max").and_then(Node::as_scalar), Some("240"));
        assert_eq!(areas[0].get("on_press"), Some(&change_page("id(display_page) - 1")));

        assert!(binary(&w, &profile, false, 1).is_empty());
        assert!(binary(&w, &profile, true, 3).is_empty());
        assert!(binary(&w, &lcd(), false, 3).is_empty());
    }

    #[test]
    fn test_sensor_bar_only_wifi_without_onboard_sensors() {
        let w = Widget::new("bar", "template_sensor_bar", 0, 0, 320, 30);
        let lines = direct(&SensorBarPlugin, &w, &lcd());
        assert!(lines.iter().any(|l| l.contains("id(wifi_signal_dbm).state")));
        assert!(!lines.iter().any(|l| l.contains("onboard_temperature")));
        assert!(!lines.iter().any(|l| l.contains("battery_level")));
    }

    #[test]
    fn test_sensor_bar_with_onboard_readings_in_fahrenheit() {
        let mut profile = lcd();
        profile.features.onboard_sensors = true;
        profile.features.battery = true;
        profile.pins.battery_adc = Some("GPIO1".to_string());
        let w = Widget::new("bar", "template_sensor_bar", 0, 0, 400, 30)
            .with_prop("temperature_unit", "°F")
            .with_prop("show_wifi", false);
        let lines = direct(&SensorBarPlugin, &w, &profile);
        assert!(lines.contains(&"if (id(onboard_temperature).has_state()) {".to_string()));
        let converted = "\"%.1f°F\", id(onboard_temperature).state * 9.0 / 5.0 + 32.0);";
        assert!(lines.iter().any(|l| l.contains(converted)));
        assert!(lines.iter().any(|l| l.starts_with("it.print(270, 15,")));
        assert!(lines.iter().any(|l| l.contains("id(battery_level).state")));
        assert!(!lines.iter().any(|l| l.contains("wifi_signal_dbm")));
    }

    #[test]
    fn test_sensor_bar_declares_wifi_sensor() {
        let w = Widget::new("bar", "template_sensor_bar", 0, 0, 320, 30);
        let widgets = [PluginWidget {
            kind: "template_sensor_bar",
            page: 0,
            widget: &w,
        }];
        let profile = lcd();
        let mut table = EntityTable::new();
        let mut ctx = SectionContext::new(&widgets, &mut table, &profile, false, 1);
        SensorBarPlugin.on_export_numeric_sensors(&mut ctx);
        let (items, _) = ctx.into_parts();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("platform").and_then(Node::as_scalar), Some("wifi_signal"));
    }
}

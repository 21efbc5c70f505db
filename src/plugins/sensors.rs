//! Value visualizations: progress bars, history graphs and on-board readings.

use super::{
    color_const, common_props, convert_color, escape_printf, prop_px, qualified_entity,
    DirectContext, DirectExport, PluginRegistry, SectionContext, ToolkitContext, ToolkitExport,
    WidgetPlugin,
};
use crate::compiler::entities::EntityKind;
use crate::compiler::fonts::FontRegistry;
use crate::compiler::ir::{Node, Section};
use crate::models::Widget;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;

pub(super) fn register(registry: &mut PluginRegistry) {
    registry.register(Box::new(ProgressBarPlugin));
    registry.register(Box::new(GraphPlugin));
    registry.register(Box::new(OnboardPlugin::new(&TEMPERATURE)));
    registry.register(Box::new(OnboardPlugin::new(&HUMIDITY)));
}

/// Formats a number the shortest way (`10`, `2.5`).
fn number(value: f64) -> String {
    format!("{value}")
}

/// Id fragment derived from a widget id.
fn id_suffix(widget: &Widget) -> String {
    widget.id.replace('-', "_")
}

// ============================================================================
// progress_bar
// ============================================================================

/// A bar filled proportionally to a value inside `[min, max]`.
#[derive(Debug, Default)]
pub struct ProgressBarPlugin;

impl ProgressBarPlugin {
    fn range(widget: &Widget) -> (f64, f64) {
        (
            widget.prop_f64("min").unwrap_or(0.0),
            widget.prop_f64("max").unwrap_or(100.0),
        )
    }

    /// Bar colors follow the page theme for black and white.
    fn dynamic_color(color: &str) -> String {
        match color.trim().to_lowercase().as_str() {
            "theme_auto" | "black" | "#000000" => "color_on".to_string(),
            "white" | "#ffffff" => "color_off".to_string(),
            other => color_const(other),
        }
    }

    fn sensor(widget: &Widget, resolve: impl Fn(&str) -> String) -> Option<String> {
        if widget.flag("is_local_sensor") {
            return Some(widget.entity().unwrap_or("battery_level").to_string());
        }
        qualified_entity(widget).map(|entity| resolve(&entity))
    }
}

impl WidgetPlugin for ProgressBarPlugin {
    fn kind(&self) -> &'static str {
        "progress_bar"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        fonts.add_font("Roboto", 400, prop_px(widget, "font_size", 12), false);
    }
}

impl DirectExport for ProgressBarPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let (x, y, w, h) = (widget.x, widget.y, widget.width, widget.height);
        let color_prop = widget.prop_str_or("color", "theme_auto");
        let color = Self::dynamic_color(&color_prop);
        let font_size = prop_px(widget, "font_size", 12) as i32;
        let font = ctx.font("Roboto", 400, font_size as u32, false);
        let bar = prop_px(widget, "bar_height", 15) as i32;
        let title = escape_printf(widget.title.as_deref().unwrap_or_default());
        let show_label = widget.prop_bool("show_label") != Some(false) && !title.is_empty();
        let show_pct = widget.prop_bool("show_percentage") != Some(false);
        let (min, max) = Self::range(widget);

        if let Some(bg) = widget
            .prop_str("bg_color")
            .or_else(|| widget.prop_str("background_color"))
            .filter(|c| c != "transparent")
        {
            ctx.push(format!(
                "it.filled_rectangle({x}, {y}, {w}, {h}, {});",
                Self::dynamic_color(&bg)
            ));
        }

        let Some(sensor) = Self::sensor(widget, |e| ctx.sensor_id(e, None, EntityKind::Numeric))
        else {
            // placeholder bar at half fill
            ctx.push(format!("it.rectangle({x}, {y} + {h} - {bar}, {w}, {bar}, {color});"));
            ctx.push(format!(
                "it.filled_rectangle({x} + 2, {y} + {h} - {bar} + 2, {w} / 2, {bar} - 4, {color});"
            ));
            if show_label {
                ctx.push(format!(
                    "it.printf({x}, {y}, id({font}), {color}, TextAlign::TOP_LEFT, \"{title}\");"
                ));
            }
            return Ok(());
        };

        let s = id_suffix(widget);
        let (min_s, max_s) = (number(min), number(max));
        ctx.push(format!("float val_{s} = id({sensor}).state;"));
        ctx.push(format!("if (std::isnan(val_{s})) val_{s} = {min_s};"));
        ctx.push(format!("float range_{s} = {max_s} - {min_s};"));
        ctx.push(format!(
            "int pct_{s} = (range_{s} == 0) ? 0 : (int)((val_{s} - {min_s}) / range_{s} * 100);"
        ));
        ctx.push(format!("if (pct_{s} < 0) pct_{s} = 0;"));
        ctx.push(format!("if (pct_{s} > 100) pct_{s} = 100;"));

        if widget.prop_str("orientation").as_deref() == Some("vertical") {
            if show_label {
                ctx.push(format!(
                    "it.printf({x} + {w}/2, {y}, id({font}), {color}, TextAlign::TOP_CENTER, \"{title}\");"
                ));
            }
            if show_pct {
                ctx.push(format!(
                    "it.printf({x} + {w}/2, {y} + {h} - {font_size}, id({font}), {color}, TextAlign::TOP_CENTER, \"%d%%\", pct_{s});"
                ));
            }
            let bar_x = x + (w - bar) / 2;
            let start = y + if show_label { font_size + 2 } else { 0 };
            let end = y + h - if show_pct { font_size + 2 } else { 0 };
            let total = end - start;
            ctx.push(format!("it.rectangle({bar_x}, {start}, {bar}, {total}, {color});"));
            ctx.push(format!("if (pct_{s} > 0) {{"));
            ctx.push(format!("  int bar_h = ({total} - 4) * pct_{s} / 100;"));
            ctx.push(format!(
                "  it.filled_rectangle({}, {start} + {total} - 2 - bar_h, {}, bar_h, {color});",
                bar_x + 2,
                bar - 4
            ));
            ctx.push("}");
        } else {
            let align = widget.prop_str_or("text_align", "CENTER");
            let (label_x, label_align) = if align == "RIGHT" {
                (format!("{x} + {w}"), "TextAlign::TOP_RIGHT")
            } else {
                (x.to_string(), "TextAlign::TOP_LEFT")
            };
            let (pct_x, pct_align) = if align == "LEFT" {
                (x.to_string(), "TextAlign::TOP_LEFT")
            } else {
                (format!("{x} + {w}"), "TextAlign::TOP_RIGHT")
            };
            if show_label {
                ctx.push(format!(
                    "it.printf({label_x}, {y}, id({font}), {color}, {label_align}, \"{title}\");"
                ));
            }
            if show_pct {
                ctx.push(format!(
                    "it.printf({pct_x}, {y}, id({font}), {color}, {pct_align}, \"%d%%\", pct_{s});"
                ));
            }
            let bar_y = y + h - bar;
            ctx.push(format!("it.rectangle({x}, {bar_y}, {w}, {bar}, {color});"));
            ctx.push(format!("if (pct_{s} > 0) {{"));
            ctx.push(format!("  int bar_w = ({w} - 4) * pct_{s} / 100;"));
            ctx.push(format!(
                "  it.filled_rectangle({x} + 2, {bar_y} + 2, bar_w, {bar} - 4, {color});"
            ));
            ctx.push("}");
        }
        ctx.dither(&color_prop, x, y, w, h);
        Ok(())
    }
}

impl ToolkitExport for ProgressBarPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let (min, max) = Self::range(widget);
        let sensor = Self::sensor(widget, |e| ctx.sensor(e, None, EntityKind::Numeric).0);
        let value = match &sensor {
            Some(id) => Node::scalar(format!("!lambda \"return id({id}).state;\"")),
            None => Node::scalar(widget.prop_i64_or("value", 0)),
        };
        if let Some(entity) = qualified_entity(widget).filter(|_| !widget.flag("is_local_sensor")) {
            ctx.request_trigger(
                &entity,
                Node::map().with("lvgl.widget.refresh", Node::scalar(&widget.id)),
            );
        }

        let bar = common_props(widget)
            .with("min_value", Node::scalar(number(min)))
            .with("max_value", Node::scalar(number(max)))
            .with("value", value)
            .with(
                "bg_color",
                convert_color(Some(&widget.prop_str_or("bg_color", "white"))),
            )
            .with(
                "indicator",
                Node::map().with("bg_color", convert_color(widget.prop_str("color").as_deref())),
            )
            .with("mode", Node::scalar(widget.prop_str_or("mode", "NORMAL").to_uppercase()));
        Ok(Node::map().with("bar", bar))
    }
}

// ============================================================================
// graph
// ============================================================================

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)?)(min|h|d)$").expect("valid graph duration regex")
    })
}

/// Sensor history plot backed by a `graph:` component.
#[derive(Debug, Default)]
pub struct GraphPlugin;

/// Graph settings shared by the component and the drawing code.
struct GraphSpec {
    id: String,
    duration: String,
    border: bool,
    x_grid: Option<String>,
    y_grid: Option<String>,
    thickness: i64,
    line_type: String,
    continuous: bool,
    min_value: Option<f64>,
    max_value: Option<f64>,
}

impl GraphSpec {
    fn from_widget(widget: &Widget) -> Self {
        let duration = widget.prop_str_or("duration", "1h");
        let min_value = widget.prop_f64("min_value");
        let max_value = widget.prop_f64("max_value");
        let grid = widget.prop_bool("grid") != Some(false);
        let non_empty = |key: &str| widget.prop_str(key).filter(|v| !v.trim().is_empty());

        let (x_grid, y_grid) = if grid {
            (
                non_empty("x_grid").or_else(|| Some(auto_x_grid(&duration))),
                non_empty("y_grid").or_else(|| {
                    Some(auto_y_grid(min_value.unwrap_or(0.0), max_value.unwrap_or(100.0)))
                }),
            )
        } else {
            (None, None)
        };

        Self {
            id: format!("graph_{}", id_suffix(widget)),
            duration,
            border: widget.prop_bool("border") != Some(false),
            x_grid,
            y_grid,
            thickness: widget.prop_i64_or("line_thickness", 3).max(1),
            line_type: widget.prop_str_or("line_type", "SOLID").to_uppercase(),
            continuous: widget.flag("continuous"),
            min_value,
            max_value,
        }
    }

    fn duration_secs(&self) -> f64 {
        let digits: String = self.duration.chars().take_while(char::is_ascii_digit).collect();
        let unit = self.duration[digits.len()..].to_lowercase();
        let value: f64 = match digits.parse() {
            Ok(v) => v,
            Err(_) => return 3600.0,
        };
        match unit.chars().next() {
            Some('s') => value,
            Some('m') => value * 60.0,
            Some('h') => value * 3600.0,
            Some('d') => value * 86400.0,
            _ => 3600.0,
        }
    }
}

/// A quarter of the duration, in the unit that reads best.
pub fn auto_x_grid(duration: &str) -> String {
    let Some(caps) = duration_pattern().captures(duration) else {
        return "1h".to_string();
    };
    let value: f64 = caps[1].parse().unwrap_or(1.0);
    let quarter = value / 4.0;
    match &caps[2] {
        "h" if quarter >= 1.0 => format!("{}h", quarter.round()),
        "h" => format!("{}min", (quarter * 60.0).round()),
        "min" => format!("{}min", quarter.round()),
        _ => format!("{}h", (quarter * 24.0).round()),
    }
}

/// A "nice" step (1, 2 or 5 times a power of ten) splitting the range in about four.
pub fn auto_y_grid(min: f64, max: f64) -> String {
    let step = (max - min) / 4.0;
    if step <= 0.0 || !step.is_finite() {
        return "1".to_string();
    }
    let magnitude = 10f64.powf(step.log10().floor());
    let normalized = step / magnitude;
    let nice = if normalized <= 1.0 {
        magnitude
    } else if normalized <= 2.0 {
        2.0 * magnitude
    } else if normalized <= 5.0 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    };
    number(nice)
}

fn time_ago(secs: f64) -> String {
    if secs >= 3600.0 {
        format!("-{:.1}h", secs / 3600.0)
    } else if secs >= 60.0 {
        format!("-{:.0}m", secs / 60.0)
    } else {
        format!("-{secs:.0}s")
    }
}

impl WidgetPlugin for GraphPlugin {
    fn kind(&self) -> &'static str {
        "graph"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn collect_requirements(&self, _widget: &Widget, fonts: &mut FontRegistry) {
        fonts.add_font("Roboto", 400, 12, false);
    }

    fn on_export_components(&self, ctx: &mut SectionContext<'_>) {
        let widgets: Vec<&Widget> = ctx.widgets_of("graph").collect();
        if widgets.is_empty() {
            return;
        }

        let mut section = Section::list("graph");
        for widget in widgets {
            let spec = GraphSpec::from_widget(widget);
            let sensor = match qualified_entity(widget) {
                Some(entity) if widget.flag("is_local_sensor") => entity,
                Some(entity) => ctx.sensor_id(&entity, EntityKind::Numeric),
                None => "none".to_string(),
            };

            let mut trace = Node::map()
                .with("sensor", Node::scalar(sensor))
                .with("line_thickness", Node::scalar(spec.thickness));
            if spec.line_type != "SOLID" {
                trace.insert("line_type", Node::scalar(&spec.line_type));
            }
            if spec.continuous {
                trace.insert("continuous", Node::scalar(true));
            }

            let item = Node::map()
                .with("id", Node::scalar(&spec.id))
                .with("duration", Node::scalar(&spec.duration))
                .with("width", Node::scalar(widget.width))
                .with("height", Node::scalar(widget.height))
                .with("border", Node::scalar(spec.border))
                .with_opt("x_grid", spec.x_grid.as_ref().map(Node::scalar))
                .with_opt("y_grid", spec.y_grid.as_ref().map(Node::scalar))
                .with("traces", Node::list().item(trace))
                .with_opt("min_value", spec.min_value.map(|v| Node::scalar(number(v))))
                .with_opt("max_value", spec.max_value.map(|v| Node::scalar(number(v))))
                .with_opt(
                    "max_range",
                    widget.prop_f64("max_range").map(|v| Node::scalar(number(v))),
                )
                .with_opt(
                    "min_range",
                    widget.prop_f64("min_range").map(|v| Node::scalar(number(v))),
                );
            section.push(item);
        }
        ctx.push_section(section);
    }
}

impl DirectExport for GraphPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let (x, y, w, h) = (widget.x, widget.y, widget.width, widget.height);
        let color_prop = widget.prop_str_or("color", "black");
        let color = color_const(&color_prop);
        let font = ctx.font("Roboto", 400, 12, false);

        if widget.entity().is_none() {
            ctx.push(format!(
                "it.printf({x}+5, {y}+5, id({font}), {color}, TextAlign::TOP_LEFT, \"Graph (no entity)\");"
            ));
            return Ok(());
        }

        let spec = GraphSpec::from_widget(widget);
        ctx.push(format!("it.graph({x}, {y}, id({}));", spec.id));

        if spec.border {
            ctx.push(format!("for (int i = 0; i < {}; i++) {{", spec.thickness));
            ctx.push(format!(
                "  it.rectangle({x} + i, {y} + i, {w} - 2 * i, {h} - 2 * i, {color});"
            ));
            ctx.push("}");
            ctx.dither(&color_prop, x, y, w, h);
        }

        // dotted grid lines at the quarter marks
        if spec.y_grid.is_some() {
            for i in 1..4 {
                let offset = (f64::from(h) * f64::from(i) / 4.0).round() as i32;
                ctx.push(format!("for (int i = 0; i < {w}; i += 4) {{"));
                ctx.push(format!("  it.draw_pixel_at({x} + i, {}, {color});", y + offset));
                ctx.push("}");
            }
        }
        if spec.x_grid.is_some() {
            for i in 1..4 {
                let offset = (f64::from(w) * f64::from(i) / 4.0).round() as i32;
                ctx.push(format!("for (int i = 0; i < {h}; i += 4) {{"));
                ctx.push(format!("  it.draw_pixel_at({}, {y} + i, {color});", x + offset));
                ctx.push("}");
            }
        }

        if let Some(title) = widget.title.as_deref().filter(|t| !t.is_empty()) {
            ctx.push(format!(
                "it.printf({x}+4, {y}+2, id({font}), {color}, TextAlign::TOP_LEFT, \"{}\");",
                escape_printf(title)
            ));
        }

        let min = spec.min_value.unwrap_or(0.0);
        let span = spec.max_value.unwrap_or(100.0) - min;
        let fmt = if span >= 10.0 { "%.0f" } else { "%.1f" };
        for i in 0..=4 {
            let ratio = f64::from(i) / 4.0;
            let offset = (f64::from(h) * (1.0 - ratio)).round() as i32;
            ctx.push(format!(
                "it.printf({x} - 4, {y} + {offset} - 6, id({font}), {color}, TextAlign::TOP_RIGHT, \"{fmt}\", (float){});",
                number(min + span * ratio)
            ));
        }

        let total = spec.duration_secs();
        for i in 0..=2 {
            let ratio = f64::from(i) / 2.0;
            let offset = (f64::from(w) * ratio).round() as i32;
            let (align, label) = match i {
                0 => ("TextAlign::TOP_LEFT", time_ago(total)),
                2 => ("TextAlign::TOP_RIGHT", "Now".to_string()),
                _ => ("TextAlign::TOP_CENTER", time_ago(total * (1.0 - ratio))),
            };
            ctx.push(format!(
                "it.printf({x} + {offset}, {y} + {h} + 2, id({font}), {color}, {align}, \"{label}\");"
            ));
        }
        Ok(())
    }
}

// ============================================================================
// ondevice_temperature / ondevice_humidity
// ============================================================================

/// A reading from an on-board environment sensor.
#[derive(Debug)]
pub struct OnboardReading {
    kind: &'static str,
    sensor: &'static str,
    /// `(upper bound, glyph)` pairs, lowest first
    steps: [(i32, &'static str); 2],
    high: &'static str,
    unit: &'static str,
    precision: i64,
    label: &'static str,
}

static TEMPERATURE: OnboardReading = OnboardReading {
    kind: "ondevice_temperature",
    sensor: "onboard_temperature",
    steps: [(10, "F0E4C"), (25, "F050F")],
    high: "F10C2",
    unit: "°C",
    precision: 1,
    label: "Temperature",
};

static HUMIDITY: OnboardReading = OnboardReading {
    kind: "ondevice_humidity",
    sensor: "onboard_humidity",
    steps: [(30, "F0E7A"), (60, "F058E")],
    high: "F058C",
    unit: "%",
    precision: 0,
    label: "Humidity",
};

/// Icon plus value for one on-board reading.
#[derive(Debug)]
pub struct OnboardPlugin {
    reading: &'static OnboardReading,
}

impl OnboardPlugin {
    /// Creates the plugin for one reading.
    pub const fn new(reading: &'static OnboardReading) -> Self {
        Self { reading }
    }
}

impl WidgetPlugin for OnboardPlugin {
    fn kind(&self) -> &'static str {
        self.reading.kind
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        let size = prop_px(widget, "size", 32);
        for (_, code) in self.reading.steps {
            fonts.track_icon(code, size);
        }
        fonts.track_icon(self.reading.high, size);
        fonts.add_font("Roboto", 400, prop_px(widget, "font_size", 16), false);
    }
}

impl DirectExport for OnboardPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let r = self.reading;
        let size = prop_px(widget, "size", 32) as i32;
        let font_size = prop_px(widget, "font_size", 16) as i32;
        let icon_font = ctx.icon_font(size as u32);
        let value_font = ctx.font("Roboto", 400, font_size as u32, false);
        let color = color_const(&widget.prop_str_or("color", "black"));
        let unit = widget.prop_str_or("unit", r.unit);
        let precision = widget.prop_i64("precision").unwrap_or(r.precision).max(0);

        let cx = format!("{} + {}", widget.x, widget.width / 2);
        let icon_y = format!("{} + {}", widget.y, size / 2);
        let state = format!("id({}).state", r.sensor);

        for (i, (bound, code)) in r.steps.iter().enumerate() {
            let open = if i == 0 { "if" } else { "} else if" };
            ctx.push(format!("{open} ({state} <= {bound}) {{"));
            ctx.push(format!(
                "  it.printf({cx}, {icon_y}, id({icon_font}), {color}, TextAlign::CENTER, \"\\U000{code}\");"
            ));
        }
        ctx.push("} else {");
        ctx.push(format!(
            "  it.printf({cx}, {icon_y}, id({icon_font}), {color}, TextAlign::CENTER, \"\\U000{}\");",
            r.high
        ));
        ctx.push("}");

        let value = if unit == "°F" {
            format!("({state} * 9.0 / 5.0) + 32.0")
        } else {
            state
        };
        ctx.push(format!(
            "it.printf({cx}, {} + {}, id({value_font}), {color}, TextAlign::TOP_CENTER, \"%.{precision}f{}\", {value});",
            widget.y,
            size + 5,
            escape_printf(&unit)
        ));

        if widget.flag("show_label") {
            let label_font = ctx.font("Roboto", 400, prop_px(widget, "label_font_size", 10), false);
            ctx.push(format!(
                "it.printf({cx}, {} + {}, id({label_font}), {color}, TextAlign::TOP_CENTER, \"{}\");",
                widget.y,
                size + font_size + 8,
                r.label
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::entities::{EntityKey, EntityTable};
    use crate::compiler::triggers::TriggerMap;
    use crate::models::{HardwareProfile, Resolution};
    use crate::plugins::PluginWidget;

    fn profile() -> HardwareProfile {
        HardwareProfile::new("t", "T", "esp32", "st7789v", Resolution::default())
    }

    fn direct(plugin: &dyn DirectExport, widget: &Widget) -> Vec<String> {
        let profile = profile();
        let mut fonts = FontRegistry::new();
        let table = EntityTable::new();
        let mut ctx = DirectContext::new(&mut fonts, &table, &profile);
        plugin.export(widget, &mut ctx).unwrap();
        ctx.into_lines()
    }

    #[test]
    fn test_auto_grids() {
        assert_eq!(auto_x_grid("1h"), "15min");
        assert_eq!(auto_x_grid("24h"), "6h");
        assert_eq!(auto_x_grid("20min"), "5min");
        assert_eq!(auto_x_grid("2d"), "12h");
        assert_eq!(auto_x_grid("weird"), "1h");
        assert_eq!(auto_y_grid(0.0, 100.0), "50");
        assert_eq!(auto_y_grid(0.0, 40.0), "10");
        assert_eq!(auto_y_grid(15.0, 30.0), "5");
    }

    #[test]
    fn test_progress_bar_percentage_math() {
        let w = Widget::new("bar-1", "progress_bar", 0, 0, 200, 40)
            .with_entity("sensor.tank")
            .with_prop("min", 10)
            .with_prop("max", 60);
        let lines = direct(&ProgressBarPlugin, &w);
        assert_eq!(lines[0], "float val_bar_1 = id(sensor_tank).state;");
        assert_eq!(lines[1], "if (std::isnan(val_bar_1)) val_bar_1 = 10;");
        assert_eq!(lines[2], "float range_bar_1 = 60 - 10;");
        assert!(lines.contains(&"it.rectangle(0, 25, 200, 15, color_on);".to_string()));
    }

    #[test]
    fn test_progress_bar_without_entity() {
        let w = Widget::new("p", "progress_bar", 0, 0, 100, 30);
        let lines = direct(&ProgressBarPlugin, &w);
        assert_eq!(lines[0], "it.rectangle(0, 0 + 30 - 15, 100, 15, color_on);");
    }

    #[test]
    fn test_progress_bar_toolkit_requests_refresh() {
        let profile = profile();
        let mut fonts = FontRegistry::new();
        let mut triggers = TriggerMap::new();
        let table = EntityTable::new();
        let w = Widget::new("p", "progress_bar", 0, 0, 100, 30).with_entity("tank");
        let node = {
            let mut ctx = ToolkitContext::new(&mut fonts, &mut triggers, &table, &profile);
            ProgressBarPlugin.export_toolkit(&w, &mut ctx).unwrap()
        };
        assert_eq!(
            node.get("bar").and_then(|b| b.get("value")).and_then(Node::as_scalar),
            Some("!lambda \"return id(sensor_tank).state;\"")
        );
        assert_eq!(triggers.pending()[0].key.source, "sensor.tank");
    }

    #[test]
    fn test_graph_component_uses_declared_sensor() {
        let w = Widget::new("g1", "graph", 0, 0, 200, 100)
            .with_entity("sensor.power")
            .with_prop("duration", "4h")
            .with_prop("continuous", true);
        let widgets = [PluginWidget {
            kind: "graph",
            page: 0,
            widget: &w,
        }];
        let mut table = EntityTable::new();
        table.record(&EntityKey::new("sensor.power", None), "sensor_power", EntityKind::Numeric);
        let profile = profile();
        let mut ctx = SectionContext::new(&widgets, &mut table, &profile, false, 1);
        GraphPlugin.on_export_components(&mut ctx);
        let (_, sections) = ctx.into_parts();

        let graph = &sections[0];
        assert_eq!(graph.name, "graph");
        let item = &graph.items()[0];
        assert_eq!(item.get("id").and_then(Node::as_scalar), Some("graph_g1"));
        assert_eq!(item.get("x_grid").and_then(Node::as_scalar), Some("1h"));
        let trace = &item.get("traces").and_then(Node::as_list).unwrap()[0];
        assert_eq!(trace.get("sensor").and_then(Node::as_scalar), Some("sensor_power"));
        assert_eq!(trace.get("continuous").and_then(Node::as_scalar), Some("true"));
    }

    #[test]
    fn test_graph_direct_axis_labels() {
        let w = Widget::new("g1", "graph", 10, 10, 200, 100).with_entity("sensor.power");
        let lines = direct(&GraphPlugin, &w);
        assert_eq!(lines[0], "it.graph(10, 10, id(graph_g1));");
        assert!(lines.iter().any(|l| l.contains("\"-1.0h\"")));
        assert!(lines.iter().any(|l| l.contains("\"-30m\"")));
        assert!(lines.iter().any(|l| l.contains("\"Now\"")));
    }

    #[test]
    fn test_onboard_fahrenheit() {
        let w = Widget::new("t", "ondevice_temperature", 0, 0, 80, 80).with_prop("unit", "°F");
        let lines = direct(&OnboardPlugin::new(&TEMPERATURE), &w);
        assert_eq!(lines[0], "if (id(onboard_temperature).state <= 10) {");
        assert_eq!(lines[2], "} else if (id(onboard_temperature).state <= 25) {");
        assert!(lines
            .last()
            .unwrap()
            .ends_with("\"%.1f°F\", (id(onboard_temperature).state * 9.0 / 5.0) + 32.0);"));
    }

    #[test]
    fn test_onboard_humidity_label() {
        let w = Widget::new("h", "ondevice_humidity", 0, 0, 80, 80).with_prop("show_label", true);
        let lines = direct(&OnboardPlugin::new(&HUMIDITY), &w);
        assert!(lines.iter().any(|l| l.contains("\"%.0f%%\", id(onboard_humidity).state")));
        assert!(lines.last().unwrap().ends_with("\"Humidity\");"));
    }
}

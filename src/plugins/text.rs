//! Text widgets: static text, sensor values and the clock.

use super::{
    color_const, common_props, convert_color, escape_printf, format_opacity, is_gray, prop_px,
    qualified_entity, text_align, DirectContext, DirectExport, PluginRegistry, ToolkitContext,
    ToolkitExport, WidgetPlugin,
};
use crate::compiler::entities::{self, EntityKind};
use crate::compiler::fonts::FontRegistry;
use crate::compiler::ir::Node;
use crate::models::Widget;
use anyhow::Result;

pub(super) fn register(registry: &mut PluginRegistry) {
    registry.register(Box::new(TextPlugin));
    registry.register(Box::new(SensorTextPlugin));
    registry.register(Box::new(DateTimePlugin));
}

/// Splits text into lines that fit a width, using an average glyph width.
///
/// Explicit newlines are kept; words longer than a line are broken.
pub fn word_wrap(text: &str, max_width: i32, font_size: u32, family: &str) -> Vec<String> {
    let family = family.to_lowercase();
    let monospace = ["mono", "courier", "consolas"]
        .iter()
        .any(|m| family.contains(m));
    let avg = f64::from(font_size) * if monospace { 0.6 } else { 0.52 };
    let max_chars = (f64::from(max_width) / avg).floor() as usize;
    if max_chars == 0 {
        return vec![text.to_string()];
    }

    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.chars().count() <= max_chars {
            out.push(paragraph.to_string());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if word_len > max_chars {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                out.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
                continue;
            }
            let candidate_len = if current.is_empty() {
                word_len
            } else {
                current.chars().count() + 1 + word_len
            };
            if candidate_len <= max_chars {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            } else {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }

    if out.is_empty() {
        out.push(String::new());
    }
    out
}

/// Anchor point and `TextAlign` for a designer alignment inside a box.
fn anchor(widget: &Widget, align: &str) -> (i32, i32, String) {
    let (mut x, mut y) = (widget.x, widget.y);
    let mut horizontal = "LEFT";
    if align.contains("CENTER") {
        x = widget.x + widget.width / 2;
        horizontal = "CENTER";
    } else if align.contains("RIGHT") {
        x = widget.x + widget.width;
        horizontal = "RIGHT";
    }

    let vertical = if align.contains("BOTTOM") {
        y = widget.y + widget.height;
        "BOTTOM"
    } else if align.contains("TOP") {
        "TOP"
    } else {
        y = widget.y + widget.height / 2;
        "CENTER"
    };

    let text_align = if vertical == "CENTER" && horizontal == "CENTER" {
        "TextAlign::CENTER".to_string()
    } else {
        format!("TextAlign::{vertical}_{horizontal}")
    };
    (x, y, text_align)
}

fn font_weight(widget: &Widget) -> u32 {
    prop_px(widget, "font_weight", 400)
}

// ============================================================================
// text
// ============================================================================

/// Static text (`text`, alias `label`).
#[derive(Debug, Default)]
pub struct TextPlugin;

impl TextPlugin {
    fn content(widget: &Widget) -> String {
        widget
            .prop_str("text")
            .filter(|t| !t.is_empty())
            .or_else(|| widget.title.clone().filter(|t| !t.is_empty()))
            .unwrap_or_else(|| "Text".to_string())
    }

    fn size(widget: &Widget) -> u32 {
        let fallback = prop_px(widget, "value_font_size", 20);
        prop_px(widget, "font_size", fallback)
    }
}

impl WidgetPlugin for TextPlugin {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        fonts.add_font(
            &widget.prop_str_or("font_family", "Roboto"),
            font_weight(widget),
            Self::size(widget),
            widget.flag("italic"),
        );
    }
}

impl DirectExport for TextPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let family = widget.prop_str_or("font_family", "Roboto");
        let size = Self::size(widget);
        let font = ctx.font(&family, font_weight(widget), size, widget.flag("italic"));
        let color_prop = widget.prop_str_or("color", "theme_auto");
        let gray = ctx.is_epaper && is_gray(&color_prop);
        let color = if gray {
            "COLOR_BLACK".to_string()
        } else {
            color_const(&color_prop)
        };

        let (x, y, align) = anchor(widget, &widget.prop_str_or("text_align", "TOP_LEFT"));
        let text = Self::content(widget);
        let line_height = size as i32 + 4;
        let width = if widget.width > 0 { widget.width } else { 200 };

        for (i, line) in word_wrap(&text, width, size, &family).iter().enumerate() {
            ctx.push(format!(
                "it.printf({x}, {}, id({font}), {color}, {align}, \"{}\");",
                y + line_height * i as i32,
                escape_printf(line)
            ));
        }
        ctx.dither(&color_prop, widget.x, widget.y, widget.width, widget.height);
        Ok(())
    }
}

impl ToolkitExport for TextPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let font = ctx.font(
            &widget.prop_str_or("font_family", "Roboto"),
            font_weight(widget),
            Self::size(widget),
            widget.flag("italic"),
        );
        let color = widget
            .prop_str("color")
            .or_else(|| widget.prop_str("text_color"));
        let bg = widget
            .prop_str("bg_color")
            .filter(|c| !c.is_empty() && c != "transparent");

        let label = common_props(widget)
            .with("text", Node::quoted(&Self::content(widget)))
            .with("text_font", Node::scalar(font))
            .with("text_color", convert_color(color.as_deref()))
            .with(
                "text_align",
                Node::scalar(text_align(widget.prop_str("text_align").as_deref())),
            )
            .with_opt("bg_color", bg.map(|c| convert_color(Some(&c))))
            .with("opa", format_opacity(widget.props.get("opa")));
        Ok(Node::map().with("label", label))
    }
}

// ============================================================================
// sensor_text
// ============================================================================

/// Units guessed from the entity id when none is configured.
const UNIT_HINTS: [(&[&str], &str); 10] = [
    (&["_power", "_watt"], "W"),
    (&["_energy", "_kwh"], "kWh"),
    (&["_temperature", "_temp"], "°C"),
    (&["_humidity"], "%"),
    (&["_voltage", "_volt"], "V"),
    (&["_current", "_amp"], "A"),
    (&["_battery"], "%"),
    (&["_pressure", "_hpa"], "hPa"),
    (&["_speed", "_kmh"], "km/h"),
    (&["_percent", "_pct"], "%"),
];

/// One or two sensor values with an optional label and unit.
#[derive(Debug, Default)]
pub struct SensorTextPlugin;

/// A value placeholder and its printf argument.
struct ValueRef {
    id: String,
    text: bool,
}

impl ValueRef {
    fn format(&self, precision: i64) -> String {
        if self.text {
            "%s".to_string()
        } else {
            format!("%.{precision}f")
        }
    }

    fn arg(&self) -> String {
        if self.text {
            format!("id({}).state.c_str()", self.id)
        } else {
            format!("id({}).state", self.id)
        }
    }
}

/// Everything both exporters need to print a sensor value.
struct SensorLayout {
    format: String,
    title: String,
    values: Vec<ValueRef>,
    value_format: String,
}

impl SensorTextPlugin {
    fn forced_text(widget: &Widget) -> bool {
        widget.flag("is_text_sensor")
            || widget
                .prop_str("entity_kind")
                .and_then(|k| EntityKind::from_hint(&k))
                == Some(EntityKind::Text)
    }

    fn value_ref(
        widget: &Widget,
        entity: &str,
        attribute: Option<&str>,
        resolve: &dyn Fn(&str, Option<&str>, EntityKind) -> (String, EntityKind),
    ) -> ValueRef {
        if widget.flag("is_local_sensor") {
            return ValueRef {
                id: entity.to_string(),
                text: false,
            };
        }
        let text = Self::forced_text(widget) || entities::is_text_domain(entity);
        let fallback = if text {
            EntityKind::Text
        } else {
            EntityKind::Numeric
        };
        let (id, kind) = resolve(entity, attribute, fallback);
        ValueRef {
            id,
            text: kind == EntityKind::Text,
        }
    }

    fn unit(widget: &Widget, format: &str, entity: &str) -> String {
        if widget.flag("hide_unit") || format.ends_with("_no_unit") {
            return String::new();
        }
        if let Some(unit) = widget
            .prop_str("unit")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
        {
            return unit;
        }
        let lower = entity.to_lowercase();
        UNIT_HINTS
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
            .map(|(_, unit)| (*unit).to_string())
            .unwrap_or_default()
    }

    fn layout(
        widget: &Widget,
        entity: &str,
        resolve: &dyn Fn(&str, Option<&str>, EntityKind) -> (String, EntityKind),
        default_precision: i64,
    ) -> SensorLayout {
        let format = widget.prop_str_or("value_format", "label_value");
        let precision = widget
            .prop_i64("precision")
            .filter(|p| *p >= 0)
            .unwrap_or(default_precision);

        let mut values = vec![Self::value_ref(
            widget,
            entity,
            widget.prop_str("attribute").as_deref(),
            resolve,
        )];
        if let Some(second) = widget.entity2() {
            let second = if second.contains('.') || widget.flag("is_local_sensor") {
                second.to_string()
            } else {
                format!("sensor.{second}")
            };
            values.push(Self::value_ref(
                widget,
                &second,
                widget.prop_str("attribute2").as_deref(),
                resolve,
            ));
        }

        let mut title = widget
            .title
            .clone()
            .or_else(|| widget.prop_str("title"))
            .unwrap_or_default()
            .trim()
            .to_string();
        if title.is_empty() && format.starts_with("label_") {
            title = entity.rsplit('.').next().unwrap_or(entity).replace('_', " ");
        }

        let unit = Self::unit(widget, &format, entity);
        let separator = widget.prop_str_or("separator", " ~ ");
        let mut value_format = escape_printf(&widget.prop_str("prefix").unwrap_or_default());
        value_format.push_str(&values[0].format(precision));
        if let Some(second) = values.get(1) {
            value_format.push_str(&escape_printf(&separator));
            value_format.push_str(&second.format(precision));
        }
        if !unit.is_empty() {
            value_format.push(' ');
            value_format.push_str(&escape_printf(&unit));
        }
        value_format.push_str(&escape_printf(&widget.prop_str("postfix").unwrap_or_default()));

        SensorLayout {
            format,
            title: escape_printf(&title),
            values,
            value_format,
        }
    }

    fn entity(widget: &Widget) -> Option<String> {
        if widget.flag("is_local_sensor") {
            return Some(
                widget
                    .entity()
                    .unwrap_or("battery_level")
                    .to_string(),
            );
        }
        qualified_entity(widget)
    }

    fn fonts(widget: &Widget) -> (String, u32, u32, u32, bool) {
        (
            widget.prop_str_or("font_family", "Roboto"),
            font_weight(widget),
            prop_px(widget, "label_font_size", 14),
            prop_px(widget, "value_font_size", 20),
            widget.flag("italic"),
        )
    }
}

impl WidgetPlugin for SensorTextPlugin {
    fn kind(&self) -> &'static str {
        "sensor_text"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        let (family, weight, label_size, value_size, italic) = Self::fonts(widget);
        fonts.add_font(&family, weight, label_size, italic);
        fonts.add_font(&family, weight, value_size, italic);
    }
}

impl DirectExport for SensorTextPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let Some(entity) = Self::entity(widget) else {
            ctx.push("// Sensor ID missing for this widget");
            return Ok(());
        };

        let (family, weight, label_size, value_size, italic) = Self::fonts(widget);
        let label_font = ctx.font(&family, weight, label_size, italic);
        let value_font = ctx.font(&family, weight, value_size, italic);
        let color = color_const(&widget.prop_str_or("color", "black"));

        let layout = {
            let resolve = |s: &str, a: Option<&str>, k: EntityKind| ctx.sensor(s, a, k);
            Self::layout(widget, &entity, &resolve, 2)
        };
        let args = layout
            .values
            .iter()
            .map(ValueRef::arg)
            .collect::<Vec<_>>()
            .join(", ");

        let text_align = widget.prop_str_or("text_align", "TOP_LEFT");
        let (x, y, _) = anchor(widget, &text_align);
        let to_align = |a: String| {
            if a == "CENTER" {
                "TextAlign::CENTER".to_string()
            } else {
                format!("TextAlign::{a}")
            }
        };
        let label_align = to_align(widget.prop_str_or("label_align", &text_align));
        let value_align = to_align(widget.prop_str_or("value_align", &text_align));
        let (title, fmt) = (&layout.title, &layout.value_format);

        match layout.format.as_str() {
            "label_only" => ctx.push(format!(
                "it.printf({x}, {y}, id({label_font}), {color}, {label_align}, \"{title}\");"
            )),
            "value_only" | "value_only_no_unit" => ctx.push(format!(
                "it.printf({x}, {y}, id({value_font}), {color}, {value_align}, \"{fmt}\", {args});"
            )),
            _ if title.is_empty() => ctx.push(format!(
                "it.printf({x}, {y}, id({value_font}), {color}, {value_align}, \"{fmt}\", {args});"
            )),
            "label_newline_value" | "label_newline_value_no_unit" => {
                ctx.push(format!(
                    "it.printf({x}, {y}, id({label_font}), {color}, {label_align}, \"{title}\");"
                ));
                ctx.push(format!(
                    "it.printf({x}, {y} + {}, id({value_font}), {color}, {value_align}, \"{fmt}\", {args});",
                    label_size + 4
                ));
            }
            "value_label" => {
                ctx.push(format!(
                    "it.printf({x}, {y}, id({value_font}), {color}, {value_align}, \"{fmt}\", {args});"
                ));
                let offset = (f64::from(value_size) * 0.6 * 6.0).round() as i64 + 10;
                ctx.push(format!(
                    "it.printf({x} + {offset}, {y}, id({label_font}), {color}, {label_align}, \"{title}\");"
                ));
            }
            _ => {
                let colon = if title.ends_with(':') { "" } else { ":" };
                ctx.push(format!(
                    "it.printf({x}, {y}, id({value_font}), {color}, {value_align}, \"{title}{colon} {fmt}\", {args});"
                ));
            }
        }
        Ok(())
    }
}

impl ToolkitExport for SensorTextPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let (family, weight, _, value_size, italic) = Self::fonts(widget);
        let font = ctx.font(&family, weight, value_size, italic);
        let Some(entity) = Self::entity(widget) else {
            return Ok(Node::map().with(
                "label",
                common_props(widget).with("text", Node::quoted("---")),
            ));
        };

        let layout = {
            let resolve = |s: &str, a: Option<&str>, k: EntityKind| ctx.sensor(s, a, k);
            Self::layout(widget, &entity, &resolve, 1)
        };
        let text = match layout.format.as_str() {
            "label_only" => layout.title.clone(),
            "label_newline_value" | "label_newline_value_no_unit" => {
                format!("{}\\n{}", layout.title, layout.value_format)
            }
            "value_label" => format!("{} {}", layout.value_format, layout.title),
            "value_only" | "value_only_no_unit" => layout.value_format.clone(),
            _ if layout.title.is_empty() => layout.value_format.clone(),
            _ => format!("{}: {}", layout.title, layout.value_format),
        };
        let guard = layout
            .values
            .iter()
            .map(|v| format!("id({}).has_state()", v.id))
            .collect::<Vec<_>>()
            .join(" && ");
        let args = layout
            .values
            .iter()
            .map(ValueRef::arg)
            .collect::<Vec<_>>()
            .join(", ");

        if !widget.flag("is_local_sensor") {
            ctx.request_trigger(
                &entity,
                Node::map().with("lvgl.widget.refresh", Node::scalar(&widget.id)),
            );
        }

        let label = common_props(widget)
            .with(
                "text",
                Node::lambda([
                    format!("if ({guard}) {{"),
                    format!("  return str_sprintf(\"{text}\", {args});"),
                    "}".to_string(),
                    "return std::string(\"---\");".to_string(),
                ]),
            )
            .with("text_font", Node::scalar(font))
            .with("text_color", convert_color(widget.prop_str("color").as_deref()))
            .with(
                "text_align",
                Node::scalar(text_align(widget.prop_str("text_align").as_deref())),
            )
            .with("opa", format_opacity(widget.props.get("opa")));
        Ok(Node::map().with("label", label))
    }
}

// ============================================================================
// datetime
// ============================================================================

/// Clock and date from the `ha_time` source.
#[derive(Debug, Default)]
pub struct DateTimePlugin;

impl DateTimePlugin {
    fn sizes(widget: &Widget) -> (u32, u32) {
        (
            prop_px(widget, "time_font_size", 28),
            prop_px(widget, "date_font_size", 16),
        )
    }
}

impl WidgetPlugin for DateTimePlugin {
    fn kind(&self) -> &'static str {
        "datetime"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        let family = widget.prop_str_or("font_family", "Roboto");
        let (time_size, date_size) = Self::sizes(widget);
        fonts.add_font(&family, 700, time_size, widget.flag("italic"));
        fonts.add_font(&family, 400, date_size, widget.flag("italic"));
    }
}

impl DirectExport for DateTimePlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let family = widget.prop_str_or("font_family", "Roboto");
        let italic = widget.flag("italic");
        let (time_size, date_size) = Self::sizes(widget);
        let time_font = ctx.font(&family, 700, time_size, italic);
        let date_font = ctx.font(&family, 400, date_size, italic);
        let color = color_const(&widget.prop_str_or("color", "black"));

        let (x, align) = match widget.prop_str_or("text_align", "CENTER").as_str() {
            "LEFT" => (widget.x, "TextAlign::TOP_LEFT"),
            "RIGHT" => (widget.x + widget.width, "TextAlign::TOP_RIGHT"),
            _ => (widget.x + widget.width / 2, "TextAlign::CENTER"),
        };
        let single_y = if align == "TextAlign::CENTER" {
            widget.y + widget.height / 2
        } else {
            widget.y
        };

        ctx.push("{");
        ctx.push("  auto now = id(ha_time).now();");
        let mut strftime = |y: String, font: &str, fmt: &str| {
            ctx.push(format!(
                "  it.strftime({x}, {y}, id({font}), {color}, {align}, \"{fmt}\", now);"
            ));
        };
        match widget.prop_str_or("format", "time_date").as_str() {
            "time_only" => strftime(single_y.to_string(), &time_font, "%H:%M"),
            "date_only" => strftime(single_y.to_string(), &date_font, "%d.%m.%Y"),
            "weekday_day_month" => strftime(single_y.to_string(), &date_font, "%A %d %B"),
            _ => {
                let total = (time_size + date_size + 2) as i32;
                let start = widget.y + (widget.height - total) / 2;
                strftime(start.to_string(), &time_font, "%H:%M");
                strftime(format!("{start} + {}", time_size + 2), &date_font, "%a, %b %d");
            }
        }
        ctx.push("}");
        Ok(())
    }
}

impl ToolkitExport for DateTimePlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let format = widget.prop_str_or("format", "time_date");
        let fmt = match format.as_str() {
            "date_only" => "%d.%m.%Y",
            "weekday_day_month" => "%A %d %B",
            "time_date" => "%H:%M\\n%a, %b %d",
            _ => "%H:%M",
        };
        let (time_size, date_size) = Self::sizes(widget);
        let is_date = matches!(format.as_str(), "date_only" | "weekday_day_month");
        let (size, weight) = if is_date {
            (date_size, 400)
        } else {
            (time_size, 700)
        };
        let font = ctx.font(
            &widget.prop_str_or("font_family", "Roboto"),
            weight,
            size,
            widget.flag("italic"),
        );

        let label = common_props(widget)
            .with(
                "text",
                Node::lambda([
                    "auto now = id(ha_time).now();".to_string(),
                    format!("return now.strftime(\"{fmt}\");"),
                ]),
            )
            .with("text_font", Node::scalar(font))
            .with("text_color", convert_color(widget.prop_str("color").as_deref()))
            .with(
                "text_align",
                Node::scalar(text_align(Some(&widget.prop_str_or("text_align", "CENTER")))),
            )
            .with("opa", format_opacity(widget.props.get("opa")));
        Ok(Node::map().with("label", label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::entities::{EntityKey, EntityTable};
    use crate::compiler::triggers::TriggerMap;
    use crate::models::{HardwareProfile, Resolution};

    fn profile() -> HardwareProfile {
        let mut p =
            HardwareProfile::new("t", "T", "esp32", "waveshare_epaper", Resolution::default());
        p.features.epaper = true;
        p
    }

    fn direct(plugin: &dyn DirectExport, widget: &Widget, table: &EntityTable) -> Vec<String> {
        let profile = profile();
        let mut fonts = FontRegistry::new();
        let mut ctx = DirectContext::new(&mut fonts, table, &profile);
        plugin.export(widget, &mut ctx).unwrap();
        ctx.into_lines()
    }

    #[test]
    fn test_word_wrap() {
        assert_eq!(word_wrap("Hello", 200, 20, "Roboto"), vec!["Hello"]);
        // 100px at 20px Roboto fits 9 characters
        assert_eq!(
            word_wrap("one two three four", 100, 20, "Roboto"),
            vec!["one two", "three", "four"]
        );
        assert_eq!(
            word_wrap("abcdefghijkl", 100, 20, "Roboto"),
            vec!["abcdefghi", "jkl"]
        );
        assert_eq!(word_wrap("a\nb", 200, 20, "Roboto"), vec!["a", "b"]);
    }

    #[test]
    fn test_anchor() {
        let w = Widget::new("t", "text", 10, 20, 100, 40);
        assert_eq!(anchor(&w, "TOP_LEFT"), (10, 20, "TextAlign::TOP_LEFT".into()));
        assert_eq!(anchor(&w, "CENTER"), (60, 40, "TextAlign::CENTER".into()));
        assert_eq!(
            anchor(&w, "BOTTOM_RIGHT"),
            (110, 60, "TextAlign::BOTTOM_RIGHT".into())
        );
    }

    #[test]
    fn test_text_direct_escapes() {
        let w = Widget::new("t1", "text", 10, 20, 300, 30)
            .with_prop("text", "50% \"off\"")
            .with_prop("color", "black");
        let lines = direct(&TextPlugin, &w, &EntityTable::new());
        assert_eq!(
            lines,
            vec![
                "it.printf(10, 20, id(font_roboto_400_20), COLOR_BLACK, TextAlign::TOP_LEFT, \"50%% \\\"off\\\"\");"
            ]
        );
    }

    #[test]
    fn test_gray_text_is_dithered_on_epaper() {
        let w = Widget::new("t1", "text", 0, 0, 300, 30).with_prop("color", "gray");
        let lines = direct(&TextPlugin, &w, &EntityTable::new());
        assert!(lines[0].contains("COLOR_BLACK"));
        assert_eq!(lines[1], "apply_grey_dither_mask(0, 0, 300, 30);");
    }

    #[test]
    fn test_sensor_text_label_value() {
        let w = Widget::new("s1", "sensor_text", 0, 0, 200, 40)
            .with_entity("outdoor_temperature")
            .with_prop("precision", 1);
        let lines = direct(&SensorTextPlugin, &w, &EntityTable::new());
        assert_eq!(
            lines,
            vec![
                "it.printf(0, 0, id(font_roboto_400_20), COLOR_BLACK, TextAlign::TOP_LEFT, \"outdoor temperature: %.1f °C\", id(sensor_outdoor_temperature).state);"
            ]
        );
    }

    #[test]
    fn test_sensor_text_uses_declared_text_id() {
        let mut table = EntityTable::new();
        table.record(
            &EntityKey::new("sensor.washer", None),
            "sensor_washer_txt",
            EntityKind::Text,
        );
        let w = Widget::new("s1", "sensor_text", 0, 0, 200, 40)
            .with_entity("sensor.washer")
            .with_prop("value_format", "value_only");
        let lines = direct(&SensorTextPlugin, &w, &table);
        assert!(lines[0].ends_with("\"%s\", id(sensor_washer_txt).state.c_str());"));
    }

    #[test]
    fn test_sensor_text_missing_entity() {
        let w = Widget::new("s1", "sensor_text", 0, 0, 200, 40);
        let lines = direct(&SensorTextPlugin, &w, &EntityTable::new());
        assert_eq!(lines, vec!["// Sensor ID missing for this widget"]);
    }

    #[test]
    fn test_sensor_text_toolkit_requests_refresh() {
        let profile = profile();
        let mut fonts = FontRegistry::new();
        let mut triggers = TriggerMap::new();
        let table = EntityTable::new();
        let w = Widget::new("s1", "sensor_text", 0, 0, 200, 40).with_entity("sensor.temp");

        let node = {
            let mut ctx = ToolkitContext::new(&mut fonts, &mut triggers, &table, &profile);
            SensorTextPlugin.export_toolkit(&w, &mut ctx).unwrap()
        };
        assert!(node.get("label").and_then(|l| l.get("text")).is_some());
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers.pending()[0].key.source, "sensor.temp");
    }

    #[test]
    fn test_datetime_direct() {
        let w = Widget::new("d1", "datetime", 0, 0, 200, 60).with_prop("format", "time_only");
        let lines = direct(&DateTimePlugin, &w, &EntityTable::new());
        assert_eq!(lines[0], "{");
        assert_eq!(
            lines[2],
            "  it.strftime(100, 30, id(font_roboto_700_28), COLOR_BLACK, TextAlign::CENTER, \"%H:%M\", now);"
        );
        assert_eq!(lines[3], "}");
    }
}

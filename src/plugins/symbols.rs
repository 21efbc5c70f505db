//! Icon glyph widgets: static icons, weather, battery and Wi-Fi strength.

use super::{
    color_const, common_props, convert_color, format_opacity, prop_px, qualified_entity,
    DirectContext, DirectExport, PluginRegistry, SectionContext, ToolkitContext, ToolkitExport,
    WidgetPlugin,
};
use crate::compiler::entities::{sanitize, EntityKey, EntityKind};
use crate::compiler::fonts::FontRegistry;
use crate::compiler::icons::{self, WEATHER_CONDITIONS, WEATHER_FALLBACK};
use crate::compiler::ir::Node;
use crate::models::Widget;
use anyhow::{bail, Result};

pub(super) fn register(registry: &mut PluginRegistry) {
    registry.register(Box::new(IconPlugin));
    registry.register(Box::new(WeatherIconPlugin));
    registry.register(Box::new(BatteryIconPlugin));
    registry.register(Box::new(WifiSignalPlugin));
}

/// C++/YAML escape for a glyph code (`\U000F0595`).
pub fn glyph(code: &str) -> String {
    format!("\\U000{code}")
}

fn is_glyph_code(value: &str) -> bool {
    value.len() == 5
        && value.starts_with('F')
        && value.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalizes an icon property (`0xF0595`, `f0595`, `mdi:home`) to a code.
pub fn icon_code(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let upper = trimmed.to_uppercase();
    let code = upper.strip_prefix("0X").unwrap_or(&upper);
    if is_glyph_code(code) {
        return Some(code.to_string());
    }
    icons::resolve(trimmed).map(str::to_string)
}

fn icon_label(widget: &Widget, text: Node, font: String, color: Node) -> Node {
    Node::map().with(
        "label",
        common_props(widget)
            .with("text", text)
            .with("text_font", Node::scalar(font))
            .with("text_color", color)
            .with("text_align", Node::scalar("CENTER"))
            .with("opa", format_opacity(widget.props.get("opa"))),
    )
}

// ============================================================================
// icon
// ============================================================================

/// A single static glyph.
#[derive(Debug, Default)]
pub struct IconPlugin;

impl IconPlugin {
    fn code(widget: &Widget) -> Result<String> {
        let raw = widget.prop_str_or("code", "F0595");
        match icon_code(&raw) {
            Some(code) => Ok(code),
            None => bail!("Unknown icon '{}'", raw),
        }
    }
}

impl WidgetPlugin for IconPlugin {
    fn kind(&self) -> &'static str {
        "icon"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        fonts.track_icon(&widget.prop_str_or("code", "F0595"), prop_px(widget, "size", 48));
    }
}

impl DirectExport for IconPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let code = Self::code(widget)?;
        let size = prop_px(widget, "size", 48);
        let font = ctx.icon_font(size);
        ctx.track_icon(&code, size);
        let color = color_const(&widget.prop_str_or("color", "black"));
        ctx.push(format!(
            "it.printf({}, {}, id({font}), {color}, \"%s\", \"{}\");",
            widget.x,
            widget.y,
            glyph(&code)
        ));
        Ok(())
    }
}

impl ToolkitExport for IconPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let code = Self::code(widget)?;
        let font = ctx.icon_font(prop_px(widget, "size", 48));
        Ok(icon_label(
            widget,
            Node::scalar(format!("\"{}\"", glyph(&code))),
            font,
            convert_color(widget.prop_str("color").as_deref()),
        ))
    }
}

// ============================================================================
// weather_icon
// ============================================================================

/// Glyph picked from the state of a weather entity.
#[derive(Debug, Default)]
pub struct WeatherIconPlugin;

impl WeatherIconPlugin {
    fn entity(widget: &Widget) -> String {
        widget
            .entity()
            .map(str::to_string)
            .or_else(|| widget.prop_str("weather_entity"))
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "weather.forecast_home".to_string())
    }

    /// Id under which the weather state is declared.
    pub fn sensor_id(entity: &str) -> String {
        format!("{}_text_sensor", sanitize(entity))
    }
}

impl WidgetPlugin for WeatherIconPlugin {
    fn kind(&self) -> &'static str {
        "weather_icon"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        let size = prop_px(widget, "size", 48);
        for (_, code) in WEATHER_CONDITIONS {
            fonts.track_icon(code, size);
        }
    }

    fn on_export_text_sensors(&self, ctx: &mut SectionContext<'_>) {
        let entities: Vec<String> = ctx.widgets_of("weather_icon").map(Self::entity).collect();
        for entity in entities {
            let id = Self::sensor_id(&entity);
            ctx.declare_as(
                &EntityKey::new(entity.as_str(), None),
                &id,
                EntityKind::Text,
                Vec::new(),
            );
        }
    }
}

impl DirectExport for WeatherIconPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let entity = Self::entity(widget);
        let (id, _) = ctx.sensor(&entity, None, EntityKind::Text);
        let font = ctx.icon_font(prop_px(widget, "size", 48));
        let color = color_const(&widget.prop_str_or("color", "black"));

        ctx.push("{");
        ctx.push(format!("  std::string weather_state = id({id}).state;"));
        ctx.push(format!("  const char* icon = \"{}\";", glyph(WEATHER_FALLBACK)));
        for (i, (condition, code)) in WEATHER_CONDITIONS.iter().enumerate() {
            let keyword = if i == 0 { "if" } else { "else if" };
            ctx.push(format!(
                "  {keyword} (weather_state == \"{condition}\") icon = \"{}\";",
                glyph(code)
            ));
        }
        ctx.push(format!(
            "  it.printf({}, {}, id({font}), {color}, \"%s\", icon);",
            widget.x, widget.y
        ));
        ctx.push("}");
        Ok(())
    }
}

impl ToolkitExport for WeatherIconPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let entity = Self::entity(widget);
        let (id, _) = ctx.sensor(&entity, None, EntityKind::Text);
        let font = ctx.icon_font(prop_px(widget, "size", 48));

        let mut lines = vec![format!("std::string ws = id({id}).state;")];
        lines.extend(WEATHER_CONDITIONS.iter().map(|(condition, code)| {
            format!("if (ws == \"{condition}\") return \"{}\";", glyph(code))
        }));
        lines.push(format!("return \"{}\";", glyph(WEATHER_FALLBACK)));

        ctx.request_trigger(
            &entity,
            Node::map().with("lvgl.widget.refresh", Node::scalar(&widget.id)),
        );
        Ok(icon_label(
            widget,
            Node::lambda(lines),
            font,
            convert_color(widget.prop_str("color").as_deref()),
        ))
    }
}

// ============================================================================
// Level icons (battery, wifi)
// ============================================================================

/// A glyph chosen by comparing a numeric state against descending thresholds.
struct LevelIcon {
    /// Local variable holding the level
    var: &'static str,
    /// `(minimum, glyph)` pairs, highest first
    steps: &'static [(i32, &'static str)],
    /// Glyph below the last step and when the state is missing
    fallback: &'static str,
    /// Value substituted for NaN
    nan_value: i32,
    /// printf format of the caption
    caption: &'static str,
}

const BATTERY: LevelIcon = LevelIcon {
    var: "bat_level",
    steps: &[
        (95, "F0079"),
        (85, "F0082"),
        (75, "F0081"),
        (65, "F0080"),
        (55, "F007F"),
        (45, "F007E"),
        (35, "F007D"),
        (25, "F007C"),
        (15, "F007B"),
        (5, "F007A"),
    ],
    fallback: "F0083",
    nan_value: 0,
    caption: "%.0f%%",
};

const WIFI: LevelIcon = LevelIcon {
    var: "signal",
    steps: &[(-50, "F0928"), (-60, "F0925"), (-75, "F0922"), (-100, "F091F")],
    fallback: "F092B",
    nan_value: -100,
    caption: "%.0fdB",
};

/// Geometry and fonts shared by both exporters.
struct LevelLayout {
    size: u32,
    font_size: u32,
    show_caption: bool,
}

impl LevelIcon {
    fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps
            .iter()
            .map(|(_, code)| *code)
            .chain(std::iter::once(self.fallback))
    }

    fn track(&self, fonts: &mut FontRegistry, layout: &LevelLayout) {
        fonts.add_font("Roboto", 400, layout.font_size, false);
        for code in self.codes() {
            fonts.track_icon(code, layout.size);
        }
    }

    fn direct(
        &self,
        widget: &Widget,
        sensor: &str,
        layout: &LevelLayout,
        ctx: &mut DirectContext<'_>,
    ) {
        let icon_font = ctx.icon_font(layout.size);
        let caption_font = ctx.font("Roboto", 400, layout.font_size, false);
        let color = color_const(&widget.prop_str_or("color", "black"));
        let var = self.var;

        let content = if layout.show_caption {
            layout.size + 2 + layout.font_size
        } else {
            layout.size
        };
        let padding = format!("({} - {content}) / 2", widget.height);
        let center_x = format!("{} + {} / 2", widget.x, widget.width);
        let icon_y = format!("{} + {padding}", widget.y);
        let text_y = format!("{} + {padding} + {} + 2", widget.y, layout.size);

        ctx.push("{");
        ctx.push(format!("  const char* icon = \"{}\";", glyph(self.fallback)));
        ctx.push(format!("  float {var} = {};", self.nan_value));
        ctx.push(format!("  if (id({sensor}).has_state()) {{"));
        ctx.push(format!("    {var} = id({sensor}).state;"));
        ctx.push(format!("    if (std::isnan({var})) {var} = {};", self.nan_value));
        for (i, (min, code)) in self.steps.iter().enumerate() {
            let keyword = if i == 0 { "if" } else { "else if" };
            ctx.push(format!("    {keyword} ({var} >= {min}) icon = \"{}\";", glyph(code)));
        }
        ctx.push(format!("    else icon = \"{}\";", glyph(self.fallback)));
        ctx.push("  }");
        ctx.push(format!(
            "  it.printf({center_x}, {icon_y}, id({icon_font}), {color}, TextAlign::TOP_CENTER, \"%s\", icon);"
        ));
        if layout.show_caption {
            ctx.push(format!("  if (id({sensor}).has_state()) {{"));
            ctx.push(format!(
                "    it.printf({center_x}, {text_y}, id({caption_font}), {color}, TextAlign::TOP_CENTER, \"{}\", {var});",
                self.caption
            ));
            ctx.push("  }");
        }
        ctx.push("}");
    }

    fn toolkit(
        &self,
        widget: &Widget,
        sensor: &str,
        layout: &LevelLayout,
        ctx: &mut ToolkitContext<'_>,
    ) -> Node {
        let icon_font = ctx.icon_font(layout.size);
        let caption_font = ctx.font("Roboto", 400, layout.font_size, false);
        let color = convert_color(widget.prop_str("color").as_deref());

        let mut icon_lines = vec![
            format!("if (id({sensor}).has_state()) {{"),
            format!("  float lvl = id({sensor}).state;"),
        ];
        icon_lines.extend(
            self.steps
                .iter()
                .map(|(min, code)| format!("  if (lvl >= {min}) return \"{}\";", glyph(code))),
        );
        icon_lines.push("}".to_string());
        icon_lines.push(format!("return \"{}\";", glyph(self.fallback)));

        let mut children = Node::list().item(Node::map().with(
            "label",
            Node::map()
                .with("width", Node::scalar(layout.size + 10))
                .with("height", Node::scalar(layout.size + 4))
                .with("align", Node::scalar("TOP_MID"))
                .with("text", Node::lambda(icon_lines))
                .with("text_font", Node::scalar(icon_font))
                .with("text_color", color.clone()),
        ));

        if layout.show_caption {
            let missing = self.caption.replace("%.0f", "---").replace("%%", "%");
            children.push(Node::map().with(
                "label",
                Node::map()
                    .with("width", Node::scalar("100%"))
                    .with("height", Node::scalar(layout.font_size + 4))
                    .with("align", Node::scalar("BOTTOM_MID"))
                    .with("y", Node::scalar(2))
                    .with(
                        "text",
                        Node::lambda([
                            format!("if (id({sensor}).has_state()) {{"),
                            format!(
                                "  return str_sprintf(\"{}\", id({sensor}).state);",
                                self.caption
                            ),
                            "}".to_string(),
                            format!("return std::string(\"{missing}\");"),
                        ]),
                    )
                    .with("text_font", Node::scalar(caption_font))
                    .with("text_color", color)
                    .with("text_align", Node::scalar("CENTER")),
            ));
        }

        Node::map().with(
            "obj",
            common_props(widget)
                .with("bg_opa", Node::scalar("TRANSP"))
                .with("border_width", Node::scalar(0))
                .with("widgets", children),
        )
    }
}

fn level_layout(widget: &Widget, show_caption: bool) -> LevelLayout {
    LevelLayout {
        size: prop_px(widget, "size", 24),
        font_size: prop_px(widget, "font_size", 12),
        show_caption,
    }
}

/// Declares the Home Assistant source of every remote level widget.
fn declare_remote(ctx: &mut SectionContext<'_>, kind: &str, is_local: fn(&Widget) -> bool) {
    let remote: Vec<String> = ctx
        .widgets_of(kind)
        .filter(|w| !is_local(w))
        .filter_map(qualified_entity)
        .collect();
    for entity in remote {
        ctx.declare(&EntityKey::new(entity, None), EntityKind::Numeric);
    }
}

/// Battery level glyph with a percentage caption.
#[derive(Debug, Default)]
pub struct BatteryIconPlugin;

impl BatteryIconPlugin {
    fn is_local(widget: &Widget) -> bool {
        widget.flag("is_local_sensor") || widget.entity().is_none()
    }

    fn sensor(widget: &Widget, resolve: impl Fn(&str) -> String) -> String {
        match qualified_entity(widget).filter(|_| !Self::is_local(widget)) {
            Some(entity) => resolve(&entity),
            None => "battery_level".to_string(),
        }
    }
}

impl WidgetPlugin for BatteryIconPlugin {
    fn kind(&self) -> &'static str {
        "battery_icon"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        BATTERY.track(fonts, &level_layout(widget, true));
    }

    fn on_export_numeric_sensors(&self, ctx: &mut SectionContext<'_>) {
        declare_remote(ctx, "battery_icon", Self::is_local);
    }
}

impl DirectExport for BatteryIconPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let sensor = Self::sensor(widget, |e| ctx.sensor(e, None, EntityKind::Numeric).0);
        BATTERY.direct(widget, &sensor, &level_layout(widget, true), ctx);
        Ok(())
    }
}

impl ToolkitExport for BatteryIconPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let sensor = Self::sensor(widget, |e| ctx.sensor(e, None, EntityKind::Numeric).0);
        if let Some(entity) = qualified_entity(widget).filter(|_| !Self::is_local(widget)) {
            ctx.request_trigger(
                &entity,
                Node::map().with("lvgl.widget.refresh", Node::scalar(&widget.id)),
            );
        }
        Ok(BATTERY.toolkit(widget, &sensor, &level_layout(widget, true), ctx))
    }
}

/// Wi-Fi strength glyph with an optional dB caption.
#[derive(Debug, Default)]
pub struct WifiSignalPlugin;

impl WifiSignalPlugin {
    fn is_local(widget: &Widget) -> bool {
        widget.prop_bool("is_local_sensor") != Some(false) || widget.entity().is_none()
    }

    fn sensor(widget: &Widget, resolve: impl Fn(&str) -> String) -> String {
        match qualified_entity(widget).filter(|_| !Self::is_local(widget)) {
            Some(entity) => resolve(&entity),
            None => "wifi_signal_dbm".to_string(),
        }
    }

    fn show_dbm(widget: &Widget) -> bool {
        widget.prop_bool("show_dbm") != Some(false)
    }
}

impl WidgetPlugin for WifiSignalPlugin {
    fn kind(&self) -> &'static str {
        "wifi_signal"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        WIFI.track(fonts, &level_layout(widget, Self::show_dbm(widget)));
    }

    fn on_export_numeric_sensors(&self, ctx: &mut SectionContext<'_>) {
        declare_remote(ctx, "wifi_signal", Self::is_local);
        if ctx.widgets_of("wifi_signal").any(Self::is_local) {
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

impl DirectExport for WifiSignalPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let sensor = Self::sensor(widget, |e| ctx.sensor(e, None, EntityKind::Numeric).0);
        WIFI.direct(widget, &sensor, &level_layout(widget, Self::show_dbm(widget)), ctx);
        Ok(())
    }
}

impl ToolkitExport for WifiSignalPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let sensor = Self::sensor(widget, |e| ctx.sensor(e, None, EntityKind::Numeric).0);
        Ok(WIFI.toolkit(widget, &sensor, &level_layout(widget, Self::show_dbm(widget)), ctx))
    }
}

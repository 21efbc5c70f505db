//! Widget plugin contract.
//!
//! Every widget type is implemented by a plugin. A plugin advertises the
//! rendering paths it supports through typed capability accessors
//! ([`WidgetPlugin::direct`] and [`WidgetPlugin::toolkit`]) and may hook into
//! section emission to declare the sensors, globals and components its
//! widgets depend on. All hooks are optional.
//!
//! The [`PluginRegistry`] dispatches on the widget `type` tag and resolves
//! aliases such as `label` → `text`.

pub mod lvgl;
pub mod media;
pub mod panels;
pub mod sensors;
pub mod shapes;
pub mod symbols;
pub mod templates;
pub mod text;

use crate::compiler::entities::{self, EntityKey, EntityKind, EntityTable};
use crate::compiler::fonts::{icon_font_id, FontRegistry, ICON_FAMILY};
use crate::compiler::ir::{Node, Section};
use crate::compiler::triggers::TriggerMap;
use crate::models::{HardwareProfile, Widget};
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;

/// Component plugins emitted ahead of the alphabetical rest.
const COMPONENT_PRIORITY: [&str; 4] = ["image", "online_image", "graph", "qr_code"];

/// Widget types without a toolkit exporter that still get a generic object.
const GENERIC_OBJECT_TYPES: [&str; 3] = ["rounded_rect", "line", "progress_bar"];

// ============================================================================
// Contexts
// ============================================================================

/// A visible widget together with its canonical plugin kind.
#[derive(Debug, Clone, Copy)]
pub struct PluginWidget<'a> {
    /// Canonical type after alias resolution
    pub kind: &'a str,
    /// Index of the page the widget lives on
    pub page: usize,
    /// The widget itself
    pub widget: &'a Widget,
}

/// State handed to the section hooks.
///
/// Declarations pushed here are recorded in the shared entity table so the
/// safety-net scans never declare the same reference again.
pub struct SectionContext<'a> {
    widgets: &'a [PluginWidget<'a>],
    entities: &'a mut EntityTable,
    /// Effective hardware profile
    pub profile: &'a HardwareProfile,
    /// True when the toolkit snippet owns rendering
    pub toolkit_mode: bool,
    /// Number of pages in the project
    pub page_count: usize,
    items: Vec<Node>,
    sections: Vec<Section>,
}

impl<'a> SectionContext<'a> {
    /// Creates a context over the visible widgets of a project.
    pub fn new(
        widgets: &'a [PluginWidget<'a>],
        entities: &'a mut EntityTable,
        profile: &'a HardwareProfile,
        toolkit_mode: bool,
        page_count: usize,
    ) -> Self {
        Self {
            widgets,
            entities,
            profile,
            toolkit_mode,
            page_count,
            items: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Visible widgets of one canonical kind, in page order.
    pub fn widgets_of<'k>(&'k self, kind: &'k str) -> impl Iterator<Item = &'a Widget> + 'k {
        self.widgets
            .iter()
            .filter(move |pw| pw.kind == kind)
            .map(|pw| pw.widget)
    }

    /// Declares a `homeassistant` reference under its generated id.
    ///
    /// Returns false when the reference was already declared.
    pub fn declare(&mut self, key: &EntityKey, kind: EntityKind) -> bool {
        match self.entities.declare(key, kind) {
            Some(node) => {
                self.items.push(node);
                true
            }
            None => false,
        }
    }

    /// Declares a `homeassistant` reference under a custom id.
    ///
    /// Extra keys are appended after the standard ones. Returns false when the
    /// key or the id was already declared.
    pub fn declare_as(
        &mut self,
        key: &EntityKey,
        id: &str,
        kind: EntityKind,
        extra: Vec<(&str, Node)>,
    ) -> bool {
        if self.entities.is_seen(key, id) {
            return false;
        }
        self.entities.record(key, id, kind);
        let mut node = entities::homeassistant_declaration(key, id);
        for (k, v) in extra {
            node.insert(k, v);
        }
        self.items.push(node);
        true
    }

    /// Component id of a data source, as declared so far.
    pub fn sensor_id(&self, source: &str, fallback: EntityKind) -> String {
        resolve_sensor(self.entities, source, None, fallback).0
    }

    /// Pushes a non-homeassistant item (a global, an on-device sensor).
    ///
    /// Items carrying an already-reserved id are dropped.
    pub fn push_item(&mut self, item: Node) {
        if let Some(id) = item.get("id").and_then(Node::as_scalar) {
            if !self.entities.reserve_new(id) {
                return;
            }
        }
        self.items.push(item);
    }

    /// Adds a top-level section (components hook).
    pub fn push_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Items collected so far.
    pub fn into_parts(self) -> (Vec<Node>, Vec<Section>) {
        (self.items, self.sections)
    }
}

/// State handed to direct (display lambda) exporters.
pub struct DirectContext<'a> {
    lines: Vec<String>,
    fonts: &'a mut FontRegistry,
    entities: &'a EntityTable,
    /// Effective hardware profile
    pub profile: &'a HardwareProfile,
    /// True for e-paper panels (grey is dithered)
    pub is_epaper: bool,
}

impl<'a> DirectContext<'a> {
    /// Creates a context with an empty line buffer.
    pub fn new(
        fonts: &'a mut FontRegistry,
        entities: &'a EntityTable,
        profile: &'a HardwareProfile,
    ) -> Self {
        Self {
            lines: Vec::new(),
            fonts,
            entities,
            is_epaper: profile.is_epaper(),
            profile,
        }
    }

    /// Appends a drawing line. Relative indentation is preserved.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Registers a font and returns its id.
    pub fn font(&mut self, family: &str, weight: u32, size: u32, italic: bool) -> String {
        self.fonts.add_font(family, weight, size, italic)
    }

    /// Registers the icon font for a size and returns its id.
    pub fn icon_font(&mut self, size: u32) -> String {
        self.fonts.add_font(ICON_FAMILY, 400, size, false);
        icon_font_id(size)
    }

    /// Tracks an icon glyph.
    pub fn track_icon(&mut self, code: &str, size: u32) {
        self.fonts.track_icon(code, size);
    }

    /// Component id of a data source, as declared by the sensor passes.
    pub fn sensor_id(&self, source: &str, attribute: Option<&str>, fallback: EntityKind) -> String {
        resolve_sensor(self.entities, source, attribute, fallback).0
    }

    /// Component id and section of a data source.
    pub fn sensor(
        &self,
        source: &str,
        attribute: Option<&str>,
        fallback: EntityKind,
    ) -> (String, EntityKind) {
        resolve_sensor(self.entities, source, attribute, fallback)
    }

    /// Emits a grey dither pass when drawing grey on e-paper.
    pub fn dither(&mut self, color: &str, x: i32, y: i32, width: i32, height: i32) {
        if self.is_epaper && is_gray(color) {
            self.push(format!(
                "apply_grey_dither_mask({x}, {y}, {width}, {height});"
            ));
        }
    }

    /// Consumes the context and returns the collected lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// State handed to toolkit exporters.
pub struct ToolkitContext<'a> {
    fonts: &'a mut FontRegistry,
    triggers: &'a mut TriggerMap,
    entities: &'a EntityTable,
    /// Effective hardware profile
    pub profile: &'a HardwareProfile,
}

impl<'a> ToolkitContext<'a> {
    /// Creates a toolkit context.
    pub fn new(
        fonts: &'a mut FontRegistry,
        triggers: &'a mut TriggerMap,
        entities: &'a EntityTable,
        profile: &'a HardwareProfile,
    ) -> Self {
        Self {
            fonts,
            triggers,
            entities,
            profile,
        }
    }

    /// Registers a font and returns its id.
    pub fn font(&mut self, family: &str, weight: u32, size: u32, italic: bool) -> String {
        self.fonts.add_font(family, weight, size, italic)
    }

    /// Registers the icon font for a size and returns its id.
    pub fn icon_font(&mut self, size: u32) -> String {
        self.fonts.add_font(ICON_FAMILY, 400, size, false);
        icon_font_id(size)
    }

    /// Component id and section of a data source.
    pub fn sensor(
        &self,
        source: &str,
        attribute: Option<&str>,
        fallback: EntityKind,
    ) -> (String, EntityKind) {
        resolve_sensor(self.entities, source, attribute, fallback)
    }

    /// Asks for an action to run whenever `source` changes.
    pub fn request_trigger(&mut self, source: &str, action: Node) {
        self.triggers.add(EntityKey::new(source, None), action);
    }

    /// Returns true when the panel has a touch controller.
    pub fn has_touch(&self) -> bool {
        self.profile.features.touch || self.profile.touch.is_some()
    }
}

fn resolve_sensor(
    table: &EntityTable,
    source: &str,
    attribute: Option<&str>,
    fallback: EntityKind,
) -> (String, EntityKind) {
    let key = EntityKey::new(source, attribute);
    let root = attribute.map(|attr| EntityKey::new(source, Some(entities::attribute_root(attr))));
    let declared = table
        .lookup(&key)
        .or_else(|| root.as_ref().and_then(|r| table.lookup(r)));
    match declared {
        Some(d) => (d.id.clone(), d.kind),
        None => (key.sensor_id(fallback), fallback),
    }
}

// ============================================================================
// Capability traits
// ============================================================================

/// Imperative export into the display lambda.
pub trait DirectExport: Send + Sync {
    /// Pushes the drawing lines for one widget.
    ///
    /// The annotation comment and the condition guard are written by the
    /// caller. On error everything pushed so far is discarded.
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()>;
}

/// Declarative export into the toolkit snippet.
pub trait ToolkitExport: Send + Sync {
    /// Builds the toolkit widget node (`{label: {...}}`, `{bar: {...}}` ...).
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node>;
}

/// A widget type.
pub trait WidgetPlugin: Send + Sync {
    /// Canonical type tag.
    fn kind(&self) -> &'static str;

    /// Direct rendering capability, if supported.
    fn direct(&self) -> Option<&dyn DirectExport> {
        None
    }

    /// Toolkit rendering capability, if supported.
    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        None
    }

    /// Registers fonts and icons before any section is emitted.
    fn collect_requirements(&self, _widget: &Widget, _fonts: &mut FontRegistry) {}

    /// Contributes `globals:` items.
    fn on_export_globals(&self, _ctx: &mut SectionContext<'_>) {}

    /// Contributes `sensor:` items.
    fn on_export_numeric_sensors(&self, _ctx: &mut SectionContext<'_>) {}

    /// Contributes `text_sensor:` items.
    fn on_export_text_sensors(&self, _ctx: &mut SectionContext<'_>) {}

    /// Contributes `binary_sensor:` items.
    fn on_export_binary_sensors(&self, _ctx: &mut SectionContext<'_>) {}

    /// Contributes whole top-level sections.
    fn on_export_components(&self, _ctx: &mut SectionContext<'_>) {}
}

// ============================================================================
// Registry
// ============================================================================

/// Plugins by canonical type, plus aliases.
pub struct PluginRegistry {
    plugins: BTreeMap<&'static str, Box<dyn WidgetPlugin>>,
    aliases: BTreeMap<&'static str, &'static str>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            plugins: BTreeMap::new(),
            aliases: BTreeMap::new(),
        }
    }

    /// Creates a registry holding every built-in widget type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        text::register(&mut registry);
        shapes::register(&mut registry);
        symbols::register(&mut registry);
        sensors::register(&mut registry);
        lvgl::register(&mut registry);
        media::register(&mut registry);
        panels::register(&mut registry);
        templates::register(&mut registry);

        registry.alias("label", "text");
        registry.alias("rectangle", "shape_rect");
        registry.alias("rounded_rect", "shape_rect");
        registry.alias("circle", "shape_circle");
        registry.alias("puppet", "online_image");
        registry.alias("weather_forcast", "weather_forecast");
        registry
    }

    /// Adds a plugin, replacing any plugin of the same kind.
    pub fn register(&mut self, plugin: Box<dyn WidgetPlugin>) {
        self.plugins.insert(plugin.kind(), plugin);
    }

    /// Maps an alternative type tag onto a registered kind.
    pub fn alias(&mut self, alias: &'static str, target: &'static str) {
        self.aliases.insert(alias, target);
    }

    /// Canonical kind for a type tag, if any plugin handles it.
    pub fn canonical(&self, kind: &str) -> Option<&'static str> {
        let target = self.aliases.get(kind).copied().unwrap_or(kind);
        self.plugins.get_key_value(target).map(|(k, _)| *k)
    }

    /// Looks up the plugin for a type tag.
    pub fn get(&self, kind: &str) -> Option<&dyn WidgetPlugin> {
        let canonical = self.canonical(kind)?;
        self.plugins.get(canonical).map(Box::as_ref)
    }

    /// Canonical kinds in alphabetical order.
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }

    /// Plugins in alphabetical order.
    pub fn plugins(&self) -> impl Iterator<Item = &dyn WidgetPlugin> {
        self.plugins.values().map(Box::as_ref)
    }

    /// Plugins in component emission order.
    pub fn component_order(&self) -> Vec<&dyn WidgetPlugin> {
        let mut ordered: Vec<&dyn WidgetPlugin> = COMPONENT_PRIORITY
            .iter()
            .filter_map(|kind| self.plugins.get(kind).map(Box::as_ref))
            .collect();
        ordered.extend(
            self.plugins
                .iter()
                .filter(|(kind, _)| !COMPONENT_PRIORITY.contains(*kind))
                .map(|(_, p)| p.as_ref()),
        );
        ordered
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true when no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Returns true for types that fall back to a generic toolkit object.
pub fn has_generic_object(kind: &str) -> bool {
    kind.starts_with("lvgl_") || kind.starts_with("shape_") || GENERIC_OBJECT_TYPES.contains(&kind)
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns true for grey colors that e-paper renders by dithering.
pub fn is_gray(color: &str) -> bool {
    matches!(
        color.trim().to_lowercase().as_str(),
        "gray" | "grey" | "#808080" | "#a0a0a0"
    )
}

/// Display-lambda color expression for a color name or `#rrggbb`.
pub fn color_const(color: &str) -> String {
    let color = color.trim().to_lowercase();
    match color.as_str() {
        "white" => "COLOR_WHITE".to_string(),
        "black" | "gray" | "grey" => "COLOR_BLACK".to_string(),
        "red" => "COLOR_RED".to_string(),
        "green" => "COLOR_GREEN".to_string(),
        "blue" => "COLOR_BLUE".to_string(),
        "yellow" => "COLOR_YELLOW".to_string(),
        "orange" => "COLOR_ORANGE".to_string(),
        "theme_auto" => "color_on".to_string(),
        "transparent" | "none" => "color_off".to_string(),
        hex => match parse_hex(hex) {
            Some((r, g, b)) => format!("Color({r}, {g}, {b})"),
            None => "COLOR_BLACK".to_string(),
        },
    }
}

fn parse_hex(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Toolkit color literal (`"0xRRGGBB"`).
pub fn convert_color(color: Option<&str>) -> Node {
    let Some(color) = color.map(str::trim).filter(|c| !c.is_empty()) else {
        return Node::quoted("0x000000");
    };
    let lower = color.to_lowercase();
    let hex = match lower.as_str() {
        "transparent" | "none" | "black" | "theme_auto" => "000000".to_string(),
        "white" => "FFFFFF".to_string(),
        "red" => "FF0000".to_string(),
        "green" => "00FF00".to_string(),
        "blue" => "0000FF".to_string(),
        "yellow" => "FFFF00".to_string(),
        "orange" => "FFA500".to_string(),
        "gray" | "grey" => "808080".to_string(),
        other => match other.strip_prefix('#') {
            Some(hex) => hex.to_uppercase(),
            None => return Node::quoted(color),
        },
    };
    Node::quoted(&format!("0x{hex}"))
}

/// Toolkit alignment keyword for a designer alignment.
pub fn convert_align(align: Option<&str>) -> String {
    match align.map(str::trim).filter(|a| !a.is_empty()) {
        None => "TOP_LEFT".to_string(),
        Some(a) => match a.to_lowercase().as_str() {
            "left" => "TOP_LEFT".to_string(),
            "center" => "CENTER".to_string(),
            "right" => "TOP_RIGHT".to_string(),
            _ => a.to_uppercase(),
        },
    }
}

/// Toolkit text alignment (`LEFT`, `CENTER`, `RIGHT`) for a designer alignment.
pub fn text_align(align: Option<&str>) -> String {
    let full = convert_align(align);
    let trimmed = full
        .trim_start_matches("TOP_")
        .trim_start_matches("BOTTOM_");
    match trimmed {
        "LEFT" | "CENTER" | "RIGHT" => trimmed.to_string(),
        _ => "LEFT".to_string(),
    }
}

/// Toolkit opacity (`COVER`, `TRANSP` or a percentage) for a 0-255 value.
pub fn format_opacity(value: Option<&Value>) -> Node {
    match value {
        None | Some(Value::Null) => Node::scalar("COVER"),
        Some(Value::Number(n)) => {
            let opa = n.as_f64().unwrap_or(255.0);
            if opa >= 255.0 {
                Node::scalar("COVER")
            } else if opa <= 0.0 {
                Node::scalar("TRANSP")
            } else {
                Node::scalar(format!("{}%", (opa / 255.0 * 100.0).round() as i64))
            }
        }
        Some(Value::String(s)) => Node::scalar(s),
        Some(other) => Node::scalar(other),
    }
}

/// Properties shared by every toolkit widget.
pub fn common_props(widget: &Widget) -> Node {
    let mut node = Node::map()
        .with("id", Node::scalar(&widget.id))
        .with("x", Node::scalar(widget.x))
        .with("y", Node::scalar(widget.y))
        .with("width", Node::scalar(non_zero(widget.width)))
        .with("height", Node::scalar(non_zero(widget.height)));

    if widget.flag("hidden") {
        node.insert("hidden", Node::scalar(true));
    }
    if widget.prop_bool("clickable") == Some(false) {
        node.insert("clickable", Node::scalar(false));
    }
    if widget.flag("checkable") {
        node.insert("checkable", Node::scalar(true));
    }
    if widget.prop_bool("scrollable") == Some(false) {
        node.insert("scrollable", Node::scalar(false));
    }
    if widget.flag("floating") {
        node.insert("floating", Node::scalar(true));
    }
    if widget.flag("ignore_layout") {
        node.insert("ignore_layout", Node::scalar(true));
    }
    if let Some(mode) = widget.prop_str("scrollbar_mode").filter(|m| m != "AUTO") {
        node.insert("scrollbar_mode", Node::scalar(mode));
    }
    node
}

const fn non_zero(value: i32) -> i32 {
    if value == 0 {
        100
    } else {
        value
    }
}

/// Escapes a string for a C++ string literal inside `printf`.
pub fn escape_printf(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('%', "%%")
}

/// Integer prop clamped to at least one pixel.
pub fn prop_px(widget: &Widget, key: &str, default: u32) -> u32 {
    let value = widget.prop_i64_or(key, i64::from(default));
    u32::try_from(value.max(1)).unwrap_or(default)
}

/// Data source of a widget with the implicit `sensor.` prefix applied.
pub fn qualified_entity(widget: &Widget) -> Option<String> {
    let entity = widget.entity()?;
    if widget.flag("is_local_sensor") || entity.contains('.') {
        Some(entity.to_string())
    } else {
        Some(format!("sensor.{entity}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resolution;
    use serde_json::json;

    #[test]
    fn test_aliases_resolve() {
        let registry = PluginRegistry::with_builtins();
        assert_eq!(registry.canonical("label"), Some("text"));
        assert_eq!(registry.canonical("rectangle"), Some("shape_rect"));
        assert_eq!(registry.canonical("circle"), Some("shape_circle"));
        assert_eq!(registry.canonical("text"), Some("text"));
        assert_eq!(registry.canonical("puppet"), Some("online_image"));
        assert_eq!(registry.canonical("weather_forcast"), Some("weather_forecast"));
        assert!(registry.get("no_such_widget").is_none());
    }

    #[test]
    fn test_panel_and_media_kinds_are_registered() {
        let registry = PluginRegistry::with_builtins();
        for kind in [
            "calendar",
            "weather_forecast",
            "quote_rss",
            "image",
            "online_image",
            "qr_code",
            "template_nav_bar",
            "template_sensor_bar",
            "lvgl_dropdown",
            "lvgl_qrcode",
            "lvgl_spinbox",
        ] {
            assert!(registry.get(kind).is_some(), "{kind} missing");
        }
        assert!(registry.get("calendar").unwrap().toolkit().is_none());
        assert!(registry.get("qr_code").unwrap().toolkit().is_some());
        assert!(!has_generic_object("qr_code"));
    }

    #[test]
    fn test_capabilities_are_advertised() {
        let registry = PluginRegistry::with_builtins();
        let bar = registry.get("lvgl_bar").unwrap();
        assert!(bar.direct().is_none());
        assert!(bar.toolkit().is_some());

        let text = registry.get("text").unwrap();
        assert!(text.direct().is_some());
        assert!(text.toolkit().is_some());
    }

    #[test]
    fn test_component_order() {
        let registry = PluginRegistry::with_builtins();
        let order: Vec<_> = registry.component_order().iter().map(|p| p.kind()).collect();
        assert_eq!(order[..4], ["image", "online_image", "graph", "qr_code"]);
        let rest = &order[4..];
        let mut sorted = rest.to_vec();
        sorted.sort_unstable();
        assert_eq!(rest, sorted.as_slice());
    }

    #[test]
    fn test_color_const() {
        assert_eq!(color_const("white"), "COLOR_WHITE");
        assert_eq!(color_const("Theme_Auto"), "color_on");
        assert_eq!(color_const("#ff8000"), "Color(255, 128, 0)");
        assert_eq!(color_const("#zzz"), "COLOR_BLACK");
    }

    #[test]
    fn test_convert_color() {
        assert_eq!(convert_color(Some("#ff8000")), Node::Scalar("\"0xFF8000\"".into()));
        assert_eq!(convert_color(Some("transparent")), Node::Scalar("\"0x000000\"".into()));
        assert_eq!(convert_color(None), Node::Scalar("\"0x000000\"".into()));
        assert_eq!(convert_color(Some("blue")), Node::Scalar("\"0x0000FF\"".into()));
    }

    #[test]
    fn test_opacity_and_align() {
        assert_eq!(format_opacity(None), Node::scalar("COVER"));
        assert_eq!(format_opacity(Some(&json!(0))), Node::scalar("TRANSP"));
        assert_eq!(format_opacity(Some(&json!(128))), Node::scalar("50%"));
        assert_eq!(convert_align(Some("left")), "TOP_LEFT");
        assert_eq!(convert_align(Some("BOTTOM_RIGHT")), "BOTTOM_RIGHT");
        assert_eq!(text_align(Some("TOP_CENTER")), "CENTER");
        assert_eq!(text_align(None), "LEFT");
    }

    #[test]
    fn test_sensor_id_prefers_declared() {
        let mut table = EntityTable::new();
        table.record(
            &EntityKey::new("weather.home", None),
            "weather_home_text_sensor",
            EntityKind::Text,
        );
        assert_eq!(
            resolve_sensor(&table, "weather.home", None, EntityKind::Numeric),
            ("weather_home_text_sensor".to_string(), EntityKind::Text)
        );
        assert_eq!(
            resolve_sensor(&table, "sensor.temp", None, EntityKind::Numeric).0,
            "sensor_temp"
        );
    }

    #[test]
    fn test_section_context_dedups() {
        let widgets = [];
        let mut table = EntityTable::new();
        let profile = HardwareProfile::new("t", "T", "esp32", "st7789v", Resolution::default());
        let mut ctx = SectionContext::new(&widgets, &mut table, &profile, false, 1);

        let key = EntityKey::new("sensor.temp", None);
        assert!(ctx.declare(&key, EntityKind::Numeric));
        assert!(!ctx.declare(&key, EntityKind::Numeric));

        ctx.push_item(Node::map().with("id", Node::scalar("wifi_signal_dbm")));
        ctx.push_item(Node::map().with("id", Node::scalar("wifi_signal_dbm")));
        let (items, sections) = ctx.into_parts();
        assert_eq!(items.len(), 2);
        assert!(sections.is_empty());
    }

    #[test]
    fn test_common_props_flags() {
        let w = Widget::new("b1", "lvgl_button", 1, 2, 0, 40)
            .with_prop("clickable", false)
            .with_prop("scrollbar_mode", "AUTO");
        let node = common_props(&w);
        assert_eq!(node.get("width").and_then(Node::as_scalar), Some("100"));
        assert_eq!(node.get("clickable").and_then(Node::as_scalar), Some("false"));
        assert!(node.get("scrollbar_mode").is_none());
    }
}

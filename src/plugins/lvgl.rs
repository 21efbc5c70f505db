//! Native toolkit widgets. These only render in toolkit mode.

use super::{
    common_props, convert_align, convert_color, format_opacity, prop_px, PluginRegistry,
    SectionContext, ToolkitContext, ToolkitExport, WidgetPlugin,
};
use crate::compiler::entities::{sanitize, EntityKey, EntityKind};
use crate::compiler::fonts::FontRegistry;
use crate::compiler::ir::{quote, Node};
use crate::models::Widget;
use anyhow::Result;
use serde_json::Value;

pub(super) fn register(registry: &mut PluginRegistry) {
    registry.register(Box::new(LabelPlugin));
    registry.register(Box::new(ButtonPlugin));
    registry.register(Box::new(BarPlugin));
    registry.register(Box::new(ArcPlugin));
    registry.register(Box::new(SwitchPlugin));
    registry.register(Box::new(CheckboxPlugin));
    registry.register(Box::new(DropdownPlugin));
    registry.register(Box::new(QrCodeWidgetPlugin));
    registry.register(Box::new(SpinboxPlugin));
}

/// Value of a gauge-like widget: a live sensor lambda or a static number.
fn live_value(widget: &Widget, ctx: &ToolkitContext<'_>) -> Node {
    match widget.entity() {
        Some(entity) => {
            let (id, _) = ctx.sensor(entity, None, EntityKind::Numeric);
            Node::scalar(format!("!lambda \"return id({id}).state;\""))
        }
        None => Node::scalar(widget.prop_i64_or("value", 0)),
    }
}

fn prop_node(widget: &Widget, key: &str) -> Option<Node> {
    widget.props.get(key).and_then(|value| match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(Node::scalar(s)),
        other => Some(Node::scalar(other)),
    })
}

fn toggle(entity: &str) -> Node {
    Node::map().with(
        "homeassistant.service",
        Node::map()
            .with("service", Node::scalar("homeassistant.toggle"))
            .with("data", Node::map().with("entity_id", Node::scalar(entity))),
    )
}

/// Touch action for an entity, chosen by its domain.
pub fn click_action(entity: &str) -> Node {
    let domain = entity.split('.').next().unwrap_or_default();
    match domain {
        "script" => Node::map().with("script.execute", Node::scalar(entity)),
        "button" | "input_button" => Node::map().with("button.press", Node::scalar(entity)),
        "scene" => Node::map().with("scene.turn_on", Node::scalar(entity)),
        _ => toggle(entity),
    }
}

fn child_label(text: &str, color: Node) -> Node {
    Node::list().item(
        Node::map().with(
            "label",
            Node::map()
                .with("align", Node::scalar("CENTER"))
                .with("text", Node::quoted(text))
                .with("text_color", color),
        ),
    )
}

/// Static toolkit label.
#[derive(Debug, Default)]
pub struct LabelPlugin;

impl LabelPlugin {
    fn font_args(widget: &Widget) -> (String, u32, u32, bool) {
        (
            widget.prop_str_or("font_family", "Roboto"),
            prop_px(widget, "font_weight", 400),
            prop_px(widget, "font_size", 20),
            widget.flag("italic"),
        )
    }
}

impl WidgetPlugin for LabelPlugin {
    fn kind(&self) -> &'static str {
        "lvgl_label"
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        let (family, weight, size, italic) = Self::font_args(widget);
        fonts.add_font(&family, weight, size, italic);
    }
}

impl ToolkitExport for LabelPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let (family, weight, size, italic) = Self::font_args(widget);
        let font = ctx.font(&family, weight, size, italic);
        let color = widget
            .prop_str("color")
            .or_else(|| widget.prop_str("text_color"));
        let bg = widget
            .prop_str("bg_color")
            .filter(|c| !c.is_empty() && c != "transparent");

        let label = common_props(widget)
            .with("text", Node::quoted(&widget.prop_str_or("text", "Label")))
            .with("text_font", Node::scalar(font))
            .with("text_color", convert_color(color.as_deref()))
            .with(
                "text_align",
                Node::scalar(convert_align(widget.prop_str("text_align").as_deref())),
            )
            .with_opt("bg_color", bg.map(|c| convert_color(Some(&c))))
            .with("opa", format_opacity(widget.props.get("opa")));
        Ok(Node::map().with("label", label))
    }
}

/// Push button with a centered caption.
#[derive(Debug, Default)]
pub struct ButtonPlugin;

impl WidgetPlugin for ButtonPlugin {
    fn kind(&self) -> &'static str {
        "lvgl_button"
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }
}

impl ToolkitExport for ButtonPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let color = convert_color(widget.prop_str("color").as_deref());
        let button = common_props(widget)
            .with("bg_color", convert_color(widget.prop_str("bg_color").as_deref()))
            .with("bg_opa", Node::scalar("COVER"))
            .with_opt("border_width", prop_node(widget, "border_width"))
            .with("border_color", color.clone())
            .with_opt("radius", prop_node(widget, "radius"))
            .with("opa", format_opacity(widget.props.get("opa")))
            .with_opt(
                "on_click",
                widget
                    .entity()
                    .filter(|_| ctx.has_touch())
                    .map(|entity| Node::list().item(click_action(entity.trim()))),
            )
            .with(
                "widgets",
                child_label(&widget.prop_str_or("text", "BTN"), color),
            );
        Ok(Node::map().with("button", button))
    }
}

/// Horizontal bar bound to a numeric sensor.
#[derive(Debug, Default)]
pub struct BarPlugin;

impl WidgetPlugin for BarPlugin {
    fn kind(&self) -> &'static str {
        "lvgl_bar"
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }
}

impl ToolkitExport for BarPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        if let Some(entity) = widget.entity() {
            ctx.request_trigger(
                entity,
                Node::map().with(
                    "lvgl.widget.update",
                    Node::map()
                        .with("id", Node::scalar(&widget.id))
                        .with("value", Node::scalar("!lambda return x;")),
                ),
            );
        }

        let bar = common_props(widget)
            .with("min_value", Node::scalar(widget.prop_i64_or("min", 0)))
            .with("max_value", Node::scalar(widget.prop_i64_or("max", 100)))
            .with("value", live_value(widget, ctx))
            .with(
                "bg_color",
                convert_color(Some(&widget.prop_str_or("bg_color", "gray"))),
            )
            .with(
                "indicator",
                Node::map().with("bg_color", convert_color(widget.prop_str("color").as_deref())),
            )
            .with_opt("start_value", prop_node(widget, "start_value"))
            .with_opt("mode", prop_node(widget, "mode"));
        Ok(Node::map().with("bar", bar))
    }
}

/// Circular gauge with a centered title.
#[derive(Debug, Default)]
pub struct ArcPlugin;

impl WidgetPlugin for ArcPlugin {
    fn kind(&self) -> &'static str {
        "lvgl_arc"
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }
}

impl ToolkitExport for ArcPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        if let Some(entity) = widget.entity() {
            ctx.request_trigger(
                entity,
                Node::map().with("lvgl.widget.refresh", Node::scalar(&widget.id)),
            );
        }

        let color = convert_color(widget.prop_str("color").as_deref());
        let title = widget
            .title
            .clone()
            .or_else(|| widget.prop_str("title"))
            .unwrap_or_default();
        let arc = common_props(widget)
            .with("value", live_value(widget, ctx))
            .with("min_value", Node::scalar(widget.prop_i64_or("min", 0)))
            .with("max_value", Node::scalar(widget.prop_i64_or("max", 100)))
            .with_opt("arc_width", prop_node(widget, "thickness"))
            .with("arc_color", color.clone())
            .with("indicator", Node::map().with("arc_color", color.clone()))
            .with_opt("start_angle", prop_node(widget, "start_angle"))
            .with_opt("end_angle", prop_node(widget, "end_angle"))
            .with_opt("mode", prop_node(widget, "mode"))
            .with("widgets", child_label(&title, color));
        Ok(Node::map().with("arc", arc))
    }
}

/// Toggle switch mirroring an on/off entity.
#[derive(Debug, Default)]
pub struct SwitchPlugin;

impl SwitchPlugin {
    fn entity(widget: &Widget) -> Option<String> {
        widget
            .entity()
            .map(str::to_string)
            .or_else(|| widget.prop_str("entity"))
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
    }

    /// Id of the state mirror declared for an entity.
    pub fn sync_id(entity: &str) -> String {
        format!("{}_state_sync", sanitize(entity))
    }
}

impl WidgetPlugin for SwitchPlugin {
    fn kind(&self) -> &'static str {
        "lvgl_switch"
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn on_export_binary_sensors(&self, ctx: &mut SectionContext<'_>) {
        let entities: Vec<String> = ctx
            .widgets_of("lvgl_switch")
            .filter_map(Self::entity)
            .collect();
        for entity in entities {
            let id = Self::sync_id(&entity);
            ctx.declare_as(
                &EntityKey::new(entity.as_str(), None),
                &id,
                EntityKind::Binary,
                vec![("publish_initial_state", Node::scalar(true))],
            );
        }
    }
}

impl ToolkitExport for SwitchPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let entity = Self::entity(widget);
        if let Some(entity) = &entity {
            ctx.request_trigger(
                entity,
                Node::map().with(
                    "lvgl.widget.update",
                    Node::map()
                        .with("id", Node::scalar(&widget.id))
                        .with(
                            "state",
                            Node::map().with("checked", Node::scalar("!lambda return x;")),
                        ),
                ),
            );
        }

        let switch = common_props(widget)
            .with("bg_color", convert_color(widget.prop_str("bg_color").as_deref()))
            .with(
                "indicator",
                Node::map().with("bg_color", convert_color(widget.prop_str("color").as_deref())),
            )
            .with(
                "knob",
                Node::map().with(
                    "bg_color",
                    convert_color(widget.prop_str("knob_color").as_deref()),
                ),
            )
            .with("opa", format_opacity(widget.props.get("opa")))
            .with_opt(
                "on_value",
                entity.map(|e| Node::list().item(toggle(&e))),
            );
        Ok(Node::map().with("switch", switch))
    }
}

/// Checkbox with a caption.
#[derive(Debug, Default)]
pub struct CheckboxPlugin;

impl WidgetPlugin for CheckboxPlugin {
    fn kind(&self) -> &'static str {
        "lvgl_checkbox"
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }
}

impl ToolkitExport for CheckboxPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let checkbox = common_props(widget)
            .with("text", Node::quoted(&widget.prop_str_or("text", "Checkbox")))
            .with_opt("checked", widget.prop_bool("checked").map(Node::scalar))
            .with("opa", format_opacity(widget.props.get("opa")))
            .with_opt(
                "on_value",
                widget
                    .entity()
                    .filter(|_| ctx.has_touch())
                    .map(|entity| Node::list().item(toggle(entity))),
            );
        Ok(Node::map().with("checkbox", checkbox))
    }
}

/// Toolkit `qrcode` node, shared with the display-lambda QR widget.
pub(super) fn qrcode(widget: &Widget, text: &str) -> Node {
    let qrcode = common_props(widget)
        .with("text", Node::quoted(text))
        .with("size", Node::scalar(widget.width.min(widget.height).max(1)))
        .with(
            "dark_color",
            convert_color(Some(&widget.prop_str_or("color", "black"))),
        )
        .with(
            "light_color",
            convert_color(Some(&widget.prop_str_or("bg_color", "white"))),
        );
    Node::map().with("qrcode", qrcode)
}

/// Home Assistant call writing a value back to an entity.
fn set_entity(entity: &str, service: &str, field: &str, value: &str) -> Node {
    let domain = entity.split('.').next().unwrap_or_default();
    Node::map().with(
        "homeassistant.service",
        Node::map()
            .with("service", Node::scalar(format!("{domain}.{service}")))
            .with("data", Node::map().with("entity_id", Node::scalar(entity)))
            .with(
                "data_template",
                Node::map().with(field, Node::quoted(&format!("{{{{ {field} }}}}"))),
            )
            .with("variables", Node::map().with(field, Node::scalar(value))),
    )
}

/// Option list, optionally bound to a select entity.
#[derive(Debug, Default)]
pub struct DropdownPlugin;

impl DropdownPlugin {
    /// Options from a list or a newline separated string.
    pub fn options(widget: &Widget) -> Vec<String> {
        match widget.props.get("options") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => widget
                .prop_str_or("options", "Option 1\nOption 2\nOption 3")
                .lines()
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    fn entity(widget: &Widget) -> Option<&str> {
        widget
            .entity()
            .filter(|e| e.starts_with("input_select.") || e.starts_with("select."))
    }

    fn direction(widget: &Widget) -> &'static str {
        match widget.prop_str_or("direction", "DOWN").to_uppercase().as_str() {
            "UP" | "TOP" => "TOP",
            "LEFT" => "LEFT",
            "RIGHT" => "RIGHT",
            _ => "BOTTOM",
        }
    }

    /// Lambda mapping the entity state back to an option index.
    fn index_lambda(options: &[String]) -> Node {
        let literals: Vec<String> = options.iter().map(|o| quote(o)).collect();
        Node::lambda([
            format!(
                "static const char *const options[] = {{{}}};",
                literals.join(", ")
            ),
            format!("for (int i = 0; i < {}; i++) {{", options.len()),
            "  if (x == options[i]) return i;".to_string(),
            "}".to_string(),
            "return 0;".to_string(),
        ])
    }
}

impl WidgetPlugin for DropdownPlugin {
    fn kind(&self) -> &'static str {
        "lvgl_dropdown"
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn on_export_text_sensors(&self, ctx: &mut SectionContext<'_>) {
        let entities: Vec<String> = ctx
            .widgets_of("lvgl_dropdown")
            .filter_map(Self::entity)
            .map(str::to_string)
            .collect();
        for entity in entities {
            ctx.declare(&EntityKey::new(entity, None), EntityKind::Text);
        }
    }
}

impl ToolkitExport for DropdownPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let options = Self::options(widget);
        let entity = Self::entity(widget);
        if let Some(entity) = entity.filter(|_| !options.is_empty()) {
            ctx.request_trigger(
                entity,
                Node::map().with(
                    "lvgl.dropdown.update",
                    Node::map()
                        .with("id", Node::scalar(&widget.id))
                        .with("selected_index", Self::index_lambda(&options)),
                ),
            );
        }

        let selected = widget
            .prop_i64("selected_index")
            .map(|i| i.clamp(0, options.len().saturating_sub(1) as i64));
        let mut list = Node::list();
        for option in &options {
            list.push(Node::quoted(option));
        }
        let dropdown = common_props(widget)
            .with("options", list)
            .with_opt("selected_index", selected.map(Node::scalar))
            .with("text_color", convert_color(widget.prop_str("color").as_deref()))
            .with("dir", Node::scalar(Self::direction(widget)))
            .with_opt(
                "dropdown_list",
                prop_node(widget, "max_height").map(|h| Node::map().with("max_height", h)),
            )
            .with("opa", format_opacity(widget.props.get("opa")))
            .with_opt(
                "on_value",
                entity.filter(|_| ctx.has_touch()).map(|e| {
                    Node::list().item(set_entity(e, "select_option", "option", "return text;"))
                }),
            );
        Ok(Node::map().with("dropdown", dropdown))
    }
}

/// QR code rendered by the toolkit.
#[derive(Debug, Default)]
pub struct QrCodeWidgetPlugin;

impl WidgetPlugin for QrCodeWidgetPlugin {
    fn kind(&self) -> &'static str {
        "lvgl_qrcode"
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }
}

impl ToolkitExport for QrCodeWidgetPlugin {
    fn export_toolkit(&self, widget: &Widget, _ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        Ok(qrcode(
            widget,
            &widget.prop_str_or("text", "https://esphome.io"),
        ))
    }
}

/// Digit spinner, optionally bound to a number entity.
#[derive(Debug, Default)]
pub struct SpinboxPlugin;

impl SpinboxPlugin {
    fn digits(widget: &Widget) -> i64 {
        widget.prop_i64_or("digit_count", 4).clamp(1, 10)
    }

    fn writable(entity: &str) -> bool {
        entity.starts_with("input_number.") || entity.starts_with("number.")
    }
}

impl WidgetPlugin for SpinboxPlugin {
    fn kind(&self) -> &'static str {
        "lvgl_spinbox"
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }
}

impl ToolkitExport for SpinboxPlugin {
    fn export_toolkit(&self, widget: &Widget, ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        if let Some(entity) = widget.entity() {
            ctx.request_trigger(
                entity,
                Node::map().with(
                    "lvgl.spinbox.update",
                    Node::map()
                        .with("id", Node::scalar(&widget.id))
                        .with("value", Node::scalar("!lambda return x;")),
                ),
            );
        }

        let digits = Self::digits(widget);
        let spinbox = common_props(widget)
            .with("range_from", Node::scalar(widget.prop_i64_or("min", 0)))
            .with(
                "range_to",
                Node::scalar(widget.prop_i64_or("max", 10_i64.pow(digits as u32) - 1)),
            )
            .with("digits", Node::scalar(digits))
            .with_opt("decimal_places", prop_node(widget, "decimal_places"))
            .with("step", prop_node(widget, "step").unwrap_or_else(|| Node::scalar(1)))
            .with("value", live_value(widget, ctx))
            .with("text_color", convert_color(widget.prop_str("color").as_deref()))
            .with_opt(
                "on_value",
                widget
                    .entity()
                    .filter(|e| Self::writable(e) && ctx.has_touch())
                    .map(|e| Node::list().item(set_entity(e, "set_value", "value", "return x;"))),
            );
        Ok(Node::map().with("spinbox", spinbox))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::entities::EntityTable;
    use crate::compiler::triggers::TriggerMap;
    use crate::models::{HardwareProfile, Resolution, TouchController};
    use crate::plugins::PluginWidget;

    fn profile(touch: bool) -> HardwareProfile {
        let mut p = HardwareProfile::new("t", "T", "esp32s3", "st7789v", Resolution::default());
        p.features.lcd = true;
        if touch {
            p.touch = Some(TouchController {
                platform: "gt911".into(),
                interrupt_pin: None,
                reset_pin: None,
            });
        }
        p
    }

    fn export(
        plugin: &dyn ToolkitExport,
        widget: &Widget,
        touch: bool,
    ) -> (Node, TriggerMap) {
        let profile = profile(touch);
        let mut fonts = FontRegistry::new();
        let mut triggers = TriggerMap::new();
        let table = EntityTable::new();
        let node = {
            let mut ctx = ToolkitContext::new(&mut fonts, &mut triggers, &table, &profile);
            plugin.export_toolkit(widget, &mut ctx).unwrap()
        };
        (node, triggers)
    }

    #[test]
    fn test_click_action_by_domain() {
        assert!(click_action("script.morning").get("script.execute").is_some());
        assert!(click_action("input_button.ring").get("button.press").is_some());
        assert!(click_action("scene.movie").get("scene.turn_on").is_some());
        assert!(click_action("light.hall").get("homeassistant.service").is_some());
    }

    #[test]
    fn test_button_action_requires_touch() {
        let w = Widget::new("b", "lvgl_button", 0, 0, 80, 40).with_entity("light.hall");
        let (with_touch, _) = export(&ButtonPlugin, &w, true);
        assert!(with_touch.get("button").unwrap().get("on_click").is_some());
        let (without, _) = export(&ButtonPlugin, &w, false);
        assert!(without.get("button").unwrap().get("on_click").is_none());
    }

    #[test]
    fn test_bar_requests_value_update() {
        let w = Widget::new("bar1", "lvgl_bar", 0, 0, 200, 20).with_entity("sensor.load");
        let (node, triggers) = export(&BarPlugin, &w, false);
        assert_eq!(
            node.get("bar").and_then(|b| b.get("value")).and_then(Node::as_scalar),
            Some("!lambda \"return id(sensor_load).state;\"")
        );
        let record = &triggers.pending()[0];
        assert_eq!(record.key.source, "sensor.load");
        assert!(record.actions[0].get("lvgl.widget.update").is_some());
    }

    #[test]
    fn test_arc_static_value() {
        let w = Widget::new("arc1", "lvgl_arc", 0, 0, 100, 100).with_prop("value", 42);
        let (node, triggers) = export(&ArcPlugin, &w, false);
        assert_eq!(
            node.get("arc").and_then(|a| a.get("value")).and_then(Node::as_scalar),
            Some("42")
        );
        assert!(triggers.is_empty());
    }

    #[test]
    fn test_switch_declares_state_mirror() {
        let w = Widget::new("sw", "lvgl_switch", 0, 0, 60, 30).with_entity("switch.pump");
        let widgets = [PluginWidget {
            kind: "lvgl_switch",
            page: 0,
            widget: &w,
        }];
        let mut table = EntityTable::new();
        let profile = profile(false);
        let mut ctx = SectionContext::new(&widgets, &mut table, &profile, true, 1);
        SwitchPlugin.on_export_binary_sensors(&mut ctx);
        let (items, _) = ctx.into_parts();
        assert_eq!(
            items[0].get("id").and_then(Node::as_scalar),
            Some("switch_pump_state_sync")
        );
        assert_eq!(
            items[0].get("publish_initial_state").and_then(Node::as_scalar),
            Some("true")
        );

        let (node, triggers) = export(&SwitchPlugin, &w, false);
        assert!(node.get("switch").unwrap().get("on_value").is_some());
        assert_eq!(triggers.len(), 1);
    }

    #[test]
    fn test_label_font() {
        let w = Widget::new("l", "lvgl_label", 0, 0, 100, 30)
            .with_prop("text", "Hi")
            .with_prop("font_size", 24);
        let (node, _) = export(&LabelPlugin, &w, false);
        let label = node.get("label").unwrap();
        assert_eq!(
            label.get("text_font").and_then(Node::as_scalar),
            Some("font_roboto_400_24")
        );
        assert_eq!(label.get("text").and_then(Node::as_scalar), Some("\"Hi\""));
    }

    #[test]
    fn test_dropdown_options_and_direction() {
        let w = Widget::new("dd", "lvgl_dropdown", 0, 0, 150, 40)
            .with_prop("options", "Eco\n\nComfort\nBoost")
            .with_prop("selected_index", 7)
            .with_prop("direction", "UP");
        let (node, triggers) = export(&DropdownPlugin, &w, true);
        let dropdown = node.get("dropdown").unwrap();
        let options = dropdown.get("options").and_then(Node::as_list).unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(options[1].as_scalar(), Some("\"Comfort\""));
        assert_eq!(dropdown.get("selected_index").and_then(Node::as_scalar), Some("2"));
        assert_eq!(dropdown.get("dir").and_then(Node::as_scalar), Some("TOP"));
        assert!(dropdown.get("on_value").is_none());
        assert!(triggers.is_empty());
    }

    #[test]
    fn test_dropdown_bound_to_select_entity() {
        let w = Widget::new("mode", "lvgl_dropdown", 0, 0, 150, 40)
            .with_entity("input_select.heating")
            .with_prop("options", serde_json::json!(["Off", "Heat"]));
        let widgets = [PluginWidget {
            kind: "lvgl_dropdown",
            page: 0,
            widget: &w,
        }];
        let mut table = EntityTable::new();
        let profile = profile(true);
        let mut ctx = SectionContext::new(&widgets, &mut table, &profile, true, 1);
        DropdownPlugin.on_export_text_sensors(&mut ctx);
        let (items, _) = ctx.into_parts();
        assert_eq!(
            items[0].get("id").and_then(Node::as_scalar),
            Some("input_select_heating_txt")
        );

        let (node, triggers) = export(&DropdownPlugin, &w, true);
        let action = &node
            .get("dropdown")
            .and_then(|d| d.get("on_value"))
            .and_then(Node::as_list)
            .unwrap()[0];
        let call = action.get("homeassistant.service").unwrap();
        assert_eq!(
            call.get("service").and_then(Node::as_scalar),
            Some("input_select.select_option")
        );
        assert_eq!(triggers.pending()[0].key.source, "input_select.heating");
        let update = triggers.pending()[0].actions[0]
            .get("lvgl.dropdown.update")
            .unwrap();
        assert!(matches!(update.get("selected_index"), Some(Node::Lambda(_))));
    }

    #[test]
    fn test_qrcode_is_square() {
        let w = Widget::new("qr", "lvgl_qrcode", 0, 0, 120, 90).with_prop("text", "wifi:home");
        let (node, _) = export(&QrCodeWidgetPlugin, &w, false);
        let qr = node.get("qrcode").unwrap();
        assert_eq!(qr.get("size").and_then(Node::as_scalar), Some("90"));
        assert_eq!(qr.get("text").and_then(Node::as_scalar), Some("\"wifi:home\""));
        assert_eq!(qr.get("light_color").and_then(Node::as_scalar), Some("\"0xFFFFFF\""));
    }

    #[test]
    fn test_spinbox_range_follows_digits() {
        let w = Widget::new("sp", "lvgl_spinbox", 0, 0, 100, 40).with_prop("digit_count", 3);
        let (node, triggers) = export(&SpinboxPlugin, &w, true);
        let spinbox = node.get("spinbox").unwrap();
        assert_eq!(spinbox.get("range_to").and_then(Node::as_scalar), Some("999"));
        assert_eq!(spinbox.get("step").and_then(Node::as_scalar), Some("1"));
        assert!(spinbox.get("on_value").is_none());
        assert!(triggers.is_empty());
    }

    #[test]
    fn test_spinbox_writes_back_number() {
        let w = Widget::new("sp", "lvgl_spinbox", 0, 0, 100, 40)
            .with_entity("input_number.target");
        let (node, triggers) = export(&SpinboxPlugin, &w, true);
        let spinbox = node.get("spinbox").unwrap();
        assert_eq!(
            spinbox.get("value").and_then(Node::as_scalar),
            Some("!lambda \"return id(input_number_target).state;\"")
        );
        let call = spinbox
            .get("on_value")
            .and_then(Node::as_list)
            .and_then(|l| l[0].get("homeassistant.service"))
            .unwrap();
        assert_eq!(
            call.get("service").and_then(Node::as_scalar),
            Some("input_number.set_value")
        );
        assert!(triggers.pending()[0].actions[0].get("lvgl.spinbox.update").is_some());
    }
}

//! The declarative UI-toolkit snippet (`lvgl:`).

use super::annotation::widget_annotation;
use super::entities::EntityTable;
use super::fonts::FontRegistry;
use super::ir::{Node, Section};
use super::triggers::TriggerMap;
use super::Diagnostic;
use crate::models::{HardwareProfile, Page, Widget};
use crate::plugins::{
    common_props, convert_color, has_generic_object, PluginRegistry, ToolkitContext,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn is_grid_layout(layout: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d+x\d+$").expect("valid layout regex"))
        .is_match(layout)
}

/// Builds the `lvgl:` section for a project.
pub struct ToolkitGenerator<'a> {
    registry: &'a PluginRegistry,
    entities: &'a EntityTable,
    profile: &'a HardwareProfile,
}

impl<'a> ToolkitGenerator<'a> {
    /// Creates a generator over the given plugins and declared entities.
    pub fn new(
        registry: &'a PluginRegistry,
        entities: &'a EntityTable,
        profile: &'a HardwareProfile,
    ) -> Self {
        Self {
            registry,
            entities,
            profile,
        }
    }

    /// Generates the section. Widgets request their refresh triggers on `triggers`.
    pub fn generate(
        &self,
        pages: &[Page],
        fonts: &mut FontRegistry,
        triggers: &mut TriggerMap,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Section {
        let mut body = Node::map()
            .with("id", Node::scalar("my_lvgl"))
            .with("log_level", Node::scalar("WARN"))
            .with("bg_color", Node::quoted("0xFFFFFF"))
            .with(
                "displays",
                Node::list().item(Node::scalar(self.profile.display_id())),
            );
        if self.profile.touch.is_some() || self.profile.features.touch {
            body.insert(
                "touchscreens",
                Node::list().item(Node::scalar("my_touchscreen")),
            );
        }

        let mut page_nodes = Node::list();
        for (index, page) in pages.iter().enumerate() {
            let mut widgets = Node::list();
            for widget in page.exported_widgets() {
                for node in self.widget_nodes(widget, fonts, triggers, diagnostics) {
                    widgets.push(node);
                }
            }

            let layout = page
                .layout
                .as_deref()
                .filter(|l| is_grid_layout(l))
                .map(Node::scalar);
            page_nodes.push(
                Node::map()
                    .with("id", Node::scalar(format!("page_{index}")))
                    .with_opt("layout", layout)
                    .with("widgets", widgets),
            );
        }
        body.insert("pages", page_nodes);

        debug!("Toolkit snippet built for {} page(s)", pages.len());
        Section::new("lvgl", body)
    }

    /// The annotation comment followed by the widget's node, if it has one.
    fn widget_nodes(
        &self,
        widget: &Widget,
        fonts: &mut FontRegistry,
        triggers: &mut TriggerMap,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Node> {
        let annotation = widget_annotation(widget);
        let plugin = self.registry.get(&widget.kind);
        let exporter = plugin.and_then(|p| p.toolkit());

        let Some(exporter) = exporter else {
            if has_generic_object(&widget.kind) {
                return vec![Node::Comment(annotation), generic_object(widget)];
            }
            if plugin.is_none() {
                diagnostics.push(
                    Diagnostic::warning(format!("Unsupported widget type: {}", widget.kind))
                        .for_widget(&widget.id),
                );
                return vec![Node::Comment(format!("{annotation} status:unsupported"))];
            }
            return vec![Node::Comment(annotation)];
        };

        // Triggers requested by a failing export are dropped with it.
        let mut local = TriggerMap::new();
        let mut ctx = ToolkitContext::new(fonts, &mut local, self.entities, self.profile);
        match exporter.export_toolkit(widget, &mut ctx) {
            Ok(node) => {
                triggers.extend(local);
                vec![Node::Comment(annotation), node]
            }
            Err(err) => {
                warn!(
                    "Toolkit export of widget '{}' ({}) failed: {:#}",
                    widget.id, widget.kind, err
                );
                diagnostics.push(
                    Diagnostic::error(format!("Toolkit export failed: {err:#}"))
                        .for_widget(&widget.id),
                );
                vec![Node::Comment(format!("{annotation} status:error"))]
            }
        }
    }
}

/// Plain `obj` standing in for widget types without a toolkit exporter.
fn generic_object(widget: &Widget) -> Node {
    let color = widget
        .prop_str("bg_color")
        .or_else(|| widget.prop_str("color"))
        .unwrap_or_else(|| "white".to_string());
    let obj = common_props(widget).with("bg_color", convert_color(Some(&color)));
    Node::map().with("obj", obj)
}

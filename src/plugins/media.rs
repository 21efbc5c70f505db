//! Bitmap widgets backed by a top-level component: local images, downloaded
//! images and QR codes.

use super::{
    color_const, common_props, convert_color, lvgl, DirectContext, DirectExport, PluginRegistry,
    SectionContext, ToolkitContext, ToolkitExport, WidgetPlugin,
};
use crate::compiler::entities::sanitize;
use crate::compiler::ir::{Node, Section};
use crate::models::{HardwareProfile, Widget};
use anyhow::Result;

pub(super) fn register(registry: &mut PluginRegistry) {
    registry.register(Box::new(ImagePlugin));
    registry.register(Box::new(OnlineImagePlugin));
    registry.register(Box::new(QrCodePlugin));
}

/// Pixel format for a bitmap: the widget's choice, else one fitting the panel.
fn image_type(widget: &Widget, profile: &HardwareProfile) -> String {
    widget
        .prop_str("image_type")
        .or_else(|| widget.prop_str("img_type"))
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| {
            if profile.is_epaper() {
                "BINARY".to_string()
            } else {
                "RGB565".to_string()
            }
        })
}

fn resize(widget: &Widget) -> Option<Node> {
    (widget.width > 0 && widget.height > 0)
        .then(|| Node::scalar(format!("{}x{}", widget.width, widget.height)))
}

/// Draws a bitmap, swapping the two colors for inverted widgets.
fn draw_image(widget: &Widget, image_id: &str, ctx: &mut DirectContext<'_>) {
    let (x, y) = (widget.x, widget.y);
    if widget.flag("invert") {
        ctx.push(format!("it.image({x}, {y}, id({image_id}), color_off, color_on);"));
    } else {
        ctx.push(format!("it.image({x}, {y}, id({image_id}));"));
    }
}

/// Crossed frame drawn when a widget has nothing to show.
fn placeholder(widget: &Widget, ctx: &mut DirectContext<'_>) {
    let (x, y, w, h) = (widget.x, widget.y, widget.width, widget.height);
    let color = color_const(&widget.prop_str_or("color", "black"));
    ctx.push(format!("it.rectangle({x}, {y}, {w}, {h}, {color});"));
    ctx.push(format!("it.line({x}, {y}, {}, {}, {color});", x + w, y + h));
    ctx.push(format!("it.line({}, {y}, {x}, {}, {color});", x + w, y + h));
}

/// Toolkit `image` widget showing a declared bitmap.
fn image_node(widget: &Widget, image_id: &str) -> Node {
    let recolor = widget.prop_str("color").filter(|c| !c.trim().is_empty());
    let image = common_props(widget)
        .with("src", Node::scalar(image_id))
        .with_opt(
            "angle",
            widget.prop_i64("rotation").filter(|r| *r != 0).map(Node::scalar),
        )
        .with_opt("image_recolor", recolor.as_deref().map(|c| convert_color(Some(c))))
        .with_opt("image_recolor_opa", recolor.map(|_| Node::scalar("COVER")));
    Node::map().with("image", image)
}

// ============================================================================
// image
// ============================================================================

/// A bitmap compiled into the firmware from a local file.
#[derive(Debug, Default)]
pub struct ImagePlugin;

impl ImagePlugin {
    /// Component id of the bitmap.
    pub fn image_id(widget: &Widget) -> String {
        format!("img_{}", sanitize(&widget.id))
    }

    fn path(widget: &Widget) -> Option<String> {
        widget
            .prop_str("path")
            .map(|p| p.trim().trim_matches('"').trim().to_string())
            .filter(|p| !p.is_empty())
    }
}

impl WidgetPlugin for ImagePlugin {
    fn kind(&self) -> &'static str {
        "image"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn on_export_components(&self, ctx: &mut SectionContext<'_>) {
        let profile = ctx.profile;
        let mut section = Section::list("image");
        for widget in ctx.widgets_of("image") {
            let Some(path) = Self::path(widget) else {
                continue;
            };
            section.push(
                Node::map()
                    .with("file", Node::quoted(&path))
                    .with("id", Node::scalar(Self::image_id(widget)))
                    .with_opt("resize", resize(widget))
                    .with("type", Node::scalar(image_type(widget, profile)))
                    .with_opt(
                        "dither",
                        widget
                            .prop_str("dither")
                            .filter(|d| !d.trim().is_empty())
                            .map(|d| Node::scalar(d.trim().to_uppercase())),
                    )
                    .with_opt(
                        "transparency",
                        widget
                            .prop_str("transparency")
                            .filter(|t| !t.trim().is_empty())
                            .map(|t| Node::scalar(t.trim().to_lowercase())),
                    ),
            );
        }
        if !section.is_empty() {
            ctx.push_section(section);
        }
    }
}

impl DirectExport for ImagePlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        if Self::path(widget).is_some() {
            draw_image(widget, &Self::image_id(widget), ctx);
        } else {
            placeholder(widget, ctx);
        }
        Ok(())
    }
}

impl ToolkitExport for ImagePlugin {
    fn export_toolkit(&self, widget: &Widget, _ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let src = match Self::path(widget) {
            Some(_) => Self::image_id(widget),
            None => "symbol_image".to_string(),
        };
        Ok(image_node(widget, &src))
    }
}

// ============================================================================
// online_image
// ============================================================================

/// A bitmap downloaded at runtime and refreshed periodically.
#[derive(Debug, Default)]
pub struct OnlineImagePlugin;

impl OnlineImagePlugin {
    /// Component id of the downloaded bitmap.
    pub fn image_id(widget: &Widget) -> String {
        format!("online_img_{}", sanitize(&widget.id))
    }

    fn url(widget: &Widget) -> Option<String> {
        widget
            .prop_str("url")
            .or_else(|| widget.prop_str("image_url"))
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
    }

    /// Decoder picked from the URL unless the widget names one.
    pub fn format(widget: &Widget, url: &str) -> String {
        if let Some(format) = widget.prop_str("format").filter(|f| !f.trim().is_empty()) {
            return format.trim().to_uppercase();
        }
        let path = url.split(['?', '#']).next().unwrap_or_default().to_lowercase();
        if path.ends_with(".jpg") || path.ends_with(".jpeg") {
            "JPEG".to_string()
        } else if path.ends_with(".bmp") {
            "BMP".to_string()
        } else {
            "PNG".to_string()
        }
    }

    fn interval_secs(widget: &Widget) -> i64 {
        widget
            .prop_i64("interval_s")
            .or_else(|| widget.prop_i64("interval"))
            .unwrap_or(300)
            .max(1)
    }
}

impl WidgetPlugin for OnlineImagePlugin {
    fn kind(&self) -> &'static str {
        "online_image"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn on_export_components(&self, ctx: &mut SectionContext<'_>) {
        let profile = ctx.profile;
        let toolkit_mode = ctx.toolkit_mode;
        let mut section = Section::list("online_image");
        for widget in ctx.widgets_of("online_image") {
            let Some(url) = Self::url(widget) else {
                continue;
            };
            let id = Self::image_id(widget);
            let redraw = if toolkit_mode {
                Node::map().with(
                    "lvgl.image.update",
                    Node::map()
                        .with("id", Node::scalar(&widget.id))
                        .with("src", Node::scalar(&id)),
                )
            } else {
                Node::map().with("component.update", Node::scalar(profile.display_id()))
            };
            section.push(
                Node::map()
                    .with("url", Node::quoted(&url))
                    .with("id", Node::scalar(&id))
                    .with("format", Node::scalar(Self::format(widget, &url)))
                    .with("type", Node::scalar(image_type(widget, profile)))
                    .with_opt("resize", resize(widget))
                    .with(
                        "update_interval",
                        Node::scalar(format!("{}s", Self::interval_secs(widget))),
                    )
                    .with("on_download_finished", Node::list().item(redraw)),
            );
        }
        if !section.is_empty() {
            ctx.push_section(section);
        }
    }
}

impl DirectExport for OnlineImagePlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        if Self::url(widget).is_some() {
            draw_image(widget, &Self::image_id(widget), ctx);
        } else {
            placeholder(widget, ctx);
        }
        Ok(())
    }
}

impl ToolkitExport for OnlineImagePlugin {
    fn export_toolkit(&self, widget: &Widget, _ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let src = match Self::url(widget) {
            Some(_) => Self::image_id(widget),
            None => "symbol_image".to_string(),
        };
        Ok(image_node(widget, &src))
    }
}

// ============================================================================
// qr_code
// ============================================================================

/// QR code drawn by the display lambda from a `qr_code:` component.
#[derive(Debug, Default)]
pub struct QrCodePlugin;

impl QrCodePlugin {
    /// Component id of the code.
    pub fn code_id(widget: &Widget) -> String {
        format!("qr_{}", sanitize(&widget.id))
    }

    fn value(widget: &Widget) -> String {
        widget
            .prop_str("value")
            .or_else(|| widget.prop_str("text"))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "https://esphome.io".to_string())
    }
}

impl WidgetPlugin for QrCodePlugin {
    fn kind(&self) -> &'static str {
        "qr_code"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }

    fn on_export_components(&self, ctx: &mut SectionContext<'_>) {
        // the toolkit encodes its own codes
        if ctx.toolkit_mode {
            return;
        }
        let mut section = Section::list("qr_code");
        for widget in ctx.widgets_of("qr_code") {
            section.push(
                Node::map()
                    .with("id", Node::scalar(Self::code_id(widget)))
                    .with("value", Node::quoted(&Self::value(widget)))
                    .with(
                        "ecc",
                        Node::scalar(widget.prop_str_or("ecc", "LOW").to_uppercase()),
                    ),
            );
        }
        if !section.is_empty() {
            ctx.push_section(section);
        }
    }
}

impl DirectExport for QrCodePlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let color = color_const(&widget.prop_str_or("color", "black"));
        let scale = widget.prop_i64_or("scale", 2).max(1);
        ctx.push(format!(
            "it.qr_code({}, {}, id({}), {color}, {scale});",
            widget.x,
            widget.y,
            Self::code_id(widget)
        ));
        Ok(())
    }
}

impl ToolkitExport for QrCodePlugin {
    fn export_toolkit(&self, widget: &Widget, _ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        Ok(lvgl::qrcode(widget, &Self::value(widget)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::entities::EntityTable;
    use crate::compiler::fonts::FontRegistry;
    use crate::models::Resolution;
    use crate::plugins::PluginWidget;

    fn epaper() -> HardwareProfile {
        let mut p = HardwareProfile::new("t", "T", "esp32s3", "7.50inv2", Resolution::default());
        p.features.epaper = true;
        p
    }

    fn direct(plugin: &dyn DirectExport, widget: &Widget) -> Vec<String> {
        let profile = epaper();
        let mut fonts = FontRegistry::new();
        let table = EntityTable::new();
        let mut ctx = DirectContext::new(&mut fonts, &table, &profile);
        plugin.export(widget, &mut ctx).unwrap();
        ctx.into_lines()
    }

    fn components(
        plugin: &dyn WidgetPlugin,
        widget: &Widget,
        profile: &HardwareProfile,
        toolkit_mode: bool,
    ) -> Vec<Section> {
        let widgets = [PluginWidget {
            kind: plugin.kind(),
            page: 0,
            widget,
        }];
        let mut table = EntityTable::new();
        let mut ctx = SectionContext::new(&widgets, &mut table, profile, toolkit_mode, 1);
        plugin.on_export_components(&mut ctx);
        ctx.into_parts().1
    }

    #[test]
    fn test_image_component_and_draw() {
        let w = Widget::new("logo-1", "image", 10, 20, 120, 60)
            .with_prop("path", "\"/config/esphome/logo.png\"")
            .with_prop("invert", true);
        let sections = components(&ImagePlugin, &w, &epaper(), false);
        let item = &sections[0].items()[0];
        assert_eq!(sections[0].name, "image");
        assert_eq!(
            item.get("file").and_then(Node::as_scalar),
            Some("\"/config/esphome/logo.png\"")
        );
        assert_eq!(item.get("id").and_then(Node::as_scalar), Some("img_logo_1"));
        assert_eq!(item.get("resize").and_then(Node::as_scalar), Some("120x60"));
        assert_eq!(item.get("type").and_then(Node::as_scalar), Some("BINARY"));

        assert_eq!(
            direct(&ImagePlugin, &w),
            vec!["it.image(10, 20, id(img_logo_1), color_off, color_on);"]
        );
    }

    #[test]
    fn test_image_without_path_draws_placeholder() {
        let w = Widget::new("img", "image", 0, 0, 50, 40);
        assert!(components(&ImagePlugin, &w, &epaper(), false).is_empty());
        let lines = direct(&ImagePlugin, &w);
        assert_eq!(lines[0], "it.rectangle(0, 0, 50, 40, COLOR_BLACK);");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_online_image_redraws_after_download() {
        let w = Widget::new("cam", "online_image", 0, 0, 320, 240)
            .with_prop("url", "http://cam.local/snapshot.JPG?size=small")
            .with_prop("interval_s", 60);
        let sections = components(&OnlineImagePlugin, &w, &epaper(), false);
        let item = &sections[0].items()[0];
        assert_eq!(item.get("format").and_then(Node::as_scalar), Some("JPEG"));
        assert_eq!(item.get("update_interval").and_then(Node::as_scalar), Some("60s"));
        let actions = item.get("on_download_finished").and_then(Node::as_list).unwrap();
        assert_eq!(
            actions[0].get("component.update").and_then(Node::as_scalar),
            Some("epaper_display")
        );

        let toolkit = components(&OnlineImagePlugin, &w, &epaper(), true);
        let actions = toolkit[0].items()[0]
            .get("on_download_finished")
            .and_then(Node::as_list)
            .unwrap();
        assert!(actions[0].get("lvgl.image.update").is_some());
    }

    #[test]
    fn test_online_image_type_follows_panel() {
        let w = Widget::new("cam", "online_image", 0, 0, 320, 240).with_prop("url", "http://x/y");
        let lcd = HardwareProfile::new("l", "L", "esp32s3", "st7789v", Resolution::default());
        let sections = components(&OnlineImagePlugin, &w, &lcd, false);
        let item = &sections[0].items()[0];
        assert_eq!(item.get("type").and_then(Node::as_scalar), Some("RGB565"));
        assert_eq!(item.get("format").and_then(Node::as_scalar), Some("PNG"));
    }

    #[test]
    fn test_qr_code_component_only_in_direct_mode() {
        let w = Widget::new("qr", "qr_code", 5, 5, 100, 100)
            .with_prop("value", "WIFI:S:home;;")
            .with_prop("scale", 3);
        let sections = components(&QrCodePlugin, &w, &epaper(), false);
        let item = &sections[0].items()[0];
        assert_eq!(item.get("value").and_then(Node::as_scalar), Some("\"WIFI:S:home;;\""));
        assert_eq!(item.get("ecc").and_then(Node::as_scalar), Some("LOW"));
        assert!(components(&QrCodePlugin, &w, &epaper(), true).is_empty());

        assert_eq!(
            direct(&QrCodePlugin, &w),
            vec!["it.qr_code(5, 5, id(qr_qr), COLOR_BLACK, 3);"]
        );
    }
}

//! Rectangles, circles and lines.

use super::{
    color_const, common_props, convert_color, format_opacity, is_gray, DirectContext,
    DirectExport, PluginRegistry, ToolkitContext, ToolkitExport, WidgetPlugin,
};
use crate::compiler::ir::Node;
use crate::models::Widget;
use anyhow::Result;

pub(super) fn register(registry: &mut PluginRegistry) {
    registry.register(Box::new(RectPlugin));
    registry.register(Box::new(CirclePlugin));
    registry.register(Box::new(LinePlugin));
}

fn border_width(widget: &Widget) -> i64 {
    widget.prop_i64_or("border_width", 1).max(0)
}

/// Draw color for a shape. Grey on e-paper is drawn black and dithered.
fn draw_color(ctx: &DirectContext<'_>, color: &str) -> String {
    if ctx.is_epaper && is_gray(color) {
        "COLOR_BLACK".to_string()
    } else {
        color_const(color)
    }
}

/// Filled or outlined rectangle (`shape_rect`, aliases `rectangle`, `rounded_rect`).
#[derive(Debug, Default)]
pub struct RectPlugin;

impl WidgetPlugin for RectPlugin {
    fn kind(&self) -> &'static str {
        "shape_rect"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }
}

impl DirectExport for RectPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let (x, y, w, h) = (widget.x, widget.y, widget.width, widget.height);
        let color_prop = widget.prop_str_or("color", "black");

        if widget.flag("fill") {
            let color = draw_color(ctx, &color_prop);
            ctx.push(format!("it.filled_rectangle({x}, {y}, {w}, {h}, {color});"));
            ctx.dither(&color_prop, x, y, w, h);
            return Ok(());
        }

        let border_prop = widget
            .prop_str("border_color")
            .unwrap_or_else(|| color_prop.clone());
        let color = draw_color(ctx, &border_prop);
        match border_width(widget) {
            0 => {}
            1 => ctx.push(format!("it.rectangle({x}, {y}, {w}, {h}, {color});")),
            bw => {
                ctx.push(format!("for (int i = 0; i < {bw}; i++) {{"));
                ctx.push(format!(
                    "  it.rectangle({x} + i, {y} + i, {w} - 2 * i, {h} - 2 * i, {color});"
                ));
                ctx.push("}");
            }
        }
        Ok(())
    }
}

impl ToolkitExport for RectPlugin {
    fn export_toolkit(&self, widget: &Widget, _ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let fill = widget.flag("fill");
        let color = widget.prop_str("color");
        let border = widget.prop_str("border_color").or_else(|| color.clone());
        let radius = widget
            .prop_i64("radius")
            .unwrap_or(if widget.kind == "rounded_rect" { 10 } else { 0 });

        let obj = common_props(widget)
            .with("bg_color", convert_color(color.as_deref()))
            .with("bg_opa", Node::scalar(if fill { "COVER" } else { "TRANSP" }))
            .with("border_width", Node::scalar(border_width(widget)))
            .with("border_color", convert_color(border.as_deref()))
            .with("radius", Node::scalar(radius))
            .with("opa", format_opacity(widget.props.get("opa")));
        Ok(Node::map().with("obj", obj))
    }
}

/// Circle inscribed in the widget box (`shape_circle`, alias `circle`).
#[derive(Debug, Default)]
pub struct CirclePlugin;

impl WidgetPlugin for CirclePlugin {
    fn kind(&self) -> &'static str {
        "shape_circle"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }
}

impl DirectExport for CirclePlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let r = widget.width.min(widget.height) / 2;
        let cx = widget.x + widget.width / 2;
        let cy = widget.y + widget.height / 2;
        let color_prop = widget.prop_str_or("color", "black");
        let color = draw_color(ctx, &color_prop);

        if widget.flag("fill") {
            ctx.push(format!("it.filled_circle({cx}, {cy}, {r}, {color});"));
            ctx.dither(&color_prop, widget.x, widget.y, widget.width, widget.height);
            return Ok(());
        }

        match border_width(widget) {
            0 => {}
            1 => ctx.push(format!("it.circle({cx}, {cy}, {r}, {color});")),
            bw => {
                ctx.push(format!("for (int i = 0; i < {bw}; i++) {{"));
                ctx.push(format!("  it.circle({cx}, {cy}, {r} - i, {color});"));
                ctx.push("}");
            }
        }
        Ok(())
    }
}

impl ToolkitExport for CirclePlugin {
    fn export_toolkit(&self, widget: &Widget, _ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let color = widget.prop_str("color");
        let border = widget.prop_str("border_color").or_else(|| color.clone());
        let fill = widget.flag("fill");

        let obj = common_props(widget)
            .with("bg_color", convert_color(color.as_deref()))
            .with("bg_opa", Node::scalar(if fill { "COVER" } else { "TRANSP" }))
            .with("border_width", Node::scalar(border_width(widget)))
            .with("border_color", convert_color(border.as_deref()))
            .with("radius", Node::scalar(widget.width.min(widget.height) / 2))
            .with("opa", format_opacity(widget.props.get("opa")));
        Ok(Node::map().with("obj", obj))
    }
}

/// Horizontal or vertical line drawn as a thin filled rectangle.
#[derive(Debug, Default)]
pub struct LinePlugin;

impl LinePlugin {
    fn stroke(widget: &Widget) -> i64 {
        widget.prop_i64_or("stroke_width", 3).max(1)
    }

    fn is_vertical(widget: &Widget) -> bool {
        match widget.prop_str("orientation").as_deref() {
            Some("vertical") => true,
            Some(_) => false,
            None => widget.height > widget.width,
        }
    }
}

impl WidgetPlugin for LinePlugin {
    fn kind(&self) -> &'static str {
        "line"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn toolkit(&self) -> Option<&dyn ToolkitExport> {
        Some(self)
    }
}

impl DirectExport for LinePlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let color_prop = widget.prop_str_or("color", "black");
        let color = draw_color(ctx, &color_prop);
        let stroke = Self::stroke(widget);
        let (x, y) = (widget.x, widget.y);

        if Self::is_vertical(widget) {
            let h = widget.height;
            ctx.push(format!("it.filled_rectangle({x}, {y}, {stroke}, {h}, {color});"));
            ctx.dither(&color_prop, x, y, stroke as i32, h);
        } else {
            let w = widget.width;
            ctx.push(format!("it.filled_rectangle({x}, {y}, {w}, {stroke}, {color});"));
            ctx.dither(&color_prop, x, y, w, stroke as i32);
        }
        Ok(())
    }
}

impl ToolkitExport for LinePlugin {
    fn export_toolkit(&self, widget: &Widget, _ctx: &mut ToolkitContext<'_>) -> Result<Node> {
        let end = if Self::is_vertical(widget) {
            format!("0, {}", widget.height)
        } else {
            format!("{}, 0", widget.width)
        };
        let points = Node::list()
            .item(Node::scalar("0, 0"))
            .item(Node::scalar(end));

        let line = Node::map()
            .with("id", Node::scalar(&widget.id))
            .with("x", Node::scalar(widget.x))
            .with("y", Node::scalar(widget.y))
            .with("points", points)
            .with("line_width", Node::scalar(Self::stroke(widget)))
            .with(
                "line_color",
                convert_color(widget.prop_str("color").as_deref()),
            )
            .with("line_rounded", Node::scalar(widget.flag("rounded")))
            .with("opa", format_opacity(widget.props.get("opa")));
        Ok(Node::map().with("line", line))
    }
}

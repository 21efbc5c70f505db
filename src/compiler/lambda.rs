//! Display lambda generation (direct rendering path).

use super::annotation::widget_annotation;
use super::condition::condition_check;
use super::entities::EntityTable;
use super::fonts::FontRegistry;
use super::Diagnostic;
use crate::models::{HardwareProfile, Page, Widget};
use crate::plugins::{DirectContext, PluginRegistry};
use tracing::warn;

const DITHER_HELPER: [&str; 8] = [
    "auto apply_grey_dither_mask = [&](int x_start, int y_start, int w, int h) {",
    "  for (int y = y_start; y < y_start + h; y++) {",
    "    for (int x = x_start; x < x_start + w; x++) {",
    "      if ((x + y) % 2 == 0) it.draw_pixel_at(x, y, COLOR_WHITE);",
    "      else it.draw_pixel_at(x, y, COLOR_BLACK);",
    "    }",
    "  }",
    "};",
];

/// Builds the body of the display lambda, one `if (currentPage == N)` block per page.
pub struct LambdaGenerator<'a> {
    registry: &'a PluginRegistry,
    entities: &'a EntityTable,
    profile: &'a HardwareProfile,
    inverted: bool,
}

impl<'a> LambdaGenerator<'a> {
    /// Creates a generator. Inverted output follows the project or the profile.
    pub fn new(
        registry: &'a PluginRegistry,
        entities: &'a EntityTable,
        profile: &'a HardwareProfile,
        inverted: bool,
    ) -> Self {
        Self {
            registry,
            entities,
            profile,
            inverted: inverted || profile.features.inverted_colors,
        }
    }

    /// Generates the lambda lines, unindented.
    pub fn generate(
        &self,
        pages: &[Page],
        fonts: &mut FontRegistry,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<String> {
        let mut lines = self.header();

        for (index, page) in pages.iter().enumerate() {
            lines.push(format!("if (currentPage == {index}) {{"));
            lines.extend(page_comments(page, index));

            let dark = page.dark_mode.as_deref() == Some("dark");
            let (background, foreground) = if dark {
                ("COLOR_BLACK", "COLOR_WHITE")
            } else {
                ("COLOR_WHITE", "COLOR_BLACK")
            };
            lines.push("  // Clear screen for this page".to_string());
            lines.push(format!("  it.fill({background});"));
            lines.push(format!("  color_off = {background};"));
            lines.push(format!("  color_on = {foreground};"));

            for widget in page.exported_widgets() {
                let widget_lines = self.widget_lines(widget, fonts, diagnostics);
                lines.extend(reindent(&widget_lines));
            }
            lines.push("}".to_string());
        }
        lines
    }

    fn header(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.inverted {
            lines.push(
                "const auto COLOR_WHITE = Color(0, 0, 0); // Inverted for e-ink".to_string(),
            );
            lines.push(
                "const auto COLOR_BLACK = Color(255, 255, 255); // Inverted for e-ink".to_string(),
            );
        } else {
            lines.push("const auto COLOR_WHITE = Color(255, 255, 255);".to_string());
            lines.push("const auto COLOR_BLACK = Color(0, 0, 0);".to_string());
        }
        for (name, rgb) in [
            ("RED", "255, 0, 0"),
            ("GREEN", "0, 255, 0"),
            ("BLUE", "0, 0, 255"),
            ("YELLOW", "255, 255, 0"),
            ("ORANGE", "255, 165, 0"),
        ] {
            lines.push(format!("const auto COLOR_{name} = Color({rgb});"));
        }
        lines.push("auto color_off = COLOR_WHITE;".to_string());
        lines.push("auto color_on = COLOR_BLACK;".to_string());
        lines.push(String::new());
        lines.push(
            "// Helper to apply a simple grey dither mask for e-paper (checkerboard)".to_string(),
        );
        lines.extend(DITHER_HELPER.iter().map(|l| l.to_string()));
        lines.push("int currentPage = id(display_page);".to_string());
        lines
    }

    /// Lines for one widget: annotation, optional guard, drawing code.
    ///
    /// Export failures are contained to the widget: partial output is
    /// discarded and the annotation carries `status:error`.
    pub fn widget_lines(
        &self,
        widget: &Widget,
        fonts: &mut FontRegistry,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<String> {
        let annotation = format!("// {}", widget_annotation(widget));

        let Some(plugin) = self.registry.get(&widget.kind) else {
            if widget.kind.starts_with("lvgl_") {
                return vec![annotation];
            }
            diagnostics.push(
                Diagnostic::warning(format!("Unsupported widget type: {}", widget.kind))
                    .for_widget(&widget.id),
            );
            return vec![
                format!("{annotation} status:unsupported"),
                format!("// Unsupported widget type: {}", widget.kind),
            ];
        };

        // Toolkit-only widgets keep their annotation so they survive round trips.
        let Some(exporter) = plugin.direct() else {
            return vec![annotation];
        };

        let mut ctx = DirectContext::new(fonts, self.entities, self.profile);
        if let Err(err) = exporter.export(widget, &mut ctx) {
            warn!("Export of widget '{}' ({}) failed: {:#}", widget.id, widget.kind, err);
            diagnostics.push(
                Diagnostic::error(format!("Export failed: {err:#}")).for_widget(&widget.id),
            );
            return vec![format!("{annotation} status:error")];
        }
        let body = ctx.into_lines();

        let mut lines = vec![annotation];
        match condition_check(widget, self.entities) {
            Some(guard) => {
                lines.push(guard);
                lines.extend(body.into_iter().map(|l| indent(&l)));
                lines.push("}".to_string());
            }
            None => lines.extend(body),
        }
        lines
    }
}

fn indent(line: &str) -> String {
    if line.trim().is_empty() {
        String::new()
    } else {
        format!("  {line}")
    }
}

fn quote_comment(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn page_comments(page: &Page, index: usize) -> Vec<String> {
    let name = if page.name.is_empty() {
        format!("Page {}", index + 1)
    } else {
        page.name.clone()
    };
    vec![
        format!("  // page:name {}", quote_comment(&name)),
        format!(
            "  // page:dark_mode {}",
            quote_comment(page.dark_mode.as_deref().unwrap_or("inherit"))
        ),
        format!(
            "  // page:refresh_type {}",
            quote_comment(page.refresh_type.as_deref().unwrap_or("interval"))
        ),
        format!(
            "  // page:refresh_time {}",
            quote_comment(page.refresh_time.as_deref().unwrap_or(""))
        ),
    ]
}

/// Strips the common leading indentation and re-indents by two spaces.
///
/// Relative indentation inside the block is preserved; blank lines stay blank.
pub fn reindent(lines: &[String]) -> Vec<String> {
    let min = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                format!("  {}", &l[min..])
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Severity;
    use crate::models::{Condition, Resolution};

    fn profile() -> HardwareProfile {
        let mut profile =
            HardwareProfile::new("t", "T", "esp32", "waveshare_epaper", Resolution::default());
        profile.features.epaper = true;
        profile
    }

    fn run(pages: &[Page], inverted: bool) -> (Vec<String>, Vec<Diagnostic>) {
        let registry = PluginRegistry::with_builtins();
        let table = EntityTable::new();
        let profile = profile();
        let mut fonts = FontRegistry::new();
        let mut diagnostics = Vec::new();
        let generator = LambdaGenerator::new(&registry, &table, &profile, inverted);
        let lines = generator.generate(pages, &mut fonts, &mut diagnostics);
        (lines, diagnostics)
    }

    #[test]
    fn test_header_and_page_block() {
        let mut page = Page::new("");
        page.widgets
            .push(Widget::new("r1", "shape_rect", 0, 0, 10, 10));
        let (lines, diagnostics) = run(&[page], false);

        assert!(diagnostics.is_empty());
        assert_eq!(lines[0], "const auto COLOR_WHITE = Color(255, 255, 255);");
        assert!(lines.contains(&"int currentPage = id(display_page);".to_string()));
        assert!(lines.contains(&"if (currentPage == 0) {".to_string()));
        assert!(lines.contains(&"  // page:name \"Page 1\"".to_string()));
        assert!(lines.contains(&"  // page:dark_mode \"inherit\"".to_string()));
        assert!(lines.contains(&"  it.rectangle(0, 0, 10, 10, COLOR_BLACK);".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("}"));
    }

    #[test]
    fn test_inverted_colors() {
        let (lines, _) = run(&[], true);
        assert_eq!(
            lines[0],
            "const auto COLOR_WHITE = Color(0, 0, 0); // Inverted for e-ink"
        );
    }

    #[test]
    fn test_dark_page_swaps_colors() {
        let mut page = Page::new("Night");
        page.dark_mode = Some("dark".to_string());
        let (lines, _) = run(&[page], false);
        assert!(lines.contains(&"  it.fill(COLOR_BLACK);".to_string()));
        assert!(lines.contains(&"  color_on = COLOR_WHITE;".to_string()));
    }

    #[test]
    fn test_unsupported_widget_is_contained() {
        let mut page = Page::new("P");
        page.widgets.push(Widget::new("m1", "mystery", 1, 2, 3, 4));
        page.widgets.push(Widget::new("r1", "shape_rect", 0, 0, 10, 10));
        let (lines, diagnostics) = run(&[page], false);

        assert!(lines.iter().any(|l| {
            l.starts_with("  // widget:mystery id:m1") && l.ends_with("status:unsupported")
        }));
        assert!(lines.contains(&"  // Unsupported widget type: mystery".to_string()));
        assert!(lines.iter().any(|l| l.contains("it.rectangle(")));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_failing_widget_keeps_annotation() {
        let mut page = Page::new("P");
        page.widgets
            .push(Widget::new("i1", "icon", 0, 0, 40, 40).with_prop("code", "not-an-icon"));
        let (lines, diagnostics) = run(&[page], false);

        assert!(lines
            .iter()
            .any(|l| l.starts_with("  // widget:icon id:i1") && l.ends_with("status:error")));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].widget.as_deref(), Some("i1"));
    }

    #[test]
    fn test_toolkit_widget_keeps_annotation() {
        let mut page = Page::new("P");
        page.widgets
            .push(Widget::new("b1", "lvgl_button", 0, 0, 100, 40));
        let (lines, _) = run(&[page], false);
        assert!(lines.iter().any(|l| l.starts_with("  // widget:lvgl_button id:b1")));
    }

    #[test]
    fn test_condition_guard_wraps_body() {
        let mut page = Page::new("P");
        page.widgets.push(
            Widget::new("r1", "shape_rect", 0, 0, 10, 10)
                .with_condition(Condition::equals("binary_sensor.door", "on")),
        );
        let (lines, _) = run(&[page], false);
        let start = lines
            .iter()
            .position(|l| l == "  if (id(binary_sensor_door).state) {")
            .unwrap();
        assert_eq!(lines[start + 1], "    it.rectangle(0, 0, 10, 10, COLOR_BLACK);");
        assert_eq!(lines[start + 2], "  }");
    }

    #[test]
    fn test_hidden_widgets_are_skipped() {
        let mut page = Page::new("P");
        let mut hidden = Widget::new("h", "shape_rect", 0, 0, 10, 10);
        hidden.hidden = true;
        page.widgets.push(hidden);
        let (lines, _) = run(&[page], false);
        assert!(!lines.iter().any(|l| l.contains("id:h ")));
    }

    #[test]
    fn test_reindent() {
        let lines = vec![
            "    a".to_string(),
            "      b".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(reindent(&lines), vec!["  a", "    b", ""]);
    }
}

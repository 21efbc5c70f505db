//! Rebuilds a project from a generated document.
//!
//! Generated documents are self-describing: the `# project:` line carries
//! the project settings, page boundaries are the lambda's
//! `if (currentPage == N)` blocks (or `- id: page_N` entries of the toolkit
//! snippet), page comments carry page settings and every exported widget has
//! a `widget:` annotation.

use crate::compiler::annotation::{parse_page_comment, parse_project, parse_widget};
use crate::models::{Page, Project};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn direct_page_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*if \(currentPage == (\d+)\) \{").expect("valid page regex")
    })
}

fn toolkit_page_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*-\s*id:\s*page_(\d+)\s*$").expect("valid page regex")
    })
}

/// Summary of an import.
#[derive(Debug, Clone)]
pub struct ImportedProject {
    /// The rebuilt project
    pub project: Project,
    /// True when the document carried a project settings line
    pub has_settings: bool,
    /// Annotations that could not be read back
    pub skipped: Vec<String>,
}

/// Returns `(page index, is toolkit page)` for a page boundary line.
fn page_boundary(line: &str) -> Option<(usize, bool)> {
    if let Some(caps) = direct_page_pattern().captures(line) {
        return caps.get(1)?.as_str().parse().ok().map(|i| (i, false));
    }
    let caps = toolkit_page_pattern().captures(line)?;
    caps.get(1)?.as_str().parse().ok().map(|i| (i, true))
}

fn page_at(pages: &mut Vec<Page>, index: usize) -> &mut Page {
    while pages.len() <= index {
        let number = pages.len() + 1;
        pages.push(Page::new(format!("Page {number}")));
    }
    &mut pages[index]
}

fn is_annotation(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("// widget:") || trimmed.starts_with("# widget:")
}

fn is_page_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("// page:") || trimmed.starts_with("# page:")
}

/// Rebuilds a project from document text.
///
/// Widgets found before the first page boundary land on the first page. A
/// boundary that skips ahead of the next page is reported in `skipped`.
/// Settings the document does not carry keep their defaults.
pub fn import_document(text: &str) -> ImportedProject {
    let mut project = Project::default();
    let mut has_settings = false;
    let mut skipped = Vec::new();
    let mut pages: Vec<Page> = Vec::new();
    let mut current = 0;
    let mut layout_expected = false;

    for line in text.lines() {
        if !has_settings && parse_project(line, &mut project) {
            has_settings = true;
            continue;
        }

        if let Some((index, toolkit)) = page_boundary(line) {
            // pages are emitted in order, so a boundary may only open the next page
            if index > pages.len() {
                skipped.push(line.trim().to_string());
                continue;
            }
            page_at(&mut pages, index);
            current = index;
            layout_expected = toolkit;
            continue;
        }

        if layout_expected {
            layout_expected = false;
            if let Some(layout) = line.trim().strip_prefix("layout:") {
                page_at(&mut pages, current).layout = Some(layout.trim().to_string());
                continue;
            }
        }

        if is_annotation(line) {
            match parse_widget(line) {
                Some(widget) => page_at(&mut pages, current).widgets.push(widget),
                None => skipped.push(line.trim().to_string()),
            }
            continue;
        }

        if is_page_comment(line) {
            parse_page_comment(line, page_at(&mut pages, current));
        }
    }

    debug!(
        "Imported {} page(s), {} widget(s)",
        pages.len(),
        pages.iter().map(|p| p.widgets.len()).sum::<usize>()
    );
    project.pages = pages;
    ImportedProject {
        project,
        has_settings,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Orientation, RenderingMode};

    const DIRECT: &str = r#"# project: device:reterminal_e1001 orientation:portrait mode:direct refresh:300 name:"Hall Panel"
display:
  - platform: waveshare_epaper
    lambda: |-
      int currentPage = id(display_page);
      if (currentPage == 0) {
        // page:name "Home"
        // page:dark_mode "dark"
        // page:refresh_type "interval"
        // page:refresh_time ""
        // widget:text id:t1 type:text x:10 y:20 w:100 h:30 text:"Hello there"
        it.printf(10, 20, id(font_roboto_400_20), color_on, "Hello there");
      }
      if (currentPage == 1) {
        // page:name "Second"
        // widget:sensor_text id:s1 type:sensor_text x:0 y:0 w:50 h:20 entity:sensor.temp
      }
"#;

    #[test]
    fn test_import_direct_document() {
        let imported = import_document(DIRECT);
        assert!(imported.has_settings);
        let p = imported.project;
        assert_eq!(p.name, "Hall Panel");
        assert_eq!(p.device_model, "reterminal_e1001");
        assert_eq!(p.orientation, Orientation::Portrait);
        assert_eq!(p.rendering_mode, RenderingMode::Direct);
        assert_eq!(p.refresh_interval, Some(300));

        assert_eq!(p.pages.len(), 2);
        assert_eq!(p.pages[0].name, "Home");
        assert_eq!(p.pages[0].dark_mode.as_deref(), Some("dark"));
        assert_eq!(p.pages[0].widgets[0].id, "t1");
        assert_eq!(p.pages[0].widgets[0].prop_str("text").as_deref(), Some("Hello there"));
        assert_eq!(p.pages[1].name, "Second");
        assert_eq!(p.pages[1].widgets[0].entity_id.as_deref(), Some("sensor.temp"));
    }

    #[test]
    fn test_import_toolkit_document() {
        let text = "lvgl:\n  pages:\n    - id: page_0\n      layout: 2x2\n      widgets:\n        # widget:lvgl_label id:l1 type:lvgl_label x:0 y:0 w:10 h:10\n        - label:\n            id: l1\n    - id: page_1\n      widgets:\n        # widget:lvgl_bar id:b1 type:lvgl_bar x:0 y:0 w:10 h:10\n";
        let p = import_document(text).project;
        assert_eq!(p.pages.len(), 2);
        assert_eq!(p.pages[0].layout.as_deref(), Some("2x2"));
        assert_eq!(p.pages[0].widgets[0].kind, "lvgl_label");
        assert_eq!(p.pages[1].name, "Page 2");
        assert_eq!(p.pages[1].widgets[0].id, "b1");
    }

    #[test]
    fn test_import_without_settings_keeps_defaults() {
        let imported = import_document("sensor:\n  - platform: uptime\n");
        assert!(!imported.has_settings);
        assert!(imported.project.pages.is_empty());
        assert_eq!(imported.project, Project::default());
    }

    #[test]
    fn test_out_of_order_page_index_is_skipped() {
        let text = "# project: device:reterminal_e1001\n    if (currentPage == 3000000) {\n      // widget:text id:t1 type:text x:0 y:0 w:10 h:10\n";
        let imported = import_document(text);
        assert_eq!(imported.project.pages.len(), 1);
        assert_eq!(imported.project.pages[0].widgets[0].id, "t1");
        assert_eq!(imported.skipped, vec!["if (currentPage == 3000000) {"]);
    }

    #[test]
    fn test_page_index_may_not_skip_ahead() {
        let text = "    - id: page_0\n    - id: page_2\n    - id: page_1\n";
        let imported = import_document(text);
        assert_eq!(imported.project.pages.len(), 2);
        assert_eq!(imported.skipped, vec!["- id: page_2"]);
    }

    #[test]
    fn test_unreadable_annotation_is_reported() {
        let imported = import_document("      // widget:text x:1\n");
        assert_eq!(imported.skipped.len(), 1);
    }
}

//! Font and icon glyph registry.
//!
//! Widgets register the fonts they draw with while requirements are collected.
//! Each `(family, weight, size, italic)` combination is declared once, and
//! icon glyphs are grouped into one icon font per pixel size.

use crate::compiler::icons;
use crate::compiler::ir::{Node, Section};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

/// Font family whose glyphs come from tracked icons instead of a glyph list.
pub const ICON_FAMILY: &str = "Material Design Icons";

/// Local file the icon fonts are loaded from.
pub const ICON_FONT_FILE: &str = "fonts/materialdesignicons-webfont.ttf";

/// Extra glyphs declared on top of printable ASCII.
const EXTENDED_GLYPHS: [&str; 15] = [
    "B0", "B1", "B2", "B3", "B5", "A3", "A5", "A9", "AE", "D7", "F7", "3BC", "3A9", "20AC", "2122",
];

/// Resolves a symbolic icon name to its glyph code.
pub type IconResolver = fn(&str) -> Option<&'static str>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct FontSpec {
    id: String,
    family: String,
    weight: u32,
    size: u32,
    italic: bool,
}

/// Per-compilation font table.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    defined: HashSet<String>,
    fonts: Vec<FontSpec>,
    icons_by_size: Vec<(u32, BTreeSet<String>)>,
    resolver: IconResolver,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn icon_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^F[0-9A-F]{4}$").expect("valid icon code regex"))
}

/// Builds the deterministic font id for a font key.
pub fn font_id(family: &str, weight: u32, size: u32, italic: bool) -> String {
    let family = family
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    let suffix = if italic { "_italic" } else { "" };
    format!("font_{family}_{weight}_{size}{suffix}")
}

/// Id of the icon font for a pixel size.
pub fn icon_font_id(size: u32) -> String {
    font_id(ICON_FAMILY, 400, size, false)
}

impl FontRegistry {
    /// Creates an empty registry using the built-in icon table.
    pub fn new() -> Self {
        Self::with_icon_resolver(icons::resolve)
    }

    /// Creates an empty registry with a custom icon name lookup.
    pub fn with_icon_resolver(resolver: IconResolver) -> Self {
        Self {
            defined: HashSet::new(),
            fonts: Vec::new(),
            icons_by_size: Vec::new(),
            resolver,
        }
    }

    /// Registers a font and returns its id.
    ///
    /// Identical arguments always return the same id and never add a second
    /// declaration. A weight of zero is treated as 400.
    pub fn add_font(&mut self, family: &str, weight: u32, size: u32, italic: bool) -> String {
        let weight = if weight == 0 { 400 } else { weight };
        let id = font_id(family, weight, size, italic);
        if !self.defined.insert(id.clone()) {
            return id;
        }

        if family != ICON_FAMILY {
            self.fonts.push(FontSpec {
                id: id.clone(),
                family: family.to_string(),
                weight,
                size,
                italic,
            });
        }
        id
    }

    /// Tracks an icon glyph for the given size.
    ///
    /// Accepts a raw code (`F0595`, case-insensitive) or a symbolic name such
    /// as `weather-sunny` or `mdi:home`. Unresolvable names are ignored.
    pub fn track_icon(&mut self, name_or_code: &str, size: u32) {
        let trimmed = name_or_code.trim();
        if trimmed.is_empty() {
            return;
        }

        let code = if icon_code_pattern().is_match(trimmed) {
            trimmed.to_uppercase()
        } else {
            match (self.resolver)(trimmed) {
                Some(code) => code.to_uppercase(),
                None => {
                    tracing::debug!("Ignoring unknown icon '{}'", trimmed);
                    return;
                }
            }
        };

        if let Some((_, codes)) = self.icons_by_size.iter_mut().find(|(s, _)| *s == size) {
            codes.insert(code);
        } else {
            self.icons_by_size.push((size, BTreeSet::from([code])));
        }
    }

    /// Number of distinct font ids registered so far (icon fonts included).
    pub fn len(&self) -> usize {
        self.defined.len()
    }

    /// Returns true if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.defined.is_empty()
    }

    /// Builds the `font:` section.
    ///
    /// Synthesizes Roboto 400/20 when nothing was registered so the document
    /// always carries at least one font.
    pub fn emit(&mut self) -> Section {
        if self.defined.is_empty() {
            self.add_font("Roboto", 400, 20, false);
        }

        let mut section = Section::list("font");
        for font in &self.fonts {
            section.push(
                Node::map()
                    .with(
                        "file",
                        Node::map()
                            .with("type", Node::scalar("gfonts"))
                            .with("family", Node::quoted(&font.family))
                            .with("weight", Node::scalar(font.weight))
                            .with("italic", Node::scalar(font.italic)),
                    )
                    .with("id", Node::scalar(&font.id))
                    .with("size", Node::scalar(font.size))
                    .with("glyphs", Node::Scalar(text_glyphs())),
            );
        }

        for (size, codes) in &self.icons_by_size {
            let glyphs = codes
                .iter()
                .map(|c| format!("\"\\U000{c}\""))
                .collect::<Vec<_>>()
                .join(", ");
            section.push(
                Node::map()
                    .with("file", Node::quoted(ICON_FONT_FILE))
                    .with("id", Node::scalar(icon_font_id(*size)))
                    .with("size", Node::scalar(size))
                    .with("glyphs", Node::Scalar(format!("[{glyphs}]"))),
            );
        }

        section
    }
}

fn text_glyphs() -> String {
    let ascii = (0x20u32..=0x7e).map(|c| format!("\"\\U{c:08x}\""));
    let extended = EXTENDED_GLYPHS
        .iter()
        .map(|c| format!("\"\\U{:0>8}\"", c));
    let all: Vec<String> = ascii.chain(extended).collect();
    format!("[{}]", all.join(", "))
}

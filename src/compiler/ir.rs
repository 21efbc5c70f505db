//! Structured intermediate representation of the generated document.
//!
//! Sections are built as trees of [`Node`]s so later passes (trigger
//! injection, display-block removal) can edit declarations structurally.
//! Everything is rendered to text exactly once, by [`Document::render`].

/// A value in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A pre-formatted scalar, written verbatim after `key: ` or `- `
    Scalar(String),
    /// A literal block scalar (`|-`), one entry per line
    Block(Vec<String>),
    /// A `!lambda |-` block scalar
    Lambda(Vec<String>),
    /// An ordered mapping
    Map(Vec<(String, Node)>),
    /// A sequence
    List(Vec<Node>),
    /// A comment line, only meaningful inside a list
    Comment(String),
}

impl Node {
    /// Creates an empty mapping.
    pub const fn map() -> Self {
        Self::Map(Vec::new())
    }

    /// Creates an empty sequence.
    pub const fn list() -> Self {
        Self::List(Vec::new())
    }

    /// Creates a scalar from anything displayable.
    pub fn scalar(value: impl std::fmt::Display) -> Self {
        Self::Scalar(value.to_string())
    }

    /// Creates a double-quoted string scalar.
    pub fn quoted(value: &str) -> Self {
        Self::Scalar(quote(value))
    }

    /// Creates a `!lambda |-` block from lines.
    pub fn lambda<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Lambda(lines.into_iter().map(Into::into).collect())
    }

    /// Creates a single-quoted string scalar.
    pub fn single_quoted(value: impl std::fmt::Display) -> Self {
        Self::Scalar(format!("'{value}'"))
    }

    /// Appends a key to a mapping (builder style).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Self) -> Self {
        self.insert(key, value);
        self
    }

    /// Appends a key only when a value is present.
    #[must_use]
    pub fn with_opt(self, key: impl Into<String>, value: Option<Self>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Appends an item to a sequence (builder style).
    #[must_use]
    pub fn item(mut self, value: Self) -> Self {
        self.push(value);
        self
    }

    /// Inserts or replaces a key in a mapping. No-op for other node kinds.
    pub fn insert(&mut self, key: impl Into<String>, value: Self) {
        if let Self::Map(entries) = self {
            let key = key.into();
            if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
            } else {
                entries.push((key, value));
            }
        }
    }

    /// Pushes an item onto a sequence. No-op for other node kinds.
    pub fn push(&mut self, value: Self) {
        if let Self::List(items) = self {
            items.push(value);
        }
    }

    /// Looks up a key in a mapping.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Looks up a key in a mapping, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Self> {
        match self {
            Self::Map(entries) => entries
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Removes a key from a mapping.
    pub fn remove(&mut self, key: &str) -> Option<Self> {
        match self {
            Self::Map(entries) => {
                let idx = entries.iter().position(|(k, _)| k == key)?;
                Some(entries.remove(idx).1)
            }
            _ => None,
        }
    }

    /// The scalar text, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Items of a sequence, if this is one.
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Number of entries (map) or items (list); zero for scalars.
    pub fn len(&self) -> usize {
        match self {
            Self::Map(entries) => entries.len(),
            Self::List(items) => items.len(),
            _ => 0,
        }
    }

    /// Returns true for empty maps and lists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn render_into(&self, out: &mut Vec<String>, indent: usize) {
        let pad = " ".repeat(indent);
        match self {
            Self::Scalar(s) => out.push(format!("{pad}{s}")),
            Self::Block(lines) | Self::Lambda(lines) => push_block(out, lines, indent),
            Self::Comment(text) => out.push(format!("{pad}# {text}")),
            Self::Map(entries) => {
                for (key, value) in entries {
                    render_entry(out, &pad, key, value, indent);
                }
            }
            Self::List(items) => {
                for item in items {
                    render_item(out, item, indent);
                }
            }
        }
    }
}

fn push_block(out: &mut Vec<String>, lines: &[String], indent: usize) {
    let pad = " ".repeat(indent);
    for line in lines {
        if line.is_empty() {
            out.push(String::new());
        } else {
            out.push(format!("{pad}{line}"));
        }
    }
}

fn render_entry(out: &mut Vec<String>, pad: &str, key: &str, value: &Node, indent: usize) {
    match value {
        Node::Scalar(s) => out.push(format!("{pad}{key}: {s}")),
        Node::Block(lines) => {
            out.push(format!("{pad}{key}: |-"));
            push_block(out, lines, indent + 2);
        }
        Node::Lambda(lines) => {
            out.push(format!("{pad}{key}: !lambda |-"));
            push_block(out, lines, indent + 2);
        }
        Node::Map(entries) if entries.is_empty() => out.push(format!("{pad}{key}: {{}}")),
        Node::List(items) if items.is_empty() => out.push(format!("{pad}{key}: []")),
        Node::Comment(text) => out.push(format!("{pad}# {text}")),
        Node::Map(_) | Node::List(_) => {
            out.push(format!("{pad}{key}:"));
            value.render_into(out, indent + 2);
        }
    }
}

fn render_item(out: &mut Vec<String>, item: &Node, indent: usize) {
    let pad = " ".repeat(indent);
    match item {
        Node::Scalar(s) => out.push(format!("{pad}- {s}")),
        Node::Comment(text) => out.push(format!("{pad}# {text}")),
        Node::Map(entries) if !entries.is_empty() => {
            // First entry shares the dash line, the rest align with it.
            let mut nested = Vec::new();
            item.render_into(&mut nested, indent + 2);
            let inner_pad = " ".repeat(indent + 2);
            for (idx, line) in nested.into_iter().enumerate() {
                if idx == 0 {
                    let stripped = line.strip_prefix(&inner_pad).unwrap_or(&line);
                    out.push(format!("{pad}- {stripped}"));
                } else {
                    out.push(line);
                }
            }
        }
        Node::Map(_) => out.push(format!("{pad}- {{}}")),
        Node::List(_) | Node::Block(_) | Node::Lambda(_) => {
            out.push(format!("{pad}-"));
            item.render_into(out, indent + 2);
        }
    }
}

/// Quotes a string with double quotes, escaping backslashes and quotes.
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// A top-level section (`sensor:`, `font:`, `lvgl:` ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section key without the colon
    pub name: String,
    /// Section body (usually a list of declarations, sometimes a mapping)
    pub body: Node,
}

impl Section {
    /// Creates a list-bodied section.
    pub fn list(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: Node::list(),
        }
    }

    /// Creates a section with the given body.
    pub fn new(name: impl Into<String>, body: Node) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }

    /// Declarations of a list-bodied section.
    pub fn items(&self) -> &[Node] {
        self.body.as_list().unwrap_or(&[])
    }

    /// Declarations of a list-bodied section, mutably.
    pub fn items_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.body {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    /// Appends a declaration to a list-bodied section.
    pub fn push(&mut self, item: Node) {
        self.body.push(item);
    }

    /// Returns true when the section has nothing to render.
    pub fn is_empty(&self) -> bool {
        matches!(&self.body, Node::List(_) | Node::Map(_)) && self.body.is_empty()
    }

    /// Renders the section as lines.
    pub fn render(&self) -> Vec<String> {
        let mut out = Vec::new();
        match &self.body {
            Node::Scalar(s) => out.push(format!("{}: {s}", self.name)),
            Node::Map(entries) if entries.is_empty() => out.push(format!("{}:", self.name)),
            body => {
                out.push(format!("{}:", self.name));
                body.render_into(&mut out, 2);
            }
        }
        out
    }
}

/// One block of the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Verbatim lines (comments, pre-rendered fragments)
    Raw(Vec<String>),
    /// A structured section
    Section(Section),
}

/// The generated document, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends verbatim lines.
    pub fn push_raw<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks
            .push(Block::Raw(lines.into_iter().map(Into::into).collect()));
    }

    /// Appends a section, skipping empty ones.
    pub fn push_section(&mut self, section: Section) {
        if !section.is_empty() {
            self.blocks.push(Block::Section(section));
        }
    }

    /// Appends a section even when its body is empty (`psram:` style).
    pub fn push_bare_section(&mut self, section: Section) {
        self.blocks.push(Block::Section(section));
    }

    /// Returns true if a section with this name exists.
    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Finds a section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.blocks.iter().find_map(|b| match b {
            Block::Section(s) if s.name == name => Some(s),
            _ => None,
        })
    }

    /// Finds a section by name, mutably.
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.blocks.iter_mut().find_map(|b| match b {
            Block::Section(s) if s.name == name => Some(s),
            _ => None,
        })
    }

    /// Removes every section with the given name.
    pub fn remove_section(&mut self, name: &str) {
        self.blocks
            .retain(|b| !matches!(b, Block::Section(s) if s.name == name));
    }

    /// Renders the document as lines.
    pub fn render_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Raw(lines) => out.extend(lines.iter().cloned()),
                Block::Section(section) => out.extend(section.render()),
            }
        }
        out
    }

    /// Renders the document as text.
    pub fn render(&self) -> String {
        self.render_lines().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_list_section() {
        let mut section = Section::list("sensor");
        section.push(
            Node::map()
                .with("platform", Node::scalar("homeassistant"))
                .with("id", Node::scalar("sensor_temp"))
                .with("entity_id", Node::scalar("sensor.temp"))
                .with("internal", Node::scalar(true)),
        );

        assert_eq!(
            section.render(),
            vec![
                "sensor:",
                "  - platform: homeassistant",
                "    id: sensor_temp",
                "    entity_id: sensor.temp",
                "    internal: true",
            ]
        );
    }

    #[test]
    fn test_render_nested_actions() {
        let decl = Node::map().with("id", Node::scalar("s")).with(
            "on_value",
            Node::map().with(
                "then",
                Node::list().item(Node::map().with(
                    "lvgl.widget.update",
                    Node::map()
                        .with("id", Node::scalar("bar_1"))
                        .with("value", Node::scalar("!lambda return x;")),
                )),
            ),
        );
        let mut section = Section::list("sensor");
        section.push(decl);

        assert_eq!(
            section.render(),
            vec![
                "sensor:",
                "  - id: s",
                "    on_value:",
                "      then:",
                "        - lvgl.widget.update:",
                "            id: bar_1",
                "            value: !lambda return x;",
            ]
        );
    }

    #[test]
    fn test_render_block_scalar() {
        let node = Node::map().with(
            "lambda",
            Node::Block(vec!["int a = 1;".into(), String::new(), "  a++;".into()]),
        );
        let mut out = Vec::new();
        node.render_into(&mut out, 4);
        assert_eq!(out, vec!["    lambda: |-", "      int a = 1;", "", "        a++;"]);
    }

    #[test]
    fn test_render_map_section_and_empty_bodies() {
        let section = Section::new(
            "i2c",
            Node::map()
                .with("sda", Node::scalar("GPIO19"))
                .with("scl", Node::scalar("GPIO20")),
        );
        assert_eq!(section.render(), vec!["i2c:", "  sda: GPIO19", "  scl: GPIO20"]);

        let bare = Section::new("psram", Node::map());
        assert_eq!(bare.render(), vec!["psram:"]);
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut node = Node::map().with("a", Node::scalar(1));
        node.insert("a", Node::scalar(2));
        assert_eq!(node.len(), 1);
        assert_eq!(node.get("a").and_then(Node::as_scalar), Some("2"));
    }

    #[test]
    fn test_comment_inside_list() {
        let list = Node::list()
            .item(Node::Comment("widget:lvgl_label id:l1".into()))
            .item(Node::map().with("label", Node::map().with("id", Node::scalar("l1"))));
        let mut out = Vec::new();
        list.render_into(&mut out, 2);
        assert_eq!(
            out,
            vec!["  # widget:lvgl_label id:l1", "  - label:", "      id: l1"]
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
    }

    #[test]
    fn test_document_skips_empty_sections() {
        let mut doc = Document::new();
        doc.push_section(Section::list("sensor"));
        doc.push_raw(["# hello"]);
        assert!(!doc.has_section("sensor"));
        assert_eq!(doc.render(), "# hello");
    }
}

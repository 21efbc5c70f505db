//! Entity deduplication.
//!
//! Three scans (numeric, text, boolean) walk every visible widget and declare
//! one Home Assistant sensor per unique `(entity, attribute)` pair. All scans
//! share one [`EntityTable`], so a reference declared by a plugin, by the
//! hardware sensors or by an earlier scan is never declared again.

use crate::compiler::ir::Node;
use crate::constants::MAX_ID_LENGTH;
use crate::models::{ConditionOperator, EntityState, Widget};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Domains whose state is always text.
pub const TEXT_DOMAINS: [&str; 8] = [
    "text_sensor.",
    "weather.",
    "calendar.",
    "person.",
    "device_tracker.",
    "sun.",
    "update.",
    "scene.",
];

/// Domains whose state is on/off.
pub const BINARY_DOMAINS: [&str; 8] = [
    "binary_sensor.",
    "switch.",
    "light.",
    "input_boolean.",
    "fan.",
    "cover.",
    "vacuum.",
    "lock.",
];

/// Widget types whose bare references default to the `sensor.` domain.
pub const SENSOR_PREFIX_TYPES: [&str; 7] = [
    "progress_bar",
    "sensor_text",
    "graph",
    "battery_icon",
    "wifi_signal",
    "ondevice_temperature",
    "ondevice_humidity",
];

/// Condition values that still read as booleans.
const BOOLEAN_KEYWORDS: [&str; 6] = ["on", "off", "true", "false", "online", "offline"];

/// Suffix appended to text sensor ids.
pub const TEXT_ID_SUFFIX: &str = "_txt";

/// Inferred data kind of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Floating point state (`sensor:`)
    Numeric,
    /// String state (`text_sensor:`)
    Text,
    /// On/off state (`binary_sensor:`)
    Binary,
}

impl EntityKind {
    /// Parses an explicit `entity_kind` hint.
    pub fn from_hint(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "numeric" | "number" | "sensor" => Some(Self::Numeric),
            "text" | "string" | "text_sensor" => Some(Self::Text),
            "binary" | "boolean" | "binary_sensor" => Some(Self::Binary),
            _ => None,
        }
    }

    /// Top-level section the kind is declared in.
    pub const fn section(self) -> &'static str {
        match self {
            Self::Numeric => "sensor",
            Self::Text => "text_sensor",
            Self::Binary => "binary_sensor",
        }
    }
}

/// Replaces every character outside `[A-Za-z0-9_]` with an underscore.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Truncates a sanitized id to the maximum identifier length.
pub fn truncate_id(id: &str) -> String {
    id.chars().take(MAX_ID_LENGTH).collect()
}

/// Returns true if the reference belongs to a text-only domain.
pub fn is_text_domain(entity: &str) -> bool {
    TEXT_DOMAINS.iter().any(|d| entity.starts_with(d))
}

/// Returns true if the reference belongs to an on/off domain.
pub fn is_binary_domain(entity: &str) -> bool {
    BINARY_DOMAINS.iter().any(|d| entity.starts_with(d))
}

/// Root segment of an attribute path (`forecast[0].condition` → `forecast`).
pub fn attribute_root(attribute: &str) -> &str {
    attribute
        .split(|c| c == '.' || c == '[')
        .next()
        .unwrap_or(attribute)
}

/// Primary reference of a widget with the implicit `sensor.` prefix applied.
pub fn primary_reference(widget: &Widget) -> Option<String> {
    let entity = widget.entity()?;
    if SENSOR_PREFIX_TYPES.contains(&widget.kind.as_str()) && !entity.contains('.') {
        Some(format!("sensor.{entity}"))
    } else {
        Some(entity.to_string())
    }
}

/// Returns true if a condition value should be compared as a string.
pub fn is_string_condition_value(state: &str) -> bool {
    let state = state.trim();
    !state.is_empty()
        && state.parse::<f64>().is_err()
        && !BOOLEAN_KEYWORDS.contains(&state.to_lowercase().as_str())
}

/// Returns true if the snapshot holds a non-numeric value for the reference.
pub fn is_state_non_numeric(
    states: &BTreeMap<String, EntityState>,
    entity: &str,
    attribute: Option<&str>,
) -> bool {
    let Some(state) = states.get(entity) else {
        return false;
    };
    let value = match attribute {
        Some(attr) => state.attributes.get(attr),
        None => state.state.as_ref(),
    };
    let text = match value {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Number(_)) | None | Some(serde_json::Value::Null) => {
            return false
        }
        Some(other) => other.to_string(),
    };
    !text.is_empty() && text.parse::<f64>().is_err()
}

/// A data source reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    /// Entity id (`sensor.outdoor_temp`)
    pub source: String,
    /// Optional attribute (already cut to its root for text sensors)
    pub attribute: Option<String>,
}

impl EntityKey {
    /// Creates a key; blank attributes are dropped.
    pub fn new(source: impl Into<String>, attribute: Option<&str>) -> Self {
        Self {
            source: source.into(),
            attribute: attribute
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        }
    }

    /// Dedup key: `entity` or `entity__attr__attribute`.
    pub fn raw_key(&self) -> String {
        match &self.attribute {
            Some(attr) => format!("{}__attr__{}", self.source, attr),
            None => self.source.clone(),
        }
    }

    /// Generated component id for the given kind.
    ///
    /// Text ids keep their `_txt` suffix; the base is shortened instead so the
    /// whole id still fits the identifier limit.
    pub fn sensor_id(&self, kind: EntityKind) -> String {
        let base = match &self.attribute {
            Some(attr) => sanitize(&format!("{}_{}", self.source, attr)),
            None => sanitize(&self.source),
        };
        match kind {
            EntityKind::Text => {
                let room = MAX_ID_LENGTH - TEXT_ID_SUFFIX.len();
                let base: String = base.chars().take(room).collect();
                format!("{base}{TEXT_ID_SUFFIX}")
            }
            EntityKind::Numeric | EntityKind::Binary => truncate_id(&base),
        }
    }
}

/// A reference that has been declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declared {
    /// Component id
    pub id: String,
    /// Section it lives in
    pub kind: EntityKind,
}

/// Shared "seen" state for all scans of one compilation.
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    by_key: HashMap<String, Declared>,
    ids: HashSet<String>,
}

impl EntityTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key or the id has been declared.
    pub fn is_seen(&self, key: &EntityKey, id: &str) -> bool {
        self.by_key.contains_key(&key.raw_key()) || self.ids.contains(id)
    }

    /// Reserves an id that is declared elsewhere (hardware sensors).
    pub fn reserve_id(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    /// Reserves an id, returning false if it was already taken.
    pub fn reserve_new(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    /// Records an existing declaration.
    pub fn record(&mut self, key: &EntityKey, id: impl Into<String>, kind: EntityKind) {
        let id = id.into();
        self.ids.insert(id.clone());
        self.by_key
            .entry(key.raw_key())
            .or_insert(Declared { id, kind });
    }

    /// Declares a reference if neither its key nor its id has been seen.
    ///
    /// Returns the declaration node for new references, `None` otherwise.
    pub fn declare(&mut self, key: &EntityKey, kind: EntityKind) -> Option<Node> {
        let id = key.sensor_id(kind);
        if self.is_seen(key, &id) {
            return None;
        }
        self.record(key, id.clone(), kind);
        Some(homeassistant_declaration(key, &id))
    }

    /// Records every declaration of a plugin-built section.
    ///
    /// Declarations without an `entity_id` only reserve their id.
    pub fn seed_from(&mut self, items: &[Node], kind: EntityKind) {
        for item in items {
            let Some(id) = item.get("id").and_then(Node::as_scalar) else {
                continue;
            };
            match item.get("entity_id").and_then(Node::as_scalar) {
                Some(entity) => {
                    let attribute = item.get("attribute").and_then(Node::as_scalar);
                    self.record(&EntityKey::new(entity, attribute), id, kind);
                }
                None => self.reserve_id(id),
            }
        }
    }

    /// Looks up a declared reference.
    pub fn lookup(&self, key: &EntityKey) -> Option<&Declared> {
        self.by_key.get(&key.raw_key())
    }

    /// Number of declared references.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Returns true when nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Builds a `platform: homeassistant` declaration.
pub fn homeassistant_declaration(key: &EntityKey, id: &str) -> Node {
    Node::map()
        .with("platform", Node::scalar("homeassistant"))
        .with("id", Node::scalar(id))
        .with("entity_id", Node::scalar(&key.source))
        .with_opt("attribute", key.attribute.as_ref().map(Node::scalar))
        .with("internal", Node::scalar(true))
}

fn hint(widget: &Widget) -> Option<EntityKind> {
    widget
        .prop_str("entity_kind")
        .and_then(|h| EntityKind::from_hint(&h))
}

fn prop_trimmed(widget: &Widget, key: &str) -> Option<String> {
    widget
        .prop_str(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Scans for numeric references.
pub fn scan_numeric(
    widgets: &[&Widget],
    table: &mut EntityTable,
    states: &BTreeMap<String, EntityState>,
) -> Vec<Node> {
    let mut out = Vec::new();
    for widget in widgets.iter().filter(|w| !w.hidden) {
        if widget.flag("is_local_sensor") {
            continue;
        }
        let Some(entity) = primary_reference(widget) else {
            continue;
        };
        let attribute = prop_trimmed(widget, "attribute");

        match hint(widget) {
            Some(EntityKind::Text | EntityKind::Binary) => continue,
            Some(EntityKind::Numeric) => {
                if !entity.contains('.') {
                    continue;
                }
            }
            None => {
                if widget.kind == "sensor_text"
                    && (widget.flag("is_text_sensor")
                        || attribute.as_deref().is_some_and(|attr| {
                            is_state_non_numeric(states, &entity, Some(attr))
                        }))
                {
                    continue;
                }
                if matches!(widget.kind.as_str(), "calendar" | "lvgl_dropdown") {
                    continue;
                }
                if !entity.contains('.') || is_text_domain(&entity) || is_binary_domain(&entity)
                {
                    continue;
                }
            }
        }

        let key = EntityKey::new(entity, attribute.as_deref());
        if let Some(decl) = table.declare(&key, EntityKind::Numeric) {
            out.push(decl);
        }
    }
    out
}

/// Scans for text references (condition, primary and secondary).
pub fn scan_text(
    widgets: &[&Widget],
    table: &mut EntityTable,
    states: &BTreeMap<String, EntityState>,
) -> Vec<Node> {
    let mut out = Vec::new();
    for widget in widgets.iter().filter(|w| !w.hidden) {
        if widget.flag("is_local_sensor") {
            continue;
        }
        let hinted = hint(widget);
        let forced_text = hinted == Some(EntityKind::Text)
            || (widget.kind == "sensor_text" && widget.flag("is_text_sensor"));

        if let Some(cond) = widget.condition() {
            let string_cond = cond.operator != ConditionOperator::Range
                && is_string_condition_value(cond.state_str());
            if is_text_domain(&cond.entity) || string_cond {
                let key = EntityKey::new(cond.entity.clone(), None);
                if let Some(decl) = table.declare(&key, EntityKind::Text) {
                    out.push(decl);
                }
            }
        }

        let refs = [
            (widget.entity().map(str::to_string), prop_trimmed(widget, "attribute")),
            (widget.entity2().map(str::to_string), prop_trimmed(widget, "attribute2")),
        ];
        for (entity, attribute) in refs {
            let Some(entity) = entity else { continue };
            let non_numeric = attribute
                .as_deref()
                .is_some_and(|attr| is_state_non_numeric(states, &entity, Some(attr)));
            let is_text = match hinted {
                Some(EntityKind::Numeric | EntityKind::Binary) => false,
                _ => is_text_domain(&entity) || forced_text || non_numeric,
            };
            if !is_text {
                continue;
            }

            let root = attribute.as_deref().map(attribute_root);
            let key = EntityKey::new(entity, root);
            if let Some(decl) = table.declare(&key, EntityKind::Text) {
                out.push(decl);
            }
        }
    }
    out
}

/// Scans for on/off references (condition and primary).
pub fn scan_binary(widgets: &[&Widget], table: &mut EntityTable) -> Vec<Node> {
    let mut out = Vec::new();
    for widget in widgets.iter().filter(|w| !w.hidden) {
        let condition = widget.condition().map(|c| c.entity);
        let primary = widget.entity().map(str::to_string);
        let hinted_binary = hint(widget) == Some(EntityKind::Binary);

        for (entity, is_primary) in [(condition, false), (primary, true)] {
            let Some(entity) = entity else { continue };
            if !(is_binary_domain(&entity) || (is_primary && hinted_binary)) {
                continue;
            }
            let key = EntityKey::new(entity, None);
            if let Some(decl) = table.declare(&key, EntityKind::Binary) {
                out.push(decl);
            }
        }
    }
    out
}

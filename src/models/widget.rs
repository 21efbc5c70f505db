//! Widget data structures.
//!
//! A widget is a positioned, typed element on a page. The `type` tag selects
//! the plugin that knows how to export it; everything plugin-specific lives in
//! the open `props` map.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A single element placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Unique id, stable across export and import
    pub id: String,
    /// Plugin discriminator (e.g. "text", "sensor_text", "lvgl_bar")
    #[serde(rename = "type")]
    pub kind: String,
    /// Left edge in pixels
    #[serde(default, deserialize_with = "de_coord")]
    pub x: i32,
    /// Top edge in pixels
    #[serde(default, deserialize_with = "de_coord")]
    pub y: i32,
    /// Width in pixels
    #[serde(default, deserialize_with = "de_coord")]
    pub width: i32,
    /// Height in pixels
    #[serde(default, deserialize_with = "de_coord")]
    pub height: i32,
    /// Primary data source reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Secondary data source reference
    #[serde(
        default,
        alias = "entity_id2",
        skip_serializing_if = "Option::is_none"
    )]
    pub entity_id_2: Option<String>,
    /// Optional caption used by several widget kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Entity the visibility condition is evaluated against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_entity: Option<String>,
    /// Comparison operator (`==`, `!=`, `>`, `<`, `>=`, `<=`, `range`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_operator: Option<String>,
    /// Comparison value for non-range operators
    #[serde(
        default,
        deserialize_with = "de_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub condition_state: Option<String>,
    /// Lower bound for `range`
    #[serde(
        default,
        deserialize_with = "de_opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub condition_min: Option<f64>,
    /// Upper bound for `range`
    #[serde(
        default,
        deserialize_with = "de_opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub condition_max: Option<f64>,
    /// Plugin-specific properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, Value>,
    /// Hidden widgets are ignored by every export pass
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    /// Editor-only lock flag
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

impl Widget {
    /// Creates a widget with the given id, type and geometry.
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            x,
            y,
            width,
            height,
            entity_id: None,
            entity_id_2: None,
            title: None,
            condition_entity: None,
            condition_operator: None,
            condition_state: None,
            condition_min: None,
            condition_max: None,
            props: BTreeMap::new(),
            hidden: false,
            locked: false,
        }
    }

    /// Sets the primary entity reference.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity_id = Some(entity.into());
        self
    }

    /// Sets a property.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Sets the visibility condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition_entity = Some(condition.entity);
        self.condition_operator = Some(condition.operator.as_str().to_string());
        self.condition_state = condition.state;
        self.condition_min = condition.min;
        self.condition_max = condition.max;
        self
    }

    /// Returns true for grouping containers, which never export anything.
    pub fn is_group(&self) -> bool {
        self.kind == "group"
    }

    /// Trimmed primary entity reference, if non-empty.
    pub fn entity(&self) -> Option<&str> {
        non_empty(self.entity_id.as_deref())
    }

    /// Trimmed secondary entity reference, if non-empty.
    pub fn entity2(&self) -> Option<&str> {
        non_empty(self.entity_id_2.as_deref())
    }

    /// Returns the visibility condition when a condition entity is set.
    pub fn condition(&self) -> Option<Condition> {
        let entity = non_empty(self.condition_entity.as_deref())?;
        let operator = self
            .condition_operator
            .as_deref()
            .map(ConditionOperator::parse)
            .unwrap_or_default();
        Some(Condition {
            entity: entity.to_string(),
            operator,
            state: self.condition_state.clone(),
            min: self.condition_min,
            max: self.condition_max,
        })
    }

    /// Returns a property rendered as a string (numbers and booleans are stringified).
    pub fn prop_str(&self, key: &str) -> Option<String> {
        match self.props.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Returns a string property or the given default.
    pub fn prop_str_or(&self, key: &str, default: &str) -> String {
        self.prop_str(key)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    /// Returns a numeric property, accepting numeric strings.
    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        match self.props.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns an integer property, rounding fractional values.
    pub fn prop_i64(&self, key: &str) -> Option<i64> {
        self.prop_f64(key).map(|v| v.round() as i64)
    }

    /// Returns an integer property or the given default.
    pub fn prop_i64_or(&self, key: &str, default: i64) -> i64 {
        self.prop_i64(key).unwrap_or(default)
    }

    /// Returns a boolean property, accepting "true"/"false" strings.
    pub fn prop_bool(&self, key: &str) -> Option<bool> {
        match self.props.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_f64().map(|v| v != 0.0),
            _ => None,
        }
    }

    /// Returns true when a boolean property is explicitly set.
    pub fn flag(&self, key: &str) -> bool {
        self.prop_bool(key).unwrap_or(false)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Comparison operator of a visibility condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionOperator {
    /// `==`
    #[default]
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// Inclusive numeric range
    Range,
}

impl ConditionOperator {
    /// Parses an operator, falling back to `==` for unknown input.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "!=" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            "range" => Self::Range,
            _ => Self::Eq,
        }
    }

    /// The operator as written in the document.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Range => "range",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility condition attached to a widget.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Entity the condition reads
    pub entity: String,
    /// Comparison operator
    pub operator: ConditionOperator,
    /// Comparison value for non-range operators
    pub state: Option<String>,
    /// Lower bound for `range`
    pub min: Option<f64>,
    /// Upper bound for `range`
    pub max: Option<f64>,
}

impl Condition {
    /// Creates an equality condition.
    pub fn equals(entity: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            operator: ConditionOperator::Eq,
            state: Some(state.into()),
            min: None,
            max: None,
        }
    }

    /// Creates a range condition.
    pub fn range(entity: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            entity: entity.into(),
            operator: ConditionOperator::Range,
            state: None,
            min: Some(min),
            max: Some(max),
        }
    }

    /// Trimmed comparison value (empty when unset).
    pub fn state_str(&self) -> &str {
        self.state.as_deref().map_or("", str::trim)
    }
}

/// Deserializes a coordinate from an integer, float or numeric string.
///
/// Malformed values fall back to zero rather than failing the whole project.
fn de_coord<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().map_or(0, |v| v.round() as i32),
        Value::String(s) => s.trim().parse::<f64>().map_or(0, |v| v.round() as i32),
        _ => 0,
    })
}

fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_lenient_coordinates() {
        let widget: Widget = serde_json::from_value(json!({
            "id": "w1",
            "type": "text",
            "x": 10.6,
            "y": "20",
            "width": null,
            "height": 40
        }))
        .unwrap();

        assert_eq!(widget.x, 11);
        assert_eq!(widget.y, 20);
        assert_eq!(widget.width, 0);
        assert_eq!(widget.height, 40);
    }

    #[test]
    fn test_condition_from_flat_fields() {
        let widget: Widget = serde_json::from_value(json!({
            "id": "w1",
            "type": "text",
            "condition_entity": " binary_sensor.door ",
            "condition_operator": "==",
            "condition_state": true
        }))
        .unwrap();

        let cond = widget.condition().unwrap();
        assert_eq!(cond.entity, "binary_sensor.door");
        assert_eq!(cond.operator, ConditionOperator::Eq);
        assert_eq!(cond.state_str(), "true");
    }

    #[test]
    fn test_condition_absent_when_entity_blank() {
        let mut widget = Widget::new("w1", "text", 0, 0, 10, 10);
        widget.condition_entity = Some("   ".to_string());
        assert!(widget.condition().is_none());
    }

    #[test]
    fn test_prop_accessors_accept_strings_and_numbers() {
        let widget = Widget::new("w1", "text", 0, 0, 10, 10)
            .with_prop("font_size", "24")
            .with_prop("bar_height", 15.4)
            .with_prop("italic", "true")
            .with_prop("text", "Hello");

        assert_eq!(widget.prop_i64("font_size"), Some(24));
        assert_eq!(widget.prop_i64("bar_height"), Some(15));
        assert!(widget.flag("italic"));
        assert!(!widget.flag("missing"));
        assert_eq!(widget.prop_str_or("text", "x"), "Hello");
        assert_eq!(widget.prop_str_or("missing", "x"), "x");
    }

    #[test]
    fn test_operator_parse_fallback() {
        assert_eq!(ConditionOperator::parse("range"), ConditionOperator::Range);
        assert_eq!(ConditionOperator::parse(">="), ConditionOperator::Ge);
        assert_eq!(ConditionOperator::parse("bogus"), ConditionOperator::Eq);
    }
}

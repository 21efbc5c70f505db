//! Round-trip annotations.
//!
//! Every exported widget leaves a one-line `widget:<type> id:.. k:v ...`
//! comment behind so the importer can rebuild the widget model from a
//! generated document. The same flat `key:value` syntax is used for the
//! project settings line.

use crate::models::{Page, Project, Widget};
use serde_json::Value;

/// Keys holding widget fields rather than props.
const RESERVED_KEYS: [&str; 17] = [
    "id", "type", "x", "y", "w", "h", "entity", "entity2", "title", "cond_ent", "cond_op",
    "cond_state", "cond_min", "cond_max", "hidden", "locked", "status",
];

/// Prefix for props whose key collides with a reserved key.
const PROP_PREFIX: &str = "prop.";

/// Formats a value for a `key:value` pair.
///
/// Strings are quoted when they contain whitespace, quotes or backslashes, or
/// when they would otherwise read back as another type.
pub fn format_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(format_str(s)),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Formats a string value, quoting only when needed.
pub fn format_str(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\\')
        || value.starts_with('{')
        || value.starts_with('[')
        || matches!(value, "true" | "false" | "null")
        || value.parse::<f64>().is_ok();
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    format!("\"{escaped}\"")
}

/// Builds the annotation payload for a widget (without the comment prefix).
pub fn widget_annotation(widget: &Widget) -> String {
    let mut parts = vec![
        format!("widget:{}", widget.kind),
        format!("id:{}", format_str(&widget.id)),
        format!("type:{}", widget.kind),
        format!("x:{}", widget.x),
        format!("y:{}", widget.y),
        format!("w:{}", widget.width),
        format!("h:{}", widget.height),
    ];

    let mut push_str = |key: &str, value: Option<&str>| {
        if let Some(v) = value {
            parts.push(format!("{key}:{}", format_str(v)));
        }
    };
    push_str("entity", widget.entity_id.as_deref());
    push_str("entity2", widget.entity_id_2.as_deref());
    push_str("title", widget.title.as_deref());
    push_str("cond_ent", widget.condition_entity.as_deref());
    push_str("cond_op", widget.condition_operator.as_deref());
    push_str("cond_state", widget.condition_state.as_deref());

    for (key, value) in [("cond_min", widget.condition_min), ("cond_max", widget.condition_max)] {
        if let Some(v) = value.and_then(serde_json::Number::from_f64) {
            parts.push(format!("{key}:{v}"));
        }
    }
    if widget.locked {
        parts.push("locked:true".to_string());
    }

    for (key, value) in &widget.props {
        let Some(formatted) = format_value(value) else {
            continue;
        };
        if RESERVED_KEYS.contains(&key.as_str()) || key.starts_with(PROP_PREFIX) {
            parts.push(format!("{PROP_PREFIX}{key}:{formatted}"));
        } else {
            parts.push(format!("{key}:{formatted}"));
        }
    }

    parts.join(" ")
}

/// Splits an annotation payload into `key:value` pairs.
///
/// Quoted values are unescaped, `{`/`[` values are read as JSON, `true`,
/// `false` and numbers become typed values, everything else is a string.
pub fn parse_pairs(payload: &str) -> Vec<(String, Value)> {
    let chars: Vec<char> = payload.chars().collect();
    let mut pairs = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        let key_start = i;
        while i < chars.len() && chars[i] != ':' && !chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() || chars[i] != ':' {
            // bare word without a value
            continue;
        }
        let key: String = chars[key_start..i].iter().collect();
        i += 1;

        let value = match chars.get(i) {
            Some('"') => {
                let (text, next) = read_quoted(&chars, i + 1);
                i = next;
                Value::String(text)
            }
            Some('{' | '[') => {
                let end = balanced_end(&chars, i);
                let raw: String = chars[i..end].iter().collect();
                i = end;
                serde_json::from_str(&raw).unwrap_or(Value::String(raw))
            }
            _ => {
                let start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                literal(&chars[start..i].iter().collect::<String>())
            }
        };
        if !key.is_empty() {
            pairs.push((key, value));
        }
    }
    pairs
}

fn read_quoted(chars: &[char], mut i: usize) -> (String, usize) {
    let mut out = String::new();
    while i < chars.len() {
        match chars[i] {
            '"' => return (out, i + 1),
            '\\' if i + 1 < chars.len() => {
                out.push(match chars[i + 1] {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    other => other,
                });
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    (out, i)
}

fn balanced_end(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            if c == '\\' {
                i += 1;
            } else if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '{' | '[' => depth += 1,
                '}' | ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                c if c.is_whitespace() && depth == 0 => return i,
                _ => {}
            }
        }
        i += 1;
    }
    chars.len()
}

fn literal(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                Value::from(i)
            } else if let Some(n) = raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
            {
                Value::Number(n)
            } else {
                Value::String(raw.to_string())
            }
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_to_i32(value: &Value) -> i32 {
    match value {
        Value::Number(n) => n.as_f64().map_or(0, |v| v.round() as i32),
        Value::String(s) => s.trim().parse::<f64>().map_or(0, |v| v.round() as i32),
        _ => 0,
    }
}

/// Rebuilds a widget from an annotation payload.
///
/// Accepts the payload with or without the `//` or `#` comment prefix.
/// Returns `None` when the line is not a widget annotation.
pub fn parse_widget(line: &str) -> Option<Widget> {
    let payload = line
        .trim()
        .trim_start_matches("//")
        .trim_start_matches('#')
        .trim_start();
    let rest = payload.strip_prefix("widget:")?;
    let kind: String = rest.chars().take_while(|c| !c.is_whitespace()).collect();
    if kind.is_empty() {
        return None;
    }

    let mut widget = Widget::new("", kind, 0, 0, 0, 0);
    for (key, value) in parse_pairs(&rest[widget.kind.len()..]) {
        match key.as_str() {
            "id" => widget.id = value_to_string(&value),
            "type" => widget.kind = value_to_string(&value),
            "x" => widget.x = value_to_i32(&value),
            "y" => widget.y = value_to_i32(&value),
            "w" => widget.width = value_to_i32(&value),
            "h" => widget.height = value_to_i32(&value),
            "entity" => widget.entity_id = Some(value_to_string(&value)),
            "entity2" => widget.entity_id_2 = Some(value_to_string(&value)),
            "title" => widget.title = Some(value_to_string(&value)),
            "cond_ent" => widget.condition_entity = Some(value_to_string(&value)),
            "cond_op" => widget.condition_operator = Some(value_to_string(&value)),
            "cond_state" => widget.condition_state = Some(value_to_string(&value)),
            "cond_min" => widget.condition_min = value.as_f64(),
            "cond_max" => widget.condition_max = value.as_f64(),
            "locked" => widget.locked = value.as_bool().unwrap_or(false),
            "hidden" | "status" => {}
            _ => {
                let key = key.strip_prefix(PROP_PREFIX).unwrap_or(&key).to_string();
                widget.props.insert(key, value);
            }
        }
    }

    if widget.id.is_empty() {
        return None;
    }
    Some(widget)
}

/// Returns the `status:` marker of an annotation line, if any.
pub fn status(line: &str) -> Option<String> {
    parse_pairs(line)
        .into_iter()
        .find(|(k, _)| k == "status")
        .map(|(_, v)| value_to_string(&v))
}

/// Comment prefix of the project settings line.
pub const PROJECT_PREFIX: &str = "# project:";

/// Builds the project settings line read back by the importer.
pub fn project_annotation(project: &Project) -> String {
    let mut parts = vec![
        format!("device:{}", format_str(&project.device_model)),
        format!("orientation:{}", project.orientation),
        format!("mode:{}", project.rendering_mode),
    ];
    if let Some(refresh) = project.refresh_interval {
        parts.push(format!("refresh:{refresh}"));
    }
    if let Some(sleep) = project.deep_sleep_interval {
        parts.push(format!("sleep:{sleep}"));
    }
    if project.inverted_colors {
        parts.push("inverted:true".to_string());
    }
    if project.wake_on_touch {
        parts.push("wake_on_touch:true".to_string());
    }
    if !project.name.is_empty() {
        parts.push(format!("name:{}", format_str(&project.name)));
    }
    format!("{PROJECT_PREFIX} {}", parts.join(" "))
}

/// Applies a project settings line to `project`.
///
/// Returns false when the line is not a settings line. Unknown keys and
/// unparsable values are ignored.
pub fn parse_project(line: &str, project: &mut Project) -> bool {
    let Some(payload) = line.trim().strip_prefix(PROJECT_PREFIX) else {
        return false;
    };
    for (key, value) in parse_pairs(payload) {
        let text = value_to_string(&value);
        match key.as_str() {
            "device" => project.device_model = text,
            "orientation" => {
                if let Ok(o) = text.parse() {
                    project.orientation = o;
                }
            }
            "mode" => {
                if let Ok(m) = text.parse() {
                    project.rendering_mode = m;
                }
            }
            "refresh" => {
                project.refresh_interval = value.as_u64().and_then(|v| u32::try_from(v).ok());
            }
            "sleep" => {
                project.deep_sleep_interval = value.as_u64().and_then(|v| u32::try_from(v).ok());
            }
            "inverted" => project.inverted_colors = value.as_bool().unwrap_or(false),
            "wake_on_touch" => project.wake_on_touch = value.as_bool().unwrap_or(false),
            "name" => project.name = text,
            _ => {}
        }
    }
    true
}

/// Applies a `page:<key> "<value>"` comment to `page`.
///
/// Returns false when the line is not a page comment.
pub fn parse_page_comment(line: &str, page: &mut Page) -> bool {
    let payload = line
        .trim()
        .trim_start_matches("//")
        .trim_start_matches('#')
        .trim_start();
    let Some(rest) = payload.strip_prefix("page:") else {
        return false;
    };
    let Some((key, value)) = parse_pairs(&rest.replacen(' ', ":", 1)).into_iter().next() else {
        return false;
    };
    let text = value_to_string(&value);
    match key.as_str() {
        "name" => page.name = text,
        "dark_mode" => page.dark_mode = Some(text),
        "refresh_type" => page.refresh_type = Some(text),
        "refresh_time" => page.refresh_time = Some(text),
        _ => return false,
    }
    true
}

//! Visibility condition guards for the display lambda.

use crate::compiler::entities::{self, EntityKey, EntityKind, EntityTable};
use crate::models::{Condition, ConditionOperator, Widget};

/// States that read as booleans when comparing a non-text entity.
const BOOLEAN_STATES: [&str; 16] = [
    "on", "off", "true", "false", "open", "closed", "locked", "unlocked", "home", "not_home",
    "occupied", "clear", "active", "inactive", "detected", "idle",
];

/// States that count as "on".
const POSITIVE_STATES: [&str; 9] = [
    "on", "true", "1", "open", "locked", "home", "occupied", "active", "detected",
];

/// How a condition is compared on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardKind {
    Text,
    Binary,
    Numeric,
}

fn infer_kind(cond: &Condition) -> GuardKind {
    if entities::is_binary_domain(&cond.entity) {
        return GuardKind::Binary;
    }
    if cond.entity.starts_with("text_sensor.") {
        return GuardKind::Text;
    }
    let state = cond.state_str();
    if cond.operator != ConditionOperator::Range
        && !state.is_empty()
        && state.parse::<f64>().is_err()
        && !BOOLEAN_STATES.contains(&state.to_lowercase().as_str())
    {
        return GuardKind::Text;
    }
    GuardKind::Numeric
}

/// Resolves the component id and comparison kind of a condition entity.
///
/// Prefers whatever the dedup scans actually declared for the entity.
fn resolve(cond: &Condition, table: &EntityTable) -> (String, GuardKind) {
    let key = EntityKey::new(cond.entity.clone(), None);
    if let Some(declared) = table.lookup(&key) {
        let kind = match declared.kind {
            EntityKind::Text => GuardKind::Text,
            EntityKind::Binary => GuardKind::Binary,
            EntityKind::Numeric => GuardKind::Numeric,
        };
        return (declared.id.clone(), kind);
    }

    let kind = infer_kind(cond);
    let id = match kind {
        GuardKind::Text => key.sensor_id(EntityKind::Text),
        GuardKind::Binary | GuardKind::Numeric => key.sensor_id(EntityKind::Numeric),
    };
    (id, kind)
}

fn format_number(value: f64) -> String {
    format!("{value}")
}

/// Builds the `if (...) {` guard opening a conditional widget, if any.
pub fn condition_check(widget: &Widget, table: &EntityTable) -> Option<String> {
    let cond = widget.condition()?;
    let (id, kind) = resolve(&cond, table);
    let val = format!("id({id}).state");
    let state = cond.state_str();
    let lower = state.to_lowercase();
    let op = cond.operator.as_str();

    let check = match (cond.operator, kind) {
        (ConditionOperator::Range, _) => format!(
            "{val} >= {} && {val} <= {}",
            format_number(cond.min.unwrap_or(0.0)),
            format_number(cond.max.unwrap_or(100.0))
        ),
        (_, GuardKind::Text) => {
            let escaped = state.replace('\\', "\\\\").replace('"', "\\\"");
            format!("{val} {op} \"{escaped}\"")
        }
        (operator, GuardKind::Binary) => {
            let positive = POSITIVE_STATES.contains(&lower.as_str());
            match operator {
                ConditionOperator::Eq if positive => val,
                ConditionOperator::Eq => format!("!{val}"),
                ConditionOperator::Ne if positive => format!("!{val}"),
                ConditionOperator::Ne => val,
                _ => format!("(int){val} {op} {}", u8::from(positive)),
            }
        }
        (_, GuardKind::Numeric) => {
            // "off"-style keywords and anything unparseable compare against zero
            let number = state.parse::<f64>().ok().unwrap_or_else(|| {
                if POSITIVE_STATES.contains(&lower.as_str()) {
                    1.0
                } else {
                    0.0
                }
            });
            format!("{val} {op} {}", format_number(number))
        }
    };

    Some(format!("if ({check}) {{"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guarded(cond: Condition) -> Widget {
        Widget::new("w", "icon", 0, 0, 10, 10).with_condition(cond)
    }

    fn check(cond: Condition) -> String {
        condition_check(&guarded(cond), &EntityTable::new()).unwrap()
    }

    #[test]
    fn test_no_condition() {
        let w = Widget::new("w", "icon", 0, 0, 10, 10);
        assert!(condition_check(&w, &EntityTable::new()).is_none());
    }

    #[test]
    fn test_binary_checks() {
        assert_eq!(
            check(Condition::equals("binary_sensor.door", "on")),
            "if (id(binary_sensor_door).state) {"
        );
        assert_eq!(
            check(Condition::equals("binary_sensor.door", "off")),
            "if (!id(binary_sensor_door).state) {"
        );

        let mut ne = Condition::equals("light.hall", "on");
        ne.operator = ConditionOperator::Ne;
        assert_eq!(check(ne), "if (!id(light_hall).state) {");

        let mut gt = Condition::equals("switch.fan", "on");
        gt.operator = ConditionOperator::Gt;
        assert_eq!(check(gt), "if ((int)id(switch_fan).state > 1) {");
    }

    #[test]
    fn test_numeric_checks() {
        let mut gt = Condition::equals("sensor.temp", "21.50");
        gt.operator = ConditionOperator::Gt;
        assert_eq!(check(gt), "if (id(sensor_temp).state > 21.5) {");

        assert_eq!(
            check(Condition::equals("sensor.presence", "home")),
            "if (id(sensor_presence).state == 1) {"
        );
        assert_eq!(
            check(Condition::equals("sensor.presence", "idle")),
            "if (id(sensor_presence).state == 0) {"
        );
    }

    #[test]
    fn test_range_defaults() {
        let mut cond = Condition::range("sensor.temp", 0.0, 0.0);
        cond.min = None;
        cond.max = None;
        assert_eq!(
            check(cond),
            "if (id(sensor_temp).state >= 0 && id(sensor_temp).state <= 100) {"
        );
        assert_eq!(
            check(Condition::range("sensor.temp", 10.5, 30.0)),
            "if (id(sensor_temp).state >= 10.5 && id(sensor_temp).state <= 30) {"
        );
    }

    #[test]
    fn test_text_check_uses_text_sensor_id() {
        assert_eq!(
            check(Condition::equals("sensor.washer", "running")),
            "if (id(sensor_washer_txt).state == \"running\") {"
        );
        assert_eq!(
            check(Condition::equals("text_sensor.mode", "eco")),
            "if (id(text_sensor_mode_txt).state == \"eco\") {"
        );
    }

    #[test]
    fn test_declared_entity_wins() {
        let mut table = EntityTable::new();
        table.record(
            &EntityKey::new("sensor.washer", None),
            "sensor_washer",
            EntityKind::Numeric,
        );
        let w = guarded(Condition::equals("sensor.washer", "3"));
        assert_eq!(
            condition_check(&w, &table).unwrap(),
            "if (id(sensor_washer).state == 3) {"
        );
    }
}

//! Built-in Material Design Icons name table.

/// Known icon names and their glyph codes.
const ICONS: &[(&str, &str)] = &[
    ("account", "F0004"),
    ("alert", "F0026"),
    ("arrow-left", "F004D"),
    ("arrow-right", "F0054"),
    ("battery", "F0079"),
    ("battery-charging", "F0084"),
    ("battery-outline", "F008E"),
    ("calendar", "F00ED"),
    ("check", "F012C"),
    ("chevron-left", "F0141"),
    ("chevron-right", "F0142"),
    ("clock-outline", "F0150"),
    ("close", "F0156"),
    ("cog", "F0493"),
    ("fan", "F0210"),
    ("flash", "F0241"),
    ("home", "F02DC"),
    ("information-outline", "F02FD"),
    ("lightbulb", "F0335"),
    ("lightbulb-outline", "F0336"),
    ("lock", "F033E"),
    ("lock-open", "F033F"),
    ("power", "F0425"),
    ("refresh", "F0450"),
    ("thermometer", "F050F"),
    ("water-percent", "F058E"),
    ("weather-cloudy", "F0590"),
    ("weather-fog", "F0591"),
    ("weather-hail", "F0592"),
    ("weather-lightning", "F0593"),
    ("weather-night", "F0594"),
    ("weather-partly-cloudy", "F0595"),
    ("weather-pouring", "F0596"),
    ("weather-rainy", "F0597"),
    ("weather-snowy", "F0598"),
    ("weather-sunny", "F0599"),
    ("weather-sunset", "F059A"),
    ("weather-windy", "F059D"),
    ("weather-lightning-rainy", "F067E"),
    ("weather-snowy-rainy", "F067F"),
    ("wifi", "F05A9"),
    ("wifi-off", "F05AA"),
];

/// Weather conditions reported by Home Assistant and the glyph drawn for each.
pub const WEATHER_CONDITIONS: &[(&str, &str)] = &[
    ("clear-night", "F0594"),
    ("cloudy", "F0590"),
    ("exceptional", "F0026"),
    ("fog", "F0591"),
    ("hail", "F0592"),
    ("lightning", "F0593"),
    ("lightning-rainy", "F067E"),
    ("partlycloudy", "F0595"),
    ("pouring", "F0596"),
    ("rainy", "F0597"),
    ("snowy", "F0598"),
    ("snowy-rainy", "F067F"),
    ("sunny", "F0599"),
    ("windy", "F059D"),
    ("windy-variant", "F059E"),
];

/// Glyph shown when the weather state is unknown.
pub const WEATHER_FALLBACK: &str = "F0599";

/// Resolves an icon name (`home`, `mdi:home`, `MDI:HOME`) to its code.
pub fn resolve(name: &str) -> Option<&'static str> {
    let lower = name.trim().to_lowercase();
    let key = lower.strip_prefix("mdi:").unwrap_or(&lower);
    ICONS.iter().find(|(n, _)| *n == key).map(|(_, code)| *code)
}

/// Glyph code for a weather condition, falling back to sunny.
pub fn weather_icon(condition: &str) -> &'static str {
    WEATHER_CONDITIONS
        .iter()
        .find(|(c, _)| *c == condition)
        .map_or(WEATHER_FALLBACK, |(_, code)| *code)
}

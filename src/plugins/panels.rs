//! Composite information panels drawn by the display lambda: a month
//! calendar, a multi-day weather forecast and a quote fetched from a feed.

use super::symbols::glyph;
use super::{
    color_const, prop_px, text_align, DirectContext, DirectExport, PluginRegistry,
    SectionContext, WidgetPlugin,
};
use crate::compiler::entities::{sanitize, EntityKey, EntityKind};
use crate::compiler::fonts::FontRegistry;
use crate::compiler::icons::{WEATHER_CONDITIONS, WEATHER_FALLBACK};
use crate::compiler::ir::{Node, Section};
use crate::hardware::sections::global;
use crate::models::Widget;
use anyhow::Result;

pub(super) fn register(registry: &mut PluginRegistry) {
    registry.register(Box::new(CalendarPlugin));
    registry.register(Box::new(WeatherForecastPlugin));
    registry.register(Box::new(QuoteRssPlugin));
}

fn font_family(widget: &Widget) -> String {
    widget.prop_str_or("font_family", "Roboto")
}

/// Border drawn inward `width` times.
fn push_border(ctx: &mut DirectContext<'_>, width: u32, color: &str) {
    ctx.push(format!("  for (int i = 0; i < {width}; i++) {{"));
    ctx.push(format!("    it.rectangle(x + i, y + i, w - 2 * i, h - 2 * i, {color});"));
    ctx.push("  }");
}

// ============================================================================
// calendar
// ============================================================================

/// Month grid with today highlighted and the day's events underneath.
///
/// Events come from a text entity holding one event per line.
#[derive(Debug, Default)]
pub struct CalendarPlugin;

/// Font sizes of the four calendar text roles.
struct CalendarFonts {
    date: u32,
    day: u32,
    grid: u32,
    event: u32,
}

impl CalendarFonts {
    fn from_widget(widget: &Widget) -> Self {
        Self {
            date: prop_px(widget, "font_size_date", 100),
            day: prop_px(widget, "font_size_day", 24),
            grid: prop_px(widget, "font_size_grid", 14),
            event: prop_px(widget, "font_size_event", 18),
        }
    }

    /// The big date numeral renders at half its nominal size, capped.
    fn date_px(&self) -> u32 {
        (self.date / 2).clamp(1, 80)
    }
}

impl CalendarPlugin {
    fn entity(widget: &Widget) -> String {
        widget
            .entity()
            .map(str::to_string)
            .or_else(|| widget.prop_str("entity_id"))
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "sensor.esp_calendar_data".to_string())
    }
}

impl WidgetPlugin for CalendarPlugin {
    fn kind(&self) -> &'static str {
        "calendar"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        let family = font_family(widget);
        let sizes = CalendarFonts::from_widget(widget);
        fonts.add_font(&family, 100, sizes.date_px(), false);
        fonts.add_font(&family, 700, sizes.day, false);
        fonts.add_font(&family, 400, sizes.grid, false);
        fonts.add_font(&family, 400, sizes.event, false);
    }

    fn on_export_text_sensors(&self, ctx: &mut SectionContext<'_>) {
        let entities: Vec<String> = ctx.widgets_of("calendar").map(Self::entity).collect();
        for entity in entities {
            ctx.declare(&EntityKey::new(entity, None), EntityKind::Text);
        }
    }
}

impl DirectExport for CalendarPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let entity = Self::entity(widget);
        let (events, _) = ctx.sensor(&entity, None, EntityKind::Text);
        let family = font_family(widget);
        let sizes = CalendarFonts::from_widget(widget);
        let date_font = ctx.font(&family, 100, sizes.date_px(), false);
        let day_font = ctx.font(&family, 700, sizes.day, false);
        let grid_font = ctx.font(&family, 400, sizes.grid, false);
        let event_font = ctx.font(&family, 400, sizes.event, false);

        let text_prop = widget.prop_str_or("text_color", "black");
        let color = color_const(&text_prop);
        let bg_prop = widget.prop_str_or("background_color", "white");
        let bg = color_const(&bg_prop);
        let border = color_const(&widget.prop_str_or("border_color", "black"));

        let (g, e) = (sizes.grid, sizes.event);
        let day_offset = sizes.date_px();
        let head_h = day_offset + sizes.day + g + 10;

        ctx.push("{");
        ctx.push("  auto now = id(ha_time).now();");
        ctx.push(format!(
            "  int x = {}; int y = {}; int w = {}; int h = {};",
            widget.x, widget.y, widget.width, widget.height
        ));
        if bg_prop != "transparent" {
            ctx.push(format!("  it.filled_rectangle(x, y, w, h, {bg});"));
        }
        ctx.push("  if (now.is_valid()) {");
        ctx.push(format!(
            "    it.strftime(x + w / 2, y + 2, id({date_font}), {color}, TextAlign::TOP_CENTER, \
            \"%d\", now);"
        ));
        ctx.push(format!(
            "    it.strftime(x + w / 2, y + {day_offset}, id({day_font}), {color}, \
            TextAlign::TOP_CENTER, \"%A\", now);"
        ));
        ctx.push(format!(
            "    it.strftime(x + w / 2, y + {}, id({grid_font}), {color}, TextAlign::TOP_CENTER, \
            \"%B %Y\", now);",
            day_offset + sizes.day
        ));
        ctx.push("  }");
        ctx.push(format!(
            "  it.line(x, y + {head_h}, x + w, y + {head_h}, {color});"
        ));
        ctx.push(format!("  int grid_y = y + {};", head_h + 5));
        ctx.push("  int cell_w = w / 7;");
        ctx.push(format!("  int row_h = {};", g + 4));
        ctx.push(
            "  const char *days[] = {\"Mo\", \"Tu\", \"We\", \"Th\", \"Fr\", \"Sa\", \"Su\"};",
        );
        ctx.push("  for (int i = 0; i < 7; i++) {");
        ctx.push(format!(
            "    it.print(x + i * cell_w + cell_w / 2, grid_y, id({grid_font}), {color}, \
            TextAlign::TOP_CENTER, days[i]);"
        ));
        ctx.push("  }");

        // Monday-first grid; ESPTime counts weekdays from Sunday = 1
        ctx.push("  int row = 1;");
        ctx.push("  if (now.is_valid()) {");
        ctx.push(
            "    int col = ((now.day_of_week + 5) % 7 - (now.day_of_month - 1) % 7 + 7) % 7;",
        );
        ctx.push("    int days_in_month = 31;");
        ctx.push("    if (now.month == 2) {");
        ctx.push(
            "      bool leap = (now.year % 4 == 0 && now.year % 100 != 0) || now.year % 400 == 0;",
        );
        ctx.push("      days_in_month = leap ? 29 : 28;");
        ctx.push(
            "    } else if (now.month == 4 || now.month == 6 || now.month == 9 || now.month == 11) {",
        );
        ctx.push("      days_in_month = 30;");
        ctx.push("    }");
        ctx.push("    for (int d = 1; d <= days_in_month; d++) {");
        ctx.push("      int cx = x + col * cell_w + cell_w / 2;");
        ctx.push("      int cy = grid_y + row * row_h;");
        ctx.push("      if (d == now.day_of_month) {");
        ctx.push(format!(
            "        it.filled_circle(cx, cy + {}, {}, {color});",
            g / 2,
            (g * 2 / 3).max(1)
        ));
        ctx.push(format!(
            "        it.printf(cx, cy, id({grid_font}), {bg}, TextAlign::TOP_CENTER, \"%d\", d);"
        ));
        ctx.push("      } else {");
        ctx.push(format!(
            "        it.printf(cx, cy, id({grid_font}), {color}, TextAlign::TOP_CENTER, \"%d\", d);"
        ));
        ctx.push("      }");
        ctx.push("      if (++col > 6) {");
        ctx.push("        col = 0;");
        ctx.push("        row++;");
        ctx.push("      }");
        ctx.push("    }");
        ctx.push("  }");

        ctx.push("  int line_y = grid_y + (row + 1) * row_h + 10;");
        ctx.push(format!("  if (id({events}).has_state()) {{"));
        ctx.push(format!("    std::string events = id({events}).state;"));
        ctx.push("    size_t start = 0;");
        ctx.push(format!(
            "    while (start < events.size() && line_y + {e} <= y + h) {{"
        ));
        ctx.push("      size_t end = events.find('\\n', start);");
        ctx.push("      if (end == std::string::npos) end = events.size();");
        ctx.push(format!(
            "      it.printf(x + 5, line_y, id({event_font}), {color}, TextAlign::TOP_LEFT, \
            \"%s\", events.substr(start, end - start).c_str());"
        ));
        ctx.push(format!("      line_y += {};", e + 4));
        ctx.push("      start = end + 1;");
        ctx.push("    }");
        ctx.push("  }");

        if widget.prop_bool("show_border") != Some(false) {
            push_border(ctx, prop_px(widget, "border_width", 2), &border);
        }
        ctx.push("}");
        ctx.dither(&text_prop, widget.x, widget.y, widget.width, widget.height);
        Ok(())
    }
}

// ============================================================================
// weather_forecast
// ============================================================================

/// Daily condition, high and low for the next few days.
///
/// The per-day values come from Home Assistant template sensors named
/// `sensor.weather_forecast_day_<n>_{high,low,condition}`.
#[derive(Debug, Default)]
pub struct WeatherForecastPlugin;

impl WeatherForecastPlugin {
    fn days(widget: &Widget) -> u32 {
        widget.prop_i64_or("days", 5).clamp(1, 7) as u32
    }

    fn weather_entity(widget: &Widget) -> String {
        widget
            .entity()
            .map(str::to_string)
            .or_else(|| widget.prop_str("weather_entity"))
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "weather.forecast_home".to_string())
    }

    /// Home Assistant source of one per-day value.
    pub fn day_source(day: u32, field: &str) -> String {
        format!("sensor.weather_forecast_day_{day}_{field}")
    }

    fn max_days(ctx: &SectionContext<'_>) -> Option<u32> {
        ctx.widgets_of("weather_forecast").map(Self::days).max()
    }
}

impl WidgetPlugin for WeatherForecastPlugin {
    fn kind(&self) -> &'static str {
        "weather_forecast"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        let family = font_family(widget);
        fonts.add_font(&family, 700, prop_px(widget, "day_font_size", 12), false);
        fonts.add_font(&family, 400, prop_px(widget, "temp_font_size", 14), false);
        let size = prop_px(widget, "icon_size", 32);
        for (_, code) in WEATHER_CONDITIONS {
            fonts.track_icon(code, size);
        }
        fonts.track_icon(WEATHER_FALLBACK, size);
    }

    fn on_export_numeric_sensors(&self, ctx: &mut SectionContext<'_>) {
        let Some(days) = Self::max_days(ctx) else {
            return;
        };
        for day in 0..days {
            for (field, prefix) in [("high", "weather_high_day"), ("low", "weather_low_day")] {
                ctx.declare_as(
                    &EntityKey::new(Self::day_source(day, field), None),
                    &format!("{prefix}{day}"),
                    EntityKind::Numeric,
                    Vec::new(),
                );
            }
        }
    }

    fn on_export_text_sensors(&self, ctx: &mut SectionContext<'_>) {
        let Some(days) = Self::max_days(ctx) else {
            return;
        };
        let source = ctx
            .widgets_of("weather_forecast")
            .next()
            .map(Self::weather_entity)
            .unwrap_or_default();
        ctx.push_item(Node::Comment(format!(
            "weather_forecast: needs Home Assistant template sensors {} fed by \
            weather.get_forecasts (daily) on {source}",
            Self::day_source(0, "{high,low,condition}").replace("_0_", "_<n>_")
        )));
        for day in 0..days {
            ctx.declare_as(
                &EntityKey::new(Self::day_source(day, "condition"), None),
                &format!("weather_cond_day{day}"),
                EntityKind::Text,
                Vec::new(),
            );
        }
    }
}

impl DirectExport for WeatherForecastPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let family = font_family(widget);
        let day_size = prop_px(widget, "day_font_size", 12);
        let icon_size = prop_px(widget, "icon_size", 32);
        let day_font = ctx.font(&family, 700, day_size, false);
        let temp_font = ctx.font(&family, 400, prop_px(widget, "temp_font_size", 14), false);
        let icon_font = ctx.icon_font(icon_size);
        let color_prop = widget.prop_str_or("color", "black");
        let color = color_const(&color_prop);
        let show_high_low = widget.prop_bool("show_high_low") != Some(false);

        let days = Self::days(widget) as i32;
        let horizontal = widget.prop_str_or("layout", "horizontal") == "horizontal";
        let (x_inc, y_inc) = if horizontal {
            (widget.width / days, 0)
        } else {
            (0, widget.height / days)
        };
        let center = if horizontal { x_inc / 2 } else { widget.width / 2 };
        let (day_size, icon_size) = (day_size as i32, icon_size as i32);

        ctx.push("{");
        ctx.push("  auto icon_for = [](const std::string &cond) -> const char * {");
        for (condition, code) in WEATHER_CONDITIONS {
            ctx.push(format!(
                "    if (cond == \"{condition}\") return \"{}\";",
                glyph(code)
            ));
        }
        ctx.push(format!("    return \"{}\";", glyph(WEATHER_FALLBACK)));
        ctx.push("  };");
        ctx.push("  auto day_name = [](int offset) -> std::string {");
        ctx.push("    if (offset == 0) return \"Today\";");
        ctx.push("    auto t = id(ha_time).now();");
        ctx.push("    if (!t.is_valid()) return \"---\";");
        ctx.push("    ESPTime future = ESPTime::from_epoch_local(t.timestamp + offset * 86400);");
        ctx.push("    char buf[8];");
        ctx.push("    future.strftime(buf, sizeof(buf), \"%a\");");
        ctx.push("    return std::string(buf);");
        ctx.push("  };");

        for day in 0..days {
            let index = day as u32;
            let (cond, _) =
                ctx.sensor(&Self::day_source(index, "condition"), None, EntityKind::Text);
            let dx = widget.x + day * x_inc + center;
            let dy = widget.y + day * y_inc;
            ctx.push("  {");
            ctx.push(format!(
                "    it.printf({dx}, {dy}, id({day_font}), {color}, TextAlign::TOP_CENTER, \
                \"%s\", day_name({day}).c_str());"
            ));
            ctx.push(format!(
                "    it.printf({dx}, {}, id({icon_font}), {color}, TextAlign::TOP_CENTER, \"%s\", \
                icon_for(id({cond}).state));",
                dy + day_size + 4
            ));
            if show_high_low {
                let [high, low] = ["high", "low"].map(|field| {
                    ctx.sensor_id(&Self::day_source(index, field), None, EntityKind::Numeric)
                });
                ctx.push(format!("    float high = id({high}).state;"));
                ctx.push(format!("    float low = id({low}).state;"));
                ctx.push("    if (!std::isnan(high) && !std::isnan(low)) {");
                ctx.push(format!(
                    "      it.printf({dx}, {}, id({temp_font}), {color}, TextAlign::TOP_CENTER, \
                    \"%.0f/%.0f\", high, low);",
                    dy + day_size + icon_size + 8
                ));
                ctx.push("    }");
            }
            ctx.push("  }");
        }
        ctx.push("}");
        ctx.dither(&color_prop, widget.x, widget.y, widget.width, widget.height);
        Ok(())
    }
}

// ============================================================================
// quote_rss
// ============================================================================

/// A quote and its author taken from an RSS feed on a schedule.
///
/// The feed is fetched on the device; the first `<item>` (or a random one)
/// provides the quote from `<description>` and the author from `<title>`.
#[derive(Debug, Default)]
pub struct QuoteRssPlugin;

impl QuoteRssPlugin {
    /// Globals holding the latest quote and author of a widget.
    pub fn global_ids(widget: &Widget) -> (String, String) {
        let s = sanitize(&widget.id);
        (format!("quote_text_{s}"), format!("quote_author_{s}"))
    }

    fn feed_url(widget: &Widget) -> String {
        widget.prop_str_or("feed_url", "https://www.brainyquote.com/link/quotebr.rss")
    }

    fn fonts(widget: &Widget) -> (String, u32, u32, u32) {
        (
            font_family(widget),
            prop_px(widget, "font_weight", 400),
            prop_px(widget, "quote_font_size", 18),
            prop_px(widget, "author_font_size", 14),
        )
    }

    /// Response handler storing the chosen item into the widget's globals.
    fn parse_lambda(widget: &Widget) -> Vec<String> {
        let (text, author) = Self::global_ids(widget);
        let pick = if widget.prop_bool("random") != Some(false) {
            "items[random_uint32() % items.size()]"
        } else {
            "items[0]"
        };
        vec![
            "if (response->status_code != 200) return;".to_string(),
            "std::vector<size_t> items;".to_string(),
            "for (size_t p = body.find(\"<item>\"); p != std::string::npos; p = \
            body.find(\"<item>\", p + 6)) {".to_string(),
            "  items.push_back(p);".to_string(),
            "}".to_string(),
            "if (items.empty()) return;".to_string(),
            format!("size_t pos = {pick};"),
            "auto tag = [&](const std::string &name) -> std::string {".to_string(),
            "  size_t a = body.find(\"<\" + name + \">\", pos);".to_string(),
            "  if (a == std::string::npos) return \"\";".to_string(),
            "  a += name.size() + 2;".to_string(),
            "  size_t b = body.find(\"</\" + name + \">\", a);".to_string(),
            "  return b == std::string::npos ? \"\" : body.substr(a, b - a);".to_string(),
            "};".to_string(),
            "std::string quote = tag(\"description\");".to_string(),
            "if (quote.size() >= 2 && quote.front() == '\"' && quote.back() == '\"') {".to_string(),
            "  quote = quote.substr(1, quote.size() - 2);".to_string(),
            "}".to_string(),
            format!("id({text}) = quote;"),
            format!("id({author}) = tag(\"title\");"),
        ]
    }
}

impl WidgetPlugin for QuoteRssPlugin {
    fn kind(&self) -> &'static str {
        "quote_rss"
    }

    fn direct(&self) -> Option<&dyn DirectExport> {
        Some(self)
    }

    fn collect_requirements(&self, widget: &Widget, fonts: &mut FontRegistry) {
        let (family, weight, quote, author) = Self::fonts(widget);
        fonts.add_font(&family, weight, quote, widget.prop_bool("italic_quote") != Some(false));
        fonts.add_font(&family, weight, author, false);
    }

    fn on_export_globals(&self, ctx: &mut SectionContext<'_>) {
        let ids: Vec<(String, String)> =
            ctx.widgets_of("quote_rss").map(Self::global_ids).collect();
        for (text, author) in ids {
            ctx.push_item(global(&text, "std::string", false, "\"\""));
            ctx.push_item(global(&author, "std::string", false, "\"\""));
        }
    }

    fn on_export_components(&self, ctx: &mut SectionContext<'_>) {
        let display = ctx.profile.display_id();
        let mut section = Section::list("interval");
        for widget in ctx.widgets_of("quote_rss") {
            let on_response = Node::map().with(
                "then",
                Node::list()
                    .item(Node::map().with("lambda", Node::Block(Self::parse_lambda(widget))))
                    .item(Node::map().with("component.update", Node::scalar(display))),
            );
            let fetch = Node::map()
                .with("url", Node::quoted(&Self::feed_url(widget)))
                .with("capture_response", Node::scalar(true))
                .with("max_response_buffer_size", Node::scalar(8192))
                .with("on_response", on_response);
            section.push(
                Node::map()
                    .with(
                        "interval",
                        Node::scalar(widget.prop_str_or("refresh_interval", "24h")),
                    )
                    .with(
                        "then",
                        Node::list().item(Node::map().with("http_request.get", fetch)),
                    ),
            );
        }
        if !section.is_empty() {
            ctx.push_section(section);
        }
    }
}

impl DirectExport for QuoteRssPlugin {
    fn export(&self, widget: &Widget, ctx: &mut DirectContext<'_>) -> Result<()> {
        let (family, weight, quote_size, author_size) = Self::fonts(widget);
        let italic = widget.prop_bool("italic_quote") != Some(false);
        let quote_font = ctx.font(&family, weight, quote_size, italic);
        let author_font = ctx.font(&family, weight, author_size, false);
        let color_prop = widget.prop_str_or("color", "black");
        let color = color_const(&color_prop);
        let (text, author) = Self::global_ids(widget);

        let (x, y, w, h) = (widget.x, widget.y, widget.width, widget.height);
        let align = text_align(widget.prop_str("text_align").as_deref());
        let anchor = match align.as_str() {
            "CENTER" => x + w / 2,
            "RIGHT" => x + w,
            _ => x,
        };
        let (q, a) = (quote_size as i32, author_size as i32);
        let show_author = widget.prop_bool("show_author") != Some(false);
        let author_room = if show_author { a + 4 } else { 0 };

        ctx.push("{");
        ctx.push(format!("  std::string quote = id({text});"));
        ctx.push("  if (quote.empty()) quote = \"Loading...\";");
        ctx.push(format!("  int line_y = {y};"));
        if widget.prop_bool("word_wrap") != Some(false) {
            let max_chars = (w / (q / 2).max(1)).max(1);
            ctx.push("  size_t start = 0;");
            ctx.push(format!(
                "  while (start < quote.size() && line_y + {q} <= {}) {{",
                y + h - author_room
            ));
            ctx.push("    size_t len = quote.size() - start;");
            ctx.push(format!("    if (len > {max_chars}) {{"));
            ctx.push(format!("      len = {max_chars};"));
            ctx.push("      size_t cut = quote.rfind(' ', start + len);");
            ctx.push("      if (cut != std::string::npos && cut > start) len = cut - start;");
            ctx.push("    }");
            ctx.push(format!(
                "    it.printf({anchor}, line_y, id({quote_font}), {color}, \
                TextAlign::TOP_{align}, \"%s\", quote.substr(start, len).c_str());"
            ));
            ctx.push(format!("    line_y += {};", q + 4));
            ctx.push("    start += len;");
            ctx.push("    while (start < quote.size() && quote[start] == ' ') start++;");
            ctx.push("  }");
        } else {
            ctx.push(format!(
                "  it.printf({anchor}, line_y, id({quote_font}), {color}, TextAlign::TOP_{align}, \
                \"%s\", quote.c_str());"
            ));
            ctx.push(format!("  line_y += {};", q + 4));
        }
        if show_author {
            ctx.push(format!("  if (!id({author}).empty()) {{"));
            ctx.push(format!(
                "    it.printf({anchor}, line_y + 4, id({author_font}), {color}, \
                TextAlign::TOP_{align}, \"- %s\", id({author}).c_str());"
            ));
            ctx.push("  }");
        }
        ctx.push("}");
        ctx.dither(&color_prop, x, y, w, h);
        Ok(())
    }
}

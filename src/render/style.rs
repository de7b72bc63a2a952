//! Text styling shared by the chart title and the title list.

use crate::chart::Chart;
use crate::surface::{Color, Shadow};

/// Stroke width of the chart-title outline.
pub const CHART_TITLE_LINE_WIDTH: f32 = 0.2;
/// Stroke width of the item-title outline.
pub const ITEM_TITLE_LINE_WIDTH: f32 = 0.3;

pub const TEXT_SHADOW: Shadow = Shadow {
    color: Color::BLACK,
    offset_x: 2.0,
    offset_y: 2.0,
    blur: 4.0,
};

/// The chart's text colour; anything but `#rrggbb` falls back to white.
pub fn resolve_text_color(chart: &Chart) -> Color {
    match chart.text_color.as_deref() {
        Some(value) if Color::is_six_digit_hex(value) => Color::parse(value).unwrap_or(Color::WHITE),
        Some(value) => {
            tracing::warn!(value, "invalid text colour, using white");
            Color::WHITE
        }
        None => Color::WHITE,
    }
}

/// Shadow for text, unless the chart turned shadows off.
pub fn text_shadow(chart: &Chart) -> Option<Shadow> {
    chart.shadows_enabled().then_some(TEXT_SHADOW)
}

/// Background fill colour; unparseable values keep the canvas default (black).
pub fn resolve_background_color(value: &str) -> Color {
    Color::parse(value).unwrap_or_else(|| {
        tracing::warn!(value, "unrecognised background colour, using black");
        Color::BLACK
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_with_color(color: Option<&str>) -> Chart {
        Chart {
            text_color: color.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_text_color_valid_hex() {
        assert_eq!(resolve_text_color(&chart_with_color(Some("#FF8800"))), Color::rgb(255, 136, 0));
        assert_eq!(resolve_text_color(&chart_with_color(Some("#ff8800"))), Color::rgb(255, 136, 0));
    }

    #[test]
    fn test_text_color_fallbacks() {
        assert_eq!(resolve_text_color(&chart_with_color(None)), Color::WHITE);
        assert_eq!(resolve_text_color(&chart_with_color(Some("#f80"))), Color::WHITE);
        assert_eq!(resolve_text_color(&chart_with_color(Some("red"))), Color::WHITE);
        assert_eq!(resolve_text_color(&chart_with_color(Some("#12345G"))), Color::WHITE);
    }

    #[test]
    fn test_shadow_on_unless_disabled() {
        let mut chart = Chart::default();
        assert_eq!(text_shadow(&chart), Some(TEXT_SHADOW));
        chart.shadows = Some(true);
        assert_eq!(text_shadow(&chart), Some(TEXT_SHADOW));
        chart.shadows = Some(false);
        assert_eq!(text_shadow(&chart), None);
    }

    #[test]
    fn test_background_color_fallback() {
        assert_eq!(resolve_background_color("#112233"), Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(resolve_background_color("not-a-colour"), Color::BLACK);
    }
}

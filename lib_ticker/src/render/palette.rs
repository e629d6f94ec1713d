//! Named colours used by the display document and the renderers.

use super::frame::Rgb;
use crate::configs::config_display::WeatherConfig;
use crate::models::Severity;

/// Default text.
pub const WHITE: Rgb = Rgb::new(220, 220, 220);
/// Clock and fallback colour.
pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
/// Negative change, staleness.
pub const RED: Rgb = Rgb::new(255, 0, 0);
/// Positive change.
pub const GREEN: Rgb = Rgb::new(0, 255, 0);
/// Holdings value.
pub const CYAN: Rgb = Rgb::new(100, 180, 255);
/// Game-day dot.
pub const BLUE: Rgb = Rgb::new(80, 160, 255);
/// Operator text.
pub const MAGENTA: Rgb = Rgb::new(255, 80, 180);
/// Unused by default, available to the document.
pub const ORANGE: Rgb = Rgb::new(255, 165, 0);
/// Missing data.
pub const GREY: Rgb = Rgb::new(140, 140, 140);
/// Scoreboard period label.
pub const PERIOD_GREY: Rgb = Rgb::new(180, 180, 180);

/// Resolves a colour name; unknown names fall back to yellow.
pub fn color(name: &str) -> Rgb {
    match name.trim().to_ascii_lowercase().as_str() {
        "white" => WHITE,
        "yellow" => YELLOW,
        "red" => RED,
        "green" => GREEN,
        "cyan" => CYAN,
        "blue" => BLUE,
        "magenta" => MAGENTA,
        "orange" => ORANGE,
        "grey" | "gray" => GREY,
        "black" => Rgb::BLACK,
        _ => YELLOW,
    }
}

/// Green for a non-negative change, red otherwise.
pub fn change_color(pct: f64) -> Rgb {
    if pct >= 0.0 {
        GREEN
    } else {
        RED
    }
}

/// Warning colour for warnings, advisory colour for every lower tier.
pub fn severity_color(severity: Severity, cfg: &WeatherConfig) -> Rgb {
    if severity.is_warning() {
        color(&cfg.warning_color)
    } else {
        color(&cfg.advisory_color)
    }
}

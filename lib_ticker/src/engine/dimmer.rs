//! # Dimmer
//!
//! Brightness as a pure function of local time and the brightness schedule.
//! Every window is half-open, `[start, end)`, and may wrap past midnight.

use chrono::NaiveTime;
use serde::Serialize;

use crate::configs::config_display::BrightnessConfig;
use crate::configs::parse_hhmm;

/// `start <= now < end`, wrapping past midnight when `start > end`.
/// `start == end` is an empty window.
pub fn time_in_range(now: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start <= end {
        start <= now && now < end
    } else {
        now >= start || now < end
    }
}

fn window(start: &str, end: &str, now: NaiveTime) -> bool {
    match (parse_hhmm(start), parse_hhmm(end)) {
        (Some(s), Some(e)) => time_in_range(now, s, e),
        _ => false,
    }
}

/// What decided the brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrightnessSource {
    /// Full-brightness override.
    Override,
    /// Off window.
    Off,
    /// A fixed dim window.
    Window,
    /// Night mode.
    Night,
    /// No window matched.
    Base,
}

/// Result of the dimmer for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Brightness {
    /// Pixel scale in `[min, max]`, or 0 when blanked.
    pub scale: f64,
    /// The off window is active: the frame is blanked.
    pub blank: bool,
    /// Scroll speed multiplier.
    pub speed_scale: f64,
    /// Deciding rule.
    pub source: BrightnessSource,
}

/// # Brightness At
///
/// Resolution order: override, off window, first matching dim window, night,
/// base. The result is clamped to `[min, max]` except for the off window.
pub fn brightness_at(now: NaiveTime, cfg: &BrightnessConfig, full_override: bool) -> Brightness {
    let clamp = |pct: u32| (f64::from(pct) / 100.0).clamp(cfg.min, cfg.max);
    let night = cfg.night.enabled && window(&cfg.night.start, &cfg.night.end, now);
    let speed_scale = if night { f64::from(cfg.night.speed_pct) / 100.0 } else { 1.0 };

    if full_override {
        return Brightness { scale: cfg.max, blank: false, speed_scale, source: BrightnessSource::Override };
    }
    if cfg.off.enabled && window(&cfg.off.start, &cfg.off.end, now) {
        return Brightness { scale: 0.0, blank: true, speed_scale, source: BrightnessSource::Off };
    }
    if let Some(w) = cfg.windows.iter().find(|w| window(&w.start, &w.end, now)) {
        return Brightness { scale: clamp(w.pct), blank: false, speed_scale, source: BrightnessSource::Window };
    }
    if night {
        return Brightness { scale: clamp(cfg.night.dim_pct), blank: false, speed_scale, source: BrightnessSource::Night };
    }
    Brightness { scale: clamp(cfg.base_pct), blank: false, speed_scale, source: BrightnessSource::Base }
}

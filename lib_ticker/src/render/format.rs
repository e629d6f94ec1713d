//! Text formatting for prices, percentages, headlines and the clock.

use chrono::{NaiveTime, Timelike};

use crate::configs::config_display::ClockConfig;

/// `1.2M`, `1.5k` or one decimal.
pub fn price_compact(v: f64) -> String {
    let a = v.abs();
    if a >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if a >= 1_000.0 {
        format!("{:.1}k", v / 1_000.0)
    } else {
        format!("{:.1}", v)
    }
}

/// Same thresholds as [`price_compact`] with a dollar sign; whole dollars below 1k.
pub fn currency_compact(v: f64) -> String {
    let a = v.abs();
    if a >= 1_000_000.0 {
        format!("${:.1}M", v / 1_000_000.0)
    } else if a >= 1_000.0 {
        format!("${:.1}k", v / 1_000.0)
    } else {
        format!("${:.0}", v)
    }
}

/// Signed percentage with two decimals, e.g. `+1.20%`.
pub fn pct(v: f64) -> String {
    format!("{:+.2}%", v)
}

/// Upper-cased headline cut to `max` characters plus `...`.
pub fn headline(text: &str, max: usize) -> String {
    let upper = text.trim().to_uppercase();
    if upper.chars().count() <= max {
        return upper;
    }
    let mut cut: String = upper.chars().take(max).collect();
    cut.push_str("...");
    cut
}

/// # Clock Text
///
/// `HH:MM` or `H:MM` (12-hour, no leading zero), optionally with seconds. When
/// `blink` is set the colons are blanked on even seconds, so they show on odd ones.
pub fn clock_text(t: NaiveTime, h24: bool, seconds: bool, blink: bool) -> String {
    let fmt = match (h24, seconds) {
        (true, true) => "%H:%M:%S",
        (true, false) => "%H:%M",
        (false, true) => "%-I:%M:%S",
        (false, false) => "%-I:%M",
    };
    let text = t.format(fmt).to_string();
    if blink && t.second() % 2 == 0 {
        text.replace(':', " ")
    } else {
        text
    }
}

/// Clock text per the clock settings.
pub fn clock_from_config(t: NaiveTime, cfg: &ClockConfig, with_seconds: bool) -> String {
    clock_text(t, cfg.h24, with_seconds && cfg.show_seconds, cfg.blink_colon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_prices() {
        assert_eq!(price_compact(150.0), "150.0");
        assert_eq!(price_compact(18_234.5), "18.2k");
        assert_eq!(price_compact(2_500_000.0), "2.5M");
        assert_eq!(currency_compact(950.4), "$950");
        assert_eq!(currency_compact(15_000.0), "$15.0k");
        assert_eq!(pct(1.2), "+1.20%");
        assert_eq!(pct(-0.5), "-0.50%");
    }

    #[test]
    fn headlines_are_truncated() {
        assert_eq!(headline("Wind warning", 80), "WIND WARNING");
        assert_eq!(headline("abcdef", 3), "ABC...");
    }

    #[test]
    fn colon_blinks_on_even_seconds() {
        let odd = NaiveTime::from_hms_opt(13, 5, 1).unwrap();
        let even = NaiveTime::from_hms_opt(13, 5, 2).unwrap();
        assert_eq!(clock_text(odd, true, false, true), "13:05");
        assert_eq!(clock_text(even, true, false, true), "13 05");
        assert_eq!(clock_text(odd, false, false, true), "1:05");
        assert_eq!(clock_text(even, false, true, false), "1:05:02");
    }
}

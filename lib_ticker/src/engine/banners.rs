//! # Ticker Banners
//!
//! Time-driven state behind two ticker injections: how long a weather headline
//! stays pinned in every pass, and when the market-open banner is armed.

use chrono::{DateTime, NaiveDate, Utc};
use std::time::{Duration, Instant};

use crate::configs::config_display::{MarketConfig, WeatherConfig};
use crate::markets::{market_event_at, MarketEvent};
use crate::models::WeatherAlert;

/// Pins a weather headline for `sticky_seconds` when it first appears, and again
/// every `repeat_seconds` while it stays active.
#[derive(Debug, Default)]
pub struct WeatherPin {
    headline: Option<String>,
    show_until: Option<Instant>,
    next_repeat: Option<Instant>,
}

impl WeatherPin {
    /// Idle pin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks the active headline and reports whether it is pinned at `now`.
    pub fn update(&mut self, headline: Option<&WeatherAlert>, now: Instant, cfg: &WeatherConfig) -> bool {
        let Some(alert) = headline else {
            if self.headline.take().is_some() {
                log::debug!("Weather headline cleared");
            }
            self.show_until = None;
            self.next_repeat = None;
            return false;
        };
        let sticky = Duration::from_secs(cfg.sticky_seconds);
        let changed = self.headline.as_deref() != Some(alert.headline.as_str());
        if changed {
            self.headline = Some(alert.headline.clone());
        }
        if sticky.is_zero() {
            self.show_until = None;
            self.next_repeat = None;
            return false;
        }
        if changed || self.next_repeat.is_some_and(|at| now >= at) {
            let repeat = Duration::from_secs(cfg.repeat_seconds).max(sticky);
            self.show_until = Some(now + sticky);
            self.next_repeat = Some(now + repeat);
            log::info!("Weather headline pinned for {}s: {}", sticky.as_secs(), alert.headline);
        }
        self.show_until.is_some_and(|until| now < until)
    }
}

/// Arms the market-open banner once per New York trading date.
#[derive(Debug, Default)]
pub struct MarketOpenArm {
    armed_on: Option<NaiveDate>,
    serial: u64,
}

impl MarketOpenArm {
    /// Never armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms on the first call inside the opening-bell window of a date. Returns
    /// the serial of the latest arming, 0 before the first.
    pub fn update(&mut self, wall: DateTime<Utc>, cfg: &MarketConfig) -> u64 {
        if cfg.open_banner_passes == 0 {
            return self.serial;
        }
        if let Some((MarketEvent::Open, date)) = market_event_at(wall) {
            if self.armed_on != Some(date) {
                self.armed_on = Some(date);
                self.serial += 1;
                log::info!("Market open banner armed for {} ticker passes", cfg.open_banner_passes);
            }
        }
        self.serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use chrono::TimeZone;
    use chrono_tz::US::Eastern;

    fn alert(text: &str) -> WeatherAlert {
        WeatherAlert { region: "Montreal".into(), severity: Severity::Warning, headline: text.into(), effective_until: None }
    }

    #[test]
    fn new_headline_is_pinned_then_repeated() {
        let cfg = WeatherConfig { sticky_seconds: 12, repeat_seconds: 600, ..WeatherConfig::default() };
        let mut pin = WeatherPin::new();
        let t0 = Instant::now();
        let a = alert("Snowfall warning");
        assert!(pin.update(Some(&a), t0, &cfg));
        assert!(pin.update(Some(&a), t0 + Duration::from_millis(11_999), &cfg));
        assert!(!pin.update(Some(&a), t0 + Duration::from_secs(12), &cfg));
        assert!(!pin.update(Some(&a), t0 + Duration::from_secs(599), &cfg));
        assert!(pin.update(Some(&a), t0 + Duration::from_secs(600), &cfg));

        // A different headline pins at once.
        let b = alert("Freezing rain warning");
        assert!(pin.update(Some(&b), t0 + Duration::from_secs(620), &cfg));
        assert!(!pin.update(None, t0 + Duration::from_secs(621), &cfg));
        assert!(pin.update(Some(&b), t0 + Duration::from_secs(622), &cfg));
    }

    #[test]
    fn zero_sticky_never_pins() {
        let cfg = WeatherConfig { sticky_seconds: 0, ..WeatherConfig::default() };
        let mut pin = WeatherPin::new();
        assert!(!pin.update(Some(&alert("Wind warning")), Instant::now(), &cfg));
    }

    #[test]
    fn open_banner_arms_once_per_date() {
        let cfg = MarketConfig::default();
        let mut arm = MarketOpenArm::new();
        let et = |d, h, m| Eastern.with_ymd_and_hms(2025, 3, d, h, m, 0).single().unwrap().with_timezone(&Utc);
        assert_eq!(arm.update(et(12, 9, 29), &cfg), 0);
        assert_eq!(arm.update(et(12, 9, 30), &cfg), 1);
        assert_eq!(arm.update(et(12, 9, 32), &cfg), 1);
        // The closing bell does not arm.
        assert_eq!(arm.update(et(12, 16, 0), &cfg), 1);
        assert_eq!(arm.update(et(13, 9, 31), &cfg), 2);

        let off = MarketConfig { open_banner_passes: 0, ..MarketConfig::default() };
        assert_eq!(MarketOpenArm::new().update(et(14, 9, 30), &off), 0);
    }
}

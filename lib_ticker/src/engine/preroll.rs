//! # Preroll Scheduler
//!
//! Decides when a time-based interstitial is due: at the top of every local hour
//! and at the New York opening and closing bells. Each trigger fires at most once
//! per window and only one preroll is on screen at a time.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Timelike, Utc};
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::configs::{DisplayConfig, PrerollStyle};
use crate::markets::{market_event_at, MarketEvent};

/// What caused a preroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrerollTrigger {
    /// `HH:00:00` local.
    TopOfHour,
    /// Opening bell.
    MarketOpen,
    /// Closing bell.
    MarketClose,
}

impl PrerollTrigger {
    /// The market event behind the trigger, if any.
    pub fn market_event(self) -> Option<MarketEvent> {
        match self {
            PrerollTrigger::TopOfHour => None,
            PrerollTrigger::MarketOpen => Some(MarketEvent::Open),
            PrerollTrigger::MarketClose => Some(MarketEvent::Close),
        }
    }

    fn from_event(ev: MarketEvent) -> Self {
        match ev {
            MarketEvent::Open => PrerollTrigger::MarketOpen,
            MarketEvent::Close => PrerollTrigger::MarketClose,
        }
    }

    /// Short name for logs and status.
    pub fn as_str(self) -> &'static str {
        match self {
            PrerollTrigger::TopOfHour => "top_of_hour",
            PrerollTrigger::MarketOpen => "market_open",
            PrerollTrigger::MarketClose => "market_close",
        }
    }
}

/// A preroll that is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerollSpec {
    /// Cause.
    pub trigger: PrerollTrigger,
    /// Presentation.
    pub style: PrerollStyle,
    /// Start time.
    pub started_at: Instant,
    /// End time.
    pub ends_at: Instant,
    /// Increments per fired preroll.
    pub serial: u64,
}

/// # Preroll Scheduler
#[derive(Debug, Default)]
pub struct PrerollScheduler {
    next_top: Option<DateTime<Utc>>,
    fired_events: HashSet<(NaiveDate, MarketEvent)>,
    active: Option<PrerollSpec>,
    serial: u64,
}

/// Start of the local hour containing `wall`, in UTC. In a repeated hour the
/// later of the two starts is taken when it is not after `wall`.
fn hour_floor<Tz: TimeZone>(wall: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let local = wall.with_timezone(tz);
    let naive = local.naive_local();
    let floored = naive.date().and_hms_opt(naive.hour(), 0, 0).and_then(|n| {
        let starts = tz.from_local_datetime(&n);
        let latest = starts.clone().latest().map(|d| d.with_timezone(&Utc)).filter(|d| *d <= wall);
        latest.or_else(|| starts.earliest().map(|d| d.with_timezone(&Utc)))
    });
    // Fallback for zones whose hours do not start at :00.
    floored.unwrap_or_else(|| wall - ChronoDuration::seconds(i64::from(wall.minute() * 60 + wall.second())))
}

impl PrerollScheduler {
    /// Idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// The preroll on screen at the last poll.
    pub fn active(&self) -> Option<&PrerollSpec> {
        self.active.as_ref()
    }

    /// Advances the schedule to `wall` and returns the preroll to show, if any.
    pub fn poll(&mut self, now: Instant, wall: DateTime<Utc>, cfg: &DisplayConfig) -> Option<&PrerollSpec> {
        let pc = &cfg.preroll;
        let duration = Duration::from_secs(pc.duration_seconds);
        let event_now = market_event_at(wall);

        // --- Phase 1: End the current preroll ---
        let finished = self.active.as_ref().is_some_and(|active| {
            let window_closed = active
                .trigger
                .market_event()
                .is_some_and(|ev| event_now.map(|(e, _)| e) != Some(ev));
            !pc.enabled || now >= active.ends_at || window_closed
        });
        if finished {
            self.active = None;
        }

        // --- Phase 2: Collect due triggers (market bells take precedence) ---
        let mut due: Option<PrerollTrigger> = None;
        if let Some((ev, date)) = event_now {
            if self.fired_events.insert((date, ev)) && pc.enabled && pc.market_events {
                due = Some(PrerollTrigger::from_event(ev));
            }
            self.fired_events.retain(|(d, _)| *d >= date - ChronoDuration::days(1));
        }

        let tz = cfg.tz();
        let boundary = *self.next_top.get_or_insert_with(|| hour_floor(wall, &tz));
        if wall >= boundary {
            let late = (wall - boundary).to_std().unwrap_or(Duration::ZERO);
            self.next_top = Some(hour_floor(wall, &tz) + ChronoDuration::hours(1));
            if late <= duration && pc.enabled && pc.top_of_hour && due.is_none() {
                due = Some(PrerollTrigger::TopOfHour);
            }
        }

        // --- Phase 3: Fire, unless something is already on screen ---
        if let Some(trigger) = due {
            if self.active.is_none() {
                self.serial += 1;
                log::info!("Preroll fired: {} ({:?})", trigger.as_str(), pc.style);
                self.active = Some(PrerollSpec {
                    trigger,
                    style: pc.style,
                    started_at: now,
                    ends_at: now + duration,
                    serial: self.serial,
                });
            } else {
                log::debug!("Preroll {} due while another is active; marked fired", trigger.as_str());
            }
        }
        self.active.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::US::Eastern;

    fn cfg() -> DisplayConfig {
        let mut c = DisplayConfig::default();
        c.panel.timezone = "America/New_York".to_string();
        c
    }

    fn et(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        // March 2025: the 12th is a Wednesday, the 15th a Saturday.
        Eastern.with_ymd_and_hms(2025, 3, d, h, m, s).single().unwrap().with_timezone(&Utc)
    }

    #[test]
    fn top_of_hour_fires_once_and_ends_after_duration() {
        let c = cfg();
        let mut p = PrerollScheduler::new();
        let t0 = Instant::now();
        assert!(p.poll(t0, et(15, 10, 59, 58), &c).is_none());
        let due = p.poll(t0 + Duration::from_secs(2), et(15, 11, 0, 0), &c).cloned().unwrap();
        assert_eq!(due.trigger, PrerollTrigger::TopOfHour);
        assert!(p.poll(t0 + Duration::from_secs(16), et(15, 11, 0, 14), &c).is_some());
        assert!(p.poll(t0 + Duration::from_secs(17), et(15, 11, 0, 15), &c).is_none());
        // Same window, already fired.
        assert!(p.poll(t0 + Duration::from_secs(18), et(15, 11, 0, 16), &c).is_none());
    }

    #[test]
    fn late_start_skips_the_current_hour() {
        let c = cfg();
        let mut p = PrerollScheduler::new();
        let t0 = Instant::now();
        assert!(p.poll(t0, et(15, 10, 20, 0), &c).is_none());
        // Starting within the duration after the boundary still fires.
        let mut q = PrerollScheduler::new();
        assert!(q.poll(t0, et(15, 10, 0, 5), &c).is_some());
    }

    #[test]
    fn closing_bell_beats_top_of_hour_and_ends_with_window() {
        let mut c = cfg();
        c.preroll.duration_seconds = 600;
        let mut p = PrerollScheduler::new();
        let t0 = Instant::now();
        p.poll(t0, et(12, 15, 59, 50), &c);
        let due = p.poll(t0 + Duration::from_secs(10), et(12, 16, 0, 0), &c).cloned().unwrap();
        assert_eq!(due.trigger, PrerollTrigger::MarketClose);
        assert!(p.poll(t0 + Duration::from_secs(170), et(12, 16, 2, 50), &c).is_some());
        // Window is [16:00, 16:03); the preroll ends with it despite the long duration.
        assert!(p.poll(t0 + Duration::from_secs(190), et(12, 16, 3, 0), &c).is_none());
        // Fired once per date.
        assert!(p.poll(t0 + Duration::from_secs(191), et(12, 16, 1, 0), &c).is_none());
    }

    #[test]
    fn repeated_dst_hour_fires_once_per_boundary() {
        let c = cfg();
        let mut p = PrerollScheduler::new();
        let t0 = Instant::now();
        // 2025-11-02: 01:00 EDT is 05:00 UTC, 01:00 EST is 06:00 UTC.
        let utc = |h, m| Utc.with_ymd_and_hms(2025, 11, 2, h, m, 0).single().unwrap();
        let at = |mins: u64| t0 + Duration::from_secs(mins * 60);

        assert!(p.poll(at(0), utc(4, 59), &c).is_none());
        assert!(p.poll(at(1), utc(5, 0), &c).is_some());
        assert!(p.poll(at(30), utc(5, 29), &c).is_none());
        // Second 01:00, an hour of real time later.
        let repeat = p.poll(at(61), utc(6, 0), &c).cloned().unwrap();
        assert_eq!(repeat.trigger, PrerollTrigger::TopOfHour);
        assert!(p.poll(at(62), utc(6, 1), &c).is_none());
        assert!(p.poll(at(90), utc(6, 30), &c).is_none());
        assert!(p.poll(at(120), utc(7, 0), &c).is_some());
        assert!(p.poll(at(121), utc(7, 1), &c).is_none());
    }

    #[test]
    fn repeated_hour_floor_is_never_after_wall() {
        let utc = |h, m| Utc.with_ymd_and_hms(2025, 11, 2, h, m, 0).single().unwrap();
        assert_eq!(hour_floor(utc(5, 30), &Eastern), utc(5, 0));
        assert_eq!(hour_floor(utc(6, 30), &Eastern), utc(6, 0));
        assert_eq!(hour_floor(utc(7, 0), &Eastern), utc(7, 0));
    }

    #[test]
    fn disabled_preroll_never_fires() {
        let mut c = cfg();
        c.preroll.enabled = false;
        let mut p = PrerollScheduler::new();
        assert!(p.poll(Instant::now(), et(12, 9, 30, 0), &c).is_none());
    }
}

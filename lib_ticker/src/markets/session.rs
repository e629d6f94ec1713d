//! # Exchange Session Clock
//!
//! New York trading-session arithmetic: which session a wall-clock instant falls
//! in and whether it sits inside the open or close announcement window.
//! Exchange holidays are not modelled; feeds that know better report the session
//! themselves.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::US::Eastern;

use crate::models::MarketSession;

/// Length of the announcement window after the opening and closing bells.
pub const EVENT_WINDOW_MINUTES: i64 = 3;

/// A bell worth announcing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketEvent {
    /// 09:30 New York.
    Open,
    /// 16:00 New York.
    Close,
}

impl MarketEvent {
    /// Banner text.
    pub fn announcement(self) -> &'static str {
        match self {
            MarketEvent::Open => "*** MARKET OPEN ***",
            MarketEvent::Close => "*** MARKET CLOSED ***",
        }
    }

    /// Palette name of the banner.
    pub fn color_name(self) -> &'static str {
        match self {
            MarketEvent::Open => "green",
            MarketEvent::Close => "red",
        }
    }

    /// Bell time in New York.
    pub fn bell(self) -> NaiveTime {
        match self {
            MarketEvent::Open => hm(9, 30),
            MarketEvent::Close => hm(16, 0),
        }
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

/// Gets `wall` in New York local time.
pub fn now_ny(wall: DateTime<Utc>) -> NaiveDateTime {
    wall.with_timezone(&Eastern).naive_local()
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The bell whose announcement window contains `wall`, with its New York date.
///
/// Windows are `[bell, bell + 3 min)` on weekdays.
pub fn market_event_at(wall: DateTime<Utc>) -> Option<(MarketEvent, NaiveDate)> {
    let ny = now_ny(wall);
    if !is_weekday(ny.date()) {
        return None;
    }
    let t = ny.time();
    [MarketEvent::Open, MarketEvent::Close].into_iter().find_map(|ev| {
        let start = ev.bell();
        let end = start + Duration::minutes(EVENT_WINDOW_MINUTES);
        (start <= t && t < end).then_some((ev, ny.date()))
    })
}

/// Session implied by the clock alone.
pub fn session_at(wall: DateTime<Utc>) -> MarketSession {
    let ny = now_ny(wall);
    if !is_weekday(ny.date()) {
        return MarketSession::Closed;
    }
    let t = ny.time();
    if t < hm(4, 0) {
        MarketSession::Closed
    } else if t < hm(9, 30) {
        MarketSession::Pre
    } else if t < hm(16, 0) {
        MarketSession::Regular
    } else if t < hm(20, 0) {
        MarketSession::Post
    } else {
        MarketSession::Closed
    }
}

/// Formats a Duration into HH:MM:SS string.
pub fn format_duration(dur: Duration) -> String {
    let total_secs = dur.num_seconds().max(0);
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ny(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Eastern
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn open_window_is_three_minutes_on_weekdays() {
        // 2025-03-12 is a Wednesday.
        assert_eq!(market_event_at(ny(2025, 3, 12, 9, 29, 59)), None);
        let (ev, date) = market_event_at(ny(2025, 3, 12, 9, 30, 0)).unwrap();
        assert_eq!(ev, MarketEvent::Open);
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
        assert!(market_event_at(ny(2025, 3, 12, 9, 32, 59)).is_some());
        assert_eq!(market_event_at(ny(2025, 3, 12, 9, 33, 0)), None);
        assert_eq!(market_event_at(ny(2025, 3, 12, 16, 1, 0)).map(|e| e.0), Some(MarketEvent::Close));
        // Saturday.
        assert_eq!(market_event_at(ny(2025, 3, 15, 9, 31, 0)), None);
    }

    #[test]
    fn sessions_by_clock() {
        assert_eq!(session_at(ny(2025, 3, 12, 5, 0, 0)), MarketSession::Pre);
        assert_eq!(session_at(ny(2025, 3, 12, 12, 0, 0)), MarketSession::Regular);
        assert_eq!(session_at(ny(2025, 3, 12, 17, 0, 0)), MarketSession::Post);
        assert_eq!(session_at(ny(2025, 3, 12, 21, 0, 0)), MarketSession::Closed);
        assert_eq!(session_at(ny(2025, 3, 16, 12, 0, 0)), MarketSession::Closed);
    }

    #[test]
    fn duration_format() {
        assert_eq!(format_duration(Duration::seconds(3_725)), "01:02:05");
    }
}

//! # Per-Domain Poller Health
//!
//! Lock-free accounting of each poller's fetch history, read by the status surface.
//!
//! ## Core Functionality:
//!
//! - **Atomic Counters**: every field a poller updates on its hot path is an atomic,
//!   so a poller never waits on the status writer and vice versa. `Ordering::Relaxed`
//!   is enough because each counter is only meaningful on its own.
//! - **Status At Read Time**: the `ok | error | no_data | stale` label is not stored.
//!   It is derived by [`derive_status`] from the counters and the snapshot's age when
//!   a report is built.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::snapshot::Domain;

/// Health label of one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Last fetch succeeded and the snapshot is fresh.
    Ok,
    /// The most recent attempt failed.
    Error,
    /// Nothing has ever been published.
    NoData,
    /// Data exists but is older than its threshold.
    Stale,
}

impl HealthStatus {
    /// Label as written in the status file.
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Ok => "ok",
            HealthStatus::Error => "error",
            HealthStatus::NoData => "no_data",
            HealthStatus::Stale => "stale",
        }
    }
}

/// Pure status derivation.
///
/// `age` is the age of the latest snapshot, `None` when nothing was published yet.
pub fn derive_status(age: Option<Duration>, threshold: Duration, consecutive_failures: u32) -> HealthStatus {
    match age {
        None => HealthStatus::NoData,
        Some(a) if a > threshold => HealthStatus::Stale,
        Some(_) if consecutive_failures > 0 => HealthStatus::Error,
        Some(_) => HealthStatus::Ok,
    }
}

/// # Domain Health
///
/// Counters for one poller. Shared as part of a [`HealthBoard`].
#[derive(Debug, Default)]
pub struct DomainHealth {
    last_success_ms: AtomicU64,
    last_attempt_ms: AtomicU64,
    consecutive_failures: AtomicU32,
    total_failures: AtomicU64,
    restarts: AtomicU32,
    last_fetch_ms: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl DomainHealth {
    /// Records a successful fetch that took `took`.
    pub fn record_success(&self, at: DateTime<Utc>, took: Duration) {
        let ms = at.timestamp_millis().max(0) as u64;
        self.last_success_ms.store(ms, Ordering::Relaxed);
        self.last_attempt_ms.store(ms, Ordering::Relaxed);
        self.last_fetch_ms.store(took.as_millis() as u64, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Records a failed attempt. Returns the new consecutive failure count.
    pub fn record_failure(&self, at: DateTime<Utc>, error: &str) -> u32 {
        self.last_attempt_ms.store(at.timestamp_millis().max(0) as u64, Ordering::Relaxed);
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let n = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        let mut slot = self.last_error.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(error.to_string());
        n
    }

    /// Records a supervisor restart of the poller task.
    pub fn record_restart(&self) -> u32 {
        self.restarts.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current consecutive failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Last successful fetch, if any.
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.last_success_ms.load(Ordering::Relaxed))
    }

    /// Point-in-time copy of every counter.
    pub fn report(&self, domain: Domain, age: Option<Duration>, threshold: Duration) -> HealthReport {
        let consecutive_failures = self.consecutive_failures();
        HealthReport {
            domain,
            status: derive_status(age, threshold, consecutive_failures),
            last_success: self.last_success(),
            last_attempt: millis_to_utc(self.last_attempt_ms.load(Ordering::Relaxed)),
            consecutive_failures,
            total_failures: self.total_failures.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
            last_fetch_ms: self.last_fetch_ms.load(Ordering::Relaxed),
            last_error: self.last_error.lock().unwrap_or_else(|e| e.into_inner()).clone(),
            age_seconds: age.map(|a| a.as_secs()),
        }
    }
}

fn millis_to_utc(ms: u64) -> Option<DateTime<Utc>> {
    if ms == 0 {
        return None;
    }
    Utc.timestamp_millis_opt(ms as i64).single()
}

/// Serializable view of one domain's health.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Domain name.
    pub domain: Domain,
    /// Derived label.
    pub status: HealthStatus,
    /// Last successful fetch.
    pub last_success: Option<DateTime<Utc>>,
    /// Last attempt, successful or not.
    pub last_attempt: Option<DateTime<Utc>>,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Failures since start.
    pub total_failures: u64,
    /// Supervisor restarts.
    pub restarts: u32,
    /// Duration of the last successful fetch.
    pub last_fetch_ms: u64,
    /// Text of the last error.
    pub last_error: Option<String>,
    /// Age of the latest snapshot.
    pub age_seconds: Option<u64>,
}

/// One [`DomainHealth`] per domain.
#[derive(Debug, Default)]
pub struct HealthBoard {
    market: DomainHealth,
    weather: DomainHealth,
    sports: DomainHealth,
}

impl HealthBoard {
    /// Creates a board with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters of `domain`.
    pub fn domain(&self, domain: Domain) -> &DomainHealth {
        match domain {
            Domain::Market => &self.market,
            Domain::Weather => &self.weather,
            Domain::Sports => &self.sports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derivation_order() {
        let t = Duration::from_secs(60);
        assert_eq!(derive_status(None, t, 3), HealthStatus::NoData);
        assert_eq!(derive_status(Some(Duration::from_secs(61)), t, 0), HealthStatus::Stale);
        assert_eq!(derive_status(Some(Duration::from_secs(10)), t, 2), HealthStatus::Error);
        assert_eq!(derive_status(Some(Duration::from_secs(10)), t, 0), HealthStatus::Ok);
    }

    #[test]
    fn success_resets_consecutive_failures() {
        let h = DomainHealth::default();
        let now = Utc::now();
        assert_eq!(h.record_failure(now, "timeout"), 1);
        assert_eq!(h.record_failure(now, "timeout"), 2);
        h.record_success(now, Duration::from_millis(120));
        let r = h.report(Domain::Market, Some(Duration::ZERO), Duration::from_secs(60));
        assert_eq!(r.consecutive_failures, 0);
        assert_eq!(r.total_failures, 2);
        assert_eq!(r.last_fetch_ms, 120);
        assert_eq!(r.last_error.as_deref(), Some("timeout"));
        assert_eq!(r.status, HealthStatus::Ok);
    }
}

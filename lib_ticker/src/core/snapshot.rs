//! # Snapshot Bus
//!
//! Single-slot, overwrite-on-write channels that carry the latest payload of each
//! data domain from its poller to the render loop.
//!
//! ## Core Design Principles:
//!
//! 1.  **One Slot Per Domain**: a publish replaces the previous snapshot outright.
//!     There is no queue, so a poller is never held up by a slow reader and the
//!     reader never sees a backlog.
//! 2.  **Whole-Value Swaps**: each slot is a `tokio::sync::watch` channel holding an
//!     `Option<Snapshot<T>>`. The payload sits behind an `Arc`, so a swap moves a
//!     pointer and a reader clones a pointer; a reader observes either the old or the
//!     new snapshot, never a half-written one.
//! 3.  **Staleness At Read Time**: a snapshot only records when it was captured.
//!     Whether it is stale is decided by the consumer against its own clock, so a
//!     poller that silently stops publishing is still detected.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::models::{MarketSnapshot, Payload, SportsSnapshot, WeatherSnapshot};

/// The independently polled data domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Stock quotes.
    Market,
    /// Weather alerts.
    Weather,
    /// Game scores.
    Sports,
}

impl Domain {
    /// Every domain, in status-report order.
    pub const ALL: [Domain; 3] = [Domain::Market, Domain::Weather, Domain::Sports];

    /// Lower-case domain name.
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Market => "market",
            Domain::Weather => "weather",
            Domain::Sports => "sports",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `captured_at` is more than `threshold` older than `now`.
///
/// Kept free of any I/O so the same rule drives the render loop's freshness cue
/// and the status surface.
pub fn is_stale(now: Instant, captured_at: Instant, threshold: Duration) -> bool {
    now.saturating_duration_since(captured_at) > threshold
}

/// # Snapshot
///
/// The latest payload of one domain together with when it arrived.
#[derive(Debug)]
pub struct Snapshot<T> {
    /// Owning domain.
    pub domain: Domain,
    /// Shared, immutable payload.
    pub payload: Arc<T>,
    /// Monotonic capture time, used for staleness.
    pub captured_at: Instant,
    /// Wall-clock capture time, used for reporting.
    pub captured_wall: DateTime<Utc>,
    /// Publication sequence number within the domain, starting at 1.
    pub seq: u64,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            domain: self.domain,
            payload: Arc::clone(&self.payload),
            captured_at: self.captured_at,
            captured_wall: self.captured_wall,
            seq: self.seq,
        }
    }
}

impl<T> Snapshot<T> {
    /// Age of the snapshot at `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.captured_at)
    }

    /// Staleness against a per-domain threshold.
    pub fn is_stale(&self, now: Instant, threshold: Duration) -> bool {
        is_stale(now, self.captured_at, threshold)
    }
}

/// # Snapshot Slot
///
/// Single-writer, many-reader slot for one domain.
pub struct SnapshotSlot<T> {
    domain: Domain,
    tx: watch::Sender<Option<Snapshot<T>>>,
    seq: AtomicU64,
}

impl<T: Send + Sync + 'static> SnapshotSlot<T> {
    /// Creates an empty slot.
    pub fn new(domain: Domain) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { domain, tx, seq: AtomicU64::new(0) }
    }

    /// Replaces the slot's snapshot, stamping it with the current time.
    pub fn publish(&self, payload: T) -> u64 {
        self.publish_at(payload, Instant::now(), Utc::now())
    }

    /// Replaces the slot's snapshot with explicit capture times.
    pub fn publish_at(&self, payload: T, captured_at: Instant, captured_wall: DateTime<Utc>) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        self.tx.send_replace(Some(Snapshot {
            domain: self.domain,
            payload: Arc::new(payload),
            captured_at,
            captured_wall,
            seq,
        }));
        seq
    }

    /// The most recent snapshot, or `None` before the first publish. Never waits.
    pub fn latest(&self) -> Option<Snapshot<T>> {
        self.tx.borrow().clone()
    }

    /// A receiver that is notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot<T>>> {
        self.tx.subscribe()
    }
}

/// Everything the render loop reads from the bus in one tick.
#[derive(Debug, Clone, Default)]
pub struct BusSample {
    /// Latest market snapshot.
    pub market: Option<Snapshot<MarketSnapshot>>,
    /// Latest weather snapshot.
    pub weather: Option<Snapshot<WeatherSnapshot>>,
    /// Latest sports snapshot.
    pub sports: Option<Snapshot<SportsSnapshot>>,
}

/// # Snapshot Bus
///
/// One slot per domain. Shared between pollers and the render loop as `Arc<SnapshotBus>`.
pub struct SnapshotBus {
    /// Market slot.
    pub market: SnapshotSlot<MarketSnapshot>,
    /// Weather slot.
    pub weather: SnapshotSlot<WeatherSnapshot>,
    /// Sports slot.
    pub sports: SnapshotSlot<SportsSnapshot>,
}

impl Default for SnapshotBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBus {
    /// Creates a bus with every slot empty.
    pub fn new() -> Self {
        Self {
            market: SnapshotSlot::new(Domain::Market),
            weather: SnapshotSlot::new(Domain::Weather),
            sports: SnapshotSlot::new(Domain::Sports),
        }
    }

    /// Routes a payload to its domain's slot. Returns the new sequence number.
    pub fn publish(&self, payload: Payload) -> u64 {
        match payload {
            Payload::Market(m) => self.market.publish(m),
            Payload::Weather(w) => self.weather.publish(w),
            Payload::Sports(s) => self.sports.publish(s),
        }
    }

    /// Reads every slot once.
    pub fn sample(&self) -> BusSample {
        BusSample {
            market: self.market.latest(),
            weather: self.weather.latest(),
            sports: self.sports.latest(),
        }
    }

    /// Capture time of a domain's latest snapshot.
    pub fn captured_at(&self, domain: Domain) -> Option<Instant> {
        match domain {
            Domain::Market => self.market.latest().map(|s| s.captured_at),
            Domain::Weather => self.weather.latest().map(|s| s.captured_at),
            Domain::Sports => self.sports.latest().map(|s| s.captured_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::market_one;

    #[test]
    fn latest_is_absent_before_first_publish() {
        let bus = SnapshotBus::new();
        assert!(bus.market.latest().is_none());
        assert!(bus.sample().sports.is_none());
    }

    #[test]
    fn publish_overwrites_instead_of_queueing() {
        let bus = SnapshotBus::new();
        bus.publish(Payload::Market(market_one("AAPL", 150.0, 1.2)));
        bus.publish(Payload::Market(market_one("AAPL", 151.0, 1.9)));
        let snap = bus.market.latest().unwrap();
        assert_eq!(snap.seq, 2);
        assert_eq!(snap.payload.quotes[0].price, Some(151.0));
    }

    #[test]
    fn republishing_same_payload_only_moves_timestamp() {
        let slot = SnapshotSlot::new(Domain::Market);
        let t0 = Instant::now();
        slot.publish_at(market_one("AAPL", 150.0, 1.2), t0, Utc::now());
        let first = slot.latest().unwrap();
        let t1 = t0 + Duration::from_secs(30);
        slot.publish_at(market_one("AAPL", 150.0, 1.2), t1, Utc::now());
        let second = slot.latest().unwrap();
        assert_eq!(first.payload, second.payload);
        assert_eq!(second.captured_at, t1);
        assert_eq!(second.seq, first.seq + 1);
    }

    #[test]
    fn staleness_is_relative_to_reader_clock() {
        let t0 = Instant::now();
        let threshold = Duration::from_secs(180);
        assert!(!is_stale(t0 + Duration::from_secs(180), t0, threshold));
        assert!(is_stale(t0 + Duration::from_secs(181), t0, threshold));
        // A reader clock behind the capture time is never stale.
        assert!(!is_stale(t0, t0 + Duration::from_secs(5), threshold));
    }

    #[tokio::test]
    async fn subscribers_see_every_publish() {
        let bus = Arc::new(SnapshotBus::new());
        let mut rx = bus.weather.subscribe();
        let writer = Arc::clone(&bus);
        tokio::spawn(async move {
            writer.publish(Payload::Weather(WeatherSnapshot::default()));
        });
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|s| s.seq), Some(1));
    }
}

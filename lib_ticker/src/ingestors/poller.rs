//! # Self-Scheduling Poll Worker
//!
//! Drives one [`Poller`] forever: fetch, publish, sleep, repeat.
//!
//! ## Key Design Principles:
//! - **Self-Scheduling**: the worker computes its own next delay after every
//!   attempt. A success waits the domain interval (the sports poller switches to
//!   its live cadence while a game is in progress); a failure waits the jittered
//!   exponential backoff.
//! - **Bounded Attempts**: each fetch runs under `tokio::time::timeout`. An attempt
//!   that hangs is abandoned and counted as a failure, so it can never push back
//!   the next scheduled attempt indefinitely.
//! - **Isolated Failure Domain**: every error is caught here, logged and recorded in
//!   the health board. Nothing propagates to the render loop; it only ever sees the
//!   last good snapshot growing older.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use chrono::Utc;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::FetchError;
use crate::configs::{ConfigStore, DisplayConfig};
use crate::core::health::HealthBoard;
use crate::core::snapshot::{Domain, SnapshotBus};
use crate::models::Payload;

/// A data source for one domain.
pub trait Poller: Send + Sync {
    /// Domain this poller publishes to.
    fn domain(&self) -> Domain;

    /// Name used in log lines.
    fn name(&self) -> String {
        format!("{}-poller", self.domain())
    }

    /// One fetch attempt. Must be cancel-safe: the worker drops it on timeout.
    fn fetch(&self) -> BoxFuture<'_, Result<Payload, FetchError>>;

    /// Delay before the next attempt after a successful fetch of `last`.
    fn interval(&self, cfg: &DisplayConfig, last: &Payload) -> Duration {
        cfg.poll_interval(self.domain(), last.has_live_game())
    }
}

/// What a successful attempt produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Sequence number of the published snapshot.
    pub seq: u64,
    /// Delay until the next attempt.
    pub next_delay: Duration,
}

/// # Poll Worker
///
/// Binds a poller to the bus, the health board and the live configuration.
pub struct PollWorker {
    poller: Arc<dyn Poller>,
    bus: Arc<SnapshotBus>,
    health: Arc<HealthBoard>,
    config: Arc<ConfigStore>,
}

impl PollWorker {
    /// Creates a worker.
    pub fn new(
        poller: Arc<dyn Poller>,
        bus: Arc<SnapshotBus>,
        health: Arc<HealthBoard>,
        config: Arc<ConfigStore>,
    ) -> Self {
        Self { poller, bus, health, config }
    }

    /// Domain of the wrapped poller.
    pub fn domain(&self) -> Domain {
        self.poller.domain()
    }

    /// Poller name.
    pub fn name(&self) -> String {
        self.poller.name()
    }

    /// # Single Attempt
    ///
    /// Fetches under the domain timeout, validates, publishes and records health.
    pub async fn poll_once(&self) -> Result<PollOutcome, FetchError> {
        let cfg = self.config.current();
        let domain = self.poller.domain();
        let timeout = cfg.fetch_timeout(domain);

        // --- Phase 1: Bounded Fetch ---
        let started = Instant::now();
        let fetched = match tokio::time::timeout(timeout, self.poller.fetch()).await {
            Ok(result) => result.and_then(Payload::checked),
            Err(_) => Err(FetchError::Timeout(timeout)),
        };
        let fetched = fetched.and_then(|payload| {
            if payload.domain() == domain {
                Ok(payload)
            } else {
                Err(FetchError::Malformed(format!("{} payload from the {} poller", payload.domain(), domain)))
            }
        });

        // --- Phase 2: Publish Or Record Failure ---
        let health = self.health.domain(domain);
        match fetched {
            Ok(payload) => {
                let next_delay = self.poller.interval(&cfg, &payload);
                let seq = self.bus.publish(payload);
                health.record_success(Utc::now(), started.elapsed());
                log::debug!("[{}] published snapshot #{} in {:?}", self.poller.name(), seq, started.elapsed());
                Ok(PollOutcome { seq, next_delay })
            }
            Err(e) => {
                let failures = health.record_failure(Utc::now(), &e.to_string());
                log::warn!("[{}] fetch failed ({} in a row): {}", self.poller.name(), failures, e);
                Err(e)
            }
        }
    }

    /// # Main Execution Loop
    ///
    /// Runs until `cancel` fires. Never returns early on fetch errors.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let name = self.poller.name();
        let domain = self.poller.domain();
        log::info!("[{}] poller started", name);

        loop {
            let attempt = tokio::select! {
                _ = cancel.cancelled() => break,
                r = self.poll_once() => r,
            };

            let delay = match attempt {
                Ok(outcome) => outcome.next_delay,
                Err(_) => {
                    let failures = self.health.domain(domain).consecutive_failures();
                    self.config.current().backoff().jittered(failures)
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        log::info!("[{}] poller stopped", name);
    }
}

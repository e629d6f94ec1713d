//! # Worker Supervisor
//!
//! Owns the lifecycle of the poll workers.
//!
//! ## Core Design Principles:
//!
//! 1.  **One Task Per Domain**: each [`PollWorker`] runs in its own spawned task,
//!     watched by a small guard task. A panic or an unexpected return is contained
//!     in that task and seen by the guard as a `JoinError` or a plain exit.
//! 2.  **Restart With Cooldown**: the guard restarts the worker after the
//!     [`RestartPolicy`] cooldown, which doubles on rapid restarts and resets once
//!     a worker has stayed up for a while. Every restart is counted in the domain
//!     health.
//! 3.  **Cooperative Shutdown**: one `CancellationToken` stops every guard and
//!     worker; [`WorkerSupervisor::shutdown`] cancels and waits for them.

use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::backoff::RestartPolicy;
use super::health::HealthBoard;
use super::snapshot::SnapshotBus;
use crate::configs::ConfigStore;
use crate::ingestors::{PollWorker, Poller};

/// # Worker Supervisor
pub struct WorkerSupervisor {
    bus: Arc<SnapshotBus>,
    health: Arc<HealthBoard>,
    config: Arc<ConfigStore>,
    cancel: CancellationToken,
    guards: Vec<(String, JoinHandle<()>)>,
}

impl WorkerSupervisor {
    /// Supervisor publishing into `bus`. Cancelling `cancel` stops everything.
    pub fn new(
        bus: Arc<SnapshotBus>,
        health: Arc<HealthBoard>,
        config: Arc<ConfigStore>,
        cancel: CancellationToken,
    ) -> Self {
        Self { bus, health, config, cancel, guards: Vec::new() }
    }

    /// Starts supervising `poller`.
    pub fn spawn(&mut self, poller: Arc<dyn Poller>) {
        let worker = Arc::new(PollWorker::new(
            poller,
            Arc::clone(&self.bus),
            Arc::clone(&self.health),
            Arc::clone(&self.config),
        ));
        let name = worker.name();
        let guard = tokio::spawn(guard(worker, Arc::clone(&self.health), Arc::clone(&self.config), self.cancel.clone()));
        self.guards.push((name, guard));
    }

    /// Number of supervised workers.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// True when nothing is supervised.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// The token that stops all workers.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels every worker and waits for the guards to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (name, handle) in self.guards {
            if let Err(e) = handle.await {
                log::error!("[{}] supervisor guard ended abnormally: {}", name, e);
            }
        }
        log::info!("All pollers stopped");
    }
}

/// Runs `worker` until cancelled, restarting it whenever its task ends.
async fn guard(worker: Arc<PollWorker>, health: Arc<HealthBoard>, config: Arc<ConfigStore>, cancel: CancellationToken) {
    let name = worker.name();
    let domain = worker.domain();
    let mut policy = RestartPolicy::new(config.current().restart_cooldown());

    loop {
        let started = Instant::now();
        let task = tokio::spawn(Arc::clone(&worker).run(cancel.child_token()));
        let outcome = task.await;
        if cancel.is_cancelled() {
            break;
        }

        match outcome {
            Ok(()) => log::warn!("[{}] poller exited unexpectedly", name),
            Err(e) if e.is_panic() => log::error!("[{}] poller panicked", name),
            Err(e) => log::warn!("[{}] poller task failed: {}", name, e),
        }
        let restarts = health.domain(domain).record_restart();
        let cooldown = policy.next_cooldown(started.elapsed());
        log::warn!("[{}] restarting in {:?} (restart #{})", name, cooldown, restarts);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(cooldown) => {}
        }
    }
}

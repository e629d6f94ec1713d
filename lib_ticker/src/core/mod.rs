//! # Core Runtime Module
//!
//! This module holds the moving parts of the display runtime: the data plane
//! between the pollers and the render loop, the supervision of the pollers, and
//! the render loop itself.
//!
//! ## Core Components:
//!
//! - **`snapshot`**: the Snapshot Bus. One single-slot, overwrite-only cell per
//!   data domain. Pollers publish into it; the render loop samples it once per
//!   tick without ever waiting on a poller's I/O.
//!
//! - **`health`**: lock-free per-domain counters (last success, consecutive
//!   failures, restarts). The status string is derived when it is read.
//!
//! - **`backoff`**: retry delays for failed fetches and restart cooldowns for
//!   crashed pollers.
//!
//! - **`supervisor`**: spawns each poller in its own task and restarts it when
//!   that task ends unexpectedly.
//!
//! - **`runtime`**: the frame-clocked render loop and the operator control channel.
//!
//! - **`status`**: the point-in-time report written for external tooling.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Retry and restart delays.
pub mod backoff;
/// Per-domain poller health.
pub mod health;
/// The render loop and its control channel.
pub mod runtime;
/// Single-slot snapshot cells per domain.
pub mod snapshot;
/// Status report for external tooling.
pub mod status;
/// Poller task supervision.
pub mod supervisor;

// --- Public API Re-exports ---
pub use backoff::{Backoff, RestartPolicy};
pub use health::{DomainHealth, HealthBoard, HealthReport, HealthStatus};
pub use runtime::{ControlHandle, DisplayRuntime};
pub use snapshot::{BusSample, Domain, Snapshot, SnapshotBus, SnapshotSlot};
pub use status::{write_status_file, RenderStatus, StatusBoard, StatusError, StatusReport};
pub use supervisor::WorkerSupervisor;

//! # Data Ingestors Module
//!
//! Pollers that feed the snapshot bus. Every source, whatever its transport,
//! implements the [`Poller`] trait and is driven by the same [`PollWorker`] loop,
//! which owns timeouts, retries and health accounting.
//!
//! ## Contained Modules:
//! - **`poller`**: the `Poller` trait and the self-scheduling worker loop.
//! - **`file_feed`**: reads a JSON/JSON5 document from disk on every poll.
//! - **`demo_feed`**: synthetic payloads for running without network access.
//! - **`http_feed`**: GETs a JSON endpoint (feature `retrieve`).

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::time::Duration;
use thiserror::Error;

/// The `Poller` trait and its worker loop.
pub mod poller;
/// File-backed feed.
pub mod file_feed;
/// Synthetic feed.
pub mod demo_feed;
/// HTTP JSON feed.
#[cfg(feature = "retrieve")]
pub mod http_feed;

pub use demo_feed::DemoFeed;
pub use file_feed::FileFeed;
#[cfg(feature = "retrieve")]
pub use http_feed::HttpFeed;
pub use poller::{PollOutcome, PollWorker, Poller};

/// Why a single fetch attempt failed. Every variant is retried with backoff.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or client-side failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The attempt exceeded its timeout and was abandoned.
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The upstream answered but the payload is unusable.
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Non-success HTTP status.
    #[error("Upstream returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Local I/O failure (file feeds).
    #[error("I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}

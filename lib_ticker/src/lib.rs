//! # lib_ticker
//!
//! Runtime engine for an always-on LED matrix information display. Pollers
//! publish market, weather and sports snapshots into a single-slot bus; a
//! frame-clocked render loop samples the bus, arbitrates one display mode per
//! tick, composes a pixel frame and hands it to an output sink.

// Declare the modules to re-export
pub mod configs;
pub mod core;
pub mod engine;
pub mod ingestors;
pub mod markets;
pub mod models;
pub mod output;
pub mod render;

#[cfg(feature = "loggers")]
pub mod loggers;
#[cfg(feature = "retrieve")]
pub mod retrieve;

// Re-export the entry points the binaries use
pub use configs::{ConfigError, ConfigStore, DisplayConfig};
pub use self::core::{ControlHandle, DisplayRuntime, HealthBoard, SnapshotBus, StatusBoard, WorkerSupervisor};
pub use engine::{ControlCommand, ControlError};
pub use ingestors::{FetchError, Poller};
pub use models::Payload;
pub use output::{FrameSink, SinkError};

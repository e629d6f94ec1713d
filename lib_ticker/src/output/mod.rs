//! # Output
//!
//! Frame pacing and the sinks that receive finished frames.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Frame pacing and render statistics.
pub mod clock;
/// Frame sinks.
pub mod sink;

pub use clock::{effective_fps, FramePacer, FrameStats};
pub use sink::{encode_ppm, FanoutSink, FrameSink, MemorySink, MemorySinkHandle, PpmSink, SinkError};

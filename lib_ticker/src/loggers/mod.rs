//! # Logging Helpers
//!
//! Pieces the binaries use when they install their `fern` dispatcher. The
//! library itself only ever logs through the `log` facade.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Terminal colouring and level parsing.
pub mod console;
/// Timestamped log files and their rotation.
pub mod rotation;

pub use console::{colored_level, parse_level_filter};
pub use rotation::{log_file_name, rotate_logs};

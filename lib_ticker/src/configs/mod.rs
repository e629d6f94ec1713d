//! # Configuration Modules
//!
//! The display document and the store that swaps it atomically on reload.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The display document, its validation and the reloadable store.
pub mod config_display;

pub use config_display::{
    parse_hhmm, ConfigError, ConfigStatus, ConfigStore, DisplayConfig, PanelLayout, PrerollStyle, ReloadOutcome,
};

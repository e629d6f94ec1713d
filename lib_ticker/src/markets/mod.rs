//! # Financial Market Helpers
//!
//! Exchange-calendar logic shared by the preroll scheduler, the demo feed and
//! the ticker's session indicator.
//!
//! ## Contained Modules:
//!
//! - **`session`**: New York session boundaries and the open/close announcement
//!   windows.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// New York session clock.
pub mod session;

pub use session::{market_event_at, session_at, MarketEvent};

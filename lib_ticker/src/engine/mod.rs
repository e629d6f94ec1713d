//! # Display Engine
//!
//! Everything that decides *what* is on the panel, as opposed to how it is drawn.
//!
//! ## Core Components:
//!
//! - **`arbiter`**: the priority state machine producing one `DisplayDecision` per tick.
//! - **`overrides`**: control command grammar and the single active override.
//! - **`alerts`**: score-change detection, test alerts and the bounded alert queue.
//! - **`banners`**: pinned weather headlines and the market-open banner.
//! - **`preroll`**: top-of-hour and market-bell interstitials.
//! - **`dimmer`**: brightness from the local time and the schedule.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Score events and their queue.
pub mod alerts;
/// Mode arbitration.
pub mod arbiter;
/// Ticker banner timing.
pub mod banners;
/// Brightness schedule.
pub mod dimmer;
/// Operator overrides.
pub mod overrides;
/// Scheduled interstitials.
pub mod preroll;

pub use alerts::{AlertQueue, AlertTimeline, ScoreDetector, ScoreEvent, ScoreFlash, Side, TestAlertGenerator};
pub use arbiter::{Arbiter, DisplayDecision, DisplayMode, ModeKey, ModeKind, TickInput};
pub use banners::{MarketOpenArm, WeatherPin};
pub use dimmer::{brightness_at, time_in_range, Brightness, BrightnessSource};
pub use overrides::{ControlCommand, ControlError, OverrideMode, OverrideRequest};
pub use preroll::{PrerollScheduler, PrerollSpec, PrerollTrigger};

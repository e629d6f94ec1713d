//! # Display Configuration
//!
//! The hot-reloadable document that drives the engine: panel geometry, scroll
//! speeds, tracked symbols and teams, alert and preroll settings, the brightness
//! schedule and supervisor timings.
//!
//! ## Core Design Principles:
//!
//! 1.  **Immutable Snapshots**: a parsed, validated [`DisplayConfig`] is never
//!     mutated. The [`ConfigStore`] hands out `Arc<DisplayConfig>` and a reload swaps
//!     the `Arc`; a tick that already holds the old one finishes with it.
//! 2.  **Last Known Good**: a reload that fails to parse or validate leaves the
//!     current snapshot in place. The rejection is logged and kept for the status
//!     surface.
//! 3.  **Defaults Everywhere**: every section and field carries a default, so a
//!     partial document (or an empty one) is a valid configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};
use thiserror::Error;

use crate::core::backoff::Backoff;
use crate::core::snapshot::Domain;
use crate::models::{League, TrackedTeams};

/// Upper bound on the configured frame rate.
pub const MAX_FPS: u32 = 240;

/// Maximum number of dim windows in the brightness schedule.
pub const MAX_DIM_WINDOWS: usize = 3;

/// Errors raised while loading or validating the display document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be read.
    #[error("I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON5 or does not match the schema.
    #[error("Failed to parse display config: {0}")]
    Parse(String),

    /// A value is out of its allowed range.
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.to_string(), reason: reason.into() }
}

/// Parses `HH:MM` (24h).
pub fn parse_hhmm(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").ok()
}

/// Row arrangement of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PanelLayout {
    /// Dual when the panel is at least 16 pixels tall.
    #[default]
    Auto,
    /// Two independent rows.
    Dual,
    /// One row.
    Single,
}

/// Preroll presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PrerollStyle {
    /// Large centered time.
    #[default]
    #[serde(rename = "BIGTIME")]
    BigTime,
    /// Scrolling time.
    #[serde(rename = "MARQUEE")]
    Marquee,
    /// Scrolling time plus a market announcement.
    #[serde(rename = "MARKET_ANNOUNCE")]
    MarketAnnounce,
}

/// Panel geometry and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelConfig {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row arrangement.
    pub layout: PanelLayout,
    /// Height of one text row in dual layout.
    pub row_height: u32,
    /// IANA time zone used for every local-time decision.
    pub timezone: String,
    /// Frame rate cap.
    pub fps: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: 192,
            height: 16,
            layout: PanelLayout::Auto,
            row_height: 8,
            timezone: "America/Toronto".to_string(),
            fps: 60,
        }
    }
}

impl PanelConfig {
    /// True when two rows fit and the layout allows them.
    pub fn is_dual(&self) -> bool {
        match self.layout {
            PanelLayout::Single => false,
            PanelLayout::Auto | PanelLayout::Dual => self.height >= 16,
        }
    }
}

/// Scroll speeds in pixels per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrollConfig {
    /// Top ticker row.
    pub top_pps: f64,
    /// Bottom ticker row.
    pub bottom_pps: f64,
    /// Single-row ticker.
    pub single_pps: f64,
    /// Marquee prerolls.
    pub preroll_pps: f64,
    /// Maintenance banner.
    pub maintenance_pps: f64,
    /// Operator message.
    pub message_pps: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            top_pps: 40.0,
            bottom_pps: 40.0,
            single_pps: 40.0,
            preroll_pps: 40.0,
            maintenance_pps: 30.0,
            message_pps: 40.0,
        }
    }
}

/// Market watch list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketConfig {
    /// Symbols on the top row.
    pub top: Vec<String>,
    /// Symbols on the bottom row.
    pub bottom: Vec<String>,
    /// Display labels, e.g. `^GSPC` shown as `S&P`.
    pub labels: BTreeMap<String, String>,
    /// Shares held per symbol.
    pub holdings: BTreeMap<String, f64>,
    /// Show the market value of held symbols instead of their price.
    pub holdings_enabled: bool,
    /// Ticker passes that carry the market-open banner, once per trading day; 0 never.
    pub open_banner_passes: u32,
    /// Poll interval.
    pub refresh_seconds: u64,
    /// Staleness threshold.
    pub stale_seconds: u64,
    /// Per-attempt fetch timeout.
    pub fetch_timeout_seconds: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        let labels = [("^IXIC", "NAS"), ("^GSPC", "S&P"), ("^GSPTSE", "TSX"), ("CADUSD=X", "CAD/USD"), ("GC=F", "GOLD")]
            .into_iter()
            .map(|(s, l)| (s.to_string(), l.to_string()))
            .collect();
        Self {
            top: ["^IXIC", "^GSPC", "^GSPTSE", "CADUSD=X", "GC=F"].map(String::from).to_vec(),
            bottom: ["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA", "META", "TSM"].map(String::from).to_vec(),
            labels,
            holdings: BTreeMap::new(),
            holdings_enabled: false,
            open_banner_passes: 5,
            refresh_seconds: 120,
            stale_seconds: 180,
            fetch_timeout_seconds: 10,
        }
    }
}

impl MarketConfig {
    /// Label for `symbol`, falling back to the symbol itself.
    pub fn label<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.labels.get(symbol).map(String::as_str).unwrap_or(symbol)
    }

    /// Shares held in `symbol` (case-insensitive) when holdings are shown and positive.
    pub fn held_shares(&self, symbol: &str) -> Option<f64> {
        if !self.holdings_enabled {
            return None;
        }
        self.holdings
            .iter()
            .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
            .map(|(_, shares)| *shares)
            .filter(|shares| *shares > 0.0)
    }

    /// Every configured symbol, top row first, without duplicates.
    pub fn all_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for s in self.top.iter().chain(self.bottom.iter()) {
            if !out.iter().any(|o| o.eq_ignore_ascii_case(s)) {
                out.push(s.clone());
            }
        }
        out
    }
}

/// Weather alert settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherConfig {
    /// Poll weather at all.
    pub enabled: bool,
    /// Poll interval.
    pub refresh_seconds: u64,
    /// Staleness threshold.
    pub stale_seconds: u64,
    /// Per-attempt fetch timeout.
    pub fetch_timeout_seconds: u64,
    /// Surface watches, advisories and statements when no warning is active.
    pub include_watch: bool,
    /// Inject a warning headline every N ticker passes.
    pub warning_every_n_scrolls: u64,
    /// Inject a lower-tier headline every N ticker passes.
    pub advisory_every_n_scrolls: u64,
    /// Keep a new headline in every pass for this long; 0 leaves it to the pass cadence.
    pub sticky_seconds: u64,
    /// Pin a still-active headline again after this long.
    pub repeat_seconds: u64,
    /// Colour of warnings.
    pub warning_color: String,
    /// Colour of lower tiers.
    pub advisory_color: String,
    /// Headlines longer than this are truncated with `...`.
    pub max_title_chars: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_seconds: 300,
            stale_seconds: 900,
            fetch_timeout_seconds: 5,
            include_watch: true,
            warning_every_n_scrolls: 5,
            advisory_every_n_scrolls: 10,
            sticky_seconds: 12,
            repeat_seconds: 600,
            warning_color: "red".to_string(),
            advisory_color: "yellow".to_string(),
            max_title_chars: 80,
        }
    }
}

/// Sports tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SportsConfig {
    /// Poll sports at all.
    pub enabled: bool,
    /// Leagues to follow.
    pub leagues: Vec<League>,
    /// Hockey teams.
    pub nhl_teams: Vec<String>,
    /// Football teams.
    pub nfl_teams: Vec<String>,
    /// Poll interval when no game is live.
    pub pre_cadence_seconds: u64,
    /// Poll interval while a game is live.
    pub live_cadence_seconds: u64,
    /// Staleness threshold.
    pub stale_seconds: u64,
    /// Per-attempt fetch timeout.
    pub fetch_timeout_seconds: u64,
}

impl Default for SportsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            leagues: vec![League::Nhl, League::Nfl],
            nhl_teams: vec!["MTL".to_string()],
            nfl_teams: vec!["NE".to_string()],
            pre_cadence_seconds: 60,
            live_cadence_seconds: 45,
            stale_seconds: 300,
            fetch_timeout_seconds: 6,
        }
    }
}

/// Score alert banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreAlertConfig {
    /// Master switch.
    pub enabled: bool,
    /// Alert on hockey goals.
    pub nhl: bool,
    /// Alert on football scores.
    pub nfl: bool,
    /// Only tracked teams trigger alerts.
    pub my_teams_only: bool,
    /// Full colour cycles per alert.
    pub cycles: u32,
    /// Duration of one colour step.
    pub flash_ms: u64,
    /// Colour sequence.
    pub flash_colors: Vec<String>,
    /// Pending alert bound.
    pub queue_max: usize,
    /// Smallest football score increase that alerts.
    pub nfl_delta_min: u32,
    /// Pending alerts older than this are dropped unshown.
    pub expiry_seconds: u64,
    /// Colour cycles of the scoring side's flash on the scoreboard; 0 disables it.
    pub scoreboard_flash_cycles: u32,
    /// Synthetic alerts for bench testing.
    pub test: TestAlertConfig,
}

impl Default for ScoreAlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nhl: true,
            nfl: true,
            my_teams_only: true,
            cycles: 2,
            flash_ms: 250,
            flash_colors: ["red", "white", "blue"].map(String::from).to_vec(),
            queue_max: 4,
            nfl_delta_min: 6,
            expiry_seconds: 120,
            scoreboard_flash_cycles: 4,
            test: TestAlertConfig::default(),
        }
    }
}

impl ScoreAlertConfig {
    /// Total on-screen time of one alert.
    pub fn display_duration(&self) -> Duration {
        self.cycle_duration(self.cycles.max(1))
    }

    /// Time taken by `cycles` passes through the flash colours.
    pub fn cycle_duration(&self, cycles: u32) -> Duration {
        let colors = self.flash_colors.len().max(1) as u64;
        Duration::from_millis(u64::from(cycles) * colors * self.flash_ms.max(1))
    }
}

/// Periodic synthetic score alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestAlertConfig {
    /// Generate test alerts.
    pub enabled: bool,
    /// League of the synthetic event.
    pub league: League,
    /// Team of the synthetic event.
    pub team: String,
    /// Seconds between two test alerts.
    pub interval_seconds: u64,
}

impl Default for TestAlertConfig {
    fn default() -> Self {
        Self { enabled: false, league: League::Nhl, team: "MTL".to_string(), interval_seconds: 12 }
    }
}

/// Scheduled interstitials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrerollConfig {
    /// Master switch.
    pub enabled: bool,
    /// How long each preroll stays up.
    pub duration_seconds: u64,
    /// Presentation.
    pub style: PrerollStyle,
    /// Time colour.
    pub color: String,
    /// Fire at every top of hour.
    pub top_of_hour: bool,
    /// Fire at market open and close.
    pub market_events: bool,
}

impl Default for PrerollConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_seconds: 15,
            style: PrerollStyle::BigTime,
            color: "yellow".to_string(),
            top_of_hour: true,
            market_events: true,
        }
    }
}

/// Nightly dimming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NightConfig {
    /// Enable night mode.
    pub enabled: bool,
    /// Start, `HH:MM`.
    pub start: String,
    /// End (exclusive), `HH:MM`.
    pub end: String,
    /// Brightness percent.
    pub dim_pct: u32,
    /// Scroll speed percent.
    pub speed_pct: u32,
}

impl Default for NightConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start: "22:00".to_string(),
            end: "07:00".to_string(),
            dim_pct: 30,
            speed_pct: 50,
        }
    }
}

/// A fixed-percent brightness window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimWindow {
    /// Start, `HH:MM`.
    pub start: String,
    /// End (exclusive), `HH:MM`.
    pub end: String,
    /// Brightness percent.
    pub pct: u32,
}

/// Blank-the-panel window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OffWindow {
    /// Enable the off window.
    pub enabled: bool,
    /// Start, `HH:MM`.
    pub start: String,
    /// End (exclusive), `HH:MM`.
    pub end: String,
}

impl Default for OffWindow {
    fn default() -> Self {
        Self { enabled: false, start: "01:00".to_string(), end: "06:00".to_string() }
    }
}

/// Brightness schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrightnessConfig {
    /// Lower bound of the scale.
    pub min: f64,
    /// Upper bound of the scale.
    pub max: f64,
    /// Percent used outside every window.
    pub base_pct: u32,
    /// Night window.
    pub night: NightConfig,
    /// Up to three fixed windows.
    pub windows: Vec<DimWindow>,
    /// Off window.
    pub off: OffWindow,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            min: 0.01,
            max: 1.0,
            base_pct: 100,
            night: NightConfig::default(),
            windows: Vec::new(),
            off: OffWindow::default(),
        }
    }
}

/// Clock face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClockConfig {
    /// 24-hour format.
    pub h24: bool,
    /// Show seconds.
    pub show_seconds: bool,
    /// Blink the colon on odd seconds.
    pub blink_colon: bool,
    /// Time colour.
    pub color: String,
    /// Show a date line under the time.
    pub show_date: bool,
    /// `strftime` pattern of the date line.
    pub date_format: String,
    /// Date colour.
    pub date_color: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            h24: true,
            show_seconds: false,
            blink_colon: true,
            color: "yellow".to_string(),
            show_date: true,
            date_format: "%a %b %d".to_string(),
            date_color: "white".to_string(),
        }
    }
}

/// Maintenance banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaintenanceConfig {
    /// Banner text.
    pub text: String,
    /// Scroll it, or center it.
    pub scroll: bool,
    /// Colour.
    pub color: String,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            text: "SYSTEM MAINTENANCE  EXPECTED BACK SOON".to_string(),
            scroll: true,
            color: "red".to_string(),
        }
    }
}

/// Message injected into the ticker scroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageConfig {
    /// Text; empty disables the injection.
    pub text: String,
    /// Inject every N passes; 0 never.
    pub every_n_scrolls: u64,
    /// Colour.
    pub color: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self { text: String::new(), every_n_scrolls: 0, color: "magenta".to_string() }
    }
}

/// Poller supervision timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupervisorConfig {
    /// First retry delay.
    pub backoff_base_ms: u64,
    /// Retry delay ceiling.
    pub backoff_max_ms: u64,
    /// Initial restart cooldown.
    pub restart_cooldown_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self { backoff_base_ms: 1_000, backoff_max_ms: 300_000, restart_cooldown_ms: 5_000 }
    }
}

/// Operator override limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverrideConfig {
    /// Longest accepted override.
    pub max_duration_minutes: u64,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self { max_duration_minutes: 1_440 }
    }
}

/// # Display Config
///
/// The whole document. Build it with [`DisplayConfig::from_json5`] so it is
/// validated; `Default` is valid as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayConfig {
    /// Panel geometry.
    pub panel: PanelConfig,
    /// Scroll speeds.
    pub scroll: ScrollConfig,
    /// Market watch list.
    pub market: MarketConfig,
    /// Weather alerts.
    pub weather: WeatherConfig,
    /// Sports tracking.
    pub sports: SportsConfig,
    /// Score alerts.
    pub score_alerts: ScoreAlertConfig,
    /// Prerolls.
    pub preroll: PrerollConfig,
    /// Brightness schedule.
    pub brightness: BrightnessConfig,
    /// Clock face.
    pub clock: ClockConfig,
    /// Maintenance banner.
    pub maintenance: MaintenanceConfig,
    /// Ticker message injection.
    pub message: MessageConfig,
    /// Supervisor timings.
    pub supervisor: SupervisorConfig,
    /// Override limits.
    pub overrides: OverrideConfig,
}

impl DisplayConfig {
    /// Parses and validates a JSON5 (or JSON) document.
    pub fn from_json5(text: &str) -> Result<Self, ConfigError> {
        let cfg: DisplayConfig = json5::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks every range constraint. The first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.panel;
        if p.width == 0 || p.height == 0 {
            return Err(invalid("panel", format!("size {}x{} must be positive", p.width, p.height)));
        }
        if p.row_height == 0 || p.row_height > p.height {
            return Err(invalid("panel.rowHeight", format!("{} must be within 1..={}", p.row_height, p.height)));
        }
        if !(1..=MAX_FPS).contains(&p.fps) {
            return Err(invalid("panel.fps", format!("{} must be within 1..={}", p.fps, MAX_FPS)));
        }
        if p.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(invalid("panel.timezone", format!("unknown time zone {:?}", p.timezone)));
        }

        let s = &self.scroll;
        for (field, v) in [
            ("scroll.topPps", s.top_pps),
            ("scroll.bottomPps", s.bottom_pps),
            ("scroll.singlePps", s.single_pps),
            ("scroll.prerollPps", s.preroll_pps),
            ("scroll.maintenancePps", s.maintenance_pps),
            ("scroll.messagePps", s.message_pps),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(invalid(field, format!("{} must be a positive speed", v)));
            }
        }

        for (field, v) in [
            ("market.refreshSeconds", self.market.refresh_seconds),
            ("market.staleSeconds", self.market.stale_seconds),
            ("market.fetchTimeoutSeconds", self.market.fetch_timeout_seconds),
            ("weather.refreshSeconds", self.weather.refresh_seconds),
            ("weather.staleSeconds", self.weather.stale_seconds),
            ("weather.fetchTimeoutSeconds", self.weather.fetch_timeout_seconds),
            ("sports.preCadenceSeconds", self.sports.pre_cadence_seconds),
            ("sports.liveCadenceSeconds", self.sports.live_cadence_seconds),
            ("sports.staleSeconds", self.sports.stale_seconds),
            ("sports.fetchTimeoutSeconds", self.sports.fetch_timeout_seconds),
            ("preroll.durationSeconds", self.preroll.duration_seconds),
            ("scoreAlerts.flashMs", self.score_alerts.flash_ms),
            ("overrides.maxDurationMinutes", self.overrides.max_duration_minutes),
        ] {
            if v == 0 {
                return Err(invalid(field, "must be positive"));
            }
        }
        if let Some((sym, shares)) = self.market.holdings.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid("market.holdings", format!("{} has non-finite shares {}", sym, shares)));
        }

        if self.score_alerts.queue_max == 0 {
            return Err(invalid("scoreAlerts.queueMax", "must be at least 1"));
        }
        let test = &self.score_alerts.test;
        if test.enabled && test.interval_seconds == 0 {
            return Err(invalid("scoreAlerts.test.intervalSeconds", "must be positive when test alerts are on"));
        }
        if test.enabled && test.team.trim().is_empty() {
            return Err(invalid("scoreAlerts.test.team", "must not be empty when test alerts are on"));
        }
        let w = &self.weather;
        if w.sticky_seconds > 0 && w.repeat_seconds < w.sticky_seconds {
            return Err(invalid(
                "weather.repeatSeconds",
                format!("{} must not be below stickySeconds ({})", w.repeat_seconds, w.sticky_seconds),
            ));
        }

        let b = &self.brightness;
        if !(b.min.is_finite() && b.max.is_finite() && 0.0 <= b.min && b.min <= b.max && b.max <= 1.0) {
            return Err(invalid("brightness", format!("need 0 <= min ({}) <= max ({}) <= 1", b.min, b.max)));
        }
        check_pct("brightness.basePct", b.base_pct)?;
        check_pct("brightness.night.dimPct", b.night.dim_pct)?;
        check_pct("brightness.night.speedPct", b.night.speed_pct)?;
        check_hhmm("brightness.night.start", &b.night.start)?;
        check_hhmm("brightness.night.end", &b.night.end)?;
        check_hhmm("brightness.off.start", &b.off.start)?;
        check_hhmm("brightness.off.end", &b.off.end)?;
        if b.windows.len() > MAX_DIM_WINDOWS {
            return Err(invalid(
                "brightness.windows",
                format!("{} windows given, at most {} allowed", b.windows.len(), MAX_DIM_WINDOWS),
            ));
        }
        for (i, w) in b.windows.iter().enumerate() {
            check_hhmm(&format!("brightness.windows[{}].start", i), &w.start)?;
            check_hhmm(&format!("brightness.windows[{}].end", i), &w.end)?;
            check_pct(&format!("brightness.windows[{}].pct", i), w.pct)?;
        }

        let sup = &self.supervisor;
        if sup.backoff_base_ms == 0 || sup.backoff_base_ms > sup.backoff_max_ms {
            return Err(invalid(
                "supervisor.backoffBaseMs",
                format!("{} must be positive and not above backoffMaxMs ({})", sup.backoff_base_ms, sup.backoff_max_ms),
            ));
        }
        if sup.restart_cooldown_ms == 0 {
            return Err(invalid("supervisor.restartCooldownMs", "must be positive"));
        }
        Ok(())
    }

    /// Local time zone. Falls back to UTC only for an unvalidated document.
    pub fn tz(&self) -> chrono_tz::Tz {
        self.panel.timezone.parse().unwrap_or(chrono_tz::UTC)
    }

    /// Team lists of the followed leagues.
    pub fn tracked_teams(&self) -> TrackedTeams<'_> {
        TrackedTeams {
            leagues: &self.sports.leagues,
            nhl: &self.sports.nhl_teams,
            nfl: &self.sports.nfl_teams,
        }
    }

    /// Score alerts are on for `league`.
    pub fn alerts_enabled_for(&self, league: League) -> bool {
        let a = &self.score_alerts;
        a.enabled
            && self.sports.leagues.contains(&league)
            && match league {
                League::Nhl => a.nhl,
                League::Nfl => a.nfl,
                League::Other => false,
            }
    }

    /// Poll interval of `domain`; `live` selects the sports live cadence.
    pub fn poll_interval(&self, domain: Domain, live: bool) -> Duration {
        let secs = match domain {
            Domain::Market => self.market.refresh_seconds.max(5),
            Domain::Weather => self.weather.refresh_seconds.max(10),
            Domain::Sports if live => self.sports.live_cadence_seconds.max(3),
            Domain::Sports => self.sports.pre_cadence_seconds.max(3),
        };
        Duration::from_secs(secs)
    }

    /// Per-attempt fetch timeout of `domain`.
    pub fn fetch_timeout(&self, domain: Domain) -> Duration {
        Duration::from_secs(match domain {
            Domain::Market => self.market.fetch_timeout_seconds,
            Domain::Weather => self.weather.fetch_timeout_seconds,
            Domain::Sports => self.sports.fetch_timeout_seconds,
        })
    }

    /// Staleness threshold of `domain`.
    pub fn stale_threshold(&self, domain: Domain) -> Duration {
        Duration::from_secs(match domain {
            Domain::Market => self.market.stale_seconds,
            Domain::Weather => self.weather.stale_seconds,
            Domain::Sports => self.sports.stale_seconds,
        })
    }

    /// True when the poller of `domain` should run.
    pub fn domain_enabled(&self, domain: Domain) -> bool {
        match domain {
            Domain::Market => true,
            Domain::Weather => self.weather.enabled,
            Domain::Sports => self.sports.enabled,
        }
    }

    /// Fetch retry policy.
    pub fn backoff(&self) -> Backoff {
        Backoff::from_millis(self.supervisor.backoff_base_ms, self.supervisor.backoff_max_ms)
    }

    /// Initial restart cooldown.
    pub fn restart_cooldown(&self) -> Duration {
        Duration::from_millis(self.supervisor.restart_cooldown_ms)
    }
}

fn check_pct(field: &str, pct: u32) -> Result<(), ConfigError> {
    if (1..=100).contains(&pct) {
        Ok(())
    } else {
        Err(invalid(field, format!("{} must be within 1..=100", pct)))
    }
}

fn check_hhmm(field: &str, text: &str) -> Result<(), ConfigError> {
    parse_hhmm(text)
        .map(|_| ())
        .ok_or_else(|| invalid(field, format!("{:?} is not HH:MM", text)))
}

/// Result of a reload attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The file did not change since the last check.
    Unchanged,
    /// A new snapshot is live.
    Applied {
        /// Generation of the new snapshot.
        generation: u64,
    },
}

/// Reload bookkeeping exposed on the status surface.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStatus {
    /// Source file, if any.
    pub path: Option<PathBuf>,
    /// Incremented on every accepted snapshot; 1 for the initial one.
    pub generation: u64,
    /// When the current snapshot was installed.
    pub reloaded_at: Option<DateTime<Utc>>,
    /// Reason of the most recent rejected reload.
    pub last_rejection: Option<String>,
}

#[derive(Debug, Default)]
struct StoreMeta {
    status: ConfigStatus,
    last_mtime: Option<SystemTime>,
}

/// # Config Store
///
/// Holder of the current `Arc<DisplayConfig>`. Readers take a cheap `Arc` clone;
/// writers validate first and only then swap.
#[derive(Debug)]
pub struct ConfigStore {
    current: RwLock<Arc<DisplayConfig>>,
    path: Option<PathBuf>,
    meta: Mutex<StoreMeta>,
}

impl ConfigStore {
    /// Wraps an in-memory snapshot with no backing file.
    pub fn new(cfg: DisplayConfig) -> Self {
        Self::with_path(cfg, None, None)
    }

    fn with_path(cfg: DisplayConfig, path: Option<PathBuf>, mtime: Option<SystemTime>) -> Self {
        let meta = StoreMeta {
            status: ConfigStatus {
                path: path.clone(),
                generation: 1,
                reloaded_at: Some(Utc::now()),
                last_rejection: None,
            },
            last_mtime: mtime,
        };
        Self { current: RwLock::new(Arc::new(cfg)), path, meta: Mutex::new(meta) }
    }

    /// Loads and validates `path`. Startup fails if the first document is bad.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        let cfg = DisplayConfig::from_json5(&text)?;
        Ok(Self::with_path(cfg, Some(path.to_path_buf()), mtime))
    }

    /// Watches `path` for changes but starts from `cfg` (used when the file is missing).
    pub fn watching(cfg: DisplayConfig, path: &Path) -> Self {
        Self::with_path(cfg, Some(path.to_path_buf()), None)
    }

    /// The snapshot to use for the whole of the caller's unit of work.
    pub fn current(&self) -> Arc<DisplayConfig> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Validates and installs `cfg`.
    pub fn replace(&self, cfg: DisplayConfig) -> Result<u64, ConfigError> {
        if let Err(e) = cfg.validate() {
            self.reject(&e);
            return Err(e);
        }
        Ok(self.install(cfg))
    }

    /// Parses, validates and installs a document.
    pub fn reload_from_str(&self, text: &str) -> Result<u64, ConfigError> {
        match DisplayConfig::from_json5(text) {
            Ok(cfg) => Ok(self.install(cfg)),
            Err(e) => {
                self.reject(&e);
                Err(e)
            }
        }
    }

    /// Re-reads the backing file if its modification time moved.
    pub async fn maybe_reload(&self) -> Result<ReloadOutcome, ConfigError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(ReloadOutcome::Unchanged);
        };
        let mtime = match tokio::fs::metadata(path).await.and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ReloadOutcome::Unchanged),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        {
            let mut meta = self.meta.lock().unwrap_or_else(|e| e.into_inner());
            if meta.last_mtime == Some(mtime) {
                return Ok(ReloadOutcome::Unchanged);
            }
            // Recorded before parsing so a bad file is reported once, not on every check.
            meta.last_mtime = Some(mtime);
        }
        let text = tokio::fs::read_to_string(path).await?;
        let generation = self.reload_from_str(&text)?;
        Ok(ReloadOutcome::Applied { generation })
    }

    /// Reload bookkeeping.
    pub fn status(&self) -> ConfigStatus {
        self.meta.lock().unwrap_or_else(|e| e.into_inner()).status.clone()
    }

    fn install(&self, cfg: DisplayConfig) -> u64 {
        {
            let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
            *guard = Arc::new(cfg);
        }
        let mut meta = self.meta.lock().unwrap_or_else(|e| e.into_inner());
        meta.status.generation += 1;
        meta.status.reloaded_at = Some(Utc::now());
        log::info!("Display config generation {} applied", meta.status.generation);
        meta.status.generation
    }

    fn reject(&self, e: &ConfigError) {
        log::warn!("Display config reload rejected, keeping last good config: {}", e);
        let mut meta = self.meta.lock().unwrap_or_else(|e| e.into_inner());
        meta.status.last_rejection = Some(e.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_the_default() {
        let cfg = DisplayConfig::from_json5("{}").unwrap();
        assert_eq!(cfg, DisplayConfig::default());
        assert!(cfg.panel.is_dual());
        assert_eq!(cfg.score_alerts.display_duration(), Duration::from_millis(1_500));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = DisplayConfig::from_json5(
            r#"{ panel: { width: 64, height: 8 }, market: { top: ["AAPL"], bottom: [] } }"#,
        )
        .unwrap();
        assert_eq!(cfg.panel.width, 64);
        assert_eq!(cfg.panel.fps, 60);
        assert!(!cfg.panel.is_dual());
        assert_eq!(cfg.market.refresh_seconds, 120);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases = [
            (r#"{ panel: { fps: 0 } }"#, "panel.fps"),
            (r#"{ panel: { timezone: "Mars/Olympus" } }"#, "panel.timezone"),
            (r#"{ scroll: { topPps: 0 } }"#, "scroll.topPps"),
            (r#"{ brightness: { night: { start: "25:00" } } }"#, "brightness.night.start"),
            (r#"{ brightness: { basePct: 0 } }"#, "brightness.basePct"),
            (r#"{ scoreAlerts: { queueMax: 0 } }"#, "scoreAlerts.queueMax"),
            (r#"{ supervisor: { backoffBaseMs: 10, backoffMaxMs: 5 } }"#, "supervisor.backoffBaseMs"),
            (r#"{ supervisor: { restartCooldownMs: 0 } }"#, "supervisor.restartCooldownMs"),
            (r#"{ weather: { stickySeconds: 30, repeatSeconds: 10 } }"#, "weather.repeatSeconds"),
            (r#"{ scoreAlerts: { test: { enabled: true, intervalSeconds: 0 } } }"#, "scoreAlerts.test.intervalSeconds"),
        ];
        for (doc, expected) in cases {
            match DisplayConfig::from_json5(doc) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected, "{}", doc),
                other => panic!("{} -> {:?}", doc, other),
            }
        }
        let too_many = r#"{ brightness: { windows: [
            { start: "01:00", end: "02:00", pct: 10 }, { start: "02:00", end: "03:00", pct: 10 },
            { start: "03:00", end: "04:00", pct: 10 }, { start: "04:00", end: "05:00", pct: 10 } ] } }"#;
        assert!(matches!(DisplayConfig::from_json5(too_many), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn invalid_reload_keeps_last_good_snapshot() {
        let store = ConfigStore::new(DisplayConfig::default());
        let before = store.current();
        assert!(store.reload_from_str("{ panel: { fps: 999 } }").is_err());
        assert!(Arc::ptr_eq(&before, &store.current()));
        let status = store.status();
        assert_eq!(status.generation, 1);
        assert!(status.last_rejection.unwrap().contains("panel.fps"));

        assert!(store.reload_from_str("{ not json").is_err());
        assert_eq!(store.reload_from_str("{ panel: { fps: 30 } }").unwrap(), 2);
        assert_eq!(store.current().panel.fps, 30);
        // The old snapshot is untouched for whoever still holds it.
        assert_eq!(before.panel.fps, 60);
    }

    #[tokio::test]
    async fn file_reload_follows_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("display.json5");
        std::fs::write(&path, "{ panel: { fps: 50 } }").unwrap();
        let store = ConfigStore::load(&path).unwrap();
        assert_eq!(store.current().panel.fps, 50);
        assert_eq!(store.maybe_reload().await.unwrap(), ReloadOutcome::Unchanged);

        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"{ panel: { fps: 25 } }").unwrap();
        f.set_modified(SystemTime::now() + Duration::from_secs(5)).unwrap();
        drop(f);
        assert_eq!(store.maybe_reload().await.unwrap(), ReloadOutcome::Applied { generation: 2 });
        assert_eq!(store.current().panel.fps, 25);
    }

    #[test]
    fn intervals_respect_floors() {
        let mut cfg = DisplayConfig::default();
        cfg.market.refresh_seconds = 1;
        assert_eq!(cfg.poll_interval(Domain::Market, false), Duration::from_secs(5));
        assert_eq!(cfg.poll_interval(Domain::Sports, true), Duration::from_secs(45));
        assert_eq!(cfg.poll_interval(Domain::Sports, false), Duration::from_secs(60));
    }
}

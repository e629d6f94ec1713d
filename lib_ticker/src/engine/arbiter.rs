//! # State Arbiter
//!
//! Picks exactly one display mode per tick.
//!
//! ## Core Design Principles:
//!
//! 1.  **Fixed Priority, Short-Circuit**: Override, then Score Alert, then Preroll,
//!     then Scoreboard, then Ticker. The first condition that holds wins the whole
//!     tick and the ones below it are not evaluated; in particular the preroll
//!     scheduler is only advanced when the chain reaches it.
//! 2.  **Edge-Triggered Transitions**: every decision carries a [`ModeKey`]. A key
//!     that differs from the previous tick's marks the decision as `entered`, which
//!     is the only thing that resets a renderer's scroll or animation phase.
//! 3.  **Staleness Is A Cue, Not A Condition**: a stale snapshot still drives its
//!     mode. The decision only carries a `stale` flag for the compositor.
//! 4.  **Owned Side State**: the arbiter owns the override slot, the score detector,
//!     the alert queue and the banner timers. Snapshots are borrowed from the
//!     tick's bus sample.
//! 5.  **Alerts Are Not Eaten**: an alert pre-empted by an override restarts its
//!     full duration when it comes back on screen.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::alerts::{
    AlertQueue, AlertTimeline, ScoreDetector, ScoreEvent, ScoreEventView, ScoreFlash, TestAlertGenerator,
};
use super::banners::{MarketOpenArm, WeatherPin};
use super::overrides::{ControlCommand, ControlError, OverrideMode, OverrideSlot, OverrideView};
use super::preroll::{PrerollScheduler, PrerollSpec};
use crate::configs::DisplayConfig;
use crate::core::snapshot::{BusSample, Domain};
use crate::markets::session_at;
use crate::models::{Game, MarketSession, MarketSnapshot, WeatherAlert};

/// Discriminant of a [`DisplayMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    /// Clock override.
    Clock,
    /// Custom message override.
    Message,
    /// Maintenance override.
    Maintenance,
    /// Score alert banner.
    ScoreAlert,
    /// Preroll.
    Preroll,
    /// Scoreboard, live or forced.
    Scoreboard,
    /// Default ticker.
    Ticker,
}

impl ModeKind {
    /// Display name used in transition logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ModeKind::Clock => "Clock",
            ModeKind::Message => "Message",
            ModeKind::Maintenance => "Maintenance",
            ModeKind::ScoreAlert => "ScoreAlert",
            ModeKind::Preroll => "Preroll",
            ModeKind::Scoreboard => "Scoreboard",
            ModeKind::Ticker => "Ticker",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a mode instance. A change of key is a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeKey {
    /// Mode.
    pub kind: ModeKind,
    /// Instance token: override serial, alert sequence or preroll serial; 0 otherwise.
    pub token: u64,
}

/// Inputs of the ticker row.
#[derive(Debug, Clone, Default)]
pub struct TickerView {
    /// Latest market snapshot.
    pub market: Option<Arc<MarketSnapshot>>,
    /// Market snapshot is older than its threshold.
    pub market_stale: bool,
    /// Weather headline to inject.
    pub headline: Option<WeatherAlert>,
    /// The headline is pinned: it goes into every pass, not only the cadence passes.
    pub headline_pinned: bool,
    /// Serial of the latest market-open arming, 0 if never armed.
    pub market_open: u64,
    /// A tracked team plays today.
    pub game_today: bool,
    /// Session used for the status dot.
    pub session: MarketSession,
}

/// Inputs of the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardView {
    /// Tracked live game, if any.
    pub game: Option<Game>,
    /// Selected by the force-scoreboard override.
    pub forced: bool,
    /// Score flash running on this game.
    pub flash: Option<ScoreFlash>,
}

/// An alert on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertView {
    /// The event.
    pub event: ScoreEvent,
    /// When the banner started.
    pub started_at: Instant,
}

/// The tagged display mode. Exactly one per tick.
#[derive(Debug, Clone)]
pub enum DisplayMode {
    /// Clock override.
    Clock,
    /// Custom message override.
    Message {
        /// Operator text.
        text: String,
    },
    /// Maintenance override.
    Maintenance,
    /// Score alert banner.
    ScoreAlert(AlertView),
    /// Preroll.
    Preroll(PrerollSpec),
    /// Scoreboard.
    Scoreboard(ScoreboardView),
    /// Ticker.
    Ticker(TickerView),
}

impl DisplayMode {
    /// Discriminant.
    pub fn kind(&self) -> ModeKind {
        match self {
            DisplayMode::Clock => ModeKind::Clock,
            DisplayMode::Message { .. } => ModeKind::Message,
            DisplayMode::Maintenance => ModeKind::Maintenance,
            DisplayMode::ScoreAlert(_) => ModeKind::ScoreAlert,
            DisplayMode::Preroll(_) => ModeKind::Preroll,
            DisplayMode::Scoreboard(_) => ModeKind::Scoreboard,
            DisplayMode::Ticker(_) => ModeKind::Ticker,
        }
    }
}

/// # Display Decision
///
/// The arbiter's output for one tick, consumed by the compositor and discarded.
#[derive(Debug, Clone)]
pub struct DisplayDecision {
    /// Chosen mode and its parameters.
    pub mode: DisplayMode,
    /// Identity of the mode instance.
    pub key: ModeKey,
    /// First tick of this mode instance.
    pub entered: bool,
    /// When this mode instance was entered.
    pub entered_at: Instant,
    /// Tick time.
    pub now: Instant,
    /// Tick wall time.
    pub wall: DateTime<Utc>,
    /// The data behind the mode is stale.
    pub stale: bool,
    /// Full-brightness override in force.
    pub full_brightness: bool,
}

impl DisplayDecision {
    /// Time since the mode was entered.
    pub fn elapsed(&self) -> Duration {
        self.now.saturating_duration_since(self.entered_at)
    }
}

/// Everything the arbiter reads in one tick.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    /// Monotonic tick time.
    pub now: Instant,
    /// Wall tick time.
    pub wall: DateTime<Utc>,
    /// Configuration snapshot bound to this tick.
    pub config: &'a DisplayConfig,
    /// Bus sample of this tick.
    pub sample: &'a BusSample,
}

impl TickInput<'_> {
    fn stale(&self, domain: Domain) -> bool {
        let threshold = self.config.stale_threshold(domain);
        match domain {
            Domain::Market => self.sample.market.as_ref().is_some_and(|s| s.is_stale(self.now, threshold)),
            Domain::Weather => self.sample.weather.as_ref().is_some_and(|s| s.is_stale(self.now, threshold)),
            Domain::Sports => self.sample.sports.as_ref().is_some_and(|s| s.is_stale(self.now, threshold)),
        }
    }
}

/// # State Arbiter
#[derive(Debug, Default)]
pub struct Arbiter {
    overrides: OverrideSlot,
    detector: ScoreDetector,
    alerts: AlertQueue,
    showing: Option<AlertView>,
    test_alerts: TestAlertGenerator,
    flash: Option<ScoreFlash>,
    preroll: PrerollScheduler,
    weather_pin: WeatherPin,
    open_arm: MarketOpenArm,
    last_sports_seq: u64,
    current: Option<(ModeKey, Instant)>,
}

impl Arbiter {
    /// Fresh arbiter with no override and nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a control command. Rejected commands leave all state untouched.
    pub fn apply(
        &mut self,
        cmd: ControlCommand,
        now: Instant,
        wall: DateTime<Utc>,
        cfg: &DisplayConfig,
    ) -> Result<(), ControlError> {
        match cmd {
            ControlCommand::Clear => {
                self.overrides.clear();
                Ok(())
            }
            ControlCommand::Apply(req) => {
                let max = Duration::from_secs(cfg.overrides.max_duration_minutes.saturating_mul(60));
                self.overrides.apply(req, now, wall, max).map(|_| ())
            }
        }
    }

    /// The override in force at `now`.
    pub fn active_override(&self, now: Instant) -> Option<OverrideView> {
        self.overrides.active(now).map(|o| o.view(now))
    }

    /// Alerts waiting for the banner, oldest first.
    pub fn pending_alerts(&self, now: Instant) -> Vec<ScoreEventView> {
        self.alerts.iter().map(|e| e.view(now)).collect()
    }

    /// Key of the last decision.
    pub fn current_key(&self) -> Option<ModeKey> {
        self.current.map(|(k, _)| k)
    }

    /// # Decide
    ///
    /// Produces the single decision for this tick.
    pub fn decide(&mut self, input: &TickInput<'_>) -> DisplayDecision {
        let now = input.now;

        // --- Phase 1: Housekeeping ---
        self.overrides.expire(now);
        self.ingest_sports(input);
        if let Some(event) = self.test_alerts.poll(&mut self.detector, &input.config.score_alerts, now, input.wall) {
            self.alerts.push(event, input.config.score_alerts.queue_max);
        }
        let headline = weather_headline(input);
        let banners = Banners {
            headline_pinned: self.weather_pin.update(headline.as_ref(), now, &input.config.weather),
            headline,
            market_open: self.open_arm.update(input.wall, &input.config.market),
        };

        let active = self.overrides.active(now).cloned();
        let full_brightness = active.as_ref().is_some_and(|o| o.mode == OverrideMode::FullBrightness);

        // --- Phase 2: Priority chain ---
        let (mode, token) = match active {
            Some(o) if o.mode != OverrideMode::FullBrightness => {
                let mode = match o.mode {
                    OverrideMode::Clock => DisplayMode::Clock,
                    OverrideMode::CustomMessage => DisplayMode::Message { text: o.text.clone().unwrap_or_default() },
                    OverrideMode::Maintenance => DisplayMode::Maintenance,
                    _ => DisplayMode::Scoreboard(self.scoreboard_view(input, self.tracked_game(input), true)),
                };
                (mode, o.serial)
            }
            _ => self.below_override(input, banners),
        };

        // --- Phase 3: Edge detection ---
        let kind = mode.kind();
        let key = ModeKey { kind, token };
        let (entered, entered_at) = match self.current {
            Some((prev, at)) if prev == key => (false, at),
            prev => {
                match prev {
                    Some((p, _)) => log::info!("Display mode: {} -> {}", p.kind, kind),
                    None => log::info!("Display mode: {}", kind),
                }
                (true, now)
            }
        };
        self.current = Some((key, entered_at));

        let stale = match kind {
            ModeKind::Ticker => input.stale(Domain::Market),
            ModeKind::Scoreboard | ModeKind::ScoreAlert => input.stale(Domain::Sports),
            _ => false,
        };

        DisplayDecision { mode, key, entered, entered_at, now, wall: input.wall, stale, full_brightness }
    }

    fn below_override(&mut self, input: &TickInput<'_>, banners: Banners) -> (DisplayMode, u64) {
        let now = input.now;
        let cfg = input.config;

        // Score alert. One that was pre-empted starts over.
        let timeline = AlertTimeline::from_config(&cfg.score_alerts);
        let previous = self.current_key();
        if let Some(view) = self.showing.as_mut() {
            if previous != Some(ModeKey { kind: ModeKind::ScoreAlert, token: view.event.seq }) {
                log::debug!("Score alert {} {} back on screen, restarting", view.event.team, view.event.score);
                view.started_at = now;
            }
        }
        if self
            .showing
            .as_ref()
            .is_some_and(|s| timeline.is_done(now.saturating_duration_since(s.started_at)))
        {
            self.showing = None;
        }
        if self.showing.is_none() {
            self.alerts
                .prune_expired(now, Duration::from_secs(cfg.score_alerts.expiry_seconds));
            self.showing = self.alerts.pop().map(|event| AlertView { event, started_at: now });
        }
        if let Some(view) = &self.showing {
            return (DisplayMode::ScoreAlert(view.clone()), view.event.seq);
        }

        // Preroll.
        if let Some(due) = self.preroll.poll(now, input.wall, cfg) {
            return (DisplayMode::Preroll(due.clone()), due.serial);
        }

        // Scoreboard.
        if let Some(game) = self.tracked_game(input) {
            return (DisplayMode::Scoreboard(self.scoreboard_view(input, Some(game), false)), 0);
        }

        // Ticker.
        (DisplayMode::Ticker(ticker_view(input, banners)), 0)
    }

    fn tracked_game(&self, input: &TickInput<'_>) -> Option<Game> {
        if !input.config.sports.enabled {
            return None;
        }
        let snap = input.sample.sports.as_ref()?;
        snap.payload.tracked_live_game(input.config.tracked_teams()).cloned()
    }

    fn scoreboard_view(&self, input: &TickInput<'_>, game: Option<Game>, forced: bool) -> ScoreboardView {
        let timeline = AlertTimeline::scoreboard_flash(&input.config.score_alerts);
        let flash = game.as_ref().and_then(|g| {
            self.flash
                .as_ref()
                .filter(|f| f.game_key == g.key())
                .filter(|f| !timeline.is_done(input.now.saturating_duration_since(f.started_at)))
                .cloned()
        });
        ScoreboardView { game, forced, flash }
    }

    fn ingest_sports(&mut self, input: &TickInput<'_>) {
        let Some(snap) = input.sample.sports.as_ref() else {
            return;
        };
        if snap.seq == self.last_sports_seq {
            return;
        }
        self.last_sports_seq = snap.seq;
        if input.config.score_alerts.scoreboard_flash_cycles > 0 {
            if let Some((game_key, side)) = self.detector.increases(&snap.payload).into_iter().next() {
                log::info!("Score flash: {} {:?}", game_key, side);
                self.flash = Some(ScoreFlash { game_key, side, started_at: input.now });
            }
        }
        let events = self.detector.observe(&snap.payload, input.config, input.now, input.wall);
        for ev in events {
            self.alerts.push(ev, input.config.score_alerts.queue_max);
        }
    }
}

/// Per-tick ticker banner state, computed before the priority chain.
#[derive(Debug)]
struct Banners {
    headline: Option<WeatherAlert>,
    headline_pinned: bool,
    market_open: u64,
}

fn weather_headline(input: &TickInput<'_>) -> Option<WeatherAlert> {
    let cfg = &input.config.weather;
    if !cfg.enabled {
        return None;
    }
    input
        .sample
        .weather
        .as_ref()
        .and_then(|w| w.payload.headline(cfg.include_watch, input.wall).cloned())
}

fn ticker_view(input: &TickInput<'_>, banners: Banners) -> TickerView {
    let market = input.sample.market.as_ref().map(|s| Arc::clone(&s.payload));
    let session = match market.as_ref().map(|m| m.session) {
        Some(MarketSession::Unknown) | None => session_at(input.wall),
        Some(s) => s,
    };
    TickerView {
        market,
        market_stale: input.stale(Domain::Market),
        headline: banners.headline,
        headline_pinned: banners.headline_pinned,
        market_open: banners.market_open,
        game_today: input.sample.sports.as_ref().is_some_and(|s| s.payload.game_today),
        session,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::SnapshotBus;
    use crate::engine::overrides::OverrideRequest;
    use crate::engine::alerts::Side;
    use crate::models::fixtures::{live_mtl, market_one};
    use crate::models::{League, Payload, Severity, WeatherSnapshot};
    use chrono::TimeZone;

    /// A quiet weekday afternoon, away from every preroll trigger.
    fn quiet_wall() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 18, 20, 0).unwrap()
    }

    fn decide(arb: &mut Arbiter, bus: &SnapshotBus, cfg: &DisplayConfig, now: Instant, wall: DateTime<Utc>) -> DisplayDecision {
        let sample = bus.sample();
        arb.decide(&TickInput { now, wall, config: cfg, sample: &sample })
    }

    #[test]
    fn default_is_ticker_with_no_data() {
        let cfg = DisplayConfig::default();
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let d = decide(&mut arb, &bus, &cfg, Instant::now(), quiet_wall());
        match d.mode {
            DisplayMode::Ticker(view) => assert!(view.market.is_none()),
            other => panic!("expected ticker, got {:?}", other.kind()),
        }
        assert!(d.entered);
        assert!(!d.stale);
    }

    #[test]
    fn priority_chain_with_conflicting_inputs() {
        let cfg = DisplayConfig::default();
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        let wall = quiet_wall();

        bus.publish(Payload::Sports(live_mtl(0, 0)));
        assert_eq!(decide(&mut arb, &bus, &cfg, t0, wall).key.kind, ModeKind::Scoreboard);

        bus.publish(Payload::Sports(live_mtl(1, 0)));
        let req = OverrideRequest::new(OverrideMode::Clock).for_duration(Duration::from_secs(60));
        arb.apply(ControlCommand::Apply(req), t0, wall, &cfg).unwrap();
        // Override beats the pending alert.
        assert_eq!(decide(&mut arb, &bus, &cfg, t0, wall).key.kind, ModeKind::Clock);
        assert_eq!(arb.pending_alerts(t0).len(), 1);

        arb.apply(ControlCommand::Clear, t0, wall, &cfg).unwrap();
        let d = decide(&mut arb, &bus, &cfg, t0 + Duration::from_millis(10), wall);
        assert_eq!(d.key.kind, ModeKind::ScoreAlert);
        assert!(arb.pending_alerts(t0).is_empty());
    }

    #[test]
    fn score_alert_runs_its_duration_then_reverts_to_scoreboard() {
        let cfg = DisplayConfig::default();
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        let wall = quiet_wall();

        bus.publish(Payload::Sports(live_mtl(0, 0)));
        assert_eq!(decide(&mut arb, &bus, &cfg, t0, wall).key.kind, ModeKind::Scoreboard);

        bus.publish(Payload::Sports(live_mtl(1, 0)));
        let t1 = t0 + Duration::from_secs(5);
        let d = decide(&mut arb, &bus, &cfg, t1, wall);
        assert_eq!(d.key.kind, ModeKind::ScoreAlert);
        assert!(d.entered);
        let mid = decide(&mut arb, &bus, &cfg, t1 + Duration::from_millis(1_499), wall);
        assert_eq!(mid.key.kind, ModeKind::ScoreAlert);
        assert!(!mid.entered);
        let after = decide(&mut arb, &bus, &cfg, t1 + Duration::from_millis(1_500), wall);
        assert_eq!(after.key.kind, ModeKind::Scoreboard);
        assert!(after.entered);
    }

    #[test]
    fn clock_override_holds_for_exactly_its_duration() {
        let cfg = DisplayConfig::default();
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        let wall = quiet_wall();
        arb.apply("clock 5m".parse().unwrap(), t0, wall, &cfg).unwrap();

        let first = decide(&mut arb, &bus, &cfg, t0, wall);
        assert_eq!(first.key.kind, ModeKind::Clock);
        let last = decide(&mut arb, &bus, &cfg, t0 + Duration::from_secs(299), wall);
        assert_eq!(last.key.kind, ModeKind::Clock);
        assert!(!last.entered);
        assert_eq!(last.entered_at, t0);
        let after = decide(&mut arb, &bus, &cfg, t0 + Duration::from_secs(300), wall);
        assert_eq!(after.key.kind, ModeKind::Ticker);
        assert!(after.entered);
    }

    #[test]
    fn full_brightness_does_not_select_a_mode() {
        let cfg = DisplayConfig::default();
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        arb.apply("bright 10m".parse().unwrap(), t0, quiet_wall(), &cfg).unwrap();
        let d = decide(&mut arb, &bus, &cfg, t0, quiet_wall());
        assert_eq!(d.key.kind, ModeKind::Ticker);
        assert!(d.full_brightness);
    }

    #[test]
    fn stale_snapshot_keeps_its_mode() {
        let cfg = DisplayConfig::default();
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        bus.sports.publish_at(live_mtl(2, 1), t0, quiet_wall());
        let later = t0 + Duration::from_secs(cfg.sports.stale_seconds + 1);
        let d = decide(&mut arb, &bus, &cfg, later, quiet_wall());
        assert_eq!(d.key.kind, ModeKind::Scoreboard);
        assert!(d.stale);

        let bus = SnapshotBus::new();
        bus.market.publish_at(market_one("AAPL", 150.0, 1.2), t0, quiet_wall());
        let d = decide(&mut arb, &bus, &cfg, t0 + Duration::from_secs(181), quiet_wall());
        assert_eq!(d.key.kind, ModeKind::Ticker);
        assert!(d.stale);
    }

    #[test]
    fn forced_scoreboard_without_game_has_no_game() {
        let cfg = DisplayConfig::default();
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        arb.apply("scoreboard".parse().unwrap(), t0, quiet_wall(), &cfg).unwrap();
        match decide(&mut arb, &bus, &cfg, t0, quiet_wall()).mode {
            DisplayMode::Scoreboard(v) => {
                assert!(v.forced);
                assert!(v.game.is_none());
            }
            other => panic!("expected scoreboard, got {:?}", other.kind()),
        }
    }

    #[test]
    fn unfollowed_league_never_takes_the_scoreboard() {
        let mut cfg = DisplayConfig::default();
        cfg.sports.leagues = vec![League::Nfl];
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        bus.publish(Payload::Sports(live_mtl(0, 0)));
        let d = decide(&mut arb, &bus, &cfg, Instant::now(), quiet_wall());
        assert_eq!(d.key.kind, ModeKind::Ticker);

        cfg.sports.leagues = vec![League::Nhl];
        let d = decide(&mut arb, &bus, &cfg, Instant::now(), quiet_wall());
        assert_eq!(d.key.kind, ModeKind::Scoreboard);
    }

    #[test]
    fn alert_preempted_by_override_gets_its_full_duration_afterwards() {
        let cfg = DisplayConfig::default();
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        let wall = quiet_wall();
        let ms = |n| t0 + Duration::from_millis(n);

        bus.publish(Payload::Sports(live_mtl(0, 0)));
        decide(&mut arb, &bus, &cfg, t0, wall);
        bus.publish(Payload::Sports(live_mtl(1, 0)));
        assert_eq!(decide(&mut arb, &bus, &cfg, ms(10), wall).key.kind, ModeKind::ScoreAlert);

        arb.apply("clock 10s".parse().unwrap(), ms(100), wall, &cfg).unwrap();
        assert_eq!(decide(&mut arb, &bus, &cfg, ms(100), wall).key.kind, ModeKind::Clock);
        assert_eq!(decide(&mut arb, &bus, &cfg, ms(10_099), wall).key.kind, ModeKind::Clock);

        let back = decide(&mut arb, &bus, &cfg, ms(10_100), wall);
        assert_eq!(back.key.kind, ModeKind::ScoreAlert);
        assert!(back.entered);
        match &back.mode {
            DisplayMode::ScoreAlert(view) => assert_eq!(view.started_at, ms(10_100)),
            other => panic!("expected alert, got {:?}", other.kind()),
        }
        assert_eq!(decide(&mut arb, &bus, &cfg, ms(11_599), wall).key.kind, ModeKind::ScoreAlert);
        assert_eq!(decide(&mut arb, &bus, &cfg, ms(11_600), wall).key.kind, ModeKind::Scoreboard);
    }

    #[test]
    fn scoreboard_flashes_the_side_that_scored() {
        let mut cfg = DisplayConfig::default();
        cfg.score_alerts.enabled = false;
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        let wall = quiet_wall();
        let flash_at = |arb: &mut Arbiter, at| match decide(arb, &bus, &cfg, at, wall).mode {
            DisplayMode::Scoreboard(v) => v.flash.map(|f| f.side),
            other => panic!("expected scoreboard, got {:?}", other.kind()),
        };

        bus.publish(Payload::Sports(live_mtl(0, 0)));
        assert_eq!(flash_at(&mut arb, t0), None);
        bus.publish(Payload::Sports(live_mtl(0, 1)));
        let t1 = t0 + Duration::from_secs(1);
        assert_eq!(flash_at(&mut arb, t1), Some(Side::Away));
        // Four cycles of three colours at 250 ms.
        assert_eq!(flash_at(&mut arb, t1 + Duration::from_millis(2_999)), Some(Side::Away));
        assert_eq!(flash_at(&mut arb, t1 + Duration::from_secs(3)), None);
    }

    #[test]
    fn test_alerts_reach_the_banner() {
        let mut cfg = DisplayConfig::default();
        cfg.score_alerts.test.enabled = true;
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        match decide(&mut arb, &bus, &cfg, t0, quiet_wall()).mode {
            DisplayMode::ScoreAlert(view) => assert_eq!(view.event.team, "MTL"),
            other => panic!("expected alert, got {:?}", other.kind()),
        }
    }

    #[test]
    fn ticker_view_carries_banner_state() {
        let mut cfg = DisplayConfig::default();
        cfg.preroll.enabled = false;
        let bus = SnapshotBus::new();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        bus.publish(Payload::Weather(WeatherSnapshot {
            alerts: vec![WeatherAlert {
                region: "Montreal".into(),
                severity: Severity::Warning,
                headline: "Snowfall warning".into(),
                effective_until: None,
            }],
        }));
        // 09:31 New York on a Wednesday: inside the opening-bell window.
        let open = Utc.with_ymd_and_hms(2025, 3, 12, 13, 31, 0).unwrap();
        let view = |d: DisplayDecision| match d.mode {
            DisplayMode::Ticker(v) => v,
            other => panic!("expected ticker, got {:?}", other.kind()),
        };
        let first = view(decide(&mut arb, &bus, &cfg, t0, open));
        assert!(first.headline.is_some());
        assert!(first.headline_pinned);
        assert_eq!(first.market_open, 1);

        let later = view(decide(&mut arb, &bus, &cfg, t0 + Duration::from_secs(13), open));
        assert!(!later.headline_pinned);
        assert_eq!(later.market_open, 1);
    }

    #[test]
    fn rejected_command_changes_nothing() {
        let cfg = DisplayConfig::default();
        let mut arb = Arbiter::new();
        let t0 = Instant::now();
        arb.apply("maintenance".parse().unwrap(), t0, quiet_wall(), &cfg).unwrap();
        let too_long = ControlCommand::Apply(
            OverrideRequest::new(OverrideMode::Clock).for_duration(Duration::from_secs(2 * 86_400)),
        );
        assert!(arb.apply(too_long, t0, quiet_wall(), &cfg).is_err());
        assert_eq!(arb.active_override(t0).map(|o| o.mode), Some(OverrideMode::Maintenance));
    }
}

//! # Score Alerts
//!
//! Turns successive sports snapshots into score events and keeps the bounded
//! queue of events waiting for the banner. The same comparison drives the
//! scoreboard's flash on the side that scored.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::configs::config_display::{ScoreAlertConfig, TestAlertConfig};
use crate::configs::DisplayConfig;
use crate::models::{Game, League, SportsSnapshot};

/// A detected score change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEvent {
    /// Detection order, starting at 1.
    pub seq: u64,
    /// League of the game.
    pub league: League,
    /// Team that scored.
    pub team: String,
    /// Its new score.
    pub score: u32,
    /// Points added by this change.
    pub delta: u32,
    /// Monotonic detection time.
    pub detected_at: Instant,
    /// Wall detection time.
    pub detected_wall: DateTime<Utc>,
}

impl ScoreEvent {
    /// Banner text, e.g. `MTL  3`.
    pub fn banner(&self) -> String {
        format!("{}  {}", self.team, self.score)
    }

    /// Serializable summary.
    pub fn view(&self, now: Instant) -> ScoreEventView {
        ScoreEventView {
            seq: self.seq,
            league: self.league,
            team: self.team.clone(),
            score: self.score,
            detected_at: self.detected_wall,
            age_seconds: now.saturating_duration_since(self.detected_at).as_secs(),
        }
    }
}

/// Status-surface view of a score event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEventView {
    /// Detection order.
    pub seq: u64,
    /// League.
    pub league: League,
    /// Team.
    pub team: String,
    /// New score.
    pub score: u32,
    /// Detection time.
    pub detected_at: DateTime<Utc>,
    /// Age at report time.
    pub age_seconds: u64,
}

/// Side of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Home team.
    Home,
    /// Away team.
    Away,
}

/// A score increase seen on a live game, flashed on the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreFlash {
    /// [`Game::key`] of the game.
    pub game_key: String,
    /// Side that scored.
    pub side: Side,
    /// Start of the flash.
    pub started_at: Instant,
}

/// Remembers the last score of every game and reports increases.
#[derive(Debug, Default)]
pub struct ScoreDetector {
    last: HashMap<String, (u32, u32)>,
    next_seq: u64,
}

impl ScoreDetector {
    /// Empty detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Live games of `snap` whose score went up since the last [`observe`](Self::observe),
    /// with the side that scored. Home wins when both moved. Read-only.
    pub fn increases(&self, snap: &SportsSnapshot) -> Vec<(String, Side)> {
        snap.games
            .iter()
            .filter(|g| g.is_live())
            .filter_map(|g| {
                let key = g.key();
                let &(home, away) = self.last.get(&key)?;
                if g.home.score > home {
                    Some((key, Side::Home))
                } else if g.away.score > away {
                    Some((key, Side::Away))
                } else {
                    None
                }
            })
            .collect()
    }

    /// A synthetic event that takes the next sequence number.
    pub fn synthetic(&mut self, league: League, team: &str, score: u32, now: Instant, wall: DateTime<Utc>) -> ScoreEvent {
        self.next_seq += 1;
        ScoreEvent {
            seq: self.next_seq,
            league,
            team: team.to_uppercase(),
            score,
            delta: 0,
            detected_at: now,
            detected_wall: wall,
        }
    }

    /// Compares `snap` with the previous one. Call once per published snapshot.
    pub fn observe(
        &mut self,
        snap: &SportsSnapshot,
        cfg: &DisplayConfig,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> Vec<ScoreEvent> {
        let mut events = Vec::new();
        let mut seen = HashMap::with_capacity(snap.games.len());
        for game in &snap.games {
            let key = game.key();
            let current = (game.home.score, game.away.score);
            if let Some(&previous) = self.last.get(&key) {
                if game.is_live() && cfg.alerts_enabled_for(game.league) {
                    for (team, old, new) in [
                        (&game.home.code, previous.0, current.0),
                        (&game.away.code, previous.1, current.1),
                    ] {
                        if let Some(delta) = self.alert_delta(game, team, old, new, cfg) {
                            self.next_seq += 1;
                            events.push(ScoreEvent {
                                seq: self.next_seq,
                                league: game.league,
                                team: team.clone(),
                                score: new,
                                delta,
                                detected_at: now,
                                detected_wall: wall,
                            });
                        }
                    }
                }
            }
            seen.insert(key, current);
        }
        self.last = seen;
        events
    }

    fn alert_delta(&self, game: &Game, team: &str, old: u32, new: u32, cfg: &DisplayConfig) -> Option<u32> {
        let delta = new.checked_sub(old).filter(|d| *d > 0)?;
        let a = &cfg.score_alerts;
        let big_enough = match game.league {
            League::Nhl => true,
            League::Nfl => delta >= a.nfl_delta_min,
            League::Other => false,
        };
        let wanted = !a.my_teams_only || cfg.tracked_teams().contains(game.league, team);
        (big_enough && wanted).then_some(delta)
    }
}

/// Bounded FIFO of undisplayed events.
#[derive(Debug, Default)]
pub struct AlertQueue {
    pending: VecDeque<ScoreEvent>,
}

impl AlertQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event`, dropping the oldest when `max` is reached.
    pub fn push(&mut self, event: ScoreEvent, max: usize) {
        while self.pending.len() >= max.max(1) {
            if let Some(dropped) = self.pending.pop_front() {
                log::warn!("Score alert queue full, dropping {} {}", dropped.team, dropped.score);
            }
        }
        log::info!("Score alert queued: {} {} ({})", event.team, event.score, event.league);
        self.pending.push_back(event);
    }

    /// Discards head events older than `expiry`.
    pub fn prune_expired(&mut self, now: Instant, expiry: Duration) {
        while let Some(head) = self.pending.front() {
            if now.saturating_duration_since(head.detected_at) <= expiry {
                break;
            }
            if let Some(old) = self.pending.pop_front() {
                log::info!("Score alert expired unshown: {} {}", old.team, old.score);
            }
        }
    }

    /// Removes and returns the next event.
    pub fn pop(&mut self) -> Option<ScoreEvent> {
        self.pending.pop_front()
    }

    /// Pending events in order.
    pub fn iter(&self) -> impl Iterator<Item = &ScoreEvent> {
        self.pending.iter()
    }

    /// Number pending.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Emits a synthetic alert every `interval_seconds` while test alerts are on.
#[derive(Debug, Default)]
pub struct TestAlertGenerator {
    last: Option<Instant>,
}

impl TestAlertGenerator {
    /// Idle generator; the first poll with test alerts on fires at once.
    pub fn new() -> Self {
        Self::default()
    }

    /// The score to show at `wall`: cycles through 2..=11 with the interval.
    pub fn score_at(cfg: &TestAlertConfig, wall: DateTime<Utc>) -> u32 {
        let interval = cfg.interval_seconds.max(1) as i64;
        2 + (wall.timestamp().max(0) / interval % 10) as u32
    }

    /// A new test event when one is due.
    pub fn poll(
        &mut self,
        detector: &mut ScoreDetector,
        cfg: &ScoreAlertConfig,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> Option<ScoreEvent> {
        let test = &cfg.test;
        if !cfg.enabled || !test.enabled {
            self.last = None;
            return None;
        }
        let interval = Duration::from_secs(test.interval_seconds.max(1));
        if self.last.is_some_and(|at| now.saturating_duration_since(at) < interval) {
            return None;
        }
        self.last = Some(now);
        let event = detector.synthetic(test.league, &test.team, Self::score_at(test, wall), now, wall);
        log::info!("Test score alert: {} {}", event.team, event.score);
        Some(event)
    }
}

/// Flash schedule of one alert: `cycles x colours` steps of `flash` each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTimeline {
    /// One colour step.
    pub flash: Duration,
    /// Number of colours.
    pub colors: usize,
    /// Total on-screen time.
    pub total: Duration,
}

impl AlertTimeline {
    /// Timeline of the alert banner.
    pub fn from_config(cfg: &ScoreAlertConfig) -> Self {
        Self::with_cycles(cfg, cfg.cycles.max(1))
    }

    /// Timeline of the scoreboard flash.
    pub fn scoreboard_flash(cfg: &ScoreAlertConfig) -> Self {
        Self::with_cycles(cfg, cfg.scoreboard_flash_cycles)
    }

    fn with_cycles(cfg: &ScoreAlertConfig, cycles: u32) -> Self {
        Self {
            flash: Duration::from_millis(cfg.flash_ms.max(1)),
            colors: cfg.flash_colors.len().max(1),
            total: cfg.cycle_duration(cycles),
        }
    }

    /// Index into the colour list at `elapsed`.
    pub fn color_index(&self, elapsed: Duration) -> usize {
        ((elapsed.as_millis() / self.flash.as_millis().max(1)) as usize) % self.colors
    }

    /// True once the alert has been up for its full duration.
    pub fn is_done(&self, elapsed: Duration) -> bool {
        elapsed >= self.total
    }
}

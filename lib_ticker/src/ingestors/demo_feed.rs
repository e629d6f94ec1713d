//! # Demo Feed
//!
//! Synthetic payloads for running the display without any upstream: prices take
//! a small random walk, a scripted hockey game scores every two minutes, and a
//! weather warning can be forced on.

use chrono::Utc;
use futures_util::future::BoxFuture;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::poller::Poller;
use super::FetchError;
use crate::core::snapshot::Domain;
use crate::markets::session_at;
use crate::models::{
    Game, GameState, League, MarketSnapshot, Payload, Quote, Severity, SportsSnapshot, TeamScore, WeatherAlert,
    WeatherSnapshot,
};

/// Seconds between scripted goals.
const GOAL_EVERY: u64 = 120;
/// Length of a scripted period.
const PERIOD_SECS: u64 = 20 * 60;

/// What a demo feed produces.
#[derive(Debug, Clone)]
enum DemoKind {
    Market { symbols: Vec<String> },
    Weather { force_alert: bool },
    Sports { team: String, opponent: String },
}

/// A poller that invents its data.
pub struct DemoFeed {
    kind: DemoKind,
    started: Instant,
    // symbol -> (open, last)
    prices: Mutex<BTreeMap<String, (f64, f64)>>,
}

impl DemoFeed {
    fn with_kind(kind: DemoKind) -> Self {
        Self { kind, started: Instant::now(), prices: Mutex::new(BTreeMap::new()) }
    }

    /// Random-walk quotes for `symbols`.
    pub fn market(symbols: Vec<String>) -> Self {
        Self::with_kind(DemoKind::Market { symbols })
    }

    /// An empty alert list, or a standing warning when `force_alert`.
    pub fn weather(force_alert: bool) -> Self {
        Self::with_kind(DemoKind::Weather { force_alert })
    }

    /// A live game between `team` (home) and `opponent`.
    pub fn sports(team: &str, opponent: &str) -> Self {
        Self::with_kind(DemoKind::Sports { team: team.to_string(), opponent: opponent.to_string() })
    }

    fn next_market(&self, symbols: &[String]) -> MarketSnapshot {
        let mut rng = rand::rng();
        let mut prices = self.prices.lock().unwrap_or_else(|e| e.into_inner());
        let quotes = symbols
            .iter()
            .map(|sym| {
                let entry = prices.entry(sym.clone()).or_insert_with(|| {
                    let open = rng.random_range(20.0..600.0);
                    (open, open)
                });
                entry.1 *= 1.0 + rng.random_range(-0.004..0.004);
                let (open, last) = *entry;
                let mut q = Quote::priced(sym, last, (last - open) / open * 100.0);
                q.as_of = Some(Utc::now());
                q
            })
            .collect();
        MarketSnapshot::new(quotes, session_at(Utc::now()))
    }

    fn next_sports(&self, team: &str, opponent: &str, elapsed: Duration) -> SportsSnapshot {
        sports_at(team, opponent, elapsed)
    }
}

/// The scripted game `elapsed` after the feed started.
fn sports_at(team: &str, opponent: &str, elapsed: Duration) -> SportsSnapshot {
    let secs = elapsed.as_secs();
    let goals = (secs / GOAL_EVERY) as u32;
    let in_period = secs % PERIOD_SECS;
    let left = PERIOD_SECS - in_period;
    let game = Game {
        id: "demo-1".to_string(),
        league: League::Nhl,
        state: GameState::Live,
        period: 1 + ((secs / PERIOD_SECS) % 3) as u32,
        clock: format!("{:02}:{:02}", left / 60, left % 60),
        home: TeamScore { code: team.to_string(), score: goals.div_ceil(2) },
        away: TeamScore { code: opponent.to_string(), score: goals / 2 },
        start: None,
    };
    SportsSnapshot { games: vec![game], game_today: true }
}

impl Poller for DemoFeed {
    fn domain(&self) -> Domain {
        match self.kind {
            DemoKind::Market { .. } => Domain::Market,
            DemoKind::Weather { .. } => Domain::Weather,
            DemoKind::Sports { .. } => Domain::Sports,
        }
    }

    fn name(&self) -> String {
        format!("{}-demo", self.domain())
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Payload, FetchError>> {
        let payload = match &self.kind {
            DemoKind::Market { symbols } => Payload::Market(self.next_market(symbols)),
            DemoKind::Weather { force_alert } => {
                let alerts = if *force_alert {
                    vec![WeatherAlert {
                        region: "Demo".to_string(),
                        severity: Severity::Warning,
                        headline: "WIND WARNING IN EFFECT".to_string(),
                        effective_until: None,
                    }]
                } else {
                    Vec::new()
                };
                Payload::Weather(WeatherSnapshot { alerts })
            }
            DemoKind::Sports { team, opponent } => {
                Payload::Sports(self.next_sports(team, opponent, self.started.elapsed()))
            }
        };
        Box::pin(async move { Ok(payload) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_game_scores_every_two_minutes() {
        let g0 = &sports_at("MTL", "TOR", Duration::from_secs(0)).games[0];
        assert_eq!((g0.home.score, g0.away.score), (0, 0));
        assert_eq!(g0.clock, "20:00");
        let g1 = &sports_at("MTL", "TOR", Duration::from_secs(125)).games[0];
        assert_eq!((g1.home.score, g1.away.score), (1, 0));
        let g2 = &sports_at("MTL", "TOR", Duration::from_secs(245)).games[0];
        assert_eq!((g2.home.score, g2.away.score), (1, 1));
        assert_eq!(sports_at("MTL", "TOR", Duration::from_secs(1_300)).games[0].period, 2);
    }

    #[tokio::test]
    async fn market_demo_prices_every_symbol() {
        let feed = DemoFeed::market(vec!["AAPL".into(), "MSFT".into()]);
        for _ in 0..3 {
            match feed.fetch().await.unwrap() {
                Payload::Market(m) => {
                    assert_eq!(m.quotes.len(), 2);
                    assert!(m.quotes.iter().all(Quote::is_complete));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }
}

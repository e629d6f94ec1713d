//! Shared payload builders for unit tests.

use super::market::{MarketSession, MarketSnapshot, Quote};
use super::sports::{Game, GameState, League, SportsSnapshot, TeamScore};

/// A game in period 2 at 12:34 with an id derived from the team codes.
pub(crate) fn game(league: League, state: GameState, home: (&str, u32), away: (&str, u32)) -> Game {
    Game {
        id: format!("{}-{}", home.0, away.0),
        league,
        state,
        period: 2,
        clock: "12:34".into(),
        home: TeamScore { code: home.0.into(), score: home.1 },
        away: TeamScore { code: away.0.into(), score: away.1 },
        start: None,
    }
}

/// One live Montreal home game.
pub(crate) fn live_mtl(home: u32, away: u32) -> SportsSnapshot {
    SportsSnapshot {
        games: vec![game(League::Nhl, GameState::Live, ("MTL", home), ("TOR", away))],
        game_today: true,
    }
}

/// A regular-session snapshot with a single quote.
pub(crate) fn market_one(symbol: &str, price: f64, pct: f64) -> MarketSnapshot {
    MarketSnapshot::new(vec![Quote::priced(symbol, price, pct)], MarketSession::Regular)
}

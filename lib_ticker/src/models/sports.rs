//! # Sports Scoreboard Payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leagues the scoreboard understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum League {
    /// National Hockey League.
    Nhl,
    /// National Football League.
    Nfl,
    /// Anything else; shown but never alerted on.
    #[serde(other)]
    Other,
}

impl League {
    /// Upper-case league code.
    pub fn as_str(self) -> &'static str {
        match self {
            League::Nhl => "NHL",
            League::Nfl => "NFL",
            League::Other => "OTHER",
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameState {
    /// Scheduled, not started.
    #[serde(alias = "FUT", alias = "PRE")]
    Pregame,
    /// In progress.
    #[serde(alias = "CRIT", alias = "IN")]
    Live,
    /// Over.
    #[serde(alias = "OFF", alias = "POST")]
    Final,
}

/// One side of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScore {
    /// Team abbreviation, e.g. `MTL`.
    pub code: String,
    /// Current score.
    #[serde(default)]
    pub score: u32,
}

/// A game as reported by the sports poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Upstream game id; may be empty.
    #[serde(default)]
    pub id: String,
    /// League the game belongs to.
    pub league: League,
    /// Game state.
    pub state: GameState,
    /// Period (hockey) or quarter (football); 0 before the start.
    #[serde(default)]
    pub period: u32,
    /// Game clock text, e.g. `12:34`.
    #[serde(default)]
    pub clock: String,
    /// Home side.
    pub home: TeamScore,
    /// Away side.
    pub away: TeamScore,
    /// Scheduled start.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
}

impl Game {
    /// Stable key used to track scores between snapshots.
    pub fn key(&self) -> String {
        if self.id.is_empty() {
            format!("{}:{}-{}", self.league, self.home.code, self.away.code)
        } else {
            format!("{}:{}", self.league, self.id)
        }
    }

    /// True while the game is in progress.
    pub fn is_live(&self) -> bool {
        self.state == GameState::Live
    }

    /// True if either side is one of `teams` (case-insensitive).
    pub fn involves(&self, teams: &[String]) -> bool {
        teams.iter().any(|t| {
            t.eq_ignore_ascii_case(&self.home.code) || t.eq_ignore_ascii_case(&self.away.code)
        })
    }

    /// Short period label: `P2`, `OT`, `SO`, `Q3`, `PRE`, `FINAL`.
    pub fn period_label(&self) -> String {
        match self.state {
            GameState::Pregame => return "PRE".to_string(),
            GameState::Final => return "FINAL".to_string(),
            GameState::Live => {}
        }
        match (self.league, self.period) {
            (League::Nhl, n) if n >= 5 => "SO".to_string(),
            (League::Nhl, 4) => "OT".to_string(),
            (League::Nhl, n) => format!("P{}", n),
            (League::Nfl, n) if n > 4 => "OT".to_string(),
            (_, n) => format!("Q{}", n),
        }
    }
}

/// Latest scoreboard for every watched league.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SportsSnapshot {
    /// Games ordered by the poller's priority.
    #[serde(default)]
    pub games: Vec<Game>,
    /// A tracked team plays today (drives the ticker's status dot).
    #[serde(default)]
    pub game_today: bool,
}

/// Team lists per league, borrowed from the display config.
#[derive(Debug, Clone, Copy)]
pub struct TrackedTeams<'a> {
    /// Leagues followed at all.
    pub leagues: &'a [League],
    /// Hockey teams.
    pub nhl: &'a [String],
    /// Football teams.
    pub nfl: &'a [String],
}

impl TrackedTeams<'_> {
    /// Teams tracked for `league`; none when the league is not followed.
    pub fn for_league(&self, league: League) -> &[String] {
        if !self.leagues.contains(&league) {
            return &[];
        }
        match league {
            League::Nhl => self.nhl,
            League::Nfl => self.nfl,
            League::Other => &[],
        }
    }

    /// True if `code` is tracked in `league`.
    pub fn contains(&self, league: League, code: &str) -> bool {
        self.for_league(league).iter().any(|t| t.eq_ignore_ascii_case(code))
    }
}

impl SportsSnapshot {
    /// First live game involving a tracked team of its league.
    pub fn tracked_live_game(&self, teams: TrackedTeams<'_>) -> Option<&Game> {
        self.games
            .iter()
            .find(|g| g.is_live() && g.involves(teams.for_league(g.league)))
    }

    /// True if any game in the snapshot is live.
    pub fn any_live(&self) -> bool {
        self.games.iter().any(Game::is_live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::game;

    #[test]
    fn period_labels_by_league() {
        let mut g = game(League::Nhl, GameState::Live, ("MTL", 1), ("TOR", 0));
        assert_eq!(g.period_label(), "P2");
        g.period = 4;
        assert_eq!(g.period_label(), "OT");
        g.period = 5;
        assert_eq!(g.period_label(), "SO");
        g.league = League::Nfl;
        assert_eq!(g.period_label(), "OT");
        g.period = 3;
        assert_eq!(g.period_label(), "Q3");
        g.state = GameState::Final;
        assert_eq!(g.period_label(), "FINAL");
    }

    #[test]
    fn tracked_live_game_respects_league_lists() {
        let snap = SportsSnapshot {
            games: vec![
                game(League::Nfl, GameState::Live, ("MTL", 0), ("BUF", 0)),
                game(League::Nhl, GameState::Pregame, ("MTL", 0), ("BOS", 0)),
                game(League::Nhl, GameState::Live, ("TOR", 2), ("MTL", 1)),
            ],
            game_today: true,
        };
        let nhl = vec!["mtl".to_string()];
        let nfl = vec!["NE".to_string()];
        let teams = TrackedTeams { leagues: &[League::Nhl, League::Nfl], nhl: &nhl, nfl: &nfl };
        let live = snap.tracked_live_game(teams).map(|g| g.home.code.as_str());
        assert_eq!(live, Some("TOR"));

        // Hockey no longer followed: the live MTL game is ignored.
        let football_only = TrackedTeams { leagues: &[League::Nfl], ..teams };
        assert!(snap.tracked_live_game(football_only).is_none());
        assert!(!football_only.contains(League::Nhl, "MTL"));
    }

    #[test]
    fn state_accepts_upstream_aliases() {
        let s: GameState = serde_json::from_str("\"FUT\"").unwrap();
        assert_eq!(s, GameState::Pregame);
        let s: GameState = serde_json::from_str("\"OFF\"").unwrap();
        assert_eq!(s, GameState::Final);
    }
}

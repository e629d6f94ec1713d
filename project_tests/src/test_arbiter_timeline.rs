//! # Arbiter Timeline Runner
//!
//! Replays a scripted evening through the arbiter at ten ticks per second of
//! simulated time and prints every mode transition:
//!
//! - 0s: Montreal is live, 0-0.
//! - 30s: Montreal scores.
//! - 90s: the operator posts a one-minute message.
//! - 200s: the game goes final.
//!
//! The wall clock is pinned away from the top of the hour and the market bells
//! so no preroll fires.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use anyhow::Result;
use chrono::{TimeZone, Utc};
use std::time::{Duration, Instant};

use lib_ticker::engine::{brightness_at, Arbiter, TickInput};
use lib_ticker::models::{Game, GameState, League, SportsSnapshot, TeamScore};
use lib_ticker::{ControlCommand, DisplayConfig, SnapshotBus};

fn evening(state: GameState, home: u32, away: u32) -> SportsSnapshot {
    SportsSnapshot {
        games: vec![Game {
            id: "MTL-TOR".to_string(),
            league: League::Nhl,
            state,
            period: 2,
            clock: "08:12".to_string(),
            home: TeamScore { code: "MTL".to_string(), score: home },
            away: TeamScore { code: "TOR".to_string(), score: away },
            start: None,
        }],
        game_today: true,
    }
}

fn main() -> Result<()> {
    let cfg = DisplayConfig::default();
    let bus = SnapshotBus::new();
    let mut arbiter = Arbiter::new();

    let t0 = Instant::now();
    // 19:20 in Toronto.
    let wall0 = Utc.with_ymd_and_hms(2024, 11, 6, 0, 20, 0).single().ok_or_else(|| anyhow::anyhow!("bad date"))?;
    let tick = Duration::from_millis(100);

    for i in 0..2_400u32 {
        let offset = tick * i;
        let now = t0 + offset;
        let wall = wall0 + chrono::Duration::from_std(offset)?;
        let secs = offset.as_secs_f64();

        // --- Script ---
        match i {
            0 => {
                bus.sports.publish_at(evening(GameState::Live, 0, 0), now, wall);
            }
            300 => {
                bus.sports.publish_at(evening(GameState::Live, 1, 0), now, wall);
            }
            900 => {
                let cmd: ControlCommand = "message 1m GO HABS GO".parse()?;
                let result = arbiter.apply(cmd, now, wall, &cfg);
                println!("{:>7.1}s  control: message 1m -> {:?}", secs, result);
            }
            2_000 => {
                bus.sports.publish_at(evening(GameState::Final, 1, 0), now, wall);
            }
            _ => {}
        }

        let sample = bus.sample();
        let decision = arbiter.decide(&TickInput { now, wall, config: &cfg, sample: &sample });
        if decision.entered {
            let local = wall.with_timezone(&cfg.tz()).time();
            let brightness = brightness_at(local, &cfg.brightness, decision.full_brightness);
            println!(
                "{:>7.1}s  {:<12} brightness {:.2}  pending alerts {}",
                secs,
                decision.key.kind.as_str(),
                brightness.scale,
                arbiter.pending_alerts(now).len()
            );
        }
    }
    Ok(())
}

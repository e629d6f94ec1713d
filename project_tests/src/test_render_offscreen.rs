//! # Off-screen Render Runner
//!
//! Feeds the runtime with synthetic market, weather and sports payloads, ticks
//! the render loop against an in-memory sink and prints the last frame as text.
//! Optionally writes the same frame as a PPM image.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lib_ticker::ingestors::DemoFeed;
use lib_ticker::output::{FrameSink, MemorySink, PpmSink};
use lib_ticker::render::Frame;
use lib_ticker::{ConfigStore, DisplayConfig, DisplayRuntime, Poller, SnapshotBus, StatusBoard};

#[derive(Parser, Debug)]
#[clap(about = "Render synthetic feeds off-screen")]
struct Args {
    #[clap(long, default_value_t = 192)]
    width: u32,
    #[clap(long, default_value_t = 16)]
    height: u32,
    #[clap(long, default_value_t = 180, help = "Frames to render at 60 fps of simulated time.")]
    frames: u64,
    #[clap(long, help = "Also feed a live game.")]
    live_game: bool,
    #[clap(long, help = "Write the last frame as PPM here.")]
    ppm: Option<PathBuf>,
}

/// Prints lit pixels as `#`.
fn print_frame(frame: &Frame) {
    for y in 0..frame.height() as i32 {
        let row: String = (0..frame.width() as i32)
            .map(|x| if frame.get(x, y).is_some_and(|p| p.is_lit()) { '#' } else { '.' })
            .collect();
        println!("{}", row);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = DisplayConfig::default();
    cfg.panel.width = args.width;
    cfg.panel.height = args.height;
    cfg.validate()?;
    let store = Arc::new(ConfigStore::new(cfg.clone()));
    let bus = Arc::new(SnapshotBus::new());
    let board = Arc::new(StatusBoard::new());

    // --- Synthetic data ---
    let mut feeds = vec![DemoFeed::market(cfg.market.all_symbols()), DemoFeed::weather(true)];
    if args.live_game {
        feeds.push(DemoFeed::sports("MTL", "TOR"));
    }
    for feed in &feeds {
        let payload = feed.fetch().await?;
        println!("published {}", payload.domain());
        bus.publish(payload);
    }

    // --- Render ---
    let sink = MemorySink::new(args.width, args.height);
    let handle = sink.handle();
    let (mut runtime, _control) = DisplayRuntime::new(store, Arc::clone(&bus), Arc::clone(&board), sink);
    let t0 = Instant::now();
    let wall0 = Utc::now();
    for i in 0..args.frames {
        let offset = Duration::from_micros(i * 16_667);
        let decision = runtime.tick(t0 + offset, wall0 + chrono::Duration::from_std(offset)?);
        if i == 0 || decision.entered {
            println!("frame {:>4}: {} (stale: {})", i, decision.key.kind, decision.stale);
        }
    }

    let Some(frame) = handle.last_frame() else {
        anyhow::bail!("the sink never received a frame");
    };
    println!("frames written: {}, lit pixels in last frame: {}", handle.frames(), frame.lit_count());
    print_frame(&frame);

    if let Some(path) = args.ppm {
        let mut ppm = PpmSink::new(&path, 1);
        ppm.write(&frame)?;
        println!("PPM written to {}", path.display());
    }
    Ok(())
}

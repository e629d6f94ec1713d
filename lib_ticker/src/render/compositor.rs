//! # Compositor
//!
//! Turns one [`DisplayDecision`] into one pixel frame.
//!
//! ## Core Design Principles:
//!
//! 1.  **One Draw Contract**: every mode renderer implements [`DrawMode`]. The
//!     compositor only clears the frame, dispatches on the mode, draws the
//!     freshness marker and applies brightness.
//! 2.  **Phase Is The Only State**: the scroll lanes and the market-open pass
//!     count are the sole state carried between frames. The lanes are reset when
//!     a decision is `entered` and advanced by the time since the previous frame
//!     otherwise.
//! 3.  **One Dimming Path**: brightness is applied to the finished frame as the
//!     last step, so every mode dims identically. An off window blanks the frame.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::{Duration, Instant};

use super::font::SPACING;
use super::frame::Frame;
use super::modes::OpenBannerPasses;
use super::palette;
use super::scroll::ScrollPhase;
use super::text::Line;
use crate::configs::DisplayConfig;
use crate::engine::{Brightness, DisplayDecision, DisplayMode, ModeKind};

/// A horizontal band of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    /// First pixel row.
    pub top: i32,
    /// Height in pixels.
    pub h: i32,
}

/// Which scroll phase a renderer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// Single-row content and the top ticker row.
    Primary,
    /// Bottom ticker row.
    Secondary,
}

/// The scroll phases of the current mode.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Phases {
    primary: ScrollPhase,
    secondary: ScrollPhase,
    /// Survives [`Phases::reset`].
    pub open_banner: OpenBannerPasses,
}

impl Phases {
    /// Phase of `lane`.
    pub fn lane(&self, lane: Lane) -> &ScrollPhase {
        match lane {
            Lane::Primary => &self.primary,
            Lane::Secondary => &self.secondary,
        }
    }

    fn lane_mut(&mut self, lane: Lane) -> &mut ScrollPhase {
        match lane {
            Lane::Primary => &mut self.primary,
            Lane::Secondary => &mut self.secondary,
        }
    }

    /// Both lanes back to their initial position.
    pub fn reset(&mut self) {
        self.primary.reset();
        self.secondary.reset();
    }
}

/// Everything a renderer may read or write for one frame.
pub struct DrawContext<'a> {
    /// Target, already cleared.
    pub frame: &'a mut Frame,
    /// Scroll phases of the mode.
    pub phases: &'a mut Phases,
    /// Configuration bound to this tick.
    pub config: &'a DisplayConfig,
    /// Local wall time in the panel's time zone.
    pub local: NaiveDateTime,
    /// UTC wall time.
    pub wall: DateTime<Utc>,
    /// Monotonic tick time.
    pub now: Instant,
    /// Time since the mode was entered.
    pub elapsed: Duration,
    /// Seconds since the previous frame; 0 on entry.
    pub dt: f64,
    /// Scroll speed multiplier from the dimmer.
    pub speed_scale: f64,
}

impl DrawContext<'_> {
    /// Frame width.
    pub fn width(&self) -> i32 {
        self.frame.width() as i32
    }

    /// Frame height.
    pub fn height(&self) -> i32 {
        self.frame.height() as i32
    }

    /// Two text rows are available.
    pub fn dual(&self) -> bool {
        self.config.panel.is_dual() && self.height() >= 2 * self.row_height()
    }

    fn row_height(&self) -> i32 {
        (self.config.panel.row_height as i32).max(1)
    }

    /// The whole panel as one row.
    pub fn full(&self) -> Row {
        Row { top: 0, h: self.height() }
    }

    /// Top and bottom rows of the dual layout.
    pub fn rows(&self) -> (Row, Row) {
        let rh = self.row_height().min(self.height());
        (Row { top: 0, h: rh }, Row { top: rh, h: self.height() - rh })
    }

    /// Largest scale (1 or 2) at which `line` fits `row` and the panel width.
    pub fn scale_for(&self, line: &Line, row: Row) -> i32 {
        if row.h >= 16 && line.visible_width(2) <= self.width() {
            2
        } else {
            1
        }
    }

    /// Draws `line` centered horizontally within `[x0, x0 + span)`.
    pub fn center_in(&mut self, line: &Line, x0: i32, span: i32, row: Row, scale: i32) {
        let x = x0 + (span - line.visible_width(scale)) / 2;
        line.draw(self.frame, x, row.top, row.h, scale);
    }

    /// Draws `line` centered on the panel.
    pub fn center(&mut self, line: &Line, row: Row, scale: i32) {
        let w = self.width();
        self.center_in(line, 0, w, row, scale);
    }

    /// Advances `lane` by this frame's distance at `pps` and draws every visible copy.
    pub fn scroll(&mut self, lane: Lane, line: &Line, row: Row, pps: f64) {
        let content_w = line.width(1).max(SPACING);
        let panel_w = self.width();
        let phase = self.phases.lane_mut(lane);
        let wrapped = phase.advance(pps * self.speed_scale * self.dt, content_w, panel_w);
        if wrapped {
            log::debug!("Scroll pass {} complete ({:?})", phase.wraps(), lane);
        }
        for x in phase.copies(content_w, panel_w) {
            line.draw(self.frame, x, row.top, row.h, 1);
        }
    }

    /// Centers `line` when it fits the panel, scrolls it otherwise.
    pub fn scroll_or_center(&mut self, lane: Lane, line: &Line, row: Row, pps: f64) {
        if line.visible_width(1) <= self.width() {
            self.center(line, row, 1);
        } else {
            self.scroll(lane, line, row, pps);
        }
    }
}

/// The polymorphic draw operation, one implementation per display mode.
pub trait DrawMode {
    /// Draws the mode into the cleared frame.
    fn draw(&self, ctx: &mut DrawContext<'_>);
}

/// # Compositor
///
/// Owns the frame buffer and the scroll phases. The frame size is fixed at
/// construction.
#[derive(Debug)]
pub struct Compositor {
    frame: Frame,
    phases: Phases,
    last_now: Option<Instant>,
}

impl Compositor {
    /// Compositor for a `width x height` panel.
    pub fn new(width: u32, height: u32) -> Self {
        Self { frame: Frame::new(width, height), phases: Phases::default(), last_now: None }
    }

    /// The last rendered frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Current scroll phases.
    pub fn phases(&self) -> &Phases {
        &self.phases
    }

    /// # Render
    ///
    /// Draws `decision` at `brightness` and returns the finished frame.
    pub fn render(&mut self, decision: &DisplayDecision, brightness: &Brightness, cfg: &DisplayConfig) -> &Frame {
        // --- Phase 1: Phase bookkeeping ---
        let dt = match self.last_now {
            Some(prev) if !decision.entered => decision.now.saturating_duration_since(prev).as_secs_f64(),
            _ => 0.0,
        };
        if decision.entered {
            self.phases.reset();
        }
        self.last_now = Some(decision.now);
        self.frame.clear();
        if brightness.blank {
            return &self.frame;
        }

        // --- Phase 2: Mode renderer ---
        let local = decision.wall.with_timezone(&cfg.tz()).naive_local();
        let mut ctx = DrawContext {
            frame: &mut self.frame,
            phases: &mut self.phases,
            config: cfg,
            local,
            wall: decision.wall,
            now: decision.now,
            elapsed: decision.elapsed(),
            dt,
            speed_scale: brightness.speed_scale,
        };
        draw_mode(&decision.mode, &mut ctx);

        // --- Phase 3: Freshness marker, then dimming ---
        // The ticker shows staleness on its own status dot.
        if decision.stale && decision.key.kind != ModeKind::Ticker {
            self.frame.fill_rect(0, 0, 2, 2, palette::RED);
        }
        self.frame.apply_brightness(brightness.scale);
        &self.frame
    }
}

fn draw_mode(mode: &DisplayMode, ctx: &mut DrawContext<'_>) {
    use super::modes::{ClockFace, MaintenanceBanner, MessageBanner};
    match mode {
        DisplayMode::Clock => ClockFace.draw(ctx),
        DisplayMode::Message { text } => MessageBanner(text).draw(ctx),
        DisplayMode::Maintenance => MaintenanceBanner.draw(ctx),
        DisplayMode::ScoreAlert(view) => view.draw(ctx),
        DisplayMode::Preroll(preroll) => preroll.draw(ctx),
        DisplayMode::Scoreboard(view) => view.draw(ctx),
        DisplayMode::Ticker(view) => view.draw(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::arbiter::{ScoreboardView, TickerView};
    use crate::engine::{BrightnessSource, ModeKey};
    use crate::models::fixtures::market_one;
    use crate::models::MarketSession;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn full() -> Brightness {
        Brightness { scale: 1.0, blank: false, speed_scale: 1.0, source: BrightnessSource::Base }
    }

    fn decision(mode: DisplayMode, entered: bool, now: Instant, stale: bool) -> DisplayDecision {
        let kind = mode.kind();
        DisplayDecision {
            mode,
            key: ModeKey { kind, token: 0 },
            entered,
            entered_at: now,
            now,
            wall: Utc.with_ymd_and_hms(2025, 3, 12, 18, 20, 1).unwrap(),
            stale,
            full_brightness: false,
        }
    }

    fn ticker() -> DisplayMode {
        DisplayMode::Ticker(TickerView {
            market: Some(Arc::new(market_one("AAPL", 150.0, 1.2))),
            session: MarketSession::Regular,
            ..TickerView::default()
        })
    }

    #[test]
    fn scroll_is_continuous_until_a_transition() {
        let cfg = DisplayConfig::default();
        let mut c = Compositor::new(192, 16);
        let t0 = Instant::now();
        c.render(&decision(ticker(), true, t0, false), &full(), &cfg);
        assert_eq!(c.phases().lane(Lane::Primary).lead(), Some(192.0));
        c.render(&decision(ticker(), false, t0 + Duration::from_millis(500), false), &full(), &cfg);
        assert_eq!(c.phases().lane(Lane::Primary).lead(), Some(172.0));
        c.render(&decision(ticker(), false, t0 + Duration::from_millis(1_000), false), &full(), &cfg);
        assert_eq!(c.phases().lane(Lane::Primary).lead(), Some(152.0));
        // Re-entering the mode restarts from the right edge.
        c.render(&decision(ticker(), true, t0 + Duration::from_millis(1_500), false), &full(), &cfg);
        assert_eq!(c.phases().lane(Lane::Primary).lead(), Some(192.0));
    }

    #[test]
    fn positive_change_is_drawn_green() {
        let cfg = DisplayConfig::default();
        let mut c = Compositor::new(192, 16);
        let t0 = Instant::now();
        c.render(&decision(ticker(), true, t0, false), &full(), &cfg);
        let frame = c.render(&decision(ticker(), false, t0 + Duration::from_secs(4), false), &full(), &cfg);
        assert!(frame.contains_color(palette::GREEN));
        assert!(!frame.contains_color(palette::RED));
    }

    #[test]
    fn stale_marker_and_no_live_games() {
        let cfg = DisplayConfig::default();
        let mut c = Compositor::new(192, 16);
        let mode = DisplayMode::Scoreboard(ScoreboardView { game: None, forced: true, flash: None });
        let frame = c.render(&decision(mode, true, Instant::now(), true), &full(), &cfg);
        assert_eq!(frame.get(0, 0), Some(palette::RED));
        assert_eq!(frame.get(1, 1), Some(palette::RED));
        assert!(frame.contains_color(palette::GREY));
    }

    #[test]
    fn blank_and_dimmed_frames() {
        let cfg = DisplayConfig::default();
        let mut c = Compositor::new(64, 16);
        let off = Brightness { scale: 0.0, blank: true, speed_scale: 1.0, source: BrightnessSource::Off };
        assert_eq!(c.render(&decision(DisplayMode::Clock, true, Instant::now(), false), &off, &cfg).lit_count(), 0);

        let half = Brightness { scale: 0.5, ..full() };
        let frame = c.render(&decision(DisplayMode::Clock, true, Instant::now(), false), &half, &cfg);
        assert!(frame.lit_count() > 0);
        assert!(frame.to_rgb_bytes().iter().all(|b| *b <= 127));
    }
}

//! # Mode Renderers
//!
//! One [`DrawMode`] implementation per display mode. The line builders are plain
//! functions so their content can be checked without pixels.

use chrono::NaiveDateTime;

use super::compositor::{DrawContext, DrawMode, Lane, Row};
use super::format;
use super::palette::{self, GREY, PERIOD_GREY, WHITE, YELLOW};
use super::frame::Rgb;
use super::text::Line;
use crate::configs::{DisplayConfig, PrerollStyle};
use crate::engine::alerts::{AlertTimeline, Side};
use crate::engine::arbiter::{AlertView, ScoreboardView, TickerView};
use crate::engine::PrerollSpec;
use crate::markets::MarketEvent;
use crate::models::{Game, MarketSession};

const NO_DATA: &str = "Waiting... ";
const FALLBACK_DATE_FORMAT: &str = "%a %b %d";

// --- Ticker ---

/// Status dot: red when the market data is stale or absent, blue on a game day,
/// then the session colour.
pub fn status_dot(view: &TickerView) -> Rgb {
    if view.market.is_none() || view.market_stale {
        return palette::RED;
    }
    if view.game_today {
        return palette::BLUE;
    }
    match view.session {
        MarketSession::Pre => YELLOW,
        MarketSession::Regular => palette::GREEN,
        _ => GREY,
    }
}

/// Dot followed by the short clock, placed at the start of the ticker.
pub fn time_cell(view: &TickerView, cfg: &DisplayConfig, local: NaiveDateTime) -> Line {
    let mut line = Line::new();
    let time = format::clock_text(local.time(), cfg.clock.h24, false, cfg.clock.blink_colon);
    line.push_dot(status_dot(view)).push_text(format!("{}  ", time), palette::color(&cfg.clock.color));
    line
}

/// Appends one cell per symbol, or the no-data text. A held symbol shows the
/// market value of the position instead of its price.
pub fn quote_cells(line: &mut Line, view: &TickerView, symbols: &[String], cfg: &DisplayConfig) {
    let Some(market) = view.market.as_ref().filter(|_| !symbols.is_empty()) else {
        line.push_text(NO_DATA, GREY);
        return;
    };
    for sym in symbols {
        line.push_text(format!("{}:", cfg.market.label(sym)), WHITE);
        match market.quote(sym).and_then(|q| q.price.zip(q.change_pct)) {
            Some((price, pct)) => {
                let value = match cfg.market.held_shares(sym) {
                    Some(shares) => format::currency_compact(shares * price),
                    None => format::price_compact(price),
                };
                line.push_text(format!("{} {} ", value, format::pct(pct)), palette::change_color(pct));
            }
            None => {
                line.push_text("-- ", GREY);
            }
        }
    }
}

/// Ticker passes left on the market-open banner. Lives across mode changes;
/// the pass count it reads does not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenBannerPasses {
    serial: u64,
    left: u32,
    seen_wraps: u64,
}

impl OpenBannerPasses {
    /// Re-arms on a new `serial`, counts the passes completed since the last
    /// call and reports whether the current pass carries the banner.
    pub fn update(&mut self, serial: u64, wraps: u64, passes: u32) -> bool {
        if serial != self.serial {
            let left = if serial == 0 { 0 } else { passes };
            *self = Self { serial, left, seen_wraps: wraps };
        }
        // A mode transition restarts the lane at 0.
        let done = wraps.saturating_sub(self.seen_wraps);
        self.seen_wraps = wraps;
        self.left = self.left.saturating_sub(u32::try_from(done).unwrap_or(u32::MAX));
        self.left > 0
    }
}

/// Appends the market-open banner.
pub fn inject_market_open(line: &mut Line) {
    let event = MarketEvent::Open;
    line.push_text(format!("{}  ", event.announcement()), palette::color(event.color_name()));
}

/// Appends the weather headline while it is pinned, otherwise on passes
/// selected by its severity cadence.
pub fn inject_weather(line: &mut Line, view: &TickerView, wraps: u64, cfg: &DisplayConfig) {
    let Some(alert) = view.headline.as_ref() else {
        return;
    };
    let every = if alert.severity.is_warning() {
        cfg.weather.warning_every_n_scrolls
    } else {
        cfg.weather.advisory_every_n_scrolls
    };
    if view.headline_pinned || (every > 0 && wraps % every == 0) {
        let text = format::headline(&alert.headline, cfg.weather.max_title_chars);
        line.push_text(format!("  {}  ", text), palette::severity_color(alert.severity, &cfg.weather));
    }
}

/// Appends the configured message on every Nth pass.
pub fn inject_message(line: &mut Line, wraps: u64, cfg: &DisplayConfig) {
    let m = &cfg.message;
    if !m.text.trim().is_empty() && m.every_n_scrolls > 0 && wraps % m.every_n_scrolls == 0 {
        line.push_text(format!("  {}  ", m.text.trim()), palette::color(&m.color));
    }
}

impl TickerView {
    /// Time cell, then the market-open banner while it has passes left.
    fn lead_line(&self, ctx: &mut DrawContext<'_>) -> Line {
        let cfg = ctx.config;
        let wraps = ctx.phases.lane(Lane::Primary).wraps();
        let open = ctx.phases.open_banner.update(self.market_open, wraps, cfg.market.open_banner_passes);
        let mut line = time_cell(self, cfg, ctx.local);
        if open {
            inject_market_open(&mut line);
        }
        line
    }
}

impl DrawMode for TickerView {
    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let cfg = ctx.config;
        let m = &cfg.market;
        if ctx.dual() && !m.top.is_empty() && !m.bottom.is_empty() {
            let (top, bottom) = ctx.rows();

            let wraps = ctx.phases.lane(Lane::Primary).wraps();
            let mut line = self.lead_line(ctx);
            quote_cells(&mut line, self, &m.top, cfg);
            inject_weather(&mut line, self, wraps, cfg);
            ctx.scroll(Lane::Primary, &line, top, cfg.scroll.top_pps);

            let wraps = ctx.phases.lane(Lane::Secondary).wraps();
            let mut line = Line::new();
            quote_cells(&mut line, self, &m.bottom, cfg);
            inject_message(&mut line, wraps, cfg);
            ctx.scroll(Lane::Secondary, &line, bottom, cfg.scroll.bottom_pps);
        } else {
            let symbols: Vec<String> = m.top.iter().chain(&m.bottom).cloned().collect();
            let wraps = ctx.phases.lane(Lane::Primary).wraps();
            let mut line = self.lead_line(ctx);
            quote_cells(&mut line, self, &symbols, cfg);
            inject_weather(&mut line, self, wraps, cfg);
            inject_message(&mut line, wraps, cfg);
            let row = ctx.full();
            ctx.scroll(Lane::Primary, &line, row, cfg.scroll.single_pps);
        }
    }
}

// --- Scoreboard ---

/// Game clock then period, e.g. `12:34 P2`; just the period without a clock.
pub fn status_line(game: &Game) -> Line {
    let mut line = Line::new();
    let clock = game.clock.trim();
    if !clock.is_empty() {
        line.push_text(format!("{} ", clock), YELLOW);
    }
    line.push_text(game.period_label(), PERIOD_GREY);
    line
}

/// One-line summary, e.g. `TOR 1 - MTL 2  P2 12:34`, each side in its colour.
pub fn score_line(game: &Game, away: Rgb, home: Rgb) -> Line {
    let mut line = Line::new();
    line.push_text(format!("{} {}", game.away.code, game.away.score), away)
        .push_text(" - ", WHITE)
        .push_text(format!("{} {}", game.home.code, game.home.score), home)
        .push_text(format!("  {} {}", game.period_label(), game.clock).trim_end().to_string(), WHITE);
    line
}

impl ScoreboardView {
    /// Colours of the away and home scores: the flash colour on the side that
    /// scored, white otherwise.
    fn side_colors(&self, ctx: &DrawContext<'_>) -> (Rgb, Rgb) {
        let Some(flash) = &self.flash else {
            return (WHITE, WHITE);
        };
        let color = alert_color(ctx.config, ctx.now.saturating_duration_since(flash.started_at));
        match flash.side {
            Side::Away => (color, WHITE),
            Side::Home => (WHITE, color),
        }
    }

    fn draw_halves(&self, ctx: &mut DrawContext<'_>, game: &Game, top: Row) {
        let (away_color, home_color) = self.side_colors(ctx);
        let half = ctx.width() / 2;
        let away = Line::plain(format!("{} {}", game.away.code, game.away.score), away_color);
        let home = Line::plain(format!("{} {}", game.home.code, game.home.score), home_color);
        ctx.center_in(&away, 0, half, top, 1);
        ctx.center_in(&home, half, ctx.width() - half, top, 1);
    }
}

impl DrawMode for ScoreboardView {
    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let Some(game) = &self.game else {
            let row = ctx.full();
            ctx.center(&Line::plain("NO LIVE GAMES", GREY), row, 1);
            return;
        };
        if ctx.dual() {
            let (top, bottom) = ctx.rows();
            self.draw_halves(ctx, game, top);
            ctx.center(&status_line(game), bottom, 1);
        } else {
            let (away, home) = self.side_colors(ctx);
            let mut line = score_line(game, away, home);
            line.push_text("   ", WHITE);
            let row = ctx.full();
            let pps = ctx.config.scroll.single_pps;
            ctx.scroll(Lane::Primary, &line, row, pps);
        }
    }
}

// --- Score alert ---

/// Flash colour `elapsed` into a banner.
pub fn alert_color(cfg: &DisplayConfig, elapsed: std::time::Duration) -> Rgb {
    let timeline = AlertTimeline::from_config(&cfg.score_alerts);
    cfg.score_alerts
        .flash_colors
        .get(timeline.color_index(elapsed))
        .map_or(WHITE, |name| palette::color(name))
}

impl DrawMode for AlertView {
    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let elapsed = ctx.now.saturating_duration_since(self.started_at);
        let line = Line::plain(self.event.banner(), alert_color(ctx.config, elapsed));
        let row = ctx.full();
        let scale = ctx.scale_for(&line, row);
        ctx.center(&line, row, scale);
    }
}

// --- Preroll ---

fn big_time(ctx: &mut DrawContext<'_>, time: &str, color: Rgb) {
    let line = Line::plain(time, color);
    let row = ctx.full();
    let scale = ctx.scale_for(&line, row);
    ctx.center(&line, row, scale);
}

fn announce(ctx: &mut DrawContext<'_>, time: &str, color: Rgb, event: MarketEvent) {
    let event_color = palette::color(event.color_name());
    let pps = ctx.config.scroll.preroll_pps;
    if ctx.dual() {
        let (top, bottom) = ctx.rows();
        ctx.center(&Line::plain(time, color), top, 1);
        ctx.scroll_or_center(Lane::Primary, &Line::plain(event.announcement(), event_color), bottom, pps);
    } else {
        let mut line = Line::plain(format!("{}  ", time), color);
        line.push_text(format!("{}   ", event.announcement()), event_color);
        let row = ctx.full();
        ctx.scroll(Lane::Primary, &line, row, pps);
    }
}

impl DrawMode for PrerollSpec {
    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let cfg = ctx.config;
        let time = format::clock_from_config(ctx.local.time(), &cfg.clock, true);
        let color = palette::color(&cfg.preroll.color);
        if let Some(event) = self.trigger.market_event() {
            announce(ctx, &time, color, event);
            return;
        }
        match self.style {
            PrerollStyle::BigTime | PrerollStyle::MarketAnnounce => big_time(ctx, &time, color),
            PrerollStyle::Marquee => {
                let row = ctx.full();
                ctx.scroll(Lane::Primary, &Line::plain(format!("{}   ", time), color), row, cfg.scroll.preroll_pps);
            }
        }
    }
}

// --- Overrides ---

/// Date line per `fmt`, upper-cased. An unusable format falls back to `%a %b %d`.
pub fn date_text(local: NaiveDateTime, fmt: &str) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    if write!(out, "{}", local.format(fmt)).is_err() {
        out = local.format(FALLBACK_DATE_FORMAT).to_string();
    }
    out.to_uppercase()
}

/// The clock override.
#[derive(Debug, Clone, Copy)]
pub struct ClockFace;

impl DrawMode for ClockFace {
    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let config = ctx.config;
        let cfg = &config.clock;
        let time = Line::plain(format::clock_from_config(ctx.local.time(), cfg, true), palette::color(&cfg.color));
        if cfg.show_date && ctx.dual() {
            let (top, bottom) = ctx.rows();
            let date = Line::plain(date_text(ctx.local, &cfg.date_format), palette::color(&cfg.date_color));
            ctx.center(&time, top, 1);
            ctx.center(&date, bottom, 1);
        } else {
            let row = ctx.full();
            let scale = ctx.scale_for(&time, row);
            ctx.center(&time, row, scale);
        }
    }
}

/// Operator-supplied text.
#[derive(Debug, Clone, Copy)]
pub struct MessageBanner<'a>(pub &'a str);

impl DrawMode for MessageBanner<'_> {
    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let text = self.0.trim();
        let row = ctx.full();
        let pps = ctx.config.scroll.message_pps;
        let line = Line::plain(text, palette::MAGENTA);
        if line.visible_width(1) <= ctx.width() {
            ctx.center(&line, row, 1);
        } else {
            ctx.scroll(Lane::Primary, &Line::plain(format!("{}   ", text), palette::MAGENTA), row, pps);
        }
    }
}

/// The maintenance banner.
#[derive(Debug, Clone, Copy)]
pub struct MaintenanceBanner;

impl DrawMode for MaintenanceBanner {
    fn draw(&self, ctx: &mut DrawContext<'_>) {
        let config = ctx.config;
        let cfg = &config.maintenance;
        let color = palette::color(&cfg.color);
        let row = ctx.full();
        if cfg.scroll {
            let pps = config.scroll.maintenance_pps;
            ctx.scroll(Lane::Primary, &Line::plain(format!("{}   ", cfg.text), color), row, pps);
        } else {
            ctx.center(&Line::plain(cfg.text.as_str(), color), row, 1);
        }
    }
}

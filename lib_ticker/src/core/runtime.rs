//! # Display Runtime
//!
//! The render loop. One tick reads the current configuration, drains operator
//! commands, samples the snapshot bus, asks the arbiter for a decision, resolves
//! brightness, draws the frame and hands it to the sink.
//!
//! ## Core Design Principles:
//!
//! 1.  **Never Waits On I/O**: every input is read from a slot or a channel with
//!     `try_recv`; the only suspension point is the pacing sleep in [`DisplayRuntime::run`].
//! 2.  **Sink Failures Are Counted, Not Fatal**: a failed write is logged (at most
//!     once per second), recorded in the status surface, and retried on the next tick.
//! 3.  **Commands Between Ticks**: control commands arrive over an `mpsc` channel
//!     with a `oneshot` acknowledgement and are applied at the start of a tick.

use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::snapshot::SnapshotBus;
use super::status::{DecisionSummary, RenderStatus, StatusBoard};
use crate::configs::{ConfigStore, DisplayConfig};
use crate::engine::{brightness_at, Arbiter, ControlCommand, ControlError, DisplayDecision, TickInput};
use crate::output::{effective_fps, FramePacer, FrameSink, FrameStats};
use crate::render::Compositor;

const CONTROL_QUEUE: usize = 16;
const SINK_WARN_EVERY: Duration = Duration::from_secs(1);

type ControlMsg = (ControlCommand, oneshot::Sender<Result<(), ControlError>>);

/// Sending side of the control channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: mpsc::Sender<ControlMsg>,
}

impl ControlHandle {
    /// Queues `cmd` and waits until the next tick has applied or rejected it.
    pub async fn send(&self, cmd: ControlCommand) -> Result<(), ControlError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx.send((cmd, ack_tx)).await.map_err(|_| ControlError::Closed)?;
        ack_rx.await.map_err(|_| ControlError::Closed)?
    }

    /// Parses one line of the command grammar and sends it.
    pub async fn send_line(&self, line: &str) -> Result<(), ControlError> {
        let cmd = ControlCommand::from_str(line)?;
        self.send(cmd).await
    }
}

/// # Display Runtime
///
/// Owns everything the render loop mutates. The shared pieces (bus, health,
/// config, status) are behind `Arc`s and only read here, apart from the
/// status board which the loop writes after every tick.
pub struct DisplayRuntime<S: FrameSink> {
    config: Arc<ConfigStore>,
    bus: Arc<SnapshotBus>,
    status: Arc<StatusBoard>,
    arbiter: Arbiter,
    compositor: Compositor,
    pacer: FramePacer,
    stats: FrameStats,
    sink: S,
    control: mpsc::Receiver<ControlMsg>,
    last_sink_warn: Option<Instant>,
    last_sink_error: Option<String>,
}

impl<S: FrameSink> DisplayRuntime<S> {
    /// Runtime drawing into `sink`. The frame size is fixed here from the panel
    /// section of the current configuration.
    pub fn new(
        config: Arc<ConfigStore>,
        bus: Arc<SnapshotBus>,
        status: Arc<StatusBoard>,
        sink: S,
    ) -> (Self, ControlHandle) {
        let cfg = config.current();
        let (tx, rx) = mpsc::channel(CONTROL_QUEUE);
        let fps = effective_fps(cfg.panel.fps, sink.max_fps());
        log::info!(
            "Display runtime: {}x{} panel, {} fps, sink '{}'",
            cfg.panel.width,
            cfg.panel.height,
            fps,
            sink.name()
        );
        let runtime = Self {
            compositor: Compositor::new(cfg.panel.width, cfg.panel.height),
            pacer: FramePacer::new(fps),
            stats: FrameStats { fps, ..FrameStats::default() },
            arbiter: Arbiter::new(),
            config,
            bus,
            status,
            sink,
            control: rx,
            last_sink_warn: None,
            last_sink_error: None,
        };
        (runtime, ControlHandle { tx })
    }

    /// The sink, for inspection.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Frame counters so far.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// # Tick
    ///
    /// Produces and writes exactly one frame for `now` / `wall` and accounts it
    /// before publishing the status. Never blocks.
    pub fn tick(&mut self, now: Instant, wall: DateTime<Utc>) -> DisplayDecision {
        let work = Instant::now();

        // --- Phase 1: Inputs ---
        let cfg = self.config.current();
        self.drain_control(now, wall, &cfg);
        let sample = self.bus.sample();

        // --- Phase 2: Decide ---
        let decision = self.arbiter.decide(&TickInput { now, wall, config: &cfg, sample: &sample });
        let local = wall.with_timezone(&cfg.tz()).time();
        let brightness = brightness_at(local, &cfg.brightness, decision.full_brightness);

        // --- Phase 3: Draw and write ---
        let frame = self.compositor.render(&decision, &brightness, &cfg);
        match self.sink.write(frame) {
            Ok(()) => {
                if self.last_sink_warn.take().is_some() {
                    log::info!("Sink '{}' recovered", self.sink.name());
                }
            }
            Err(e) => {
                self.stats.sink_errors += 1;
                let due = self.last_sink_warn.map_or(true, |at| now.saturating_duration_since(at) >= SINK_WARN_EVERY);
                if due {
                    log::warn!("Sink '{}' write failed ({} total): {}", self.sink.name(), self.stats.sink_errors, e);
                    self.last_sink_warn = Some(now);
                }
                self.last_sink_error = Some(e.to_string());
            }
        }

        // --- Phase 4: Account and publish ---
        self.stats.record(work.elapsed());
        self.stats.dropped = self.pacer.dropped();
        self.status.set_render(RenderStatus {
            decision: Some(DecisionSummary::of(&decision)),
            brightness: Some(brightness),
            frames: self.stats,
            active_override: self.arbiter.active_override(now),
            pending_alerts: self.arbiter.pending_alerts(now),
            last_sink_error: self.last_sink_error.clone(),
        });
        decision
    }

    fn drain_control(&mut self, now: Instant, wall: DateTime<Utc>, cfg: &DisplayConfig) {
        while let Ok((cmd, ack)) = self.control.try_recv() {
            let label = format!("{:?}", cmd);
            let result = self.arbiter.apply(cmd, now, wall, cfg);
            match &result {
                Ok(()) => log::debug!("Control command applied: {}", label),
                Err(e) => log::warn!("Override rejected: {} ({})", label, e),
            }
            // The sender may have given up waiting.
            let _ = ack.send(result);
        }
    }

    /// # Run
    ///
    /// Ticks until `cancel` fires, pacing with the [`FramePacer`]. The rate is
    /// re-read from the configuration every tick so a reload takes effect at once.
    pub async fn run(mut self, cancel: CancellationToken) -> Self {
        log::info!("Render loop started");
        loop {
            // Tokio's clock, so a paused test runtime paces consistently.
            let started = tokio::time::Instant::now().into_std();
            self.tick(started, Utc::now());
            let done = tokio::time::Instant::now().into_std();

            let fps = effective_fps(self.config.current().panel.fps, self.sink.max_fps());
            self.pacer.set_fps(fps);
            self.stats.fps = fps;
            let deadline = self.pacer.next_deadline(done);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {}
            }
        }
        log::info!("Render loop stopped after {} frames ({} dropped)", self.stats.frames, self.pacer.dropped());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BrightnessSource, ModeKind, OverrideMode, OverrideRequest};
    use chrono::TimeZone;
    use crate::models::fixtures::market_one;
    use crate::models::Payload;
    use crate::output::MemorySink;

    type Parts = (DisplayRuntime<MemorySink>, ControlHandle, Arc<StatusBoard>, Arc<SnapshotBus>);

    fn runtime() -> Parts {
        runtime_with(DisplayConfig::default())
    }

    fn runtime_with(mut cfg: DisplayConfig) -> Parts {
        // Prerolls off so the wall clock cannot change the expected mode.
        cfg.preroll.enabled = false;
        let config = Arc::new(ConfigStore::new(cfg));
        let bus = Arc::new(SnapshotBus::new());
        let status = Arc::new(StatusBoard::new());
        let sink = MemorySink::new(192, 16);
        let (rt, handle) = DisplayRuntime::new(config, Arc::clone(&bus), Arc::clone(&status), sink);
        (rt, handle, status, bus)
    }

    #[test]
    fn tick_writes_a_frame_and_publishes_status() {
        let (mut rt, _handle, status, bus) = runtime();
        bus.publish(Payload::Market(market_one("AAPL", 150.0, 1.2)));
        let sink = rt.sink().handle();

        let d = rt.tick(Instant::now(), Utc::now());
        assert_eq!(d.key.kind, ModeKind::Ticker);
        assert_eq!(sink.frames(), 1);
        assert!(sink.last_frame().unwrap().lit_count() > 0);
        let render = status.render();
        assert_eq!(render.decision.unwrap().mode, ModeKind::Ticker);
        assert!(render.brightness.is_some());
        assert_eq!(render.frames.frames, 1);
        assert_eq!(render.frames.frames, rt.stats().frames);
    }

    #[tokio::test]
    async fn full_brightness_lasts_exactly_its_duration_over_night_mode() {
        let mut cfg = DisplayConfig::default();
        cfg.panel.timezone = "UTC".to_string();
        cfg.brightness.night.enabled = true;
        cfg.brightness.night.start = "11:00".to_string();
        cfg.brightness.night.end = "13:00".to_string();
        cfg.brightness.night.dim_pct = 30;
        let (max, night) = (cfg.brightness.max, 0.3);
        let (mut rt, handle, status, _bus) = runtime_with(cfg);
        let wall = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).single().unwrap();
        let t0 = Instant::now();

        let ack = tokio::spawn(async move { handle.send_line("bright 10s").await });
        tokio::task::yield_now().await;
        rt.tick(t0, wall);
        ack.await.unwrap().unwrap();
        assert_eq!(status.render().brightness.unwrap().scale, max);

        rt.tick(t0 + Duration::from_millis(9_999), wall + chrono::Duration::milliseconds(9_999));
        let b = status.render().brightness.unwrap();
        assert_eq!((b.scale, b.source), (max, BrightnessSource::Override));

        rt.tick(t0 + Duration::from_secs(10), wall + chrono::Duration::seconds(10));
        let b = status.render().brightness.unwrap();
        assert_eq!(b.source, BrightnessSource::Night);
        assert!((b.scale - night).abs() < 1e-9);
        assert!(status.render().active_override.is_none());
    }

    #[tokio::test]
    async fn control_command_switches_mode_on_next_tick() {
        let (mut rt, handle, status, _bus) = runtime();
        let ack = tokio::spawn(async move { handle.send_line("clock 10m").await });
        tokio::task::yield_now().await;

        let d = rt.tick(Instant::now(), Utc::now());
        assert_eq!(d.key.kind, ModeKind::Clock);
        ack.await.unwrap().unwrap();
        let active = status.render().active_override.unwrap();
        assert_eq!(active.mode, OverrideMode::Clock);
    }

    #[tokio::test]
    async fn rejected_command_is_acknowledged_with_its_error() {
        let (mut rt, handle, _status, _bus) = runtime();
        let req = OverrideRequest::new(OverrideMode::Clock).for_duration(Duration::from_secs(48 * 3_600));
        let ack = tokio::spawn(async move { handle.send(ControlCommand::Apply(req)).await });
        tokio::task::yield_now().await;

        let d = rt.tick(Instant::now(), Utc::now());
        assert_eq!(d.key.kind, ModeKind::Ticker);
        assert!(matches!(ack.await.unwrap(), Err(ControlError::InvalidDuration(_))));
    }

    #[tokio::test]
    async fn parse_errors_never_reach_the_loop() {
        let (_rt, handle, _status, _bus) = runtime();
        assert!(matches!(handle.send_line("disco").await, Err(ControlError::UnknownMode(_))));
    }

    #[tokio::test]
    async fn send_fails_once_the_runtime_is_gone() {
        let (rt, handle, _status, _bus) = runtime();
        drop(rt);
        assert_eq!(handle.send(ControlCommand::Clear).await, Err(ControlError::Closed));
    }

    #[test]
    fn closed_sink_is_counted_and_ticks_continue() {
        let (mut rt, _handle, status, _bus) = runtime();
        let sink = rt.sink().handle();
        sink.set_closed(true);
        let t0 = Instant::now();
        for i in 0..3 {
            rt.tick(t0 + Duration::from_millis(i * 16), Utc::now());
        }
        assert_eq!(rt.stats().sink_errors, 3);
        assert!(status.render().last_sink_error.unwrap().contains("closed"));

        sink.set_closed(false);
        rt.tick(t0 + Duration::from_millis(64), Utc::now());
        assert_eq!(sink.frames(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_on_cancel() {
        let (rt, _handle, _status, _bus) = runtime();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(rt.run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        let rt = task.await.unwrap();
        assert!(rt.stats().frames >= 1);
    }
}

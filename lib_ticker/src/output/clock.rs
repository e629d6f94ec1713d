//! # Frame Clock
//!
//! Paces ticks at a bounded rate. A frame is always rendered for "now": when
//! work overruns, the schedule skips ahead and counts the frames it dropped
//! instead of bursting to catch up.

use serde::Serialize;
use std::time::{Duration, Instant};

/// `min(config, sink)` clamped to at least 1.
pub fn effective_fps(config_fps: u32, sink_max: Option<u32>) -> u32 {
    sink_max.map_or(config_fps, |m| config_fps.min(m)).max(1)
}

/// Deadline arithmetic for the render loop.
#[derive(Debug, Clone)]
pub struct FramePacer {
    budget: Duration,
    deadline: Option<Instant>,
    dropped: u64,
}

impl FramePacer {
    /// Pacer at `fps` frames per second.
    pub fn new(fps: u32) -> Self {
        Self { budget: Self::budget_for(fps), deadline: None, dropped: 0 }
    }

    fn budget_for(fps: u32) -> Duration {
        Duration::from_secs(1) / fps.max(1)
    }

    /// Time allotted to one frame.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Changes the rate; the next deadline uses the new budget.
    pub fn set_fps(&mut self, fps: u32) {
        let budget = Self::budget_for(fps);
        if budget != self.budget {
            log::info!("Frame rate set to {} fps", fps.max(1));
            self.budget = budget;
        }
    }

    /// Frames skipped since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// # Next Deadline
    ///
    /// Called when a frame's work finished at `now`. Returns the instant to sleep
    /// until. The deadline advances by one budget; if `now` is already a full
    /// budget past it, the schedule is re-anchored to `now + budget` and the
    /// skipped frames are counted as dropped.
    pub fn next_deadline(&mut self, now: Instant) -> Instant {
        let candidate = match self.deadline {
            Some(prev) => prev + self.budget,
            None => now + self.budget,
        };
        let next = match now.checked_duration_since(candidate) {
            Some(late) if late >= self.budget => {
                let missed = (late.as_nanos() / self.budget.as_nanos().max(1)) as u64;
                self.dropped += missed;
                log::debug!("Frame overrun by {:?}, dropped {} frame(s)", late, missed);
                now + self.budget
            }
            _ => candidate,
        };
        self.deadline = Some(next);
        next
    }
}

/// Render loop counters for the status surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    /// Frames rendered.
    pub frames: u64,
    /// Frames skipped by the pacer.
    pub dropped: u64,
    /// Failed sink writes.
    pub sink_errors: u64,
    /// Moving average of per-frame work, milliseconds.
    pub avg_work_ms: f64,
    /// Work of the last frame, milliseconds.
    pub last_work_ms: f64,
    /// Current target rate.
    pub fps: u32,
}

impl FrameStats {
    const ALPHA: f64 = 0.1;

    /// Accounts one rendered frame that took `work`.
    pub fn record(&mut self, work: Duration) {
        let ms = work.as_secs_f64() * 1_000.0;
        self.avg_work_ms = if self.frames == 0 { ms } else { self.avg_work_ms + Self::ALPHA * (ms - self.avg_work_ms) };
        self.last_work_ms = ms;
        self.frames += 1;
    }
}

//! # Status Surface
//!
//! A point-in-time report of the engine for external tooling: per-domain health,
//! the current decision, brightness, frame statistics, the active override,
//! pending alerts and the configuration reload state.
//!
//! The render loop only ever writes a small [`RenderStatus`] under a mutex;
//! everything else is read when a report is built.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use thiserror::Error;

use super::health::{HealthBoard, HealthReport};
use super::snapshot::{Domain, SnapshotBus};
use crate::configs::{ConfigStatus, ConfigStore};
use crate::engine::alerts::ScoreEventView;
use crate::engine::overrides::OverrideView;
use crate::engine::{Brightness, DisplayDecision, ModeKind};
use crate::output::FrameStats;

/// Failure to write the status file.
#[derive(Debug, Error)]
pub enum StatusError {
    /// Filesystem error.
    #[error("status I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("status serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Summary of the last decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSummary {
    /// Mode.
    pub mode: ModeKind,
    /// Mode instance token.
    pub token: u64,
    /// When the mode was entered.
    pub entered_at: DateTime<Utc>,
    /// The data behind the mode is stale.
    pub stale: bool,
    /// Full-brightness override in force.
    pub full_brightness: bool,
}

impl DecisionSummary {
    /// Summary of `d`.
    pub fn of(d: &DisplayDecision) -> Self {
        let since = chrono::Duration::from_std(d.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            mode: d.key.kind,
            token: d.key.token,
            entered_at: d.wall - since,
            stale: d.stale,
            full_brightness: d.full_brightness,
        }
    }
}

/// What the render loop publishes after every tick.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStatus {
    /// Last decision.
    pub decision: Option<DecisionSummary>,
    /// Last brightness.
    pub brightness: Option<Brightness>,
    /// Frame counters.
    pub frames: FrameStats,
    /// Active override.
    pub active_override: Option<OverrideView>,
    /// Alerts waiting for the banner.
    pub pending_alerts: Vec<ScoreEventView>,
    /// Last sink failure.
    pub last_sink_error: Option<String>,
}

/// Complete status document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Report time.
    pub generated_at: DateTime<Utc>,
    /// Health per domain, in domain order.
    pub domains: Vec<HealthReport>,
    /// Render loop state.
    pub render: RenderStatus,
    /// Configuration reload state.
    pub config: ConfigStatus,
}

impl StatusReport {
    /// One-line summary for logs.
    pub fn summary_line(&self) -> String {
        let mode = self.render.decision.as_ref().map_or("none".to_string(), |d| d.mode.to_string());
        let domains: Vec<String> = self
            .domains
            .iter()
            .map(|h| format!("{}={}", h.domain, h.status.as_str()))
            .collect();
        format!(
            "mode={} {} frames={} dropped={} sinkErrors={}",
            mode,
            domains.join(" "),
            self.render.frames.frames,
            self.render.frames.dropped,
            self.render.frames.sink_errors
        )
    }
}

/// Shared holder of the render status.
#[derive(Debug, Default)]
pub struct StatusBoard {
    render: Mutex<RenderStatus>,
}

impl StatusBoard {
    /// Empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the render status.
    pub fn set_render(&self, status: RenderStatus) {
        *self.render.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    /// Copy of the render status.
    pub fn render(&self) -> RenderStatus {
        self.render.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// # Build Report
    ///
    /// Health statuses are derived here, at read time, from each snapshot's age.
    pub fn report(&self, bus: &SnapshotBus, health: &HealthBoard, config: &ConfigStore, now: Instant) -> StatusReport {
        let cfg = config.current();
        let domains = Domain::ALL
            .iter()
            .map(|&d| {
                let age = bus.captured_at(d).map(|at| now.saturating_duration_since(at));
                health.domain(d).report(d, age, cfg.stale_threshold(d))
            })
            .collect();
        StatusReport { generated_at: Utc::now(), domains, render: self.render(), config: config.status() }
    }
}

/// Writes `report` as pretty JSON to `path` through a temporary file and a rename.
pub fn write_status_file(path: &Path, report: &StatusReport) -> Result<(), StatusError> {
    let json = serde_json::to_vec_pretty(report)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| StatusError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::DisplayConfig;
    use crate::models::fixtures::{live_mtl, market_one};
    use crate::models::Payload;
    use std::time::Duration;

    #[test]
    fn report_derives_health_from_snapshot_age() {
        let bus = SnapshotBus::new();
        let health = HealthBoard::new();
        let config = ConfigStore::new(DisplayConfig::default());
        let board = StatusBoard::new();
        let t0 = Instant::now();
        bus.market.publish_at(market_one("AAPL", 1.0, 0.0), t0, Utc::now());
        bus.sports.publish_at(live_mtl(1, 0), t0 + Duration::from_secs(190), Utc::now());
        health.domain(Domain::Weather).record_failure(Utc::now(), "timeout");
        health.domain(Domain::Sports).record_failure(Utc::now(), "timeout");

        let r = board.report(&bus, &health, &config, t0 + Duration::from_secs(200));
        let status: Vec<&str> = r.domains.iter().map(|h| h.status.as_str()).collect();
        assert_eq!(status, vec!["stale", "no_data", "error"]);
        assert_eq!(r.domains[0].age_seconds, Some(200));
        assert!(r.summary_line().starts_with("mode=none market=stale"));
    }

    #[test]
    fn status_file_is_replaced_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status").join("ticker.json");
        let bus = SnapshotBus::new();
        bus.publish(Payload::Market(market_one("AAPL", 1.0, 0.0)));
        let board = StatusBoard::new();
        board.set_render(RenderStatus { last_sink_error: Some("closed".into()), ..RenderStatus::default() });
        let config = ConfigStore::new(DisplayConfig::default());
        let report = board.report(&bus, &HealthBoard::new(), &config, Instant::now());

        write_status_file(&path, &report).unwrap();
        write_status_file(&path, &report).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(v["render"]["lastSinkError"], "closed");
        assert_eq!(v["domains"][0]["domain"], "market");
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}

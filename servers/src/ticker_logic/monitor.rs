use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use lib_ticker::configs::ReloadOutcome;
use lib_ticker::core::write_status_file;
use lib_ticker::{ConfigStore, HealthBoard, SnapshotBus, StatusBoard};

/// Everything a status report is built from.
#[derive(Clone)]
pub struct StatusSources {
    pub bus: Arc<SnapshotBus>,
    pub health: Arc<HealthBoard>,
    pub config: Arc<ConfigStore>,
    pub board: Arc<StatusBoard>,
}

impl StatusSources {
    /// Builds a report and writes it to `path`, logging the summary at debug.
    pub fn write(&self, path: &Path) {
        let report = self.board.report(&self.bus, &self.health, &self.config, Instant::now());
        log::debug!("Status: {}", report.summary_line());
        if let Err(e) = write_status_file(path, &report) {
            log::warn!("Failed to write status file {}: {}", path.display(), e);
        }
    }
}

/// Writes the status report every `every` until cancelled.
pub async fn run_status(sources: StatusSources, path: PathBuf, every: Duration, cancel: CancellationToken) {
    let mut check_interval = interval(every);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("Status writer received shutdown signal.");
                break;
            }
            _ = check_interval.tick() => sources.write(&path),
        }
    }
}

/// Checks the display document every `every` and swaps it in when it changed
/// and validates. A rejected document leaves the running one in place.
pub async fn run_reload(config: Arc<ConfigStore>, every: Duration, cancel: CancellationToken) {
    let mut check_interval = interval(every);
    let panel = panel_size(&config);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("Config watcher received shutdown signal.");
                break;
            }
            _ = check_interval.tick() => match config.maybe_reload().await {
                Ok(ReloadOutcome::Unchanged) => {}
                Ok(ReloadOutcome::Applied { generation }) => {
                    log::info!("Display config reloaded (generation {})", generation);
                    if panel_size(&config) != panel {
                        log::warn!("Panel size changed to {:?}; the frame size only changes on restart", panel_size(&config));
                    }
                }
                Err(e) => log::warn!("Display config reload rejected, keeping the previous one: {}", e),
            },
        }
    }
}

fn panel_size(config: &ConfigStore) -> (u32, u32) {
    let cfg = config.current();
    (cfg.panel.width, cfg.panel.height)
}

use clap::Parser;
use lib_ticker::{ConfigStore, DisplayConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "LED matrix ticker display server", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "TICKER_SETTINGS", help = "Path to the JSON process settings file.")]
    pub settings_path: Option<PathBuf>,

    #[clap(long, env = "TICKER_CONFIG_PATH", help = "Path to the JSON5 display document (hot-reloaded).")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "TICKER_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "TICKER_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "TICKER_LOG_KEEP", help = "Number of log files to keep, including the new one.")]
    pub log_keep: Option<usize>,

    #[clap(long, env = "TICKER_STATUS_PATH", help = "Where the JSON status report is written.")]
    pub status_path: Option<PathBuf>,

    #[clap(long, env = "TICKER_STATUS_INTERVAL_SECONDS", help = "Seconds between status reports.")]
    pub status_interval_seconds: Option<u64>,

    #[clap(long, env = "TICKER_RELOAD_CHECK_SECONDS", help = "Seconds between checks of the display document for changes.")]
    pub reload_check_seconds: Option<u64>,

    #[clap(long, env = "TICKER_PREVIEW_PATH", help = "Write a PPM preview of the panel to this path.")]
    pub preview_path: Option<PathBuf>,

    #[clap(long, env = "TICKER_PREVIEW_EVERY_FRAMES", help = "Refresh the PPM preview every N frames.")]
    pub preview_every_frames: Option<u64>,

    #[clap(long, env = "TICKER_DEMO", num_args = 0..=1, default_missing_value = "true", help = "Use synthetic feeds.")]
    pub demo: Option<bool>,

    #[clap(long, env = "TICKER_DEMO_ALERT", num_args = 0..=1, default_missing_value = "true", help = "Demo weather feed reports a standing warning.")]
    pub demo_alert: Option<bool>,

    #[clap(long, env = "TICKER_MARKET_URL", help = "HTTP JSON endpoint for market snapshots.")]
    pub market_url: Option<String>,

    #[clap(long, env = "TICKER_WEATHER_URL", help = "HTTP JSON endpoint for weather snapshots.")]
    pub weather_url: Option<String>,

    #[clap(long, env = "TICKER_SPORTS_URL", help = "HTTP JSON endpoint for sports snapshots.")]
    pub sports_url: Option<String>,

    #[clap(long, env = "TICKER_FEED_TOKEN", help = "Bearer token sent to the HTTP feeds.")]
    pub feed_token: Option<String>,

    #[clap(long, env = "TICKER_MARKET_FILE", help = "JSON/JSON5 file holding a market snapshot.")]
    pub market_file: Option<PathBuf>,

    #[clap(long, env = "TICKER_WEATHER_FILE", help = "JSON/JSON5 file holding a weather snapshot.")]
    pub weather_file: Option<PathBuf>,

    #[clap(long, env = "TICKER_SPORTS_FILE", help = "JSON/JSON5 file holding a sports snapshot.")]
    pub sports_file: Option<PathBuf>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            settings_path: other.settings_path.or(self.settings_path),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            log_keep: other.log_keep.or(self.log_keep),
            status_path: other.status_path.or(self.status_path),
            status_interval_seconds: other.status_interval_seconds.or(self.status_interval_seconds),
            reload_check_seconds: other.reload_check_seconds.or(self.reload_check_seconds),
            preview_path: other.preview_path.or(self.preview_path),
            preview_every_frames: other.preview_every_frames.or(self.preview_every_frames),
            demo: other.demo.or(self.demo),
            demo_alert: other.demo_alert.or(self.demo_alert),
            market_url: other.market_url.or(self.market_url),
            weather_url: other.weather_url.or(self.weather_url),
            sports_url: other.sports_url.or(self.sports_url),
            feed_token: other.feed_token.or(self.feed_token),
            market_file: other.market_file.or(self.market_file),
            weather_file: other.weather_file.or(self.weather_file),
            sports_file: other.sports_file.or(self.sports_file),
        }
    }

    fn defaults() -> Config {
        Config {
            config_path: Some(PathBuf::from("ticker.json5")),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            log_keep: Some(1),
            status_path: Some(PathBuf::from("./status/server_ticker.json")),
            status_interval_seconds: Some(10),
            reload_check_seconds: Some(5),
            preview_every_frames: Some(30),
            demo: Some(false),
            demo_alert: Some(false),
            ..Default::default()
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn log_keep(&self) -> usize {
        self.log_keep.unwrap_or(1)
    }

    pub fn status_interval_seconds(&self) -> u64 {
        self.status_interval_seconds.unwrap_or(10).max(1)
    }

    pub fn reload_check_seconds(&self) -> u64 {
        self.reload_check_seconds.unwrap_or(5).max(1)
    }

    pub fn preview_every_frames(&self) -> u64 {
        self.preview_every_frames.unwrap_or(30).max(1)
    }

    pub fn demo(&self) -> bool {
        self.demo.unwrap_or(false)
    }

    pub fn demo_alert(&self) -> bool {
        self.demo_alert.unwrap_or(false)
    }
}

/// Applies the settings file named by `cli` (or `server_ticker.conf`) over the
/// defaults, then `cli` over that.
pub fn resolve(cli: Config) -> Config {
    // 1. Load defaults
    let mut current_config = Config::defaults();

    // 2. Load from the settings file if present.
    let settings_path = cli.settings_path.clone().unwrap_or_else(|| PathBuf::from("server_ticker.conf"));
    if settings_path.exists() {
        match fs::read_to_string(&settings_path) {
            Ok(config_str) => match serde_json::from_str::<Config>(&config_str) {
                Ok(file_config) => current_config = current_config.merge(file_config),
                Err(e) => log::warn!(
                    "Failed to parse settings file {}: {}. Falling back to other sources.",
                    settings_path.display(),
                    e
                ),
            },
            Err(e) => log::warn!("Failed to read settings file {}: {}", settings_path.display(), e),
        }
    } else {
        log::info!("Settings file not found at {}. Using defaults and environment/CLI variables.", settings_path.display());
    }

    // 3. Override with environment variables and CLI arguments
    current_config.merge(cli)
}

pub fn load_config() -> Config {
    // clap::Parser handles env vars and CLI args together.
    resolve(Config::parse())
}

/// The display document store. A missing file starts from the built-in
/// defaults and is picked up once it appears; a present but invalid file is an error.
pub fn load_display(config: &Config) -> anyhow::Result<ConfigStore> {
    let Some(path) = config.config_path.as_deref() else {
        return Ok(ConfigStore::new(DisplayConfig::default()));
    };
    open_display(path)
}

fn open_display(path: &Path) -> anyhow::Result<ConfigStore> {
    if path.exists() {
        let store = ConfigStore::load(path)
            .map_err(|e| anyhow::anyhow!("display config {} rejected: {}", path.display(), e))?;
        log::info!("Display config loaded from {}", path.display());
        Ok(store)
    } else {
        log::warn!("Display config {} not found, using defaults until it appears", path.display());
        Ok(ConfigStore::watching(DisplayConfig::default(), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_settings_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("server_ticker.conf");
        fs::write(&settings, r#"{ "logLevel": "debug", "statusIntervalSeconds": 30, "demo": true }"#).unwrap();

        let cli = Config { settings_path: Some(settings), status_interval_seconds: Some(2), ..Default::default() };
        let cfg = resolve(cli);
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.status_interval_seconds(), 2);
        assert!(cfg.demo());
        assert_eq!(cfg.log_keep(), 1);
    }

    #[test]
    fn bad_settings_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("broken.conf");
        fs::write(&settings, "{ not json").unwrap();
        let cfg = resolve(Config { settings_path: Some(settings), ..Default::default() });
        assert_eq!(cfg.log_level(), "info");
        assert_eq!(cfg.config_path, Some(PathBuf::from("ticker.json5")));
    }

    #[test]
    fn missing_display_file_starts_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_display(&dir.path().join("ticker.json5")).unwrap();
        assert_eq!(*store.current(), DisplayConfig::default());

        let bad = dir.path().join("bad.json5");
        fs::write(&bad, "{ panel: { fps: 0 } }").unwrap();
        assert!(open_display(&bad).is_err());
    }
}

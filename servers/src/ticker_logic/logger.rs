use anyhow::Result;
use lib_ticker::loggers::{colored_level, log_file_name, parse_level_filter, rotate_logs};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "server_ticker";

/// Installs the process logger: coloured lines on stdout and plain lines in a
/// fresh timestamped file. Returns the path of that file.
pub fn setup_logging(log_dir: &Path, log_level: &str, keep: usize) -> Result<PathBuf> {
    let log_dir = usable_log_dir(log_dir)?;

    // Make room for the file about to be opened.
    rotate_logs(APP_NAME, &log_dir, keep.saturating_sub(1));

    let log_path = log_dir.join(log_file_name(APP_NAME, chrono::Local::now()));
    let level = parse_level_filter(log_level);

    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                colored_level(record.level()),
                message
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .chain(fern::log_file(&log_path)?);

    fern::Dispatch::new()
        .level(level)
        .level_for("reqwest", log::LevelFilter::Warn)
        .level_for("hyper_util", log::LevelFilter::Warn)
        .chain(console)
        .chain(file)
        .apply()?;

    Ok(log_path)
}

/// `log_dir` if it can be created, else `<data_dir>/ticker/logs`.
fn usable_log_dir(log_dir: &Path) -> Result<PathBuf> {
    match fs::create_dir_all(log_dir) {
        Ok(()) => Ok(log_dir.to_path_buf()),
        Err(e) => {
            let fallback = dirs::data_dir()
                .map(|d| d.join("ticker").join("logs"))
                .ok_or_else(|| anyhow::anyhow!("cannot create {}: {} (and no data dir)", log_dir.display(), e))?;
            eprintln!("Cannot create log dir {}: {}. Using {}", log_dir.display(), e, fallback.display());
            fs::create_dir_all(&fallback)?;
            Ok(fallback)
        }
    }
}

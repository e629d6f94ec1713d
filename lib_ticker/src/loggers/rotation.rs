use chrono::{DateTime, Local};
use glob::glob;
use std::path::{Path, PathBuf};

/// Name of the log file `app_name` opens at `at`: `<app>_<YYYYmmdd_HHMMSS>.log`.
///
/// The stamp sorts lexically in time order, which [`rotate_logs`] relies on.
pub fn log_file_name(app_name: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.log", app_name, at.format("%Y%m%d_%H%M%S"))
}

/// # Rotate Logs
///
/// Keeps only the newest `keep` log files of `app_name` in `log_dir`, judged by
/// file name, and deletes the rest. Run it before opening the new file.
///
/// Deletion failures are reported on stderr and never abort startup. Returns
/// the number of files removed.
pub fn rotate_logs(app_name: &str, log_dir: &Path, keep: usize) -> usize {
    let pattern = format!("{}/{}_*.log", log_dir.display(), app_name);
    let entries = match glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Invalid log rotation pattern {}: {}", pattern, e);
            return 0;
        }
    };
    let mut log_files: Vec<PathBuf> = entries.filter_map(Result::ok).collect();

    // Newest first.
    log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let mut removed = 0;
    for old_file in log_files.iter().skip(keep) {
        match std::fs::remove_file(old_file) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Error deleting old log file {}: {}", old_file.display(), e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    #[test]
    fn file_names_carry_a_sortable_stamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(log_file_name("server_ticker", at), "server_ticker_20240309_070501.log");
    }

    #[test]
    fn keeps_only_the_newest_files_of_the_app() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "server_ticker_20240101_000000.log",
            "server_ticker_20240301_000000.log",
            "server_ticker_20240201_000000.log",
            "other_20230101_000000.log",
            "server_ticker.conf",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        assert_eq!(rotate_logs("server_ticker", dir.path(), 1), 2);
        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["other_20230101_000000.log", "server_ticker.conf", "server_ticker_20240301_000000.log"]);
    }

    #[test]
    fn keep_zero_clears_everything_and_missing_dir_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app_1.log"), b"x").unwrap();
        assert_eq!(rotate_logs("app", dir.path(), 0), 1);
        assert_eq!(rotate_logs("app", &dir.path().join("missing"), 1), 0);
    }
}

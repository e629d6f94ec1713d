use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter};

/// Level filter from its name. Unknown names fall back to `info`.
pub fn parse_level_filter(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" | "warning" => LevelFilter::Warn,
        "error" | "fatal" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

/// Level name coloured for a terminal.
pub fn colored_level(level: Level) -> ColoredString {
    let name = level.as_str();
    match level {
        Level::Error => name.bright_red(),
        Level::Warn => name.bright_yellow(),
        Level::Info => name.bright_green(),
        Level::Debug => name.bright_blue(),
        Level::Trace => name.dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_parse_with_an_info_fallback() {
        assert_eq!(parse_level_filter("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level_filter(" warn "), LevelFilter::Warn);
        assert_eq!(parse_level_filter("fatal"), LevelFilter::Error);
        assert_eq!(parse_level_filter("loud"), LevelFilter::Info);
    }

    #[test]
    fn colouring_keeps_the_level_name() {
        colored::control::set_override(false);
        assert_eq!(colored_level(Level::Warn).to_string(), "WARN");
    }
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lib_ticker::core::Domain;
use lib_ticker::ingestors::{DemoFeed, FileFeed, HttpFeed};
use lib_ticker::output::{FanoutSink, FrameSink, MemorySink, MemorySinkHandle, PpmSink};
use lib_ticker::{DisplayConfig, Poller};

use super::config::Config;

/// One poller per enabled domain: demo feeds in demo mode, otherwise the
/// HTTP endpoint if configured, otherwise the file feed.
pub fn build_pollers(config: &Config, display: &DisplayConfig) -> anyhow::Result<Vec<Arc<dyn Poller>>> {
    let mut pollers: Vec<Arc<dyn Poller>> = Vec::new();
    for domain in Domain::ALL {
        if !display.domain_enabled(domain) {
            log::info!("[{}] disabled in the display config", domain);
            continue;
        }
        match source_for(config, display, domain)? {
            Some(poller) => {
                log::info!("[{}] source: {}", domain, poller.name());
                pollers.push(poller);
            }
            None => log::warn!("[{}] no source configured, the domain will show no data", domain),
        }
    }
    Ok(pollers)
}

fn source_for(config: &Config, display: &DisplayConfig, domain: Domain) -> anyhow::Result<Option<Arc<dyn Poller>>> {
    if config.demo() {
        return Ok(Some(Arc::new(demo_feed(config, display, domain))));
    }
    let (url, file): (&Option<String>, &Option<PathBuf>) = match domain {
        Domain::Market => (&config.market_url, &config.market_file),
        Domain::Weather => (&config.weather_url, &config.weather_file),
        Domain::Sports => (&config.sports_url, &config.sports_file),
    };
    if let Some(url) = url {
        let timeout = display.fetch_timeout(domain).max(Duration::from_secs(1));
        let feed = HttpFeed::new(domain, url, config.feed_token.clone(), timeout)
            .map_err(|e| anyhow::anyhow!("[{}] cannot build HTTP feed for {}: {}", domain, url, e))?;
        return Ok(Some(Arc::new(feed)));
    }
    Ok(file.as_ref().map(|path| Arc::new(FileFeed::new(domain, path)) as Arc<dyn Poller>))
}

fn demo_feed(config: &Config, display: &DisplayConfig, domain: Domain) -> DemoFeed {
    match domain {
        Domain::Market => DemoFeed::market(display.market.all_symbols()),
        Domain::Weather => DemoFeed::weather(config.demo_alert()),
        Domain::Sports => {
            let team = display.sports.nhl_teams.first().map_or("MTL", String::as_str);
            let opponent = if team == "TOR" { "BOS" } else { "TOR" };
            DemoFeed::sports(team, opponent)
        }
    }
}

/// The panel sinks: an in-memory copy of the last frame, plus the PPM preview
/// when a path is configured.
pub fn build_sink(config: &Config, display: &DisplayConfig) -> (Box<dyn FrameSink>, MemorySinkHandle) {
    let memory = MemorySink::new(display.panel.width, display.panel.height);
    let handle = memory.handle();
    let mut sinks: Vec<Box<dyn FrameSink>> = vec![Box::new(memory)];
    if let Some(path) = &config.preview_path {
        log::info!("PPM preview at {} every {} frames", path.display(), config.preview_every_frames());
        sinks.push(Box::new(PpmSink::new(path, config.preview_every_frames())));
    }
    (Box::new(FanoutSink::new(sinks)), handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_mode_builds_every_enabled_domain() {
        let config = Config { demo: Some(true), ..Default::default() };
        let mut display = DisplayConfig::default();
        display.weather.enabled = false;
        let pollers = build_pollers(&config, &display).unwrap();
        let domains: Vec<Domain> = pollers.iter().map(|p| p.domain()).collect();
        assert_eq!(domains, vec![Domain::Market, Domain::Sports]);
    }

    #[test]
    fn file_feeds_fill_in_where_no_url_is_set() {
        let config = Config { market_file: Some(PathBuf::from("market.json")), ..Default::default() };
        let pollers = build_pollers(&config, &DisplayConfig::default()).unwrap();
        assert_eq!(pollers.len(), 1);
        assert_eq!(pollers[0].domain(), Domain::Market);
    }

    #[test]
    fn preview_path_adds_a_second_sink() {
        let config = Config { preview_path: Some(PathBuf::from("/tmp/p.ppm")), ..Default::default() };
        let (sink, handle) = build_sink(&config, &DisplayConfig::default());
        assert_eq!(sink.name(), "fanout");
        assert_eq!(handle.frames(), 0);
    }
}

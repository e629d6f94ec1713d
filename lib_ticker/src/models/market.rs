//! # Market Snapshot Payload
//!
//! The shape a market-quote poller publishes onto the snapshot bus: an ordered
//! list of quotes plus the exchange session they were taken in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trading session reported alongside a batch of quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketSession {
    /// Pre-market trading (04:00 - 09:30 New York).
    #[serde(alias = "PREPRE")]
    Pre,
    /// Regular session (09:30 - 16:00 New York).
    Regular,
    /// After-hours trading.
    #[serde(alias = "POSTPOST")]
    Post,
    /// Exchange closed.
    Closed,
    /// The feed did not say.
    #[default]
    #[serde(other)]
    Unknown,
}

/// How complete the last fetch was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchQuality {
    /// Every requested symbol came back with a price.
    #[default]
    Ok,
    /// Some symbols are missing a price.
    Partial,
    /// No symbol has a price.
    NoData,
}

/// A single symbol's last trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Ticker symbol, e.g. `AAPL` or `^GSPC`.
    pub symbol: String,
    /// Last price, if the upstream had one.
    #[serde(default)]
    pub price: Option<f64>,
    /// Percent change against the previous close.
    #[serde(default)]
    pub change_pct: Option<f64>,
    /// Upstream quote time.
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

impl Quote {
    /// Builds a fully priced quote.
    pub fn priced(symbol: &str, price: f64, change_pct: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: Some(price),
            change_pct: Some(change_pct),
            as_of: None,
        }
    }

    /// True when both price and change are present and finite.
    pub fn is_complete(&self) -> bool {
        matches!((self.price, self.change_pct), (Some(p), Some(c)) if p.is_finite() && c.is_finite())
    }
}

/// Latest market state for the whole watch list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Quotes in display order.
    #[serde(default)]
    pub quotes: Vec<Quote>,
    /// Session at fetch time.
    #[serde(default)]
    pub session: MarketSession,
    /// Completeness of this batch. Recomputed by [`MarketSnapshot::new`].
    #[serde(default)]
    pub quality: FetchQuality,
}

impl MarketSnapshot {
    /// Builds a snapshot and derives its [`FetchQuality`] from the quotes.
    pub fn new(quotes: Vec<Quote>, session: MarketSession) -> Self {
        let quality = Self::derive_quality(&quotes);
        Self { quotes, session, quality }
    }

    /// `ok` when all quotes are complete, `no_data` when none are, else `partial`.
    pub fn derive_quality(quotes: &[Quote]) -> FetchQuality {
        let complete = quotes.iter().filter(|q| q.is_complete()).count();
        match complete {
            0 => FetchQuality::NoData,
            n if n == quotes.len() => FetchQuality::Ok,
            _ => FetchQuality::Partial,
        }
    }

    /// Case-insensitive symbol lookup.
    pub fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.quotes
            .iter()
            .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_follows_completeness() {
        let full = vec![Quote::priced("AAPL", 150.0, 1.2)];
        assert_eq!(MarketSnapshot::derive_quality(&full), FetchQuality::Ok);

        let mut partial = full.clone();
        partial.push(Quote { symbol: "MSFT".into(), price: None, change_pct: None, as_of: None });
        assert_eq!(MarketSnapshot::derive_quality(&partial), FetchQuality::Partial);

        assert_eq!(MarketSnapshot::derive_quality(&partial[1..]), FetchQuality::NoData);
    }

    #[test]
    fn session_parses_feed_spellings() {
        let s: MarketSession = serde_json::from_str("\"REGULAR\"").unwrap();
        assert_eq!(s, MarketSession::Regular);
        let s: MarketSession = serde_json::from_str("\"PREPRE\"").unwrap();
        assert_eq!(s, MarketSession::Pre);
        let s: MarketSession = serde_json::from_str("\"HALTED\"").unwrap();
        assert_eq!(s, MarketSession::Unknown);
    }
}

//! # Domain Payloads
//!
//! The message shapes each data poller publishes onto the snapshot bus. Payloads
//! are plain serde structs so any collaborator (HTTP feed, file feed, demo feed)
//! can produce them, and a [`Payload`] enum tags them with their domain.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Quotes and market session.
pub mod market;
/// Weather alerts.
pub mod weather;
/// Games and scores.
pub mod sports;

#[cfg(test)]
pub(crate) mod fixtures;

pub use market::{FetchQuality, MarketSession, MarketSnapshot, Quote};
pub use sports::{Game, GameState, League, SportsSnapshot, TeamScore, TrackedTeams};
pub use weather::{Severity, WeatherAlert, WeatherSnapshot};

use crate::core::snapshot::Domain;
use crate::ingestors::FetchError;

/// A payload tagged with the domain it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Market quotes.
    Market(MarketSnapshot),
    /// Weather alerts.
    Weather(WeatherSnapshot),
    /// Sports scores.
    Sports(SportsSnapshot),
}

impl Payload {
    /// Domain this payload is published under.
    pub fn domain(&self) -> Domain {
        match self {
            Payload::Market(_) => Domain::Market,
            Payload::Weather(_) => Domain::Weather,
            Payload::Sports(_) => Domain::Sports,
        }
    }

    /// Parses a JSON or JSON5 document as the payload of `domain`.
    pub fn parse(domain: Domain, text: &str) -> Result<Self, FetchError> {
        let payload = match domain {
            Domain::Market => Payload::Market(json5::from_str(text).map_err(malformed)?),
            Domain::Weather => Payload::Weather(json5::from_str(text).map_err(malformed)?),
            Domain::Sports => Payload::Sports(json5::from_str(text).map_err(malformed)?),
        };
        payload.checked()
    }

    /// Converts an already-decoded JSON value into the payload of `domain`.
    pub fn from_value(domain: Domain, value: serde_json::Value) -> Result<Self, FetchError> {
        let payload = match domain {
            Domain::Market => Payload::Market(serde_json::from_value(value).map_err(malformed)?),
            Domain::Weather => Payload::Weather(serde_json::from_value(value).map_err(malformed)?),
            Domain::Sports => Payload::Sports(serde_json::from_value(value).map_err(malformed)?),
        };
        payload.checked()
    }

    /// Rejects payloads that decoded but cannot be displayed: blank symbols,
    /// non-finite prices, blank team codes. Market quality is re-derived.
    pub fn checked(self) -> Result<Self, FetchError> {
        match self {
            Payload::Market(mut m) => {
                if let Some(bad) = m.quotes.iter().find(|q| q.symbol.trim().is_empty()) {
                    return Err(FetchError::Malformed(format!("quote with blank symbol: {:?}", bad)));
                }
                if let Some(bad) = m
                    .quotes
                    .iter()
                    .find(|q| q.price.is_some_and(|p| !p.is_finite()) || q.change_pct.is_some_and(|c| !c.is_finite()))
                {
                    return Err(FetchError::Malformed(format!("non-finite value for {}", bad.symbol)));
                }
                m.quality = MarketSnapshot::derive_quality(&m.quotes);
                Ok(Payload::Market(m))
            }
            Payload::Sports(s) => {
                if s.games.iter().any(|g| g.home.code.trim().is_empty() || g.away.code.trim().is_empty()) {
                    return Err(FetchError::Malformed("game with blank team code".to_string()));
                }
                Ok(Payload::Sports(s))
            }
            weather => Ok(weather),
        }
    }

    /// True for a sports payload with a game in progress; used to pick the live poll cadence.
    pub fn has_live_game(&self) -> bool {
        matches!(self, Payload::Sports(s) if s.any_live())
    }
}

fn malformed(e: impl std::fmt::Display) -> FetchError {
    FetchError::Malformed(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json5_market_document() {
        let text = r#"{
            // trailing commas and comments are fine
            quotes: [{ symbol: "AAPL", price: 150.0, changePct: 1.2 },],
            session: "REGULAR",
        }"#;
        let payload = Payload::parse(Domain::Market, text).unwrap();
        match payload {
            Payload::Market(m) => {
                assert_eq!(m.quotes.len(), 1);
                assert_eq!(m.session, MarketSession::Regular);
                assert_eq!(m.quality, FetchQuality::Ok);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(Payload::parse(Domain::Sports, "{ games: 3 }"), Err(FetchError::Malformed(_))));
        let blank = r#"{ "quotes": [{ "symbol": " ", "price": 1.0 }] }"#;
        assert!(matches!(Payload::parse(Domain::Market, blank), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn from_value_routes_by_domain() {
        let v = serde_json::json!({ "alerts": [{ "severity": "warning", "headline": "WIND WARNING" }] });
        let p = Payload::from_value(Domain::Weather, v).unwrap();
        assert_eq!(p.domain(), Domain::Weather);
        assert!(!p.has_live_game());
    }
}

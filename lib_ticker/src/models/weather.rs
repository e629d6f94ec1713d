//! # Weather Alert Payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert tier, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Special weather statement.
    Statement,
    /// Advisory (yellow).
    Advisory,
    /// Watch.
    Watch,
    /// Warning (orange/red).
    Warning,
}

impl Severity {
    /// Warnings get their own colour and cadence; everything else shares the advisory tier.
    pub fn is_warning(self) -> bool {
        self == Severity::Warning
    }

    /// Lower-case name as used in status output.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Statement => "statement",
            Severity::Advisory => "advisory",
            Severity::Watch => "watch",
            Severity::Warning => "warning",
        }
    }
}

/// One active alert for a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlert {
    /// Region or zone name.
    #[serde(default)]
    pub region: String,
    /// Alert tier.
    pub severity: Severity,
    /// Feed headline, shown verbatim (truncated at render time).
    pub headline: String,
    /// When the alert lapses, if the feed says.
    #[serde(default)]
    pub effective_until: Option<DateTime<Utc>>,
}

impl WeatherAlert {
    /// An alert whose `effective_until` is in the past no longer counts.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.effective_until.map_or(true, |until| now < until)
    }
}

/// Latest alert list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Alerts in feed order.
    #[serde(default)]
    pub alerts: Vec<WeatherAlert>,
}

impl WeatherSnapshot {
    /// The alert to surface on the ticker: the first active warning, otherwise
    /// (when `include_watch`) the first active lower-tier alert.
    pub fn headline(&self, include_watch: bool, now: DateTime<Utc>) -> Option<&WeatherAlert> {
        let mut active = self.alerts.iter().filter(|a| a.is_active(now));
        let warning = self
            .alerts
            .iter()
            .filter(|a| a.is_active(now))
            .find(|a| a.severity.is_warning());
        if warning.is_some() {
            return warning;
        }
        if include_watch {
            return active.next();
        }
        None
    }
}

//! # Operator Overrides
//!
//! Parses control commands and holds the single active override.
//!
//! Grammar, one command per line:
//!
//! ```text
//! clock [DURATION]
//! bright [DURATION]          (alias: full-brightness)
//! scoreboard [DURATION]      (alias: force-scoreboard)
//! message [DURATION] TEXT... (alias: custom-message)
//! maintenance [DURATION]     (alias: maint)
//! clear
//! ```
//!
//! `DURATION` is `<n>s`, `<n>m`, `<n>h` or bare minutes. Without one the override
//! stays until cleared or replaced.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Control-boundary rejections. A rejected command changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The mode word is not one of the override modes.
    #[error("Unknown override mode {0:?}")]
    UnknownMode(String),

    /// The duration is unparsable, zero or above the configured maximum.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// `message` without text.
    #[error("The message override needs some text")]
    MissingText,

    /// Anything else about the command shape.
    #[error("Cannot parse command: {0}")]
    Parse(String),

    /// The render loop is gone.
    #[error("Display runtime is not running")]
    Closed,
}

/// The fixed set of override modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverrideMode {
    /// Full-panel clock.
    Clock,
    /// Maximum brightness; does not pick a mode.
    FullBrightness,
    /// Scoreboard even without a tracked live game.
    ForceScoreboard,
    /// Operator text.
    CustomMessage,
    /// Maintenance banner.
    Maintenance,
}

impl OverrideMode {
    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            OverrideMode::Clock => "clock",
            OverrideMode::FullBrightness => "full-brightness",
            OverrideMode::ForceScoreboard => "force-scoreboard",
            OverrideMode::CustomMessage => "custom-message",
            OverrideMode::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for OverrideMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverrideMode {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clock" => Ok(OverrideMode::Clock),
            "bright" | "brightness" | "full-brightness" => Ok(OverrideMode::FullBrightness),
            "scoreboard" | "force-scoreboard" => Ok(OverrideMode::ForceScoreboard),
            "message" | "msg" | "custom-message" => Ok(OverrideMode::CustomMessage),
            "maintenance" | "maint" => Ok(OverrideMode::Maintenance),
            other => Err(ControlError::UnknownMode(other.to_string())),
        }
    }
}

/// A parsed request to install an override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRequest {
    /// Mode to force.
    pub mode: OverrideMode,
    /// How long; `None` until cleared.
    pub duration: Option<Duration>,
    /// Text of a custom message.
    pub text: Option<String>,
}

impl OverrideRequest {
    /// A request without duration or text.
    pub fn new(mode: OverrideMode) -> Self {
        Self { mode, duration: None, text: None }
    }

    /// Sets the duration.
    pub fn for_duration(mut self, d: Duration) -> Self {
        self.duration = Some(d);
        self
    }

    /// Sets the text.
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }
}

/// A control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Replace the current override.
    Apply(OverrideRequest),
    /// Drop the current override.
    Clear,
}

fn looks_like_duration(token: &str) -> bool {
    let digits = token.trim_end_matches(|c: char| matches!(c, 's' | 'm' | 'h' | 'S' | 'M' | 'H'));
    !digits.is_empty() && token.len() - digits.len() <= 1 && digits.chars().all(|c| c.is_ascii_digit())
}

/// Parses `<n>s`, `<n>m`, `<n>h` or bare minutes. Zero is rejected.
pub fn parse_duration(token: &str) -> Result<Duration, ControlError> {
    let t = token.trim().to_ascii_lowercase();
    let (digits, unit) = match t.char_indices().last() {
        Some((i, c)) if matches!(c, 's' | 'm' | 'h') => (&t[..i], c),
        _ => (t.as_str(), 'm'),
    };
    let n: u64 = digits
        .parse()
        .map_err(|_| ControlError::InvalidDuration(format!("{:?} is not a duration", token)))?;
    if n == 0 {
        return Err(ControlError::InvalidDuration("duration must be positive".to_string()));
    }
    let secs = match unit {
        's' => Some(n),
        'h' => n.checked_mul(3_600),
        _ => n.checked_mul(60),
    }
    .ok_or_else(|| ControlError::InvalidDuration(format!("{:?} is too long", token)))?;
    Ok(Duration::from_secs(secs))
}

impl FromStr for ControlCommand {
    type Err = ControlError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace().peekable();
        let Some(word) = tokens.next() else {
            return Err(ControlError::Parse("empty command".to_string()));
        };
        if matches!(word.to_ascii_lowercase().as_str(), "clear" | "off" | "cancel") {
            return match tokens.next() {
                None => Ok(ControlCommand::Clear),
                Some(extra) => Err(ControlError::Parse(format!("unexpected argument {:?}", extra))),
            };
        }

        let mode: OverrideMode = word.parse()?;
        let mut request = OverrideRequest::new(mode);
        if let Some(tok) = tokens.peek().copied() {
            if looks_like_duration(tok) {
                request.duration = Some(parse_duration(tok)?);
                tokens.next();
            }
        }

        let rest: Vec<&str> = tokens.collect();
        match mode {
            OverrideMode::CustomMessage => {
                if rest.is_empty() {
                    return Err(ControlError::MissingText);
                }
                request.text = Some(rest.join(" "));
            }
            _ => {
                if let Some(extra) = rest.first() {
                    return Err(ControlError::InvalidDuration(format!("{:?} is not a duration", extra)));
                }
            }
        }
        Ok(ControlCommand::Apply(request))
    }
}

/// # Active Override
///
/// The installed override. Active over `[issued_at, issued_at + duration)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveOverride {
    /// Forced mode.
    pub mode: OverrideMode,
    /// Text of a custom message.
    pub text: Option<String>,
    /// Monotonic issue time.
    pub issued_at: Instant,
    /// Wall issue time for reporting.
    pub issued_wall: DateTime<Utc>,
    /// End of the override; `None` until cleared.
    pub expires_at: Option<Instant>,
    /// Increments on every accepted override; distinguishes replacements.
    pub serial: u64,
}

impl ActiveOverride {
    /// True while `now` is inside the override's window.
    pub fn is_active(&self, now: Instant) -> bool {
        now >= self.issued_at && self.expires_at.map_or(true, |end| now < end)
    }

    /// Serializable summary.
    pub fn view(&self, now: Instant) -> OverrideView {
        OverrideView {
            mode: self.mode,
            text: self.text.clone(),
            issued_at: self.issued_wall,
            remaining_seconds: self.expires_at.map(|e| e.saturating_duration_since(now).as_secs()),
        }
    }
}

/// Status-surface view of the active override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideView {
    /// Mode.
    pub mode: OverrideMode,
    /// Custom text.
    pub text: Option<String>,
    /// Issue time.
    pub issued_at: DateTime<Utc>,
    /// Seconds left, `None` when open-ended.
    pub remaining_seconds: Option<u64>,
}

/// Holder of at most one [`ActiveOverride`].
#[derive(Debug, Default)]
pub struct OverrideSlot {
    current: Option<ActiveOverride>,
    serial: u64,
}

impl OverrideSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `req` and, only if it is acceptable, replaces the current override.
    pub fn apply(
        &mut self,
        req: OverrideRequest,
        now: Instant,
        wall: DateTime<Utc>,
        max: Duration,
    ) -> Result<&ActiveOverride, ControlError> {
        if let Some(d) = req.duration {
            if d.is_zero() {
                return Err(ControlError::InvalidDuration("duration must be positive".to_string()));
            }
            if d > max {
                return Err(ControlError::InvalidDuration(format!(
                    "{} min exceeds the {} min maximum",
                    d.as_secs().div_ceil(60),
                    max.as_secs() / 60
                )));
            }
        }
        let text = req.text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        if req.mode == OverrideMode::CustomMessage && text.is_none() {
            return Err(ControlError::MissingText);
        }

        self.serial += 1;
        let active = ActiveOverride {
            mode: req.mode,
            text,
            issued_at: now,
            issued_wall: wall,
            expires_at: req.duration.map(|d| now + d),
            serial: self.serial,
        };
        log::info!(
            "Override accepted: {} ({})",
            active.mode,
            req.duration.map_or_else(|| "until cleared".to_string(), |d| format!("{}s", d.as_secs()))
        );
        Ok(self.current.insert(active))
    }

    /// Drops the current override, returning it.
    pub fn clear(&mut self) -> Option<ActiveOverride> {
        let prev = self.current.take();
        if let Some(p) = &prev {
            log::info!("Override cleared: {}", p.mode);
        }
        prev
    }

    /// Drops the override if its window has passed.
    pub fn expire(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|o| !o.is_active(now)) {
            if let Some(o) = self.current.take() {
                log::info!("Override expired: {}", o.mode);
            }
        }
    }

    /// The override in force at `now`.
    pub fn active(&self, now: Instant) -> Option<&ActiveOverride> {
        self.current.as_ref().filter(|o| o.is_active(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: Duration = Duration::from_secs(1_440 * 60);

    #[test]
    fn parses_grammar_and_aliases() {
        assert_eq!("clear".parse::<ControlCommand>(), Ok(ControlCommand::Clear));
        assert_eq!(
            "clock 5m".parse::<ControlCommand>(),
            Ok(ControlCommand::Apply(OverrideRequest::new(OverrideMode::Clock).for_duration(Duration::from_secs(300))))
        );
        assert_eq!(
            "force-scoreboard".parse::<ControlCommand>(),
            Ok(ControlCommand::Apply(OverrideRequest::new(OverrideMode::ForceScoreboard)))
        );
        assert_eq!(
            "message 90s  Happy  birthday".parse::<ControlCommand>(),
            Ok(ControlCommand::Apply(
                OverrideRequest::new(OverrideMode::CustomMessage)
                    .for_duration(Duration::from_secs(90))
                    .with_text("Happy birthday")
            ))
        );
        assert_eq!(
            "bright 2h".parse::<ControlCommand>(),
            Ok(ControlCommand::Apply(
                OverrideRequest::new(OverrideMode::FullBrightness).for_duration(Duration::from_secs(7_200))
            ))
        );
        assert_eq!(
            "MAINT 10".parse::<ControlCommand>(),
            Ok(ControlCommand::Apply(
                OverrideRequest::new(OverrideMode::Maintenance).for_duration(Duration::from_secs(600))
            ))
        );
    }

    #[test]
    fn rejects_misuse() {
        assert!(matches!("disco".parse::<ControlCommand>(), Err(ControlError::UnknownMode(_))));
        assert!(matches!("clock 0m".parse::<ControlCommand>(), Err(ControlError::InvalidDuration(_))));
        assert!(matches!("clock soon".parse::<ControlCommand>(), Err(ControlError::InvalidDuration(_))));
        assert!(matches!("message".parse::<ControlCommand>(), Err(ControlError::MissingText)));
        assert!(matches!("message 5m".parse::<ControlCommand>(), Err(ControlError::MissingText)));
        assert!(matches!("".parse::<ControlCommand>(), Err(ControlError::Parse(_))));
    }

    #[test]
    fn override_window_is_half_open() {
        let mut slot = OverrideSlot::new();
        let t0 = Instant::now();
        let req = OverrideRequest::new(OverrideMode::Clock).for_duration(Duration::from_secs(300));
        slot.apply(req, t0, Utc::now(), MAX).unwrap();
        assert!(slot.active(t0).is_some());
        assert!(slot.active(t0 + Duration::from_secs(299)).is_some());
        assert!(slot.active(t0 + Duration::from_secs(300)).is_none());
        slot.expire(t0 + Duration::from_secs(300));
        assert!(slot.clear().is_none());
    }

    #[test]
    fn rejected_request_leaves_current_override() {
        let mut slot = OverrideSlot::new();
        let t0 = Instant::now();
        slot.apply(OverrideRequest::new(OverrideMode::Maintenance), t0, Utc::now(), MAX).unwrap();
        let too_long = OverrideRequest::new(OverrideMode::Clock).for_duration(MAX + Duration::from_secs(60));
        assert!(matches!(slot.apply(too_long, t0, Utc::now(), MAX), Err(ControlError::InvalidDuration(_))));
        let blank = OverrideRequest::new(OverrideMode::CustomMessage).with_text("   ");
        assert_eq!(slot.apply(blank, t0, Utc::now(), MAX).err(), Some(ControlError::MissingText));
        let active = slot.active(t0 + Duration::from_secs(86_400)).unwrap();
        assert_eq!(active.mode, OverrideMode::Maintenance);
        assert_eq!(active.serial, 1);
    }
}

//! # Retry And Restart Policies
//!
//! Pure delay calculations used by the pollers (fetch retries) and the supervisor
//! (task restarts). Jitter is applied as a separate step so the base curve stays
//! testable.

use rand::Rng;
use std::time::Duration;

/// Fraction of the delay used as +/- jitter.
const JITTER: f64 = 0.10;

/// Restart cooldown ceiling.
pub const MAX_RESTART_COOLDOWN: Duration = Duration::from_secs(60);

/// A task that stayed up this long is considered stable and its cooldown resets.
pub const STABLE_RUN: Duration = Duration::from_secs(60);

/// Exponential fetch backoff: `min(base * 2^(n-1), max)` for the n-th consecutive failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay after the first failure.
    pub base: Duration,
    /// Ceiling.
    pub max: Duration,
}

impl Backoff {
    /// Builds a policy from millisecond config values.
    pub fn from_millis(base_ms: u64, max_ms: u64) -> Self {
        Self { base: Duration::from_millis(base_ms), max: Duration::from_millis(max_ms) }
    }

    /// Delay before retrying after `failures` consecutive failures, without jitter.
    pub fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let shift = (failures - 1).min(20);
        self.base
            .checked_mul(1u32 << shift)
            .map_or(self.max, |d| d.min(self.max))
    }

    /// Jittered delay, never below one second.
    pub fn jittered(&self, failures: u32) -> Duration {
        let d = self.delay(failures);
        let factor = rand::rng().random_range((1.0 - JITTER)..=(1.0 + JITTER));
        d.mul_f64(factor).max(Duration::from_secs(1))
    }
}

/// Restart cooldown for a supervised task.
///
/// Doubles per rapid restart up to [`MAX_RESTART_COOLDOWN`]; a run of at least
/// [`STABLE_RUN`] resets it to the configured base.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    base: Duration,
    current: Duration,
}

impl RestartPolicy {
    /// Starts at `base`.
    pub fn new(base: Duration) -> Self {
        Self { base, current: base }
    }

    /// Cooldown to wait after a task that ran for `ran_for` ended.
    pub fn next_cooldown(&mut self, ran_for: Duration) -> Duration {
        if ran_for >= STABLE_RUN {
            self.current = self.base;
        }
        let cooldown = self.current.min(MAX_RESTART_COOLDOWN);
        self.current = (self.current * 2).min(MAX_RESTART_COOLDOWN);
        cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let b = Backoff::from_millis(1_000, 8_000);
        assert_eq!(b.delay(0), Duration::ZERO);
        assert_eq!(b.delay(1), Duration::from_secs(1));
        assert_eq!(b.delay(2), Duration::from_secs(2));
        assert_eq!(b.delay(4), Duration::from_secs(8));
        assert_eq!(b.delay(5), Duration::from_secs(8));
        assert_eq!(b.delay(200), Duration::from_secs(8));
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let b = Backoff::from_millis(10_000, 300_000);
        for _ in 0..50 {
            let d = b.jittered(1);
            assert!(d >= Duration::from_secs(9) && d <= Duration::from_secs(11), "{:?}", d);
        }
        assert!(Backoff::from_millis(10, 10).jittered(1) >= Duration::from_secs(1));
    }

    #[test]
    fn restart_cooldown_doubles_and_resets_after_stable_run() {
        let mut p = RestartPolicy::new(Duration::from_secs(5));
        assert_eq!(p.next_cooldown(Duration::from_secs(1)), Duration::from_secs(5));
        assert_eq!(p.next_cooldown(Duration::from_secs(1)), Duration::from_secs(10));
        assert_eq!(p.next_cooldown(Duration::from_secs(1)), Duration::from_secs(20));
        assert_eq!(p.next_cooldown(Duration::from_secs(1)), Duration::from_secs(40));
        assert_eq!(p.next_cooldown(Duration::from_secs(1)), Duration::from_secs(60));
        assert_eq!(p.next_cooldown(Duration::from_secs(1)), Duration::from_secs(60));
        assert_eq!(p.next_cooldown(Duration::from_secs(90)), Duration::from_secs(5));
    }
}

//! Fixed-window rate limiting for brute-force-able endpoints.
//!
//! One `RateLimiter` instance owns a process-local map from key (caller
//! address or claimed identity) to a counter and its window boundary. The
//! boundary is set on the first attempt and does not slide with later
//! attempts; an entry whose window has passed counts as absent. In a
//! multi-process deployment each process keeps an independent view — this
//! is a throttle, not a hard security boundary.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Chance that any given `check` call also sweeps expired entries.
const SWEEP_PROBABILITY: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
struct RateEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateDecision {
    /// Seconds until the window resets, rounded up. Zero once passed.
    pub fn retry_after_secs(&self) -> i64 {
        let millis = (self.reset_at - Utc::now()).num_milliseconds();
        if millis <= 0 { 0 } else { (millis + 999) / 1000 }
    }
}

/// Time-windowed attempt counter.
#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: DashMap<String, RateEntry>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Count an attempt under `key` and decide whether it is allowed.
    ///
    /// A missing or expired entry becomes a fresh window with count 1;
    /// otherwise the count increments and `allowed = count <= max`.
    pub fn check(&self, key: &str, max_attempts: u32, window: Duration) -> RateDecision {
        let now = Utc::now();

        // Sweep opportunistically rather than on every call; entry count
        // stays bounded by the arrival rate within one window.
        if rand::random::<f64>() < SWEEP_PROBABILITY {
            self.sweep_expired();
        }

        let mut entry = self.entries.entry(key.to_string()).or_insert(RateEntry {
            count: 0,
            reset_at: now + window,
        });
        if entry.reset_at <= now {
            entry.count = 0;
            entry.reset_at = now + window;
        }
        entry.count += 1;

        RateDecision {
            allowed: entry.count <= max_attempts,
            remaining: max_attempts.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    /// Drop entries whose window has passed.
    pub fn sweep_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, entry| entry.reset_at > now);
    }

    /// Number of live keys (for tests and introspection).
    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> Duration {
        Duration::seconds(60)
    }

    #[test]
    fn allows_up_to_max_with_decreasing_remaining() {
        let limiter = RateLimiter::new();
        for expected_remaining in [4, 3, 2, 1, 0] {
            let d = limiter.check("1.2.3.4", 5, window());
            assert!(d.allowed);
            assert_eq!(d.remaining, expected_remaining);
        }
    }

    #[test]
    fn blocks_past_max_within_window() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check("1.2.3.4", 5, window()).allowed);
        }
        let d = limiter.check("1.2.3.4", 5, window());
        assert!(!d.allowed);
        assert_eq!(d.remaining, 0);
    }

    #[test]
    fn window_boundary_does_not_slide() {
        let limiter = RateLimiter::new();
        let first = limiter.check("1.2.3.4", 5, window());
        let second = limiter.check("1.2.3.4", 5, window());
        assert_eq!(first.reset_at, second.reset_at);
    }

    #[test]
    fn fresh_window_after_reset_passes() {
        let limiter = RateLimiter::new();
        let tiny = Duration::milliseconds(30);
        for _ in 0..2 {
            limiter.check("1.2.3.4", 2, tiny);
        }
        assert!(!limiter.check("1.2.3.4", 2, tiny).allowed);

        std::thread::sleep(std::time::Duration::from_millis(50));

        let d = limiter.check("1.2.3.4", 2, tiny);
        assert!(d.allowed);
        assert_eq!(d.remaining, 1);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..6 {
            limiter.check("1.2.3.4", 5, window());
        }
        assert!(!limiter.check("1.2.3.4", 5, window()).allowed);
        assert!(limiter.check("5.6.7.8", 5, window()).allowed);
    }

    #[test]
    fn sweep_drops_only_expired_entries() {
        let limiter = RateLimiter::new();
        let tiny = Duration::milliseconds(10);
        limiter.check("stale-1", 5, tiny);
        limiter.check("stale-2", 5, tiny);
        limiter.check("live", 5, window());
        assert_eq!(limiter.tracked_keys(), 3);

        std::thread::sleep(std::time::Duration::from_millis(25));
        limiter.sweep_expired();

        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn retry_after_reflects_window() {
        let limiter = RateLimiter::new();
        let d = limiter.check("1.2.3.4", 1, window());
        let secs = d.retry_after_secs();
        assert!(secs > 0 && secs <= 60);
    }
}

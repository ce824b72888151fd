//! Keyed rate limiting for abuse prevention
//!
//! Fixed-window counter with a punitive block: each key gets `max_attempts`
//! within a counting window, and the attempt that exceeds the budget starts a
//! block that outlives the window, so a blocked actor cannot simply wait out
//! the window and retry at full budget. Bursts that straddle a window
//! boundary are undercounted; this is advisory throttling, not a security
//! boundary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum attempts allowed in the window
    pub max_attempts: u32,
    /// Counting window duration
    pub window: Duration,
    /// How long a key stays blocked after exhausting the budget
    pub block_duration: Duration,
}

impl RateLimitConfig {
    /// Create a config; the block duration defaults to twice the window.
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            block_duration: window * 2,
        }
    }

    /// Override the default block duration.
    pub fn with_block_duration(mut self, block_duration: Duration) -> Self {
        self.block_duration = block_duration;
        self
    }
}

/// Attempt history for a single key
#[derive(Debug, Clone)]
struct AttemptRecord {
    /// Attempts observed in the current window (at least 1)
    count: u32,
    /// Start of the current window
    first_attempt: Instant,
    /// Set when the budget is exceeded; cleared only by window replacement or reset
    blocked_until: Option<Instant>,
}

impl AttemptRecord {
    fn fresh(now: Instant) -> Self {
        Self {
            count: 1,
            first_attempt: now,
            blocked_until: None,
        }
    }
}

/// In-memory keyed rate limiter
///
/// Keys are arbitrary strings (user id, email, IP stand-in). Attempt records
/// are process-local and non-persistent: lost on restart, never synchronized
/// across processes. That is deliberate. The authoritative limits live
/// server-side; this layer only saves round-trips and deters casual abuse.
pub struct RateLimiter {
    config: RateLimitConfig,
    attempts: DashMap<String, AttemptRecord>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter on the system clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter on an injected clock (deterministic tests).
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            attempts: DashMap::new(),
            clock,
        }
    }

    /// Check whether an action is allowed for `key`, recording the attempt.
    ///
    /// Check order matters: an active block wins over a naturally expired
    /// window, and a call against an active block does not mutate the record,
    /// so hammering a blocked key neither extends nor shortens the block.
    pub fn is_allowed(&self, key: &str) -> bool {
        let now = self.clock.now();

        match self.attempts.entry(key.to_string()) {
            // No previous attempts
            Entry::Vacant(slot) => {
                slot.insert(AttemptRecord::fresh(now));
                true
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();

                // Currently blocked
                if let Some(blocked_until) = record.blocked_until {
                    if now < blocked_until {
                        return false;
                    }
                }

                // Window expired: start a fresh one, dropping any stale block
                if now.duration_since(record.first_attempt) > self.config.window {
                    *record = AttemptRecord::fresh(now);
                    return true;
                }

                record.count += 1;

                if record.count > self.config.max_attempts {
                    record.blocked_until = Some(now + self.config.block_duration);
                    tracing::warn!(
                        key = %key,
                        attempts = record.count,
                        block_secs = self.config.block_duration.as_secs(),
                        "rate limit exceeded, blocking key"
                    );
                    return false;
                }

                true
            }
        }
    }

    /// Attempts left in the current window. Pure read; creates no record.
    ///
    /// Reports the full budget when the key is unknown or its window has
    /// already elapsed, even though the stale record is not yet replaced.
    pub fn remaining_attempts(&self, key: &str) -> u32 {
        let record = match self.attempts.get(key) {
            Some(record) => record,
            None => return self.config.max_attempts,
        };

        let now = self.clock.now();
        if now.duration_since(record.first_attempt) > self.config.window {
            return self.config.max_attempts;
        }

        self.config.max_attempts.saturating_sub(record.count)
    }

    /// Time remaining on an active block. Zero when not blocked.
    pub fn time_until_unblocked(&self, key: &str) -> Duration {
        let now = self.clock.now();
        self.attempts
            .get(key)
            .and_then(|record| record.blocked_until)
            .map(|until| until.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Forget a key entirely (e.g. after a successful login).
    ///
    /// No-op for unknown keys.
    pub fn reset(&self, key: &str) {
        self.attempts.remove(key);
    }

    /// Evict records whose window elapsed and which are not blocked.
    ///
    /// Intended for a periodic sweep, never the hot path. A record with an
    /// active block is always retained, even with an elapsed window;
    /// evicting it would lift the block early.
    pub fn cleanup(&self) {
        let now = self.clock.now();
        let before = self.attempts.len();

        self.attempts.retain(|_, record| {
            let window_elapsed = now.duration_since(record.first_attempt) > self.config.window;
            let block_active = record.blocked_until.is_some_and(|until| now <= until);
            !window_elapsed || block_active
        });

        let evicted = before.saturating_sub(self.attempts.len());
        if evicted > 0 {
            tracing::debug!(evicted, "evicted expired attempt records");
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.attempts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const WINDOW: Duration = Duration::from_secs(60);

    fn limiter(max_attempts: u32) -> (RateLimiter, ManualClock) {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(
            RateLimitConfig::new(max_attempts, WINDOW),
            Arc::new(clock.clone()),
        );
        (limiter, clock)
    }

    #[test]
    fn test_allows_up_to_budget_then_blocks() {
        let (limiter, _clock) = limiter(5);

        for attempt in 1..=5 {
            assert!(limiter.is_allowed("alice"), "attempt {} should pass", attempt);
        }
        assert!(!limiter.is_allowed("alice"));
    }

    #[test]
    fn test_block_duration_reported_and_stable() {
        let (limiter, clock) = limiter(5);
        for _ in 0..6 {
            limiter.is_allowed("alice");
        }

        let remaining = limiter.time_until_unblocked("alice");
        assert!(remaining > Duration::ZERO);
        assert!(remaining <= WINDOW * 2);

        // Hammering a blocked key must not extend the block
        clock.advance(Duration::from_secs(10));
        assert!(!limiter.is_allowed("alice"));
        assert_eq!(limiter.time_until_unblocked("alice"), remaining - Duration::from_secs(10));
    }

    #[test]
    fn test_window_expiry_restores_full_budget() {
        let (limiter, clock) = limiter(5);
        assert!(limiter.is_allowed("alice"));
        assert!(limiter.is_allowed("alice"));

        clock.advance(WINDOW + Duration::from_millis(1));

        assert_eq!(limiter.remaining_attempts("alice"), 5);
        assert!(limiter.is_allowed("alice"));
        // Fresh window: the call above was its first attempt
        assert_eq!(limiter.remaining_attempts("alice"), 4);
    }

    #[test]
    fn test_window_boundary_is_strict() {
        let (limiter, clock) = limiter(2);
        assert!(limiter.is_allowed("alice"));

        // Exactly the window edge still counts against the closing window
        clock.advance(WINDOW);
        assert!(limiter.is_allowed("alice"));
        assert!(!limiter.is_allowed("alice"));
    }

    #[test]
    fn test_block_outlives_window() {
        let (limiter, clock) = limiter(1);
        assert!(limiter.is_allowed("alice"));
        assert!(!limiter.is_allowed("alice")); // starts a 2x-window block

        // Past the window but inside the block: still denied
        clock.advance(WINDOW + Duration::from_secs(1));
        assert!(!limiter.is_allowed("alice"));

        // Past the block: window replacement lifts it
        clock.advance(WINDOW + Duration::from_secs(1));
        assert!(limiter.is_allowed("alice"));
    }

    #[test]
    fn test_reset_forgives_a_blocked_key() {
        let (limiter, _clock) = limiter(1);
        limiter.is_allowed("alice");
        assert!(!limiter.is_allowed("alice"));

        limiter.reset("alice");
        assert!(limiter.is_allowed("alice"));
        assert_eq!(limiter.time_until_unblocked("alice"), Duration::ZERO);
    }

    #[test]
    fn test_reset_unknown_key_is_noop() {
        let (limiter, _clock) = limiter(3);
        limiter.reset("nobody");
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_keys_do_not_interfere() {
        let (limiter, _clock) = limiter(2);
        limiter.is_allowed("alice");
        limiter.is_allowed("alice");
        assert!(!limiter.is_allowed("alice"));

        assert_eq!(limiter.remaining_attempts("bob"), 2);
        assert!(limiter.is_allowed("bob"));
    }

    #[test]
    fn test_remaining_attempts_is_a_pure_read() {
        let (limiter, _clock) = limiter(5);
        assert_eq!(limiter.remaining_attempts("alice"), 5);
        assert_eq!(limiter.tracked_keys(), 0);

        limiter.is_allowed("alice");
        limiter.is_allowed("alice");
        assert_eq!(limiter.remaining_attempts("alice"), 5 - 2);
    }

    #[test]
    fn test_single_attempt_budget() {
        let (limiter, _clock) = limiter(1);
        assert!(limiter.is_allowed("alice"));
        assert!(!limiter.is_allowed("alice"));
    }

    #[test]
    fn test_cleanup_spares_blocked_records() {
        let (limiter, clock) = limiter(1);

        // "idle" expires naturally; "hostile" gets blocked
        limiter.is_allowed("idle");
        limiter.is_allowed("hostile");
        limiter.is_allowed("hostile");

        clock.advance(WINDOW + Duration::from_secs(1));
        limiter.cleanup();

        assert_eq!(limiter.tracked_keys(), 1);
        assert!(!limiter.is_allowed("hostile"));
    }

    #[test]
    fn test_cleanup_keeps_active_windows() {
        let (limiter, clock) = limiter(5);
        limiter.is_allowed("alice");

        clock.advance(Duration::from_secs(30));
        limiter.cleanup();

        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(limiter.remaining_attempts("alice"), 4);
    }
}

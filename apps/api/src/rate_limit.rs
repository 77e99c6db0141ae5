//! Per-(user, action) sliding-window rate limiting.
//!
//! Sliding-window log: each bucket holds the timestamps of recent calls
//! for one `(user_id, action)` pair. Buckets are pruned lazily on every
//! check; buckets that prune to empty are dropped, and `sweep()` clears
//! idle buckets so sustained traffic cannot leak memory.
//!
//! Single-process, in-memory only. Limits are enforced per server
//! instance, with no distributed coordination.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

/// Limit configuration supplied by the caller on every check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub limit: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    /// Quiz generation: 3 per minute.
    pub const QUIZ: Self = Self::per_minute(3);
    /// Job-match analysis: 5 per minute.
    pub const JOB_MATCH: Self = Self::per_minute(5);
    /// Skill-gap analysis: 10 per minute.
    pub const SKILL_GAP: Self = Self::per_minute(10);
    /// Chat messages: 10 per minute. No chat endpoints are wired up yet.
    #[allow(dead_code)]
    pub const CHAT: Self = Self::per_minute(10);
    /// Chat messages: 100 per day. No chat endpoints are wired up yet.
    #[allow(dead_code)]
    pub const CHAT_DAILY: Self = Self {
        limit: 100,
        window: Duration::from_secs(86_400),
    };

    const fn per_minute(limit: u32) -> Self {
        Self {
            limit,
            window: Duration::from_secs(60),
        }
    }
}

impl Default for RateLimitConfig {
    /// 5 per minute, matching the limiter-wide convenience default.
    fn default() -> Self {
        Self::per_minute(5)
    }
}

/// Outcome of a rate check. `retry_after` is populated only when the
/// call was rejected, and equals the time until the oldest in-window
/// timestamp falls out of the window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub retry_after: Option<Duration>,
}

impl RateLimitDecision {
    /// Wait time in whole seconds, rounded up, for user-facing messages.
    pub fn retry_after_secs(&self) -> u64 {
        match self.retry_after {
            Some(d) => d.as_millis().div_ceil(1000) as u64,
            None => 0,
        }
    }
}

/// Process-wide sliding-window rate limiter.
pub struct RateLimiter {
    buckets: Mutex<HashMap<(Uuid, String), Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether `user_id` may perform `action` under `config`.
    ///
    /// Two different users, or two different actions for the same user,
    /// never share a bucket.
    pub fn check(&self, user_id: Uuid, action: &str, config: &RateLimitConfig) -> RateLimitDecision {
        self.check_at(user_id, action, config, Instant::now())
    }

    fn check_at(
        &self,
        user_id: Uuid,
        action: &str,
        config: &RateLimitConfig,
        now: Instant,
    ) -> RateLimitDecision {
        let mut buckets = self.lock();
        let timestamps = buckets.entry((user_id, action.to_string())).or_default();

        timestamps.retain(|t| now.duration_since(*t) < config.window);

        if timestamps.len() >= config.limit as usize {
            // Post-prune, every timestamp is within the window, so the
            // subtraction cannot underflow. An empty bucket only trips
            // this branch for limit 0, where the full window applies.
            let retry_after = timestamps
                .first()
                .map(|oldest| config.window - now.duration_since(*oldest))
                .unwrap_or(config.window);
            return RateLimitDecision {
                allowed: false,
                retry_after: Some(retry_after),
            };
        }

        timestamps.push(now);
        RateLimitDecision {
            allowed: true,
            retry_after: None,
        }
    }

    /// Drops every bucket with no in-window timestamps. Run periodically
    /// so buckets for idle users do not accumulate.
    pub fn sweep(&self, max_window: Duration) {
        self.sweep_at(max_window, Instant::now());
    }

    fn sweep_at(&self, max_window: Duration, now: Instant) {
        let mut buckets = self.lock();
        let before = buckets.len();
        buckets.retain(|_, timestamps| {
            timestamps
                .last()
                .is_some_and(|t| now.duration_since(*t) < max_window)
        });
        let dropped = before - buckets.len();
        if dropped > 0 {
            debug!("Rate limiter sweep dropped {dropped} idle buckets");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(Uuid, String), Vec<Instant>>> {
        self.buckets.lock().expect("rate limiter mutex poisoned")
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    fn config(limit: u32) -> RateLimitConfig {
        RateLimitConfig { limit, window: WINDOW }
    }

    #[test]
    fn test_calls_within_limit_are_allowed() {
        let limiter = RateLimiter::new();
        let user = Uuid::new_v4();
        for _ in 0..3 {
            let decision = limiter.check(user, "quiz", &config(3));
            assert!(decision.allowed);
            assert!(decision.retry_after.is_none());
        }
    }

    #[test]
    fn test_call_over_limit_is_rejected_with_wait_time() {
        let limiter = RateLimiter::new();
        let user = Uuid::new_v4();
        for _ in 0..2 {
            assert!(limiter.check(user, "quiz", &config(2)).allowed);
        }
        let decision = limiter.check(user, "quiz", &config(2));
        assert!(!decision.allowed);
        let retry_after = decision.retry_after.expect("rejection carries wait time");
        assert!(retry_after > Duration::ZERO);
        assert!(retry_after <= WINDOW);
    }

    #[test]
    fn test_users_never_share_a_bucket() {
        let limiter = RateLimiter::new();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        assert!(limiter.check(user_a, "quiz", &config(1)).allowed);
        assert!(!limiter.check(user_a, "quiz", &config(1)).allowed);
        assert!(limiter.check(user_b, "quiz", &config(1)).allowed);
    }

    #[test]
    fn test_actions_never_share_a_bucket() {
        let limiter = RateLimiter::new();
        let user = Uuid::new_v4();
        assert!(limiter.check(user, "quiz", &config(1)).allowed);
        assert!(!limiter.check(user, "quiz", &config(1)).allowed);
        assert!(limiter.check(user, "job_match", &config(1)).allowed);
    }

    #[test]
    fn test_timestamps_outside_window_are_pruned() {
        let limiter = RateLimiter::new();
        let user = Uuid::new_v4();
        let cfg = config(1);
        let t0 = Instant::now();

        assert!(limiter.check_at(user, "quiz", &cfg, t0).allowed);
        assert!(!limiter.check_at(user, "quiz", &cfg, t0 + Duration::from_secs(30)).allowed);
        // The first timestamp has left the window.
        assert!(limiter.check_at(user, "quiz", &cfg, t0 + Duration::from_secs(61)).allowed);
    }

    #[test]
    fn test_retry_after_counts_from_oldest_timestamp() {
        let limiter = RateLimiter::new();
        let user = Uuid::new_v4();
        let cfg = config(2);
        let t0 = Instant::now();

        limiter.check_at(user, "quiz", &cfg, t0);
        limiter.check_at(user, "quiz", &cfg, t0 + Duration::from_secs(10));
        let decision = limiter.check_at(user, "quiz", &cfg, t0 + Duration::from_secs(20));
        assert!(!decision.allowed);
        // window(60s) - elapsed-since-oldest(20s) = 40s
        assert_eq!(decision.retry_after, Some(Duration::from_secs(40)));
    }

    #[test]
    fn test_retry_after_secs_rounds_up() {
        let decision = RateLimitDecision {
            allowed: false,
            retry_after: Some(Duration::from_millis(1500)),
        };
        assert_eq!(decision.retry_after_secs(), 2);
    }

    #[test]
    fn test_sweep_drops_idle_buckets() {
        let limiter = RateLimiter::new();
        let cfg = config(5);
        let t0 = Instant::now();

        limiter.check_at(Uuid::new_v4(), "quiz", &cfg, t0);
        limiter.check_at(Uuid::new_v4(), "quiz", &cfg, t0 + Duration::from_secs(50));
        assert_eq!(limiter.lock().len(), 2);

        limiter.sweep_at(WINDOW, t0 + Duration::from_secs(70));
        assert_eq!(limiter.lock().len(), 1);
    }
}

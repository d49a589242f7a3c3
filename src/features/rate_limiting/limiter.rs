//! # Feature: Rate Limiting
//!
//! Sliding-window request limits per user. Uses DashMap for concurrent access
//! from gateway event tasks.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Keyed by user only, windows shared across clones, idle user cleanup
//! - 1.0.0: Initial release with per-user sliding window rate limiting

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Sent instead of a reply when a user exceeds the limit
pub const SLOW_DOWN_MESSAGE: &str = "You're sending messages too quickly! Please slow down.";

#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<DashMap<String, Vec<Instant>>>,
    max_requests: usize,
    time_window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, time_window: Duration) -> Self {
        RateLimiter {
            requests: Arc::new(DashMap::new()),
            max_requests,
            time_window,
        }
    }

    /// Record a request for `user_id`. Returns false if the user is over the limit,
    /// in which case nothing is recorded.
    pub fn check_rate_limit(&self, user_id: &str) -> bool {
        let now = Instant::now();
        let mut entry = self.requests.entry(user_id.to_string()).or_default();

        entry.retain(|&time| now.duration_since(time) < self.time_window);

        if entry.len() >= self.max_requests {
            false
        } else {
            entry.push(now);
            true
        }
    }

    /// Time until `user_id` may send again, zero if allowed now
    pub fn retry_after(&self, user_id: &str) -> Duration {
        let Some(entry) = self.requests.get(user_id) else {
            return Duration::ZERO;
        };
        if entry.len() < self.max_requests {
            return Duration::ZERO;
        }
        entry
            .first()
            .map(|oldest| self.time_window.saturating_sub(oldest.elapsed()))
            .unwrap_or(Duration::ZERO)
    }

    /// Forget users with no request inside the window
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.requests.len();
        self.requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < self.time_window);
            !times.is_empty()
        });
        before - self.requests.len()
    }
}

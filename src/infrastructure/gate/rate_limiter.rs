#[cfg(test)]
#[path = "rate_limiter_test.rs"]
mod tests;

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use chrono::Utc;
use dashmap::DashMap;

use crate::domain::models::GenerationError;

/// Outcome of a rate limit check, mirrored into `X-RateLimit-*` headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp at which the oldest counted request leaves the window.
    pub reset: i64,
}

impl From<RateLimitStatus> for GenerationError {
    fn from(status: RateLimitStatus) -> GenerationError {
        return GenerationError::RateLimited {
            limit: status.limit,
            remaining: status.remaining,
            reset: status.reset,
        };
    }
}

/// Sliding window limiter keyed by caller. Callers whose requests have all
/// left the window are forgotten, at most one window after going quiet.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    requests: DashMap<String, VecDeque<Instant>>,
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> RateLimiter {
        return RateLimiter {
            max_requests,
            window,
            requests: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        };
    }

    /// Drops every caller without a request inside the window. Runs at most once per
    /// window.
    fn sweep(&self, now: Instant) {
        {
            let mut last_sweep = match self.last_sweep.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if now.saturating_duration_since(*last_sweep) < self.window {
                return;
            }
            *last_sweep = now;
        }

        let before = self.requests.len();
        self.requests.retain(|_, timestamps| {
            return timestamps
                .back()
                .map(|last| return now.saturating_duration_since(*last) < self.window)
                .unwrap_or(false);
        });

        tracing::debug!(
            evicted = before.saturating_sub(self.requests.len()),
            "Swept idle rate limit callers"
        );
    }

    pub fn check(&self, key: &str) -> Result<RateLimitStatus, RateLimitStatus> {
        return self.check_at(key, Instant::now());
    }

    /// Counts a request for `key` at `now`. Rejected requests are not counted.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<RateLimitStatus, RateLimitStatus> {
        self.sweep(now);

        let mut entry = self.requests.entry(key.to_string()).or_default();
        let timestamps = entry.value_mut();

        while let Some(&first) = timestamps.front() {
            if now.saturating_duration_since(first) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        let allowed = timestamps.len() < self.max_requests as usize;
        if allowed {
            timestamps.push_back(now);
        }

        let oldest = timestamps.front().copied().unwrap_or(now);
        let until_reset = self
            .window
            .saturating_sub(now.saturating_duration_since(oldest));
        let status = RateLimitStatus {
            limit: self.max_requests,
            remaining: self
                .max_requests
                .saturating_sub(timestamps.len() as u32),
            reset: Utc::now().timestamp() + until_reset.as_secs() as i64,
        };

        if !allowed {
            tracing::debug!(key = key, limit = status.limit, "Rate limit exceeded");
            return Err(status);
        }

        return Ok(status);
    }
}

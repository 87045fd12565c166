//! Retry budget and server-advertised rate limit tracking.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use tracing::debug;

/// Statuses that are retried while budget remains. 520 and 522 are the CDN's
/// "unknown error" and "connection timed out" codes.
pub const RETRY_STATUS_CODES: [u16; 6] = [500, 502, 503, 504, 520, 522];

const RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATELIMIT_LIMIT: &str = "x-ratelimit-limit";
const RATELIMIT_RESET: &str = "x-ratelimit-reset";

pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRY_STATUS_CODES.contains(&status.as_u16())
}

/// Retry configuration for exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    pub retries: u32,
    /// Upper bound for a single backoff sleep.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            max_backoff: Duration::from_secs(32),
        }
    }
}

/// Retry budget for one logical request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    remaining: u32,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            remaining: config.retries,
        }
    }

    pub fn retries_remaining(&self) -> bool {
        self.remaining >= 1
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn attempts_used(&self) -> u32 {
        self.config.retries - self.remaining
    }

    pub fn decrement_retries(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// `min(2^attempts_used + U(0, 1), max_backoff)`.
    pub fn backoff(&self) -> Duration {
        self.backoff_with_jitter(rand::thread_rng().gen::<f64>())
    }

    fn backoff_with_jitter(&self, jitter: f64) -> Duration {
        let exp = i32::try_from(self.attempts_used()).unwrap_or(i32::MAX);
        let secs = (2f64.powi(exp) + jitter).min(self.config.max_backoff.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

/// Rate limit window as reported by the server.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    reset_timestamp: Option<f64>,
    next_request_timestamp: Option<f64>,
    remaining: Option<i64>,
    used: Option<i64>,
    limit: Option<i64>,
}

impl RateLimit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> Option<i64> {
        self.remaining
    }

    pub fn used(&self) -> Option<i64> {
        self.used
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    /// Unix timestamp (seconds) before which no request should be sent.
    pub fn next_request_timestamp(&self) -> Option<f64> {
        self.next_request_timestamp
    }

    /// Update the window from the headers of any response.
    pub fn update_from_headers(&mut self, headers: &HeaderMap) {
        self.update_at(headers, unix_now());
    }

    fn update_at(&mut self, headers: &HeaderMap, now: f64) {
        let Some(remaining) = header_number(headers, RATELIMIT_REMAINING) else {
            // No headers on this response: count it against the last known window.
            if let Some(remaining) = self.remaining.as_mut() {
                *remaining -= 1;
                self.used = Some(self.used.unwrap_or(0) + 1);
                if *remaining <= 0 {
                    self.next_request_timestamp = self.reset_timestamp;
                }
            }
            return;
        };

        self.reset_timestamp = header_number(headers, RATELIMIT_RESET).map(|reset| reset as f64);
        self.limit = header_number(headers, RATELIMIT_LIMIT);
        self.remaining = Some(remaining);
        self.used = self.limit.map(|limit| limit - remaining);

        debug!(
            remaining,
            limit = ?self.limit,
            reset = ?self.reset_timestamp,
            "Rate limit updated"
        );

        self.next_request_timestamp = if remaining <= 0 {
            self.reset_timestamp
        } else {
            Some(now)
        };
    }

    /// How long to wait before the next request, if at all.
    pub fn seconds_to_sleep(&self) -> Option<Duration> {
        self.seconds_to_sleep_at(unix_now())
    }

    fn seconds_to_sleep_at(&self, now: f64) -> Option<Duration> {
        let wait = self.next_request_timestamp? - now;
        (wait > 0.0).then(|| Duration::from_secs_f64(wait))
    }
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .map(|n| n as i64)
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

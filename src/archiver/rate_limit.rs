//! Sliding-window request pacing
//!
//! Admits at most `max_requests` acquisitions within any trailing `window`.
//! Callers that would exceed the budget are suspended until the oldest
//! acquisition in the window expires. The issuance log lives behind an async
//! mutex that stays locked across the wait, so concurrent callers are served
//! one at a time in arrival order.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::config::ArchiveConfig;

/// Window used for the hourly request budget
pub const HOURLY_WINDOW: Duration = Duration::from_secs(3600);

/// Rate limiter over a rolling time window
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    min_spacing: Duration,
    issued: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a request-based rate limiter
    ///
    /// # Arguments
    /// * `max_requests` - Maximum acquisitions per window (must be positive)
    /// * `window` - Length of the trailing window (must be positive)
    pub fn new(max_requests: usize, window: Duration) -> Result<Self, RateLimitError> {
        if max_requests == 0 {
            return Err(RateLimitError::InvalidConfiguration(
                "max_requests must be positive".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(RateLimitError::InvalidConfiguration(
                "time window must be positive".to_string(),
            ));
        }

        Ok(Self {
            max_requests,
            window,
            min_spacing: Duration::ZERO,
            issued: Mutex::new(VecDeque::with_capacity(max_requests)),
        })
    }

    /// Build the limiter for a run: `max_requests_per_hour` over one hour,
    /// spaced by `delay_between_requests`
    pub fn from_config(config: &ArchiveConfig) -> Result<Self, RateLimitError> {
        Ok(Self::new(config.max_requests_per_hour as usize, HOURLY_WINDOW)?
            .with_min_spacing(config.delay_between_requests))
    }

    /// Additionally require at least `spacing` between consecutive acquisitions
    pub fn with_min_spacing(mut self, spacing: Duration) -> Self {
        self.min_spacing = spacing;
        self
    }

    /// Maximum acquisitions per window
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Window length
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until one more request fits the budget, then record it
    ///
    /// Returns how long the caller was suspended.
    pub async fn acquire(&self) -> Duration {
        let mut issued = self.issued.lock().await;
        let started = Instant::now();
        let mut now = started;

        self.evict_expired(&mut issued, now);

        while issued.len() >= self.max_requests {
            let Some(&oldest) = issued.front() else {
                break;
            };
            let ready_at = oldest + self.window;
            if ready_at > now {
                debug!(
                    in_window = issued.len(),
                    wait_ms = (ready_at - now).as_millis() as u64,
                    "Request budget exhausted, waiting for window to advance"
                );
                sleep_until(ready_at).await;
            }
            now = Instant::now();
            self.evict_expired(&mut issued, now);
        }

        if !self.min_spacing.is_zero() {
            if let Some(&last) = issued.back() {
                let ready_at = last + self.min_spacing;
                if ready_at > now {
                    sleep_until(ready_at).await;
                    now = Instant::now();
                }
            }
        }

        issued.push_back(now);
        let waited = now.saturating_duration_since(started);
        crate::metrics::record_rate_limit_wait(waited);
        waited
    }

    /// Number of acquisitions still inside the trailing window
    pub async fn in_window(&self) -> usize {
        let mut issued = self.issued.lock().await;
        self.evict_expired(&mut issued, Instant::now());
        issued.len()
    }

    fn evict_expired(&self, issued: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = issued.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                issued.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Rate limiter errors
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Non-positive budget or window
    #[error("invalid rate limit configuration: {0}")]
    InvalidConfiguration(String),
}

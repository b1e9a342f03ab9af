//! Retry policy for outbound Spotify requests.
//!
//! Capped exponential backoff, driven by a loop in the client rather than
//! recursive self-calls.

use std::time::Duration;

use super::client::SpotifyError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    /// Cap for the exponential growth.
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Backoff to wait after a failed attempt (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let backoff =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(backoff.min(self.max_backoff.as_secs_f64()))
    }

    /// Whether a failed attempt (0-based) should be retried. Errors that
    /// cannot succeed on retry (not-found, bad credentials) never are.
    pub fn should_retry(&self, error: &SpotifyError, attempt: u32) -> bool {
        error.is_retryable() && attempt + 1 < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

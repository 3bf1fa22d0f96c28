//! Retry policy and sleeping abstraction
//!
//! The policy is a pure function from (attempt, failure kind) to an optional
//! backoff; it never sleeps itself. Sleeping goes through [`Sleeper`] so tests
//! can observe backoff schedules without waiting for them.

use async_trait::async_trait;
use std::time::Duration;

/// Kind of transient failure that triggered a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    /// The request timed out; backoff grows exponentially
    Timeout,
    /// The server answered 429; backoff grows linearly
    RateLimited,
}

/// Bounded retry schedule for page downloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// delay = timeout_base * 2^attempt
    pub timeout_base: Duration,
    /// delay = rate_limit_step * (attempt + 1)
    pub rate_limit_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_base: Duration::from_secs(1),
            rate_limit_step: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default backoff bases
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Sets the exponential base used after timeouts.
    #[must_use]
    pub fn with_timeout_base(mut self, base: Duration) -> Self {
        self.timeout_base = base;
        self
    }

    /// Sets the linear step used after HTTP 429.
    #[must_use]
    pub fn with_rate_limit_step(mut self, step: Duration) -> Self {
        self.rate_limit_step = step;
        self
    }

    /// Computes the wait before retrying a failed attempt
    ///
    /// # Arguments
    ///
    /// * `attempt` - Zero-based index of the attempt that just failed
    /// * `kind` - Why it failed
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - Wait this long, then try again
    /// * `None` - The attempt budget is exhausted; do not sleep
    pub fn backoff(&self, attempt: u32, kind: RetryKind) -> Option<Duration> {
        if attempt.saturating_add(1) >= self.max_attempts.max(1) {
            return None;
        }

        let delay = match kind {
            RetryKind::Timeout => self
                .timeout_base
                .saturating_mul(2u32.saturating_pow(attempt)),
            RetryKind::RateLimited => self.rate_limit_step.saturating_mul(attempt + 1),
        };

        Some(delay)
    }
}

/// Something that can wait for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

//! Retry policy shared by the detection and generative clients.
//!
//! A policy bounds the number of attempts, the delay between them, the time a
//! single attempt may take, and which failures are worth another attempt.
//! Every attempt and every backoff sleep races the caller's cancellation token.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::ServiceError;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Wait `step × attempt` after the given failed attempt.
    Linear(Duration),
}

impl Backoff {
    /// Delay after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Linear(step) => step * attempt,
        }
    }
}

/// Bounded retry with backoff, per-attempt timeout and a retryable predicate.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay schedule.
    pub backoff: Backoff,
    /// Upper bound for a single attempt. A timeout counts as transient.
    pub attempt_timeout: Option<Duration>,
    /// Decides whether a failure is retried.
    pub retry_if: fn(&ServiceError) -> bool,
}

impl Default for RetryPolicy {
    /// Three attempts, linear 1 s backoff, 30 s per attempt.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Linear(Duration::from_millis(1000)),
            attempt_timeout: Some(Duration::from_secs(30)),
            retry_if: ServiceError::is_retryable,
        }
    }
}

impl RetryPolicy {
    /// A single attempt with the given timeout.
    #[must_use]
    pub fn single(attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
            attempt_timeout: Some(attempt_timeout),
            retry_if: ServiceError::is_retryable,
        }
    }

    /// Sets the total number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay schedule.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Sets the retryable predicate.
    #[must_use]
    pub const fn with_retry_if(mut self, retry_if: fn(&ServiceError) -> bool) -> Self {
        self.retry_if = retry_if;
        self
    }

    /// Runs `op` until it succeeds, fails permanently, runs out of attempts or
    /// `cancel` fires.
    ///
    /// `op` receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the last failure, or [`ServiceError::Cancelled`] if the token
    /// fired. No attempt or sleep starts after cancellation.
    pub async fn run<T, F, Fut>(
        &self,
        label: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, ServiceError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(ServiceError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ServiceError::Cancelled),
                outcome = self.bounded(label, op(attempt)) => outcome,
            };

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{label} succeeded on attempt {attempt}/{max_attempts}");
                    }
                    return Ok(value);
                }
                Err(err) if attempt < max_attempts && (self.retry_if)(&err) => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        "{label} attempt {attempt}/{max_attempts} failed, retrying in {}ms: {err}",
                        delay.as_millis()
                    );
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(ServiceError::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(err) => {
                    debug!("{label} giving up after attempt {attempt}/{max_attempts}: {err}");
                    return Err(err);
                }
            }
        }
    }

    async fn bounded<T, Fut>(&self, label: &str, fut: Fut) -> Result<T, ServiceError>
    where
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        match self.attempt_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .unwrap_or_else(|_| Err(ServiceError::timeout(label))),
            None => fut.await,
        }
    }
}

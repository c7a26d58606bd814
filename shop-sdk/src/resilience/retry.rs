//! Retry with exponential backoff for upstream calls
//!
//! The executor attempts an operation, sleeps `base * multiplier^n` after the
//! n-th failed attempt (n from 0) and gives up after `max_attempts` with
//! `RetryExhausted`. Every failure counts toward the limit. Sleeping uses the
//! tokio timer, so only the retrying task is delayed.
//!
//! Operations must be idempotent: the executor will run them more than once.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Result, ServiceError};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one (always >= 1)
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub base_delay: Duration,

    /// Growth factor applied to the delay after every failed attempt
    pub multiplier: f64,

    /// Upper bound for a single backoff delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetryPolicy {{ max_attempts: {}, base_delay: {:?}, multiplier: {}, max_delay: {:?} }}",
            self.max_attempts, self.base_delay, self.multiplier, self.max_delay
        )
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Check the policy invariants
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ServiceError::configuration(
                "Retry policy needs at least one attempt",
            ));
        }

        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ServiceError::configuration(format!(
                "Retry multiplier must be a finite value >= 1.0, got {}",
                self.multiplier
            )));
        }

        if self.max_delay < self.base_delay {
            return Err(ServiceError::configuration(
                "Retry max delay must not be shorter than the base delay",
            ));
        }

        Ok(())
    }
}

/// Executor for retry operations with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryExecutor {
    /// Create a new retry executor with the specified policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Get the current retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute a fallible operation with retries according to the policy
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run(None, operation).await
    }

    /// Execute with retries, giving up with `DeadlineExceeded` once `deadline` passes
    ///
    /// An attempt still in flight at the deadline is dropped, and a backoff
    /// sleep that would end past the deadline is never started.
    pub async fn execute_with_deadline<F, Fut, T>(&self, deadline: Instant, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run(Some(deadline), operation).await
    }

    /// Execute with retries bounded by a timeout measured from now
    pub async fn execute_within<F, Fut, T>(&self, timeout: Duration, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run(Some(Instant::now() + timeout), operation).await
    }

    /// The backoff schedule for one invocation
    ///
    /// A fresh schedule is built per call, so no retry state is shared
    /// between invocations.
    pub fn backoff_schedule(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.policy.base_delay)
            .with_multiplier(self.policy.multiplier)
            .with_randomization_factor(0.0)
            .with_max_interval(self.policy.max_delay)
            .with_max_elapsed_time(None)
            .build()
    }

    async fn run<F, Fut, T>(&self, deadline: Option<Instant>, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut schedule = self.backoff_schedule();
        let mut attempts = 0;

        loop {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(ServiceError::deadline_exceeded(format!(
                        "deadline passed after {} attempt(s)",
                        attempts
                    )));
                }
            }

            attempts += 1;
            let outcome = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, operation()).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        return Err(ServiceError::deadline_exceeded(format!(
                            "deadline passed during attempt {}",
                            attempts
                        )))
                    }
                },
                None => operation().await,
            };

            let err = match outcome {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(attempts, "operation succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if attempts >= max_attempts {
                warn!(attempts, error = %err, "retry attempts exhausted");
                return Err(ServiceError::retry_exhausted(attempts, err));
            }

            let Some(delay) = schedule.next_backoff() else {
                return Err(ServiceError::retry_exhausted(attempts, err));
            };

            if let Some(deadline) = deadline {
                if Instant::now() + delay >= deadline {
                    return Err(ServiceError::deadline_exceeded(format!(
                        "next retry in {:?} would pass the deadline (last error: {})",
                        delay, err
                    )));
                }
            }

            warn!(
                attempt = attempts,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "operation failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

//! Retry utilities for resilient operations
//!
//! Two shapes of retry live here:
//!
//! - [`with_retry_if`]: exponential backoff around a fallible operation
//!   (page navigation), stopping early on errors the predicate rejects.
//! - [`retry_until`]: bounded, fixed-delay repetition of an infallible
//!   operation until its result is accepted (whole acquisition cycles).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first one
    pub max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,

    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 2000,
            max_delay_ms: 8000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom max retries
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Create a retry configuration with custom delays
    pub fn with_delays(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
            backoff_multiplier: 2.0,
        }
    }

    /// Total number of attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Calculate delay for a given attempt using exponential backoff
    pub(crate) fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = if attempt == 0 {
            0
        } else {
            let exponential =
                self.base_delay_ms as f64 * self.backoff_multiplier.powi((attempt - 1) as i32);
            (exponential as u64).min(self.max_delay_ms)
        };

        Duration::from_millis(delay_ms)
    }
}

/// Execute an operation with retry logic and exponential backoff
///
/// Returns `Ok(T)` on the first success, or the last error once all
/// attempts are spent. Errors for which `should_retry` returns false are
/// returned immediately.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = config.calculate_delay(attempt);
            debug!(
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                "Retrying operation after delay"
            );
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(attempt = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                if !should_retry(&e) {
                    warn!(error = %e, "Non-retryable error encountered");
                    return Err(e);
                }

                warn!(
                    attempt = attempt + 1,
                    max_attempts = config.max_attempts(),
                    error = %e,
                    "Operation failed"
                );

                if attempt >= config.max_retries {
                    return Err(e);
                }
            }
        }

        attempt += 1;
    }
}

/// Outcome of [`retry_until`]
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    /// The accepted value, or the last value produced
    pub value: T,

    /// How many times the operation ran
    pub attempts: u32,

    /// Whether `value` satisfied the acceptance predicate
    pub accepted: bool,
}

/// Run `operation` up to `max_attempts` times with a fixed `delay` between
/// runs, stopping at the first value `accept` approves
pub async fn retry_until<T, F, Fut, P>(
    max_attempts: u32,
    delay: Duration,
    mut operation: F,
    accept: P,
) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    P: Fn(&T) -> bool,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let value = operation().await;

        if accept(&value) {
            return Attempted {
                value,
                attempts,
                accepted: true,
            };
        }

        if attempts >= max_attempts {
            return Attempted {
                value,
                attempts,
                accepted: false,
            };
        }

        debug!(
            attempt = attempts,
            max_attempts = max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Result not accepted, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

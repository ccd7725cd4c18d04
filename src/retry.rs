use std::{future::Future, time::Duration};

use crate::{backoff::backoff_delay, context::Interruption, CallContext, ConfigError};

/// Outcome of a single failed attempt, telling the retry loop whether
/// another attempt is warranted.
#[derive(Debug)]
pub enum Attempt<E> {
    /// The failure will not go away by retrying; surface it now.
    Permanent(E),
    /// The failure is transient; wait and try again.
    Retryable(E),
}

impl<E> Attempt<E> {
    pub fn into_inner(self) -> E {
        match self {
            Self::Permanent(err) | Self::Retryable(err) => err,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

/// Final failure of [`RetryPolicy::execute`].
#[derive(Debug)]
pub enum RetryError<E> {
    /// The last error observed, either permanent or after retries ran out.
    Failed(E),
    /// The context ended while waiting to retry.
    Interrupted { reason: Interruption, last: E },
}

impl<E> RetryError<E> {
    pub fn into_last(self) -> E {
        match self {
            Self::Failed(err) | Self::Interrupted { last: err, .. } => err,
        }
    }
}

/// Validated retry configuration.
///
/// `max_attempts` counts retries after the initial try, so an operation that
/// keeps failing transiently runs `max_attempts + 1` times in total.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    factor: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, factor: f64) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts);
        }
        if base_delay.is_zero() {
            return Err(ConfigError::InvalidBaseDelay);
        }
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ConfigError::InvalidFactor);
        }
        Ok(Self {
            max_attempts,
            base_delay,
            factor,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Wait inserted before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        backoff_delay(self.base_delay, self.factor, attempt)
    }

    /// Runs `operation` until it succeeds, fails permanently, or exhausts
    /// the configured retries.
    ///
    /// The operation receives the zero-based attempt index. Between
    /// retryable failures the loop sleeps for [`RetryPolicy::delay`] while
    /// watching `ctx`; if the context ends first the last error is returned
    /// as [`RetryError::Interrupted`].
    pub async fn execute<T, E, F, Fut>(
        &self,
        ctx: &CallContext,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Attempt<E>>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(Attempt::Permanent(err)) => return Err(RetryError::Failed(err)),
                Err(Attempt::Retryable(err)) => err,
            };
            if attempt >= self.max_attempts {
                return Err(RetryError::Failed(err));
            }

            attempt += 1;
            let delay = self.delay(attempt);
            tracing::debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying after backoff"
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                reason = ctx.done() => {
                    return Err(RetryError::Interrupted { reason, last: err });
                }
            }
        }
    }
}

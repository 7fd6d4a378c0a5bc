//! Connection retry policy and provider operation hooks.
//!
//! Retries only cover establishing a call. Once the first increment of a
//! stream has been handed to the caller nothing is replayed.
//!
//! DashScope throttles per key (`Throttling.RateQuota` and friends), so
//! rate-limited failures wait at least [`RetryPolicy::throttle_backoff`]
//! before the next attempt.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use hprovider::{ProviderError, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3);
//! let throttled = ProviderError::upstream(429, Some("Throttling.RateQuota"), None);
//! let reset = ProviderError::transport("connection reset");
//!
//! assert_eq!(policy.retry_delay(1, &throttled), Some(Duration::from_secs(1)));
//! assert_eq!(policy.retry_delay(1, &reset), Some(Duration::from_millis(200)));
//! assert_eq!(policy.retry_delay(3, &reset), None);
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::Duration;

use crate::{ProviderError, ProviderErrorKind, ProviderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOperation {
    Complete,
    Stream,
}

impl ProviderOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Stream => "stream",
        }
    }
}

impl Display for ProviderOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Floor for the wait after a rate-limited attempt.
    pub throttle_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            throttle_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1)
    }

    /// How long to wait before attempt `attempt + 1`, or `None` when the
    /// failure is final.
    pub fn retry_delay(&self, attempt: u32, error: &ProviderError) -> Option<Duration> {
        if !error.retryable || attempt >= self.max_attempts {
            return None;
        }

        let delay = self.backoff_for_attempt(attempt);
        Some(match error.kind {
            ProviderErrorKind::RateLimited => delay.max(self.throttle_backoff),
            _ => delay,
        })
    }

    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let unbounded = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(unbounded.min(self.max_backoff.as_secs_f64()))
    }
}

pub trait ProviderOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: ProviderOperation, _attempt: u32) {
    }

    fn on_retry_scheduled(
        &self,
        _provider: ProviderId,
        _operation: ProviderOperation,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _provider: ProviderId, _operation: ProviderOperation, _attempts: u32) {}

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: ProviderOperation,
        _attempts: u32,
        _error: &ProviderError,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOperationHooks;

impl ProviderOperationHooks for NoopOperationHooks {}

pub async fn execute_with_retry<T, Op, OpFuture, Sleep, SleepFuture>(
    provider: ProviderId,
    operation: ProviderOperation,
    policy: &RetryPolicy,
    hooks: &dyn ProviderOperationHooks,
    mut execute: Op,
    mut sleep: Sleep,
) -> Result<T, ProviderError>
where
    Op: FnMut(u32) -> OpFuture,
    OpFuture: Future<Output = Result<T, ProviderError>>,
    Sleep: FnMut(Duration) -> SleepFuture,
    SleepFuture: Future<Output = ()>,
{
    let mut attempt = 1;

    loop {
        hooks.on_attempt_start(provider, operation, attempt);

        let error = match execute(attempt).await {
            Ok(value) => {
                hooks.on_success(provider, operation, attempt);
                return Ok(value);
            }
            Err(error) => error,
        };

        let Some(delay) = policy.retry_delay(attempt, &error) else {
            hooks.on_failure(provider, operation, attempt, &error);
            return Err(error);
        };

        hooks.on_retry_scheduled(provider, operation, attempt, delay, &error);
        sleep(delay).await;
        attempt += 1;
    }
}

use std::future::Future;
use std::time::Duration;

use anyhow::anyhow;
use tracing::warn;

use crate::config::RetrySettings;

use super::cancel::CancelSignal;
use super::error::StageError;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry budget applied to every collaborator call and work-item execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): doubles each time, capped.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.backoff_ms),
            max_backoff: MAX_BACKOFF,
        }
    }
}

/// Runs `operation` under `timeout`, retrying failures and timeouts per
/// `policy`. Cancellation wins over an in-flight attempt and over backoff.
pub async fn call_with_retry<T, F, Fut>(
    call: &'static str,
    policy: RetryPolicy,
    timeout: Duration,
    cancel: &CancelSignal,
    mut operation: F,
) -> Result<T, StageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StageError::Cancelled),
            result = tokio::time::timeout(timeout, operation()) => result,
        };

        let error = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => error,
            Err(_) => anyhow!("{call} timed out after {:?}", timeout),
        };

        if attempts > policy.max_retries {
            return Err(StageError::Collaborator {
                call,
                attempts,
                source: error,
            });
        }

        let delay = policy.backoff_for(attempts);
        warn!(
            call,
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %format!("{error:#}"),
            "call failed, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StageError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

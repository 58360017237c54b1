use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::config::RetryConfig;
use crate::errors::CoreError;

/// Exponential backoff without jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Wait before the first retry, doubled after every failed attempt
    pub initial_delay: Duration,
    /// Stop early once the summed waits would exceed this
    pub max_total_delay: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_total_delay: None,
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn with_max_total_delay(mut self, cap: Duration) -> Self {
        self.max_total_delay = Some(cap);
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(c: &RetryConfig) -> Self {
        Self {
            max_retries: c.max_retries,
            initial_delay: Duration::from_millis(c.initial_delay_ms),
            max_total_delay: c.max_total_delay_ms.map(Duration::from_millis),
        }
    }
}

/// Run `call`, retrying failures with exponential backoff.
///
/// Makes at most `1 + max_retries` attempts, sleeping `d, 2d, 4d, ...` in
/// between. The error of the last attempt is returned if none succeeds.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut call: F) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut delay = policy.initial_delay;
    let mut waited = Duration::ZERO;
    let mut attempt = 0;

    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempt >= policy.max_retries {
            return Err(err);
        }
        if let Some(cap) = policy.max_total_delay {
            if waited + delay > cap {
                debug!(?waited, ?cap, "retry budget exhausted");
                return Err(err);
            }
        }

        attempt += 1;
        debug!(
            error = %err,
            delay_ms = delay.as_millis() as u64,
            "request failed, retrying ({attempt}/{})",
            policy.max_retries
        );
        tokio::time::sleep(delay).await;
        waited += delay;
        delay = delay.saturating_mul(2);
    }
}

use crate::error::FetchError;
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded, unconditional retry: no backoff, no jitter, every transport or
/// parse error counts as one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
    delay: Duration,
}

impl RetryPolicy {
    /// Bound used by the base settings, quota, capability and ASR language feeds.
    pub const STANDARD: Self = Self::attempts(3);
    /// Bound used by the MAUS language feed.
    pub const MAUS: Self = Self::attempts(2);

    /// A policy allowing `attempts` tries in total; zero is treated as one.
    #[must_use]
    pub const fn attempts(attempts: u32) -> Self {
        let max_attempts = match NonZeroU32::new(attempts) {
            Some(n) => n,
            None => NonZeroU32::MIN,
        };
        Self { max_attempts, delay: Duration::ZERO }
    }

    /// Fixed pause between two attempts.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Runs `op` until it succeeds or the policy's bound is reached.
///
/// `op` receives the 1-based attempt number and must contain the whole
/// fallible operation (request plus parsing). The last error is returned once
/// the bound is exhausted. [`FetchError::ConfigMissing`] is returned at once,
/// since no further attempt can produce the missing value.
pub async fn retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max = policy.max_attempts();
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(feed = label, attempt, "Fetch succeeded after retry");
                }
                return Ok(value);
            },
            Err(err) if err.is_config_missing() => return Err(err),
            Err(err) if attempt < max => {
                warn!(feed = label, attempt, max, error = %err, "Fetch attempt failed, retrying");
                if !policy.delay().is_zero() {
                    tokio::time::sleep(policy.delay()).await;
                }
                attempt += 1;
            },
            Err(err) => {
                warn!(feed = label, attempts = attempt, error = %err, "Fetch failed, retries exhausted");
                return Err(err);
            },
        }
    }
}

//! Exponential-backoff retry around gateway calls.
//!
//! Every call the build makes to a [`GenerationGateway`](super::GenerationGateway)
//! goes through [`RetryPolicy::run`], so a transient provider failure costs
//! a delay instead of the whole build.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, Result, StageError};

/// Tunable parameters for retrying a failed gateway call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on the delay between attempts, in milliseconds.
    pub max_delay_ms: u64,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "retry.max_attempts".to_string(),
                value: self.max_attempts.to_string(),
            }
            .into());
        }

        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "retry.multiplier".to_string(),
                value: self.multiplier.to_string(),
            }
            .into());
        }

        Ok(())
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Calculate the next backoff delay, clamped to [`RetryPolicy::max_delay`].
    pub fn next_delay(&self, current: Duration) -> Duration {
        let next_ms = (current.as_millis() as f64 * self.multiplier) as u64;
        Duration::from_millis(next_ms).min(self.max_delay())
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// Errors that a new attempt cannot fix are returned as they are. When
    /// every attempt fails the last error is wrapped in
    /// [`StageError::RetriesExhausted`] for `stage`.
    pub async fn run<T, F, Fut>(&self, stage: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delay = self.initial_delay();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(stage, attempt, "gateway call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_recoverable() => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(StageError::RetriesExhausted {
                        stage: stage.to_string(),
                        attempts: attempt,
                        reason: e.to_string(),
                    }
                    .into());
                }
                Err(e) => {
                    warn!(
                        stage,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying gateway call after failure"
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.next_delay(delay);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompositorError, ErrorKind};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_backoff_doubles_and_clamps() {
        let policy = RetryPolicy::default();
        let mut delay = policy.initial_delay();
        let expected = [2_000, 4_000, 8_000, 16_000, 30_000, 30_000];

        for ms in expected {
            delay = policy.next_delay(delay);
            assert_eq!(delay, Duration::from_millis(ms));
        }
    }

    #[test]
    fn test_invalid_policy() {
        assert!(RetryPolicy::immediate(0).validate().is_err());

        let mut policy = RetryPolicy::default();
        policy.multiplier = 0.5;
        assert!(policy.validate().is_err());
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let value = policy
            .run("video_generation", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(CompositorError::stage("video_generation", "503"))
                } else {
                    Ok(42)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(2);

        let err = policy
            .run("interpolation", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(CompositorError::stage("interpolation", "timeout"))
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(err.kind(), ErrorKind::StageFailure);
        assert!(matches!(
            err,
            CompositorError::Stage(StageError::RetriesExhausted { attempts: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(5);

        let err = policy
            .run("keywords", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(CompositorError::invalid_argument("empty prompt"))
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}

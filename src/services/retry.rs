use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use super::error::DomainError;

/// Exponential backoff with symmetric jitter, shared by every adapter call
/// the cascade engine makes through [`retry_with_backoff`].
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub cap_delay: Duration,
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            cap_delay: Duration::from_secs(30),
            jitter_fraction: 0.3,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// `min(base * 2^n, cap)`, attempt 0-indexed, before jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.cap_delay)
    }

    /// `max(0, floor(delay * (1 + U[-f, f])))`.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt).as_millis() as f64;
        let offset = rand::thread_rng().gen_range(-self.jitter_fraction..=self.jitter_fraction);
        let jittered = (base * (1.0 + offset)).floor().max(0.0);
        Duration::from_millis(jittered as u64)
    }
}

/// Runs `f` up to `config.max_retries + 1` total attempts. Aborts immediately
/// on a non-retryable error. Sleep is skipped after the final attempt.
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    provider_name: &str,
    f: F,
) -> Result<T, DomainError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let total_attempts = config.max_retries + 1;
    let mut last_err = None;

    for attempt in 0..total_attempts {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                if attempt + 1 < total_attempts {
                    let delay = config.jittered_delay(attempt);
                    warn!(
                        provider = provider_name,
                        attempt = attempt + 1,
                        max_attempts = total_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after transient provider error"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        DomainError::adapter(super::error::ErrorKind::Unknown, "retry loop exhausted with no error")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_doubles_and_caps() {
        let config = RetryConfig {
            max_retries: 10,
            base_delay: Duration::from_secs(1),
            cap_delay: Duration::from_secs(30),
            jitter_fraction: 0.3,
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(5), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn non_retryable_error_aborts_immediately() {
        let config = RetryConfig::new(3);
        let calls = AtomicU32::new(0);
        let result: Result<(), DomainError> = retry_with_backoff(&config, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DomainError::Validation("bad request".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retryable_error_performs_max_retries_plus_one_attempts() {
        let config = RetryConfig {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            cap_delay: Duration::from_millis(5),
            jitter_fraction: 0.0,
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), DomainError> = retry_with_backoff(&config, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DomainError::adapter(
                    super::super::error::ErrorKind::Timeout,
                    "timed out",
                ))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            cap_delay: Duration::from_millis(5),
            jitter_fraction: 0.0,
        };
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(&config, "test", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(DomainError::adapter(
                        super::super::error::ErrorKind::NetworkError,
                        "connection reset",
                    ))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

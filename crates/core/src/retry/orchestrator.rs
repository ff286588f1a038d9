//! Retry loop driven by success and failure predicates

use std::future::Future;

use tokio::time::Instant;

use super::backoff::{BaseInterval, compute_delay};
use super::config::{RetryBudget, RetryConfig};
use crate::error::{Error, Result};

/// Verdict of a success predicate on the value an attempt produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// The value is final
    Pass,
    /// Try again after the configured interval
    Retry,
    /// Try again, using this base interval instead of the configured one
    RetryAfter(BaseInterval),
}

impl From<bool> for Check {
    fn from(passed: bool) -> Self {
        if passed { Check::Pass } else { Check::Retry }
    }
}

/// Verdict of a failure classifier on the error an attempt produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Propagate the error immediately
    Fatal,
    /// Transient; try again after the configured interval
    Retry,
    /// Transient; try again using this base interval
    RetryAfter(BaseInterval),
}

impl From<bool> for Recovery {
    fn from(recoverable: bool) -> Self {
        if recoverable {
            Recovery::Retry
        } else {
            Recovery::Fatal
        }
    }
}

/// Retry a fallible async operation until `is_success` passes
///
/// Failed attempts are fatal unless `config.ignore_failure_as_retry` is set,
/// in which case every error is treated as transient.
///
/// # Example
/// ```ignore
/// let object = retry(
///     &RetryConfig::for_reads(),
///     || async { store.get_object(&path).await },
///     |bytes, _| !bytes.is_empty(),
/// ).await?;
/// ```
pub async fn retry<T, F, Fut, S, C>(config: &RetryConfig, operation: F, is_success: S) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    S: FnMut(&T, &RetryConfig) -> C,
    C: Into<Check>,
{
    run(
        config,
        operation,
        is_success,
        None::<fn(&Error, &RetryConfig) -> Recovery>,
    )
    .await
}

/// Retry with an explicit classifier deciding which errors are transient
pub async fn retry_with_classifier<T, F, Fut, S, C, R, V>(
    config: &RetryConfig,
    operation: F,
    is_success: S,
    is_recoverable: R,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    S: FnMut(&T, &RetryConfig) -> C,
    C: Into<Check>,
    R: FnMut(&Error, &RetryConfig) -> V,
    V: Into<Recovery>,
{
    run(config, operation, is_success, Some(is_recoverable)).await
}

async fn run<T, F, Fut, S, C, R, V>(
    config: &RetryConfig,
    mut operation: F,
    mut is_success: S,
    mut is_recoverable: Option<R>,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    S: FnMut(&T, &RetryConfig) -> C,
    C: Into<Check>,
    R: FnMut(&Error, &RetryConfig) -> V,
    V: Into<Recovery>,
{
    config.validate()?;
    let budget = config.budget();
    let started = Instant::now();
    let mut attempts_count: u32 = 0;

    loop {
        let (last, interval_override) = match operation().await {
            Ok(data) => match is_success(&data, config).into() {
                Check::Pass => return Ok(data),
                Check::Retry => (Ok(data), None),
                Check::RetryAfter(base) => (Ok(data), Some(base)),
            },
            Err(error) => {
                let verdict = match is_recoverable.as_mut() {
                    Some(classify) => classify(&error, config).into(),
                    None if config.ignore_failure_as_retry => Recovery::Retry,
                    None => return Err(error),
                };
                match verdict {
                    Recovery::Fatal => return Err(error),
                    Recovery::Retry => (Err(error), None),
                    Recovery::RetryAfter(base) => (Err(error), Some(base)),
                }
            }
        };

        let budget_remains = match budget {
            RetryBudget::Attempts(max) => attempts_count < max,
            RetryBudget::Timeout(limit) => started.elapsed() < limit,
        };

        if !budget_remains {
            return match last {
                Ok(data) if config.ignore_error_at_exhaustion => Ok(data),
                // No value to hand back; surface the last transient failure
                Err(error) if config.ignore_error_at_exhaustion => Err(error),
                _ => Err(Error::RetryExhausted {
                    attempts: attempts_count + 1,
                    message: config.exhausted_message(attempts_count),
                }),
            };
        }

        let base = interval_override.unwrap_or(config.base_interval_ms);
        let delay = compute_delay(attempts_count, base, &mut rand::thread_rng())?;

        match &last {
            Ok(_) => tracing::debug!(
                attempt = attempts_count + 1,
                delay_ms = delay.as_millis() as u64,
                "Result did not pass the success check, retrying"
            ),
            Err(e) => tracing::debug!(
                attempt = attempts_count + 1,
                delay_ms = delay.as_millis() as u64,
                error = %e,
                "Retrying after transient error"
            ),
        }
        drop(last);

        tokio::time::sleep(delay).await;
        attempts_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryBuilder;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast(attempts: u32) -> RetryConfig {
        RetryBuilder::new()
            .retry_attempts(attempts)
            .base_interval_ms(1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let mut calls = 0;
        let result = retry(
            &fast(3),
            || {
                calls += 1;
                async { Ok::<_, Error>(42) }
            },
            |_, _| true,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_unclassified_error_is_fatal() {
        let mut calls = 0;
        let result: Result<()> = retry(
            &fast(3),
            || {
                calls += 1;
                async { Err(Error::Network("connection reset".into())) }
            },
            |_, _| true,
        )
        .await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_ignore_failure_retries_errors_until_success() {
        let config = RetryBuilder::new()
            .retry_attempts(5)
            .base_interval_ms(1)
            .ignore_failure_as_retry(true)
            .build()
            .unwrap();
        let count = Arc::new(AtomicU32::new(0));

        let result = retry(
            &config,
            || {
                let count = count.clone();
                async move {
                    if count.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::General("flaky".into()))
                    } else {
                        Ok("done")
                    }
                }
            },
            |_, _| true,
        )
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_classifier_rejects_error() {
        let mut calls = 0;
        let config = RetryBuilder::new()
            .base_interval_ms(1)
            .ignore_failure_as_retry(true)
            .build()
            .unwrap();
        let result: Result<()> = retry_with_classifier(
            &config,
            || {
                calls += 1;
                async { Err(Error::NotFound("gone".into())) }
            },
            |_, _| true,
            |e, _| !e.is_not_found(),
        )
        .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_value_when_ignored() {
        let config = RetryBuilder::new()
            .retry_attempts(2)
            .base_interval_ms(1)
            .ignore_error_at_exhaustion(true)
            .build()
            .unwrap();
        let mut calls = 0;

        let result = retry(
            &config,
            || {
                calls += 1;
                async { Ok::<_, Error>("X") }
            },
            |_, _| false,
        )
        .await;

        assert_eq!(result.unwrap(), "X");
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_exhaustion_fails_with_default_message() {
        let mut calls = 0;
        let result = retry(
            &fast(2),
            || {
                calls += 1;
                async { Ok::<_, Error>(0) }
            },
            |_, _| false,
        )
        .await;

        match result {
            Err(Error::RetryExhausted { attempts, message }) => {
                assert_eq!(attempts, 3);
                assert_eq!(
                    message,
                    "2 attempts to retry the procedure failed to pass the test"
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_exhaustion_with_custom_message() {
        let config = RetryBuilder::new()
            .retry_attempts(1)
            .base_interval_ms(1)
            .error_message("bucket never became ready")
            .build()
            .unwrap();
        let err = retry(&config, || async { Ok::<_, Error>(()) }, |_, _| false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "bucket never became ready");
    }

    #[tokio::test]
    async fn test_exhausted_transient_error_is_surfaced_when_ignored() {
        let config = RetryBuilder::new()
            .retry_attempts(1)
            .base_interval_ms(1)
            .ignore_failure_as_retry(true)
            .ignore_error_at_exhaustion(true)
            .build()
            .unwrap();
        let result: Result<()> = retry(
            &config,
            || async { Err(Error::Network("503 Service Unavailable".into())) },
            |_, _| true,
        )
        .await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_timeout_mode_is_bounded() {
        let config = RetryBuilder::new()
            .timeout(Duration::from_millis(100))
            .base_interval_ms(10)
            .build()
            .unwrap();
        let started = std::time::Instant::now();

        let result = retry(&config, || async { Ok::<_, Error>(()) }, |_, _| false).await;

        let elapsed = started.elapsed();
        assert!(matches!(result, Err(Error::RetryExhausted { .. })));
        assert!(elapsed >= Duration::from_millis(100), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_override_interval_replaces_base() {
        // A 60s base would time the test out if the override were ignored
        let config = RetryBuilder::new()
            .retry_attempts(2)
            .base_interval_ms(60_000)
            .build()
            .unwrap();
        let mut calls = 0;

        let result = retry(
            &config,
            || {
                calls += 1;
                let n = calls;
                async move { Ok::<_, Error>(n) }
            },
            |n, _| {
                if *n < 3 {
                    Check::RetryAfter(BaseInterval::Fixed(1))
                } else {
                    Check::Pass
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_first_attempt() {
        let config = RetryConfig {
            base_interval_ms: BaseInterval::Range(5, 1),
            ..RetryConfig::default()
        };
        let mut calls = 0;
        let result = retry(
            &config,
            || {
                calls += 1;
                async { Ok::<_, Error>(()) }
            },
            |_, _| true,
        )
        .await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn test_concurrent_invocations_are_independent() {
        let config = fast(3);
        let a = AtomicU32::new(0);
        let b = AtomicU32::new(0);

        let (ra, rb) = tokio::join!(
            retry(
                &config,
                || {
                    let n = a.fetch_add(1, Ordering::SeqCst);
                    async move { Ok::<_, Error>(n) }
                },
                |n, _| *n >= 2,
            ),
            retry(
                &config,
                || {
                    let n = b.fetch_add(1, Ordering::SeqCst);
                    async move { Ok::<_, Error>(n) }
                },
                |_, _| true,
            )
        );

        assert_eq!(ra.unwrap(), 2);
        assert_eq!(rb.unwrap(), 0);
        assert_eq!(a.load(Ordering::SeqCst), 3);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }
}

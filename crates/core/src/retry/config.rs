//! Retry configuration and builder

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::backoff::BaseInterval;
use crate::error::Result;

/// Configuration for one `retry` invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Number of retries after the first attempt (attempt-count mode)
    pub retry_attempts: u32,

    /// Wall-clock budget; when set it takes precedence over `retry_attempts`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Base interval, fixed or `[low, high)`
    pub base_interval_ms: BaseInterval,

    /// Retry any failed attempt when no failure classifier is supplied
    pub ignore_failure_as_retry: bool,

    /// Return the last value instead of failing once the budget is spent
    pub ignore_error_at_exhaustion: bool,

    /// Message used for `Error::RetryExhausted`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_error_message: Option<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 5,
            timeout_ms: None,
            base_interval_ms: BaseInterval::default(),
            ignore_failure_as_retry: false,
            ignore_error_at_exhaustion: false,
            custom_error_message: None,
        }
    }
}

/// The budget that bounds a retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBudget {
    /// Retry while fewer than this many retries have been made
    Attempts(u32),
    /// Retry while less than this much time has elapsed since the first attempt
    Timeout(Duration),
}

impl RetryConfig {
    /// Defaults for idempotent reads: any failure is retried for up to 10s
    pub fn for_reads() -> Self {
        Self {
            timeout_ms: Some(10_000),
            base_interval_ms: BaseInterval::Range(500, 2000),
            ignore_failure_as_retry: true,
            ..Self::default()
        }
    }

    /// Defaults for uploads: throttled writes back off a little longer
    pub fn for_writes() -> Self {
        Self {
            timeout_ms: Some(10_000),
            base_interval_ms: BaseInterval::Range(800, 2000),
            ignore_failure_as_retry: true,
            ..Self::default()
        }
    }

    /// The active budget; timeout mode wins when both are configured
    pub fn budget(&self) -> RetryBudget {
        match self.timeout_ms {
            Some(ms) => RetryBudget::Timeout(Duration::from_millis(ms)),
            None => RetryBudget::Attempts(self.retry_attempts),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.base_interval_ms.validate()
    }

    /// Message for `RetryExhausted` after `retries` retries
    pub fn exhausted_message(&self, retries: u32) -> String {
        if let Some(msg) = &self.custom_error_message {
            return msg.clone();
        }
        match self.budget() {
            RetryBudget::Attempts(n) => {
                format!("{n} attempts to retry the procedure failed to pass the test")
            }
            RetryBudget::Timeout(limit) => format!(
                "retry timed out after {}ms ({retries} retries) without passing the test",
                limit.as_millis()
            ),
        }
    }
}

/// Retry configuration builder for easy customization
#[derive(Debug, Clone, Default)]
pub struct RetryBuilder {
    config: RetryConfig,
}

impl RetryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retry_attempts(mut self, n: u32) -> Self {
        self.config.retry_attempts = n;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn base_interval_ms(mut self, ms: u64) -> Self {
        self.config.base_interval_ms = BaseInterval::Fixed(ms);
        self
    }

    pub fn base_interval_range(mut self, low: u64, high: u64) -> Self {
        self.config.base_interval_ms = BaseInterval::Range(low, high);
        self
    }

    pub fn ignore_failure_as_retry(mut self, yes: bool) -> Self {
        self.config.ignore_failure_as_retry = yes;
        self
    }

    pub fn ignore_error_at_exhaustion(mut self, yes: bool) -> Self {
        self.config.ignore_error_at_exhaustion = yes;
        self
    }

    pub fn error_message(mut self, msg: impl Into<String>) -> Self {
        self.config.custom_error_message = Some(msg.into());
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<RetryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.budget(), RetryBudget::Attempts(5));
        assert!(!config.ignore_failure_as_retry);
        assert!(!config.ignore_error_at_exhaustion);
    }

    #[test]
    fn test_timeout_takes_precedence() {
        let config = RetryBuilder::new()
            .retry_attempts(3)
            .timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(
            config.budget(),
            RetryBudget::Timeout(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_builder_rejects_bad_range() {
        let err = RetryBuilder::new()
            .base_interval_range(2000, 800)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_exhausted_messages() {
        let config = RetryBuilder::new().retry_attempts(2).build().unwrap();
        assert_eq!(
            config.exhausted_message(2),
            "2 attempts to retry the procedure failed to pass the test"
        );

        let custom = RetryBuilder::new().error_message("gave up").build().unwrap();
        assert_eq!(custom.exhausted_message(5), "gave up");

        let timed = RetryConfig::for_reads();
        assert!(timed.exhausted_message(4).contains("10000ms"));
    }

    #[test]
    fn test_toml_round_trip_with_range() {
        let config: RetryConfig = toml::from_str(
            r#"
            timeout_ms = 10000
            base_interval_ms = [800, 2000]
            ignore_failure_as_retry = true
            "#,
        )
        .unwrap();
        assert_eq!(config, RetryConfig::for_writes());
    }
}

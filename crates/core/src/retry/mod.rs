//! Retry mechanism with exponential backoff and jitter
//!
//! Wraps arbitrary async operations with caller-supplied success and
//! failure predicates. The budget is either an attempt count or a
//! wall-clock timeout; delays grow by 1.5x per retry from a fixed or
//! randomly drawn base interval.

mod backoff;
mod classify;
mod config;
mod orchestrator;

pub use backoff::{BACKOFF_MULTIPLIER, BackoffPolicy, BaseInterval, compute_delay};
pub use classify::{is_retryable_error, recover_transient};
pub use config::{RetryBudget, RetryBuilder, RetryConfig};
pub use orchestrator::{Check, Recovery, retry, retry_with_classifier};

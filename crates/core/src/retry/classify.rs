//! Default classification of transient failures

use super::config::RetryConfig;
use super::orchestrator::Recovery;
use crate::error::Error;

/// Check if an error is retryable (transient)
pub fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::Network(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("timeout")
                || msg_lower.contains("timed out")
                || msg_lower.contains("connection reset")
                || msg_lower.contains("connection refused")
                || msg_lower.contains("connection closed")
                || msg_lower.contains("429")
                || msg_lower.contains("too many requests")
                || msg_lower.contains("rate limit")
                || msg_lower.contains("500")
                || msg_lower.contains("502")
                || msg_lower.contains("503")
                || msg_lower.contains("504")
                || msg_lower.contains("service unavailable")
                || msg_lower.contains("backend error")
        }
        Error::Http { status, .. } => *status == 408 || *status == 429 || *status >= 500,
        Error::Io(e) => matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted
        ),
        Error::General(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("timeout") || msg_lower.contains("temporary")
        }
        Error::Auth(_)
        | Error::NotFound(_)
        | Error::Conflict(_)
        | Error::InvalidPath(_)
        | Error::InvalidBucketName { .. }
        | Error::ProfileNotFound(_)
        | Error::Config(_)
        | Error::RetryExhausted { .. }
        | Error::Archive(_)
        | Error::Json(_) => false,
    }
}

/// Classifier for `retry_with_classifier` built on [`is_retryable_error`]
pub fn recover_transient(error: &Error, _config: &RetryConfig) -> Recovery {
    is_retryable_error(error).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error(&Error::Network(
            "connection timeout".to_string()
        )));
        assert!(is_retryable_error(&Error::Network(
            "503 Service Unavailable".to_string()
        )));
        assert!(is_retryable_error(&Error::Network(
            "429 Too Many Requests".to_string()
        )));
        assert!(is_retryable_error(&Error::Http {
            status: 502,
            message: "bad gateway".into()
        }));

        assert!(!is_retryable_error(&Error::Auth("access denied".to_string())));
        assert!(!is_retryable_error(&Error::NotFound(
            "object not found".to_string()
        )));
        assert!(!is_retryable_error(&Error::Http {
            status: 400,
            message: "bad request".into()
        }));
    }

    #[test]
    fn test_io_kinds() {
        let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        assert!(is_retryable_error(&Error::Io(reset)));

        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(!is_retryable_error(&Error::Io(denied)));
    }

    #[test]
    fn test_recover_transient() {
        let config = RetryConfig::default();
        assert_eq!(
            recover_transient(&Error::Network("timeout".into()), &config),
            Recovery::Retry
        );
        assert_eq!(
            recover_transient(&Error::Conflict("bucket not empty".into()), &config),
            Recovery::Fatal
        );
    }
}

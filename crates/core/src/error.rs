//! Error types for gsz-core
//!
//! One error enum is shared by the retry engine, the zip pipeline and every
//! `ObjectStore` implementation so that predicates can classify failures
//! without knowing which transport produced them.

use thiserror::Error;

/// Result type alias for gsz-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by gsz
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid retry, backoff, destination or profile configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A path could not be parsed or does not describe the expected resource
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A bucket name violates the naming rules
    #[error("Invalid bucket name '{name}': {reason}")]
    InvalidBucketName { name: String, reason: String },

    /// Named profile does not exist
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Authentication or authorization failure (401/403)
    #[error("Access denied: {0}")]
    Auth(String),

    /// Bucket or object does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource state conflict (409), e.g. deleting a non-empty bucket
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Transport failure, throttling or server-side error
    #[error("Network error: {0}")]
    Network(String),

    /// Any other unsuccessful HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The retry budget was consumed without a successful attempt
    #[error("{message}")]
    RetryExhausted { attempts: u32, message: String },

    /// The archive encoder failed
    #[error("Archive error: {0}")]
    Archive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    General(String),
}

impl Error {
    /// HTTP status carried by the error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Auth(_) => Some(403),
            Error::NotFound(_) => Some(404),
            Error::Conflict(_) => Some(409),
            _ => None,
        }
    }

    /// Whether this error reports a missing bucket or object
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<::zip::result::ZipError> for Error {
    fn from(e: ::zip::result::ZipError) -> Self {
        Error::Archive(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_exhausted_displays_message_only() {
        let err = Error::RetryExhausted {
            attempts: 5,
            message: "5 attempts to retry the procedure failed to pass the test".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "5 attempts to retry the procedure failed to pass the test"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::NotFound("x".into()).status(), Some(404));
        assert_eq!(
            Error::Http {
                status: 418,
                message: "teapot".into()
            }
            .status(),
            Some(418)
        );
        assert_eq!(Error::Network("reset".into()).status(), None);
    }

    #[test]
    fn test_invalid_bucket_name_display() {
        let err = Error::InvalidBucketName {
            name: "ab".into(),
            reason: "too short".into(),
        };
        assert_eq!(err.to_string(), "Invalid bucket name 'ab': too short");
    }
}

//! Process exit codes
//!
//! Codes are stable so scripts can branch on the kind of failure.

use gsz_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad arguments, paths or configuration
    UsageError = 2,
    /// Transport failure, throttling or server error
    NetworkError = 3,
    AuthError = 4,
    NotFound = 5,
    Conflict = 6,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Exit code for a library error
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Config(_)
            | Error::InvalidPath(_)
            | Error::InvalidBucketName { .. }
            | Error::ProfileNotFound(_) => Self::UsageError,
            Error::Auth(_) => Self::AuthError,
            Error::NotFound(_) => Self::NotFound,
            Error::Conflict(_) => Self::Conflict,
            Error::Network(_) | Error::RetryExhausted { .. } => Self::NetworkError,
            Error::Http { status, .. } if *status == 429 || *status >= 500 => Self::NetworkError,
            _ => Self::GeneralError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

//! Error types for si-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for si-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for si-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bucket not registered
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Bucket already registered
    #[error("Bucket already exists: {0}")]
    BucketExists(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport failure: connection refused, relay unreachable, body read failure
    #[error("Network error: {0}")]
    Network(String),

    /// Listing endpoint answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A single listing request exceeded its deadline
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Listing was cancelled before it completed
    #[error("Listing cancelled")]
    Cancelled,
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidUrl(_) => 2, // UsageError
            Error::Network(_) | Error::Timeout(_) => 3,   // NetworkError
            Error::Http { status: 404, .. } => 5,         // NotFound
            Error::Http { .. } => 3,                      // NetworkError
            Error::BucketNotFound(_) => 5,                // NotFound
            Error::BucketExists(_) => 6,                  // Conflict
            Error::Cancelled => 130,                      // Interrupted
            _ => 1,                                       // GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Timeout(Duration::from_secs(1)).exit_code(), 3);
        assert_eq!(
            Error::Http {
                status: 503,
                body: String::new()
            }
            .exit_code(),
            3
        );
        assert_eq!(
            Error::Http {
                status: 404,
                body: String::new()
            }
            .exit_code(),
            5
        );
        assert_eq!(Error::BucketNotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::BucketExists("test".into()).exit_code(), 6);
        assert_eq!(Error::Cancelled.exit_code(), 130);
        assert_eq!(
            Error::TomlParse(toml::from_str::<toml::Table>("=").unwrap_err()).exit_code(),
            1
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::BucketNotFound("photos".into());
        assert_eq!(err.to_string(), "Bucket not found: photos");

        let err = Error::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Request timed out after 30s");

        let err = Error::Http {
            status: 403,
            body: "AccessDenied".into(),
        };
        assert_eq!(err.to_string(), "HTTP 403: AccessDenied");
    }
}

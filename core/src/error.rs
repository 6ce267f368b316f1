//! Error types for the LoadTest REST client.
//!
//! # Design
//! Status failures are split by the call that produced them: a rejected
//! `authenticate` is an `Authentication` error, every other rejected call is a
//! `Request` error carrying the operation name. Bodies that arrive with an
//! accepted status but do not match the expected schema are `Decoding`
//! errors. Transport failures pass through unchanged.

use thiserror::Error;

/// Errors returned by `Session` operations and the `LoadTestClient` codec.
#[derive(Debug, Error)]
pub enum LoadTestError {
    /// The session could not be configured (proxy URL, protocol, config file).
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The authentication endpoint rejected the credentials.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The service answered with a status outside 200/201/202/204.
    ///
    /// `message` is either `"{ExceptionMessage} Error code: {ErrorCode}"` or
    /// the raw status line when the error body could not be parsed.
    #[error("{operation} failed: {message}")]
    Request {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// An accepted response body did not match the expected entity schema.
    #[error("Failed to decode {entity}: {message}")]
    Decoding { entity: String, message: String },

    /// A request entity could not be serialized to XML.
    #[error("Failed to encode {entity}: {message}")]
    Encoding { entity: String, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadTestError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// The server-derived message for `Request` and `Authentication` errors.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Request { message, .. } | Self::Authentication { message } => Some(message),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadTestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_names_the_operation() {
        let err = LoadTestError::Request {
            operation: "start_run",
            status: 500,
            message: "Test not found Error code: 1100".to_string(),
        };
        assert_eq!(err.to_string(), "start_run failed: Test not found Error code: 1100");
        assert_eq!(err.server_message(), Some("Test not found Error code: 1100"));
    }

    #[test]
    fn io_errors_convert_with_question_mark() {
        fn fails() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink closed"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(LoadTestError::Io(_))));
    }

    #[test]
    fn configuration_error_has_no_server_message() {
        let err = LoadTestError::configuration("bad proxy");
        assert!(err.server_message().is_none());
        assert_eq!(err.to_string(), "Configuration error: bad proxy");
    }
}

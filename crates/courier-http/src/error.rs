//! HTTP client error types

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by [`HttpClient`](crate::HttpClient) operations.
///
/// Every transport maps its own failures into this set, so callers never see
/// a backend-specific error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Endpoint descriptor could not be resolved into an absolute URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// DNS, connection, timeout or socket failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response status outside 200..=299
    #[error("Unexpected HTTP status {0}")]
    StatusCode(u16),

    /// Response body could not be decoded into the requested type
    #[error("Decoding failed: {0}")]
    DecodingFailed(String),

    /// Any other transport or backend failure
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The caller cancelled the request before it completed
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// Check if the facade's retry loop may re-send after this error.
    ///
    /// Status failures are only retried when an interceptor signals it, so
    /// they are not considered retryable here.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::NetworkError(_))
    }

    /// Status code carried by a `StatusCode` failure
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::StatusCode(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        // URLs are parsed before reaching reqwest, so builder errors here are
        // malformed headers and land in RequestFailed with everything else.
        if err.is_timeout() || err.is_connect() {
            ClientError::NetworkError(err.to_string())
        } else if err.is_request() || err.is_body() {
            // Failures while writing the request or reading the body are I/O
            ClientError::NetworkError(err.to_string())
        } else {
            ClientError::RequestFailed(err.to_string())
        }
    }
}

impl From<ureq::Error> for ClientError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => ClientError::StatusCode(code),
            ureq::Error::BadUri(uri) => ClientError::InvalidUrl(uri),
            ureq::Error::Timeout(_)
            | ureq::Error::Io(_)
            | ureq::Error::HostNotFound
            | ureq::Error::ConnectionFailed => ClientError::NetworkError(err.to_string()),
            other => ClientError::RequestFailed(other.to_string()),
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

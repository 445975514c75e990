//! HTTP client error types

use thiserror::Error;

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, HttpError>;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network request failed before a response arrived
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid proxy configuration
    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    /// Invalid header value
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Non-2xx HTTP status
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Response body was not the JSON we expected
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// Retry limit exceeded
    #[error("Retry limit exceeded after {attempts} attempts: {source}")]
    RetryLimitExceeded {
        attempts: u32,
        #[source]
        source: Box<HttpError>,
    },

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),
}

impl HttpError {
    /// Check if error is transient and worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            // No response at all: timeouts, refused connections, resets
            HttpError::RequestFailed(e) => e.status().is_none() && !e.is_builder(),
            HttpError::HttpStatus { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// HTTP status of the error, looking through exhausted retries
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            HttpError::HttpStatus { status, .. } => Some(*status),
            HttpError::RequestFailed(e) => e.status(),
            HttpError::RetryLimitExceeded { source, .. } => source.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn status(code: u16) -> HttpError {
        HttpError::HttpStatus {
            status: StatusCode::from_u16(code).unwrap(),
            message: String::new(),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
    }

    #[test]
    fn test_client_errors_not_retryable() {
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!HttpError::Decode("eof".to_string()).is_retryable());
    }

    #[test]
    fn test_status_through_retry_limit() {
        let err = HttpError::RetryLimitExceeded {
            attempts: 3,
            source: Box::new(status(503)),
        };
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!err.is_retryable());
    }
}

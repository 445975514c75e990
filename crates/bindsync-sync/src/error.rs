//! Error types for remote calls and sync runs

use bindsync_config::ConfigError;
use bindsync_http::{HttpError, StatusCode};
use thiserror::Error;

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Failure of a single remote call
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Credential missing or rejected (HTTP 401/403)
    #[error("Authentication failed (HTTP {0})")]
    Auth(u16),

    /// Any other HTTP failure, retries already exhausted
    #[error("Remote request failed: {0}")]
    Http(HttpError),

    /// A 2xx response without the fields we need
    #[error("Unexpected response: {0}")]
    Malformed(String),

    /// Endpoint could not be built from the configured base URL
    #[error("Invalid endpoint: {0}")]
    Endpoint(String),
}

impl RemoteError {
    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Auth(_))
    }
}

impl From<HttpError> for RemoteError {
    fn from(err: HttpError) -> Self {
        match err.status() {
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN) => {
                RemoteError::Auth(err.status().map(|s| s.as_u16()).unwrap_or_default())
            }
            _ => RemoteError::Http(err),
        }
    }
}

/// Run-level failures; any of these stops the run before mutation
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Pagination broke off; planning on a partial index is unsafe
    #[error("Remote index is incomplete after {fetched} rows: {source}")]
    PartialIndex {
        fetched: usize,
        #[source]
        source: RemoteError,
    },

    /// Name or Action column absent from the remote database
    #[error("Remote database is missing required properties: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error(transparent)]
    Remote(RemoteError),
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Auth(status) => {
                SyncError::Auth(format!("remote rejected the token (HTTP {})", status))
            }
            other => SyncError::Remote(other),
        }
    }
}

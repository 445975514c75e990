// CLI error types and operator-facing messages

use bindsync_config::ConfigError;
use bindsync_keybinds::ParseError;
use bindsync_sync::{RemoteError, SyncError};
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("{failed} of {attempted} operations failed")]
    PartialFailure { failed: usize, attempted: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!(
                    "Invalid argument: {}\n\nRun 'bindsync --help' for usage information.",
                    message
                )
            }
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::Config(msg) => {
                format!(
                    "Configuration error: {}\n\nRun 'bindsync config show' to check the effective configuration.",
                    msg
                )
            }
            CliError::Input(msg) => format!("Could not read keybinding records: {}", msg),
            CliError::Auth(msg) => {
                format!(
                    "Authentication failed: {}\n\nCheck remote.token or the BINDSYNC_TOKEN environment variable.",
                    msg
                )
            }
            CliError::Remote(msg) => format!("Remote store error: {}", msg),
            CliError::PartialFailure { failed, attempted } => {
                format!(
                    "{} of {} operations failed; the rest were applied.\n\nRe-run 'bindsync sync' to retry the failed rows.",
                    failed, attempted
                )
            }
            CliError::Internal(msg) => {
                format!("Internal error: {}\n\nPlease report this issue.", msg)
            }
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<ParseError> for CliError {
    fn from(err: ParseError) -> Self {
        CliError::Input(err.to_string())
    }
}

impl From<RemoteError> for CliError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Auth(status) => CliError::Auth(format!("HTTP {}", status)),
            other => CliError::Remote(other.to_string()),
        }
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Config(e) => e.into(),
            SyncError::Auth(msg) => CliError::Auth(msg),
            SyncError::Remote(e) => e.into(),
            other => CliError::Remote(other.to_string()),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_errors_map_to_categories() {
        let err: CliError = SyncError::Auth("bad token".into()).into();
        assert!(matches!(err, CliError::Auth(_)));

        let err: CliError = SyncError::Config(ConfigError::Missing("remote.database_id".into())).into();
        assert!(matches!(err, CliError::Config(_)));
        assert!(err.user_message().contains("bindsync config show"));

        let err: CliError = SyncError::Schema {
            missing: vec!["Action".into()],
        }
        .into();
        assert!(err.user_message().contains("Action"));
    }
}

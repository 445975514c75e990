//! Error types for keybinding records

use thiserror::Error;

/// Errors that can occur while reading collector output
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON syntax: {0}")]
    InvalidJson(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Unknown binding type: {0}")]
    InvalidBindingType(String),

    #[error("Unknown record format: {0}")]
    UnknownFormat(String),

    #[error("Parse error at record {line}: {message}")]
    LineError { line: usize, message: String },
}

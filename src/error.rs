//! Error types for db-export.
//!
//! Defines the main error enum used throughout the export pipeline.

use thiserror::Error;

/// Main error type for export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Unresolvable table or field references, malformed clauses, bad config files.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Data-store failures (missing table, syntax errors, timeouts, etc.)
    #[error("Execution error: {0}")]
    Execution(String),

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failures while encoding an output format.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExportError {
    /// Creates a configuration error with the given message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an encoding error with the given message.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "Configuration Error",
            Self::Execution(_) => "Execution Error",
            Self::Connection(_) => "Connection Error",
            Self::Encoding(_) => "Encoding Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the message without the category prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::Configuration(msg)
            | Self::Execution(msg)
            | Self::Connection(msg)
            | Self::Encoding(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        Self::Encoding(format!("CSV: {e}"))
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encoding(format!("JSON: {e}"))
    }
}

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;

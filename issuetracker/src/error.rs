//! Unified error handling for the issue tracker library
//!
//! Storage backends, configuration loading and the HTTP layer all report
//! failures through [`IssueTrackerError`]. The HTTP layer decides which of
//! them become soft errors and which become `500` responses.

use crate::config::ConfigError;
use std::io;
use thiserror::Error;

/// The main error type for the issue tracker library
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IssueTrackerError {
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// No issue exists with the given id
    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    /// The given id is not a well-formed issue identifier
    #[error("Invalid issue id: {0}")]
    InvalidIssueId(String),

    /// A field value could not be cast to the field's type
    #[error("Invalid value for field '{field}': {reason}")]
    InvalidFieldValue {
        /// Name of the offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Generic error with context
    #[error("{message}")]
    Context {
        /// Context message
        message: String,
        /// Underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl IssueTrackerError {
    /// Create an invalid field value error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFieldValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means "no such issue" to a caller, either because
    /// the id was well-formed but unknown or because it could not be parsed
    pub fn is_missing_issue(&self) -> bool {
        matches!(self, Self::IssueNotFound(_) | Self::InvalidIssueId(_))
    }
}

/// Result type alias for issue tracker operations
pub type Result<T> = std::result::Result<T, IssueTrackerError>;

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, msg: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<S: Into<String>>(self, msg: S) -> Result<T> {
        self.map_err(|e| IssueTrackerError::Context {
            message: msg.into(),
            source: Box::new(e),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| IssueTrackerError::Context {
            message: f().into(),
            source: Box::new(e),
        })
    }
}

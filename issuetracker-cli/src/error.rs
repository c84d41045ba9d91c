//! Error handling for the issuetracker CLI
//!
//! Commands return [`CliResult`]; the error carries the exit code the process
//! should end with along with the underlying cause.

use crate::exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_WARNING};
use std::error::Error;
use std::fmt;

/// CLI-specific result type that preserves error information
pub type CliResult<T> = Result<T, CliError>;

/// CLI error type that includes both error information and suggested exit code
#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub exit_code: i32,
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl CliError {
    /// Create a new CLI error with a message and exit code
    pub fn new(message: impl Into<String>, exit_code: i32) -> Self {
        Self {
            message: message.into(),
            exit_code,
            source: None,
        }
    }

    /// Create a CLI error from another error with a specific exit code
    pub fn from_error<E: Error + Send + Sync + 'static>(error: E, exit_code: i32) -> Self {
        Self {
            message: error.to_string(),
            exit_code,
            source: Some(Box::new(error)),
        }
    }

    /// Runtime failure (exit code 1)
    pub fn general<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Self::from_error(error, EXIT_WARNING)
    }

    /// Configuration failure (exit code 2)
    pub fn validation<E: Error + Send + Sync + 'static>(error: E) -> Self {
        Self::from_error(error, EXIT_ERROR)
    }

    /// Prefix the message with what was being attempted
    pub fn context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{}: {}", context, self.message);
        self
    }

    /// The message followed by every distinct cause
    pub fn full_chain(&self) -> String {
        let mut result = self.message.clone();

        let mut current_source = self.source();
        while let Some(err) = current_source {
            let cause = err.to_string();
            // `from_error` copies the first cause into the message
            if !self.message.ends_with(&cause) {
                result.push_str(&format!("\n  Caused by: {}", cause));
            }
            current_source = err.source();
        }

        result
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

/// Extension trait for converting results to CLI results
pub trait IntoCliResult<T> {
    fn cli_error(self, exit_code: i32) -> CliResult<T>;
    fn cli_general_error(self) -> CliResult<T>;
    fn cli_validation_error(self) -> CliResult<T>;
}

impl<T, E: Error + Send + Sync + 'static> IntoCliResult<T> for Result<T, E> {
    fn cli_error(self, exit_code: i32) -> CliResult<T> {
        self.map_err(|e| CliError::from_error(e, exit_code))
    }

    fn cli_general_error(self) -> CliResult<T> {
        self.map_err(CliError::general)
    }

    fn cli_validation_error(self) -> CliResult<T> {
        self.map_err(CliError::validation)
    }
}

/// Convert a CliResult to an exit code, printing the full error chain if needed
pub fn handle_cli_result<T>(result: CliResult<T>) -> i32 {
    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(e) => {
            tracing::error!("{}", e.full_chain());
            eprintln!("Error: {}", e.full_chain());
            e.exit_code
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuetracker::{ConfigError, IssueTrackerError};

    #[test]
    fn test_exit_codes_by_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        assert_eq!(CliError::general(io).exit_code, EXIT_WARNING);

        let invalid = ConfigError::InvalidValue {
            field: "port".to_string(),
            value: "x".to_string(),
            hint: "port must be a number".to_string(),
        };
        assert_eq!(CliError::validation(invalid).exit_code, EXIT_ERROR);
    }

    #[test]
    fn test_full_chain_lists_nested_causes() {
        let err: Result<(), IssueTrackerError> = Err(IssueTrackerError::Context {
            message: "Failed to bind 127.0.0.1:3000".to_string(),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "address in use",
            )),
        });

        let cli_err = err.cli_general_error().unwrap_err().context("Cannot start server");
        let chain = cli_err.full_chain();
        assert!(chain.starts_with("Cannot start server: "));
        assert!(chain.contains("Caused by: address in use"));
    }

    #[test]
    fn test_handle_cli_result() {
        assert_eq!(handle_cli_result(Ok::<(), CliError>(())), EXIT_SUCCESS);
        assert_eq!(
            handle_cli_result::<()>(Err(CliError::new("bad", EXIT_ERROR))),
            EXIT_ERROR
        );
    }
}

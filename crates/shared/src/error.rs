//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An amount expression could not be evaluated.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Remote storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Synchronization precondition or worker failure.
    #[error("Sync error: {0}")]
    Sync(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Local file system error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Evaluation(_) => 65,
            Self::NotFound(_) => 66,
            Self::Storage(_) | Self::Sync(_) => 69,
            Self::Io(_) => 74,
            Self::Configuration(_) => 78,
            Self::Internal(_) => 70,
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Evaluation(_) => "EVALUATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Sync(_) => "SYNC_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<crate::types::MoneyParseError> for AppError {
    fn from(err: crate::types::MoneyParseError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;

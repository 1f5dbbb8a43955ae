//! Storage error types.

use mmx_shared::AppError;
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// File not found in storage.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Invalid storage key format.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Local file could not be read or written.
    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => Self::NotFound(key),
            StorageError::Configuration(msg) => Self::Configuration(msg),
            StorageError::Io(e) => Self::Io(e.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            StorageError::file_too_large(2048, 1024).to_string(),
            "file size 2048 bytes exceeds maximum allowed 1024 bytes"
        );
        assert_eq!(
            StorageError::not_found("db/main.mmb").to_string(),
            "file not found: db/main.mmb"
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = StorageError::not_found("x.mmb").into();
        assert!(matches!(app, AppError::NotFound(ref key) if key == "x.mmb"));

        let app: AppError = StorageError::operation("timeout").into();
        assert_eq!(app.error_code(), "STORAGE_ERROR");

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let app: AppError = StorageError::from(io).into();
        assert_eq!(app.error_code(), "IO_ERROR");
    }
}

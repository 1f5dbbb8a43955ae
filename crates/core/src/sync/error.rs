//! Sync error types.

use std::path::PathBuf;

use mmx_shared::AppError;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised while synchronizing a database file.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transfer or remote lookup failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No metadata is recorded for the local database.
    #[error("database is not registered: {}", path.display())]
    UnknownDatabase {
        /// Local database path.
        path: PathBuf,
    },

    /// No database is currently open.
    #[error("no current database")]
    NoCurrentDatabase,

    /// Preferences or database list could not be read or written.
    #[error("sync state file error: {0}")]
    Io(#[from] std::io::Error),

    /// Preferences or database list are not valid JSON.
    #[error("sync state file is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The background worker has shut down.
    #[error("sync worker is not running")]
    WorkerStopped,
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Storage(e) => e.into(),
            SyncError::Io(e) => Self::Io(e.to_string()),
            SyncError::UnknownDatabase { .. } | SyncError::NoCurrentDatabase => {
                Self::NotFound(err.to_string())
            }
            other => Self::Sync(other.to_string()),
        }
    }
}

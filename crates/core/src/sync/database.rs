//! Recently opened databases and their sync metadata.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::SyncError;
use super::persist::{read_json, write_json};
use crate::storage::RemoteVersion;

/// A local database file and the remote file it is linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Path of the local database file.
    pub local_path: PathBuf,
    /// Remote file path, empty when the database is not linked.
    #[serde(default)]
    pub remote_path: String,
    /// Local changes not uploaded yet.
    #[serde(default)]
    pub is_local_file_changed: bool,
    /// Bumped on every local change, so a transfer can tell whether the
    /// file was edited while it ran.
    #[serde(default)]
    pub change_count: u64,
    /// Remote revision seen at the last transfer.
    #[serde(default)]
    pub remote_version: Option<RemoteVersion>,
    /// Time of the last completed transfer.
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl DatabaseMetadata {
    /// Metadata for a database that has never been synchronized.
    #[must_use]
    pub fn new(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            is_local_file_changed: false,
            change_count: 0,
            remote_version: None,
            last_synced_at: None,
        }
    }

    /// Records a local edit. Returns true when the flag was not set yet.
    pub fn mark_changed(&mut self) -> bool {
        self.change_count = self.change_count.wrapping_add(1);
        !std::mem::replace(&mut self.is_local_file_changed, true)
    }

    /// True when a remote file is linked.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        !self.remote_path.trim().is_empty()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecentDatabasesFile {
    #[serde(default)]
    current: Option<PathBuf>,
    #[serde(default)]
    databases: Vec<DatabaseMetadata>,
}

/// The list of recent databases, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentDatabases {
    path: PathBuf,
    current: Option<PathBuf>,
    databases: Vec<DatabaseMetadata>,
}

impl RecentDatabases {
    /// An empty list stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: None,
            databases: Vec::new(),
        }
    }

    /// Loads the list, empty when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let path = path.into();
        let file: RecentDatabasesFile = read_json(&path).await?.unwrap_or_default();
        Ok(Self {
            path,
            current: file.current,
            databases: file.databases,
        })
    }

    /// Persists the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self) -> Result<(), SyncError> {
        let file = RecentDatabasesFile {
            current: self.current.clone(),
            databases: self.databases.clone(),
        };
        write_json(&self.path, &file).await
    }

    /// The file the list is stored in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The currently open database.
    #[must_use]
    pub fn current(&self) -> Option<&DatabaseMetadata> {
        self.current.as_deref().and_then(|p| self.get(p))
    }

    /// Mutable access to the currently open database.
    pub fn current_mut(&mut self) -> Option<&mut DatabaseMetadata> {
        let current = self.current.clone()?;
        self.get_mut(&current)
    }

    /// Looks up a database by local path.
    #[must_use]
    pub fn get(&self, local_path: &Path) -> Option<&DatabaseMetadata> {
        self.databases.iter().find(|db| db.local_path == local_path)
    }

    /// Mutable lookup by local path.
    pub fn get_mut(&mut self, local_path: &Path) -> Option<&mut DatabaseMetadata> {
        self.databases
            .iter_mut()
            .find(|db| db.local_path == local_path)
    }

    /// Adds or replaces the entry for the database's local path.
    pub fn insert(&mut self, metadata: DatabaseMetadata) {
        match self.get_mut(&metadata.local_path) {
            Some(existing) => *existing = metadata,
            None => self.databases.push(metadata),
        }
    }

    /// Makes a known database current. Returns false if it is unknown.
    pub fn set_current(&mut self, local_path: &Path) -> bool {
        if self.get(local_path).is_none() {
            return false;
        }
        self.current = Some(local_path.to_path_buf());
        true
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &DatabaseMetadata> {
        self.databases.iter()
    }
}

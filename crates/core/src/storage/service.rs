//! Storage service implementation using Apache OpenDAL.

use std::path::{Path, PathBuf};

use opendal::{ErrorKind, Metadata, Operator, services};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Identity of a remote file revision.
///
/// Two stats of the same object compare equal until the object is rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVersion {
    /// File size in bytes.
    pub content_length: u64,
    /// Last modification time as reported by the provider.
    pub last_modified: Option<String>,
    /// Entity tag, when the provider has one.
    pub etag: Option<String>,
}

impl RemoteVersion {
    fn from_metadata(meta: &Metadata) -> Self {
        Self {
            content_length: meta.content_length(),
            last_modified: meta.last_modified().map(|t| t.to_string()),
            etag: meta.etag().map(String::from),
        }
    }
}

/// Storage service for database files.
#[derive(Debug, Clone)]
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Validate a file size against the configured limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is too large.
    pub fn validate_upload(&self, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }
        Ok(())
    }

    /// Normalize a remote path into a storage key.
    ///
    /// Backslashes become slashes and leading slashes are dropped. Empty,
    /// `.` and `..` segments are rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not name a file.
    pub fn remote_key(path: &str) -> Result<String, StorageError> {
        let normalized = path.trim().replace('\\', "/");
        let key = normalized.trim_start_matches('/');

        if key.is_empty()
            || key
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(StorageError::InvalidKey(path.to_string()));
        }

        Ok(key.to_string())
    }

    /// Upload a local database file, replacing the remote copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the local file cannot be read, is too large or
    /// the write fails.
    pub async fn upload(&self, local: &Path, remote: &str) -> Result<RemoteVersion, StorageError> {
        let key = Self::remote_key(remote)?;
        let size = tokio::fs::metadata(local).await?.len();
        self.validate_upload(size)?;

        let data = tokio::fs::read(local).await?;
        self.operator.write(&key, data).await?;

        let version = self.stat(&key).await?;
        info!(
            local = %local.display(),
            remote = %key,
            bytes = size,
            provider = self.provider_name(),
            "Database uploaded"
        );
        Ok(version)
    }

    /// Download a remote database file over the local path.
    ///
    /// The content is written to a sibling `.part` file first and renamed
    /// into place, so a failed transfer leaves the local file untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote file is missing or the local file
    /// cannot be written.
    pub async fn download(&self, remote: &str, local: &Path) -> Result<RemoteVersion, StorageError> {
        let key = Self::remote_key(remote)?;
        let version = self.stat(&key).await?;
        self.validate_upload(version.content_length)?;

        let data = self.operator.read(&key).await?.to_vec();

        if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let partial = partial_path(local)?;
        tokio::fs::write(&partial, &data).await?;
        if let Err(err) = tokio::fs::rename(&partial, local).await {
            warn!(path = %partial.display(), error = %err, "Could not move download into place");
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(err.into());
        }

        info!(
            remote = %key,
            local = %local.display(),
            bytes = data.len(),
            provider = self.provider_name(),
            "Database downloaded"
        );
        Ok(version)
    }

    /// Current version of a remote file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the file does not exist.
    pub async fn stat(&self, remote: &str) -> Result<RemoteVersion, StorageError> {
        let key = Self::remote_key(remote)?;
        match self.operator.stat(&key).await {
            Ok(meta) => Ok(RemoteVersion::from_metadata(&meta)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(key)),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, remote: &str) -> Result<(), StorageError> {
        let key = Self::remote_key(remote)?;
        self.operator.delete(&key).await.map_err(StorageError::from)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, remote: &str) -> bool {
        match self.stat(remote).await {
            Ok(_) => true,
            Err(StorageError::NotFound { .. }) => false,
            Err(e) => {
                debug!(remote, error = %e, "Existence check failed");
                false
            }
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

fn partial_path(local: &Path) -> Result<PathBuf, StorageError> {
    let name = local
        .file_name()
        .ok_or_else(|| StorageError::InvalidKey(local.display().to_string()))?;
    let mut partial = name.to_os_string();
    partial.push(".part");
    Ok(local.with_file_name(partial))
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

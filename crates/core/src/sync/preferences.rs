//! Synchronization preferences.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::SyncError;
use super::persist::{read_json, write_json};

/// User preferences for database synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPreferences {
    /// Periodic synchronization is enabled.
    pub enabled: bool,
    /// Skip automatic synchronization on metered connections.
    pub sync_only_on_wifi: bool,
    /// Heartbeat period in minutes, 0 disables the heartbeat.
    pub sync_interval_minutes: u32,
    /// Delay between a local change and the automatic upload.
    pub upload_delay_secs: u64,
}

impl SyncPreferences {
    /// Default heartbeat period.
    pub const DEFAULT_INTERVAL_MINUTES: u32 = 30;
    /// Default delayed upload.
    pub const DEFAULT_UPLOAD_DELAY_SECS: u64 = 30;

    /// Loads preferences, falling back to defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, SyncError> {
        Ok(read_json(path).await?.unwrap_or_default())
    }

    /// Persists the preferences.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<(), SyncError> {
        write_json(path, self).await
    }

    /// Resets every preference to its default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Heartbeat period, `None` when periodic sync is off.
    #[must_use]
    pub fn sync_interval(&self) -> Option<Duration> {
        (self.enabled && self.sync_interval_minutes > 0)
            .then(|| Duration::from_secs(u64::from(self.sync_interval_minutes) * 60))
    }

    /// Delay before an automatic upload.
    #[must_use]
    pub fn upload_delay(&self) -> Duration {
        Duration::from_secs(self.upload_delay_secs)
    }
}

impl Default for SyncPreferences {
    fn default() -> Self {
        Self {
            enabled: false,
            sync_only_on_wifi: false,
            sync_interval_minutes: Self::DEFAULT_INTERVAL_MINUTES,
            upload_delay_secs: Self::DEFAULT_UPLOAD_DELAY_SECS,
        }
    }
}

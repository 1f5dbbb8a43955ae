//! Coordination of database synchronization.
//!
//! The manager decides whether a sync may run (connectivity, Wi-Fi-only
//! preference, a linked remote file), queues requests on the worker and
//! owns the two timers: the delayed upload after a local change and the
//! periodic heartbeat.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::database::{DatabaseMetadata, RecentDatabases};
use super::error::SyncError;
use super::network::NetworkMonitor;
use super::preferences::SyncPreferences;
use super::worker::{SyncAction, SyncEvent, SyncHandle, SyncRequest};

/// Name of the directory holding downloaded remote files.
pub const SYNC_DIRECTORY: &str = "sync";

/// A precondition message for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncNotice {
    /// The open database is not the file linked for synchronization.
    FileNamesDiffer,
    /// No remote file has been chosen.
    SelectRemoteFile,
}

impl fmt::Display for SyncNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FileNamesDiffer => {
                "The local and remote file names differ. Open the linked database to synchronize."
            }
            Self::SelectRemoteFile => "Select a remote file to synchronize with.",
        })
    }
}

/// What [`SyncManager::trigger_synchronization`] did.
#[derive(Debug)]
pub enum SyncTrigger {
    /// Offline, unlinked or not on Wi-Fi when required.
    Skipped,
    /// A precondition failed.
    Notice(SyncNotice),
    /// A request was queued. Events arrive on the receiver.
    Queued(mpsc::Receiver<SyncEvent>),
}

/// Synchronization coordinator.
#[derive(Clone)]
pub struct SyncManager {
    /// Queue of the transfer worker.
    worker: SyncHandle,

    /// Connectivity source.
    network: Arc<dyn NetworkMonitor>,

    /// Recent databases shared with the worker.
    databases: Arc<RwLock<RecentDatabases>>,

    /// Preferences and the file they persist to.
    preferences: Arc<RwLock<SyncPreferences>>,
    preferences_path: Arc<PathBuf>,

    /// Pending delayed upload.
    delayed_upload: Arc<RwLock<Option<JoinHandle<()>>>>,

    /// Periodic sync task.
    heartbeat: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl fmt::Debug for SyncManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncManager")
            .field("worker", &self.worker)
            .field("preferences_path", &self.preferences_path)
            .finish_non_exhaustive()
    }
}

impl SyncManager {
    /// Creates a manager.
    #[must_use]
    pub fn new(
        worker: SyncHandle,
        network: Arc<dyn NetworkMonitor>,
        databases: Arc<RwLock<RecentDatabases>>,
        preferences: SyncPreferences,
        preferences_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            worker,
            network,
            databases,
            preferences: Arc::new(RwLock::new(preferences)),
            preferences_path: Arc::new(preferences_path.into()),
            delayed_upload: Arc::new(RwLock::new(None)),
            heartbeat: Arc::new(RwLock::new(None)),
        }
    }

    /// Snapshot of the preferences.
    pub async fn preferences(&self) -> SyncPreferences {
        self.preferences.read().await.clone()
    }

    /// Shared recent database list.
    #[must_use]
    pub fn databases(&self) -> &Arc<RwLock<RecentDatabases>> {
        &self.databases
    }

    /// Online and the current database is linked to a remote file.
    pub async fn is_active(&self) -> bool {
        if !self.network.is_online() {
            info!("Not online");
            return false;
        }
        self.remote_path().await.is_some()
    }

    /// [`is_active`](Self::is_active) and, when the preferences ask for it,
    /// on Wi-Fi.
    pub async fn can_sync(&self) -> bool {
        if !self.is_active().await {
            return false;
        }

        if self.preferences.read().await.sync_only_on_wifi {
            debug!("Preferences set to sync on Wi-Fi only");
            if !self.network.is_on_wifi() {
                info!("Not on Wi-Fi connection, not synchronizing");
                return false;
            }
        }

        true
    }

    /// Remote file of the current database, if linked.
    pub async fn remote_path(&self) -> Option<String> {
        self.databases
            .read()
            .await
            .current()
            .filter(|db| db.is_linked())
            .map(|db| db.remote_path.clone())
    }

    /// Queues an action for the current database.
    ///
    /// Returns `None` without queueing when the current database is not
    /// linked to a remote file.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::WorkerStopped`] if the worker has exited.
    pub async fn invoke_sync_service(
        &self,
        action: SyncAction,
    ) -> Result<Option<mpsc::Receiver<SyncEvent>>, SyncError> {
        let Some(mut request) = self.request_for_current(action).await else {
            return Ok(None);
        };
        let events = request.with_reply();

        debug!(id = %request.id, action = %action, "Queueing sync request");
        self.worker.submit(request).await?;
        Ok(Some(events))
    }

    /// Synchronizes the current database if the preconditions hold.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::WorkerStopped`] if the worker has exited.
    pub async fn trigger_synchronization(&self) -> Result<SyncTrigger, SyncError> {
        if !self.can_sync().await {
            return Ok(SyncTrigger::Skipped);
        }

        let (local_path, remote_path) = match self.databases.read().await.current() {
            Some(db) => (db.local_path.clone(), db.remote_path.clone()),
            None => (PathBuf::new(), String::new()),
        };

        if local_path.as_os_str().is_empty() {
            return Ok(Self::notice(SyncNotice::FileNamesDiffer));
        }
        if remote_path.trim().is_empty() {
            return Ok(Self::notice(SyncNotice::SelectRemoteFile));
        }

        match self.invoke_sync_service(SyncAction::Sync).await? {
            Some(events) => Ok(SyncTrigger::Queued(events)),
            None => Ok(SyncTrigger::Skipped),
        }
    }

    /// Queues a download of the current database.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::WorkerStopped`] if the worker has exited.
    pub async fn trigger_download(&self) -> Result<Option<mpsc::Receiver<SyncEvent>>, SyncError> {
        self.invoke_sync_service(SyncAction::Download).await
    }

    /// Queues an upload of the current database.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::WorkerStopped`] if the worker has exited.
    pub async fn trigger_upload(&self) -> Result<Option<mpsc::Receiver<SyncEvent>>, SyncError> {
        self.invoke_sync_service(SyncAction::Upload).await
    }

    /// Makes a downloaded file the current database.
    ///
    /// Unknown files are registered and linked to the current remote path.
    /// Returns false when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database list cannot be saved.
    pub async fn use_downloaded_database(&self, local_path: &Path) -> Result<bool, SyncError> {
        if !tokio::fs::try_exists(local_path).await.unwrap_or(false) {
            warn!(path = %local_path.display(), "Could not change the database");
            return Ok(false);
        }

        let remote_path = self.remote_path().await.unwrap_or_default();
        let mut databases = self.databases.write().await;
        if databases.get(local_path).is_none() {
            databases.insert(DatabaseMetadata::new(local_path, remote_path));
        }
        databases.set_current(local_path);
        databases.save().await?;

        info!(path = %local_path.display(), "Switched to downloaded database");
        Ok(true)
    }

    /// Compares local and remote file names, ignoring case. Empty paths
    /// never match.
    #[must_use]
    pub fn are_file_names_same(local_path: &str, remote_path: &str) -> bool {
        match (file_name(local_path), file_name(remote_path)) {
            (Some(local), Some(remote)) => local.to_lowercase() == remote.to_lowercase(),
            _ => false,
        }
    }

    /// Queues a sync of the current database after the configured delay.
    /// A pending delayed upload is replaced.
    pub async fn schedule_delayed_upload(&self) {
        let request = self.request_for_current(SyncAction::Sync).await;
        let delay = self.preferences.read().await.upload_delay();

        // Abort, spawn and store under one lock: at most one timer runs.
        let mut slot = self.delayed_upload.write().await;
        if let Some(pending) = slot.take() {
            debug!("Replacing scheduled sync");
            pending.abort();
        }

        let Some(request) = request else {
            debug!("Current database is not linked, no delayed upload");
            return;
        };
        let worker = self.worker.clone();

        debug!(delay_secs = delay.as_secs(), "Setting delayed upload");
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = worker.submit(request).await {
                warn!(error = %err, "Delayed upload not queued");
            }
        }));
    }

    /// Cancels a pending delayed upload.
    pub async fn abort_scheduled_upload(&self) {
        if let Some(task) = self.delayed_upload.write().await.take() {
            debug!("Aborting scheduled sync");
            task.abort();
        }
    }

    /// True while a delayed upload is waiting.
    pub async fn is_upload_scheduled(&self) -> bool {
        self.delayed_upload
            .read()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Starts periodic synchronization. Returns false when the preferences
    /// disable it.
    ///
    /// The task keeps a clone of the manager until
    /// [`stop_heartbeat`](Self::stop_heartbeat) is called.
    pub async fn start_heartbeat(&self) -> bool {
        self.stop_heartbeat().await;

        let Some(period) = self.preferences.read().await.sync_interval() else {
            debug!("Periodic sync disabled");
            return false;
        };

        let manager = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                match manager.trigger_synchronization().await {
                    Ok(SyncTrigger::Queued(_)) => debug!("Heartbeat queued sync"),
                    Ok(SyncTrigger::Notice(notice)) => info!(%notice, "Heartbeat sync not possible"),
                    Ok(SyncTrigger::Skipped) => debug!("Heartbeat skipped"),
                    Err(err) => warn!(error = %err, "Heartbeat sync failed"),
                }
            }
        });

        info!(interval_secs = period.as_secs(), "Sync heartbeat started");
        *self.heartbeat.write().await = Some(task);
        true
    }

    /// Stops periodic synchronization.
    pub async fn stop_heartbeat(&self) {
        if let Some(task) = self.heartbeat.write().await.take() {
            task.abort();
            info!("Sync heartbeat stopped");
        }
    }

    /// True while the heartbeat runs.
    pub async fn is_heartbeat_running(&self) -> bool {
        self.heartbeat
            .read()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Records whether the current database has unsent local changes. The
    /// list is only saved when the flag changes. Marking a change always
    /// bumps the change counter so a running transfer does not clear it.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no current database or the list cannot
    /// be saved.
    pub async fn mark_local_file_changed(&self, changed: bool) -> Result<(), SyncError> {
        let mut databases = self.databases.write().await;
        let db = databases.current_mut().ok_or(SyncError::NoCurrentDatabase)?;
        let flipped = if changed {
            db.mark_changed()
        } else {
            std::mem::replace(&mut db.is_local_file_changed, false)
        };
        if !flipped {
            return Ok(());
        }
        databases.save().await
    }

    /// Marks the current database changed and, when syncing is possible,
    /// schedules the delayed upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be recorded.
    pub async fn notify_data_changed(&self) -> Result<(), SyncError> {
        self.mark_local_file_changed(true).await?;
        if self.can_sync().await {
            self.schedule_delayed_upload().await;
        }
        Ok(())
    }

    /// Restores default preferences.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences cannot be saved.
    pub async fn reset_preferences(&self) -> Result<(), SyncError> {
        let mut preferences = self.preferences.write().await;
        preferences.clear();
        preferences.save(&self.preferences_path).await
    }

    /// Sets the heartbeat period. A running heartbeat keeps its old period
    /// until restarted.
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences cannot be saved.
    pub async fn set_sync_interval(&self, minutes: u32) -> Result<(), SyncError> {
        let mut preferences = self.preferences.write().await;
        preferences.sync_interval_minutes = minutes;
        preferences.save(&self.preferences_path).await
    }

    /// Turns periodic synchronization on or off. Takes effect on the next
    /// [`start_heartbeat`](Self::start_heartbeat).
    ///
    /// # Errors
    ///
    /// Returns an error if the preferences cannot be saved.
    pub async fn set_sync_enabled(&self, enabled: bool) -> Result<(), SyncError> {
        let mut preferences = self.preferences.write().await;
        preferences.enabled = enabled;
        preferences.save(&self.preferences_path).await
    }

    /// Directory for downloaded remote files: `<default_dir>/sync`.
    ///
    /// Falls back to `fallback` when the default directory is missing,
    /// read-only or the sync directory cannot be created.
    #[must_use]
    pub fn sync_directory(default_dir: &Path, fallback: &Path) -> PathBuf {
        let usable = std::fs::metadata(default_dir)
            .is_ok_and(|meta| meta.is_dir() && !meta.permissions().readonly());
        if !usable {
            return fallback.to_path_buf();
        }

        let dir = default_dir.join(SYNC_DIRECTORY);
        if !dir.is_dir() && std::fs::create_dir_all(&dir).is_err() {
            warn!(path = %dir.display(), "Could not create sync directory");
            return fallback.to_path_buf();
        }
        dir
    }

    async fn request_for_current(&self, action: SyncAction) -> Option<SyncRequest> {
        let databases = self.databases.read().await;
        let db = databases.current().filter(|db| db.is_linked())?;
        Some(SyncRequest::new(action, &db.local_path, &db.remote_path))
    }

    fn notice(notice: SyncNotice) -> SyncTrigger {
        info!(%notice, "Synchronization not started");
        SyncTrigger::Notice(notice)
    }
}

fn file_name(path: &str) -> Option<&str> {
    path.trim()
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
}

//! Background worker that transfers database files.
//!
//! Requests are queued on an mpsc channel and processed one at a time, so
//! two transfers of the same file never overlap. Each request may carry a
//! reply channel that receives progress and the final outcome.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use mmx_shared::types::SyncRequestId;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::database::RecentDatabases;
use super::error::SyncError;
use crate::storage::{RemoteVersion, StorageError, StorageService};

/// Queue depth of pending requests.
pub const QUEUE_CAPACITY: usize = 16;

/// What a request asks the worker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Send the local file to the remote.
    Upload,
    /// Replace the local file with the remote one.
    Download,
    /// Transfer in whichever direction changed.
    Sync,
}

impl SyncAction {
    /// Lowercase action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
            Self::Sync => "sync",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upload" => Ok(Self::Upload),
            "download" => Ok(Self::Download),
            "sync" => Ok(Self::Sync),
            other => Err(format!("unknown sync action: {other}")),
        }
    }
}

/// Result of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local file sent.
    Uploaded(RemoteVersion),
    /// Remote file received.
    Downloaded(RemoteVersion),
    /// Neither side changed since the last transfer.
    NoChange,
    /// Both sides changed since the last transfer. Nothing was transferred.
    Conflict,
}

/// Messages sent back on a request's reply channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The worker picked the request up.
    Started(SyncAction),
    /// The request completed.
    Finished(SyncOutcome),
    /// The request failed.
    Failed(String),
}

/// A queued transfer.
#[derive(Debug)]
pub struct SyncRequest {
    /// Correlates log lines of one request.
    pub id: SyncRequestId,
    /// Requested action.
    pub action: SyncAction,
    /// Local database file.
    pub local_path: PathBuf,
    /// Remote file path.
    pub remote_path: String,
    /// Receives progress and the outcome.
    pub reply: Option<mpsc::Sender<SyncEvent>>,
}

impl SyncRequest {
    /// Builds a request without a reply channel.
    #[must_use]
    pub fn new(action: SyncAction, local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self {
            id: SyncRequestId::new(),
            action,
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            reply: None,
        }
    }

    /// Attaches a reply channel and returns its receiving end.
    pub fn with_reply(&mut self) -> mpsc::Receiver<SyncEvent> {
        let (tx, rx) = mpsc::channel(4);
        self.reply = Some(tx);
        rx
    }

    async fn send(&self, event: SyncEvent) {
        if let Some(reply) = &self.reply {
            // A dropped receiver only means nobody is listening.
            let _ = reply.send(event).await;
        }
    }
}

/// Sending side of the worker queue.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncRequest>,
}

impl SyncHandle {
    /// Creates a queue and returns its handle and receiving end.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SyncRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Enqueues a request.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::WorkerStopped`] if the worker has exited.
    pub async fn submit(&self, request: SyncRequest) -> Result<(), SyncError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| SyncError::WorkerStopped)
    }
}

/// Change tracking read before a transfer.
#[derive(Debug)]
struct LocalState {
    changed: bool,
    change_count: u64,
    recorded: Option<RemoteVersion>,
}

/// Processes queued requests against remote storage.
#[derive(Debug, Clone)]
pub struct SyncWorker {
    storage: StorageService,
    databases: Arc<RwLock<RecentDatabases>>,
}

impl SyncWorker {
    /// Creates a worker.
    #[must_use]
    pub fn new(storage: StorageService, databases: Arc<RwLock<RecentDatabases>>) -> Self {
        Self { storage, databases }
    }

    /// Starts the worker on the current runtime.
    ///
    /// The task ends once every [`SyncHandle`] has been dropped.
    #[must_use]
    pub fn spawn(self) -> (SyncHandle, JoinHandle<()>) {
        let (handle, rx) = SyncHandle::channel(QUEUE_CAPACITY);
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    /// Processes requests until the queue closes.
    pub async fn run(self, mut rx: mpsc::Receiver<SyncRequest>) {
        info!(provider = self.storage.provider_name(), "Sync worker started");
        while let Some(request) = rx.recv().await {
            self.handle(request).await;
        }
        info!("Sync worker stopped");
    }

    async fn handle(&self, request: SyncRequest) {
        request.send(SyncEvent::Started(request.action)).await;

        let result = self
            .execute(request.action, &request.local_path, &request.remote_path)
            .await;

        match result {
            Ok(outcome) => {
                info!(
                    id = %request.id,
                    action = %request.action,
                    outcome = ?outcome,
                    "Sync request finished"
                );
                request.send(SyncEvent::Finished(outcome)).await;
            }
            Err(err) => {
                error!(id = %request.id, action = %request.action, error = %err, "Sync request failed");
                request.send(SyncEvent::Failed(err.to_string())).await;
            }
        }
    }

    /// Runs one action and records the result in the database metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is not registered, the transfer
    /// fails or the metadata cannot be saved.
    pub async fn execute(
        &self,
        action: SyncAction,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<SyncOutcome, SyncError> {
        let state = self.local_state(local_path).await?;

        let action = match action {
            SyncAction::Sync => match self
                .decide(state.changed, state.recorded.as_ref(), remote_path)
                .await?
            {
                Some(direction) => direction,
                None if state.changed => return Ok(SyncOutcome::Conflict),
                None => return Ok(SyncOutcome::NoChange),
            },
            direct => direct,
        };

        let outcome = self.transfer(action, local_path, remote_path).await?;
        self.record(local_path, &outcome, state.change_count).await?;
        Ok(outcome)
    }

    async fn local_state(&self, local_path: &Path) -> Result<LocalState, SyncError> {
        let databases = self.databases.read().await;
        let db = databases
            .get(local_path)
            .ok_or_else(|| SyncError::UnknownDatabase {
                path: local_path.to_path_buf(),
            })?;
        Ok(LocalState {
            changed: db.is_local_file_changed,
            change_count: db.change_count,
            recorded: db.remote_version.clone(),
        })
    }

    async fn transfer(
        &self,
        action: SyncAction,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<SyncOutcome, SyncError> {
        Ok(match action {
            SyncAction::Download => {
                SyncOutcome::Downloaded(self.storage.download(remote_path, local_path).await?)
            }
            SyncAction::Upload | SyncAction::Sync => {
                SyncOutcome::Uploaded(self.storage.upload(local_path, remote_path).await?)
            }
        })
    }

    /// Picks the transfer direction, `None` for no change or a conflict.
    async fn decide(
        &self,
        local_changed: bool,
        recorded: Option<&RemoteVersion>,
        remote_path: &str,
    ) -> Result<Option<SyncAction>, SyncError> {
        let remote = match self.storage.stat(remote_path).await {
            Ok(version) => Some(version),
            Err(StorageError::NotFound { .. }) => None,
            Err(err) => return Err(err.into()),
        };

        let Some(remote) = remote else {
            warn!(remote = remote_path, "Remote file missing, uploading local copy");
            return Ok(Some(SyncAction::Upload));
        };
        let remote_changed = recorded != Some(&remote);

        Ok(match (local_changed, remote_changed) {
            (true, false) => Some(SyncAction::Upload),
            (false, true) => Some(SyncAction::Download),
            (true, true) => {
                warn!(remote = remote_path, "Local and remote database both changed");
                None
            }
            (false, false) => None,
        })
    }

    /// Stores the new remote version. The change flag is only cleared when
    /// no edit was recorded since `change_count` was read.
    async fn record(
        &self,
        local_path: &Path,
        outcome: &SyncOutcome,
        change_count: u64,
    ) -> Result<(), SyncError> {
        let version = match outcome {
            SyncOutcome::Uploaded(v) | SyncOutcome::Downloaded(v) => v.clone(),
            SyncOutcome::NoChange | SyncOutcome::Conflict => return Ok(()),
        };

        let mut databases = self.databases.write().await;
        if let Some(db) = databases.get_mut(local_path) {
            db.remote_version = Some(version);
            if db.change_count == change_count {
                db.is_local_file_changed = false;
            } else {
                info!(path = %local_path.display(), "Database changed during transfer, keeping it marked");
            }
            db.last_synced_at = Some(Utc::now());
        }
        databases.save().await
    }
}

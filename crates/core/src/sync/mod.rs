//! Database file synchronization with a remote store.
//!
//! # Flow
//!
//! ```text
//! local change ──► SyncManager::notify_data_changed
//!                    │ mark changed, delayed upload (30s)
//!                    ▼
//! heartbeat / user ─► SyncManager::trigger_synchronization
//!                    │ online? linked? Wi-Fi if required?
//!                    ▼
//!                  SyncHandle ──mpsc──► SyncWorker ──► StorageService
//!                                          │ upload / download / compare
//!                                          ▼
//!                                     RecentDatabases (remote version, changed flag)
//! ```

mod database;
mod error;
mod manager;
mod network;
mod persist;
mod preferences;
mod worker;


pub use database::{DatabaseMetadata, RecentDatabases};
pub use error::SyncError;
pub use manager::{SYNC_DIRECTORY, SyncManager, SyncNotice, SyncTrigger};
pub use network::{NetworkMonitor, StaticNetwork};
pub use preferences::SyncPreferences;
pub use worker::{
    QUEUE_CAPACITY, SyncAction, SyncEvent, SyncHandle, SyncOutcome, SyncRequest, SyncWorker,
};

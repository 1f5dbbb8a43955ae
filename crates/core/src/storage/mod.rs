//! Remote storage for database files using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: Cloudflare R2, AWS S3, MinIO, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (a folder mirrored by a desktop sync client)
//! - In-memory (tests)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.write("key", data)      │ op.stat("key") -> RemoteVersion    │
//! │ op.read("key")             │ op.delete("key")                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{RemoteVersion, StorageService};

//! Shared types, errors, and configuration for Money Manager.
//!
//! This crate provides common types used across all other crates:
//! - Money type with arbitrary decimal precision
//! - Currency definitions with display scale and separators
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

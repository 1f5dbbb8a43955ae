//! Core logic for Money Manager.
//!
//! This crate contains the amount entry logic and database synchronization.
//! It has no UI dependencies; all arithmetic is decimal.
//!
//! # Modules
//!
//! - `amount` - Expression evaluation, truncation and the amount entry session
//! - `currency` - Currency registry and currency-aware formatting
//! - `storage` - Remote file storage over OpenDAL
//! - `sync` - Database synchronization coordination

pub mod amount;
pub mod currency;
pub mod storage;
pub mod sync;

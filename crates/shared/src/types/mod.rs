//! Common types used across the application.

pub mod currency;
pub mod id;
pub mod money;

pub use currency::{Currency, decimals_from_scale_factor};
pub use id::*;
pub use money::{Money, MoneyParseError};

#[cfg(test)]
mod money_tests;

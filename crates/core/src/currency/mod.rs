//! Currency registry and currency-aware formatting.

pub mod service;

pub use service::CurrencyService;

//! Money type with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not a canonical decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount: '{input}'")]
pub struct MoneyParseError {
    /// The rejected input.
    pub input: String,
}

/// An immutable monetary amount.
///
/// The scale (number of fractional digits) is part of the value: `12.30`
/// and `12.3` compare equal but display differently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero with scale 0, displayed as `0`.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new Money instance.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a zero amount.
    #[must_use]
    pub const fn zero() -> Self {
        Self::ZERO
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Number of digits after the decimal point.
    #[must_use]
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Truncates toward zero, keeping at most `scale` fractional digits.
    ///
    /// An amount that already has fewer digits is returned unchanged.
    ///
    /// ```
    /// use mmx_shared::types::Money;
    ///
    /// let money: Money = "-12.345".parse().unwrap();
    /// assert_eq!(money.truncate(2).to_string(), "-12.34");
    /// ```
    #[must_use]
    pub fn truncate(&self, scale: u32) -> Self {
        let mut truncated = self.0.round_dp_with_strategy(scale, RoundingStrategy::ToZero);
        if truncated.is_zero() {
            truncated.set_sign_positive(true);
        }
        Self(truncated)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MoneyParseError { input: s.to_string() });
        }
        Decimal::from_str_exact(trimmed)
            .map(Self)
            .map_err(|_| MoneyParseError { input: s.to_string() })
    }
}

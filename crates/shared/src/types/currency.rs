//! Currency definitions.

use serde::{Deserialize, Serialize};

use super::id::CurrencyId;

/// Converts a power-of-ten scale factor (`100` for cents) into a number of
/// decimal places. Factors below 10 mean no decimals.
#[must_use]
pub fn decimals_from_scale_factor(factor: i64) -> u32 {
    factor.checked_ilog10().unwrap_or(0)
}

/// A currency as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Row identifier.
    pub id: CurrencyId,
    /// ISO 4217 code (e.g. "EUR").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Symbol placed before the number (e.g. "$").
    #[serde(default)]
    pub prefix_symbol: String,
    /// Symbol placed after the number (e.g. " €").
    #[serde(default)]
    pub suffix_symbol: String,
    /// Decimal separator used when displaying amounts.
    pub decimal_separator: String,
    /// Group (thousands) separator used when displaying amounts.
    pub group_separator: String,
    /// Number of decimal places.
    pub scale: u32,
}

impl Currency {
    /// Default number of decimal places for a new currency.
    pub const DEFAULT_SCALE: u32 = 2;

    /// Creates a currency with two decimals, `.` and `,` separators and no symbols.
    #[must_use]
    pub fn new(id: impl Into<CurrencyId>, code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            id: id.into(),
            name: code.clone(),
            code,
            prefix_symbol: String::new(),
            suffix_symbol: String::new(),
            decimal_separator: ".".to_string(),
            group_separator: ",".to_string(),
            scale: Self::DEFAULT_SCALE,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set prefix and suffix symbols.
    #[must_use]
    pub fn with_symbols(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.prefix_symbol = prefix.into();
        self.suffix_symbol = suffix.into();
        self
    }

    /// Set decimal and group separators.
    #[must_use]
    pub fn with_separators(
        mut self,
        decimal_separator: impl Into<String>,
        group_separator: impl Into<String>,
    ) -> Self {
        self.decimal_separator = decimal_separator.into();
        self.group_separator = group_separator.into();
        self
    }

    /// Set the number of decimal places.
    #[must_use]
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the number of decimal places from a power-of-ten factor.
    #[must_use]
    pub fn with_scale_factor(self, factor: i64) -> Self {
        self.with_scale(decimals_from_scale_factor(factor))
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

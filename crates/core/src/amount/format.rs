//! Number formatting with configurable separators and currency symbols.

use mmx_shared::config::LocaleConfig;
use mmx_shared::types::{Currency, Money};
use rust_decimal::RoundingStrategy;

/// Separators of the application locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    /// Decimal separator.
    pub decimal_separator: String,
    /// Group (thousands) separator, may be empty.
    pub group_separator: String,
}

impl NumberFormat {
    /// Creates a number format from explicit separators.
    #[must_use]
    pub fn new(decimal_separator: impl Into<String>, group_separator: impl Into<String>) -> Self {
        Self {
            decimal_separator: decimal_separator.into(),
            group_separator: group_separator.into(),
        }
    }

    /// Formats without symbols using this locale's separators.
    #[must_use]
    pub fn format(&self, amount: Money, decimals: u32) -> String {
        format_number(
            amount,
            decimals,
            &self.decimal_separator,
            &self.group_separator,
            "",
            "",
        )
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::new(".", ",")
    }
}

impl From<&LocaleConfig> for NumberFormat {
    fn from(config: &LocaleConfig) -> Self {
        Self::new(&config.decimal_separator, &config.group_separator)
    }
}

/// Formats an amount with exactly `decimals` fractional digits.
///
/// Extra digits are rounded half-to-even, missing ones are zero padded. The
/// integer part is grouped by thousands. A minus sign goes in front of the
/// prefix: `-$1,234.50`.
#[must_use]
pub fn format_number(
    amount: Money,
    decimals: u32,
    decimal_separator: &str,
    group_separator: &str,
    prefix: &str,
    suffix: &str,
) -> String {
    let mut value = amount
        .amount()
        .round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven);
    value.rescale(decimals);
    let negative = value.is_sign_negative() && !value.is_zero();

    let digits = value.abs().to_string();
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let mut out = String::with_capacity(digits.len() + prefix.len() + suffix.len() + 4);
    if negative {
        out.push('-');
    }
    out.push_str(prefix);
    out.push_str(&group_digits(integer, group_separator));
    if !fraction.is_empty() {
        out.push_str(decimal_separator);
        out.push_str(fraction);
    }
    out.push_str(suffix);
    out
}

/// Formats in the currency's scale, separators and symbols.
#[must_use]
pub fn format_currency(amount: Money, currency: &Currency) -> String {
    format_number(
        amount,
        currency.scale,
        &currency.decimal_separator,
        &currency.group_separator,
        &currency.prefix_symbol,
        &currency.suffix_symbol,
    )
}

/// Like [`format_currency`] but keeps the amount's own number of decimals.
#[must_use]
pub fn format_ignoring_decimals(amount: Money, currency: &Currency) -> String {
    format_number(
        amount,
        amount.scale(),
        &currency.decimal_separator,
        &currency.group_separator,
        &currency.prefix_symbol,
        &currency.suffix_symbol,
    )
}

fn group_digits(integer: &str, separator: &str) -> String {
    if separator.is_empty() || integer.len() <= 3 {
        return integer.to_string();
    }
    let mut grouped = String::with_capacity(integer.len() + separator.len() * (integer.len() / 3));
    let lead = integer.len() % 3;
    for (i, ch) in integer.chars().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(ch);
    }
    grouped
}

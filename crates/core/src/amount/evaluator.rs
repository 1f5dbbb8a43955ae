//! Expression-to-amount evaluation with currency-driven precision.

use mmx_shared::types::{Currency, Money};
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::ExpressionError;
use super::expression::evaluate;
use super::format::NumberFormat;
use super::sanitize::clean_up_number_string;

/// Decimals kept when no currency precision applies.
pub const DEFAULT_PRECISION: u32 = 2;

/// Inexact results are rounded to this many decimals before truncation so
/// that `1/3*3` yields `1` rather than `0.99`.
pub const EVALUATION_SCALE: u32 = 20;

/// Significant digits of a result that ran out of decimal precision.
const FULL_PRECISION_DIGITS: u32 = 28;

/// Selects the number of decimals an entered amount keeps.
///
/// The currency scale only applies when rounding to currency is enabled and
/// the currency is known.
#[must_use]
pub fn precision_for(
    currency: Option<&Currency>,
    round_to_currency: bool,
    default_precision: u32,
) -> u32 {
    match currency {
        Some(currency) if round_to_currency => currency.scale,
        _ => default_precision,
    }
}

/// Sanitizes, evaluates and truncates an amount expression.
///
/// Empty input (after sanitization) evaluates to zero.
///
/// # Errors
///
/// Returns the evaluator's [`ExpressionError`] for malformed input.
///
/// ```
/// use mmx_core::amount::{NumberFormat, evaluate_amount};
///
/// let locale = NumberFormat::default();
/// assert_eq!(evaluate_amount("12.345", 2, &locale).unwrap().to_string(), "12.34");
/// assert_eq!(evaluate_amount("", 2, &locale).unwrap().to_string(), "0");
/// ```
pub fn evaluate_amount(
    input: &str,
    precision: u32,
    locale: &NumberFormat,
) -> Result<Money, ExpressionError> {
    let expression = clean_up_number_string(input, locale);
    if expression.is_empty() {
        return Ok(Money::ZERO);
    }

    let raw = evaluate(&expression)?;
    let settled = if is_full_precision(raw) {
        raw.round_dp_with_strategy(EVALUATION_SCALE, RoundingStrategy::MidpointNearestEven)
    } else {
        raw
    };

    Ok(Money::new(settled).truncate(precision))
}

/// True when the mantissa uses every available digit, as an inexact
/// division leaves it. Exact results are never rounded up.
fn is_full_precision(value: Decimal) -> bool {
    value
        .mantissa()
        .unsigned_abs()
        .checked_ilog10()
        .is_some_and(|log| log + 1 >= FULL_PRECISION_DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn eval(input: &str, precision: u32) -> Result<String, ExpressionError> {
        evaluate_amount(input, precision, &NumberFormat::default()).map(|m| m.to_string())
    }

    #[rstest]
    #[case("12.345", 2, "12.34")]
    #[case("12.349", 2, "12.34")]
    #[case("-12.349", 2, "-12.34")]
    #[case("", 2, "0")]
    #[case("   ", 2, "0")]
    #[case("10/3", 2, "3.33")]
    #[case("10/3", 0, "3")]
    #[case("1/3*3", 2, "1.00")]
    #[case("1,000.5*2", 2, "2001.0")]
    #[case("7", 4, "7")]
    #[case("0.999999999999999999999", 2, "0.99")]
    #[case("2/3", 2, "0.66")]
    fn test_evaluate_amount(#[case] input: &str, #[case] precision: u32, #[case] expected: &str) {
        assert_eq!(eval(input, precision).unwrap(), expected);
    }

    #[test]
    fn test_evaluate_amount_uses_locale_separators() {
        let locale = NumberFormat::new(",", ".");
        let amount = evaluate_amount("1.000,129 + 1", 2, &locale).unwrap();
        assert_eq!(amount.to_string(), "1001.12");
    }

    #[test]
    fn test_evaluate_amount_reports_errors() {
        assert_eq!(
            eval("(1+2", 2).unwrap_err(),
            ExpressionError::UnbalancedParentheses
        );
    }

    #[test]
    fn test_precision_policy() {
        let yen = Currency::new(3, "JPY").with_scale(0);
        assert_eq!(precision_for(Some(&yen), true, DEFAULT_PRECISION), 0);
        assert_eq!(precision_for(Some(&yen), false, DEFAULT_PRECISION), 2);
        assert_eq!(precision_for(None, true, DEFAULT_PRECISION), 2);
        assert_eq!(precision_for(None, false, 4), 4);
    }
}

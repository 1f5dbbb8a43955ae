//! Property-based tests for amount evaluation.
//!
//! - Truncation never grows the magnitude and never keeps extra decimals
//! - Evaluation is deterministic and locale independent
//! - A failed evaluation leaves the session amount untouched

use std::sync::Arc;

use mmx_shared::types::Money;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::evaluator::evaluate_amount;
use super::format::NumberFormat;
use super::input::{AmountInput, AmountInputArgs, Operator};
use crate::currency::CurrencyService;

/// Strategy to generate signed amounts with up to 6 decimals.
fn amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000_000i64..1_000_000_000_000i64).prop_map(|v| Decimal::new(v, 6))
}

/// Strategy to generate positive cents amounts (0.01 to 1,000,000.00).
fn positive_cents() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate precisions (0 to 4).
fn precision() -> impl Strategy<Value = u32> {
    0u32..=4
}

fn operator() -> impl Strategy<Value = char> {
    prop::sample::select(vec!['+', '-', '*'])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Truncating never moves a value away from zero.
    #[test]
    fn prop_truncate_never_grows(value in amount(), dp in precision()) {
        let truncated = Money::new(value).truncate(dp);
        prop_assert!(truncated.amount().abs() <= value.abs());
        prop_assert!(truncated.scale() <= dp.max(value.scale()));
        prop_assert!((value - truncated.amount()).abs() < Decimal::new(1, dp));
    }

    /// A plain number evaluates to itself truncated.
    #[test]
    fn prop_number_evaluates_to_truncation(value in amount(), dp in precision()) {
        let result = evaluate_amount(&value.to_string(), dp, &NumberFormat::default()).unwrap();
        prop_assert_eq!(result, Money::new(value).truncate(dp));
    }

    /// Long exact literals are truncated, never rounded up.
    #[test]
    fn prop_long_literal_never_grows(
        integer in 0u32..1000,
        nines in 3usize..=24,
        dp in precision(),
    ) {
        let literal = format!("{integer}.{}", "9".repeat(nines));
        let value: Decimal = literal.parse().unwrap();
        let result = evaluate_amount(&literal, dp, &NumberFormat::default()).unwrap();
        prop_assert!(result.amount() <= value);
        prop_assert_eq!(result, Money::new(value).truncate(dp));
    }

    /// Evaluating the same input twice gives the same amount.
    #[test]
    fn prop_evaluation_is_deterministic(
        a in positive_cents(),
        b in positive_cents(),
        op in operator(),
        dp in precision(),
    ) {
        let expression = format!("{a}{op}{b}");
        let locale = NumberFormat::default();
        let first = evaluate_amount(&expression, dp, &locale).unwrap();
        let second = evaluate_amount(&expression, dp, &locale).unwrap();
        prop_assert_eq!(first, second);
    }

    /// The same amount typed with comma decimals evaluates identically.
    #[test]
    fn prop_locale_separators_are_equivalent(
        a in positive_cents(),
        b in positive_cents(),
        op in operator(),
    ) {
        let dot = format!("{a}{op}{b}");
        let comma = dot.replace('.', ",");
        let expected = evaluate_amount(&dot, 2, &NumberFormat::default()).unwrap();
        let actual = evaluate_amount(&comma, 2, &NumberFormat::new(",", ".")).unwrap();
        prop_assert_eq!(expected, actual);
    }

    /// A dangling operator keeps the previous amount and raises the warning.
    #[test]
    fn prop_failed_evaluation_keeps_amount(value in positive_cents()) {
        let mut input = AmountInput::new(
            AmountInputArgs {
                amount: Some(value.to_string()),
                ..AmountInputArgs::default()
            },
            Arc::new(CurrencyService::builtin()),
            NumberFormat::default(),
        )
        .unwrap();
        let before = input.amount();

        input.press_operator(Operator::Divide);
        prop_assert!(input.is_warning());
        prop_assert_eq!(input.amount(), before);

        input.press_digit(0);
        prop_assert!(input.is_warning());
        prop_assert_eq!(input.amount(), before);
    }
}

#[test]
fn test_nines_below_one_stay_below_one() {
    let result = evaluate_amount("0.999999999999999999999", 2, &NumberFormat::default()).unwrap();
    assert_eq!(result.to_string(), "0.99");
}

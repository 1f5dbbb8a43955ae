//! Amount entry session tests.

use std::sync::Arc;

use mmx_shared::types::{Currency, CurrencyId, Money};
use rust_decimal_macros::dec;

use super::error::ExpressionError;
use super::format::NumberFormat;
use super::input::{AmountInput, AmountInputArgs, Key, Operator};
use crate::currency::CurrencyService;

fn currencies() -> Arc<CurrencyService> {
    Arc::new(CurrencyService::with_currencies([
        Currency::new(1, "USD").with_symbols("$", ""),
        Currency::new(2, "EUR")
            .with_symbols("", " €")
            .with_separators(",", "."),
        Currency::new(3, "JPY").with_symbols("¥", "").with_scale(0),
        Currency::new(4, "BHD").with_scale(3),
    ]))
}

fn open(currency: Option<i64>, amount: Option<&str>, round: bool) -> AmountInput {
    AmountInput::new(
        AmountInputArgs {
            currency_id: currency.map(CurrencyId),
            amount: amount.map(str::to_string),
            round_to_currency: round,
        },
        currencies(),
        NumberFormat::default(),
    )
    .unwrap()
}

fn type_keys(input: &mut AmountInput, keys: &str) -> Option<Money> {
    let locale = NumberFormat::default();
    let mut result = None;
    for ch in keys.chars() {
        let key = Key::from_char(ch, &locale).unwrap();
        result = input.press(key).or(result);
    }
    result
}

#[test]
fn test_open_without_amount_shows_zero() {
    let input = open(Some(1), None, true);
    assert_eq!(input.expression(), "0.00");
    assert_eq!(input.amount(), Money::new(dec!(0)));
    assert_eq!(input.top_text(), "$0.00");
    assert!(!input.is_warning());
}

#[test]
fn test_open_truncates_initial_amount_to_currency() {
    let input = open(Some(3), Some("1999.99"), true);
    assert_eq!(input.amount().to_string(), "1999");
    assert_eq!(input.expression(), "1,999");
    assert_eq!(input.top_text(), "¥1,999");
}

#[test]
fn test_open_keeps_initial_amount_without_rounding() {
    let input = open(Some(4), Some("12.3456"), false);
    // entry field uses the default precision, truncated like the evaluation
    assert_eq!(input.expression(), "12.34");
    assert_eq!(input.amount().to_string(), "12.34");
}

#[test]
fn test_open_never_rounds_initial_amount_up() {
    let input = open(None, Some("-0.999"), true);
    assert_eq!(input.expression(), "-0.99");
    assert_eq!(input.amount().to_string(), "-0.99");
    assert!(!input.is_warning());
}

#[test]
fn test_open_rejects_malformed_initial_amount() {
    let err = AmountInput::new(
        AmountInputArgs {
            amount: Some("12,5".to_string()),
            ..AmountInputArgs::default()
        },
        currencies(),
        NumberFormat::default(),
    )
    .unwrap_err();
    assert_eq!(err.input, "12,5");
}

#[test]
fn test_first_digit_replaces_prefilled_amount() {
    let mut input = open(Some(1), Some("50"), true);
    assert_eq!(input.expression(), "50.00");
    input.press_digit(7);
    assert_eq!(input.expression(), "7");
    input.press_digit(5);
    assert_eq!(input.expression(), "75");
    assert_eq!(input.top_text(), "$75.00");
}

#[test]
fn test_operator_appends_to_prefilled_amount() {
    let mut input = open(Some(1), Some("50"), true);
    input.press_operator(Operator::Multiply);
    input.press_digit(2);
    assert_eq!(input.expression(), "50.00*2");
    assert_eq!(input.amount().to_string(), "100.00");
}

#[test]
fn test_decimal_key_uses_locale_separator() {
    let mut input = AmountInput::new(
        AmountInputArgs {
            currency_id: Some(CurrencyId(2)),
            ..AmountInputArgs::default()
        },
        currencies(),
        NumberFormat::new(",", "."),
    )
    .unwrap();
    input.press_digit(1);
    input.press_decimal();
    input.press_digit(5);
    assert_eq!(input.expression(), "1,5");
    assert_eq!(input.amount().to_string(), "1.5");
    assert_eq!(input.top_text(), "1,50 €");
}

#[test]
fn test_every_edit_reevaluates() {
    let mut input = open(Some(1), None, true);
    type_keys(&mut input, "12+3");
    assert_eq!(input.top_text(), "$15.00");
    type_keys(&mut input, "*2");
    assert_eq!(input.top_text(), "$18.00");
    type_keys(&mut input, "<");
    assert_eq!(input.expression(), "12+3*");
    assert!(input.is_warning());
    assert_eq!(input.top_text(), "$18.00");
}

#[test]
fn test_malformed_expression_keeps_last_amount_and_warns() {
    let mut input = open(Some(1), None, true);
    type_keys(&mut input, "12.5+(1");
    assert!(input.is_warning());
    assert_eq!(input.amount().to_string(), "12.5");
    assert_eq!(input.top_text(), "$12.50");

    input.press_operator(Operator::CloseParen);
    assert!(!input.is_warning());
    assert_eq!(input.amount().to_string(), "13.5");
}

#[test]
fn test_division_by_zero_warns() {
    let mut input = open(None, None, true);
    type_keys(&mut input, "8/2");
    assert_eq!(input.amount().to_string(), "4");
    type_keys(&mut input, "/0");
    assert!(input.is_warning());
    assert_eq!(input.amount().to_string(), "4");
}

#[test]
fn test_clear_evaluates_to_zero() {
    let mut input = open(Some(1), Some("42"), true);
    input.clear();
    assert_eq!(input.expression(), "");
    assert_eq!(input.amount(), Money::ZERO);
    assert_eq!(input.amount().to_string(), "0");
    assert_eq!(input.top_text(), "$0.00");
}

#[test]
fn test_delete_last_character_leaves_zero() {
    let mut input = open(None, None, true);
    type_keys(&mut input, "7");
    input.delete_last();
    assert_eq!(input.expression(), "0");
    assert_eq!(input.amount().to_string(), "0");

    input.clear();
    input.delete_last();
    assert_eq!(input.expression(), "");
}

#[test]
fn test_confirm_returns_truncated_amount_and_rewrites_entry() {
    let mut input = open(Some(1), None, true);
    let result = type_keys(&mut input, "10/3=").unwrap();
    assert_eq!(result.to_string(), "3.33");
    assert_eq!(input.expression(), "3.33");
    assert!(!input.is_warning());
}

#[test]
fn test_confirm_after_error_returns_last_valid_amount() {
    let mut input = open(None, None, true);
    type_keys(&mut input, "5+(");
    let result = input.confirm();
    assert_eq!(result.to_string(), "5");
    assert!(input.is_warning());
    assert_eq!(input.expression(), "5.00");
}

#[test]
fn test_precision_follows_currency_and_rounding_flag() {
    assert_eq!(open(Some(3), None, true).precision(), 0);
    assert_eq!(open(Some(4), None, true).precision(), 3);
    assert_eq!(open(Some(4), None, false).precision(), 2);
    assert_eq!(open(None, None, true).precision(), 2);
    assert_eq!(open(Some(99), None, true).precision(), 2);
}

#[test]
fn test_unknown_currency_uses_locale_format() {
    let mut input = open(Some(99), None, true);
    type_keys(&mut input, "1234.567");
    assert_eq!(input.top_text(), "1,234.56");
}

#[test]
fn test_no_rounding_keeps_amount_decimals_in_currency_format() {
    let mut input = open(Some(3), None, false);
    type_keys(&mut input, "1234.5");
    assert_eq!(input.amount().to_string(), "1234.5");
    assert_eq!(input.top_text(), "¥1,234.5");
}

#[test]
fn test_default_precision_override() {
    let mut input = open(None, None, true).with_default_precision(4);
    type_keys(&mut input, "1/3");
    assert_eq!(input.amount().to_string(), "0.3333");
}

#[test]
fn test_save_and_restore() {
    let mut input = open(Some(1), None, true);
    type_keys(&mut input, "2*(3+");
    let saved = input.save();
    assert_eq!(saved.expression, "2*(3+");

    let json = serde_json::to_string(&saved).unwrap();
    let restored = AmountInput::restore(
        serde_json::from_str(&json).unwrap(),
        currencies(),
        NumberFormat::default(),
    );
    assert_eq!(restored.expression(), "2*(3+");
    assert!(restored.is_warning());
    assert_eq!(restored.amount(), saved.amount);
}

#[test]
fn test_set_expression() {
    let mut input = open(Some(1), Some("10"), true);
    let amount = input.set_expression("1,234.567 * 2").unwrap();
    assert_eq!(amount.to_string(), "2469.13");
    assert_eq!(input.top_text(), "$2,469.13");

    let err = input.set_expression("2*(").unwrap_err();
    assert!(matches!(err, ExpressionError::UnexpectedToken { .. }));
    assert!(input.is_warning());
    assert_eq!(input.amount().to_string(), "2469.13");

    // typing continues from the replaced text
    input.press_digit(4);
    input.press_operator(Operator::CloseParen);
    assert_eq!(input.expression(), "2*(4)");
    assert_eq!(input.amount().to_string(), "8");
}

#[test]
fn test_key_from_char() {
    let comma = NumberFormat::new(",", ".");
    assert_eq!(Key::from_char('7', &comma), Some(Key::Digit(7)));
    assert_eq!(Key::from_char(',', &comma), Some(Key::Decimal));
    assert_eq!(Key::from_char('.', &comma), Some(Key::Decimal));
    assert_eq!(Key::from_char('(', &comma), Some(Key::Operator(Operator::OpenParen)));
    assert_eq!(Key::from_char('c', &comma), Some(Key::Clear));
    assert_eq!(Key::from_char('<', &comma), Some(Key::Delete));
    assert_eq!(Key::from_char('=', &comma), Some(Key::Equals));
    assert_eq!(Key::from_char('x', &comma), None);
    assert_eq!(Key::from_char(',', &NumberFormat::default()), None);
}

use super::money::{Money, MoneyParseError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use rstest::rstest;
use std::str::FromStr;

#[rstest]
#[case("0", "0")]
#[case("12.34", "12.34")]
#[case("-5.5", "-5.5")]
#[case("  7.10 ", "7.10")]
#[case("1000000.000001", "1000000.000001")]
fn test_money_from_str(#[case] input: &str, #[case] expected: &str) {
    let money = Money::from_str(input).unwrap();
    assert_eq!(money.to_string(), expected);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("12,34")]
#[case("abc")]
#[case("1+1")]
fn test_money_from_str_rejects(#[case] input: &str) {
    let err = Money::from_str(input).unwrap_err();
    assert_eq!(
        err,
        MoneyParseError {
            input: input.to_string()
        }
    );
}

#[test]
fn test_money_scale_is_preserved() {
    let money = Money::from_str("12.30").unwrap();
    assert_eq!(money.scale(), 2);
    assert_eq!(money, Money::new(dec!(12.3)));
}

#[test]
fn test_money_decimal_conversions() {
    let money = Money::from(Decimal::new(1234, 2));
    let back: Decimal = money.into();
    assert_eq!(back, dec!(12.34));
}

#[test]
fn test_money_serde_is_transparent() {
    let money = Money::new(dec!(42.50));
    let json = serde_json::to_string(&money).unwrap();
    assert_eq!(json, "\"42.50\"");
    let parsed: Money = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, money);
}

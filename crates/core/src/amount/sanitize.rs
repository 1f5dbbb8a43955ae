//! Normalization of locale-formatted input before evaluation.

use super::format::NumberFormat;

/// Rewrites user input into the canonical form the evaluator expects.
///
/// Whitespace and group separators are removed, then the locale decimal
/// separator is replaced by `.`.
#[must_use]
pub fn clean_up_number_string(input: &str, locale: &NumberFormat) -> String {
    let mut value: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    let group = locale.group_separator.trim();
    if !group.is_empty() && group != locale.decimal_separator {
        value = value.replace(group, "");
    }

    if !locale.decimal_separator.is_empty() && locale.decimal_separator != "." {
        value = value.replace(locale.decimal_separator.as_str(), ".");
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(".", ",", "1,234.56", "1234.56")]
    #[case(".", ",", " 12 + 3 ", "12+3")]
    #[case(",", ".", "1.234,56", "1234.56")]
    #[case(",", ".", "2,5*(1,5-0,5)", "2.5*(1.5-0.5)")]
    #[case(",", " ", "1 000,5", "1000.5")]
    #[case(",", "\u{a0}", "1\u{a0}000,5", "1000.5")]
    #[case(".", "'", "1'000.25", "1000.25")]
    #[case(".", "", "1000.25", "1000.25")]
    #[case(".", ",", "", "")]
    fn test_clean_up_number_string(
        #[case] decimal: &str,
        #[case] group: &str,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        let locale = NumberFormat::new(decimal, group);
        assert_eq!(clean_up_number_string(input, &locale), expected);
    }
}

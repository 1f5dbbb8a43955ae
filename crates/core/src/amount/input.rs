//! Headless amount entry session.
//!
//! Holds the expression typed on a calculator-style keypad, re-evaluates it
//! after every edit and keeps the formatted result ("top" text) current.
//! When the expression cannot be evaluated the last valid amount is kept and
//! the session enters a warning state until the next successful evaluation.

use std::sync::Arc;

use mmx_shared::types::{Currency, CurrencyId, Money, MoneyParseError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ExpressionError;
use super::evaluator::{DEFAULT_PRECISION, evaluate_amount, precision_for};
use super::format::{NumberFormat, format_currency, format_ignoring_decimals};
use crate::currency::CurrencyService;

/// Arithmetic keys of the keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
}

impl Operator {
    /// The character appended to the expression.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
            Self::OpenParen => '(',
            Self::CloseParen => ')',
        }
    }
}

/// A single keypad press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// `0`..=`9`
    Digit(u8),
    /// The locale decimal separator.
    Decimal,
    /// An operator or parenthesis.
    Operator(Operator),
    /// `C`
    Clear,
    /// Backspace.
    Delete,
    /// `=`
    Equals,
}

impl Key {
    /// Maps a typed character to a key: digits, the locale decimal separator
    /// (or `.`), `+-*/()`, `C` for clear, `<` for delete and `=`.
    #[must_use]
    pub fn from_char(ch: char, locale: &NumberFormat) -> Option<Self> {
        let key = match ch {
            '0'..='9' => Self::Digit(u8::try_from(ch.to_digit(10)?).ok()?),
            '.' => Self::Decimal,
            c if locale.decimal_separator.starts_with(c) => Self::Decimal,
            '+' => Self::Operator(Operator::Add),
            '-' => Self::Operator(Operator::Subtract),
            '*' => Self::Operator(Operator::Multiply),
            '/' => Self::Operator(Operator::Divide),
            '(' => Self::Operator(Operator::OpenParen),
            ')' => Self::Operator(Operator::CloseParen),
            'C' | 'c' => Self::Clear,
            '<' => Self::Delete,
            '=' => Self::Equals,
            _ => return None,
        };
        Some(key)
    }
}

/// Arguments the entry screen is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountInputArgs {
    /// Currency the amount is entered in.
    pub currency_id: Option<CurrencyId>,
    /// Initial amount in canonical form (`"12.34"`).
    pub amount: Option<String>,
    /// Truncate to the currency scale.
    pub round_to_currency: bool,
}

impl Default for AmountInputArgs {
    fn default() -> Self {
        Self {
            currency_id: None,
            amount: None,
            round_to_currency: true,
        }
    }
}

/// Serializable session state, used to restore an interrupted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAmountInput {
    /// Active currency.
    pub currency_id: Option<CurrencyId>,
    /// Rounding flag.
    pub round_to_currency: bool,
    /// Last valid amount.
    pub amount: Money,
    /// Expression text.
    pub expression: String,
}

/// Amount entry session.
#[derive(Debug, Clone)]
pub struct AmountInput {
    currencies: Arc<CurrencyService>,
    locale: NumberFormat,
    default_precision: u32,
    currency_id: Option<CurrencyId>,
    round_to_currency: bool,
    amount: Money,
    expression: String,
    top_text: String,
    warning: bool,
    started_typing: bool,
}

impl AmountInput {
    /// Opens a new session.
    ///
    /// The initial amount is truncated to the currency scale when rounding is
    /// on and the currency is known. The entry field is prefilled with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial amount is not a canonical decimal.
    pub fn new(
        args: AmountInputArgs,
        currencies: Arc<CurrencyService>,
        locale: NumberFormat,
    ) -> Result<Self, MoneyParseError> {
        let mut input = Self {
            currencies,
            locale,
            default_precision: DEFAULT_PRECISION,
            currency_id: args.currency_id,
            round_to_currency: args.round_to_currency,
            amount: Money::ZERO,
            expression: String::new(),
            top_text: String::new(),
            warning: false,
            started_typing: false,
        };

        if let Some(value) = args.amount.as_deref().filter(|v| !v.trim().is_empty()) {
            let amount: Money = value.parse()?;
            input.amount = match input.rounding_currency() {
                Some(currency) => CurrencyService::truncate_to_currency(amount, currency),
                None => amount,
            };
        }

        input.show_amount_in_entry_field();
        input.evaluate();
        Ok(input)
    }

    /// Restores a saved session. As on a fresh open, the first digit typed
    /// replaces the restored expression.
    #[must_use]
    pub fn restore(
        saved: SavedAmountInput,
        currencies: Arc<CurrencyService>,
        locale: NumberFormat,
    ) -> Self {
        let mut input = Self {
            currencies,
            locale,
            default_precision: DEFAULT_PRECISION,
            currency_id: saved.currency_id,
            round_to_currency: saved.round_to_currency,
            amount: saved.amount,
            expression: saved.expression,
            top_text: String::new(),
            warning: false,
            started_typing: false,
        };
        if input.expression.is_empty() {
            input.show_amount_in_entry_field();
        }
        input.evaluate();
        input
    }

    /// Captures the state needed by [`AmountInput::restore`].
    #[must_use]
    pub fn save(&self) -> SavedAmountInput {
        SavedAmountInput {
            currency_id: self.currency_id,
            round_to_currency: self.round_to_currency,
            amount: self.amount,
            expression: self.expression.clone(),
        }
    }

    /// Overrides the precision used without a rounding currency.
    #[must_use]
    pub fn with_default_precision(mut self, precision: u32) -> Self {
        self.default_precision = precision;
        self.evaluate();
        self
    }

    /// The last valid amount.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// The expression as shown in the entry field.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The formatted amount shown above the entry field.
    #[must_use]
    pub fn top_text(&self) -> &str {
        &self.top_text
    }

    /// True while the expression cannot be evaluated.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.warning
    }

    /// Decimals the amount is truncated to.
    #[must_use]
    pub fn precision(&self) -> u32 {
        precision_for(
            self.currency(),
            self.round_to_currency,
            self.default_precision,
        )
    }

    /// The active currency if it is known to the registry.
    #[must_use]
    pub fn currency(&self) -> Option<&Currency> {
        self.currency_id.and_then(|id| self.currencies.get(id))
    }

    /// Digit keys replace the prefilled amount on the first press and
    /// append afterwards. Values above 9 are ignored.
    pub fn press_digit(&mut self, digit: u8) {
        let Some(ch) = char::from_digit(u32::from(digit), 10) else {
            return;
        };
        self.start_number_entry();
        self.expression.push(ch);
        self.evaluate();
    }

    /// The decimal key behaves like a digit key.
    pub fn press_decimal(&mut self) {
        self.start_number_entry();
        self.expression.push_str(&self.locale.decimal_separator);
        self.evaluate();
    }

    /// Operators always append to the current expression.
    pub fn press_operator(&mut self, operator: Operator) {
        self.started_typing = true;
        self.expression.push(operator.symbol());
        self.evaluate();
    }

    /// Empties the expression.
    pub fn clear(&mut self) {
        self.started_typing = true;
        self.expression.clear();
        self.evaluate();
    }

    /// Removes the last character. Removing the only character leaves `0`.
    pub fn delete_last(&mut self) {
        self.started_typing = true;
        if self.expression.pop().is_some() && self.expression.is_empty() {
            self.expression.push('0');
        }
        self.evaluate();
    }

    /// Evaluates once more, rewrites the entry field with the formatted
    /// amount and returns the amount as the session result.
    pub fn confirm(&mut self) -> Money {
        self.evaluate();
        self.show_amount_in_entry_field();
        self.amount
    }

    /// Dispatches a keypress. Returns the result when `=` is pressed.
    pub fn press(&mut self, key: Key) -> Option<Money> {
        match key {
            Key::Digit(d) => self.press_digit(d),
            Key::Decimal => self.press_decimal(),
            Key::Operator(op) => self.press_operator(op),
            Key::Clear => self.clear(),
            Key::Delete => self.delete_last(),
            Key::Equals => return Some(self.confirm()),
        }
        None
    }

    /// Replaces the whole expression, as when text is typed or pasted into
    /// the entry field directly, and evaluates it.
    ///
    /// # Errors
    ///
    /// Returns the evaluation error. The session keeps its previous amount
    /// and enters the warning state.
    pub fn set_expression(&mut self, expression: impl Into<String>) -> Result<Money, ExpressionError> {
        self.started_typing = true;
        self.expression = expression.into();
        self.try_evaluate()
    }

    /// Re-evaluates the expression.
    ///
    /// On success the amount and top text are updated and the warning is
    /// cleared. On failure the previous amount is kept, the top text is
    /// redrawn from it and the warning is raised. Returns whether the
    /// evaluation succeeded.
    pub fn evaluate(&mut self) -> bool {
        self.try_evaluate().is_ok()
    }

    fn try_evaluate(&mut self) -> Result<Money, ExpressionError> {
        let result = evaluate_amount(&self.expression, self.precision(), &self.locale);
        match &result {
            Ok(amount) => self.amount = *amount,
            Err(err) => {
                debug!(expression = %self.expression, error = %err, "Expression not evaluated");
            }
        }
        self.warning = result.is_err();
        self.top_text = self.formatted_amount();
        result
    }

    /// Formats the amount for the top display.
    ///
    /// Unknown or absent currency uses the locale with the default
    /// precision. Without rounding the currency's symbols and separators are
    /// used but the amount keeps its own decimals.
    #[must_use]
    pub fn formatted_amount(&self) -> String {
        match self.currency() {
            None => self.locale.format(self.amount, self.default_precision),
            Some(currency) if !self.round_to_currency => {
                format_ignoring_decimals(self.amount, currency)
            }
            Some(currency) => format_currency(self.amount, currency),
        }
    }

    /// Formats the amount for editing: locale separators, no symbols, the
    /// currency scale when rounding to a known currency. Extra decimals are
    /// truncated so reopening never grows the amount.
    #[must_use]
    pub fn formatted_for_editing(&self) -> String {
        let decimals = match self.rounding_currency() {
            Some(currency) => currency.scale,
            None => self.default_precision,
        };
        self.locale.format(self.amount.truncate(decimals), decimals)
    }

    fn rounding_currency(&self) -> Option<&Currency> {
        self.currency().filter(|_| self.round_to_currency)
    }

    fn start_number_entry(&mut self) {
        if !self.started_typing {
            self.expression.clear();
            self.started_typing = true;
        }
    }

    fn show_amount_in_entry_field(&mut self) {
        self.expression = self.formatted_for_editing();
    }
}

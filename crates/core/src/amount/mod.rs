//! Amount entry: expression evaluation, truncation and formatting.
//!
//! CRITICAL: Arithmetic is decimal end to end, no floats.
//! - Input is sanitized from locale separators to canonical form
//! - Results are truncated (rounded toward zero) to the active precision
//! - Display formatting rounds half-to-even and groups thousands

pub mod error;
pub mod evaluator;
pub mod expression;
pub mod format;
pub mod input;
pub mod sanitize;

#[cfg(test)]
mod props;
#[cfg(test)]
mod tests;

pub use error::ExpressionError;
pub use evaluator::{DEFAULT_PRECISION, evaluate_amount, precision_for};
pub use expression::evaluate;
pub use format::{NumberFormat, format_currency, format_ignoring_decimals, format_number};
pub use input::{AmountInput, AmountInputArgs, Key, Operator, SavedAmountInput};
pub use sanitize::clean_up_number_string;

//! Expression evaluation errors.

use thiserror::Error;

/// Errors raised while parsing or evaluating an amount expression.
///
/// Positions are byte offsets into the sanitized expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// Nothing to evaluate.
    #[error("expression is empty")]
    Empty,

    /// A character that is not part of the grammar.
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        found: char,
        /// Byte offset.
        position: usize,
    },

    /// A valid token in an invalid place, or a missing operand.
    #[error("unexpected {found} at position {position}")]
    UnexpectedToken {
        /// Description of what was found.
        found: String,
        /// Byte offset.
        position: usize,
    },

    /// Opening and closing parentheses do not match.
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    /// A numeric literal that cannot be represented.
    #[error("invalid number '{literal}'")]
    InvalidNumber {
        /// The literal as typed.
        literal: String,
    },

    /// Parentheses nested deeper than the evaluator allows.
    #[error("expression nested deeper than {max} levels")]
    NestingTooDeep {
        /// Maximum supported depth.
        max: usize,
    },

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Result does not fit the decimal range.
    #[error("arithmetic overflow")]
    Overflow,
}

impl From<ExpressionError> for mmx_shared::AppError {
    fn from(err: ExpressionError) -> Self {
        Self::Evaluation(err.to_string())
    }
}

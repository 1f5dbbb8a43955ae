//! Arithmetic expression evaluation over decimals.
//!
//! Grammar (whitespace is not allowed, sanitize first):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary | <implicit *> primary)*
//! unary   := ('+' | '-') unary | primary
//! primary := number | '(' expr ')'
//! number  := digits ['.' digits] | '.' digits | digits '.'
//! ```
//!
//! Implicit multiplication applies when an operand is directly followed by
//! an opening parenthesis: `2(3)` and `(1)(2)`.

use std::iter::Peekable;
use std::str::CharIndices;

use rust_decimal::Decimal;

use super::error::ExpressionError;

/// Deepest parenthesis/unary nesting accepted.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(Decimal),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(n) => format!("number {n}"),
            Self::Plus => "'+'".to_string(),
            Self::Minus => "'-'".to_string(),
            Self::Star => "'*'".to_string(),
            Self::Slash => "'/'".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
        }
    }
}

#[derive(Debug)]
struct Spanned {
    token: Token,
    position: usize,
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, ch)) = chars.peek() {
        let token = match ch {
            '0'..='9' | '.' => Token::Number(read_number(&mut chars)?),
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            other => {
                return Err(ExpressionError::UnexpectedCharacter {
                    found: other,
                    position,
                });
            }
        };
        if !matches!(token, Token::Number(_)) {
            chars.next();
        }
        tokens.push(Spanned { token, position });
    }

    Ok(tokens)
}

fn read_number(chars: &mut Peekable<CharIndices<'_>>) -> Result<Decimal, ExpressionError> {
    let mut integer = String::new();
    let mut fraction = String::new();
    let mut seen_point = false;
    let mut literal = String::new();

    while let Some(&(_, ch)) = chars.peek() {
        match ch {
            '0'..='9' if seen_point => fraction.push(ch),
            '0'..='9' => integer.push(ch),
            '.' if !seen_point => seen_point = true,
            '.' => {
                literal.push(ch);
                return Err(ExpressionError::InvalidNumber { literal });
            }
            _ => break,
        }
        literal.push(ch);
        chars.next();
    }

    if integer.is_empty() && fraction.is_empty() {
        return Err(ExpressionError::InvalidNumber { literal });
    }

    let canonical = match (integer.is_empty(), fraction.is_empty()) {
        (true, _) => format!("0.{fraction}"),
        (false, true) => integer,
        (false, false) => format!("{integer}.{fraction}"),
    };

    Decimal::from_str_exact(&canonical).map_err(|_| ExpressionError::InvalidNumber { literal })
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.cursor).map_or(self.end, |s| s.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|s| s.token.clone());
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn unexpected(&self) -> ExpressionError {
        match self.peek() {
            Some(Token::RParen) => ExpressionError::UnbalancedParentheses,
            Some(token) => ExpressionError::UnexpectedToken {
                found: token.describe(),
                position: self.position(),
            },
            None => ExpressionError::UnexpectedToken {
                found: "end of input".to_string(),
                position: self.end,
            },
        }
    }

    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExpressionError::NestingTooDeep { max: MAX_DEPTH });
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Decimal, ExpressionError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    let rhs = self.term()?;
                    value = value.checked_add(rhs).ok_or(ExpressionError::Overflow)?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    let rhs = self.term()?;
                    value = value.checked_sub(rhs).ok_or(ExpressionError::Overflow)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<Decimal, ExpressionError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    let rhs = self.unary()?;
                    value = value.checked_mul(rhs).ok_or(ExpressionError::Overflow)?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.unary()?;
                    if rhs.is_zero() {
                        return Err(ExpressionError::DivisionByZero);
                    }
                    value = value.checked_div(rhs).ok_or(ExpressionError::Overflow)?;
                }
                Some(Token::LParen) => {
                    let rhs = self.primary()?;
                    value = value.checked_mul(rhs).ok_or(ExpressionError::Overflow)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<Decimal, ExpressionError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                self.descend()?;
                let value = self.unary();
                self.depth -= 1;
                value
            }
            Some(Token::Minus) => {
                self.advance();
                self.descend()?;
                let value = self.unary().map(|v| -v);
                self.depth -= 1;
                value
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Decimal, ExpressionError> {
        match self.peek() {
            Some(Token::Number(_)) => match self.advance() {
                Some(Token::Number(n)) => Ok(n),
                _ => Err(self.unexpected()),
            },
            Some(Token::LParen) => {
                self.advance();
                self.descend()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    None => Err(ExpressionError::UnbalancedParentheses),
                    Some(_) => {
                        self.cursor -= 1;
                        Err(self.unexpected())
                    }
                }
            }
            _ => Err(self.unexpected()),
        }
    }
}

/// Evaluates a sanitized arithmetic expression.
///
/// # Errors
///
/// Returns an [`ExpressionError`] when the input is empty, malformed,
/// divides by zero or overflows the decimal range.
///
/// ```
/// use mmx_core::amount::evaluate;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(evaluate("2*(3+4)-1").unwrap(), dec!(13));
/// assert!(evaluate("(1+2").is_err());
/// ```
pub fn evaluate(input: &str) -> Result<Decimal, ExpressionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        end: input.len(),
        depth: 0,
    };
    let value = parser.expr()?;

    if parser.peek().is_some() {
        return Err(parser.unexpected());
    }

    Ok(value)
}

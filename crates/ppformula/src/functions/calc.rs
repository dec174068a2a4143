//! CALC: arithmetic over the concatenated text of its arguments
//!
//! The argument text is reduced to digits, operators, parentheses and whitespace and then
//! evaluated with the usual precedence:
//!
//! | level | operators | associativity |
//! |---|---|---|
//! | additive | `+ -` | left |
//! | multiplicative | `* / %` | left |
//! | exponent | `**` | right |
//! | unary | `+ -` | prefix |
//!
//! A unary operator may not directly precede `**` (`-2**2` is rejected, `(-2)**2` is fine).

use crate::evaluator::Args;
use crate::value::FormulaValue;
use lazy_regex::regex;
use thiserror::Error;

/// Reasons an arithmetic expression is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("leading zeros are not allowed in '{0}'")]
    LeadingZero(String),
    #[error("increment and decrement operators are not supported")]
    IncrementDecrement,
    #[error("unary operator used immediately before exponentiation")]
    UnaryBeforePower,
}

/// CALC(Expression)
pub fn fn_calc(args: &Args) -> FormulaValue {
    let expression = args.strings().concat();
    match evaluate_expression(&sanitize(&expression)) {
        Ok(n) => FormulaValue::Number(n),
        Err(err) => {
            tracing::debug!(%expression, error = %err, "calc expression rejected");
            FormulaValue::String(format!("[Calc error: {}]", err))
        }
    }
}

/// Drop every character that cannot appear in an arithmetic expression
pub fn sanitize(expression: &str) -> String {
    regex!(r"[^0-9+\-*/%().\s]")
        .replace_all(expression, "")
        .into_owned()
}

/// Evaluate a sanitized arithmetic expression
pub fn evaluate_expression(source: &str) -> Result<f64, CalcError> {
    let tokens = lex(source)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }

    let mut parser = CalcParser { tokens, pos: 0 };
    let value = parser.parse_additive()?;
    match parser.peek() {
        None => Ok(value),
        Some(token) => Err(CalcError::UnexpectedToken(token.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CalcToken {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power,
    LeftParen,
    RightParen,
}

impl std::fmt::Display for CalcToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcToken::Number(n) => write!(f, "{}", n),
            CalcToken::Plus => f.write_str("+"),
            CalcToken::Minus => f.write_str("-"),
            CalcToken::Star => f.write_str("*"),
            CalcToken::Slash => f.write_str("/"),
            CalcToken::Percent => f.write_str("%"),
            CalcToken::Power => f.write_str("**"),
            CalcToken::LeftParen => f.write_str("("),
            CalcToken::RightParen => f.write_str(")"),
        }
    }
}

fn lex(source: &str) -> Result<Vec<CalcToken>, CalcError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(CalcToken::Number(parse_literal(&text)?));
            }
            '+' | '-' if next == Some(c) => return Err(CalcError::IncrementDecrement),
            '+' => {
                tokens.push(CalcToken::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(CalcToken::Minus);
                i += 1;
            }
            '*' if next == Some('*') => {
                tokens.push(CalcToken::Power);
                i += 2;
            }
            '*' => {
                tokens.push(CalcToken::Star);
                i += 1;
            }
            '/' => {
                tokens.push(CalcToken::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(CalcToken::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(CalcToken::LeftParen);
                i += 1;
            }
            ')' => {
                tokens.push(CalcToken::RightParen);
                i += 1;
            }
            other => return Err(CalcError::UnexpectedToken(other.to_string())),
        }
    }

    Ok(tokens)
}

fn parse_literal(text: &str) -> Result<f64, CalcError> {
    if text == "." {
        return Err(CalcError::InvalidNumber(text.to_string()));
    }
    let int_part = text.split('.').next().unwrap_or("");
    if int_part.len() > 1 && int_part.starts_with('0') {
        return Err(CalcError::LeadingZero(text.to_string()));
    }
    text.parse::<f64>()
        .map_err(|_| CalcError::InvalidNumber(text.to_string()))
}

struct CalcParser {
    tokens: Vec<CalcToken>,
    pos: usize,
}

impl CalcParser {
    fn peek(&self) -> Option<&CalcToken> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<CalcToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_additive(&mut self) -> Result<f64, CalcError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            match self.peek() {
                Some(CalcToken::Plus) => {
                    self.pos += 1;
                    left += self.parse_multiplicative()?;
                }
                Some(CalcToken::Minus) => {
                    self.pos += 1;
                    left -= self.parse_multiplicative()?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<f64, CalcError> {
        let mut left = self.parse_exponent()?;
        loop {
            match self.peek() {
                Some(CalcToken::Star) => {
                    self.pos += 1;
                    left *= self.parse_exponent()?;
                }
                Some(CalcToken::Slash) => {
                    self.pos += 1;
                    left /= self.parse_exponent()?;
                }
                Some(CalcToken::Percent) => {
                    self.pos += 1;
                    left %= self.parse_exponent()?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn parse_exponent(&mut self) -> Result<f64, CalcError> {
        if matches!(self.peek(), Some(CalcToken::Plus | CalcToken::Minus)) {
            let value = self.parse_unary()?;
            if self.peek() == Some(&CalcToken::Power) {
                return Err(CalcError::UnaryBeforePower);
            }
            return Ok(value);
        }

        let base = self.parse_primary()?;
        if self.peek() == Some(&CalcToken::Power) {
            self.pos += 1;
            let exponent = self.parse_exponent()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(CalcToken::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            Some(CalcToken::Minus) => {
                self.pos += 1;
                Ok(-self.parse_unary()?)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<f64, CalcError> {
        match self.next() {
            Some(CalcToken::Number(n)) => Ok(n),
            Some(CalcToken::LeftParen) => {
                let value = self.parse_additive()?;
                match self.next() {
                    Some(CalcToken::RightParen) => Ok(value),
                    Some(other) => Err(CalcError::UnexpectedToken(other.to_string())),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(other) => Err(CalcError::UnexpectedToken(other.to_string())),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(s: &str) -> Result<f64, CalcError> {
        evaluate_expression(&sanitize(s))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(calc("1 + 2 * 3"), Ok(7.0));
        assert_eq!(calc("(1 + 2) * 3"), Ok(9.0));
        assert_eq!(calc("10 - 4 - 3"), Ok(3.0));
        assert_eq!(calc("7 % 4 * 2"), Ok(6.0));
        assert_eq!(calc("2 ** 3 ** 2"), Ok(512.0));
        assert_eq!(calc("2 ** -1"), Ok(0.5));
    }

    #[test]
    fn test_unary() {
        assert_eq!(calc("-3 + 5"), Ok(2.0));
        assert_eq!(calc("5 - -3"), Ok(8.0));
        assert_eq!(calc("-(2 + 1)"), Ok(-3.0));
        assert_eq!(calc("(-2) ** 2"), Ok(4.0));
        assert_eq!(calc("-2 ** 2"), Err(CalcError::UnaryBeforePower));
        assert_eq!(calc("5--3"), Err(CalcError::IncrementDecrement));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(calc("1/0"), Ok(f64::INFINITY));
        assert!(calc("0/0").unwrap().is_nan());
        assert!(calc("5 % 0").unwrap().is_nan());
    }

    #[test]
    fn test_literals() {
        assert_eq!(calc(".5 + 5."), Ok(5.5));
        assert_eq!(calc("0.25 * 4"), Ok(1.0));
        assert_eq!(calc("08 + 1"), Err(CalcError::LeadingZero("08".into())));
        assert_eq!(calc("."), Err(CalcError::InvalidNumber(".".into())));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(calc(""), Err(CalcError::Empty));
        assert_eq!(calc("abc"), Err(CalcError::Empty));
        assert_eq!(calc("1 +"), Err(CalcError::UnexpectedEnd));
        assert_eq!(calc("(1 + 2"), Err(CalcError::UnexpectedEnd));
        assert_eq!(calc("1 2"), Err(CalcError::UnexpectedToken("2".into())));
        assert_eq!(calc("1.2.3"), Err(CalcError::UnexpectedToken("0.3".into())));
    }

    #[test]
    fn test_sanitize_strips_letters() {
        assert_eq!(sanitize("$1,200 * qty 3"), "1200 *  3");
        assert_eq!(calc("$1,200 * qty 3"), Ok(3600.0));
    }
}

//! Runtime values and the coercion rules shared by every built-in function.

use crate::datetime;
use chrono::NaiveDateTime;
use std::fmt;

/// Value produced by evaluating a formula node.
///
/// Booleans are never represented directly: predicates return `Number(1.0)` / `Number(0.0)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FormulaValue {
    Number(f64),
    String(String),
}

impl FormulaValue {
    /// The empty string
    pub fn empty() -> Self {
        FormulaValue::String(String::new())
    }

    /// Text form of the value
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::String(s) => s.clone(),
        }
    }

    /// Numeric coercion.
    ///
    /// Numbers pass through. Text is stripped down to digits, `.` and `-` and the longest
    /// numeric prefix is parsed; anything unparseable becomes `0`.
    pub fn as_number(&self) -> f64 {
        match self {
            FormulaValue::Number(n) => *n,
            FormulaValue::String(s) => {
                let stripped: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                match parse_float_prefix(&stripped) {
                    Some(n) if n != 0.0 && !n.is_nan() => n,
                    _ => 0.0,
                }
            }
        }
    }

    /// Truthiness: positive numbers, `"true"`, `"1"`, or text with a positive numeric prefix.
    pub fn as_bool(&self) -> bool {
        match self {
            FormulaValue::Number(n) => *n > 0.0,
            FormulaValue::String(s) => {
                let lower = s.to_lowercase();
                lower == "true"
                    || lower == "1"
                    || parse_float_prefix(&lower).map_or(false, |n| n > 0.0)
            }
        }
    }

    /// Calendar date/time, if the text form parses as one
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        datetime::parse_datetime(&self.as_string())
    }

    /// Check whether the text form is empty after trimming
    pub fn is_blank(&self) -> bool {
        self.as_string().trim().is_empty()
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Number(n) => f.write_str(&format_number(*n)),
            FormulaValue::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FormulaValue {
    fn from(value: bool) -> Self {
        FormulaValue::Number(if value { 1.0 } else { 0.0 })
    }
}

impl From<f64> for FormulaValue {
    fn from(value: f64) -> Self {
        FormulaValue::Number(value)
    }
}

impl From<String> for FormulaValue {
    fn from(value: String) -> Self {
        FormulaValue::String(value)
    }
}

impl From<&str> for FormulaValue {
    fn from(value: &str) -> Self {
        FormulaValue::String(value.to_string())
    }
}

/// Render a number the way formula output has always shown it.
///
/// Integers print without a fraction, other values use the shortest round-tripping
/// decimal, and magnitudes outside `[1e-6, 1e21)` switch to exponent notation
/// (`1e+21`, `1.5e-7`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        let s = format!("{:e}", n);
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        };
    }

    format!("{}", n)
}

/// Parse the longest floating point prefix of `s`, after leading whitespace.
///
/// Accepts an optional sign, `Infinity`, digits with an optional fraction, and an optional
/// exponent. Returns `None` when no digits are found.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        let negative = bytes.first() == Some(&b'-');
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent is only taken when complete
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'-' || bytes[exp_end] == b'+') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("12.5abc"), Some(12.5));
        assert_eq!(parse_float_prefix("  -3"), Some(-3.0));
        assert_eq!(parse_float_prefix("1.2.3"), Some(1.2));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("5."), Some(5.0));
        assert_eq!(parse_float_prefix("1e3x"), Some(1000.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix("--5"), None);
    }

    #[test]
    fn test_as_number() {
        assert_eq!(FormulaValue::from("$1,234.50").as_number(), 1234.5);
        assert_eq!(FormulaValue::from("abc").as_number(), 0.0);
        assert_eq!(FormulaValue::from("5-3").as_number(), 5.0);
        assert_eq!(FormulaValue::from("").as_number(), 0.0);
        assert_eq!(FormulaValue::Number(-7.0).as_number(), -7.0);
    }

    #[test]
    fn test_as_bool() {
        assert!(FormulaValue::from("TRUE").as_bool());
        assert!(FormulaValue::from("1").as_bool());
        assert!(FormulaValue::from("2 apples").as_bool());
        assert!(!FormulaValue::from("false").as_bool());
        assert!(!FormulaValue::from("0").as_bool());
        assert!(!FormulaValue::from("-4").as_bool());
        assert!(!FormulaValue::from("yes").as_bool());
        assert!(FormulaValue::Number(0.5).as_bool());
        assert!(!FormulaValue::Number(0.0).as_bool());
    }

    #[test]
    fn test_bool_conversion() {
        assert_eq!(FormulaValue::from(true), FormulaValue::Number(1.0));
        assert_eq!(FormulaValue::from(false).as_string(), "0");
    }
}

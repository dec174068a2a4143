//! Math and numeric comparison functions

use crate::evaluator::Args;
use crate::value::{format_number, parse_float_prefix, FormulaValue};
use lazy_regex::regex;
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Most fraction digits a rounding call will honour
const MAX_FIXED_DIGITS: u32 = 28;

/// Fixed-point text of `n` with exactly `digits` fraction digits.
///
/// Rounds the exact binary value half away from zero. Magnitudes of 1e21 and above keep
/// their plain number form.
pub(crate) fn to_fixed(n: f64, digits: u32) -> String {
    let digits = digits.min(MAX_FIXED_DIGITS);
    if !n.is_finite() || n.abs() >= 1e21 {
        return format_number(n);
    }
    match Decimal::from_f64_retain(n) {
        Some(d) => {
            let rounded = d.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}", digits as usize, rounded)
        }
        None => format!("{:.*}", digits as usize, n),
    }
}

/// Requested fraction digit count, truncated and clamped to what [`to_fixed`] supports
pub(crate) fn digit_count(n: f64) -> u32 {
    if n.is_nan() || n <= 0.0 {
        0
    } else {
        n.trunc().min(MAX_FIXED_DIGITS as f64) as u32
    }
}

/// NUM(Text)
pub fn fn_num(args: &Args) -> FormulaValue {
    let text = args.string(0);
    let n = regex!(r"-?\d+\.?\d*")
        .find(&text)
        .and_then(|m| parse_float_prefix(m.as_str()))
        .unwrap_or(0.0);
    FormulaValue::Number(n)
}

/// NUMSPLIT(Text)
pub fn fn_numsplit(args: &Args) -> FormulaValue {
    let text = args.string(0);
    let numbers: Vec<&str> = regex!(r"-?\d+\.?\d*")
        .find_iter(&text)
        .map(|m| m.as_str())
        .collect();
    FormulaValue::String(numbers.join(";"))
}

/// ROUND(Decimals; Number)
pub fn fn_round(args: &Args) -> FormulaValue {
    let digits = digit_count(args.number(0));
    let n = args.number(1);
    let fixed = to_fixed(n, digits);
    FormulaValue::Number(
        fixed
            .parse::<Decimal>()
            .ok()
            .and_then(|d| d.to_f64())
            .or_else(|| parse_float_prefix(&fixed))
            .unwrap_or(n),
    )
}

/// FLOOR(Number)
pub fn fn_floor(args: &Args) -> FormulaValue {
    FormulaValue::Number(args.number(0).floor())
}

/// CEILING(Number)
pub fn fn_ceiling(args: &Args) -> FormulaValue {
    FormulaValue::Number(args.number(0).ceil())
}

fn numbers(args: &Args) -> Vec<f64> {
    args.values().iter().map(FormulaValue::as_number).collect()
}

/// MAX(Number; ...)
pub fn fn_max(args: &Args) -> FormulaValue {
    FormulaValue::Number(numbers(args).into_iter().fold(f64::NEG_INFINITY, f64::max))
}

/// MIN(Number; ...)
pub fn fn_min(args: &Args) -> FormulaValue {
    FormulaValue::Number(numbers(args).into_iter().fold(f64::INFINITY, f64::min))
}

/// SUM(Number; ...)
pub fn fn_sum(args: &Args) -> FormulaValue {
    FormulaValue::Number(numbers(args).into_iter().sum())
}

/// RANDOMNUM(Min; Max)
pub fn fn_randomnum(args: &Args) -> FormulaValue {
    let min = args.number(0);
    let max = args.number(1);
    let r: f64 = rand::thread_rng().gen();
    FormulaValue::Number((r * (max - min + 1.0)).floor() + min)
}

/// Most parts PARTITION will produce
pub const MAX_PARTITION_PARTS: f64 = 10_000.0;

/// PARTITION(Number; Divisor)
///
/// Yields `""` for a non-positive divisor or when the split would exceed
/// [`MAX_PARTITION_PARTS`].
pub fn fn_partition(args: &Args) -> FormulaValue {
    let n = args.number(0);
    let divisor = args.number(1);
    if !n.is_finite() || divisor.is_nan() || divisor <= 0.0 {
        return FormulaValue::empty();
    }
    if (n / divisor).ceil() > MAX_PARTITION_PARTS {
        tracing::debug!(n, divisor, "partition exceeds part limit");
        return FormulaValue::empty();
    }

    let mut parts = Vec::new();
    let mut remaining = n;
    while remaining > 0.0 {
        let part = divisor.min(remaining);
        parts.push(format_number(part));
        remaining -= part;
    }
    FormulaValue::String(parts.join(";"))
}

/// GTNUM(Number; Other)
pub fn fn_gtnum(args: &Args) -> FormulaValue {
    (args.number(0) > args.number(1)).into()
}

/// GTENUM(Number; Other)
pub fn fn_gtenum(args: &Args) -> FormulaValue {
    (args.number(0) >= args.number(1)).into()
}

/// LTNUM(Number; Other)
pub fn fn_ltnum(args: &Args) -> FormulaValue {
    (args.number(0) < args.number(1)).into()
}

/// LTENUM(Number; Other)
pub fn fn_ltenum(args: &Args) -> FormulaValue {
    (args.number(0) <= args.number(1)).into()
}

/// BENUM(Number; Min; Max), inclusive
pub fn fn_benum(args: &Args) -> FormulaValue {
    let n = args.number(0);
    (n >= args.number(1) && n <= args.number(2)).into()
}

/// BNUM(Number; Min; Max), exclusive
pub fn fn_bnum(args: &Args) -> FormulaValue {
    let n = args.number(0);
    (n > args.number(1) && n < args.number(2)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(-2.5, 0), "-3");
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(1234.5678, 2), "1234.57");
        assert_eq!(to_fixed(5.0, 2), "5.00");
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(1e21, 2), "1e+21");
    }

    #[test]
    fn test_digit_count() {
        assert_eq!(digit_count(2.9), 2);
        assert_eq!(digit_count(-1.0), 0);
        assert_eq!(digit_count(f64::NAN), 0);
        assert_eq!(digit_count(500.0), MAX_FIXED_DIGITS);
    }
}

//! FORMAT: number and date pattern formatting

use super::math::to_fixed;
use crate::evaluator::Args;
use crate::value::FormulaValue;
use chrono::{Datelike, NaiveDateTime, Timelike};

/// FORMAT(Format; Value)
///
/// A pattern with date letters (`d M y H h m s`) and no digit placeholders (`# 0`) formats
/// the value as a date when it parses as one. Everything else goes through the number
/// formatter, with date formatting and the raw text as fallbacks.
pub fn fn_format(args: &Args) -> FormulaValue {
    let pattern = args.string(0);
    let value = args.value(1);

    if is_date_pattern(&pattern) {
        if let Some(dt) = value.as_date() {
            return FormulaValue::String(format_date(&pattern, &dt));
        }
    }

    let n = value.as_number();
    if !n.is_nan() {
        return FormulaValue::String(format_number_pattern(&pattern, n));
    }

    match value.as_date() {
        Some(dt) => FormulaValue::String(format_date(&pattern, &dt)),
        None => FormulaValue::String(value.as_string()),
    }
}

fn is_date_pattern(pattern: &str) -> bool {
    pattern.contains(|c: char| matches!(c, 'd' | 'M' | 'y' | 'H' | 'h' | 'm' | 's'))
        && !pattern.contains(|c: char| matches!(c, '#' | '0'))
}

/// Format `n` with a numeric pattern such as `#,##0.00` or `000`.
pub fn format_number_pattern(pattern: &str, n: f64) -> String {
    let negative = n < 0.0;
    let decimal_index = pattern.find('.');
    let decimals = decimal_index.map_or(0, |i| {
        pattern[i + 1..]
            .chars()
            .filter(|c| matches!(*c, '0' | '#'))
            .count() as u32
    });

    let mut result = to_fixed(n.abs(), decimals);

    if pattern.contains(',') {
        result = match result.split_once('.') {
            Some((int_part, fraction)) => format!("{}.{}", group_thousands(int_part), fraction),
            None => group_thousands(&result),
        };
    }

    match decimal_index {
        None => {
            let zeros = pattern.chars().take_while(|c| *c == '0').count();
            result = pad_zeros(&result, zeros);
        }
        Some(i) => {
            let int_pattern = pattern[..i].replace(',', "");
            let zeros = int_pattern.chars().rev().take_while(|c| *c == '0').count();
            result = match result.split_once('.') {
                Some((int_part, fraction)) => format!("{}.{}", pad_zeros(int_part, zeros), fraction),
                None => pad_zeros(&result, zeros),
            };
        }
    }

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

fn pad_zeros(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if width > len {
        format!("{}{}", "0".repeat(width - len), s)
    } else {
        s.to_string()
    }
}

/// Insert `,` between groups of three digits. Text that is not all digits is left alone.
fn group_thousands(digits: &str) -> String {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return digits.to_string();
    }
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn max_run(letter: char) -> usize {
    match letter {
        'y' => 5,
        'M' | 'd' => 4,
        _ => 2,
    }
}

/// Format a date/time with a pattern.
///
/// | token | output |
/// |---|---|
/// | `yyyyy` `yyyy` `yyy` | year, zero padded to 5/4/3 |
/// | `yy` `y` | two-digit year, padded / unpadded |
/// | `MMMM` `MMM` `MM` `M` | month name, short name, padded / unpadded number |
/// | `dddd` `ddd` `dd` `d` | weekday name, short name, padded / unpadded day |
/// | `HH` `H` `hh` `h` | 24-hour and 12-hour clock |
/// | `mm` `m` `ss` `s` | minutes and seconds |
/// | `tt` `TT` `t` `T` | `am`, `AM`, `a`, `A` (and pm equivalents) |
///
/// Longer runs are split greedily (`yyyyyy` is `yyyyy` then `y`). Other characters are
/// copied as they are.
pub fn format_date(pattern: &str, dt: &NaiveDateTime) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let letter = chars[i];
        if !matches!(letter, 'y' | 'M' | 'd' | 'H' | 'h' | 'm' | 's' | 't' | 'T') {
            out.push(letter);
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == letter && run < max_run(letter) {
            run += 1;
        }
        out.push_str(&date_token(letter, run, dt));
        i += run;
    }

    out
}

fn date_token(letter: char, run: usize, dt: &NaiveDateTime) -> String {
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };
    let pm = dt.hour() >= 12;

    match (letter, run) {
        ('y', 1) => (dt.year() % 100).to_string(),
        ('y', 2) => format!("{:02}", dt.year() % 100),
        ('y', width) => format!("{:0width$}", dt.year(), width = width),
        ('M', 4) => dt.format("%B").to_string(),
        ('M', 3) => dt.format("%b").to_string(),
        ('M', 2) => format!("{:02}", dt.month()),
        ('M', _) => dt.month().to_string(),
        ('d', 4) => dt.format("%A").to_string(),
        ('d', 3) => dt.format("%a").to_string(),
        ('d', 2) => format!("{:02}", dt.day()),
        ('d', _) => dt.day().to_string(),
        ('H', 2) => format!("{:02}", dt.hour()),
        ('H', _) => dt.hour().to_string(),
        ('h', 2) => format!("{:02}", hour12),
        ('h', _) => hour12.to_string(),
        ('m', 2) => format!("{:02}", dt.minute()),
        ('m', _) => dt.minute().to_string(),
        ('s', 2) => format!("{:02}", dt.second()),
        ('s', _) => dt.second().to_string(),
        ('t', 2) => if pm { "pm" } else { "am" }.to_string(),
        ('t', _) => if pm { "p" } else { "a" }.to_string(),
        ('T', 2) => if pm { "PM" } else { "AM" }.to_string(),
        ('T', _) => if pm { "P" } else { "A" }.to_string(),
        _ => letter.to_string().repeat(run),
    }
}

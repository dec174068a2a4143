//! Text functions

use crate::evaluator::Args;
use crate::value::FormulaValue;
use lazy_regex::regex;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Characters left alone by `URLENCODE`, matching `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Character slice with clamped, order-insensitive bounds.
///
/// Bounds are truncated toward zero; NaN counts as 0 and `end = None` means the end of the
/// string.
pub(crate) fn substring(s: &str, start: f64, end: Option<f64>) -> String {
    let len = s.chars().count();
    let clamp = |n: f64| -> usize {
        if n.is_nan() || n <= 0.0 {
            0
        } else if n >= len as f64 {
            len
        } else {
            n.trunc() as usize
        }
    };
    let a = clamp(start);
    let b = end.map_or(len, clamp);
    let (from, to) = if a <= b { (a, b) } else { (b, a) };
    s.chars().skip(from).take(to - from).collect()
}

pub(crate) fn take_left(s: &str, count: f64) -> String {
    substring(s, 0.0, Some(count))
}

pub(crate) fn take_right(s: &str, count: f64) -> String {
    let len = s.chars().count() as f64;
    substring(s, len - count, None)
}

/// Text before the first `marker`, or all of `s` when the marker is absent
pub(crate) fn left_of(s: &str, marker: &str) -> String {
    match s.find(marker) {
        Some(idx) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Text after the first `marker`, or nothing when the marker is absent
pub(crate) fn right_of(s: &str, marker: &str) -> String {
    match s.find(marker) {
        Some(idx) => s[idx + marker.len()..].to_string(),
        None => String::new(),
    }
}

/// Compile a user pattern, or produce the inline diagnostic
pub(crate) fn compile_regex(pattern: &str) -> Result<Regex, FormulaValue> {
    Regex::new(pattern).map_err(|err| {
        // Syntax errors render over several lines; the last one carries the reason
        let full = err.to_string();
        let reason = full
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or(full.as_str())
            .trim()
            .trim_start_matches("error: ")
            .to_string();
        tracing::debug!(pattern, %reason, "invalid regex");
        FormulaValue::String(format!("[Regex error: {}]", reason))
    })
}

/// APPEND(Separator; Item1; Item2; ...)
pub fn fn_append(args: &Args) -> FormulaValue {
    let values = args.strings();
    let Some((separator, items)) = values.split_first() else {
        return FormulaValue::empty();
    };
    let items: Vec<&str> = items
        .iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    FormulaValue::String(items.join(separator.as_str()))
}

fn contains_ignore_case(args: &Args) -> bool {
    let search = args.string(0).to_lowercase();
    let text = args.string(1).to_lowercase();
    text.contains(&search)
}

/// CONTAINS(Search; Text)
pub fn fn_contains(args: &Args) -> FormulaValue {
    contains_ignore_case(args).into()
}

/// !CONTAINS(Search; Text)
pub fn fn_not_contains(args: &Args) -> FormulaValue {
    (!contains_ignore_case(args)).into()
}

/// EQUALS(Value; Other; ...)
pub fn fn_equals(args: &Args) -> FormulaValue {
    let values = args.strings();
    let first = values.first().cloned().unwrap_or_default();
    values.iter().skip(1).all(|v| *v == first).into()
}

/// !EQUALS(Value; Other; ...)
pub fn fn_not_equals(args: &Args) -> FormulaValue {
    let values = args.strings();
    let first = values.first().cloned().unwrap_or_default();
    values.iter().skip(1).all(|v| *v != first).into()
}

/// LEFT(Count; Value)
pub fn fn_left(args: &Args) -> FormulaValue {
    let count = args.number(0);
    FormulaValue::String(take_left(&args.string(1), count))
}

/// RIGHT(Count; Value)
pub fn fn_right(args: &Args) -> FormulaValue {
    let count = args.number(0);
    FormulaValue::String(take_right(&args.string(1), count))
}

/// LEFTOF(Marker; Text)
pub fn fn_leftof(args: &Args) -> FormulaValue {
    let marker = args.string(0);
    FormulaValue::String(left_of(&args.string(1), &marker))
}

/// RIGHTOF(Marker; Text)
pub fn fn_rightof(args: &Args) -> FormulaValue {
    let marker = args.string(0);
    FormulaValue::String(right_of(&args.string(1), &marker))
}

/// LEFTOFLAST(Marker; Text)
pub fn fn_leftoflast(args: &Args) -> FormulaValue {
    let marker = args.string(0);
    let text = args.string(1);
    match text.rfind(&marker) {
        Some(idx) => FormulaValue::String(text[..idx].to_string()),
        None => FormulaValue::String(text),
    }
}

/// RIGHTOFLAST(Marker; Text)
pub fn fn_rightoflast(args: &Args) -> FormulaValue {
    let marker = args.string(0);
    let text = args.string(1);
    match text.rfind(&marker) {
        Some(idx) => FormulaValue::String(text[idx + marker.len()..].to_string()),
        None => FormulaValue::empty(),
    }
}

/// LENGTH(Text)
pub fn fn_length(args: &Args) -> FormulaValue {
    FormulaValue::Number(args.string(0).chars().count() as f64)
}

/// LOWERCASE(Text)
pub fn fn_lowercase(args: &Args) -> FormulaValue {
    FormulaValue::String(args.string(0).to_lowercase())
}

/// UPPERCASE(Text)
pub fn fn_uppercase(args: &Args) -> FormulaValue {
    FormulaValue::String(args.string(0).to_uppercase())
}

/// TITLECASE(Text)
pub fn fn_titlecase(args: &Args) -> FormulaValue {
    let text = args.string(0);
    let out = regex!(r"[A-Za-z0-9_]\S*").replace_all(&text, |caps: &regex::Captures| {
        let word = &caps[0];
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.as_str().to_lowercase().chars())
                .collect::<String>(),
            None => String::new(),
        }
    });
    FormulaValue::String(out.into_owned())
}

/// TRIM(Text)
pub fn fn_trim(args: &Args) -> FormulaValue {
    let text = args.string(0);
    FormulaValue::String(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// REPLACE(Search; Replacement; Text)
pub fn fn_replace(args: &Args) -> FormulaValue {
    let search = args.string(0);
    let replacement = args.string(1);
    let text = args.string(2);

    if search.is_empty() {
        // Empty search inserts between characters only
        let chars: Vec<String> = text.chars().map(String::from).collect();
        return FormulaValue::String(chars.join(replacement.as_str()));
    }
    FormulaValue::String(text.replace(&search, &replacement))
}

/// REMOVECHARS(Text; Characters)
pub fn fn_removechars(args: &Args) -> FormulaValue {
    let text = args.string(0);
    let chars = args.string(1);
    FormulaValue::String(text.chars().filter(|c| !chars.contains(*c)).collect())
}

/// REMOVESPACES(Text)
pub fn fn_removespaces(args: &Args) -> FormulaValue {
    FormulaValue::String(args.string(0).chars().filter(|c| !c.is_whitespace()).collect())
}

/// REMOVEDIACRITICS(Text)
pub fn fn_removediacritics(args: &Args) -> FormulaValue {
    let text = args.string(0);
    FormulaValue::String(
        text.nfd()
            .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
            .collect(),
    )
}

/// REMOVESYMBOLS(Text)
pub fn fn_removesymbols(args: &Args) -> FormulaValue {
    let text = args.string(0);
    FormulaValue::String(
        text.chars()
            .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
            .collect(),
    )
}

/// NORMALIZETEXT(Text)
pub fn fn_normalizetext(args: &Args) -> FormulaValue {
    let text: String = args.string(0).chars().filter(|c| !c.is_whitespace()).collect();
    FormulaValue::String(regex!(r"<[^>]*>").replace_all(&text, "").into_owned())
}

/// `crlf` and `tab` stand in for characters that cannot be typed into an argument
fn parse_marker(marker: &str, text: &str) -> String {
    if marker.eq_ignore_ascii_case("crlf") {
        if text.contains("\r\n") { "\r\n" } else { "\n" }.to_string()
    } else if marker.eq_ignore_ascii_case("tab") {
        "\t".to_string()
    } else {
        marker.to_string()
    }
}

/// PARSE(LeftMarker; RightMarker; Text)
pub fn fn_parse(args: &Args) -> FormulaValue {
    let text = args.string(2);
    let left = parse_marker(&args.string(0), &text);
    let right = parse_marker(&args.string(1), &text);

    let Some(idx) = text.find(&left) else {
        return FormulaValue::empty();
    };
    let after = &text[idx + left.len()..];
    FormulaValue::String(left_of(after, &right))
}

/// REGEXFIND(Pattern; Text)
pub fn fn_regexfind(args: &Args) -> FormulaValue {
    let regex = match compile_regex(&args.string(0)) {
        Ok(regex) => regex,
        Err(diagnostic) => return diagnostic,
    };
    let text = args.string(1);
    match regex.find(&text) {
        Some(m) => FormulaValue::String(m.as_str().to_string()),
        None => FormulaValue::empty(),
    }
}

/// REGEXWORDSONLY(Text)
pub fn fn_regexwordsonly(args: &Args) -> FormulaValue {
    let text = args.string(0);
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| w.chars().filter(char::is_ascii_alphanumeric).collect::<String>())
        .filter(|w| !w.is_empty())
        .collect();
    FormulaValue::String(words.join("|"))
}

/// URLENCODE(Text)
pub fn fn_urlencode(args: &Args) -> FormulaValue {
    let text = args.string(0);
    FormulaValue::String(utf8_percent_encode(&text, URI_COMPONENT).to_string())
}

/// ENCLOSE(Value)
pub fn fn_enclose(args: &Args) -> FormulaValue {
    FormulaValue::String(args.string(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_clamps() {
        assert_eq!(substring("hello", 1.0, Some(3.0)), "el");
        assert_eq!(substring("hello", 3.0, Some(1.0)), "el");
        assert_eq!(substring("hello", -2.0, None), "hello");
        assert_eq!(substring("hello", 2.9, Some(99.0)), "llo");
        assert_eq!(take_right("hello", 10.0), "hello");
        assert_eq!(take_right("hello", -1.0), "");
        assert_eq!(take_left("héllo", 2.0), "hé");
    }

    #[test]
    fn test_compile_regex_diagnostic() {
        let err = compile_regex("[").unwrap_err().as_string();
        assert!(err.starts_with("[Regex error: "), "{}", err);
        assert!(!err.contains('\n'));
    }
}

//! List functions
//!
//! Lists are `;`-joined strings. Index arguments are 1-based, and index 0 returns the whole
//! list rejoined with `;`.

use super::text::{compile_regex, left_of, right_of, take_left, take_right};
use crate::evaluator::Args;
use crate::value::FormulaValue;
use ahash::AHashSet;
use lazy_regex::regex;

/// Item at a 1-based `index`, the whole list for 0, or nothing when out of range
fn pick<S: AsRef<str>>(items: &[S], index: f64) -> FormulaValue {
    if index == 0.0 {
        return FormulaValue::String(join(items, ";"));
    }
    if index.fract() != 0.0 || index < 1.0 || index > items.len() as f64 {
        return FormulaValue::empty();
    }
    FormulaValue::String(items[index as usize - 1].as_ref().to_string())
}

fn join<S: AsRef<str>>(items: &[S], separator: &str) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(separator)
}

/// Non-empty items of a list
fn items(list: &str) -> Vec<&str> {
    list.split(';').filter(|s| !s.is_empty()).collect()
}

fn dedup<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = AHashSet::new();
    items.into_iter().filter(|item| seen.insert(*item)).collect()
}

/// Split `text` on `delimiter`; an empty delimiter splits into characters
fn split_on(text: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(delimiter).map(str::to_string).collect()
    }
}

/// SPLIT(Delimiter; Index; Text)
pub fn fn_split(args: &Args) -> FormulaValue {
    let delimiter = args.string(0);
    let index = args.number(1);
    let text = args.string(2);
    pick(&split_on(&text, &delimiter), index)
}

/// LISTCOUNT(List) or LISTCOUNT(Item; Item; ...)
pub fn fn_listcount(args: &Args) -> FormulaValue {
    let values = args.strings();
    let count = if values.len() == 1 {
        values[0].split(';').filter(|s| !s.trim().is_empty()).count()
    } else {
        values.iter().filter(|s| !s.trim().is_empty()).count()
    };
    FormulaValue::Number(count as f64)
}

/// LISTINDEX(Index; List)
pub fn fn_listindex(args: &Args) -> FormulaValue {
    let index = args.number(0);
    let list = args.string(1);
    pick(&list.split(';').collect::<Vec<_>>(), index)
}

/// LISTJOIN(Separator; List)
pub fn fn_listjoin(args: &Args) -> FormulaValue {
    let separator = args.string(0);
    let separator = regex!(r"(?i)ppnewline").replace_all(&separator, "\n");
    let separator = regex!(r"(?i)ppcrlf").replace_all(&separator, "\r\n");
    let separator = regex!(r"(?i)pptab").replace_all(&separator, "\t");
    let separator = regex!(r"(?i)ppsp").replace_all(&separator, " ");

    let list = args.string(1);
    FormulaValue::String(list.split(';').collect::<Vec<_>>().join(&*separator))
}

/// LISTMERGE(List1; List2)
pub fn fn_listmerge(args: &Args) -> FormulaValue {
    let first = args.string(0);
    let second = args.string(1);
    let merged = dedup(items(&first).into_iter().chain(items(&second)));
    FormulaValue::String(merged.join(";"))
}

/// LISTDIFF(List1; List2)
pub fn fn_listdiff(args: &Args) -> FormulaValue {
    let first = args.string(0);
    let second = args.string(1);
    let exclude: AHashSet<&str> = items(&second).into_iter().collect();
    let kept: Vec<&str> = items(&first)
        .into_iter()
        .filter(|item| !exclude.contains(item))
        .collect();
    FormulaValue::String(kept.join(";"))
}

/// LISTINTERSECT(List1; List2)
pub fn fn_listintersect(args: &Args) -> FormulaValue {
    let first = args.string(0);
    let second = args.string(1);
    let include: AHashSet<&str> = items(&second).into_iter().collect();
    let kept: Vec<&str> = items(&first)
        .into_iter()
        .filter(|item| include.contains(item))
        .collect();
    FormulaValue::String(kept.join(";"))
}

/// LISTUNIQUE(List; ...)
pub fn fn_listunique(args: &Args) -> FormulaValue {
    let joined = args.strings().join(";");
    FormulaValue::String(dedup(items(&joined)).join(";"))
}

/// LISTASLINES(List)
pub fn fn_listaslines(args: &Args) -> FormulaValue {
    FormulaValue::String(args.string(0).replace(';', "\n"))
}

/// LINESPLIT(Index; Text)
pub fn fn_linesplit(args: &Args) -> FormulaValue {
    let index = args.number(0);
    let text = args.string(1);
    let lines: Vec<&str> = regex!(r"\r?\n").split(&text).collect();
    pick(&lines, index)
}

/// WORDSPLIT(Index; Text)
pub fn fn_wordsplit(args: &Args) -> FormulaValue {
    let index = args.number(0);
    let text = args.string(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    pick(&words, index)
}

/// EMAILSPLIT(Index; Text)
pub fn fn_emailsplit(args: &Args) -> FormulaValue {
    let index = args.number(0);
    let text = args.string(1);
    let emails: Vec<&str> = regex!(r"[^\s,;]+@[^\s,;]+")
        .find_iter(&text)
        .map(|m| m.as_str())
        .collect();
    pick(&emails, index)
}

fn map_items(args: &Args, f: impl Fn(&str, &str) -> String) -> FormulaValue {
    let operand = args.string(0);
    let list = args.string(1);
    let mapped: Vec<String> = list.split(';').map(|item| f(item, &operand)).collect();
    FormulaValue::String(mapped.join(";"))
}

fn filter_items(args: &Args, keep: impl Fn(&str, &str) -> bool) -> FormulaValue {
    let search = args.string(0).to_lowercase();
    let list = args.string(1);
    let kept: Vec<&str> = list
        .split(';')
        .filter(|item| keep(&item.to_lowercase(), &search))
        .collect();
    FormulaValue::String(kept.join(";"))
}

/// LISTITEMAPPEND(Suffix; List)
pub fn fn_listitemappend(args: &Args) -> FormulaValue {
    map_items(args, |item, suffix| format!("{}{}", item, suffix))
}

/// LISTITEMPREPEND(Prefix; List)
pub fn fn_listitemprepend(args: &Args) -> FormulaValue {
    map_items(args, |item, prefix| format!("{}{}", prefix, item))
}

/// LISTITEMCONTAINS(Search; List)
pub fn fn_listitemcontains(args: &Args) -> FormulaValue {
    filter_items(args, |item, search| item.contains(search))
}

/// LISTITEMSTARTSWITH(Search; List)
pub fn fn_listitemstartswith(args: &Args) -> FormulaValue {
    filter_items(args, |item, search| item.starts_with(search))
}

/// LISTITEMENDSWITH(Search; List)
pub fn fn_listitemendswith(args: &Args) -> FormulaValue {
    filter_items(args, |item, search| item.ends_with(search))
}

/// LISTITEMLEFT(Count; List)
pub fn fn_listitemleft(args: &Args) -> FormulaValue {
    let count = args.number(0);
    let list = args.string(1);
    let mapped: Vec<String> = list.split(';').map(|item| take_left(item, count)).collect();
    FormulaValue::String(mapped.join(";"))
}

/// LISTITEMRIGHT(Count; List)
pub fn fn_listitemright(args: &Args) -> FormulaValue {
    let count = args.number(0);
    let list = args.string(1);
    let mapped: Vec<String> = list
        .split(';')
        .map(|item| take_right(item, count))
        .collect();
    FormulaValue::String(mapped.join(";"))
}

/// LISTITEMLEFTOF(Marker; List)
pub fn fn_listitemleftof(args: &Args) -> FormulaValue {
    map_items(args, left_of)
}

/// LISTITEMRIGHTOF(Marker; List)
pub fn fn_listitemrightof(args: &Args) -> FormulaValue {
    map_items(args, right_of)
}

/// LISTITEMREGEX(Pattern; List)
pub fn fn_listitemregex(args: &Args) -> FormulaValue {
    let regex = match compile_regex(&args.string(0)) {
        Ok(regex) => regex,
        Err(diagnostic) => return diagnostic,
    };
    let list = args.string(1);
    let kept: Vec<&str> = list.split(';').filter(|item| regex.is_match(item)).collect();
    FormulaValue::String(kept.join(";"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick() {
        let items = ["a", "b", "c"];
        assert_eq!(pick(&items, 0.0).as_string(), "a;b;c");
        assert_eq!(pick(&items, 2.0).as_string(), "b");
        assert_eq!(pick(&items, 4.0).as_string(), "");
        assert_eq!(pick(&items, -1.0).as_string(), "");
        assert_eq!(pick(&items, 1.5).as_string(), "");
    }

    #[test]
    fn test_dedup_keeps_first_appearance() {
        assert_eq!(dedup(["b", "a", "b", "c", "a"]), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_split_on_empty_delimiter() {
        assert_eq!(split_on("abc", ""), vec!["a", "b", "c"]);
        assert_eq!(split_on("a,b", ","), vec!["a", "b"]);
    }
}

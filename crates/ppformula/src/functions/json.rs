//! JSON functions
//!
//! Inputs are parsed with `serde_json`; a parse failure becomes a `[JSON error: ...]`
//! diagnostic in place of the result. Output is compact and keeps object key order.

use crate::evaluator::Args;
use crate::value::{format_number, FormulaValue};
use lazy_regex::regex;
use serde_json::Value;

/// Largest integer an `f64` holds exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn json_error(err: serde_json::Error) -> FormulaValue {
    tracing::debug!(error = %err, "invalid json input");
    FormulaValue::String(format!("[JSON error: {}]", err))
}

fn parse(text: &str) -> Result<Value, FormulaValue> {
    serde_json::from_str(text).map_err(json_error)
}

/// JSON number for `n`: integral values serialise without a fraction, non-finite ones as null
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

fn to_json(value: FormulaValue) -> Value {
    match value {
        FormulaValue::Number(n) => number_value(n),
        FormulaValue::String(s) => Value::String(s),
    }
}

/// Text form of a JSON value: containers and null are serialised, scalars are unwrapped
fn item_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map_or_else(|| n.to_string(), format_number),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Resolve a possibly negative index against `len`
fn resolve_index(index: f64, len: usize) -> Option<usize> {
    let index = if index < 0.0 { len as f64 + index } else { index };
    if index.fract() != 0.0 || index < 0.0 || index >= len as f64 {
        None
    } else {
        Some(index as usize)
    }
}

/// JSONENCODE(Text)
pub fn fn_jsonencode(args: &Args) -> FormulaValue {
    FormulaValue::String(Value::String(args.string(0)).to_string())
}

/// JSONEXTRACT(Text)
pub fn fn_jsonextract(args: &Args) -> FormulaValue {
    let text = args.string(0);
    match regex!(r"(?s)[\[{].*[\]}]").find(&text) {
        Some(m) => FormulaValue::String(m.as_str().to_string()),
        None => FormulaValue::empty(),
    }
}

/// JSONQUERY(Path; Json)
pub fn fn_jsonquery(args: &Args) -> FormulaValue {
    let path = args.string(0);
    let root = match parse(&args.string(1)) {
        Ok(root) => root,
        Err(diagnostic) => return diagnostic,
    };

    let mut current = Some(&root);
    for part in path.split('.') {
        current = match current {
            None | Some(Value::Null) => return FormulaValue::empty(),
            Some(Value::Object(map)) => map.get(part),
            Some(Value::Array(items)) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            Some(_) => None,
        };
    }

    match current {
        Some(value) => FormulaValue::String(item_text(value)),
        None => FormulaValue::empty(),
    }
}

/// JSONUPDATE(Json; Property; Value)
pub fn fn_jsonupdate(args: &Args) -> FormulaValue {
    let text = args.string(0);
    let property = args.string(1);
    let value = to_json(args.value(2));

    let mut root = if text.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        match parse(&text) {
            Ok(root) => root,
            Err(diagnostic) => return diagnostic,
        }
    };

    match &mut root {
        Value::Object(map) => {
            map.insert(property, value);
        }
        Value::Array(items) => {
            if let Some(slot) = property.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                *slot = value;
            }
        }
        _ => {}
    }
    FormulaValue::String(root.to_string())
}

/// JSONINDEX(Index; Json)
pub fn fn_jsonindex(args: &Args) -> FormulaValue {
    let index = args.number(0);
    let root = match parse(&args.string(1)) {
        Ok(root) => root,
        Err(diagnostic) => return diagnostic,
    };
    let Value::Array(items) = root else {
        return FormulaValue::empty();
    };

    match resolve_index(index, items.len()) {
        Some(i) => FormulaValue::String(item_text(&items[i])),
        None => FormulaValue::empty(),
    }
}

/// JSONREMOVE(Index; Json)
pub fn fn_jsonremove(args: &Args) -> FormulaValue {
    let index = args.number(0);
    let text = args.string(1);
    let root = match parse(&text) {
        Ok(root) => root,
        Err(diagnostic) => return diagnostic,
    };
    let Value::Array(mut items) = root else {
        return FormulaValue::String(text);
    };

    let start = if index.is_nan() {
        0.0
    } else if index < 0.0 {
        (items.len() as f64 + index.trunc()).max(0.0)
    } else {
        index.trunc()
    };
    if start < items.len() as f64 {
        items.remove(start as usize);
    }
    FormulaValue::String(Value::Array(items).to_string())
}

/// JSONFIFO(Json; Item; MaxLength)
///
/// Text items are parsed as JSON, so a plain word must be passed JSON-quoted.
pub fn fn_jsonfifo(args: &Args) -> FormulaValue {
    let text = args.string(0);
    let item = args.value(1);
    let max_length = args.number(2);

    let mut items = if text.is_empty() {
        Vec::new()
    } else {
        match parse(&text) {
            Ok(Value::Array(items)) => items,
            Ok(_) => Vec::new(),
            Err(diagnostic) => return diagnostic,
        }
    };

    let item = match item {
        FormulaValue::String(s) => match parse(&s) {
            Ok(value) => value,
            Err(diagnostic) => return diagnostic,
        },
        FormulaValue::Number(n) => number_value(n),
    };
    items.insert(0, item);

    if max_length > 0.0 && items.len() as f64 > max_length {
        items.truncate(max_length as usize);
    }
    FormulaValue::String(Value::Array(items).to_string())
}

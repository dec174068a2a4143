//! Logical functions

use crate::evaluator::Args;
use crate::value::FormulaValue;

/// IF(Condition; Result; [Condition; Result; ...]; [Else])
///
/// Conditions are checked left to right and only up to the first true one.
pub fn fn_if(args: &Args) -> FormulaValue {
    let mut i = 0;
    while i + 1 < args.len() {
        if args.bool(i) {
            return args.value(i + 1);
        }
        i += 2;
    }

    if args.len() % 2 == 1 {
        return args.value(args.len() - 1);
    }
    FormulaValue::empty()
}

/// HASVALUE(Value)
pub fn fn_hasvalue(args: &Args) -> FormulaValue {
    (!args.value(0).is_blank()).into()
}

/// ISEMPTY(Value)
pub fn fn_isempty(args: &Args) -> FormulaValue {
    args.value(0).is_blank().into()
}

/// ISTRUE(Value; ...)
pub fn fn_istrue(args: &Args) -> FormulaValue {
    args.values().iter().all(FormulaValue::as_bool).into()
}

/// ANYTRUE(Value; ...)
pub fn fn_anytrue(args: &Args) -> FormulaValue {
    args.values().iter().any(FormulaValue::as_bool).into()
}

/// NOT(Value)
pub fn fn_not(args: &Args) -> FormulaValue {
    (!args.bool(0)).into()
}

/// FIRSTVALUE(Item; ...)
pub fn fn_firstvalue(args: &Args) -> FormulaValue {
    for i in 0..args.len() {
        let value = args.string(i);
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return FormulaValue::String(trimmed.to_string());
        }
    }
    FormulaValue::empty()
}

//! Formula evaluator
//!
//! Walks the AST and produces a single [`FormulaValue`]. Evaluation never fails: function
//! problems are rendered inline as bracketed diagnostics.
//!
//! Evaluation recurses once per nested call with no depth limit, matching the parser.

use crate::ast::FormulaExpr;
use crate::functions::{builtin_registry, FunctionRegistry, ImplementationStatus};
use crate::value::FormulaValue;
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Evaluation context
pub struct EvaluationContext<'a> {
    /// Function table used for dispatch
    pub registry: &'a FunctionRegistry,
    /// Field values by name
    pub fields: Option<&'a HashMap<String, String>>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(registry: &'a FunctionRegistry, fields: Option<&'a HashMap<String, String>>) -> Self {
        Self { registry, fields }
    }

    /// Built-in functions, no fields
    pub fn simple() -> EvaluationContext<'static> {
        EvaluationContext {
            registry: builtin_registry(),
            fields: None,
        }
    }

    /// Built-in functions with the given field values
    pub fn with_fields(fields: &'a HashMap<String, String>) -> Self {
        Self {
            registry: builtin_registry(),
            fields: Some(fields),
        }
    }

    /// Value of a field, or the unresolved `[[Name]]` echo
    pub fn field_value(&self, name: &str) -> FormulaValue {
        match self.fields.and_then(|fields| fields.get(name)) {
            Some(value) => FormulaValue::String(value.clone()),
            None => FormulaValue::String(format!("[[{}]]", name)),
        }
    }
}

/// Unevaluated call arguments.
///
/// Functions pull values out on demand, so arguments a function never looks at are never
/// evaluated. Positions past the end read as the empty string.
pub struct Args<'a, 'c> {
    nodes: &'a [FormulaExpr],
    ctx: &'a EvaluationContext<'c>,
}

impl<'a, 'c> Args<'a, 'c> {
    pub fn new(nodes: &'a [FormulaExpr], ctx: &'a EvaluationContext<'c>) -> Self {
        Self { nodes, ctx }
    }

    /// Number of argument slots
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Evaluate the argument at `index`
    pub fn value(&self, index: usize) -> FormulaValue {
        match self.nodes.get(index) {
            Some(node) => evaluate(node, self.ctx),
            None => FormulaValue::empty(),
        }
    }

    pub fn string(&self, index: usize) -> String {
        self.value(index).as_string()
    }

    pub fn number(&self, index: usize) -> f64 {
        self.value(index).as_number()
    }

    pub fn bool(&self, index: usize) -> bool {
        self.value(index).as_bool()
    }

    pub fn date(&self, index: usize) -> Option<NaiveDateTime> {
        self.value(index).as_date()
    }

    /// Evaluate every argument in order
    pub fn values(&self) -> Vec<FormulaValue> {
        self.nodes.iter().map(|n| evaluate(n, self.ctx)).collect()
    }

    /// Text form of every argument in order
    pub fn strings(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|n| evaluate(n, self.ctx).as_string())
            .collect()
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaValue {
    match expr {
        FormulaExpr::Literal(value) => value.clone(),
        FormulaExpr::Field(name) => ctx.field_value(name),
        FormulaExpr::Concat(parts) => {
            let mut out = String::new();
            for part in parts {
                out.push_str(&evaluate(part, ctx).as_string());
            }
            FormulaValue::String(out)
        }
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

fn evaluate_function(name: &str, args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaValue {
    let Some(def) = ctx.registry.get(name) else {
        return FormulaValue::String(format!("[Unknown function: {}]", name));
    };

    match def.implementation {
        Some(implementation) if def.status != ImplementationStatus::NotImplemented => {
            implementation(&Args::new(args, ctx))
        }
        _ => {
            tracing::debug!(function = %name, "backend function short-circuited");
            FormulaValue::String(format!(
                "[{}: Not available - requires ProcessPlan backend]",
                name
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;

    fn eval(source: &str) -> FormulaValue {
        let ast = parse_formula(source, builtin_registry()).unwrap();
        evaluate(&ast, &EvaluationContext::simple())
    }

    fn eval_with(source: &str, fields: &[(&str, &str)]) -> String {
        let fields: HashMap<String, String> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let ast = parse_formula(source, builtin_registry()).unwrap();
        evaluate(&ast, &EvaluationContext::with_fields(&fields)).as_string()
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("42"), FormulaValue::Number(42.0));
        assert_eq!(eval("'text'"), FormulaValue::String("text".into()));
        assert_eq!(eval(""), FormulaValue::String(String::new()));
    }

    #[test]
    fn test_fields() {
        assert_eq!(eval_with("[[Name]]", &[("Name", "Ada")]), "Ada");
        assert_eq!(eval_with("[[ Name ]]", &[("Name", "Ada")]), "Ada");
        assert_eq!(eval_with("[[Missing]]", &[]), "[[Missing]]");
    }

    #[test]
    fn test_concat_has_no_separator() {
        assert_eq!(
            eval_with("[[First]] [[Last]]", &[("First", "Ada"), ("Last", "Lovelace")]),
            "AdaLovelace"
        );
        assert_eq!(eval("'a ' 1 ' b'").as_string(), "a 1 b");
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            eval("=NOTAREALFUNCTION(x)").as_string(),
            "[Unknown function: NOTAREALFUNCTION]"
        );
    }

    #[test]
    fn test_backend_function_short_circuits() {
        assert_eq!(
            eval("=TABLELOOKUP([[A]]; T1; q)").as_string(),
            "[TABLELOOKUP: Not available - requires ProcessPlan backend]"
        );
    }

    #[test]
    fn test_missing_arguments_are_empty() {
        assert_eq!(eval("=UPPERCASE()").as_string(), "");
        assert_eq!(eval("=LENGTH()"), FormulaValue::Number(0.0));
    }

    #[test]
    fn test_nested_functions() {
        assert_eq!(
            eval_with("=UPPERCASE(=TRIM([[Name]]))", &[("Name", "  ada   lovelace ")]),
            "ADA LOVELACE"
        );
    }

    #[test]
    fn test_args_are_lazy() {
        assert_eq!(eval("=IF(1; yes; =RANDOMNUM(1; 1000000))").as_string(), "yes");
        assert_eq!(eval("=FIRSTVALUE(first; =RANDOMNUM(1; 1000000))").as_string(), "first");
    }
}

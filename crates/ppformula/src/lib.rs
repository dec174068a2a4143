//! # ppformula
//!
//! Lexer, parser and evaluator for the ProcessPlan formula language.
//!
//! This crate provides:
//! - Tokenizing formula text (`[[Field]]` references, `=NAME(...)` calls, literals)
//! - Parsing tokens into an AST with implicit concatenation
//! - Evaluating the AST against a map of field values
//! - The built-in function library and its registry metadata
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! let mut fields = HashMap::new();
//! fields.insert("Name".to_string(), "Ada".to_string());
//!
//! let out = ppformula::compile("Hello =UPPERCASE([[Name]])", &fields).unwrap();
//! assert_eq!(out, "HelloADA");
//! ```

pub mod ast;
pub mod datetime;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

use std::collections::HashMap;

pub use ast::FormulaExpr;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, Args, EvaluationContext};
pub use functions::{
    builtin_registry, FunctionDef, FunctionRegistry, ImplementationStatus, StatusSummary,
};
pub use lexer::{field_names, tokenize, Token};
pub use parser::parse_formula;
pub use value::FormulaValue;

/// Compile and evaluate `source` against `fields`, returning the text result.
///
/// Only malformed syntax is an error. Function-level problems show up inline as bracketed
/// diagnostics in the returned text.
pub fn compile(source: &str, fields: &HashMap<String, String>) -> FormulaResult<String> {
    let formula = Formula::parse(source)?;
    Ok(formula.evaluate(fields).as_string())
}

/// A parsed formula that can be evaluated repeatedly
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    ast: FormulaExpr,
}

impl Formula {
    /// Parse `source` against the built-in registry
    pub fn parse(source: &str) -> FormulaResult<Self> {
        let ast = parse_formula(source, builtin_registry())?;
        Ok(Self { ast })
    }

    /// Evaluate against `fields`
    pub fn evaluate(&self, fields: &HashMap<String, String>) -> FormulaValue {
        evaluate(&self.ast, &EvaluationContext::with_fields(fields))
    }

    /// Field names referenced by the formula, sorted and de-duplicated
    pub fn fields(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.ast.for_each_field(&mut |name| names.push(name.to_string()));
        names.sort();
        names.dedup();
        names
    }

    /// Field names referenced by the formula that `fields` does not supply
    pub fn unresolved_fields(&self, fields: &HashMap<String, String>) -> Vec<String> {
        self.fields()
            .into_iter()
            .filter(|name| !fields.contains_key(name))
            .collect()
    }

    pub fn ast(&self) -> &FormulaExpr {
        &self.ast
    }

    /// Nesting depth of function calls
    pub fn depth(&self) -> usize {
        self.ast.depth()
    }
}

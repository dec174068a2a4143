//! Formula Abstract Syntax Tree types

use crate::value::FormulaValue;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// String or number literal
    Literal(FormulaValue),
    /// `[[Name]]` field reference
    Field(String),
    /// Function call
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },
    /// Sequence of nodes whose text forms are joined with no separator
    Concat(Vec<FormulaExpr>),
}

impl FormulaExpr {
    /// Empty string literal
    pub fn empty() -> Self {
        FormulaExpr::Literal(FormulaValue::empty())
    }

    /// Visit every field reference in the tree, depth first
    pub fn for_each_field<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            FormulaExpr::Literal(_) => {}
            FormulaExpr::Field(name) => f(name),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.for_each_field(f);
                }
            }
            FormulaExpr::Concat(parts) => {
                for part in parts {
                    part.for_each_field(f);
                }
            }
        }
    }

    /// Nesting depth of function calls
    pub fn depth(&self) -> usize {
        match self {
            FormulaExpr::Literal(_) | FormulaExpr::Field(_) => 0,
            FormulaExpr::Function { args, .. } => {
                1 + args.iter().map(FormulaExpr::depth).max().unwrap_or(0)
            }
            FormulaExpr::Concat(parts) => parts.iter().map(FormulaExpr::depth).max().unwrap_or(0),
        }
    }
}

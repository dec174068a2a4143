//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while compiling a formula.
///
/// Evaluation itself never fails: malformed function input is reported inline as a
/// bracketed diagnostic string inside the result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// A token the grammar requires was missing
    #[error("Expected {expected} but got {found}")]
    Parse {
        expected: &'static str,
        found: String,
    },
}

impl FormulaError {
    pub(crate) fn expected(expected: &'static str, found: impl Into<String>) -> Self {
        FormulaError::Parse {
            expected,
            found: found.into(),
        }
    }
}

//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown function
    ///
    /// The supported set is fixed (IF, SUM, MAX, MIN, ABS, ROUND); anything
    /// else is rejected at parse time rather than evaluated on a best-effort
    /// basis.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: &'static str,
        expected: String,
        actual: usize,
    },

    /// The formula evaluated to NaN or infinity
    #[error("Formula result is not a finite number")]
    NonFinite,
}

//! Formula errors and the sentinel tokens they surface as.

use thiserror::Error;

/// Errors raised while parsing or evaluating a formula.
///
/// These never leave the evaluation boundary: [`crate::engine::evaluate`] turns
/// them into an in-cell [`ErrorToken`].
#[derive(Error, Debug)]
pub enum FormulaError {
    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    #[error("Malformed range: {0}")]
    MalformedRange(String),

    #[error("Formula does not match FUNCTION(args): {0}")]
    Grammar(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function} requires {expected} arguments, got {found}")]
    ArgumentCount {
        function: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Column {0} is not in the sheet")]
    UnknownColumn(String),

    #[error("Row {row} is outside the sheet ({rows} rows)")]
    RowOutOfBounds { row: usize, rows: usize },

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// In-cell sentinel shown instead of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorToken {
    /// `#ERROR!`
    Error,
    /// `#INVALID!` (unknown function name)
    Invalid,
    /// `#ERROR: Requires 3 arguments!`
    RequiresThreeArguments,
}

impl ErrorToken {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorToken::Error => "#ERROR!",
            ErrorToken::Invalid => "#INVALID!",
            ErrorToken::RequiresThreeArguments => "#ERROR: Requires 3 arguments!",
        }
    }
}

impl std::fmt::Display for ErrorToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FormulaError {
    /// The sentinel a user sees for this error.
    pub fn token(&self) -> ErrorToken {
        match self {
            FormulaError::UnknownFunction(_) => ErrorToken::Invalid,
            FormulaError::ArgumentCount { expected: 3, .. } => ErrorToken::RequiresThreeArguments,
            _ => ErrorToken::Error,
        }
    }
}

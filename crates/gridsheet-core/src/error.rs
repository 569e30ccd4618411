//! Error types for Gridsheet core.

use thiserror::Error;

/// Errors that can occur while editing or persisting a workbook.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A typed cell rejected an edit. Carries the message shown to the user.
    #[error("{0}")]
    Validation(String),

    #[error("Invalid sheet set: {0}")]
    InvalidSheetSet(String),

    #[error("Column {0} is not in the sheet")]
    UnknownColumn(String),

    #[error("Row {row} is outside the sheet ({rows} rows)")]
    RowOutOfBounds { row: usize, rows: usize },
}

pub type Result<T> = std::result::Result<T, SheetError>;

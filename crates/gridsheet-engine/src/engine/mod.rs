//! Spreadsheet formula engine API.
//!
//! - [`CellValue`], [`Row`] - Raw cell storage
//! - [`CellReference`], [`RangeReference`], [`CellAddress`] - A1 notation with `$` markers
//! - [`adjust_references`] - Shift relative references for copy/fill
//! - [`Function`], [`FUNCTIONS`] - The fixed built-in function set
//! - [`evaluate`], [`evaluate_formula`] - Evaluate cell text against a grid
//! - [`validate_cell`] - Type checks for committed edits
//! - [`format_number`] - Format numbers for display

mod cell;
mod cell_ref;
mod error;
mod format;
mod formula;
mod functions;
mod validate;

pub use cell::{CellValue, Row};
pub use cell_ref::{
    Absolute, CellAddress, CellReference, RangeReference, adjust_references, column_label,
    column_ordinal, format_reference, offset_column, parse_range, parse_reference,
};
pub use error::{ErrorToken, FormulaError};
pub use format::format_number;
pub use formula::{
    FormulaCall, FormulaTarget, FormulaValue, evaluate, evaluate_formula, parse_formula,
    parse_formula_with_cell_ref, split_arguments,
};
pub use functions::{
    FUNCTIONS, Function, FunctionInfo, FunctionOutput, avg, count, find_and_replace, max, min,
    remove_duplicates, sum,
};
pub use validate::{CellKind, Validation, validate_cell};

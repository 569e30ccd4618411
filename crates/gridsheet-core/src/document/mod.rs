//! Document state and logic (UI-agnostic).

mod clipboard;
mod eval;
mod ops;
mod selection;
mod sort;
mod state;

pub use clipboard::parse_tsv;
pub use eval::{CellFormatting, FormatPatch};
pub use ops::StructuralEdit;
pub use selection::{Direction, FormulaBar, SelectionRange, resolve_selection_range};
pub use sort::SortDirection;
pub use state::Document;

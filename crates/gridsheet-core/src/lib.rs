//! gridsheet-core - UI-agnostic grid model, clipboard, sorting and storage.

pub mod config;
pub mod document;
pub mod error;
pub mod sheet;
pub mod storage;

pub use config::Config;
pub use document::{
    CellFormatting, Direction, Document, FormatPatch, FormulaBar, SelectionRange, SortDirection,
    StructuralEdit,
};
pub use error::{Result, SheetError};
pub use sheet::{Sheet, SheetSet};
pub use storage::{JsonFileStore, MemoryStore, SheetStore};

pub use gridsheet_engine::engine::{CellAddress, CellKind, CellValue, FormulaValue};

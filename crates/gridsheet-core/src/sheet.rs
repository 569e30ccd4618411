//! Sheets and the sheet set handed to persistence.
//!
//! A [`Sheet`] is a dense grid: every row is exactly as wide as the header
//! list. Headers are positional labels (`A..Z, AA..`) and are regenerated after
//! any column edit, so a label names a position, not a column's identity.

use gridsheet_engine::engine::{CellAddress, CellValue, Row, column_label};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Result, SheetError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    /// Stable id, assigned by the document.
    pub id: u32,
    pub column_headers: Vec<String>,
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
}

impl Sheet {
    /// A sheet of `rows` x `columns` blank cells with generated headers.
    pub fn blank(name: impl Into<String>, id: u32, rows: usize, columns: usize) -> Sheet {
        Sheet {
            name: name.into(),
            id,
            column_headers: (0..columns).map(column_label).collect(),
            rows: vec![vec![CellValue::Empty; columns]; rows],
        }
    }

    pub fn width(&self) -> usize {
        self.column_headers.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn blank_row(&self) -> Row {
        vec![CellValue::Empty; self.width()]
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.column_headers.iter().position(|h| h == label)
    }

    /// Resolve an address to (row, column index).
    pub fn position(&self, addr: &CellAddress) -> Option<(usize, usize)> {
        let col = self.column_index(&addr.col)?;
        (addr.row < self.height()).then_some((addr.row, col))
    }

    /// Like [`Sheet::position`], with the reason it failed.
    pub fn try_position(&self, addr: &CellAddress) -> Result<(usize, usize)> {
        let col = self
            .column_index(&addr.col)
            .ok_or_else(|| SheetError::UnknownColumn(addr.col.clone()))?;
        if addr.row >= self.height() {
            return Err(SheetError::RowOutOfBounds {
                row: addr.row,
                rows: self.height(),
            });
        }
        Ok((addr.row, col))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut CellValue> {
        self.rows.get_mut(row).and_then(|r| r.get_mut(col))
    }

    pub fn address(&self, row: usize, col: usize) -> Option<CellAddress> {
        self.column_headers
            .get(col)
            .map(|label| CellAddress::new(row, label.clone()))
    }

    /// Relabel headers positionally and square every row to the header count.
    pub fn regenerate_headers(&mut self) {
        let width = self.width();
        self.column_headers = (0..width).map(column_label).collect();
        for row in &mut self.rows {
            row.resize(width, CellValue::Empty);
        }
    }

    /// Check the sheet's structural invariants.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(SheetError::InvalidSheetSet(msg));

        if self.name.trim().is_empty() {
            return invalid(format!("sheet {} has no name", self.id));
        }
        if self.column_headers.is_empty() {
            return invalid(format!("sheet '{}' has no columns", self.name));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.column_headers.iter().find(|h| !seen.insert(h.as_str())) {
            return invalid(format!(
                "sheet '{}' has duplicate column header {}",
                self.name, dup
            ));
        }
        if let Some((i, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.width())
        {
            return invalid(format!(
                "sheet '{}' row {} has {} cells, expected {}",
                self.name,
                i + 1,
                row.len(),
                self.width()
            ));
        }
        Ok(())
    }
}

/// All sheets of a workbook plus the active index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSet {
    pub sheets: Vec<Sheet>,
    #[serde(rename = "activeSheetIndex")]
    pub active_sheet: usize,
}

impl SheetSet {
    pub fn validate(&self) -> Result<()> {
        if self.sheets.is_empty() {
            return Err(SheetError::InvalidSheetSet("no sheets".to_string()));
        }
        for sheet in &self.sheets {
            sheet.validate()?;
        }
        if self.active_sheet >= self.sheets.len() {
            return Err(SheetError::InvalidSheetSet(format!(
                "active sheet {} out of range ({} sheets)",
                self.active_sheet,
                self.sheets.len()
            )));
        }
        Ok(())
    }
}

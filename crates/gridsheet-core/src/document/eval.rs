use gridsheet_engine::engine::{
    CellAddress, CellKind, CellValue, FormulaValue, evaluate, parse_formula_with_cell_ref,
    validate_cell,
};
use serde::{Deserialize, Serialize};

use super::Document;
use crate::error::{Result, SheetError};

/// Presentation attributes of a cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFormatting {
    pub bold: bool,
    pub italic: bool,
    pub font_size: u32,
    pub color: String,
}

impl Default for CellFormatting {
    fn default() -> Self {
        CellFormatting {
            bold: false,
            italic: false,
            font_size: 12,
            color: "black".to_string(),
        }
    }
}

/// A partial formatting update; `None` fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatPatch {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub font_size: Option<u32>,
    pub color: Option<String>,
}

impl FormatPatch {
    fn apply(&self, fmt: &mut CellFormatting) {
        if let Some(bold) = self.bold {
            fmt.bold = bold;
        }
        if let Some(italic) = self.italic {
            fmt.italic = italic;
        }
        if let Some(size) = self.font_size {
            fmt.font_size = size;
        }
        if let Some(color) = &self.color {
            fmt.color = color.clone();
        }
    }
}

impl Document {
    /// Evaluate a cell against the current grid.
    ///
    /// Formulas are recomputed on every call. An address that does not
    /// resolve reads as blank.
    pub fn evaluate_cell(&self, addr: &CellAddress) -> FormulaValue {
        let sheet = self.sheet();
        let Some((row, col)) = sheet.position(addr) else {
            log::warn!("Cannot read {}: not in the sheet", addr);
            return FormulaValue::Text(String::new());
        };
        match &sheet.rows[row][col] {
            CellValue::Empty => FormulaValue::Text(String::new()),
            CellValue::Number(n) => FormulaValue::Number(*n),
            CellValue::Text(text) if text.starts_with('=') => {
                evaluate(text, &sheet.rows, &sheet.column_headers)
            }
            CellValue::Text(text) => FormulaValue::Text(text.clone()),
        }
    }

    /// Display string for a cell.
    pub fn display_value(&self, addr: &CellAddress) -> String {
        self.evaluate_cell(addr).to_string()
    }

    /// Raw cell text as the user typed it.
    pub fn raw_cell(&self, addr: &CellAddress) -> String {
        let sheet = self.sheet();
        match sheet.position(addr) {
            Some((row, col)) => sheet.rows[row][col].to_input_string(),
            None => {
                log::warn!("Cannot read {}: not in the sheet", addr);
                String::new()
            }
        }
    }

    /// Commit a direct cell edit, checked against the cell's declared type.
    ///
    /// A rejected edit leaves the grid untouched and returns
    /// [`SheetError::Validation`] with the message to show.
    pub fn commit_cell_edit(&mut self, addr: &CellAddress, raw: &str) -> Result<()> {
        let raw = raw.trim();
        let check = validate_cell(raw, self.cell_type(addr));
        if !check.valid {
            return Err(SheetError::Validation(
                check.message.unwrap_or_else(|| "Invalid input".to_string()),
            ));
        }
        self.write_cell(addr, raw)?;
        self.editing = None;
        Ok(())
    }

    /// Write raw text without type checks (the formula bar path).
    pub fn set_cell_value(&mut self, addr: &CellAddress, raw: &str) -> Result<()> {
        self.write_cell(addr, raw)
    }

    fn write_cell(&mut self, addr: &CellAddress, raw: &str) -> Result<()> {
        let (row, col) = self.sheet().try_position(addr).inspect_err(|e| {
            log::warn!("Cannot write {}: {}", addr, e);
        })?;
        self.sheet_mut().rows[row][col] = CellValue::from(raw);
        self.persist();
        Ok(())
    }

    /// Apply the formula bar.
    ///
    /// `B2=SUM(A1:A3)` writes to B2; anything else goes to the selected cell.
    /// Returns the cell written, if any.
    pub fn submit_formula_bar(&mut self) -> Result<Option<CellAddress>> {
        let input = self.formula_bar.text.trim().to_string();
        if input.is_empty() {
            return Ok(None);
        }
        let parsed = parse_formula_with_cell_ref(&input);
        let target = match parsed.target.or_else(|| self.selected_cell.clone()) {
            Some(target) => target,
            None => return Ok(None),
        };
        self.set_cell_value(&target, &parsed.formula)?;
        self.formula_bar.focused = false;
        Ok(Some(target))
    }

    pub fn set_cell_type(&mut self, addr: &CellAddress, kind: CellKind) {
        self.metadata.insert(addr.clone(), kind);
    }

    pub fn cell_type(&self, addr: &CellAddress) -> CellKind {
        self.metadata.get(addr).copied().unwrap_or_default()
    }

    pub fn cell_formatting(&self, addr: &CellAddress) -> CellFormatting {
        self.formatting.get(addr).cloned().unwrap_or_default()
    }

    pub fn update_cell_formatting(&mut self, addr: &CellAddress, patch: &FormatPatch) {
        let fmt = self.formatting.entry(addr.clone()).or_default();
        patch.apply(fmt);
    }

    /// Apply a formatting change to every cell in the selection.
    pub fn apply_format_to_selection(&mut self, patch: &FormatPatch) -> usize {
        let Some(bounds) = self.selection.as_ref().and_then(|r| r.bounds(self.sheet())) else {
            return 0;
        };
        let mut count = 0;
        for row in bounds.rows() {
            for col in bounds.cols() {
                if let Some(addr) = self.sheet().address(row, col) {
                    self.update_cell_formatting(&addr, patch);
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> CellAddress {
        CellAddress::from_str(s).unwrap()
    }

    #[test]
    fn test_evaluate_cell_recomputes() {
        let mut doc = Document::new();
        doc.set_cell_value(&addr("B1"), "10").unwrap();
        doc.set_cell_value(&addr("B2"), "20").unwrap();
        doc.set_cell_value(&addr("C1"), "=SUM(B1:B3)").unwrap();
        assert_eq!(doc.display_value(&addr("C1")), "30");

        doc.set_cell_value(&addr("B3"), "30").unwrap();
        assert_eq!(doc.display_value(&addr("C1")), "60");
        assert_eq!(doc.raw_cell(&addr("C1")), "=SUM(B1:B3)");
    }

    #[test]
    fn test_unknown_address_reads_blank() {
        let doc = Document::new();
        assert_eq!(doc.display_value(&addr("ZZ1")), "");
        assert_eq!(doc.raw_cell(&addr("A500")), "");
    }

    #[test]
    fn test_typed_commit_rejects_invalid_edit() {
        let mut doc = Document::new();
        let a1 = addr("A1");
        doc.set_cell_type(&a1, CellKind::Number);
        doc.set_cell_value(&a1, "5").unwrap();

        let err = doc.commit_cell_edit(&a1, "abc").unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid number");
        assert_eq!(doc.raw_cell(&a1), "5");

        doc.commit_cell_edit(&a1, " 7.5 ").unwrap();
        assert_eq!(doc.raw_cell(&a1), "7.5");

        doc.set_cell_type(&addr("A2"), CellKind::Date);
        assert!(doc.commit_cell_edit(&addr("A2"), "2024-02-30").is_err());
        doc.commit_cell_edit(&addr("A2"), "").unwrap();
    }

    #[test]
    fn test_write_to_unknown_column_fails() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.set_cell_value(&addr("AB1"), "x"),
            Err(SheetError::UnknownColumn(_))
        ));
        assert!(!doc.modified);
    }

    #[test]
    fn test_submit_formula_bar_targets() {
        let mut doc = Document::new();
        doc.formula_bar.set_text("A1=SUM(B1:B8)");
        assert_eq!(doc.submit_formula_bar().unwrap(), Some(addr("A1")));
        assert_eq!(doc.raw_cell(&addr("A1")), "=SUM(B1:B8)");

        doc.click_cell(&addr("C2"));
        doc.formula_bar.set_text("=UPPER(abc)");
        assert_eq!(doc.submit_formula_bar().unwrap(), Some(addr("C2")));
        assert_eq!(doc.display_value(&addr("C2")), "ABC");

        let mut empty = Document::new();
        empty.formula_bar.set_text("=UPPER(x)");
        assert_eq!(empty.submit_formula_bar().unwrap(), None);
    }

    #[test]
    fn test_formatting_defaults_and_patch() {
        let mut doc = Document::new();
        let a1 = addr("A1");
        assert_eq!(doc.cell_formatting(&a1), CellFormatting::default());
        assert_eq!(doc.cell_formatting(&a1).font_size, 12);

        doc.update_cell_formatting(
            &a1,
            &FormatPatch {
                bold: Some(true),
                ..Default::default()
            },
        );
        doc.update_cell_formatting(
            &a1,
            &FormatPatch {
                color: Some("red".into()),
                ..Default::default()
            },
        );
        let fmt = doc.cell_formatting(&a1);
        assert!(fmt.bold);
        assert_eq!(fmt.color, "red");
        assert!(!fmt.italic);
    }

    #[test]
    fn test_apply_format_to_selection() {
        let mut doc = Document::new();
        doc.mouse_down(&addr("A1"));
        doc.mouse_over(&addr("B2"));
        doc.mouse_up();
        let patch = FormatPatch {
            italic: Some(true),
            ..Default::default()
        };
        assert_eq!(doc.apply_format_to_selection(&patch), 4);
        assert!(doc.cell_formatting(&addr("B2")).italic);
        assert!(!doc.cell_formatting(&addr("C1")).italic);
    }
}

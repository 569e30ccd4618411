//! Cut, copy, paste and fill.
//!
//! The interchange format is plain TSV: cells joined by tabs, rows by
//! newlines. Inside the document a copy also keeps a deep snapshot of the raw
//! cells, so formulas survive a round trip and can be relocated.

use gridsheet_engine::engine::{CellAddress, CellValue, Row, adjust_references};

use super::Document;
use super::selection::Bounds;

/// Snapshot taken by a copy or cut.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Clipboard {
    cells: Vec<Row>,
    /// Top-left (row, column index) the snapshot was taken from.
    anchor: (usize, usize),
    cut: bool,
}

fn to_tsv(cells: &[Row]) -> String {
    cells
        .iter()
        .map(|row| {
            row.iter()
                .map(CellValue::to_input_string)
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split TSV text into rows of cells. Text with no tab or newline is one cell.
pub fn parse_tsv(text: &str) -> Vec<Vec<String>> {
    if !text.contains('\t') && !text.contains('\n') {
        return vec![vec![text.to_string()]];
    }
    text.split('\n')
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

/// Relocate a formula cell by an offset; other cells are returned as-is.
fn relocate(value: &CellValue, row_offset: isize, col_offset: isize) -> CellValue {
    match value.as_formula() {
        Some(formula) => CellValue::from(adjust_references(formula, row_offset, col_offset)),
        None => value.clone(),
    }
}

fn trimmed(value: CellValue) -> CellValue {
    match value {
        CellValue::Text(text) => CellValue::from(text.trim()),
        other => other,
    }
}

impl Document {
    fn snapshot(&self, bounds: Bounds) -> Vec<Row> {
        bounds
            .rows()
            .filter_map(|r| self.sheet().rows.get(r))
            .map(|row| row.get(bounds.cols()).unwrap_or(&[]).to_vec())
            .collect()
    }

    /// Copy the selection (or the selected cell). Returns its TSV text.
    pub fn copy_selection(&mut self) -> Option<String> {
        let bounds = self.selection_bounds()?;
        let cells = self.snapshot(bounds);
        let text = to_tsv(&cells);
        self.clipboard = Some(Clipboard {
            cells,
            anchor: (bounds.top, bounds.left),
            cut: false,
        });
        Some(text)
    }

    /// Like [`Document::copy_selection`], then blank the source cells.
    pub fn cut_selection(&mut self) -> Option<String> {
        let bounds = self.selection_bounds()?;
        let cells = self.snapshot(bounds);
        let text = to_tsv(&cells);
        self.clipboard = Some(Clipboard {
            cells,
            anchor: (bounds.top, bounds.left),
            cut: true,
        });

        let sheet = self.sheet_mut();
        for r in bounds.rows() {
            for c in bounds.cols() {
                if let Some(cell) = sheet.cell_mut(r, c) {
                    *cell = CellValue::Empty;
                }
            }
        }
        self.persist();
        Some(text)
    }

    /// Paste at `target` and return the number of cells written.
    ///
    /// The internal snapshot wins over `external` text. Copied formulas are
    /// relocated by the distance from the copy anchor; cut formulas and
    /// external text are written verbatim. Cells past the sheet edge are
    /// dropped and text cells are trimmed.
    pub fn paste_at(&mut self, target: &CellAddress, external: Option<&str>) -> usize {
        let Some((base_row, base_col)) = self.sheet().position(target) else {
            log::warn!("Cannot paste at {}: not in the sheet", target);
            return 0;
        };

        let cells: Vec<Row> = match (&self.clipboard, external) {
            (Some(clip), _) => {
                let row_offset = base_row as isize - clip.anchor.0 as isize;
                let col_offset = base_col as isize - clip.anchor.1 as isize;
                if clip.cut {
                    clip.cells.clone()
                } else {
                    clip.cells
                        .iter()
                        .map(|row| {
                            row.iter()
                                .map(|v| relocate(v, row_offset, col_offset))
                                .collect()
                        })
                        .collect()
                }
            }
            (None, Some(text)) => parse_tsv(text)
                .into_iter()
                .map(|row| row.into_iter().map(CellValue::from).collect())
                .collect(),
            (None, None) => return 0,
        };

        let sheet = self.sheet_mut();
        let mut written = 0;
        for (i, row) in cells.into_iter().enumerate() {
            for (j, value) in row.into_iter().enumerate() {
                if let Some(cell) = sheet.cell_mut(base_row + i, base_col + j) {
                    *cell = trimmed(value);
                    written += 1;
                }
            }
        }
        if written > 0 {
            self.persist();
        }
        written
    }

    /// Copy the first row of the selection down through the rest of it.
    pub fn fill_down(&mut self) -> bool {
        let Some(bounds) = self.selection.as_ref().and_then(|r| r.bounds(self.sheet())) else {
            return false;
        };
        if bounds.top == bounds.bottom {
            return false;
        }
        let sheet = self.sheet_mut();
        for c in bounds.cols() {
            let source = sheet.rows[bounds.top][c].clone();
            for r in bounds.top + 1..=bounds.bottom {
                sheet.rows[r][c] = relocate(&source, (r - bounds.top) as isize, 0);
            }
        }
        self.persist();
        true
    }

    /// Copy the first column of the selection right through the rest of it.
    pub fn fill_right(&mut self) -> bool {
        let Some(bounds) = self.selection.as_ref().and_then(|r| r.bounds(self.sheet())) else {
            return false;
        };
        if bounds.left == bounds.right {
            return false;
        }
        let sheet = self.sheet_mut();
        for r in bounds.rows() {
            let source = sheet.rows[r][bounds.left].clone();
            for c in bounds.left + 1..=bounds.right {
                sheet.rows[r][c] = relocate(&source, 0, (c - bounds.left) as isize);
            }
        }
        self.persist();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> CellAddress {
        CellAddress::from_str(s).unwrap()
    }

    fn select(doc: &mut Document, from: &str, to: &str) {
        doc.mouse_down(&addr(from));
        doc.mouse_over(&addr(to));
        doc.mouse_up();
    }

    #[test]
    fn test_copy_returns_tsv() {
        let mut doc = Document::new();
        doc.set_cell_value(&addr("A1"), "a").unwrap();
        doc.set_cell_value(&addr("B2"), "=SUM(A1:A1)").unwrap();
        select(&mut doc, "A1", "B2");
        assert_eq!(doc.copy_selection().unwrap(), "a\t\n\t=SUM(A1:A1)");
        assert_eq!(doc.raw_cell(&addr("A1")), "a");
    }

    #[test]
    fn test_copy_without_selection_is_none() {
        let mut doc = Document::new();
        assert!(doc.copy_selection().is_none());
        assert!(doc.cut_selection().is_none());
    }

    #[test]
    fn test_copy_paste_relocates_formulas() {
        let mut doc = Document::new();
        doc.set_cell_value(&addr("B1"), "=SUM(A1:A3)").unwrap();
        doc.set_cell_value(&addr("C1"), "=SUM($A$1:A$3)").unwrap();
        select(&mut doc, "B1", "C1");
        doc.copy_selection();

        assert_eq!(doc.paste_at(&addr("C4"), None), 2);
        assert_eq!(doc.raw_cell(&addr("C4")), "=SUM(B4:B6)");
        assert_eq!(doc.raw_cell(&addr("D4")), "=SUM($A$1:B$3)");
        assert_eq!(doc.raw_cell(&addr("B1")), "=SUM(A1:A3)");
    }

    #[test]
    fn test_copy_paste_out_of_bounds_reference() {
        let mut doc = Document::new();
        doc.set_cell_value(&addr("B2"), "=SUM(A1:A2)").unwrap();
        doc.click_cell(&addr("B2"));
        doc.copy_selection();
        doc.paste_at(&addr("A1"), None);
        assert_eq!(doc.raw_cell(&addr("A1")), "=SUM(#REF!:#REF!)");
        assert_eq!(doc.display_value(&addr("A1")), "#ERROR!");
    }

    #[test]
    fn test_cut_paste_moves_verbatim() {
        let mut doc = Document::new();
        doc.set_cell_value(&addr("B1"), "=SUM(A1:A3)").unwrap();
        doc.click_cell(&addr("B1"));
        assert_eq!(doc.cut_selection().unwrap(), "=SUM(A1:A3)");
        assert_eq!(doc.raw_cell(&addr("B1")), "");

        doc.paste_at(&addr("D5"), None);
        assert_eq!(doc.raw_cell(&addr("D5")), "=SUM(A1:A3)");
    }

    #[test]
    fn test_paste_external_text_clips_and_trims() {
        let mut doc = Document::new();
        let written = doc.paste_at(&addr("Y100"), Some(" 1 \t2\t3\n4\t5\t6"));
        assert_eq!(written, 2);
        assert_eq!(doc.raw_cell(&addr("Y100")), "1");
        assert_eq!(doc.raw_cell(&addr("Z100")), "2");

        doc.paste_at(&addr("A1"), Some("=SUM(A2:A3)"));
        assert_eq!(doc.raw_cell(&addr("A1")), "=SUM(A2:A3)");
    }

    #[test]
    fn test_internal_clipboard_wins_over_external() {
        let mut doc = Document::new();
        doc.set_cell_value(&addr("A1"), "inside").unwrap();
        doc.click_cell(&addr("A1"));
        doc.copy_selection();
        doc.paste_at(&addr("B1"), Some("outside"));
        assert_eq!(doc.raw_cell(&addr("B1")), "inside");
    }

    #[test]
    fn test_parse_tsv() {
        assert_eq!(parse_tsv("x"), vec![vec!["x"]]);
        assert_eq!(parse_tsv("a\tb\nc"), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_fill_down_adjusts_rows() {
        let mut doc = Document::new();
        doc.set_cell_value(&addr("B1"), "=SUM(A1:A1)").unwrap();
        doc.set_cell_value(&addr("C1"), "k").unwrap();
        select(&mut doc, "B1", "C3");
        assert!(doc.fill_down());
        assert_eq!(doc.raw_cell(&addr("B2")), "=SUM(A2:A2)");
        assert_eq!(doc.raw_cell(&addr("B3")), "=SUM(A3:A3)");
        assert_eq!(doc.raw_cell(&addr("C3")), "k");
    }

    #[test]
    fn test_fill_right_adjusts_columns() {
        let mut doc = Document::new();
        doc.set_cell_value(&addr("A2"), "=SUM(A1:A1)").unwrap();
        select(&mut doc, "A2", "C2");
        assert!(doc.fill_right());
        assert_eq!(doc.raw_cell(&addr("B2")), "=SUM(B1:B1)");
        assert_eq!(doc.raw_cell(&addr("C2")), "=SUM(C1:C1)");

        doc.click_cell(&addr("A2"));
        assert!(!doc.fill_right());
    }

    #[test]
    fn test_cut_and_paste_save() {
        let (mut doc, saves) = Document::with_save_counter();
        doc.set_cell_value(&addr("A1"), "x").unwrap();
        assert_eq!(saves.get(), 1);

        doc.click_cell(&addr("A1"));
        doc.copy_selection();
        assert_eq!(saves.get(), 1);
        doc.cut_selection();
        assert_eq!(saves.get(), 2);
        assert_eq!(doc.paste_at(&addr("B2"), None), 1);
        assert_eq!(saves.get(), 3);

        let saved = doc.store().load_sheets().unwrap().unwrap();
        assert_eq!(saved.sheets[0].rows[1][1], CellValue::from("x"));
    }
}

use gridsheet_engine::engine::{CellAddress, CellValue, Row};

use super::Document;
use crate::sheet::Sheet;

/// Row and column edits offered on a cell's context menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuralEdit {
    InsertRowAbove,
    InsertRowBelow,
    DeleteRow,
    DeleteRowAbove,
    DeleteRowBelow,
    InsertColumnLeft,
    InsertColumnRight,
    DeleteColumn,
    DeleteColumnLeft,
    DeleteColumnRight,
}

/// Dimension for row/column operations
#[derive(Copy, Clone)]
enum Dimension {
    Row,
    Column,
}

impl StructuralEdit {
    fn dimension(self) -> Dimension {
        match self {
            StructuralEdit::InsertRowAbove
            | StructuralEdit::InsertRowBelow
            | StructuralEdit::DeleteRow
            | StructuralEdit::DeleteRowAbove
            | StructuralEdit::DeleteRowBelow => Dimension::Row,
            _ => Dimension::Column,
        }
    }
}

impl Document {
    /// Apply a structural edit relative to `anchor`.
    ///
    /// Edits that make no sense at the anchor (deleting above row 1, left of
    /// column A, the only column, ...) are silent no-ops. Formula text is not
    /// rewritten: references keep pointing at positions.
    pub fn apply_structural_edit(&mut self, edit: StructuralEdit, anchor: &CellAddress) -> &Sheet {
        let changed = match edit.dimension() {
            Dimension::Row => self.apply_row_edit(edit, anchor.row),
            Dimension::Column => match self.sheet().column_index(&anchor.col) {
                Some(col) => self.apply_column_edit(edit, col),
                None => {
                    log::warn!("Cannot apply {:?}: column {} not in the sheet", edit, anchor.col);
                    false
                }
            },
        };
        if changed {
            self.sort = None;
            self.persist();
        }
        self.sheet()
    }

    fn apply_row_edit(&mut self, edit: StructuralEdit, row: usize) -> bool {
        let height = self.sheet().height();
        match edit {
            StructuralEdit::InsertRowAbove => self.insert_row(row),
            StructuralEdit::InsertRowBelow => self.insert_row(row + 1),
            StructuralEdit::DeleteRow => self.delete_row(row),
            StructuralEdit::DeleteRowAbove if row > 0 => self.delete_row(row - 1),
            StructuralEdit::DeleteRowBelow if row + 1 < height => self.delete_row(row + 1),
            _ => false,
        }
    }

    fn apply_column_edit(&mut self, edit: StructuralEdit, col: usize) -> bool {
        let width = self.sheet().width();
        match edit {
            StructuralEdit::InsertColumnLeft => self.insert_column(col),
            StructuralEdit::InsertColumnRight => self.insert_column(col + 1),
            StructuralEdit::DeleteColumn => self.delete_column(col),
            StructuralEdit::DeleteColumnLeft if col > 0 => {
                let selected = self
                    .selected_cell
                    .as_ref()
                    .and_then(|a| self.sheet().column_index(&a.col));
                let deleted = self.delete_column(col - 1);
                if deleted
                    && let Some(selected) = selected
                    && selected > col - 1
                    && let Some(cell) = self.selected_cell.as_mut()
                {
                    cell.col = self.sheets[self.active].column_headers[selected - 1].clone();
                }
                self.clear_selection();
                deleted
            }
            StructuralEdit::DeleteColumnRight if col + 1 < width => {
                let deleted = self.delete_column(col + 1);
                self.clear_selection();
                deleted
            }
            _ => false,
        }
    }

    /// Insert a blank row at `at`. The tail row is dropped once the sheet is
    /// past its row cap.
    fn insert_row(&mut self, at: usize) -> bool {
        let cap = self.config.max_rows;
        let sheet = self.sheet_mut();
        if at > sheet.height() {
            return false;
        }
        let cap = cap.max(sheet.height());
        let blank = sheet.blank_row();
        sheet.rows.insert(at, blank);
        sheet.rows.truncate(cap);
        true
    }

    /// Delete row `at` and append a blank row so the row count is unchanged.
    fn delete_row(&mut self, at: usize) -> bool {
        let sheet = self.sheet_mut();
        if at >= sheet.height() {
            return false;
        }
        sheet.rows.remove(at);
        let blank = sheet.blank_row();
        sheet.rows.push(blank);
        true
    }

    fn insert_column(&mut self, at: usize) -> bool {
        let sheet = self.sheet_mut();
        if at > sheet.width() {
            return false;
        }
        sheet.column_headers.insert(at, String::new());
        for row in &mut sheet.rows {
            row.insert(at, CellValue::Empty);
        }
        sheet.regenerate_headers();
        true
    }

    fn delete_column(&mut self, at: usize) -> bool {
        let sheet = self.sheet_mut();
        if at >= sheet.width() || sheet.width() <= 1 {
            return false;
        }
        sheet.column_headers.remove(at);
        for row in &mut sheet.rows {
            row.remove(at);
        }
        sheet.regenerate_headers();
        true
    }

    /// Drag a row from one position to another.
    pub fn move_row(&mut self, from: usize, to: usize) -> bool {
        let sheet = self.sheet_mut();
        if from == to || from >= sheet.height() || to >= sheet.height() {
            return false;
        }
        let row = sheet.rows.remove(from);
        sheet.rows.insert(to, row);
        self.sort = None;
        self.persist();
        true
    }

    /// Drag a column onto another column's position. Headers are relabeled
    /// afterwards, so the moved data takes the target's label.
    pub fn move_column(&mut self, from: &str, to: &str) -> bool {
        let sheet = self.sheet_mut();
        let (Some(from), Some(to)) = (sheet.column_index(from), sheet.column_index(to)) else {
            log::warn!("Cannot move column {} to {}: not in the sheet", from, to);
            return false;
        };
        if from == to {
            return false;
        }
        for row in &mut sheet.rows {
            let value = row.remove(from);
            row.insert(to, value);
        }
        sheet.regenerate_headers();
        self.sort = None;
        self.persist();
        true
    }

    /// Move the selected block by dragging it from `from` to `to`.
    ///
    /// `from` must be inside the selection. The source block is blanked and
    /// written at the offset; cells that land outside the sheet are dropped.
    pub fn move_block(&mut self, from: &CellAddress, to: &CellAddress) -> bool {
        let Some(range) = self.selection.clone() else {
            return false;
        };
        if !range.contains(self.sheet(), from) {
            return false;
        }
        let (Some(bounds), Some((from_row, from_col)), Some((to_row, to_col))) = (
            range.bounds(self.sheet()),
            self.sheet().position(from),
            self.sheet().position(to),
        ) else {
            return false;
        };
        let row_offset = to_row as isize - from_row as isize;
        let col_offset = to_col as isize - from_col as isize;

        let sheet = self.sheet_mut();
        let block: Vec<Row> = bounds
            .rows()
            .map(|r| sheet.rows[r][bounds.cols()].to_vec())
            .collect();
        for r in bounds.rows() {
            for c in bounds.cols() {
                sheet.rows[r][c] = CellValue::Empty;
            }
        }
        let (height, width) = (sheet.height(), sheet.width());
        for (i, row) in block.into_iter().enumerate() {
            for (j, value) in row.into_iter().enumerate() {
                let r = (bounds.top + i).checked_add_signed(row_offset);
                let c = (bounds.left + j).checked_add_signed(col_offset);
                if let (Some(r), Some(c)) = (r, c)
                    && r < height
                    && c < width
                {
                    sheet.rows[r][c] = value;
                }
            }
        }
        self.persist();
        true
    }
}

//! Selection, keyboard navigation and the formula bar.

use gridsheet_engine::engine::CellAddress;
use std::fmt;
use std::ops::RangeInclusive;

use super::Document;
use crate::sheet::Sheet;

/// A rectangular selection, normalized so start <= end in header order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: String,
    pub end_col: String,
}

impl SelectionRange {
    pub fn is_single(&self) -> bool {
        self.start_row == self.end_row && self.start_col == self.end_col
    }

    pub fn top_left(&self) -> CellAddress {
        CellAddress::new(self.start_row, self.start_col.clone())
    }

    /// Whether `addr` lies inside the range on `sheet`.
    pub fn contains(&self, sheet: &Sheet, addr: &CellAddress) -> bool {
        match (self.bounds(sheet), sheet.position(addr)) {
            (Some(b), Some((row, col))) => b.rows().contains(&row) && b.cols().contains(&col),
            _ => false,
        }
    }

    pub(crate) fn bounds(&self, sheet: &Sheet) -> Option<Bounds> {
        Some(Bounds {
            top: self.start_row,
            bottom: self.end_row,
            left: sheet.column_index(&self.start_col)?,
            right: sheet.column_index(&self.end_col)?,
        })
    }
}

impl fmt::Display for SelectionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            self.start_col,
            self.start_row + 1,
            self.end_col,
            self.end_row + 1
        )
    }
}

/// Resolved, inclusive index bounds of a selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Bounds {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Bounds {
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.top..=self.bottom
    }

    pub fn cols(&self) -> RangeInclusive<usize> {
        self.left..=self.right
    }
}

/// Build a normalized range from two corners.
///
/// Returns `None` if either column label is not in the sheet or a row is past
/// the end.
pub fn resolve_selection_range(
    sheet: &Sheet,
    start: &CellAddress,
    end: &CellAddress,
) -> Option<SelectionRange> {
    let (start_row, start_col) = sheet.position(start)?;
    let (end_row, end_col) = sheet.position(end)?;
    Some(SelectionRange {
        start_row: start_row.min(end_row),
        end_row: start_row.max(end_row),
        start_col: sheet.column_headers[start_col.min(end_col)].clone(),
        end_col: sheet.column_headers[start_col.max(end_col)].clone(),
    })
}

/// Formula bar text with a caret, counted in characters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormulaBar {
    pub text: String,
    pub focused: bool,
    caret: usize,
    /// Range text inserted by the current drag: (start, length).
    inserted: Option<(usize, usize)>,
}

impl FormulaBar {
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Replace the text and put the caret at the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.caret = self.text.chars().count();
        self.inserted = None;
    }

    pub fn set_caret(&mut self, caret: usize) {
        self.caret = caret.min(self.text.chars().count());
        self.inserted = None;
    }

    fn insert_range(&mut self, range: &str) {
        if let Some((start, len)) = self.inserted.take() {
            let from = byte_offset(&self.text, start);
            let to = byte_offset(&self.text, start + len);
            self.text.replace_range(from..to, "");
            self.caret = start;
        }
        let at = byte_offset(&self.text, self.caret);
        self.text.insert_str(at, range);
        let len = range.chars().count();
        self.inserted = Some((self.caret, len));
        self.caret += len;
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Document {
    pub fn selection(&self) -> Option<&SelectionRange> {
        self.selection.as_ref()
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selection = None;
        self.selection_start = None;
        self.selection_end = None;
        self.selecting = false;
    }

    /// Resolved bounds of the selection, or of the selected cell if there is
    /// no range.
    pub(crate) fn selection_bounds(&self) -> Option<Bounds> {
        if let Some(range) = &self.selection {
            return range.bounds(self.sheet());
        }
        let (row, col) = self.sheet().position(self.selected_cell.as_ref()?)?;
        Some(Bounds {
            top: row,
            bottom: row,
            left: col,
            right: col,
        })
    }

    /// Start a drag selection at `addr`.
    pub fn mouse_down(&mut self, addr: &CellAddress) {
        self.selecting = true;
        self.selected_cell = Some(addr.clone());
        self.selection_start = Some(addr.clone());
        self.selection_end = Some(addr.clone());
        self.formula_bar.inserted = None;
        self.update_selected_range();
    }

    /// Extend the drag selection while the button is held.
    pub fn mouse_over(&mut self, addr: &CellAddress) {
        if !self.selecting || self.selection_start.is_none() {
            return;
        }
        self.selection_end = Some(addr.clone());
        self.update_selected_range();
    }

    pub fn mouse_up(&mut self) {
        self.selecting = false;
        self.formula_bar.inserted = None;
    }

    /// Select a single cell and show its raw content in the formula bar.
    pub fn click_cell(&mut self, addr: &CellAddress) {
        self.formula_bar.focused = false;
        self.selected_cell = Some(addr.clone());
        self.selection_start = Some(addr.clone());
        self.selection_end = Some(addr.clone());
        self.update_selected_range();
    }

    pub fn focus_formula_bar(&mut self) {
        self.formula_bar.focused = true;
    }

    pub fn blur_formula_bar(&mut self) {
        self.formula_bar.focused = false;
        self.formula_bar.inserted = None;
    }

    /// Mark a direct (in-cell) edit as in progress.
    pub fn begin_cell_edit(&mut self, addr: &CellAddress) {
        self.editing = Some(addr.clone());
    }

    pub fn cancel_cell_edit(&mut self) {
        self.editing = None;
    }

    fn update_selected_range(&mut self) {
        let (Some(start), Some(end)) = (&self.selection_start, &self.selection_end) else {
            return;
        };
        let Some(range) = resolve_selection_range(self.sheet(), start, end) else {
            log::warn!("Cannot select {}:{}: not in the sheet", start, end);
            return;
        };

        if self.editing.is_none() {
            if range.is_single() {
                let raw = self.raw_cell(&range.top_left());
                self.formula_bar.set_text(raw);
            } else if self.formula_bar.focused {
                self.formula_bar.insert_range(&range.to_string());
            }
        }
        self.selection = Some(range);
    }

    /// Move the selected cell one step, clamped to the grid.
    pub fn navigate(&mut self, direction: Direction) -> Option<CellAddress> {
        let (row, col) = self.sheet().position(self.selected_cell.as_ref()?)?;
        let (next_row, next_col) = match direction {
            Direction::Up => (row.saturating_sub(1), col),
            Direction::Down => ((row + 1).min(self.sheet().height() - 1), col),
            Direction::Left => (row, col.saturating_sub(1)),
            Direction::Right => (row, (col + 1).min(self.sheet().width() - 1)),
        };
        if (next_row, next_col) == (row, col) {
            return None;
        }
        self.move_to(next_row, next_col)
    }

    /// Tab (or Shift-Tab) to the next cell, wrapping across rows.
    pub fn tab(&mut self, backwards: bool) -> Option<CellAddress> {
        let (row, col) = self.sheet().position(self.selected_cell.as_ref()?)?;
        let width = self.sheet().width();
        let (next_row, next_col) = if backwards {
            if col == 0 {
                (row.checked_sub(1)?, width - 1)
            } else {
                (row, col - 1)
            }
        } else if col + 1 >= width {
            (row + 1, 0)
        } else {
            (row, col + 1)
        };
        if next_row >= self.sheet().height() {
            return None;
        }
        self.move_to(next_row, next_col)
    }

    fn move_to(&mut self, row: usize, col: usize) -> Option<CellAddress> {
        let addr = self.sheet().address(row, col)?;
        self.click_cell(&addr);
        Some(addr)
    }
}

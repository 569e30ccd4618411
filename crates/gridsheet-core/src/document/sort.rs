//! Column sorting from header clicks.
//!
//! A click sorts ascending; a repeat click on the same header inside the
//! double-click window flips to descending, and a third restores the order the
//! rows had before any sort.

use gridsheet_engine::engine::{CellValue, FormulaValue, Row, evaluate, format_number};
use std::cmp::Ordering;
use std::time::{Duration, Instant};

use super::Document;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Debug)]
pub(crate) struct SortState {
    column: String,
    direction: SortDirection,
    last_click: Instant,
    /// `order[i]` is the pre-sort position of the row now at `i`.
    order: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq)]
enum SortKey {
    Empty,
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(value: &CellValue, rows: &[Row], headers: &[String]) -> SortKey {
        match value {
            CellValue::Empty => SortKey::Empty,
            CellValue::Number(n) => SortKey::Number(*n),
            CellValue::Text(text) if text.starts_with('=') => {
                match evaluate(text, rows, headers) {
                    FormulaValue::Number(n) => SortKey::Number(n),
                    other => SortKey::Text(other.to_string()),
                }
            }
            CellValue::Text(text) => match text.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => SortKey::Number(n),
                _ => SortKey::Text(text.clone()),
            },
        }
    }

    fn as_text(&self) -> String {
        match self {
            SortKey::Empty => String::new(),
            SortKey::Number(n) => format_number(*n),
            SortKey::Text(s) => s.clone(),
        }
    }

    /// Order of two non-empty keys: numbers numerically, text without case,
    /// mixed kinds by their text.
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Text(a), SortKey::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            _ => self.as_text().cmp(&other.as_text()),
        }
    }
}

/// Stable sort of row indices by key. Empty keys go last in both directions.
fn sorted_order(keys: &[SortKey], direction: SortDirection) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| match (&keys[a], &keys[b]) {
        (SortKey::Empty, SortKey::Empty) => Ordering::Equal,
        (SortKey::Empty, _) => Ordering::Greater,
        (_, SortKey::Empty) => Ordering::Less,
        (ka, kb) => match direction {
            SortDirection::Ascending => ka.compare(kb),
            SortDirection::Descending => kb.compare(ka),
        },
    });
    order
}

impl Document {
    /// The column and direction the active sheet is sorted by, if any.
    pub fn sort_state(&self) -> Option<(&str, SortDirection)> {
        self.sort.as_ref().map(|s| (s.column.as_str(), s.direction))
    }

    /// Handle a click on a column header at time `at`.
    pub fn click_column_header(&mut self, column: &str, at: Instant) {
        let Some(col) = self.sheet().column_index(column) else {
            log::warn!("Cannot sort by {}: column not in the sheet", column);
            return;
        };
        let window = Duration::from_millis(self.config.sort_double_click_ms);

        let repeat = self.sort.as_ref().and_then(|s| {
            let quick = s.column == column && at.saturating_duration_since(s.last_click) < window;
            quick.then_some(s.direction)
        });

        match repeat {
            Some(SortDirection::Ascending) => self.sort_by(col, SortDirection::Descending, at),
            Some(SortDirection::Descending) => self.restore_order(),
            None => self.sort_by(col, SortDirection::Ascending, at),
        }
    }

    /// Sort the active sheet's rows by a column.
    pub fn sort(&mut self, column: &str, direction: SortDirection) {
        match self.sheet().column_index(column) {
            Some(col) => self.sort_by(col, direction, Instant::now()),
            None => log::warn!("Cannot sort by {}: column not in the sheet", column),
        }
    }

    fn sort_by(&mut self, col: usize, direction: SortDirection, at: Instant) {
        let sheet = self.sheet();
        let keys: Vec<SortKey> = sheet
            .rows
            .iter()
            .map(|row| SortKey::of(&row[col], &sheet.rows, &sheet.column_headers))
            .collect();
        let order = sorted_order(&keys, direction);
        let column = sheet.column_headers[col].clone();

        let previous = self
            .sort
            .take()
            .map(|s| s.order)
            .filter(|o| o.len() == order.len())
            .unwrap_or_else(|| (0..order.len()).collect());
        let composed = order.iter().map(|&i| previous[i]).collect();

        let sheet = self.sheet_mut();
        let mut old: Vec<Option<Row>> = std::mem::take(&mut sheet.rows)
            .into_iter()
            .map(Some)
            .collect();
        sheet.rows = order.iter().filter_map(|&i| old[i].take()).collect();

        self.sort = Some(SortState {
            column,
            direction,
            last_click: at,
            order: composed,
        });
        self.persist();
    }

    /// Put rows back in their pre-sort order and clear the sort.
    pub fn restore_order(&mut self) {
        let Some(state) = self.sort.take() else {
            return;
        };
        let sheet = self.sheet_mut();
        if state.order.len() != sheet.rows.len() {
            return;
        }
        let mut restored: Vec<Option<Row>> = vec![None; sheet.rows.len()];
        for (row, &original) in std::mem::take(&mut sheet.rows).into_iter().zip(&state.order) {
            restored[original] = Some(row);
        }
        sheet.rows = restored.into_iter().flatten().collect();
        self.persist();
    }
}

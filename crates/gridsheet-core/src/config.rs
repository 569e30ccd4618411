//! Grid sizing and interaction settings.

use serde::{Deserialize, Serialize};

/// Settings a [`crate::Document`] is created with.
///
/// Missing keys fall back to the defaults, so a partial `[sheet]` table in a
/// config file is fine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Row count of a fresh sheet, and the cap row inserts truncate to.
    pub max_rows: usize,
    /// Column count of a fresh sheet.
    pub columns: usize,
    /// Sheets created on first start.
    pub initial_sheets: usize,
    /// Window in which a second header click counts as a repeat.
    pub sort_double_click_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_rows: 100,
            columns: 26,
            initial_sheets: 2,
            sort_double_click_ms: 300,
        }
    }
}

impl Config {
    /// Clamp sizes so a grid always has at least one row, column and sheet.
    pub fn normalized(mut self) -> Self {
        self.max_rows = self.max_rows.max(1);
        self.columns = self.columns.max(1);
        self.initial_sheets = self.initial_sheets.max(1);
        self
    }
}

//! Raw cell contents.
//!
//! A grid stores what the user typed, not what it evaluates to:
//! - [`CellValue::Empty`] - a blank cell
//! - [`CellValue::Number`] - a number (usually from an importer)
//! - [`CellValue::Text`] - any text; text starting with `=` is a formula
//!
//! Blank cells serialize as `""` so persisted sheets look like the rows a user sees.

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

use super::format::format_number;

/// Raw content of a single cell.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "RawCell")]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

/// One row of a grid, aligned 1:1 with the column headers.
pub type Row = Vec<CellValue>;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Number(f64),
    Text(String),
    Null(()),
}

impl From<RawCell> for CellValue {
    fn from(raw: RawCell) -> Self {
        match raw {
            RawCell::Number(n) => CellValue::Number(n),
            RawCell::Text(s) => CellValue::from(s),
            RawCell::Null(()) => CellValue::Empty,
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_str(""),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// The formula text (including the leading `=`) if this cell holds one.
    pub fn as_formula(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) if s.starts_with('=') => Some(s),
            _ => None,
        }
    }

    pub fn is_formula(&self) -> bool {
        self.as_formula().is_some()
    }

    /// Numeric value used by the aggregate functions.
    ///
    /// Text counts when it starts with a number (`5 kg` is 5); trailing text
    /// is ignored. Formula cells never count: evaluation is not transitive, so
    /// a formula is seen as its raw text.
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) if !s.starts_with('=') => leading_number(s),
            _ => None,
        }
    }

    /// Text as typed by the user (what an edit box or the formula bar shows).
    pub fn to_input_string(&self) -> String {
        self.to_string()
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::from(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

fn leading_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
            .expect("number prefix regex must compile")
    })
}

/// The longest finite number at the start of `text`, after leading whitespace.
fn leading_number(text: &str) -> Option<f64> {
    let found = leading_number_re().find(text.trim_start())?;
    found.as_str().parse::<f64>().ok().filter(|n| n.is_finite())
}

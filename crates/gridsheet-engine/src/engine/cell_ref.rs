//! Cell reference parsing, formatting and relocation.
//!
//! References use A1 notation with optional `$` markers (`B3`, `$B$3`, `B$3`).
//! Rows are 1-based in text and 0-based once parsed. Columns stay as labels:
//! a label only becomes an index when it is looked up in a sheet's headers.
//!
//! # Examples
//!
//! ```ignore
//! let r = parse_reference("$B3").unwrap();
//! assert_eq!(r.col, "B");
//! assert_eq!(r.row, 2);
//! assert!(r.absolute.col && !r.absolute.row);
//! assert_eq!(r.to_string(), "$B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::error::FormulaError;

/// Which axes of a reference carry a `$` marker.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub struct Absolute {
    pub col: bool,
    pub row: bool,
}

/// A parsed single-cell reference.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct CellReference {
    pub col: String,
    pub row: usize,
    pub absolute: Absolute,
}

/// A parsed `start:end` range. Start and end are kept in the order written.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RangeReference {
    pub start: CellReference,
    pub end: CellReference,
}

/// A cell position: 0-based row plus column label.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: usize,
    pub col: String,
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\$?)([A-Z]+)(\$?)([0-9]+)").expect("reference regex must compile")
    })
}

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z]+)([0-9]+)$").expect("address regex must compile"))
}

/// Parse a reference like `A1`, `$B$3` or `C$7`.
pub fn parse_reference(text: &str) -> Result<CellReference, FormulaError> {
    let invalid = || FormulaError::InvalidReference(text.to_string());
    let caps = reference_re().captures(text).ok_or_else(invalid)?;
    let row = caps[4]
        .parse::<usize>()
        .ok()
        .and_then(|r| r.checked_sub(1))
        .ok_or_else(invalid)?;

    Ok(CellReference {
        col: caps[2].to_string(),
        row,
        absolute: Absolute {
            col: &caps[1] == "$",
            row: &caps[3] == "$",
        },
    })
}

/// Parse a `start:end` range. Exactly one `:` is accepted.
pub fn parse_range(text: &str) -> Result<RangeReference, FormulaError> {
    let mut parts = text.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(start), Some(end), None) => Ok(RangeReference {
            start: parse_reference(start)?,
            end: parse_reference(end)?,
        }),
        _ => Err(FormulaError::MalformedRange(text.to_string())),
    }
}

/// Format a reference back to text, re-inserting `$` markers.
pub fn format_reference(reference: &CellReference) -> String {
    reference.to_string()
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.absolute.col { "$" } else { "" },
            self.col,
            if self.absolute.row { "$" } else { "" },
            self.row + 1
        )
    }
}

impl fmt::Display for RangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl CellReference {
    /// The position this reference points at, ignoring `$` markers.
    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col.clone())
    }
}

impl CellAddress {
    pub fn new(row: usize, col: impl Into<String>) -> CellAddress {
        CellAddress {
            row,
            col: col.into(),
        }
    }

    /// Parse a plain address like `B3` (no `$` markers, nothing around it).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Option<CellAddress> {
        let caps = address_re().captures(text)?;
        let row = caps[2].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellAddress::new(row, &caps[1]))
    }
}

impl std::str::FromStr for CellAddress {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellAddress::from_str(s).ok_or_else(|| FormulaError::InvalidReference(s.to_string()))
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.col, self.row + 1)
    }
}

/// Convert a column label to its 0-based ordinal (A -> 0, Z -> 25, AA -> 26).
pub fn column_ordinal(label: &str) -> Option<usize> {
    if label.is_empty() || !label.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let mut acc = 0usize;
    for b in label.bytes() {
        let digit = (b - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    acc.checked_sub(1)
}

/// Convert a 0-based ordinal to a column label (0 -> A, 25 -> Z, 26 -> AA).
pub fn column_label(ordinal: usize) -> String {
    let mut result = String::new();
    let mut n = ordinal as u128 + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// Shift a column label by `delta` columns.
///
/// Returns `None` if the label is not a column label or the result would fall
/// before column `A`.
pub fn offset_column(label: &str, delta: isize) -> Option<String> {
    let ordinal = column_ordinal(label)?;
    let shifted = ordinal.checked_add_signed(delta)?;
    Some(column_label(shifted))
}

/// Relocate the references in a formula by a row/column offset.
///
/// Rules:
/// - `A1` offset by (+2 rows, +1 col) becomes `B3`
/// - `$A$1` never changes
/// - `$A1` only moves its row, `A$1` only moves its column
/// - text inside double quotes is left alone
/// - a reference pushed before row 1 or column `A` becomes `#REF!`
pub fn adjust_references(formula: &str, row_offset: isize, col_offset: isize) -> String {
    if row_offset == 0 && col_offset == 0 {
        return formula.to_string();
    }

    map_outside_strings(formula, |seg| {
        reference_re()
            .replace_all(seg, |caps: &regex::Captures| {
                adjust_single(caps, row_offset, col_offset)
            })
            .into_owned()
    })
}

fn adjust_single(caps: &regex::Captures, row_offset: isize, col_offset: isize) -> String {
    let (col_abs, col, row_abs, row) = (&caps[1], &caps[2], &caps[3], &caps[4]);
    if !col_abs.is_empty() && !row_abs.is_empty() {
        return caps[0].to_string();
    }

    let new_col = if col_abs.is_empty() {
        match offset_column(col, col_offset) {
            Some(c) => c,
            None => return "#REF!".to_string(),
        }
    } else {
        col.to_string()
    };

    let new_row = if row_abs.is_empty() {
        match row
            .parse::<usize>()
            .ok()
            .and_then(|r| r.checked_add_signed(row_offset))
        {
            Some(r) if r >= 1 => r.to_string(),
            Some(_) => return "#REF!".to_string(),
            None => return caps[0].to_string(),
        }
    } else {
        row.to_string()
    };

    format!("{}{}{}{}", col_abs, new_col, row_abs, new_row)
}

/// Apply `f` to every stretch of `text` that is outside a double-quoted literal.
fn map_outside_strings(text: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut seg_start = 0;
    let mut in_string = false;

    for (i, ch) in text.char_indices() {
        if ch != '"' {
            continue;
        }
        if in_string {
            out.push_str(&text[seg_start..=i]);
            seg_start = i + 1;
        } else {
            out.push_str(&f(&text[seg_start..i]));
            seg_start = i;
        }
        in_string = !in_string;
    }

    if seg_start < text.len() {
        if in_string {
            out.push_str(&text[seg_start..]);
        } else {
            out.push_str(&f(&text[seg_start..]));
        }
    }
    out
}

//! The fixed formula function set.
//!
//! Conventions:
//! - Function names are ALL CAPS with underscores (e.g. `SUM`, `FIND_AND_REPLACE`).
//! - Range functions take one `A1:B5` argument and read the grid; the text
//!   functions (`TRIM`, `UPPER`, `LOWER`) work on their literal argument.
//! - Adding a function means adding a [`Function`] variant, a [`FUNCTIONS`] entry
//!   and a match arm in [`Function::call`].

use regex::{Captures, Regex};
use std::collections::HashSet;
use std::ops::RangeInclusive;

use super::cell::{CellValue, Row};
use super::cell_ref::parse_range;
use super::error::FormulaError;

/// A built-in function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    Sum,
    Avg,
    Max,
    Min,
    Count,
    Trim,
    Upper,
    Lower,
    RemoveDuplicates,
    FindAndReplace,
}

pub struct FunctionInfo {
    pub function: Function,
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

pub const FUNCTIONS: &[FunctionInfo] = &[
    FunctionInfo {
        function: Function::Sum,
        name: "SUM",
        usage: "SUM(A1:B5)",
        description: "Sum of numeric values in a cell range",
    },
    FunctionInfo {
        function: Function::Avg,
        name: "AVG",
        usage: "AVG(A1:B5)",
        description: "Average of numeric values in a cell range (0 when none)",
    },
    FunctionInfo {
        function: Function::Max,
        name: "MAX",
        usage: "MAX(A1:B5)",
        description: "Maximum numeric value in a cell range (0 when none)",
    },
    FunctionInfo {
        function: Function::Min,
        name: "MIN",
        usage: "MIN(A1:B5)",
        description: "Minimum numeric value in a cell range (0 when none)",
    },
    FunctionInfo {
        function: Function::Count,
        name: "COUNT",
        usage: "COUNT(A1:B5)",
        description: "Count of numeric cells in a cell range",
    },
    FunctionInfo {
        function: Function::Trim,
        name: "TRIM",
        usage: "TRIM(text)",
        description: "Argument text without surrounding whitespace",
    },
    FunctionInfo {
        function: Function::Upper,
        name: "UPPER",
        usage: "UPPER(text)",
        description: "Argument text in upper case",
    },
    FunctionInfo {
        function: Function::Lower,
        name: "LOWER",
        usage: "LOWER(text)",
        description: "Argument text in lower case",
    },
    FunctionInfo {
        function: Function::RemoveDuplicates,
        name: "REMOVE_DUPLICATES",
        usage: "REMOVE_DUPLICATES(A1:C10)",
        description: "Rows of the range, keeping the first of each duplicate slice",
    },
    FunctionInfo {
        function: Function::FindAndReplace,
        name: "FIND_AND_REPLACE",
        usage: "FIND_AND_REPLACE(A1:C10, \"find\", \"replace\")",
        description: "Sheet rows with a regex find/replace applied to text cells in the range",
    },
];

/// What a function call produces.
#[derive(Clone, Debug, PartialEq)]
pub enum FunctionOutput {
    Number(f64),
    Text(String),
    Rows(Vec<Row>),
}

impl Function {
    pub fn from_name(name: &str) -> Option<Function> {
        FUNCTIONS.iter().find(|f| f.name == name).map(|f| f.function)
    }

    pub fn info(self) -> &'static FunctionInfo {
        FUNCTIONS
            .iter()
            .find(|f| f.function == self)
            .expect("every function has a FUNCTIONS entry")
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Run the function against a grid snapshot.
    pub fn call(
        self,
        rows: &[Row],
        headers: &[String],
        args: &[String],
    ) -> Result<FunctionOutput, FormulaError> {
        let first = || {
            args.first().map(String::as_str).ok_or(FormulaError::ArgumentCount {
                function: self.name(),
                expected: 1,
                found: 0,
            })
        };

        let out = match self {
            Function::Sum => FunctionOutput::Number(sum(rows, headers, first()?)?),
            Function::Avg => FunctionOutput::Number(avg(rows, headers, first()?)?),
            Function::Max => FunctionOutput::Number(max(rows, headers, first()?)?),
            Function::Min => FunctionOutput::Number(min(rows, headers, first()?)?),
            Function::Count => FunctionOutput::Number(count(rows, headers, first()?)? as f64),
            Function::Trim => FunctionOutput::Text(first()?.trim().to_string()),
            Function::Upper => FunctionOutput::Text(first()?.to_uppercase()),
            Function::Lower => FunctionOutput::Text(first()?.to_lowercase()),
            Function::RemoveDuplicates => {
                FunctionOutput::Rows(remove_duplicates(rows, headers, first()?)?)
            }
            Function::FindAndReplace => {
                let [range, find, replace] = args else {
                    return Err(FormulaError::ArgumentCount {
                        function: self.name(),
                        expected: 3,
                        found: args.len(),
                    });
                };
                FunctionOutput::Rows(find_and_replace(rows, headers, range, find, replace)?)
            }
        };
        Ok(out)
    }
}

/// The rectangle a range argument addresses.
///
/// Rows are taken literally from the range; columns are header positions in
/// header order, so a reversed column range is empty.
struct Block {
    rows: RangeInclusive<usize>,
    cols: RangeInclusive<usize>,
}

fn resolve_block(rows: &[Row], headers: &[String], range: &str) -> Result<Block, FormulaError> {
    let range = parse_range(range)?;
    let col_index = |label: &str| {
        headers
            .iter()
            .position(|h| h == label)
            .ok_or_else(|| FormulaError::UnknownColumn(label.to_string()))
    };
    let start_col = col_index(&range.start.col)?;
    let end_col = col_index(&range.end.col)?;

    let row_span = range.start.row..=range.end.row;
    if !row_span.is_empty() && range.end.row >= rows.len() {
        return Err(FormulaError::RowOutOfBounds {
            row: range.end.row,
            rows: rows.len(),
        });
    }

    Ok(Block {
        rows: row_span,
        cols: start_col..=end_col,
    })
}

/// Numeric values in a range, row-major.
fn range_values(rows: &[Row], headers: &[String], range: &str) -> Result<Vec<f64>, FormulaError> {
    let block = resolve_block(rows, headers, range)?;
    let mut values = Vec::new();
    for row in rows.get(block.rows).unwrap_or(&[]) {
        for col in block.cols.clone() {
            if let Some(n) = row.get(col).and_then(CellValue::numeric_value) {
                values.push(n);
            }
        }
    }
    Ok(values)
}

pub fn sum(rows: &[Row], headers: &[String], range: &str) -> Result<f64, FormulaError> {
    Ok(range_values(rows, headers, range)?.iter().sum())
}

pub fn avg(rows: &[Row], headers: &[String], range: &str) -> Result<f64, FormulaError> {
    let values = range_values(rows, headers, range)?;
    if values.is_empty() {
        return Ok(0.0);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn max(rows: &[Row], headers: &[String], range: &str) -> Result<f64, FormulaError> {
    let values = range_values(rows, headers, range)?;
    Ok(values.into_iter().reduce(f64::max).unwrap_or(0.0))
}

pub fn min(rows: &[Row], headers: &[String], range: &str) -> Result<f64, FormulaError> {
    let values = range_values(rows, headers, range)?;
    Ok(values.into_iter().reduce(f64::min).unwrap_or(0.0))
}

pub fn count(rows: &[Row], headers: &[String], range: &str) -> Result<usize, FormulaError> {
    Ok(range_values(rows, headers, range)?.len())
}

/// Keep the first row for each distinct slice of the range's columns.
///
/// Slices are compared by their JSON form, so `"1"` and `1` differ.
/// Whole rows are returned in their original order.
pub fn remove_duplicates(
    rows: &[Row],
    headers: &[String],
    range: &str,
) -> Result<Vec<Row>, FormulaError> {
    let block = resolve_block(rows, headers, range)?;
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for row in rows.get(block.rows).unwrap_or(&[]) {
        let slice = row.get(block.cols.clone()).unwrap_or(&[]);
        let key = serde_json::to_string(slice).unwrap_or_default();
        if seen.insert(key) {
            unique.push(row.clone());
        }
    }
    Ok(unique)
}

/// Regex replace over the text cells of a range.
///
/// `find` is used as a pattern, not escaped. The whole sheet is returned with
/// only the range's text cells changed.
pub fn find_and_replace(
    rows: &[Row],
    headers: &[String],
    range: &str,
    find: &str,
    replace: &str,
) -> Result<Vec<Row>, FormulaError> {
    let block = resolve_block(rows, headers, range)?;
    let pattern = Regex::new(strip_quotes(find))?;
    let replacement = strip_quotes(replace);

    let mut out = rows.to_vec();
    for row in out.get_mut(block.rows).unwrap_or(&mut []) {
        for col in block.cols.clone() {
            if let Some(CellValue::Text(text)) = row.get_mut(col) {
                let haystack = text.as_str();
                let replaced = pattern
                    .replace_all(haystack, |caps: &Captures| {
                        expand_replacement(replacement, caps, haystack)
                    })
                    .into_owned();
                *text = replaced;
            }
        }
    }
    Ok(out)
}

/// Expand `$` tokens in a replacement the way JavaScript's `String.replace`
/// does: `$$`, `$&`, `` $` ``, `$'`, and `$n`/`$nn` for groups the pattern
/// has. Anything else stays literal.
fn expand_replacement(template: &str, caps: &Captures, haystack: &str) -> String {
    let whole = caps.get(0).map_or(0..0, |m| m.range());
    let groups = caps.len() - 1;
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (expansion, used) = match after.as_bytes().first() {
            Some(b'$') => (Some("$"), 1),
            Some(b'&') => (Some(&haystack[whole.clone()]), 1),
            Some(b'`') => (Some(&haystack[..whole.start]), 1),
            Some(b'\'') => (Some(&haystack[whole.end..]), 1),
            Some(b) if b.is_ascii_digit() => {
                let digits = after.bytes().take(2).take_while(u8::is_ascii_digit).count();
                let group = (1..=digits)
                    .rev()
                    .map(|len| (after[..len].parse::<usize>().unwrap_or(0), len))
                    .find(|&(n, _)| n >= 1 && n <= groups);
                match group {
                    Some((n, len)) => (Some(caps.get(n).map_or("", |m| m.as_str())), len),
                    None => (None, 0),
                }
            }
            _ => (None, 0),
        };
        match expansion {
            Some(text) => {
                out.push_str(text);
                rest = &after[used..];
            }
            None => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Strip one pair of surrounding double quotes.
fn strip_quotes(arg: &str) -> &str {
    arg.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .filter(|s| !s.contains('\n'))
        .unwrap_or(arg)
}

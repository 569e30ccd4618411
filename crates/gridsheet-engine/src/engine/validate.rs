//! Type checks for raw cell edits.
//!
//! A cell's declared [`CellKind`] only gates what may be committed; storage
//! is always the raw text.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Declared semantic type of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    #[default]
    Text,
    Number,
    Date,
}

impl std::str::FromStr for CellKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(CellKind::Text),
            "number" => Ok(CellKind::Number),
            "date" => Ok(CellKind::Date),
            other => Err(format!("Unknown cell type: {}", other)),
        }
    }
}

/// Outcome of [`validate_cell`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub message: Option<String>,
}

impl Validation {
    fn ok() -> Validation {
        Validation {
            valid: true,
            message: None,
        }
    }

    fn rejected(message: &str) -> Validation {
        Validation {
            valid: false,
            message: Some(message.to_string()),
        }
    }
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Deliberately lenient: "-", "." and "-." all pass.
    RE.get_or_init(|| Regex::new(r"^-?[0-9]*\.?[0-9]*$").expect("number regex must compile"))
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date regex must compile"))
}

/// Check raw edit text against a declared type. Empty text always passes.
pub fn validate_cell(text: &str, kind: CellKind) -> Validation {
    if text.is_empty() {
        return Validation::ok();
    }

    match kind {
        CellKind::Text => Validation::ok(),
        CellKind::Number => {
            if number_re().is_match(text) {
                Validation::ok()
            } else {
                Validation::rejected("Please enter a valid number")
            }
        }
        CellKind::Date => {
            if !date_re().is_match(text) {
                Validation::rejected("Please enter a date in YYYY-MM-DD format")
            } else if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_err() {
                Validation::rejected("Please enter a valid date")
            } else {
                Validation::ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_always_valid() {
        for kind in [CellKind::Text, CellKind::Number, CellKind::Date] {
            assert!(validate_cell("", kind).valid);
        }
    }

    #[test]
    fn test_number_is_lenient() {
        for ok in ["12", "-3.5", ".5", "7.", "-", ".", "-."] {
            assert!(validate_cell(ok, CellKind::Number).valid, "{ok}");
        }
        for bad in ["1e5", "abc", "1.2.3", "+4", " 1"] {
            let v = validate_cell(bad, CellKind::Number);
            assert!(!v.valid, "{bad}");
            assert_eq!(v.message.as_deref(), Some("Please enter a valid number"));
        }
    }

    #[test]
    fn test_date_shape_and_calendar() {
        assert!(validate_cell("2024-02-29", CellKind::Date).valid);

        let shape = validate_cell("2024/02/01", CellKind::Date);
        assert_eq!(
            shape.message.as_deref(),
            Some("Please enter a date in YYYY-MM-DD format")
        );

        for bad in ["2024-02-30", "2023-02-29", "2024-13-01", "2024-00-10"] {
            let v = validate_cell(bad, CellKind::Date);
            assert!(!v.valid, "{bad}");
            assert_eq!(v.message.as_deref(), Some("Please enter a valid date"));
        }
    }

    #[test]
    fn test_only_ascii_digits() {
        assert!(!validate_cell("١٢", CellKind::Number).valid);
        assert!(!validate_cell("٢٠٢٤-٠١-٠١", CellKind::Date).valid);
    }

    #[test]
    fn test_text_accepts_anything() {
        assert!(validate_cell("=SUM(A1:A2)", CellKind::Text).valid);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Number".parse::<CellKind>(), Ok(CellKind::Number));
        assert!("money".parse::<CellKind>().is_err());
    }
}

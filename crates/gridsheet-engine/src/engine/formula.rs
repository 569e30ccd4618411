//! Formula parsing and evaluation.
//!
//! A formula is `=NAME(arg, arg, ...)`: one call to a built-in, no operators.
//! Evaluation runs against a grid snapshot every time a cell is read. Nothing
//! is cached, and a formula that references another formula cell sees that
//! cell's raw text.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use super::cell::Row;
use super::cell_ref::CellAddress;
use super::error::{ErrorToken, FormulaError};
use super::format::format_number;
use super::functions::{Function, FunctionOutput};

/// A parsed call: the function and its raw, trimmed arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct FormulaCall {
    pub function: Function,
    pub args: Vec<String>,
}

/// Result of evaluating cell text.
#[derive(Clone, Debug, PartialEq)]
pub enum FormulaValue {
    /// Text that is not a formula, passed through.
    Text(String),
    Number(f64),
    /// Row sets from `REMOVE_DUPLICATES` and `FIND_AND_REPLACE`.
    Rows(Vec<Row>),
    Error(ErrorToken),
}

impl FormulaValue {
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Text(s) => f.write_str(s),
            FormulaValue::Number(n) => f.write_str(&format_number(*n)),
            // Row sets display flattened, comma-joined.
            FormulaValue::Rows(rows) => {
                let cells: Vec<String> = rows.iter().flatten().map(|c| c.to_string()).collect();
                f.write_str(&cells.join(","))
            }
            FormulaValue::Error(token) => write!(f, "{}", token),
        }
    }
}

impl From<FunctionOutput> for FormulaValue {
    fn from(out: FunctionOutput) -> Self {
        match out {
            FunctionOutput::Number(n) => FormulaValue::Number(n),
            FunctionOutput::Text(s) => FormulaValue::Text(s),
            FunctionOutput::Rows(rows) => FormulaValue::Rows(rows),
        }
    }
}

/// Where a formula-bar entry should be written.
#[derive(Clone, Debug, PartialEq)]
pub struct FormulaTarget {
    /// `Some` for the `A1=SUM(B1:B8)` assignment form.
    pub target: Option<CellAddress>,
    pub formula: String,
}

fn call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^=([A-Z_]+)\((.*)\)$").expect("formula regex must compile")
    })
}

fn assignment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Z]+[0-9]+)=(.+)$").expect("assignment regex must compile")
    })
}

/// Split an argument list on top-level commas.
///
/// Double quotes toggle a literal (only at paren depth 0); parentheses nest.
/// Each argument is trimmed, and a trailing empty argument is dropped.
pub fn split_arguments(args: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut depth: i32 = 0;

    for ch in args.chars() {
        match ch {
            '"' if depth == 0 => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes && depth == 0 => {
                result.push(current.trim().to_string());
                current.clear();
            }
            _ => {
                if ch == '(' {
                    depth += 1;
                } else if ch == ')' {
                    depth -= 1;
                }
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        result.push(current.trim().to_string());
    }
    result
}

/// Parse `=NAME(args)` into a call.
pub fn parse_formula(formula: &str) -> Result<FormulaCall, FormulaError> {
    let formula = formula.trim();
    let caps = call_re()
        .captures(formula)
        .ok_or_else(|| FormulaError::Grammar(formula.to_string()))?;
    let name = &caps[1];
    let function =
        Function::from_name(name).ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    Ok(FormulaCall {
        function,
        args: split_arguments(&caps[2]),
    })
}

/// Evaluate cell text against a grid.
///
/// Text without a leading `=` comes back as-is (trimmed). Every failure turns
/// into an in-cell [`ErrorToken`].
pub fn evaluate(text: &str, rows: &[Row], headers: &[String]) -> FormulaValue {
    let text = text.trim();
    if !text.starts_with('=') {
        return FormulaValue::Text(text.to_string());
    }

    match parse_formula(text).and_then(|call| call.function.call(rows, headers, &call.args)) {
        Ok(out) => out.into(),
        Err(e) => {
            log::debug!("formula {:?} failed: {}", text, e);
            FormulaValue::Error(e.token())
        }
    }
}

/// Evaluate a formula, adding the leading `=` if it is missing.
pub fn evaluate_formula(formula: &str, rows: &[Row], headers: &[String]) -> FormulaValue {
    let formula = formula.trim();
    if formula.starts_with('=') {
        evaluate(formula, rows, headers)
    } else {
        evaluate(&format!("={}", formula), rows, headers)
    }
}

/// Recognize the formula-bar assignment form `A1=SUM(B1:B8)`.
///
/// Nothing is written: the caller decides what to do with the target.
pub fn parse_formula_with_cell_ref(input: &str) -> FormulaTarget {
    if let Some(caps) = assignment_re().captures(input)
        && let Some(target) = CellAddress::from_str(&caps[1])
    {
        let rhs = &caps[2];
        let formula = if rhs.starts_with('=') {
            rhs.to_string()
        } else {
            format!("={}", rhs)
        };
        return FormulaTarget {
            target: Some(target),
            formula,
        };
    }

    FormulaTarget {
        target: None,
        formula: input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_arguments_top_level_only() {
        assert_eq!(split_arguments("A1:B2"), vec!["A1:B2"]);
        assert_eq!(
            split_arguments("A1:A2, \"a,b\" ,\"c\""),
            vec!["A1:A2", "\"a,b\"", "\"c\""]
        );
        assert_eq!(split_arguments("f(a,b),c"), vec!["f(a,b)", "c"]);
        assert_eq!(split_arguments("a,"), vec!["a"]);
        assert!(split_arguments("").is_empty());
    }

    #[test]
    fn test_parse_formula() {
        let call = parse_formula("=SUM(B1:B3)").unwrap();
        assert_eq!(call.function, Function::Sum);
        assert_eq!(call.args, vec!["B1:B3"]);

        assert!(matches!(
            parse_formula("=SUM(B1:B3"),
            Err(FormulaError::Grammar(_))
        ));
        assert!(matches!(
            parse_formula("=sum(B1:B3)"),
            Err(FormulaError::Grammar(_))
        ));
        assert!(matches!(
            parse_formula("=MEDIAN(B1:B3)"),
            Err(FormulaError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(evaluate("  hello ", &[], &[]), FormulaValue::Text("hello".into()));
    }

    #[test]
    fn test_error_tokens() {
        assert_eq!(evaluate("=A1+B1", &[], &[]).to_string(), "#ERROR!");
        assert_eq!(evaluate("=NOPE(A1)", &[], &[]).to_string(), "#INVALID!");
        assert_eq!(evaluate("=SUM()", &[], &[]).to_string(), "#ERROR!");
        assert_eq!(
            evaluate("=FIND_AND_REPLACE(A1:A2,\"x\")", &[], &[]).to_string(),
            "#ERROR: Requires 3 arguments!"
        );
    }

    #[test]
    fn test_text_functions_use_literal_argument() {
        assert_eq!(evaluate("=UPPER(abc)", &[], &[]).to_string(), "ABC");
        assert_eq!(evaluate("=LOWER(\"AbC\")", &[], &[]).to_string(), "\"abc\"");
        assert_eq!(evaluate("=TRIM(  x  )", &[], &[]).to_string(), "x");
    }

    #[test]
    fn test_evaluate_formula_adds_equals() {
        assert_eq!(evaluate_formula("UPPER(a)", &[], &[]).to_string(), "A");
        assert_eq!(evaluate_formula("=UPPER(a)", &[], &[]).to_string(), "A");
    }

    #[test]
    fn test_parse_formula_with_cell_ref() {
        let t = parse_formula_with_cell_ref("A1=SUM(B1:B8)");
        assert_eq!(t.target, Some(CellAddress::new(0, "A")));
        assert_eq!(t.formula, "=SUM(B1:B8)");

        let t = parse_formula_with_cell_ref("C4==AVG(B1:B8)");
        assert_eq!(t.target, Some(CellAddress::new(3, "C")));
        assert_eq!(t.formula, "=AVG(B1:B8)");

        let t = parse_formula_with_cell_ref("=SUM(B1:B8)");
        assert_eq!(t.target, None);
        assert_eq!(t.formula, "=SUM(B1:B8)");

        let t = parse_formula_with_cell_ref("A1=");
        assert_eq!(t.target, None);
        assert_eq!(t.formula, "A1=");
    }
}

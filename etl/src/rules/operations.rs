//! Cell-level cleaning operations.
//!
//! An [`Operation`] maps one cell to one cell. Sequences of operations form
//! the column rules the cleaner and transformer apply.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// All available cleaning operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Remove leading and trailing whitespace
    Trim,

    /// Convert to lowercase
    Lowercase,

    /// Replace every run of whitespace with a single space
    CollapseWhitespace,

    /// Turn empty or whitespace-only text into a missing value
    BlankToMissing,

    /// Replace a missing value with a constant
    FillMissing { value: Value },

    /// Parse as a finite, non-negative decimal; anything else becomes missing
    ToPrice,
}

impl Operation {
    /// Apply this operation to a value
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Operation::Trim => map_text(value, |s| s.trim().to_string()),
            Operation::Lowercase => map_text(value, str::to_lowercase),
            Operation::CollapseWhitespace => {
                map_text(value, |s| WHITESPACE_RUN.replace_all(s, " ").into_owned())
            }
            Operation::BlankToMissing => match value {
                Value::String(s) if s.trim().is_empty() => Value::Null,
                other => other.clone(),
            },
            Operation::FillMissing { value: fill } => {
                if value.is_null() {
                    fill.clone()
                } else {
                    value.clone()
                }
            }
            Operation::ToPrice => to_price(value)
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number),
        }
    }
}

/// Run `operations` left to right over one cell.
pub fn apply_all(operations: &[Operation], value: &Value) -> Value {
    operations
        .iter()
        .fold(value.clone(), |acc, op| op.apply(&acc))
}

fn map_text<F>(value: &Value, f: F) -> Value
where
    F: Fn(&str) -> String,
{
    match value {
        Value::String(s) => Value::String(f(s)),
        other => other.clone(),
    }
}

/// Numeric value of a price cell, if it is a valid price.
pub fn to_price(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}

/// Human-readable list of operations
pub fn operations_description() -> &'static str {
    r#"
- trim: remove leading/trailing whitespace
- lowercase: convert to lowercase
- collapse_whitespace: replace whitespace runs with a single space
- blank_to_missing: treat empty text as missing
- fill_missing {value}: replace missing cells with a constant
- to_price: parse as a non-negative decimal, invalid values become missing
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trim_and_lowercase() {
        let v = json!("  Electronics/Phones ");
        assert_eq!(Operation::Trim.apply(&v), json!("Electronics/Phones"));
        assert_eq!(Operation::Lowercase.apply(&v), json!("  electronics/phones "));
    }

    #[test]
    fn test_text_ops_leave_missing_alone() {
        for op in [Operation::Trim, Operation::Lowercase, Operation::CollapseWhitespace] {
            assert_eq!(op.apply(&Value::Null), Value::Null);
        }
    }

    #[test]
    fn test_collapse_whitespace() {
        let v = json!("home \t appliances\n\nkitchen");
        assert_eq!(
            Operation::CollapseWhitespace.apply(&v),
            json!("home appliances kitchen")
        );
    }

    #[test]
    fn test_blank_to_missing_then_fill() {
        let ops = [
            Operation::BlankToMissing,
            Operation::FillMissing { value: json!("unknown") },
        ];
        assert_eq!(apply_all(&ops, &json!("   ")), json!("unknown"));
        assert_eq!(apply_all(&ops, &Value::Null), json!("unknown"));
        assert_eq!(apply_all(&ops, &json!("acme")), json!("acme"));
    }

    #[test]
    fn test_to_price() {
        assert_eq!(Operation::ToPrice.apply(&json!("20.00")), json!(20.0));
        assert_eq!(Operation::ToPrice.apply(&json!(" 1e2 ")), json!(100.0));
        assert_eq!(Operation::ToPrice.apply(&json!(3)), json!(3.0));
        for bad in [json!("NaN"), json!("inf"), json!("-5"), json!("abc"), Value::Null] {
            assert_eq!(Operation::ToPrice.apply(&bad), Value::Null, "{bad}");
        }
    }

    #[test]
    fn test_operation_serde_tag() {
        let op: Operation = serde_json::from_str(r#"{"type":"fill_missing","value":-1}"#).unwrap();
        assert_eq!(op, Operation::FillMissing { value: json!(-1) });
    }
}

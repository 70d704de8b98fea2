//! Column rules shared by the cleaner and the transformer.
//!
//! - [`operations`]: cell-level operations
//! - [`stats`]: price statistics and median imputation
//!
//! The two stages normalize categories differently: the cleaner trims and
//! lowercases, the transformer also collapses inner whitespace. Both rule
//! sets are kept as they are.

pub mod operations;
pub mod stats;

use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{columns, MISSING_ID, UNCATEGORIZED, UNKNOWN_BRAND};

pub use operations::{apply_all, operations_description, to_price, Operation};
pub use stats::{impute_median, median, Imputation, PriceStats};

/// Operations applied to one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnRule {
    pub column: &'static str,
    pub operations: Vec<Operation>,
}

impl ColumnRule {
    pub fn new(column: &'static str, operations: Vec<Operation>) -> Self {
        Self { column, operations }
    }

    pub fn apply(&self, value: &Value) -> Value {
        apply_all(&self.operations, value)
    }
}

/// Cleaner category rule: trim, lowercase, default to `uncategorized`.
pub fn cleaner_category_ops() -> Vec<Operation> {
    vec![
        Operation::Trim,
        Operation::Lowercase,
        Operation::BlankToMissing,
        Operation::FillMissing {
            value: json!(UNCATEGORIZED),
        },
    ]
}

/// Transformer category rule: lowercase, trim, collapse whitespace, default
/// to `uncategorized`.
pub fn transformer_category_ops() -> Vec<Operation> {
    vec![
        Operation::Lowercase,
        Operation::Trim,
        Operation::CollapseWhitespace,
        Operation::BlankToMissing,
        Operation::FillMissing {
            value: json!(UNCATEGORIZED),
        },
    ]
}

/// Sentinel fills the cleaner applies after price imputation.
pub fn cleaner_fill_rules() -> Vec<ColumnRule> {
    vec![
        ColumnRule::new(columns::CATEGORY_CODE, cleaner_category_ops()),
        ColumnRule::new(
            columns::CATEGORY_ID,
            vec![Operation::FillMissing {
                value: json!(MISSING_ID),
            }],
        ),
        ColumnRule::new(
            columns::BRAND,
            vec![Operation::FillMissing {
                value: json!(UNKNOWN_BRAND),
            }],
        ),
        ColumnRule::new(
            columns::USER_ID,
            vec![Operation::FillMissing {
                value: json!(MISSING_ID),
            }],
        ),
    ]
}

/// Normalize a category the way the transformer does.
pub fn normalize_category(value: &Value) -> Value {
    apply_all(&transformer_category_ops(), value)
}

/// Normalize a category the way the cleaner does.
pub fn clean_category(value: &Value) -> Value {
    apply_all(&cleaner_category_ops(), value)
}

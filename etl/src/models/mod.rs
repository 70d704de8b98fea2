//! Domain models for the ETL pipeline.
//!
//! - [`columns`] - names of the order/product record fields
//! - [`Dataset`] - an ordered header list plus rows of cells
//! - [`ColumnMissing`] - per-column missing-value count
//!
//! Cells are [`serde_json::Value`]s: `Null` is a missing value, `String`
//! holds raw text and `Number` holds coerced numerics. Columns the pipeline
//! does not know about are carried through untouched.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::SchemaError;

// =============================================================================
// Record fields
// =============================================================================

/// Field names of an order-line record.
pub mod columns {
    pub const ORDER_ID: &str = "order_id";
    pub const PRODUCT_ID: &str = "product_id";
    pub const CATEGORY_ID: &str = "category_id";
    pub const CATEGORY_CODE: &str = "category_code";
    pub const CATEGORY: &str = "category";
    pub const BRAND: &str = "brand";
    pub const PRICE: &str = "price";
    pub const USER_ID: &str = "user_id";
    pub const EVENT_TIME: &str = "event_time";
}

/// Sentinel for absent numeric identifiers.
pub const MISSING_ID: i64 = -1;

/// Sentinel for absent brands.
pub const UNKNOWN_BRAND: &str = "unknown";

/// Sentinel for absent categories.
pub const UNCATEGORIZED: &str = "uncategorized";

// =============================================================================
// Cells
// =============================================================================

/// Textual form of a cell, `None` when missing.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Whether a cell counts as missing.
pub fn is_missing(value: &Value) -> bool {
    value.is_null()
}

// =============================================================================
// Dataset
// =============================================================================

/// Missing-value count of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
}

/// In-memory table: one row per record, cells aligned with `headers`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a dataset from header names and rows of text cells, where
    /// `None` marks a missing value.
    pub fn from_text_rows(headers: &[&str], rows: &[Vec<Option<&str>>]) -> Self {
        let mut dataset = Self::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            let mut cells: Vec<Value> = row
                .iter()
                .map(|c| c.map_or(Value::Null, |s| Value::String(s.to_string())))
                .collect();
            cells.resize(headers.len(), Value::Null);
            dataset.rows.push(cells);
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Fail with every absent column listed, not just the first.
    pub fn require_columns(&self, required: &[&str]) -> Result<(), SchemaError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MissingColumns { columns: missing })
        }
    }

    /// Index of a column that must exist.
    pub fn index_of(&self, name: &str) -> Result<usize, SchemaError> {
        self.column_index(name)
            .ok_or_else(|| SchemaError::MissingColumns {
                columns: vec![name.to_string()],
            })
    }

    /// Cells of one column, in row order.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Rewrite every cell of a column in place.
    pub fn map_column<F>(&mut self, idx: usize, mut f: F)
    where
        F: FnMut(&Value) -> Value,
    {
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
    }

    /// Append a column; `values` must hold one cell per row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.headers.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Remove a column, returning whether it existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        match self.column_index(name) {
            Some(idx) => {
                self.headers.remove(idx);
                for row in &mut self.rows {
                    row.remove(idx);
                }
                true
            }
            None => false,
        }
    }

    /// Keep only `columns`, in the given order.
    pub fn select(&self, columns: &[&str]) -> Result<Dataset, SchemaError> {
        self.require_columns(columns)?;
        let indices: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();
        Ok(Dataset {
            headers: columns.iter().map(|c| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Drop rows whose key repeats an earlier row's key. Missing key cells
    /// compare equal to each other. Returns the number of rows removed.
    pub fn dedup_by(&mut self, key_columns: &[&str]) -> Result<usize, SchemaError> {
        self.require_columns(key_columns)?;
        let indices: Vec<usize> = key_columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();

        let before = self.rows.len();
        let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(before);
        self.rows.retain(|row| {
            let key: Vec<Option<String>> = indices.iter().map(|&i| cell_text(&row[i])).collect();
            seen.insert(key)
        });
        Ok(before - self.rows.len())
    }

    /// Missing-value count per column, in header order.
    pub fn missing_counts(&self) -> Vec<ColumnMissing> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, column)| ColumnMissing {
                column: column.clone(),
                missing: self.column(i).filter(|v| is_missing(v)).count(),
            })
            .collect()
    }
}

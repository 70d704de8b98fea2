//! Column statistics and median imputation.

use serde::Serialize;
use serde_json::{Number, Value};

use super::operations::{to_price, Operation};
use crate::models::Dataset;

/// Summary statistics of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

impl PriceStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let median = median(values)?;
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            mean,
            min,
            max,
            median,
        })
    }

    /// Statistics over the valid prices of a column.
    pub fn of_column(dataset: &Dataset, idx: usize) -> Option<Self> {
        let values: Vec<f64> = dataset.column(idx).filter_map(to_price).collect();
        Self::from_values(&values)
    }
}

/// Median of the values; the mean of the two middle values for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// What median imputation did to a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Imputation {
    /// Cells that held a valid price before imputation.
    pub valid: usize,
    /// Cells replaced by the median.
    pub imputed: usize,
    /// Median of the valid cells, `None` when there were none.
    pub median: Option<f64>,
}

/// Coerce a column to prices and fill every missing or invalid cell with
/// the median of the valid ones.
///
/// When the column has no valid value at all the dataset is left untouched
/// and `median` is `None`; callers decide whether that is fatal.
pub fn impute_median(dataset: &mut Dataset, idx: usize) -> Imputation {
    let coerced: Vec<Value> = dataset.column(idx).map(|v| Operation::ToPrice.apply(v)).collect();
    let valid: Vec<f64> = coerced.iter().filter_map(Value::as_f64).collect();
    let imputed = coerced.len() - valid.len();

    let median = median(&valid);
    let Some(fill) = median.and_then(Number::from_f64) else {
        return Imputation {
            valid: valid.len(),
            imputed: 0,
            median,
        };
    };

    for (row, cell) in dataset.rows.iter_mut().zip(coerced) {
        row[idx] = if cell.is_null() {
            Value::Number(fill.clone())
        } else {
            cell
        };
    }

    Imputation {
        valid: valid.len(),
        imputed,
        median,
    }
}

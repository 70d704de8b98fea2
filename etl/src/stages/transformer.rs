//! Transform stage: validate and normalize a dataset for loading.
//!
//! Requires `product_id` and `price`. Prices are coerced and imputed with
//! this stage's own median. `category_code` is replaced by a normalized
//! `category` column appended at the end; without `category_code` the
//! derivation is skipped with a warning.

use serde_json::Value;
use std::collections::HashMap;

use crate::config::PipelineConfig;
use crate::error::{StageError, StageResult};
use crate::logs::log_info;
use crate::models::{cell_text, columns, Dataset};
use crate::parser::{read_dataset, write_dataset};
use crate::report::{CategoryCount, StageReport, StageWarning, TransformReport};
use crate::rules::{impute_median, normalize_category, PriceStats};

use super::{Stage, StageName};

pub const REQUIRED_COLUMNS: [&str; 2] = [columns::PRODUCT_ID, columns::PRICE];

/// Number of categories listed in the report.
pub const TOP_CATEGORIES: usize = 5;

/// Transformed dataset with its diagnostics.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub dataset: Dataset,
    pub report: TransformReport,
}

/// Apply the transform rules.
pub fn transform(mut dataset: Dataset) -> StageResult<Transformed> {
    dataset.require_columns(&REQUIRED_COLUMNS)?;
    let mut warnings = Vec::new();

    let price_idx = dataset.index_of(columns::PRICE)?;
    // Left untouched when no price is valid.
    let price_imputation = impute_median(&mut dataset, price_idx);
    let price_stats = if price_imputation.median.is_some() {
        PriceStats::of_column(&dataset, price_idx)
    } else {
        if !dataset.is_empty() {
            warnings.push(StageWarning::Conversion {
                column: columns::PRICE.to_string(),
                reason: "no valid numeric values, original values kept".to_string(),
            });
        }
        None
    };

    let top_categories = match dataset.column_index(columns::CATEGORY_CODE) {
        Some(idx) => {
            let category: Vec<Value> = dataset.column(idx).map(normalize_category).collect();
            let top = top_values(&category, TOP_CATEGORIES);
            dataset.push_column(columns::CATEGORY, category);
            dataset.drop_column(columns::CATEGORY_CODE);
            top
        }
        None => {
            warnings.push(StageWarning::MissingColumn {
                column: columns::CATEGORY_CODE.to_string(),
            });
            Vec::new()
        }
    };

    let report = TransformReport {
        rows: dataset.len(),
        columns: dataset.headers.clone(),
        missing_after: dataset.missing_counts(),
        price_imputation,
        price_stats,
        top_categories,
        warnings,
        output: None,
    };

    Ok(Transformed { dataset, report })
}

/// Most frequent values, ties broken by first appearance.
fn top_values(values: &[Value], n: usize) -> Vec<CategoryCount> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (pos, value) in values.iter().enumerate() {
        if let Some(text) = cell_text(value) {
            counts.entry(text).or_insert((0, pos)).0 += 1;
        }
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(category, (count, first))| (category, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(n)
        .map(|(category, count, _)| CategoryCount { category, count })
        .collect()
}

/// Reads the transform source (cleaned file by default), writes
/// `transformed_path`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Transformer;

impl Stage for Transformer {
    fn name(&self) -> StageName {
        StageName::Transform
    }

    fn run(&self, config: &PipelineConfig) -> StageResult<StageReport> {
        let source = config.transform_source();
        log_info(format!("Transforming {}", source.display()));
        let parsed = read_dataset(source).map_err(|e| {
            StageError::from(e).with_hint("Run the clean stage first or pass --input.")
        })?;
        log_info(format!("Loaded {} rows", parsed.dataset.len()));

        let Transformed { dataset, mut report } = transform(parsed.dataset)?;
        write_dataset(&config.transformed_path, &dataset)?;
        report.output = Some(config.transformed_path.clone());

        Ok(StageReport::Transform(report))
    }
}

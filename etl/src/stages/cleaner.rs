//! Clean stage: deduplicate and repair the raw export.
//!
//! Rules, in order:
//! 1. keep the first row of every `(order_id, product_id)` pair
//! 2. coerce `price` and fill invalid cells with the median of valid ones
//! 3. trim and lowercase `category_code`, defaulting to `uncategorized`
//! 4. fill `category_id` and `user_id` with `-1`, `brand` with `unknown`

use crate::config::PipelineConfig;
use crate::error::{StageError, StageResult};
use crate::logs::log_info;
use crate::models::{columns, Dataset};
use crate::parser::{read_dataset, write_dataset};
use crate::report::{CleanReport, StageReport};
use crate::rules::{cleaner_fill_rules, impute_median, PriceStats};

use super::{Stage, StageName};

/// Columns the cleaner rewrites or keys on.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    columns::ORDER_ID,
    columns::PRODUCT_ID,
    columns::PRICE,
    columns::CATEGORY_CODE,
    columns::CATEGORY_ID,
    columns::BRAND,
    columns::USER_ID,
];

/// Composite key rows are deduplicated on.
pub const DEDUP_KEY: [&str; 2] = [columns::ORDER_ID, columns::PRODUCT_ID];

/// Cleaned dataset with its diagnostics.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub dataset: Dataset,
    pub report: CleanReport,
}

/// Apply the cleaning rules to a raw dataset.
pub fn clean(mut dataset: Dataset) -> StageResult<Cleaned> {
    dataset.require_columns(&REQUIRED_COLUMNS)?;
    let input_rows = dataset.len();

    let duplicates_removed = dataset.dedup_by(&DEDUP_KEY)?;
    let missing_before = dataset.missing_counts();

    let price_idx = dataset.index_of(columns::PRICE)?;
    let price_imputation = impute_median(&mut dataset, price_idx);
    if price_imputation.median.is_none() && !dataset.is_empty() {
        return Err(StageError::NoValidValues {
            column: columns::PRICE.to_string(),
        });
    }

    for rule in cleaner_fill_rules() {
        let idx = dataset.index_of(rule.column)?;
        dataset.map_column(idx, |v| rule.apply(v));
    }

    let price_stats = PriceStats::of_column(&dataset, price_idx);
    let report = CleanReport {
        input_rows,
        output_rows: dataset.len(),
        duplicates_removed,
        missing_before,
        price_imputation,
        price_stats,
        output: None,
    };

    Ok(Cleaned { dataset, report })
}

/// Reads `raw_path`, writes `cleaned_path`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Cleaner;

impl Stage for Cleaner {
    fn name(&self) -> StageName {
        StageName::Clean
    }

    fn run(&self, config: &PipelineConfig) -> StageResult<StageReport> {
        log_info(format!("Cleaning {}", config.raw_path.display()));
        let parsed = read_dataset(&config.raw_path).map_err(|e| {
            StageError::from(e).with_hint("Please ensure the raw export is in the data directory.")
        })?;

        let Cleaned { dataset, mut report } = clean(parsed.dataset)?;
        write_dataset(&config.cleaned_path, &dataset)?;
        report.output = Some(config.cleaned_path.clone());

        Ok(StageReport::Clean(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::to_price;
    use serde_json::{json, Value};

    const HEADERS: [&str; 8] = [
        "event_time",
        "order_id",
        "product_id",
        "category_id",
        "category_code",
        "brand",
        "price",
        "user_id",
    ];

    fn raw(rows: &[Vec<Option<&str>>]) -> Dataset {
        Dataset::from_text_rows(&HEADERS, rows)
    }

    fn cell<'a>(ds: &'a Dataset, row: usize, column: &str) -> &'a Value {
        &ds.rows[row][ds.column_index(column).unwrap()]
    }

    #[test]
    fn test_nan_price_takes_median_and_category_is_normalized() {
        let ds = raw(&[
            vec![Some("t1"), Some("1"), Some("5"), Some("7"), Some(" Electronics/Phones "), Some("apple"), Some("NaN"), Some("3")],
            vec![Some("t2"), Some("2"), Some("6"), Some("7"), Some("electronics"), Some("acme"), Some("20.00"), Some("4")],
        ]);
        let cleaned = clean(ds).unwrap().dataset;

        assert_eq!(to_price(cell(&cleaned, 0, "price")), Some(20.0));
        assert_eq!(cell(&cleaned, 0, "category_code"), &json!("electronics/phones"));
    }

    #[test]
    fn test_first_duplicate_wins() {
        let ds = raw(&[
            vec![Some("t1"), Some("1"), Some("5"), None, None, Some("first"), Some("10"), None],
            vec![Some("t2"), Some("1"), Some("5"), None, None, Some("second"), Some("99"), None],
        ]);
        let out = clean(ds).unwrap();

        assert_eq!(out.report.duplicates_removed, 1);
        assert_eq!(out.dataset.len(), 1);
        assert_eq!(cell(&out.dataset, 0, "brand"), &json!("first"));
    }

    #[test]
    fn test_no_nulls_after_cleaning() {
        let ds = raw(&[
            vec![None, Some("1"), Some("5"), None, None, None, None, None],
            vec![None, Some("2"), Some("5"), None, Some("   "), None, Some("abc"), None],
            vec![None, Some("3"), Some("6"), Some("9"), Some("Tools"), Some("bosch"), Some("12.5"), Some("77")],
        ]);
        let cleaned = clean(ds).unwrap().dataset;

        for column in ["price", "category_code", "brand", "category_id", "user_id"] {
            let idx = cleaned.column_index(column).unwrap();
            assert!(cleaned.column(idx).all(|v| !v.is_null()), "{column} has nulls");
        }
        assert_eq!(cell(&cleaned, 0, "category_id"), &json!(-1));
        assert_eq!(cell(&cleaned, 0, "user_id"), &json!(-1));
        assert_eq!(cell(&cleaned, 0, "brand"), &json!("unknown"));
        assert_eq!(cell(&cleaned, 1, "category_code"), &json!("uncategorized"));
        // event_time passes through untouched
        assert!(cell(&cleaned, 0, "event_time").is_null());
    }

    #[test]
    fn test_prices_are_original_or_median() {
        let prices = ["4", "x", "10", "", "7", "-2", "1e400"];
        let orders: Vec<String> = (0..prices.len()).map(|i| i.to_string()).collect();
        let rows: Vec<Vec<Option<&str>>> = prices
            .iter()
            .zip(&orders)
            .map(|(p, order)| {
                let price = Some(*p).filter(|s| !s.is_empty());
                vec![None, Some(order.as_str()), Some("1"), None, None, None, price, None]
            })
            .collect();
        let out = clean(raw(&rows)).unwrap();

        assert_eq!(out.report.price_imputation.median, Some(7.0));
        assert_eq!(out.report.price_imputation.imputed, 4);
        let idx = out.dataset.column_index("price").unwrap();
        let got: Vec<f64> = out.dataset.column(idx).filter_map(to_price).collect();
        assert_eq!(got, vec![4.0, 7.0, 10.0, 7.0, 7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let ds = raw(&[
            vec![None, Some("1"), Some("5"), None, None, None, Some("1"), None],
            vec![None, Some("1"), Some("5"), None, None, None, Some("2"), None],
            vec![None, Some("1"), Some("6"), None, None, None, Some("3"), None],
        ]);
        let once = clean(ds).unwrap();
        let twice = clean(once.dataset.clone()).unwrap();

        assert_eq!(twice.report.duplicates_removed, 0);
        assert_eq!(twice.dataset.len(), once.dataset.len());
    }

    #[test]
    fn test_report_counts_and_stats() {
        let ds = raw(&[
            vec![None, Some("1"), Some("5"), None, None, None, Some("10"), None],
            vec![None, Some("1"), Some("5"), None, None, None, Some("10"), None],
            vec![None, Some("2"), Some("5"), None, Some("a"), None, Some("30"), None],
        ]);
        let report = clean(ds).unwrap().report;

        assert_eq!(report.input_rows, 3);
        assert_eq!(report.output_rows, 2);
        let cat = report.missing_before.iter().find(|c| c.column == "category_code").unwrap();
        assert_eq!(cat.missing, 1);
        let stats = report.price_stats.unwrap();
        assert_eq!((stats.mean, stats.min, stats.max, stats.median), (20.0, 10.0, 30.0, 20.0));
    }

    #[test]
    fn test_row_of_empty_cells_is_repaired() {
        let csv = format!("{}\nt1,1,5,7,a,acme,10,3\n,,,,,,,\n", HEADERS.join(","));
        let ds = crate::parser::parse_str(&csv, ',').unwrap();
        let out = clean(ds).unwrap();

        assert_eq!(out.report.input_rows, 2);
        assert_eq!(out.report.output_rows, 2);
        let brand = out.report.missing_before.iter().find(|c| c.column == "brand").unwrap();
        assert_eq!(brand.missing, 1);

        let cleaned = &out.dataset;
        assert_eq!(to_price(cell(cleaned, 1, "price")), Some(10.0));
        assert_eq!(cell(cleaned, 1, "category_id"), &json!(-1));
        assert_eq!(cell(cleaned, 1, "user_id"), &json!(-1));
        assert_eq!(cell(cleaned, 1, "brand"), &json!("unknown"));
        assert_eq!(cell(cleaned, 1, "category_code"), &json!("uncategorized"));
    }

    #[test]
    fn test_missing_required_columns() {
        let ds = Dataset::from_text_rows(&["order_id", "price"], &[vec![Some("1"), Some("2")]]);
        let err = clean(ds).unwrap_err();
        assert!(matches!(err, StageError::Schema(_)));
        assert!(err.to_string().contains("product_id"));
    }

    #[test]
    fn test_no_valid_price_is_fatal() {
        let ds = raw(&[vec![None, Some("1"), Some("5"), None, None, None, Some("free"), None]]);
        assert!(matches!(clean(ds), Err(StageError::NoValidValues { .. })));
    }

    #[test]
    fn test_empty_input_is_fine() {
        let out = clean(raw(&[])).unwrap();
        assert_eq!(out.report.output_rows, 0);
        assert!(out.report.price_stats.is_none());
    }

    #[test]
    fn test_run_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::in_dir(dir.path());
        let err = Cleaner.run(&config).unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::MissingSourceFile);
        assert!(!config.cleaned_path.exists());
    }
}

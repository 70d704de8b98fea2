//! Console rendering of stage reports.

use super::{CleanReport, LoadReport, StageFailure, StageReport, TransformReport};
use crate::error::ErrorKind;
use crate::logs::LogEntry;
use crate::models::ColumnMissing;

/// Lines describing a finished stage.
pub fn stage_lines(report: &StageReport) -> Vec<LogEntry> {
    match report {
        StageReport::Clean(r) => clean_lines(r),
        StageReport::Transform(r) => transform_lines(r),
        StageReport::Load(r) => load_lines(r),
    }
}

/// Lines describing a failed stage.
pub fn failure_lines(failure: &StageFailure) -> Vec<LogEntry> {
    let label = match failure.kind {
        ErrorKind::MissingSourceFile => "Missing source file",
        ErrorKind::SchemaValidation => "Schema validation failed",
        ErrorKind::DatabaseWrite => "Database write failed",
        ErrorKind::Unexpected => "Unexpected error",
    };
    vec![LogEntry::error(format!(
        "{} in stage '{}': {}",
        label, failure.stage, failure.message
    ))]
}

fn missing_lines(title: &str, counts: &[ColumnMissing]) -> Vec<LogEntry> {
    let mut lines = vec![LogEntry::info(title)];
    lines.extend(
        counts
            .iter()
            .map(|c| LogEntry::info(format!("{}: {}", c.column, c.missing)).with_indent(1)),
    );
    lines
}

fn clean_lines(r: &CleanReport) -> Vec<LogEntry> {
    let mut lines = vec![
        LogEntry::success(format!("Loaded dataset: {} rows", r.input_rows)),
        LogEntry::info(format!("Removed {} duplicate entries", r.duplicates_removed)),
    ];
    lines.extend(missing_lines("Missing values before cleaning:", &r.missing_before));

    if let Some(median) = r.price_imputation.median {
        lines.push(LogEntry::info(format!(
            "Filled {} missing or invalid prices with median {:.2}",
            r.price_imputation.imputed, median
        )));
    }
    if let Some(path) = &r.output {
        lines.push(LogEntry::success(format!(
            "Cleaned data saved to: {} ({} rows)",
            path.display(),
            r.output_rows
        )));
    }
    if let Some(stats) = &r.price_stats {
        lines.push(LogEntry::info("Basic data analysis:"));
        lines.push(LogEntry::info(format!("Average Price: ${:.2}", stats.mean)).with_indent(1));
        lines.push(
            LogEntry::info(format!("Price Range: ${:.2} - ${:.2}", stats.min, stats.max))
                .with_indent(1),
        );
        lines.push(LogEntry::info(format!("Median Price: ${:.2}", stats.median)).with_indent(1));
    }
    lines
}

fn transform_lines(r: &TransformReport) -> Vec<LogEntry> {
    let mut lines = Vec::new();

    if let Some(stats) = &r.price_stats {
        lines.push(LogEntry::success("Converted price to numeric format"));
        lines.push(
            LogEntry::info(format!("price stats: Mean=${:.2}, Max=${:.2}", stats.mean, stats.max))
                .with_indent(1),
        );
    }
    for warning in &r.warnings {
        lines.push(LogEntry::warning(warning.to_string()));
    }
    if !r.top_categories.is_empty() {
        let top: Vec<String> = r
            .top_categories
            .iter()
            .map(|c| format!("{} ({})", c.category, c.count))
            .collect();
        lines.push(LogEntry::success("Standardized product categories"));
        lines.push(LogEntry::info(format!("Top categories: {}", top.join(", "))).with_indent(1));
    }

    lines.push(LogEntry::info("Final dataset validation:"));
    lines.push(LogEntry::info(format!("Total products: {}", r.rows)).with_indent(1));
    lines.push(LogEntry::info(format!("Columns: {}", r.columns.join(", "))).with_indent(1));
    lines.extend(missing_lines("Missing values per column:", &r.missing_after));

    if let Some(path) = &r.output {
        lines.push(LogEntry::success(format!(
            "Saved transformed data to: {}",
            path.display()
        )));
    }
    lines
}

fn load_lines(r: &LoadReport) -> Vec<LogEntry> {
    let mut lines: Vec<LogEntry> = r
        .tables
        .iter()
        .map(|t| LogEntry::success(format!("Loaded {} rows to {}", t.rows, t.table)))
        .collect();
    lines.push(LogEntry::success(format!(
        "Successfully loaded product catalog into {}",
        r.database
    )));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{StageWarning, TableLoad};
    use crate::rules::Imputation;
    use crate::stages::StageName;

    #[test]
    fn test_load_lines() {
        let report = StageReport::Load(LoadReport {
            database: "sqlite://data/shop.db".into(),
            tables: vec![
                TableLoad { table: "products".into(), rows: 3 },
                TableLoad { table: "orders".into(), rows: 5 },
            ],
        });
        let lines = stage_lines(&report);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].message, "Loaded 5 rows to orders");
    }

    #[test]
    fn test_transform_warning_rendered() {
        let report = StageReport::Transform(TransformReport {
            rows: 1,
            columns: vec!["product_id".into(), "price".into()],
            missing_after: vec![],
            price_imputation: Imputation { valid: 1, imputed: 0, median: Some(1.0) },
            price_stats: None,
            top_categories: vec![],
            warnings: vec![StageWarning::MissingColumn { column: "category_code".into() }],
            output: None,
        });
        let lines = stage_lines(&report);
        let warnings: Vec<_> = lines
            .iter()
            .filter(|l| l.level == crate::logs::LogLevel::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("category_code"));
    }

    #[test]
    fn test_failure_lines() {
        let failure = StageFailure {
            stage: StageName::Load,
            kind: ErrorKind::MissingSourceFile,
            message: "Missing source file: data/transformed_kz.csv".into(),
        };
        let lines = failure_lines(&failure);
        assert!(lines[0].message.starts_with("Missing source file in stage 'load'"));
    }
}

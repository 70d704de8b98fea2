//! Structured diagnostics returned by each stage.
//!
//! Stages return these values instead of printing; [`render`] turns them
//! into console lines and [`RunReport::write_json`] persists them.

pub mod render;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{ErrorKind, PipelineError, PipelineResult, StageError};
use crate::models::ColumnMissing;
use crate::rules::{Imputation, PriceStats};
use crate::stages::StageName;

// =============================================================================
// Warnings
// =============================================================================

/// Non-fatal problem recorded while a stage kept going.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StageWarning {
    /// An optional column is absent, so its rule was skipped.
    MissingColumn { column: String },
    /// A column could not be coerced; original values were kept.
    Conversion { column: String, reason: String },
}

impl fmt::Display for StageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageWarning::MissingColumn { column } => {
                write!(f, "Missing column '{}', rule skipped", column)
            }
            StageWarning::Conversion { column, reason } => {
                write!(f, "Failed to convert '{}': {}", column, reason)
            }
        }
    }
}

// =============================================================================
// Per-stage reports
// =============================================================================

/// Frequency of one category value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Outcome of the cleaning stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub duplicates_removed: usize,
    /// Missing cells per column after deduplication, before any repair.
    pub missing_before: Vec<ColumnMissing>,
    pub price_imputation: Imputation,
    /// Price statistics of the cleaned output.
    pub price_stats: Option<PriceStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Outcome of the transform stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformReport {
    pub rows: usize,
    pub columns: Vec<String>,
    /// Missing cells per column of the transformed output.
    pub missing_after: Vec<ColumnMissing>,
    pub price_imputation: Imputation,
    pub price_stats: Option<PriceStats>,
    pub top_categories: Vec<CategoryCount>,
    pub warnings: Vec<StageWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Rows written to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLoad {
    pub table: String,
    pub rows: usize,
}

/// Outcome of the load stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub database: String,
    pub tables: Vec<TableLoad>,
}

/// Report of any stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "camelCase")]
pub enum StageReport {
    Clean(CleanReport),
    Transform(TransformReport),
    Load(LoadReport),
}

impl StageReport {
    pub fn stage(&self) -> StageName {
        match self {
            StageReport::Clean(_) => StageName::Clean,
            StageReport::Transform(_) => StageName::Transform,
            StageReport::Load(_) => StageName::Load,
        }
    }

    pub fn warnings(&self) -> &[StageWarning] {
        match self {
            StageReport::Transform(r) => &r.warnings,
            _ => &[],
        }
    }
}

// =============================================================================
// Run report
// =============================================================================

/// Why a run stopped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFailure {
    pub stage: StageName,
    pub kind: ErrorKind,
    pub message: String,
}

impl StageFailure {
    pub fn new(stage: StageName, err: &StageError) -> Self {
        Self {
            stage,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Everything one invocation did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stages: Vec<StageReport>,
    pub failure: Option<StageFailure>,
}

impl RunReport {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            stages: Vec::new(),
            failure: None,
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> PipelineResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| PipelineError::Report {
            path: path.to_path_buf(),
            source,
        })
    }
}

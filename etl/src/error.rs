//! Error types for the ecomload ETL pipeline.
//!
//! One enum per concern:
//!
//! - [`CsvError`] - reading and writing delimited files
//! - [`SchemaError`] - required columns absent from a dataset
//! - [`LoadError`] - database connection and bulk writes
//! - [`ConfigError`] - invalid configuration values
//! - [`StageError`] - everything a single stage can fail with
//! - [`PipelineError`] - orchestration and report output
//!
//! Conversions are provided via `From` so `?` works across boundaries.

use std::path::PathBuf;
use thiserror::Error;

use crate::stages::StageName;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing a delimited file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Source file does not exist.
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Failed to read or write the file.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed record.
    #[error("Line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// Serializing the output failed.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

// =============================================================================
// Schema Errors
// =============================================================================

/// A dataset lacks columns a stage cannot work without.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },
}

// =============================================================================
// Load Errors
// =============================================================================

/// Errors from the relational store.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Connection string names a backend we cannot open.
    #[error("Unsupported database URL '{0}' (expected sqlite://<path>, sqlite::memory: or a file path)")]
    UnsupportedUrl(String),

    /// Opening the database failed.
    #[error("Cannot open database '{url}': {source}")]
    Connect {
        url: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Creating the database directory failed.
    #[error("Cannot create database directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing one table failed; the whole transaction is rolled back.
    #[error("Error loading table '{table}': {source}")]
    TableWrite {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Beginning or committing the transaction failed.
    #[error("Transaction error: {0}")]
    Transaction(#[source] rusqlite::Error),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

// =============================================================================
// Stage Errors
// =============================================================================

/// Failure of a single stage. Each variant maps onto one [`ErrorKind`].
#[derive(Debug, Error)]
pub enum StageError {
    /// Input file absent.
    #[error("Missing source file: {}. {hint}", path.display())]
    MissingSource { path: PathBuf, hint: String },

    /// Required columns absent.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Reading or writing a file failed.
    #[error(transparent)]
    Csv(CsvError),

    /// Database write failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Rows exist but not one of them carries a usable value in the column.
    #[error("Column '{column}' has no valid numeric values to impute from")]
    NoValidValues { column: String },
}

impl From<CsvError> for StageError {
    fn from(err: CsvError) -> Self {
        match err {
            CsvError::NotFound { path } => StageError::MissingSource {
                path,
                hint: "Please ensure the input file exists.".to_string(),
            },
            other => StageError::Csv(other),
        }
    }
}

/// Operator-facing classification of stage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    MissingSourceFile,
    SchemaValidation,
    DatabaseWrite,
    Unexpected,
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::MissingSource { .. } => ErrorKind::MissingSourceFile,
            StageError::Schema(_) => ErrorKind::SchemaValidation,
            StageError::Load(_) => ErrorKind::DatabaseWrite,
            StageError::Csv(_) | StageError::NoValidValues { .. } => ErrorKind::Unexpected,
        }
    }

    /// Replace the generic remediation hint of a missing-file error.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            StageError::MissingSource { path, .. } => StageError::MissingSource {
                path,
                hint: hint.into(),
            },
            other => other,
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A stage failed.
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: StageName,
        #[source]
        source: StageError,
    },

    /// The requested stage is not registered with the pipeline.
    #[error("Stage '{0}' is not part of this pipeline")]
    UnknownStage(StageName),

    /// Writing the JSON run report failed.
    #[error("Cannot write report {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing the run report failed.
    #[error("Report JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for store operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for a single stage.
pub type StageResult<T> = Result<T, StageError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

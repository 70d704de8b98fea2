//! # Ecomload - batch ETL for e-commerce order exports
//!
//! Ecomload cleans a raw product/order CSV export, normalizes it for
//! analysis and loads it into a relational store as `products`,
//! `categories` and `orders` tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Raw CSV   │────▶│   Cleaner   │────▶│ Transformer │────▶│   Loader    │
//! │  (kz.csv)   │     │ (dedup/fix) │     │ (normalize) │     │  (SQLite)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Every stage persists its output, so stages can run one at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ecomload::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::in_dir("data");
//! let run = Pipeline::new(config).run_all();
//! println!("{} stages completed", run.stages.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Tabular dataset and column names
//! - [`parser`] - CSV reading with auto-detection, atomic writes
//! - [`rules`] - Cell operations, cleaning rules and price statistics
//! - [`stages`] - Cleaner, transformer and loader
//! - [`store`] - SQLite table replacement
//! - [`pipeline`] - Stage orchestration
//! - [`report`] - Structured stage diagnostics
//! - [`config`] - Paths and database settings
//! - [`logs`] - Console log helpers

// Core modules
pub mod error;
pub mod models;
pub mod config;
pub mod logs;

// Parsing
pub mod parser;

// Rules and stages
pub mod rules;
pub mod stages;

// Persistence
pub mod store;

// Orchestration
pub mod pipeline;
pub mod report;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    CsvError,
    ErrorKind,
    LoadError,
    PipelineError,
    PipelineResult,
    SchemaError,
    StageError,
    StageResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Dataset, ColumnMissing};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    parse_str,
    parse_bytes_auto,
    read_dataset,
    write_dataset,
    detect_encoding,
    detect_delimiter,
    decode_content,
    ParseResult,
};

// =============================================================================
// Re-exports - Rules
// =============================================================================

pub use rules::{
    Operation,
    operations_description,
    impute_median,
    median,
    Imputation,
    PriceStats,
};

// =============================================================================
// Re-exports - Stages and pipeline
// =============================================================================

pub use config::PipelineConfig;
pub use pipeline::Pipeline;
pub use stages::{Cleaner, Loader, Stage, StageName, Transformer};
pub use stages::cleaner::clean;
pub use stages::transformer::transform;
pub use stages::loader::project;
pub use store::{DatabaseTarget, Store, Table};

// =============================================================================
// Re-exports - Reports
// =============================================================================

pub use report::{
    CleanReport,
    TransformReport,
    LoadReport,
    RunReport,
    StageReport,
    StageFailure,
    StageWarning,
};

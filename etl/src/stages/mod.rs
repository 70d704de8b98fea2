//! Pipeline stages.
//!
//! - [`cleaner`]: deduplicate and repair the raw export
//! - [`transformer`]: validate and normalize for loading
//! - [`loader`]: project into tables and replace them in the database
//!
//! Each stage pairs a pure dataset function with a [`Stage`] implementation
//! that reads its input file and persists its output.

pub mod cleaner;
pub mod loader;
pub mod transformer;

use serde::Serialize;
use std::fmt;

use crate::config::PipelineConfig;
use crate::error::StageResult;
use crate::report::StageReport;

pub use cleaner::Cleaner;
pub use loader::Loader;
pub use transformer::Transformer;

/// Stage identifiers, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StageName {
    Clean,
    Transform,
    Load,
}

impl StageName {
    pub const ALL: [StageName; 3] = [StageName::Clean, StageName::Transform, StageName::Load];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Clean => "clean",
            StageName::Transform => "transform",
            StageName::Load => "load",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the pipeline: read input, apply rules, persist output.
pub trait Stage {
    fn name(&self) -> StageName;

    fn run(&self, config: &PipelineConfig) -> StageResult<StageReport>;
}

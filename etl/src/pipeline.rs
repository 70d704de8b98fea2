//! Pipeline orchestration.
//!
//! A [`Pipeline`] owns the configuration and an ordered list of stages. It
//! runs one stage or all of them, stopping at the first failure, and
//! collects every stage report into a [`RunReport`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ecomload::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::from_env().unwrap();
//! let run = Pipeline::new(config).run_all();
//! assert!(run.succeeded());
//! ```

use crate::config::PipelineConfig;
use crate::error::{ErrorKind, PipelineError, PipelineResult};
use crate::logs::{emit_all, log_info};
use crate::report::render::{failure_lines, stage_lines};
use crate::report::{RunReport, StageFailure, StageReport};
use crate::stages::{Cleaner, Loader, Stage, StageName, Transformer};

pub struct Pipeline {
    config: PipelineConfig,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Cleaner, transformer and loader, in that order.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_stages(
            config,
            vec![Box::new(Cleaner), Box::new(Transformer), Box::new(Loader)],
        )
    }

    pub fn with_stages(config: PipelineConfig, stages: Vec<Box<dyn Stage>>) -> Self {
        Self { config, stages }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stage_names(&self) -> Vec<StageName> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run a single stage.
    pub fn run_stage(&self, name: StageName) -> PipelineResult<StageReport> {
        let stage = self
            .stages
            .iter()
            .find(|s| s.name() == name)
            .ok_or(PipelineError::UnknownStage(name))?;

        stage
            .run(&self.config)
            .map_err(|source| PipelineError::Stage { stage: name, source })
    }

    /// Run every registered stage in order.
    pub fn run_all(&self) -> RunReport {
        self.run(&self.stage_names())
    }

    /// Run the named stages in the given order, stopping at the first
    /// failure. Reports and failures are logged as they happen.
    pub fn run(&self, names: &[StageName]) -> RunReport {
        let mut run = RunReport::start();
        log_info(format!("Run {}", run.run_id));

        for &name in names {
            log_info(format!("Stage: {}", name));
            match self.run_stage(name) {
                Ok(report) => {
                    emit_all(&stage_lines(&report));
                    run.stages.push(report);
                }
                Err(PipelineError::Stage { stage, source }) => {
                    let failure = StageFailure::new(stage, &source);
                    emit_all(&failure_lines(&failure));
                    run.failure = Some(failure);
                    break;
                }
                Err(other) => {
                    let failure = StageFailure {
                        stage: name,
                        kind: ErrorKind::Unexpected,
                        message: other.to_string(),
                    };
                    emit_all(&failure_lines(&failure));
                    run.failure = Some(failure);
                    break;
                }
            }
        }

        run.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageResult;
    use crate::report::LoadReport;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording {
        name: StageName,
        fail: bool,
        calls: Rc<RefCell<Vec<StageName>>>,
    }

    impl Stage for Recording {
        fn name(&self) -> StageName {
            self.name
        }

        fn run(&self, _config: &PipelineConfig) -> StageResult<StageReport> {
            self.calls.borrow_mut().push(self.name);
            if self.fail {
                return Err(crate::error::SchemaError::MissingColumns {
                    columns: vec!["price".into()],
                }
                .into());
            }
            Ok(StageReport::Load(LoadReport {
                database: "sqlite::memory:".into(),
                tables: vec![],
            }))
        }
    }

    fn pipeline(fail_at: Option<StageName>) -> (Pipeline, Rc<RefCell<Vec<StageName>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let stages: Vec<Box<dyn Stage>> = StageName::ALL
            .iter()
            .map(|&name| {
                Box::new(Recording {
                    name,
                    fail: fail_at == Some(name),
                    calls: Rc::clone(&calls),
                }) as Box<dyn Stage>
            })
            .collect();
        (Pipeline::with_stages(PipelineConfig::default(), stages), calls)
    }

    #[test]
    fn test_run_all_in_order() {
        let (pipeline, calls) = pipeline(None);
        let run = pipeline.run_all();

        assert!(run.succeeded());
        assert_eq!(run.stages.len(), 3);
        assert_eq!(*calls.borrow(), StageName::ALL.to_vec());
    }

    #[test]
    fn test_failure_stops_later_stages() {
        let (pipeline, calls) = pipeline(Some(StageName::Transform));
        let run = pipeline.run_all();

        let failure = run.failure.expect("run should fail");
        assert_eq!(failure.stage, StageName::Transform);
        assert_eq!(failure.kind, ErrorKind::SchemaValidation);
        assert_eq!(*calls.borrow(), vec![StageName::Clean, StageName::Transform]);
        assert_eq!(run.stages.len(), 1);
    }

    #[test]
    fn test_run_single_stage() {
        let (pipeline, calls) = pipeline(None);
        let report = pipeline.run_stage(StageName::Load).unwrap();

        assert_eq!(report.stage(), StageName::Load);
        assert_eq!(*calls.borrow(), vec![StageName::Load]);
    }

    #[test]
    fn test_unknown_stage() {
        let pipeline = Pipeline::with_stages(PipelineConfig::default(), vec![Box::new(Cleaner)]);
        assert!(matches!(
            pipeline.run_stage(StageName::Load),
            Err(PipelineError::UnknownStage(StageName::Load))
        ));
    }
}

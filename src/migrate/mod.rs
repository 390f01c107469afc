//! Migration pipeline: precheck -> build & publish -> data sync -> deploy
//!
//! Steps run strictly in order. A build failure ends the run before data
//! sync and deployment; a dump failure is recorded as a warning and the run
//! continues to deployment.

pub mod build;
pub mod data_sync;
pub mod deploy;
pub mod orchestrator;
pub mod run;

pub use data_sync::{DbType, DUMP_FILE};
pub use deploy::DeploymentOutcome;
pub use orchestrator::{MigrationFailure, MigrationRequest, Migrator};
pub use run::{PipelineRun, RunState, StepRecord, StepStatus};

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Precheck,
    Build,
    DataSync,
    Deploy,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Precheck => "precheck",
            Step::Build => "build",
            Step::DataSync => "data-sync",
            Step::Deploy => "deploy",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use super::{DbType, DeploymentOutcome, Step};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum RunState {
    Created,
    Running { step: Step },
    Succeeded,
    Failed { step: Step, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum StepStatus {
    Completed,
    Skipped { reason: String },
    Warned { message: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: Step,
    #[serde(flatten)]
    pub status: StepStatus,
    pub elapsed_ms: u64,
}

/// One invocation of `migrate`. Held in memory only.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub image_ref: String,
    pub db_type: DbType,
    pub vps_target: Option<String>,
    pub force: bool,
    pub state: RunState,
    pub steps: Vec<StepRecord>,
    pub warnings: Vec<String>,
    pub deployment: Option<DeploymentOutcome>,
    pub dump_file: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PipelineRun {
    pub fn new(
        image_ref: impl Into<String>,
        db_type: DbType,
        vps_target: Option<String>,
        force: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            image_ref: image_ref.into(),
            db_type,
            vps_target,
            force,
            state: RunState::Created,
            steps: Vec::new(),
            warnings: Vec::new(),
            deployment: None,
            dump_file: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn begin(&mut self, step: Step) {
        self.state = RunState::Running { step };
    }

    pub fn complete(&mut self, step: Step, elapsed: Duration) {
        self.record(step, StepStatus::Completed, elapsed);
    }

    pub fn skip(&mut self, step: Step, reason: impl Into<String>) {
        self.record(
            step,
            StepStatus::Skipped {
                reason: reason.into(),
            },
            Duration::ZERO,
        );
    }

    /// Records a non-fatal failure; the run keeps going
    pub fn warn(&mut self, step: Step, message: impl Into<String>, elapsed: Duration) {
        let message = message.into();
        self.warnings.push(message.clone());
        self.record(step, StepStatus::Warned { message }, elapsed);
    }

    /// Terminal: no further step may run after this
    pub fn fail(&mut self, step: Step, error: impl Into<String>, elapsed: Duration) {
        let error = error.into();
        self.record(
            step,
            StepStatus::Failed {
                error: error.clone(),
            },
            elapsed,
        );
        self.state = RunState::Failed { step, error };
        self.finished_at = Some(Utc::now());
    }

    pub fn succeed(&mut self) {
        if !self.is_finished() {
            self.state = RunState::Succeeded;
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, RunState::Succeeded | RunState::Failed { .. })
    }

    pub fn succeeded(&self) -> bool {
        self.state == RunState::Succeeded
    }

    /// Status recorded for `step`, if it was reached
    pub fn status_of(&self, step: Step) -> Option<&StepStatus> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.status)
    }

    fn record(&mut self, step: Step, status: StepStatus, elapsed: Duration) {
        self.steps.push(StepRecord {
            step,
            status,
            elapsed_ms: elapsed.as_millis() as u64,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_is_created() {
        let run = PipelineRun::new("shop:1", DbType::None, None, false);
        assert_eq!(run.state, RunState::Created);
        assert!(run.steps.is_empty());
        assert!(run.finished_at.is_none());
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut run = PipelineRun::new("shop:1", DbType::None, None, false);
        run.begin(Step::Build);
        run.fail(Step::Build, "exit 1", Duration::from_millis(5));
        run.succeed();

        assert!(matches!(run.state, RunState::Failed { step: Step::Build, .. }));
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_warnings_are_collected() {
        let mut run = PipelineRun::new("shop:1", DbType::Postgres, None, false);
        run.warn(Step::DataSync, "pg_dump not found", Duration::ZERO);
        run.succeed();

        assert!(run.succeeded());
        assert_eq!(run.warnings, vec!["pg_dump not found".to_string()]);
        assert!(matches!(
            run.status_of(Step::DataSync),
            Some(StepStatus::Warned { .. })
        ));
    }

    #[test]
    fn test_serializes_state_tag() {
        let mut run = PipelineRun::new("shop:1", DbType::None, None, false);
        run.skip(Step::DataSync, "no database selected");
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["state"]["state"], "created");
        assert_eq!(json["steps"][0]["status"], "skipped");
        assert_eq!(json["steps"][0]["step"], "data-sync");
    }
}

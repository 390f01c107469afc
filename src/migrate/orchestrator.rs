use super::build::{build_and_publish, validate_image_ref};
use super::data_sync::{dump_database, DbType};
use super::deploy::select_and_deploy;
use super::run::PipelineRun;
use super::Step;
use crate::artifacts::presence_in;
use crate::config::DockhandConfig;
use crate::error::DockhandError;
use crate::exec::ProcessRunner;
use crate::fs::FileSystem;
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::prompt::{answer_or, PromptProvider};
use crate::stack::templates::{BUILD_RECIPE_FILE, RUN_MANIFEST_FILE};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct MigrationRequest {
    pub image_ref: String,
    pub db_type: DbType,
    /// Overrides `DOCKHAND_DB_NAME`
    pub db_name: Option<String>,
    pub vps_target: Option<String>,
    /// Directory holding the artifacts; build context and dump location
    pub work_dir: PathBuf,
    /// Skip the pre-flight confirmation
    pub force: bool,
}

/// A run that ended in `Failed`, with the error that ended it
#[derive(Debug, Error)]
#[error("{error}")]
pub struct MigrationFailure {
    pub run: Box<PipelineRun>,
    #[source]
    pub error: DockhandError,
}

pub struct Migrator<'a> {
    fs: &'a dyn FileSystem,
    runner: &'a dyn ProcessRunner,
    prompt: &'a dyn PromptProvider,
    config: &'a DockhandConfig,
    progress: Option<&'a dyn ProgressHandler>,
}

impl<'a> Migrator<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        runner: &'a dyn ProcessRunner,
        prompt: &'a dyn PromptProvider,
        config: &'a DockhandConfig,
    ) -> Self {
        Self {
            fs,
            runner,
            prompt,
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, handler: &'a dyn ProgressHandler) -> Self {
        self.progress = Some(handler);
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = self.progress {
            handler.on_progress(&event);
        }
    }

    /// Runs every step in order and returns the finished run.
    ///
    /// # Errors
    ///
    /// `MigrationFailure` when precheck, build or local deployment fails. A
    /// dump failure only adds a warning to the returned run.
    pub fn run(&self, request: &MigrationRequest) -> Result<PipelineRun, MigrationFailure> {
        let started = Instant::now();
        let mut run = PipelineRun::new(
            request.image_ref.clone(),
            request.db_type,
            request.vps_target.clone(),
            request.force,
        );
        self.emit(ProgressEvent::Started {
            run_id: run.id,
            image_ref: run.image_ref.clone(),
        });

        self.step(&mut run, Step::Precheck, |_| self.precheck(request))?;
        self.step(&mut run, Step::Build, |_| {
            build_and_publish(
                self.runner,
                self.config,
                &request.image_ref,
                &request.work_dir,
            )
        })?;
        self.data_sync(&mut run, request);
        self.step(&mut run, Step::Deploy, |run| {
            let outcome = select_and_deploy(
                self.runner,
                self.config,
                &request.image_ref,
                request.vps_target.as_deref(),
                &request.work_dir,
            )?;
            run.deployment = Some(outcome);
            Ok(())
        })?;

        run.succeed();
        info!(run = %run.id, warnings = run.warnings.len(), "Migration finished");
        self.emit(ProgressEvent::Completed {
            total_time: started.elapsed(),
            warnings: run.warnings.len(),
        });
        Ok(run)
    }

    /// Runs a fatal step; on error the run is failed and handed back
    fn step<F>(&self, run: &mut PipelineRun, step: Step, body: F) -> Result<(), MigrationFailure>
    where
        F: FnOnce(&mut PipelineRun) -> Result<(), DockhandError>,
    {
        run.begin(step);
        self.emit(ProgressEvent::StepStarted { step });
        let started = Instant::now();

        match body(run) {
            Ok(()) => {
                run.complete(step, started.elapsed());
                self.emit(ProgressEvent::StepCompleted {
                    step,
                    elapsed: started.elapsed(),
                });
                Ok(())
            }
            Err(error) => {
                run.fail(step, error.to_string(), started.elapsed());
                self.emit(ProgressEvent::StepFailed {
                    step,
                    error: error.to_string(),
                });
                Err(MigrationFailure {
                    run: Box::new(run.clone()),
                    error,
                })
            }
        }
    }

    fn precheck(&self, request: &MigrationRequest) -> Result<(), DockhandError> {
        validate_image_ref(&request.image_ref)?;
        self.config.validate()?;

        let presence = presence_in(self.fs, &request.work_dir);
        if !presence.both() {
            let mut missing = Vec::new();
            if !presence.build_recipe {
                missing.push(BUILD_RECIPE_FILE);
            }
            if !presence.run_manifest {
                missing.push(RUN_MANIFEST_FILE);
            }
            return Err(DockhandError::MissingPrerequisite {
                what: format!(
                    "{} not found in {}",
                    missing.join(" and "),
                    request.work_dir.display()
                ),
                hint: Some(format!(
                    "Generate them first: dockhand generate --output {}",
                    request.work_dir.display()
                )),
            });
        }

        if request.force {
            debug!("Pre-flight confirmation skipped (--force)");
            return Ok(());
        }

        let target = request
            .vps_target
            .as_deref()
            .map(|host| format!("instructions for {}", host))
            .unwrap_or_else(|| "a local staging deployment".to_string());
        let question = format!(
            "Build and push {} for {}, then prepare {}?",
            request.image_ref,
            self.config.platform_arg(),
            target
        );
        if answer_or(self.prompt.confirm(&question, true), true)? {
            Ok(())
        } else {
            Err(DockhandError::Cancelled {
                what: "migration not started".to_string(),
            })
        }
    }

    /// Non-fatal: failures become warnings and the run continues
    fn data_sync(&self, run: &mut PipelineRun, request: &MigrationRequest) {
        let step = Step::DataSync;
        if request.db_type == DbType::None {
            let reason = "no database selected";
            run.skip(step, reason);
            self.emit(ProgressEvent::StepSkipped {
                step,
                reason: reason.to_string(),
            });
            return;
        }

        run.begin(step);
        self.emit(ProgressEvent::StepStarted { step });
        let started = Instant::now();

        let result = self
            .database_name(request)
            .and_then(|name| dump_database(self.runner, request.db_type, &name, &request.work_dir));

        match result {
            Ok(path) => {
                run.dump_file = Some(path);
                run.complete(step, started.elapsed());
                self.emit(ProgressEvent::StepCompleted {
                    step,
                    elapsed: started.elapsed(),
                });
            }
            Err(error) => {
                let message = match error.remediation() {
                    Some(hint) => format!("{}. {}", error, hint),
                    None => error.to_string(),
                };
                run.warn(step, message.clone(), started.elapsed());
                self.emit(ProgressEvent::StepWarned { step, message });
            }
        }
    }

    fn database_name(&self, request: &MigrationRequest) -> Result<String, DockhandError> {
        let tool = request.db_type.dump_tool().unwrap_or("none").to_string();
        let name = match request.db_name.as_ref().or(self.config.db_name.as_ref()) {
            Some(name) => name.clone(),
            None => self
                .prompt
                .input("Name of the database to dump", None)
                .map_err(|e| DockhandError::DumpFailure {
                    tool: tool.clone(),
                    reason: e.to_string(),
                })?,
        };

        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(DockhandError::DumpFailure {
                tool,
                reason: "no database name given".to_string(),
            });
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{ScriptedProcessRunner, ScriptedResponse};
    use crate::fs::MockFileSystem;
    use crate::migrate::{RunState, StepStatus};
    use crate::prompt::{Answer, ScriptedPrompt};

    fn project() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("shop/Dockerfile", "FROM node:20\n");
        fs.add_file("shop/docker-compose.yml", "services: {}\n");
        fs
    }

    fn request() -> MigrationRequest {
        MigrationRequest {
            image_ref: "registry.example.com/shop:1.4.0".to_string(),
            work_dir: PathBuf::from("shop"),
            force: true,
            ..Default::default()
        }
    }

    fn config() -> DockhandConfig {
        DockhandConfig::from_lookup(|_| None)
    }

    #[test]
    fn test_missing_artifacts_halts_before_build() {
        let fs = MockFileSystem::new();
        fs.add_dir("shop");
        let runner = ScriptedProcessRunner::new();
        let prompt = ScriptedPrompt::silent();
        let cfg = config();

        let failure = Migrator::new(&fs, &runner, &prompt, &cfg)
            .run(&request())
            .unwrap_err();

        assert!(matches!(failure.error, DockhandError::MissingPrerequisite { .. }));
        assert!(matches!(failure.run.state, RunState::Failed { step: Step::Precheck, .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_declined_confirmation_cancels() {
        let fs = project();
        let runner = ScriptedProcessRunner::new();
        let prompt = ScriptedPrompt::new([Answer::Confirm(false)]);
        let cfg = config();
        let req = MigrationRequest {
            force: false,
            ..request()
        };

        let failure = Migrator::new(&fs, &runner, &prompt, &cfg)
            .run(&req)
            .unwrap_err();

        assert!(matches!(failure.error, DockhandError::Cancelled { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_empty_db_name_answer_warns() {
        let fs = project();
        let runner = ScriptedProcessRunner::new();
        let prompt = ScriptedPrompt::new([Answer::Input("  ".to_string())]);
        let cfg = config();
        let req = MigrationRequest {
            db_type: DbType::Postgres,
            ..request()
        };

        let run = Migrator::new(&fs, &runner, &prompt, &cfg).run(&req).unwrap();

        assert!(run.succeeded());
        assert_eq!(run.warnings.len(), 1);
        assert!(runner.calls_to("pg_dump").is_empty());
    }

    #[test]
    fn test_db_name_from_config() {
        let fs = project();
        let runner = ScriptedProcessRunner::new();
        let prompt = ScriptedPrompt::silent();
        let mut cfg = config();
        cfg.db_name = Some("orders".to_string());
        let req = MigrationRequest {
            db_type: DbType::Mysql,
            ..request()
        };

        let run = Migrator::new(&fs, &runner, &prompt, &cfg).run(&req).unwrap();

        assert_eq!(run.status_of(Step::DataSync), Some(&StepStatus::Completed));
        assert_eq!(runner.calls_to("mysqldump")[0].args, vec!["orders"]);
        assert_eq!(run.dump_file, Some(PathBuf::from("shop/db_dump.sql")));
    }

    #[test]
    fn test_local_deploy_failure_fails_run() {
        let fs = project();
        let runner = ScriptedProcessRunner::new()
            .then(ScriptedResponse::ok())
            .then(ScriptedResponse::exit(1, "no such service"));
        let prompt = ScriptedPrompt::silent();
        let cfg = config();

        let failure = Migrator::new(&fs, &runner, &prompt, &cfg)
            .run(&request())
            .unwrap_err();

        assert!(matches!(failure.error, DockhandError::DeployFailure { .. }));
        assert!(matches!(failure.run.state, RunState::Failed { step: Step::Deploy, .. }));
    }
}

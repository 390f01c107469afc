//! Command handlers
//!
//! Each handler wires the real capabilities (filesystem, processes, terminal
//! prompts, Docker) into a flow, prints the formatted result to stdout and
//! returns the process exit code.

use super::commands::{CliArgs, GenerateArgs, MigrateArgs, NotifyArgs, TroubleshootArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::artifacts::{ArtifactGenerator, GenerateRequest};
use crate::config::DockhandConfig;
use crate::diagnose::{DockerRuntime, Inspector, LogPolicy};
use crate::error::DockhandError;
use crate::exec::SystemProcessRunner;
use crate::fs::{FileSystem, RealFileSystem};
use crate::migrate::{MigrationRequest, Migrator};
use crate::notify::{Notification, Notifier, NotifyError, WebhookNotifier};
use crate::progress::LoggingHandler;
use crate::prompt::DialoguerPrompt;
use tracing::{debug, error, info, warn};

/// Environment configuration with global CLI overrides applied
pub fn resolve_config(args: &CliArgs) -> DockhandConfig {
    let mut config = DockhandConfig::default();
    if let Some(level) = &args.log_level {
        config.log_level = level.to_lowercase();
    }
    if args.non_interactive {
        config.interactive = false;
    }
    config
}

/// Logs the error, prints it with its remediation and returns its exit code
pub fn report_error(err: &DockhandError) -> i32 {
    let code = err.exit_code();
    match err {
        DockhandError::OverwriteDeclined { .. }
        | DockhandError::Cancelled { .. }
        | DockhandError::NoSelection => warn!("{}", err),
        _ => error!("{}", err),
    }

    eprintln!("\n{}", err);
    if let Some(hint) = err.remediation() {
        eprintln!("  -> {}", hint);
    }
    code
}

fn emit(result: anyhow::Result<String>) -> i32 {
    match result {
        Ok(text) => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            0
        }
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            1
        }
    }
}

pub fn handle_generate(args: &GenerateArgs, config: &DockhandConfig) -> i32 {
    info!("Generating artifacts");
    let fs = RealFileSystem::new();
    let prompt = DialoguerPrompt::new(config.interactive);

    let request = GenerateRequest {
        project_dir: args.project_dir.clone(),
        output_dir: args.output.clone(),
        stack: args.stack,
        port: args.port.clone(),
        entrypoint: args.entrypoint.clone(),
        force: args.force,
    };
    debug!(?request, "Generate request");

    match ArtifactGenerator::new(&fs, &prompt).generate(&request) {
        Ok(outcome) => {
            let formatter = OutputFormatter::new(OutputFormat::from(args.format));
            emit(formatter.format_generate(&outcome))
        }
        Err(e) => report_error(&e),
    }
}

pub fn handle_migrate(args: &MigrateArgs, config: &DockhandConfig) -> i32 {
    if let Err(e) = config.validate() {
        return report_error(&DockhandError::Config(e));
    }

    let fs = RealFileSystem::new();
    let runner = SystemProcessRunner::new();
    let prompt = DialoguerPrompt::new(config.interactive);
    let progress = LoggingHandler;

    let request = MigrationRequest {
        image_ref: args.image.trim().to_string(),
        db_type: args.db_type,
        db_name: args.db_name.clone(),
        vps_target: args.vps.clone(),
        work_dir: args.dir.clone(),
        force: args.force,
    };
    debug!(?request, "Migration request");

    let formatter = OutputFormatter::new(OutputFormat::from(args.format));
    match Migrator::new(&fs, &runner, &prompt, config)
        .with_progress(&progress)
        .run(&request)
    {
        Ok(run) => emit(formatter.format_migration(&run)),
        Err(failure) => {
            // the failed run still shows which steps completed
            let _ = emit(formatter.format_migration(&failure.run));
            report_error(&failure.error)
        }
    }
}

pub async fn handle_troubleshoot(args: &TroubleshootArgs, config: &DockhandConfig) -> i32 {
    let runtime = match DockerRuntime::connect() {
        Ok(runtime) => runtime,
        Err(e) => {
            return report_error(&DockhandError::RuntimeUnavailable {
                reason: e.to_string(),
            })
        }
    };
    let prompt = DialoguerPrompt::new(config.interactive);

    let policy = if args.logs {
        LogPolicy::Always
    } else if args.no_logs {
        LogPolicy::Never
    } else {
        LogPolicy::Ask
    };

    match Inspector::new(&runtime, &prompt)
        .diagnose(args.container.as_deref(), policy)
        .await
    {
        Ok(report) => {
            let formatter = OutputFormatter::new(OutputFormat::from(args.format));
            emit(formatter.format_report(&report))
        }
        Err(e) => report_error(&e),
    }
}

pub async fn handle_notify(args: &NotifyArgs, config: &DockhandConfig) -> i32 {
    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => match RealFileSystem::new().read_to_string(path) {
            Ok(body) => body,
            Err(e) => {
                return report_error(&DockhandError::io(
                    format!("Cannot read {}", path.display()),
                    e,
                ))
            }
        },
        (None, None) => String::new(),
    };

    let result: Result<(), NotifyError> = async {
        let notification = Notification::new(&args.to, &args.subject, body)?;
        let notifier = WebhookNotifier::from_config(config)?;
        notifier.send(&notification).await
    }
    .await;

    match result {
        Ok(()) => {
            println!("Notification sent to {}", args.to);
            0
        }
        Err(e) => report_error(&DockhandError::Notify(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_resolve_config_applies_global_flags() {
        let args = CliArgs::parse_from([
            "dockhand",
            "--log-level",
            "DEBUG",
            "--non-interactive",
            "generate",
        ]);
        let config = resolve_config(&args);
        assert_eq!(config.log_level, "debug");
        assert!(!config.interactive);
    }

    #[test]
    fn test_report_error_returns_kind_code() {
        let err = DockhandError::ContainerNotFound {
            name: "db".to_string(),
        };
        assert_eq!(report_error(&err), 7);
    }
}

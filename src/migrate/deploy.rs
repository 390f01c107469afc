//! Staging deployment: local compose up, or instructions for a remote host

use crate::config::DockhandConfig;
use crate::error::{DockhandError, Result};
use crate::exec::{CommandSpec, OutputMode, ProcessRunner};
use crate::stack::templates::{IMAGE_VARIABLE, RUN_MANIFEST_FILE};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Directory on the remote host the instructions deploy into
const REMOTE_DIR: &str = "~/dockhand";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum DeploymentOutcome {
    /// The stack was brought up on this machine
    LocalRunning { command: String },
    /// Nothing was executed; the operator runs these on the remote host
    ManualInstructions { host: String, steps: Vec<String> },
}

/// Runs the remote branch when `vps_target` is set, otherwise the local
/// branch. Exactly one of the two ever executes.
pub fn select_and_deploy(
    runner: &dyn ProcessRunner,
    config: &DockhandConfig,
    image_ref: &str,
    vps_target: Option<&str>,
    work_dir: &Path,
) -> Result<DeploymentOutcome> {
    match vps_target.map(str::trim).filter(|t| !t.is_empty()) {
        Some(host) => Ok(manual_instructions(config, image_ref, host)),
        None => deploy_local(runner, config, image_ref, work_dir),
    }
}

/// `<compose> -f docker-compose.yml up -d` with `APP_IMAGE` set
pub fn compose_up_command(config: &DockhandConfig, image_ref: &str, work_dir: &Path) -> CommandSpec {
    let (program, leading) = match config.compose_command.split_first() {
        Some((program, rest)) => (program.as_str(), rest),
        None => ("docker", &[][..]),
    };
    CommandSpec::new(program)
        .args(leading.iter().cloned())
        .args(["-f", RUN_MANIFEST_FILE, "up", "-d"])
        .env(IMAGE_VARIABLE, image_ref)
        .current_dir(work_dir)
        .output(OutputMode::Stream)
}

pub fn deploy_local(
    runner: &dyn ProcessRunner,
    config: &DockhandConfig,
    image_ref: &str,
    work_dir: &Path,
) -> Result<DeploymentOutcome> {
    let command = compose_up_command(config, image_ref, work_dir);
    info!(image = %image_ref, "Starting local staging deployment");
    debug!(command = %command, "Running compose");

    let output = runner.run(&command).map_err(|e| DockhandError::DeployFailure {
        exit_code: None,
        output: e.to_string(),
    })?;
    if !output.success() {
        return Err(DockhandError::DeployFailure {
            exit_code: output.exit_code,
            output: output.failure_text(),
        });
    }

    info!("Staging deployment running");
    Ok(DeploymentOutcome::LocalRunning {
        command: format!("{}={} {}", IMAGE_VARIABLE, image_ref, command),
    })
}

/// Ordered commands for deploying on `host` by hand
pub fn manual_instructions(config: &DockhandConfig, image_ref: &str, host: &str) -> DeploymentOutcome {
    let identity = config
        .ssh_key
        .as_ref()
        .map(|key| format!(" -i {}", key.display()))
        .unwrap_or_default();
    let compose = config.compose_command.join(" ");

    let steps = vec![
        format!("ssh{} {} 'mkdir -p {}'", identity, host, REMOTE_DIR),
        format!("scp{} {} {}:{}/", identity, RUN_MANIFEST_FILE, host, REMOTE_DIR),
        format!("ssh{} {}", identity, host),
        format!("cd {}", REMOTE_DIR),
        format!("export {}={}", IMAGE_VARIABLE, image_ref),
        format!("docker pull {}", image_ref),
        format!("{} -f {} up -d", compose, RUN_MANIFEST_FILE),
        format!("{} -f {} ps", compose, RUN_MANIFEST_FILE),
    ];

    info!(host = %host, "Remote deployment is manual; emitting instructions");
    DeploymentOutcome::ManualInstructions {
        host: host.to_string(),
        steps,
    }
}

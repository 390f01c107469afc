//! Error taxonomy shared by every dockhand flow
//!
//! Each step converts external failures (processes, the container runtime,
//! prompts) into one of these kinds at its boundary. The CLI maps a kind to a
//! distinct process exit code and prints the remediation hint when one exists.

use crate::config::ConfigError;
use crate::prompt::PromptError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DockhandError>;

/// Exit code for command lines clap rejects (unknown flag, bad value)
pub const USAGE_EXIT_CODE: i32 = 10;

#[derive(Debug, Error)]
pub enum DockhandError {
    /// Something the flow depends on is absent (artifacts, containers)
    #[error("Missing prerequisite: {what}")]
    MissingPrerequisite { what: String, hint: Option<String> },

    /// The operator declined to overwrite existing artifacts
    #[error("Skipped: existing artifacts were not overwritten ({})", display_paths(.paths))]
    OverwriteDeclined { paths: Vec<PathBuf> },

    /// The operator answered no to a pre-flight confirmation
    #[error("Cancelled: {what}")]
    Cancelled { what: String },

    /// The image build/publish tool exited nonzero or could not be started
    #[error("Image build failed{}: {output}", exit_suffix(.exit_code))]
    BuildFailure {
        exit_code: Option<i32>,
        output: String,
    },

    /// The database dump tool failed; reported as a warning by the pipeline
    #[error("Database dump with {tool} failed: {reason}")]
    DumpFailure { tool: String, reason: String },

    /// The compose "up" command failed during a local staging deployment
    #[error("Staging deployment failed{}: {output}", exit_suffix(.exit_code))]
    DeployFailure {
        exit_code: Option<i32>,
        output: String,
    },

    #[error("Container runtime unavailable: {reason}")]
    RuntimeUnavailable { reason: String },

    #[error("No container matches '{name}'")]
    ContainerNotFound { name: String },

    #[error("No container selected")]
    NoSelection,

    #[error("Notification delivery failed: {0}")]
    Notify(String),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit code {})", code),
        None => String::new(),
    }
}

impl DockhandError {
    pub fn io(context: impl Into<String>, source: anyhow::Error) -> Self {
        DockhandError::Io {
            context: context.into(),
            source,
        }
    }

    /// Stable process exit code for scripting
    pub fn exit_code(&self) -> i32 {
        match self {
            DockhandError::Config(_) | DockhandError::Io { .. } => 1,
            DockhandError::MissingPrerequisite { .. } => 2,
            DockhandError::OverwriteDeclined { .. } | DockhandError::Cancelled { .. } => 3,
            DockhandError::BuildFailure { .. } => 4,
            DockhandError::DeployFailure { .. } => 5,
            DockhandError::RuntimeUnavailable { .. } => 6,
            DockhandError::ContainerNotFound { .. } | DockhandError::NoSelection => 7,
            DockhandError::Notify(_) => 8,
            DockhandError::Prompt(_) => 9,
            // never terminal; the pipeline downgrades it to a warning
            DockhandError::DumpFailure { .. } => 0,
        }
    }

    /// A concrete next step for the operator, when there is one
    pub fn remediation(&self) -> Option<String> {
        match self {
            DockhandError::MissingPrerequisite { hint, .. } => hint.clone(),
            DockhandError::OverwriteDeclined { .. } => {
                Some("Re-run with --force to overwrite: dockhand generate --force".to_string())
            }
            DockhandError::Cancelled { .. } => {
                Some("Re-run with --force to skip the confirmation".to_string())
            }
            DockhandError::BuildFailure { .. } => Some(
                "Check the build output above, then verify buildx and registry login: \
                 docker buildx ls && docker login"
                    .to_string(),
            ),
            DockhandError::DumpFailure { tool, .. } => Some(format!(
                "Ensure {} is installed and on PATH, then dump manually before cutover",
                tool
            )),
            DockhandError::DeployFailure { .. } => {
                Some("Inspect the staging stack: docker compose ps && docker compose logs".to_string())
            }
            DockhandError::RuntimeUnavailable { .. } => Some(
                "Start the container runtime (e.g. `sudo systemctl start docker` or Docker Desktop) and retry"
                    .to_string(),
            ),
            DockhandError::ContainerNotFound { .. } | DockhandError::NoSelection => {
                Some("List available containers: docker ps -a".to_string())
            }
            DockhandError::Prompt(PromptError::NotInteractive { .. }) => Some(
                "Pass the missing value as a flag or run from an interactive terminal".to_string(),
            ),
            DockhandError::Notify(_) => {
                Some("Check DOCKHAND_NOTIFY_WEBHOOK and that the endpoint is reachable".to_string())
            }
            _ => None,
        }
    }
}

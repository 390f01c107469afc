use super::heuristics::{self, Diagnosis, Heuristic};
use super::{ContainerRuntime, ContainerSnapshot, ContainerSummary, RuntimeError};
use crate::error::{DockhandError, Result};
use crate::prompt::{answer_or, PromptProvider};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Log lines fetched per diagnosis
pub const LOG_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPolicy {
    /// Ask the operator; fetch when no terminal is attached
    Ask,
    Always,
    Never,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub container: ContainerSnapshot,
    pub diagnoses: Vec<Diagnosis>,
    pub logs_fetched: bool,
}

impl DiagnosticReport {
    pub fn is_healthy(&self) -> bool {
        self.diagnoses.is_empty()
    }

    pub fn has(&self, code: &str) -> bool {
        self.diagnoses.iter().any(|d| d.code == code)
    }
}

pub struct Inspector<'a> {
    runtime: &'a dyn ContainerRuntime,
    prompt: &'a dyn PromptProvider,
    heuristics: Vec<Heuristic>,
}

impl<'a> Inspector<'a> {
    pub fn new(runtime: &'a dyn ContainerRuntime, prompt: &'a dyn PromptProvider) -> Self {
        Self {
            runtime,
            prompt,
            heuristics: heuristics::builtin(),
        }
    }

    /// Replaces the rule set; extend [`heuristics::builtin`] to keep the defaults
    pub fn with_heuristics(mut self, heuristics: Vec<Heuristic>) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// list -> resolve -> inspect -> logs -> heuristics, one runtime call at
    /// a time
    pub async fn diagnose(&self, target: Option<&str>, logs: LogPolicy) -> Result<DiagnosticReport> {
        self.runtime.ping().await.map_err(runtime_error)?;

        let containers = self.runtime.list_containers().await.map_err(runtime_error)?;
        if containers.is_empty() {
            return Err(DockhandError::MissingPrerequisite {
                what: "no containers exist on this host".to_string(),
                hint: Some("Start the staging stack first: dockhand migrate --image <ref>".to_string()),
            });
        }

        let chosen = self.resolve(&containers, target)?;
        info!(container = %chosen.name, id = chosen.short_id(), "Inspecting container");

        let mut snapshot = self.runtime.inspect(&chosen.id).await.map_err(|e| match e {
            RuntimeError::NotFound(_) => DockhandError::ContainerNotFound {
                name: chosen.name.clone(),
            },
            other => runtime_error(other),
        })?;

        let logs_fetched = self.fetch_logs(&mut snapshot, logs).await?;
        let diagnoses = heuristics::run_all(&snapshot, &self.heuristics);
        for diagnosis in &diagnoses {
            warn!(code = %diagnosis.code, "{}", diagnosis.finding);
        }

        Ok(DiagnosticReport {
            container: snapshot,
            diagnoses,
            logs_fetched,
        })
    }

    fn resolve<'c>(
        &self,
        containers: &'c [ContainerSummary],
        target: Option<&str>,
    ) -> Result<&'c ContainerSummary> {
        if let Some(needle) = target {
            return resolve_explicit(containers, needle);
        }

        let items: Vec<String> = containers
            .iter()
            .map(|c| format!("{} ({}) {} - {}", c.name, c.short_id(), c.image, c.status))
            .collect();
        let choice = self.prompt.select("Select a container to inspect", &items)?;
        choice
            .and_then(|idx| containers.get(idx))
            .ok_or(DockhandError::NoSelection)
    }

    async fn fetch_logs(&self, snapshot: &mut ContainerSnapshot, policy: LogPolicy) -> Result<bool> {
        let wanted = match policy {
            LogPolicy::Always => true,
            LogPolicy::Never => false,
            LogPolicy::Ask => answer_or(
                self.prompt.confirm(
                    &format!("Fetch the last {} log lines of {}?", LOG_TAIL_LINES, snapshot.name),
                    true,
                ),
                true,
            )?,
        };
        if !wanted {
            return Ok(false);
        }

        match self.runtime.log_tail(&snapshot.id, LOG_TAIL_LINES).await {
            Ok(lines) => {
                debug!(lines = lines.len(), "Fetched log tail");
                snapshot.log_tail = lines;
                Ok(true)
            }
            Err(RuntimeError::Unavailable(reason)) => {
                Err(DockhandError::RuntimeUnavailable { reason })
            }
            Err(e) => {
                warn!(error = %e, "Could not fetch logs, continuing without them");
                Ok(false)
            }
        }
    }
}

fn resolve_explicit<'c>(
    containers: &'c [ContainerSummary],
    needle: &str,
) -> Result<&'c ContainerSummary> {
    let trimmed = needle.trim().trim_start_matches('/');
    if let Some(exact) = containers
        .iter()
        .find(|c| c.id == trimmed || c.name == trimmed)
    {
        return Ok(exact);
    }

    let matches: Vec<&ContainerSummary> = containers.iter().filter(|c| c.matches(needle)).collect();
    match matches.as_slice() {
        [single] => Ok(*single),
        [] => Err(DockhandError::ContainerNotFound {
            name: needle.to_string(),
        }),
        many => {
            warn!(needle = %needle, candidates = many.len(), "Ambiguous container id prefix");
            Err(DockhandError::ContainerNotFound {
                name: format!("{} (ambiguous: {} matches)", needle, many.len()),
            })
        }
    }
}

fn runtime_error(err: RuntimeError) -> DockhandError {
    match err {
        RuntimeError::Unavailable(reason) => DockhandError::RuntimeUnavailable { reason },
        RuntimeError::NotFound(name) => DockhandError::ContainerNotFound { name },
        RuntimeError::Api(message) => {
            DockhandError::io("Container runtime request failed", anyhow::anyhow!(message))
        }
    }
}

//! Output formatting for reports
//!
//! Every command renders its result through [`OutputFormatter`]: pretty JSON,
//! YAML, or human-readable text. Logs go to stderr, so stdout only ever
//! carries the formatted report.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;

use crate::artifacts::GenerateOutcome;
use crate::diagnose::DiagnosticReport;
use crate::migrate::{DeploymentOutcome, PipelineRun, RunState, StepStatus};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_generate(&self, outcome: &GenerateOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(outcome),
            OutputFormat::Yaml => to_yaml(outcome),
            OutputFormat::Human => Ok(self.format_generate_human(outcome)),
        }
    }

    pub fn format_migration(&self, run: &PipelineRun) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(run),
            OutputFormat::Yaml => to_yaml(run),
            OutputFormat::Human => Ok(self.format_migration_human(run)),
        }
    }

    pub fn format_report(&self, report: &DiagnosticReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Yaml => to_yaml(report),
            OutputFormat::Human => Ok(self.format_report_human(report)),
        }
    }

    // Human-readable formatting methods

    fn format_generate_human(&self, outcome: &GenerateOutcome) -> String {
        let mut out = String::new();
        let profile = &outcome.profile;
        let source = match &outcome.detection {
            Some(d) => format!("detected from {}", d.marker.display()),
            None => "selected".to_string(),
        };

        let _ = writeln!(out, "Stack:      {} ({})", profile.kind(), source);
        let _ = writeln!(out, "Port:       {}", profile.port());
        if !profile.entrypoint().is_empty() {
            let _ = writeln!(out, "Entrypoint: {}", profile.entrypoint());
        }
        let _ = writeln!(out);
        for artifact in &outcome.artifacts {
            let verb = if artifact.exists { "Overwrote" } else { "Created" };
            let _ = writeln!(out, "  {} {}", verb, artifact.path.display());
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Next: dockhand migrate --image <registry>/<name>:<tag>");
        out
    }

    fn format_migration_human(&self, run: &PipelineRun) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Migration {} for {}", run.id, run.image_ref);
        let _ = writeln!(out);

        for record in &run.steps {
            let line = match &record.status {
                StepStatus::Completed => format!("✓ {}", record.step),
                StepStatus::Skipped { reason } => format!("- {} (skipped: {})", record.step, reason),
                StepStatus::Warned { message } => format!("! {}: {}", record.step, message),
                StepStatus::Failed { error } => format!("✗ {}: {}", record.step, error),
            };
            let _ = writeln!(out, "  {}", line);
        }

        if let Some(path) = &run.dump_file {
            let _ = writeln!(out);
            let _ = writeln!(out, "Database snapshot: {}", path.display());
        }

        match &run.deployment {
            Some(DeploymentOutcome::LocalRunning { command }) => {
                let _ = writeln!(out);
                let _ = writeln!(out, "Staging deployment running locally:");
                let _ = writeln!(out, "  {}", command);
                let _ = writeln!(out);
                let _ = writeln!(out, "Verify it, then switch traffic manually. To inspect:");
                let _ = writeln!(out, "  dockhand troubleshoot");
            }
            Some(DeploymentOutcome::ManualInstructions { host, steps }) => {
                let _ = writeln!(out);
                let _ = writeln!(out, "Remote deployment to {} is manual. Run:", host);
                for (i, step) in steps.iter().enumerate() {
                    let _ = writeln!(out, "  {}. {}", i + 1, step);
                }
            }
            None => {}
        }

        let _ = writeln!(out);
        match &run.state {
            RunState::Succeeded if run.warnings.is_empty() => {
                let _ = writeln!(out, "Result: succeeded");
            }
            RunState::Succeeded => {
                let _ = writeln!(
                    out,
                    "Result: succeeded with {} warning(s)",
                    run.warnings.len()
                );
            }
            RunState::Failed { step, .. } => {
                let _ = writeln!(out, "Result: failed at {}", step);
            }
            other => {
                let _ = writeln!(out, "Result: {:?}", other);
            }
        }
        if run.succeeded() {
            let _ = writeln!(
                out,
                "Notify the team: dockhand notify --to <recipient> --subject 'Staging ready' --body '{} deployed'",
                run.image_ref
            );
        }
        out
    }

    fn format_report_human(&self, report: &DiagnosticReport) -> String {
        let mut out = String::new();
        let c = &report.container;
        let _ = writeln!(out, "Container: {} ({})", c.name, &c.id[..c.id.len().min(12)]);
        let _ = writeln!(out, "Image:     {}", c.image);
        let _ = writeln!(out, "Status:    {}", c.status);
        if c.ports.is_empty() {
            let _ = writeln!(out, "Ports:     (none bound)");
        } else {
            let ports: Vec<String> = c
                .ports
                .iter()
                .map(|(container, host)| format!("{} -> {}", host, container))
                .collect();
            let _ = writeln!(out, "Ports:     {}", ports.join(", "));
        }

        if report.logs_fetched {
            let _ = writeln!(out);
            let _ = writeln!(out, "Last {} log lines:", c.log_tail.len());
            for line in &c.log_tail {
                let _ = writeln!(out, "  | {}", line);
            }
        }

        let _ = writeln!(out);
        if report.is_healthy() {
            let _ = writeln!(out, "No problems found.");
            return out;
        }
        let _ = writeln!(out, "Problems found: {}", report.diagnoses.len());
        for diagnosis in &report.diagnoses {
            let _ = writeln!(out);
            let _ = writeln!(out, "[{}] {}", diagnosis.code, diagnosis.finding);
            for remedy in &diagnosis.remedies {
                let _ = writeln!(out, "  -> {}", remedy);
            }
        }
        out
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize report to JSON")
}

fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).context("Failed to serialize report to YAML")
}

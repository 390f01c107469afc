//! Process-execution capability
//!
//! External tools (buildx, dump tools, compose) are invoked through
//! [`ProcessRunner`], which always waits for the child to exit and returns a
//! structured [`ProcessOutput`]. Tests swap in [`ScriptedProcessRunner`].

mod scripted;
mod system;

pub use scripted::{ScriptedProcessRunner, ScriptedResponse};
pub use system::SystemProcessRunner;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where the child's stdout goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OutputMode {
    /// Forward stdout/stderr live to the operator while capturing both
    Stream,
    /// Capture silently
    Capture,
    /// Redirect stdout into a file; stderr is captured. The file is only
    /// replaced when the command exits 0
    StdoutToFile(PathBuf),
}

/// A fully specified command line. Arguments are passed to the OS as-is,
/// never through a shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    pub output: OutputMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            output: OutputMode::Stream,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn output(mut self, mode: OutputMode) -> Self {
        self.output = mode;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        if let OutputMode::StdoutToFile(ref path) = self.output {
            write!(f, " > {}", path.display())?;
        }
        Ok(())
    }
}

/// Result of a finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the child was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Best text to show when the command failed: stderr, else stdout
    pub fn failure_text(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        match self.exit_code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started (usually not installed)
    #[error("Failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("I/O error while running '{program}': {reason}")]
    Io { program: String, reason: String },
}

pub trait ProcessRunner {
    /// Run to completion. A nonzero exit is NOT an error here; callers
    /// inspect `ProcessOutput::success`.
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ProcessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_display() {
        let spec = CommandSpec::new("docker")
            .args(["buildx", "build"])
            .arg("-t")
            .arg("registry.example.com/team/app:1.2.3")
            .env("APP_IMAGE", "x")
            .current_dir("/srv/app");

        assert_eq!(spec.args.len(), 4);
        assert_eq!(spec.cwd, Some(PathBuf::from("/srv/app")));
        assert_eq!(
            spec.to_string(),
            "docker buildx build -t registry.example.com/team/app:1.2.3"
        );
    }

    #[test]
    fn test_display_quotes_whitespace_and_shows_redirect() {
        let spec = CommandSpec::new("pg_dump")
            .arg("my db")
            .output(OutputMode::StdoutToFile(PathBuf::from("db_dump.sql")));
        assert_eq!(spec.to_string(), "pg_dump 'my db' > db_dump.sql");
    }

    #[test]
    fn test_failure_text_prefers_stderr() {
        let output = ProcessOutput {
            exit_code: Some(1),
            stdout: "progress".to_string(),
            stderr: "  boom \n".to_string(),
        };
        assert!(!output.success());
        assert_eq!(output.failure_text(), "boom");

        let silent = ProcessOutput {
            exit_code: Some(2),
            ..Default::default()
        };
        assert_eq!(silent.failure_text(), "exited with status 2");
    }
}

//! Container diagnostics
//!
//! Independent of the migration pipeline: everything here works from live
//! runtime state only. [`Inspector`] lists containers, resolves a target,
//! captures a [`ContainerSnapshot`] and runs the [`heuristics`] over it.

mod docker;
mod fake;
pub mod heuristics;
mod inspector;

pub use docker::DockerRuntime;
pub use fake::InMemoryRuntime;
pub use heuristics::{Diagnosis, Heuristic};
pub use inspector::{DiagnosticReport, Inspector, LogPolicy, LOG_TAIL_LINES};

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{0}")]
    Unavailable(String),

    #[error("No such container: {0}")]
    NotFound(String),

    #[error("Container runtime API error: {0}")]
    Api(String),
}

/// One row of the container listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSummary {
    pub id: String,
    /// Without the leading `/`
    pub name: String,
    pub image: String,
    /// Machine state (`running`, `exited`, ...)
    pub state: String,
    /// Human status line (`Up 2 hours`, `Exited (1) 3 minutes ago`)
    pub status: String,
}

impl ContainerSummary {
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(12)]
    }

    /// Exact id, unambiguous id prefix, or name with or without leading `/`
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim();
        !needle.is_empty()
            && (self.id == needle
                || self.id.starts_with(needle)
                || self.name == needle.trim_start_matches('/'))
    }
}

/// Inspected container state, captured once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerSnapshot {
    pub id: String,
    pub name: String,
    pub status: String,
    /// `"3000/tcp"` -> `"0.0.0.0:3000"`, only ports with a host binding
    pub ports: BTreeMap<String, String>,
    /// Every port the image or run config exposes
    pub exposed_ports: Vec<String>,
    pub image: String,
    pub restart_count: i64,
    pub exit_code: Option<i64>,
    pub oom_killed: bool,
    pub log_tail: Vec<String>,
}

impl ContainerSnapshot {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }

    pub fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            state: self.status.clone(),
            status: self.status.clone(),
        }
    }
}

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Fails with `Unavailable` when the daemon cannot be reached
    async fn ping(&self) -> Result<(), RuntimeError>;

    /// All containers, stopped ones included
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError>;

    async fn inspect(&self, id: &str) -> Result<ContainerSnapshot, RuntimeError>;

    /// Last `lines` lines of combined stdout/stderr
    async fn log_tail(&self, id: &str, lines: usize) -> Result<Vec<String>, RuntimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ContainerSummary {
        ContainerSummary {
            id: "4f2a9c1e7b3d0a11".to_string(),
            name: "shop-app-1".to_string(),
            image: "shop:1".to_string(),
            state: "running".to_string(),
            status: "Up 2 hours".to_string(),
        }
    }

    #[test]
    fn test_summary_matching() {
        let s = summary();
        assert!(s.matches("4f2a9c1e7b3d0a11"));
        assert!(s.matches("4f2a"));
        assert!(s.matches("shop-app-1"));
        assert!(s.matches("/shop-app-1"));
        assert!(!s.matches("shop"));
        assert!(!s.matches(""));
        assert_eq!(s.short_id(), "4f2a9c1e7b3d");
    }
}

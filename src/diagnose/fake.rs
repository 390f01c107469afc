use super::{ContainerRuntime, ContainerSnapshot, ContainerSummary, RuntimeError};
use async_trait::async_trait;
use std::collections::HashMap;

/// Container runtime backed by a fixed set of snapshots
#[derive(Debug, Default, Clone)]
pub struct InMemoryRuntime {
    containers: Vec<ContainerSnapshot>,
    logs: HashMap<String, Vec<String>>,
    unavailable: Option<String>,
}

impl InMemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, snapshot: ContainerSnapshot) -> Self {
        self.containers.push(snapshot);
        self
    }

    pub fn with_logs(mut self, id: &str, lines: &[&str]) -> Self {
        self.logs
            .insert(id.to_string(), lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Every call fails as if the daemon were down
    pub fn unavailable(reason: &str) -> Self {
        Self {
            unavailable: Some(reason.to_string()),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), RuntimeError> {
        match &self.unavailable {
            Some(reason) => Err(RuntimeError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContainerRuntime for InMemoryRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.check()
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        self.check()?;
        Ok(self.containers.iter().map(ContainerSnapshot::summary).collect())
    }

    async fn inspect(&self, id: &str) -> Result<ContainerSnapshot, RuntimeError> {
        self.check()?;
        self.containers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(id.to_string()))
    }

    async fn log_tail(&self, id: &str, lines: usize) -> Result<Vec<String>, RuntimeError> {
        self.check()?;
        let all = self.logs.get(id).cloned().unwrap_or_default();
        let skip = all.len().saturating_sub(lines);
        Ok(all.into_iter().skip(skip).collect())
    }
}

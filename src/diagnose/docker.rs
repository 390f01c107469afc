//! Docker Engine API client

use super::{ContainerRuntime, ContainerSnapshot, ContainerSummary, RuntimeError};
use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions, LogsOptions};
use bollard::errors::Error as BollardError;
use bollard::Docker;
use futures_util::StreamExt;
use std::collections::BTreeMap;
use tracing::debug;

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Uses `DOCKER_HOST` or the platform's default socket. Does not contact
    /// the daemon; call [`ContainerRuntime::ping`] for that.
    pub fn connect() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;
        Ok(Self { docker })
    }
}

fn api_error(id: &str, err: BollardError) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::NotFound(id.to_string()),
        BollardError::DockerResponseServerError { message, .. } => RuntimeError::Api(message),
        other => RuntimeError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| api_error("", e))?;
        debug!(count = containers.len(), "Listed containers");

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                name: c
                    .names
                    .and_then(|names| names.into_iter().next())
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                state: c.state.unwrap_or_default(),
                status: c.status.unwrap_or_default(),
            })
            .collect())
    }

    async fn inspect(&self, id: &str) -> Result<ContainerSnapshot, RuntimeError> {
        let inspect = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| api_error(id, e))?;

        let state = inspect.state.unwrap_or_default();
        let status = state
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        // configured bindings survive a stop; live ones do not
        let configured = inspect.host_config.and_then(|hc| hc.port_bindings);
        let live = inspect.network_settings.and_then(|ns| ns.ports);
        let mut ports = BTreeMap::new();
        for (port, bindings) in configured.into_iter().chain(live).flatten() {
            let binding = bindings
                .unwrap_or_default()
                .into_iter()
                .find_map(|b| {
                    b.host_port.filter(|p| !p.is_empty()).map(|host_port| {
                        let ip = b.host_ip.filter(|ip| !ip.is_empty());
                        format!("{}:{}", ip.as_deref().unwrap_or("0.0.0.0"), host_port)
                    })
                });
            if let Some(binding) = binding {
                ports.entry(port).or_insert(binding);
            }
        }

        let config = inspect.config.unwrap_or_default();
        let mut exposed_ports: Vec<String> = config
            .exposed_ports
            .map(|ports| ports.into_keys().collect())
            .unwrap_or_default();
        exposed_ports.sort();

        Ok(ContainerSnapshot {
            id: inspect.id.unwrap_or_else(|| id.to_string()),
            name: inspect
                .name
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_default(),
            status,
            ports,
            exposed_ports,
            image: config.image.or(inspect.image).unwrap_or_default(),
            restart_count: inspect.restart_count.unwrap_or(0),
            exit_code: state.exit_code,
            oom_killed: state.oom_killed.unwrap_or(false),
            log_tail: Vec::new(),
        })
    }

    async fn log_tail(&self, id: &str, lines: usize) -> Result<Vec<String>, RuntimeError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: lines.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.logs(id, Some(options));
        let mut output = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| api_error(id, e))?;
            output.push_str(&chunk.to_string());
        }

        let all: Vec<String> = output.lines().map(str::to_string).collect();
        let skip = all.len().saturating_sub(lines);
        Ok(all.into_iter().skip(skip).collect())
    }
}

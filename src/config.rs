//! Configuration management for dockhand
//!
//! Settings are resolved once per invocation into a [`DockhandConfig`] value and
//! passed explicitly through every flow; nothing downstream reads the process
//! environment. CLI flags override individual fields after loading.
//!
//! # Environment Variables
//!
//! - `DOCKHAND_PLATFORMS`: comma-separated build platforms - default: "linux/amd64,linux/arm64"
//! - `DOCKHAND_BUILD_TOOL`: binary providing `buildx` - default: "docker"
//! - `DOCKHAND_COMPOSE_COMMAND`: whitespace-separated compose invocation - default: "docker compose"
//! - `DOCKHAND_DB_NAME`: database to dump when `--dbType` is set and `--db-name` is not
//! - `DOCKHAND_SSH_KEY`: identity file quoted in remote deployment instructions
//! - `DOCKHAND_NOTIFY_WEBHOOK`: endpoint receiving `{recipient, subject, body}` JSON
//! - `DOCKHAND_NOTIFY_TIMEOUT`: webhook timeout in seconds - default: "10"
//! - `DOCKHAND_LOG_LEVEL`: logging level - default: "info"
//! - `DOCKHAND_NON_INTERACTIVE`: never prompt (true|false) - default: "false"
//!
//! # Example
//!
//! ```no_run
//! use dockhand::DockhandConfig;
//!
//! let config = DockhandConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PLATFORMS: &str = "linux/amd64,linux/arm64";
const DEFAULT_BUILD_TOOL: &str = "docker";
const DEFAULT_COMPOSE_COMMAND: &str = "docker compose";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Main configuration structure for dockhand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockhandConfig {
    /// Target platforms for the multi-architecture build
    pub platforms: Vec<String>,

    /// Binary that provides the `buildx` subcommand
    pub build_tool: String,

    /// Program and leading arguments used to bring the run manifest up
    pub compose_command: Vec<String>,

    /// Database name used by the data sync step when none is given on the CLI
    pub db_name: Option<String>,

    /// SSH identity file quoted in manual remote instructions
    pub ssh_key: Option<PathBuf>,

    /// Webhook that delivers operator notifications
    pub notify_webhook: Option<String>,

    /// Webhook request timeout in seconds
    pub notify_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// When false every prompt fails fast instead of blocking
    pub interactive: bool,
}

impl Default for DockhandConfig {
    /// Loads from `DOCKHAND_*` environment variables with defaults
    fn default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

impl DockhandConfig {
    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unparseable numeric or boolean values fall back to their defaults,
    /// mirroring how unset variables behave.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let platforms = non_empty("DOCKHAND_PLATFORMS")
            .unwrap_or_else(|| DEFAULT_PLATFORMS.to_string())
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let build_tool =
            non_empty("DOCKHAND_BUILD_TOOL").unwrap_or_else(|| DEFAULT_BUILD_TOOL.to_string());

        let compose_command = non_empty("DOCKHAND_COMPOSE_COMMAND")
            .unwrap_or_else(|| DEFAULT_COMPOSE_COMMAND.to_string())
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let notify_timeout_secs = lookup("DOCKHAND_NOTIFY_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_NOTIFY_TIMEOUT_SECS);

        let log_level = non_empty("DOCKHAND_LOG_LEVEL")
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let interactive = !lookup("DOCKHAND_NON_INTERACTIVE")
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            platforms,
            build_tool,
            compose_command,
            db_name: non_empty("DOCKHAND_DB_NAME"),
            ssh_key: non_empty("DOCKHAND_SSH_KEY").map(PathBuf::from),
            notify_webhook: non_empty("DOCKHAND_NOTIFY_WEBHOOK"),
            notify_timeout_secs,
            log_level,
            interactive,
        }
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when fewer than two distinct platforms are
    /// configured, the compose command is empty, the webhook is not an
    /// http(s) URL, the timeout is out of range, or the log level is unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut distinct = self.platforms.clone();
        distinct.sort();
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(ConfigError::ValidationFailed(format!(
                "A multi-architecture build needs at least two distinct platforms, got: {}",
                self.platforms.join(",")
            )));
        }

        if self.build_tool.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Build tool cannot be empty".to_string(),
            ));
        }

        if self.compose_command.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Compose command cannot be empty".to_string(),
            ));
        }

        if let Some(ref url) = self.notify_webhook {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ParseError {
                    field: "DOCKHAND_NOTIFY_WEBHOOK".to_string(),
                    error: format!("'{}' is not an http(s) URL", url),
                });
            }
        }

        if self.notify_timeout_secs == 0 || self.notify_timeout_secs > 300 {
            return Err(ConfigError::ValidationFailed(
                "Notification timeout must be between 1 and 300 seconds".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Platforms as passed to `--platform`
    pub fn platform_arg(&self) -> String {
        self.platforms.join(",")
    }
}

impl fmt::Display for DockhandConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dockhand Configuration:")?;
        writeln!(f, "  Platforms: {}", self.platform_arg())?;
        writeln!(f, "  Build Tool: {}", self.build_tool)?;
        writeln!(f, "  Compose Command: {}", self.compose_command.join(" "))?;
        if let Some(ref db) = self.db_name {
            writeln!(f, "  Database: {}", db)?;
        }
        if let Some(ref key) = self.ssh_key {
            writeln!(f, "  SSH Key: {}", key.display())?;
        }
        writeln!(
            f,
            "  Notify Webhook: {}",
            if self.notify_webhook.is_some() { "set" } else { "not set" }
        )?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Interactive: {}", self.interactive)?;
        Ok(())
    }
}

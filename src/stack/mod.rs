//! Stack profiles: what kind of application is being containerized
//!
//! [`StackKind`] is a closed set. Each variant owns its defaults, its
//! production-mode flag and (in [`templates`]) its build recipe, so adding a
//! stack is a compile-checked change rather than another string comparison.

pub mod detection;
pub mod templates;

pub use detection::{StackDetection, StackDetector};

use crate::config::ConfigError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StackKind {
    NodePrisma,
    Python,
    React,
    Generic,
}

impl StackKind {
    pub fn name(&self) -> &'static str {
        match self {
            StackKind::NodePrisma => "node-prisma",
            StackKind::Python => "python",
            StackKind::React => "react",
            StackKind::Generic => "generic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "node-prisma" | "node" | "nodejs" => Some(StackKind::NodePrisma),
            "python" | "py" => Some(StackKind::Python),
            "react" => Some(StackKind::React),
            "generic" => Some(StackKind::Generic),
            _ => None,
        }
    }

    pub fn all_variants() -> &'static [StackKind] {
        &[
            StackKind::NodePrisma,
            StackKind::Python,
            StackKind::React,
            StackKind::Generic,
        ]
    }

    /// Human label used in selection prompts
    pub fn description(&self) -> &'static str {
        match self {
            StackKind::NodePrisma => "Node.js service with Prisma ORM",
            StackKind::Python => "Python application (requirements.txt)",
            StackKind::React => "React single-page app served by nginx",
            StackKind::Generic => "Something else (placeholder recipe)",
        }
    }

    pub fn default_port(&self) -> &'static str {
        match self {
            StackKind::NodePrisma => "3000",
            StackKind::Python => "8000",
            StackKind::React | StackKind::Generic => "8080",
        }
    }

    /// For react this is the static build output directory
    pub fn default_entrypoint(&self) -> &'static str {
        match self {
            StackKind::NodePrisma => "dist/server.js",
            StackKind::Python => "app.py",
            StackKind::React => "build",
            StackKind::Generic => "",
        }
    }

    /// The single environment flag that marks production mode
    pub fn production_env(&self) -> (&'static str, &'static str) {
        match self {
            StackKind::NodePrisma | StackKind::React => ("NODE_ENV", "production"),
            StackKind::Python | StackKind::Generic => ("APP_ENV", "production"),
        }
    }
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification plus the parameters the templates need. Built once per
/// generation run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackProfile {
    kind: StackKind,
    port: String,
    entrypoint: String,
}

impl StackProfile {
    /// Validates and builds a profile.
    ///
    /// # Errors
    ///
    /// `ConfigError::ParseError` when the port is not in 1..=65535 or the
    /// entrypoint is empty for a stack that needs one.
    pub fn new(
        kind: StackKind,
        port: impl Into<String>,
        entrypoint: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let port = port.into().trim().to_string();
        let entrypoint = entrypoint.into().trim().to_string();

        match port.parse::<u16>() {
            Ok(p) if p > 0 => {}
            _ => {
                return Err(ConfigError::ParseError {
                    field: "port".to_string(),
                    error: format!("'{}' is not a TCP port between 1 and 65535", port),
                })
            }
        }

        if entrypoint.is_empty() && kind != StackKind::Generic {
            return Err(ConfigError::ParseError {
                field: "entrypoint".to_string(),
                error: format!("the {} stack needs an entrypoint", kind),
            });
        }

        if entrypoint.contains('\n') {
            return Err(ConfigError::ParseError {
                field: "entrypoint".to_string(),
                error: "entrypoint must be a single line".to_string(),
            });
        }

        Ok(Self {
            kind,
            port,
            entrypoint,
        })
    }

    /// Profile using the stack's default port and entrypoint
    pub fn with_defaults(kind: StackKind) -> Result<Self, ConfigError> {
        Self::new(kind, kind.default_port(), kind.default_entrypoint())
    }

    pub fn kind(&self) -> StackKind {
        self.kind
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }
}

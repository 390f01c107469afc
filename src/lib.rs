//! dockhand - move a bare-metal application onto containers
//!
//! Three independent flows share one set of capabilities:
//!
//! - **generate**: [`stack`] detection, [`artifacts`] guard, then Dockerfile and
//!   docker-compose.yml rendering
//! - **migrate**: the [`migrate`] pipeline (precheck, multi-arch build and
//!   push, optional database dump, staging deployment)
//! - **troubleshoot**: [`diagnose`] inspects a live container and flags known
//!   misconfigurations
//!
//! Side effects go through traits so every branch can be driven in tests:
//! [`fs::FileSystem`], [`exec::ProcessRunner`], [`prompt::PromptProvider`]
//! and [`diagnose::ContainerRuntime`]. Settings travel as an explicit
//! [`DockhandConfig`].
//!
//! # Example
//!
//! ```no_run
//! use dockhand::artifacts::{ArtifactGenerator, GenerateRequest};
//! use dockhand::fs::RealFileSystem;
//! use dockhand::prompt::DialoguerPrompt;
//!
//! let fs = RealFileSystem::new();
//! let prompt = DialoguerPrompt::new(false);
//! let request = GenerateRequest {
//!     project_dir: ".".into(),
//!     output_dir: ".".into(),
//!     ..Default::default()
//! };
//! let outcome = ArtifactGenerator::new(&fs, &prompt).generate(&request)?;
//! println!("{} artifacts for {}", outcome.artifacts.len(), outcome.profile.kind());
//! # Ok::<(), dockhand::DockhandError>(())
//! ```

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod diagnose;
pub mod error;
pub mod exec;
pub mod fs;
pub mod migrate;
pub mod notify;
pub mod progress;
pub mod prompt;
pub mod stack;
pub mod util;

pub use config::{ConfigError, DockhandConfig};
pub use error::{DockhandError, Result};
pub use stack::{StackKind, StackProfile};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_dockhand() {
        assert_eq!(NAME, "dockhand");
    }
}

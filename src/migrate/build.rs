//! Multi-architecture image build and publish

use crate::config::{ConfigError, DockhandConfig};
use crate::error::{DockhandError, Result};
use crate::exec::{CommandSpec, OutputMode, ProcessRunner};
use std::path::Path;
use tracing::{debug, info};

/// Rejects image references the build tool would split or truncate
pub fn validate_image_ref(image_ref: &str) -> std::result::Result<(), ConfigError> {
    if image_ref.is_empty() {
        return Err(ConfigError::ParseError {
            field: "image".to_string(),
            error: "image reference cannot be empty".to_string(),
        });
    }
    if image_ref.contains(char::is_whitespace) {
        return Err(ConfigError::ParseError {
            field: "image".to_string(),
            error: format!("'{}' contains whitespace", image_ref),
        });
    }
    Ok(())
}

/// `<tool> buildx build --platform p1,p2 -t <ref> --push <context>`
pub fn build_command(config: &DockhandConfig, image_ref: &str, context: &Path) -> CommandSpec {
    CommandSpec::new(&config.build_tool)
        .args(["buildx", "build"])
        .arg("--platform")
        .arg(config.platform_arg())
        .arg("-t")
        .arg(image_ref)
        .arg("--push")
        .arg(".")
        .current_dir(context)
        .output(OutputMode::Stream)
}

/// Builds for every configured platform and pushes `image_ref`.
///
/// # Errors
///
/// `BuildFailure` when the tool cannot be started or exits nonzero; the
/// tool's error output is carried verbatim.
pub fn build_and_publish(
    runner: &dyn ProcessRunner,
    config: &DockhandConfig,
    image_ref: &str,
    context: &Path,
) -> Result<()> {
    validate_image_ref(image_ref)?;
    let command = build_command(config, image_ref, context);
    info!(image = %image_ref, platforms = %config.platform_arg(), "Building and pushing image");
    debug!(command = %command, "Running build");

    let output = runner
        .run(&command)
        .map_err(|e| DockhandError::BuildFailure {
            exit_code: None,
            output: e.to_string(),
        })?;

    if !output.success() {
        return Err(DockhandError::BuildFailure {
            exit_code: output.exit_code,
            output: output.failure_text(),
        });
    }

    info!(image = %image_ref, "Image published");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{ScriptedProcessRunner, ScriptedResponse};

    fn config() -> DockhandConfig {
        DockhandConfig::from_lookup(|_| None)
    }

    #[test]
    fn test_command_has_all_platforms_and_exact_ref() {
        let image = "registry.example.com:5000/team/shop@sha256:0123abcd";
        let cmd = build_command(&config(), image, Path::new("/srv/shop"));

        assert_eq!(cmd.program, "docker");
        assert_eq!(
            cmd.args,
            vec![
                "buildx",
                "build",
                "--platform",
                "linux/amd64,linux/arm64",
                "-t",
                image,
                "--push",
                "."
            ]
        );
        assert_eq!(cmd.cwd.as_deref(), Some(Path::new("/srv/shop")));
    }

    #[test]
    fn test_nonzero_exit_is_build_failure_with_stderr() {
        let runner = ScriptedProcessRunner::new().respond_to(
            "docker",
            ScriptedResponse::exit(1, "ERROR: failed to push: unauthorized"),
        );

        let err = build_and_publish(&runner, &config(), "shop:1", Path::new(".")).unwrap_err();
        match err {
            DockhandError::BuildFailure { exit_code, output } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(output, "ERROR: failed to push: unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_tool_is_build_failure() {
        let runner = ScriptedProcessRunner::new().respond_to("docker", ScriptedResponse::Missing);
        let err = build_and_publish(&runner, &config(), "shop:1", Path::new(".")).unwrap_err();
        assert!(matches!(err, DockhandError::BuildFailure { exit_code: None, .. }));
    }

    #[test]
    fn test_invalid_ref_never_runs_the_tool() {
        let runner = ScriptedProcessRunner::new();
        let err = build_and_publish(&runner, &config(), "shop 1", Path::new(".")).unwrap_err();
        assert!(matches!(err, DockhandError::Config(_)));
        assert!(runner.calls().is_empty());
    }
}

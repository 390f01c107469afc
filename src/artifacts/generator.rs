use super::{authorize, presence_in, Artifact, ArtifactKind, GuardDecision, ProceedReason};
use crate::error::{DockhandError, Result};
use crate::fs::FileSystem;
use crate::prompt::{answer_or, PromptProvider};
use crate::stack::templates::{render_build_recipe, render_run_manifest};
use crate::stack::{StackDetection, StackDetector, StackKind, StackProfile};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Inputs of one `generate` invocation; `None` fields are detected or asked
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub project_dir: PathBuf,
    pub output_dir: PathBuf,
    pub stack: Option<StackKind>,
    pub port: Option<String>,
    pub entrypoint: Option<String>,
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutcome {
    pub profile: StackProfile,
    /// Present when the stack came from marker files
    pub detection: Option<StackDetection>,
    pub reason: ProceedReason,
    pub artifacts: Vec<Artifact>,
}

pub struct ArtifactGenerator<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    prompt: &'a dyn PromptProvider,
}

impl<'a, F: FileSystem + ?Sized> ArtifactGenerator<'a, F> {
    pub fn new(fs: &'a F, prompt: &'a dyn PromptProvider) -> Self {
        Self { fs, prompt }
    }

    /// Detect -> guard -> write. Writes nothing unless the guard authorizes.
    pub fn generate(&self, request: &GenerateRequest) -> Result<GenerateOutcome> {
        let (kind, detection) = self.resolve_stack(request)?;
        let profile = self.resolve_profile(kind, detection.as_ref(), request)?;
        info!(stack = %profile.kind(), port = profile.port(), "Rendering artifacts");

        let artifacts = self.plan(&profile, &request.output_dir);
        let presence = presence_in(self.fs, &request.output_dir);
        let existing: Vec<PathBuf> = artifacts
            .iter()
            .filter(|a| a.exists)
            .map(|a| a.path.clone())
            .collect();

        let decision = authorize(presence, request.force, || {
            let question = format!(
                "{} already exist. Overwrite?",
                existing
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" and ")
            );
            answer_or(self.prompt.confirm(&question, false), false)
        })?;

        let reason = match decision {
            GuardDecision::Proceed(reason) => reason,
            GuardDecision::Declined => {
                warn!(paths = ?existing, "Overwrite declined, nothing written");
                return Err(DockhandError::OverwriteDeclined { paths: existing });
            }
        };

        self.write(&request.output_dir, &artifacts)?;
        Ok(GenerateOutcome {
            profile,
            detection,
            reason,
            artifacts,
        })
    }

    /// Renders both artifacts for `profile` without touching the disk
    pub fn plan(&self, profile: &StackProfile, output_dir: &Path) -> Vec<Artifact> {
        [
            (ArtifactKind::BuildRecipe, render_build_recipe(profile)),
            (ArtifactKind::RunManifest, render_run_manifest(profile)),
        ]
        .into_iter()
        .map(|(kind, content)| {
            let path = kind.path_in(output_dir);
            Artifact {
                exists: self.fs.is_file(&path),
                kind,
                path,
                content,
            }
        })
        .collect()
    }

    /// Stages every artifact as `<name>.tmp`, then moves them into place.
    /// A failed staging write leaves the existing pair untouched.
    fn write(&self, output_dir: &Path, artifacts: &[Artifact]) -> Result<()> {
        self.fs.create_dir_all(output_dir).map_err(|e| {
            DockhandError::io(format!("Cannot create {}", output_dir.display()), e)
        })?;

        let mut staged: Vec<(PathBuf, &Artifact)> = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let staging = staging_path(&artifact.path);
            if let Err(e) = self.fs.write(&staging, &artifact.content) {
                self.discard(staged.iter().map(|(p, _)| p.as_path()));
                return Err(DockhandError::io(
                    format!("Cannot write {}", artifact.path.display()),
                    e,
                ));
            }
            staged.push((staging, artifact));
        }

        let mut replaced: Vec<&Path> = Vec::with_capacity(staged.len());
        for (i, (staging, artifact)) in staged.iter().enumerate() {
            if let Err(e) = self.fs.rename(staging, &artifact.path) {
                self.discard(staged[i..].iter().map(|(p, _)| p.as_path()));
                let context = if replaced.is_empty() {
                    format!("Cannot write {}", artifact.path.display())
                } else {
                    format!(
                        "Cannot write {} ({} already updated)",
                        artifact.path.display(),
                        replaced
                            .iter()
                            .map(|p| p.display().to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                };
                return Err(DockhandError::io(context, e));
            }
            replaced.push(artifact.path.as_path());
            info!(path = %artifact.path.display(), "Wrote {}", artifact.kind.file_name());
        }
        Ok(())
    }

    fn discard<'p>(&self, paths: impl Iterator<Item = &'p Path>) {
        for path in paths {
            if let Err(e) = self.fs.remove_file(path) {
                debug!(path = %path.display(), error = %e, "Could not remove staged artifact");
            }
        }
    }

    fn resolve_stack(
        &self,
        request: &GenerateRequest,
    ) -> Result<(StackKind, Option<StackDetection>)> {
        if let Some(kind) = request.stack {
            debug!(stack = %kind, "Stack given explicitly");
            // markers of the same stack still inform the defaults
            let detection = StackDetector::new(self.fs)
                .detect(&request.project_dir)
                .filter(|d| d.kind == kind);
            return Ok((kind, detection));
        }

        if let Some(detection) = StackDetector::new(self.fs).detect(&request.project_dir) {
            info!(stack = %detection.kind, marker = %detection.marker.display(), "Detected stack");
            return Ok((detection.kind, Some(detection)));
        }

        let items: Vec<String> = StackKind::all_variants()
            .iter()
            .map(|k| format!("{:<12} {}", k.name(), k.description()))
            .collect();
        let choice = answer_or(
            self.prompt
                .select("Could not detect the stack. Which one is it?", &items),
            None,
        )?;

        let kind = choice
            .and_then(|idx| StackKind::all_variants().get(idx).copied())
            .unwrap_or(StackKind::Generic);
        info!(stack = %kind, "Stack not detected, using {}", kind);
        Ok((kind, None))
    }

    fn resolve_profile(
        &self,
        kind: StackKind,
        detection: Option<&StackDetection>,
        request: &GenerateRequest,
    ) -> Result<StackProfile> {
        let port = match &request.port {
            Some(port) => port.clone(),
            None => answer_or(
                self.prompt
                    .input("Port the application listens on", Some(kind.default_port())),
                kind.default_port().to_string(),
            )?,
        };

        let entrypoint = match &request.entrypoint {
            Some(entrypoint) => entrypoint.clone(),
            None => {
                let default = detection
                    .map(|d| d.default_entrypoint.as_str())
                    .unwrap_or_else(|| kind.default_entrypoint());
                let question = match kind {
                    StackKind::React => "Static build output directory",
                    _ => "Entrypoint (script or start command)",
                };
                answer_or(
                    self.prompt
                        .input(question, Some(default).filter(|d| !d.is_empty())),
                    default.to_string(),
                )?
            }
        };

        Ok(StackProfile::new(kind, port, entrypoint)?)
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

//! Generated artifacts and the guard that protects existing ones

pub mod generator;
pub mod guard;

pub use generator::{ArtifactGenerator, GenerateOutcome, GenerateRequest};
pub use guard::{authorize, ArtifactPresence, GuardDecision, ProceedReason};

use crate::fs::FileSystem;
use crate::stack::templates::{BUILD_RECIPE_FILE, RUN_MANIFEST_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    BuildRecipe,
    RunManifest,
}

impl ArtifactKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::BuildRecipe => BUILD_RECIPE_FILE,
            ArtifactKind::RunManifest => RUN_MANIFEST_FILE,
        }
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    #[serde(skip)]
    pub content: String,
    /// Whether a file was already on disk when the artifact was planned
    pub exists: bool,
}

/// Existence of both artifacts in `dir`
pub fn presence_in<F: FileSystem + ?Sized>(fs: &F, dir: &Path) -> ArtifactPresence {
    ArtifactPresence {
        build_recipe: fs.is_file(&ArtifactKind::BuildRecipe.path_in(dir)),
        run_manifest: fs.is_file(&ArtifactKind::RunManifest.path_in(dir)),
    }
}

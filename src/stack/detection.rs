use super::StackKind;
use crate::fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const NODE_MANIFEST: &str = "package.json";
const PYTHON_MANIFEST: &str = "requirements.txt";

/// Paths that mark a front-end entry alongside `package.json`
const FRONTEND_ENTRIES: &[&str] = &[
    "src/App.jsx",
    "src/App.tsx",
    "src/App.js",
    "src/index.jsx",
    "src/index.tsx",
    "public/index.html",
];

/// Vite keeps `index.html` at the project root next to its config
const VITE_CONFIGS: &[&str] = &["vite.config.js", "vite.config.ts", "vite.config.mjs"];

/// Where `vite build` writes unless configured otherwise
const VITE_OUTPUT_DIR: &str = "dist";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDetection {
    pub kind: StackKind,
    /// The marker that decided the classification, relative to the project
    pub marker: PathBuf,
    /// Entrypoint offered when none is given; for react the bundler's
    /// output directory
    pub default_entrypoint: String,
}

impl StackDetection {
    fn new(kind: StackKind, marker: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            marker: marker.into(),
            default_entrypoint: kind.default_entrypoint().to_string(),
        }
    }

    fn with_default_entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.default_entrypoint = entrypoint.into();
        self
    }
}

/// Classifies a project directory by marker files.
///
/// The most specific marker set is checked first (manifest plus front-end
/// entry for react), then the bare Node manifest, then the Python
/// requirements file. Read-only.
pub struct StackDetector<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
}

impl<'a, F: FileSystem + ?Sized> StackDetector<'a, F> {
    pub fn new(fs: &'a F) -> Self {
        Self { fs }
    }

    pub fn detect(&self, dir: &Path) -> Option<StackDetection> {
        let has = |rel: &str| self.fs.is_file(&dir.join(rel));

        let detection = if has(NODE_MANIFEST) {
            match self.frontend_entry(dir) {
                Some(entry) if self.has_vite_config(dir) => {
                    StackDetection::new(StackKind::React, entry)
                        .with_default_entrypoint(VITE_OUTPUT_DIR)
                }
                Some(entry) => StackDetection::new(StackKind::React, entry),
                None => StackDetection::new(StackKind::NodePrisma, NODE_MANIFEST),
            }
        } else if has(PYTHON_MANIFEST) {
            StackDetection::new(StackKind::Python, PYTHON_MANIFEST)
        } else {
            debug!(dir = %dir.display(), "No stack markers found");
            return None;
        };

        debug!(
            dir = %dir.display(),
            stack = %detection.kind,
            marker = %detection.marker.display(),
            "Stack detected"
        );
        Some(detection)
    }

    fn frontend_entry(&self, dir: &Path) -> Option<String> {
        if let Some(entry) = FRONTEND_ENTRIES
            .iter()
            .find(|rel| self.fs.is_file(&dir.join(rel)))
        {
            return Some(entry.to_string());
        }

        if self.has_vite_config(dir) && self.fs.is_file(&dir.join("index.html")) {
            return Some("index.html".to_string());
        }
        None
    }

    fn has_vite_config(&self, dir: &Path) -> bool {
        VITE_CONFIGS
            .iter()
            .any(|rel| self.fs.is_file(&dir.join(rel)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use yare::parameterized;

    fn detect(files: &[&str]) -> Option<StackDetection> {
        let fs = MockFileSystem::new();
        fs.add_dir("app");
        for file in files {
            fs.add_file(format!("app/{}", file), "");
        }
        StackDetector::new(&fs).detect(Path::new("app"))
    }

    #[parameterized(
        node_manifest = { &["package.json"], StackKind::NodePrisma, "package.json" },
        node_with_prisma = { &["package.json", "prisma/schema.prisma"], StackKind::NodePrisma, "package.json" },
        python = { &["requirements.txt", "app.py"], StackKind::Python, "requirements.txt" },
        react_jsx = { &["package.json", "src/App.jsx"], StackKind::React, "src/App.jsx" },
        react_cra = { &["package.json", "public/index.html"], StackKind::React, "public/index.html" },
        react_vite = { &["package.json", "vite.config.ts", "index.html"], StackKind::React, "index.html" },
        node_beats_python = { &["package.json", "requirements.txt"], StackKind::NodePrisma, "package.json" },
    )]
    fn test_marker_classification(files: &[&str], kind: StackKind, marker: &str) {
        let detection = detect(files).expect("stack should be detected");
        assert_eq!(detection.kind, kind);
        assert_eq!(detection.marker, PathBuf::from(marker));
    }

    #[parameterized(
        create_react_app = { &["package.json", "src/App.jsx"], "build" },
        vite_root_index = { &["package.json", "vite.config.ts", "index.html"], "dist" },
        vite_with_app_entry = { &["package.json", "vite.config.js", "index.html", "src/App.tsx"], "dist" },
        node = { &["package.json"], "dist/server.js" },
        python = { &["requirements.txt"], "app.py" },
    )]
    fn test_default_entrypoint_follows_markers(files: &[&str], expected: &str) {
        let detection = detect(files).expect("stack should be detected");
        assert_eq!(detection.default_entrypoint, expected);
    }

    #[test]
    fn test_front_end_entry_without_manifest_is_not_react() {
        assert_eq!(detect(&["src/App.jsx"]), None);
    }

    #[test]
    fn test_root_index_without_vite_is_plain_node() {
        let detection = detect(&["package.json", "index.html"]).unwrap();
        assert_eq!(detection.kind, StackKind::NodePrisma);
    }

    #[test]
    fn test_empty_directory_is_undetected() {
        assert_eq!(detect(&[]), None);
    }

    #[test]
    fn test_directory_named_like_marker_is_ignored() {
        let fs = MockFileSystem::new();
        fs.add_dir("app/package.json");
        assert_eq!(StackDetector::new(&fs).detect(Path::new("app")), None);
    }
}

use super::{FileSystem, FileType};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone)]
struct MockEntry {
    content: Option<String>,
    file_type: FileType,
}

/// In-memory FileSystem for tests.
///
/// Relative paths resolve against `root` (default `/mock`). Every successful
/// `write` is recorded so callers can assert which files were touched.
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, MockEntry>>,
    writes: RwLock<Vec<PathBuf>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            writes: RwLock::new(Vec::new()),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        if let Ok(mut files) = self.files.write() {
            if let Some(parent) = path.parent() {
                ensure_parents(&mut files, parent);
            }
            files.insert(
                path,
                MockEntry {
                    content: Some(content.to_string()),
                    file_type: FileType::File,
                },
            );
        }
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        if let Ok(mut files) = self.files.write() {
            ensure_parents(&mut files, &path);
        }
    }

    /// Paths written through `FileSystem::write`, in order
    pub fn written(&self) -> Vec<PathBuf> {
        self.writes
            .read()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn file_type(&self, path: &Path) -> Option<FileType> {
        let path = self.normalize_path(path);
        self.files
            .read()
            .ok()
            .and_then(|files| files.get(&path).map(|e| e.file_type))
    }
}

fn ensure_parents(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component);
        files.entry(current.clone()).or_insert(MockEntry {
            content: None,
            file_type: FileType::Directory,
        });
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.file_type(path).is_some()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.file_type(path) == Some(FileType::Directory)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.file_type(path) == Some(FileType::File)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = self.normalize_path(path);
        let files = self
            .files
            .read()
            .map_err(|_| anyhow!("mock filesystem lock poisoned"))?;
        let entry = files
            .get(&path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        entry
            .content
            .clone()
            .ok_or_else(|| anyhow!("Not a file: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let normalized = self.normalize_path(path);
        let parent_ok = normalized
            .parent()
            .map(|p| self.is_dir(p))
            .unwrap_or(false);
        if !parent_ok {
            return Err(anyhow!("Parent directory missing for {:?}", normalized));
        }
        if self.is_dir(&normalized) {
            return Err(anyhow!("Is a directory: {:?}", normalized));
        }

        self.add_file(&normalized, contents);
        self.writes
            .write()
            .map_err(|_| anyhow!("mock filesystem lock poisoned"))?
            .push(normalized);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = self.normalize_path(from);
        let to = self.normalize_path(to);
        if self.is_dir(&to) {
            return Err(anyhow!("Is a directory: {:?}", to));
        }
        let mut files = self
            .files
            .write()
            .map_err(|_| anyhow!("mock filesystem lock poisoned"))?;
        match files.get(&from) {
            Some(entry) if entry.file_type == FileType::File => {}
            _ => return Err(anyhow!("File not found: {:?}", from)),
        }
        if let Some(entry) = files.remove(&from) {
            files.insert(to, entry);
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        if !self.is_file(path) {
            return Err(anyhow!("File not found: {:?}", path));
        }
        let path = self.normalize_path(path);
        self.files
            .write()
            .map_err(|_| anyhow!("mock filesystem lock poisoned"))?
            .remove(&path);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        if self.is_file(path) {
            return Err(anyhow!("Not a directory: {:?}", path));
        }
        self.add_dir(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file() {
        let fs = MockFileSystem::new();
        fs.add_file("package.json", "{}");

        assert!(fs.exists(Path::new("/mock/package.json")));
        assert!(fs.is_file(Path::new("/mock/package.json")));
        assert!(fs.written().is_empty());
    }

    #[test]
    fn test_parent_directories_created() {
        let fs = MockFileSystem::new();
        fs.add_file("src/components/App.jsx", "export default null");

        assert!(fs.is_dir(Path::new("/mock/src")));
        assert!(fs.is_dir(Path::new("/mock/src/components")));
        assert!(fs.is_file(Path::new("/mock/src/components/App.jsx")));
    }

    #[test]
    fn test_write_is_recorded() {
        let fs = MockFileSystem::new();
        fs.add_dir("out");

        fs.write(Path::new("out/Dockerfile"), "FROM alpine").unwrap();

        assert_eq!(fs.written(), vec![PathBuf::from("/mock/out/Dockerfile")]);
        assert_eq!(
            fs.read_to_string(Path::new("out/Dockerfile")).unwrap(),
            "FROM alpine"
        );
    }

    #[test]
    fn test_write_requires_parent() {
        let fs = MockFileSystem::new();
        assert!(fs.write(Path::new("missing/Dockerfile"), "x").is_err());
        assert!(fs.written().is_empty());
    }

    #[test]
    fn test_rename_moves_entry() {
        let fs = MockFileSystem::new();
        fs.add_file("out/Dockerfile.tmp", "FROM alpine");
        fs.add_file("out/Dockerfile", "FROM scratch");

        fs.rename(Path::new("out/Dockerfile.tmp"), Path::new("out/Dockerfile"))
            .unwrap();

        assert!(!fs.exists(Path::new("out/Dockerfile.tmp")));
        assert_eq!(
            fs.read_to_string(Path::new("out/Dockerfile")).unwrap(),
            "FROM alpine"
        );
        assert!(fs
            .rename(Path::new("out/missing"), Path::new("out/x"))
            .is_err());
    }

    #[test]
    fn test_with_root() {
        let fs = MockFileSystem::with_root(PathBuf::from("/repo"));
        fs.add_file("requirements.txt", "flask");

        assert!(fs.exists(Path::new("/repo/requirements.txt")));
        assert_eq!(fs.root(), Path::new("/repo"));
    }
}

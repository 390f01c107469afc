//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
}

/// Abstraction over the file operations dockhand performs.
///
/// Detection only reads; artifact generation and the dump step write. Keeping
/// both behind one trait lets tests assert that a declined overwrite never
/// touches the disk.
pub trait FileSystem: Send + Sync {
    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Create or truncate a file with the given contents
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Move a file over `to`, replacing it
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete a file
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Join paths
    fn join(&self, base: &Path, path: &str) -> PathBuf {
        base.join(path)
    }
}

//! File access capability used by the loader.
//!
//! The loader only needs two operations from its host: reading a text file
//! and listing a directory. Both must report a missing path with
//! [`std::io::ErrorKind::NotFound`] so the loader can tell "absent" apart
//! from other failures.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::trace;

/// Host file operations required by [`ConfigLoader`](crate::ConfigLoader).
#[async_trait]
pub trait FileAccess: Send + Sync {
    /// Reads the whole file at `path` as UTF-8 text.
    async fn read_text_file(&self, path: &Path) -> io::Result<String>;

    /// Lists the entry names (not full paths) of the directory at `path`.
    ///
    /// Entries whose names are not valid UTF-8 are left out.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;
}

// =============================================================================
// Tokio File Access
// =============================================================================

/// [`FileAccess`] backed by the real filesystem through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileAccess;

#[async_trait]
impl FileAccess for TokioFileAccess {
    async fn read_text_file(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => trace!(name = ?raw, "Skipping non UTF-8 directory entry"),
            }
        }
        Ok(names)
    }
}

// =============================================================================
// In-Memory File Access
// =============================================================================

/// In-memory [`FileAccess`] for tests and embedding.
///
/// Directories exist implicitly for every parent of an inserted file, or
/// explicitly through [`MemoryFileAccess::add_dir`]. Every successful or
/// failed read is recorded so callers can assert on read order.
#[derive(Debug, Default)]
pub struct MemoryFileAccess {
    files: RwLock<BTreeMap<PathBuf, String>>,
    dirs: RwLock<Vec<PathBuf>>,
    reads: Mutex<Vec<PathBuf>>,
}

impl MemoryFileAccess {
    /// Creates an empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, builder style.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Adds or replaces a file.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.write().insert(path.into(), contents.into());
    }

    /// Removes a file, returning its previous contents.
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.write().remove(path.as_ref())
    }

    /// Registers an empty directory.
    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut dirs = self.dirs.write();
        if !dirs.contains(&path) {
            dirs.push(path);
        }
    }

    /// Paths passed to [`FileAccess::read_text_file`], in call order.
    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.lock().clone()
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.dirs.read().iter().any(|dir| dir == path)
            || self
                .files
                .read()
                .keys()
                .any(|file| file.ancestors().skip(1).any(|ancestor| ancestor == path))
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

#[async_trait]
impl FileAccess for MemoryFileAccess {
    async fn read_text_file(&self, path: &Path) -> io::Result<String> {
        self.reads.lock().push(path.to_path_buf());
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        if !self.dir_exists(path) {
            return Err(not_found(path));
        }

        let mut names: Vec<String> = Vec::new();
        let files = self.files.read();
        let children = files
            .keys()
            .filter_map(|file| file.strip_prefix(path).ok())
            .filter_map(|rest| rest.components().next())
            .map(|component| component.as_os_str().to_string_lossy().into_owned());
        for name in children {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_read_and_not_found() {
        let fs = MemoryFileAccess::new().with_file("/etc/app/base.json", "{}");

        assert_eq!(
            fs.read_text_file(Path::new("/etc/app/base.json")).await.unwrap(),
            "{}"
        );
        let err = fs
            .read_text_file(Path::new("/etc/app/missing.json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(fs.reads().len(), 2);
    }

    #[tokio::test]
    async fn test_memory_read_dir_lists_direct_children() {
        let fs = MemoryFileAccess::new()
            .with_file("/run/secrets/db.json", "{}")
            .with_file("/run/secrets/nested/key.json", "{}")
            .with_file("/run/other.json", "{}");

        let mut names = fs.read_dir(Path::new("/run/secrets")).await.unwrap();
        names.sort();
        assert_eq!(names, vec!["db.json".to_string(), "nested".to_string()]);

        let err = fs.read_dir(Path::new("/nowhere")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_memory_empty_dir() {
        let fs = MemoryFileAccess::new();
        fs.add_dir("/run/secrets");
        assert!(fs.read_dir(Path::new("/run/secrets")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tokio_file_access() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        std::fs::write(tmp.path().join("base.json"), r#"{"a": 1}"#).expect("write");
        std::fs::write(tmp.path().join("notes.txt"), "hello").expect("write");

        let fs = TokioFileAccess;
        let text = fs.read_text_file(&tmp.path().join("base.json")).await.unwrap();
        assert_eq!(text, r#"{"a": 1}"#);

        let mut names = fs.read_dir(tmp.path()).await.unwrap();
        names.sort();
        assert_eq!(names, vec!["base.json".to_string(), "notes.txt".to_string()]);

        let err = fs.read_dir(&tmp.path().join("absent")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tokio_read_dir_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempfile::TempDir::new().expect("tmp");
        std::fs::write(tmp.path().join("db.json"), "{}").expect("write");
        let raw = OsStr::from_bytes(b"k\xffey.json");
        std::fs::write(tmp.path().join(raw), "{}").expect("write");

        let names = TokioFileAccess.read_dir(tmp.path()).await.unwrap();
        assert_eq!(names, vec!["db.json".to_string()]);
    }
}

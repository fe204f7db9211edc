//! Artifact sinks.
//!
//! Writing is split into `stage` and `commit` so a multi-file run can put
//! every artifact in place before publishing any of them. A failed stage is
//! discarded and leaves the previous outputs untouched; a commit replaces a
//! single file atomically.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub trait ArtifactWriter: Send + Sync {
    /// Prepare `bytes` for `path` without making them visible there.
    fn stage(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Publish a staged artifact at `path`.
    fn commit(&self, path: &Path) -> io::Result<()>;

    /// Drop a staged artifact. Missing stages are ignored.
    fn discard(&self, path: &Path);

    /// Stage and commit one artifact.
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.stage(path, bytes)?;
        self.commit(path).inspect_err(|_| self.discard(path))
    }
}

/// Writes to the local filesystem, creating parent directories.
///
/// Staged bytes live in a sibling `<name>.tmp` file that is renamed into
/// place on commit.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl FsWriter {
    fn staged_path(path: &Path) -> PathBuf {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl ArtifactWriter for FsWriter {
    fn stage(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = Self::staged_path(path);
        fs::write(&tmp, bytes).inspect_err(|_| {
            let _ = fs::remove_file(&tmp);
        })
    }

    fn commit(&self, path: &Path) -> io::Result<()> {
        fs::rename(Self::staged_path(path), path)
    }

    fn discard(&self, path: &Path) {
        let tmp = Self::staged_path(path);
        if let Err(e) = fs::remove_file(&tmp) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %tmp.display(), "cannot remove staged file: {e}");
            }
        }
    }
}

type FileMap = BTreeMap<PathBuf, Vec<u8>>;

/// Keeps artifacts in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    staged: Mutex<FileMap>,
    files: Mutex<FileMap>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        lock(&self.files).get(path).cloned()
    }

    pub fn get_string(&self, path: &Path) -> Option<String> {
        self.get(path).and_then(|b| String::from_utf8(b).ok())
    }

    /// Committed paths.
    pub fn paths(&self) -> Vec<PathBuf> {
        lock(&self.files).keys().cloned().collect()
    }

    /// No committed files.
    pub fn is_empty(&self) -> bool {
        lock(&self.files).is_empty()
    }

    /// Paths staged but neither committed nor discarded.
    pub fn pending(&self) -> Vec<PathBuf> {
        lock(&self.staged).keys().cloned().collect()
    }
}

fn lock(map: &Mutex<FileMap>) -> MutexGuard<'_, FileMap> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ArtifactWriter for MemoryWriter {
    fn stage(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        lock(&self.staged).insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn commit(&self, path: &Path) -> io::Result<()> {
        let bytes = lock(&self.staged).remove(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} was never staged", path.display()),
            )
        })?;
        lock(&self.files).insert(path.to_path_buf(), bytes);
        Ok(())
    }

    fn discard(&self, path: &Path) {
        lock(&self.staged).remove(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fs_writer_creates_dirs_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/data.csv");
        FsWriter.write(&path, b"a,b\n").unwrap();
        FsWriter.write(&path, b"c,d\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"c,d\n");
        assert!(!dir.path().join("nested/out/data.csv.tmp").exists());
    }

    #[test]
    fn fs_writer_failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        // a non-empty directory at the target path makes the rename fail
        let path = dir.path().join("taken");
        fs::create_dir_all(path.join("inner")).unwrap();

        assert!(FsWriter.write(&path, b"bytes").is_err());
        assert!(path.is_dir());
        assert!(!dir.path().join("taken.tmp").exists());
    }

    #[test]
    fn fs_writer_staged_file_is_invisible_until_commit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "old").unwrap();

        FsWriter.stage(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");

        FsWriter.discard(&path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert!(!dir.path().join("data.csv.tmp").exists());

        FsWriter.stage(&path, b"new").unwrap();
        FsWriter.commit(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn memory_writer_records_files() {
        let w = MemoryWriter::new();
        assert!(w.is_empty());
        w.write(Path::new("x.html"), b"<html>").unwrap();
        assert_eq!(w.get_string(Path::new("x.html")).as_deref(), Some("<html>"));
        assert_eq!(w.paths(), vec![PathBuf::from("x.html")]);
        assert!(w.pending().is_empty());
    }

    #[test]
    fn memory_writer_commit_requires_stage() {
        let w = MemoryWriter::new();
        w.stage(Path::new("a.csv"), b"1").unwrap();
        assert!(w.is_empty());
        assert_eq!(w.pending(), vec![PathBuf::from("a.csv")]);

        w.discard(Path::new("a.csv"));
        let err = w.commit(Path::new("a.csv")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(w.is_empty());
    }
}

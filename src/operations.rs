//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that the inspector, applier and
//! rollback tracker can be unit-tested without touching the real filesystem.
//! Production code uses [`SystemFileSystemOps`]; unit tests use the
//! `mockall`-generated `MockFileSystemOps`.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction over the symlink-level filesystem calls used by sok.
///
/// Every method reports failures as [`io::Error`] so callers can tell a
/// missing path (`ErrorKind::NotFound`) apart from real failures.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` itself is a symbolic link (lstat semantics).
    ///
    /// # Errors
    ///
    /// Returns `ErrorKind::NotFound` if nothing exists at `path`, or any
    /// other error raised while reading its metadata.
    fn is_symlink(&self, path: &Path) -> io::Result<bool>;

    /// Read the target of the symbolic link at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not a symlink or cannot be read.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Create a symbolic link at `link` pointing to `original`.
    ///
    /// # Errors
    ///
    /// Returns an error if `link` already exists or its parent directory is
    /// missing or not writable.
    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()>;

    /// Remove the file, symlink or empty directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn is_symlink(&self, path: &Path) -> io::Result<bool> {
        Ok(std::fs::symlink_metadata(path)?.file_type().is_symlink())
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }

    fn symlink(&self, original: &Path, link: &Path) -> io::Result<()> {
        create_symlink(original, link)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let meta = std::fs::symlink_metadata(path)?;
        if meta.is_dir() || is_dir_symlink(path, &meta) {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        }
    }
}

/// Create a symlink at `link` pointing to `original`.
///
/// On Windows the link flavour (file or directory) follows the original; a
/// dangling original is linked as a file.
///
/// # Errors
///
/// Returns an error if `link` already exists or cannot be created.
pub fn create_symlink(original: &Path, link: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(original, link)
    }

    #[cfg(windows)]
    {
        if original.is_dir() {
            std::os::windows::fs::symlink_dir(original, link)
        } else {
            std::os::windows::fs::symlink_file(original, link)
        }
    }
}

/// Directory symlinks on Windows must be removed with `remove_dir`.
#[cfg(windows)]
fn is_dir_symlink(path: &Path, meta: &std::fs::Metadata) -> bool {
    meta.file_type().is_symlink() && path.is_dir()
}

#[cfg(not(windows))]
const fn is_dir_symlink(_path: &Path, _meta: &std::fs::Metadata) -> bool {
    false
}

#[cfg(all(test, unix))]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn is_symlink_distinguishes_links_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        let link = dir.path().join("link");
        std::fs::write(&file, "x").unwrap();
        std::os::unix::fs::symlink(&file, &link).unwrap();

        let ops = SystemFileSystemOps;
        assert!(!ops.is_symlink(&file).unwrap());
        assert!(ops.is_symlink(&link).unwrap());
    }

    #[test]
    fn is_symlink_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = SystemFileSystemOps
            .is_symlink(&dir.path().join("missing"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn dangling_symlink_is_still_a_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("nowhere"), &link).unwrap();
        assert!(SystemFileSystemOps.is_symlink(&link).unwrap());
    }

    #[test]
    fn symlink_then_read_link_returns_literal_value() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("link");
        let ops = SystemFileSystemOps;
        ops.symlink(Path::new("relative/target"), &link).unwrap();
        assert_eq!(
            ops.read_link(&link).unwrap(),
            PathBuf::from("relative/target")
        );
    }

    #[test]
    fn symlink_fails_when_parent_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("no-such-dir").join("link");
        let err = SystemFileSystemOps
            .symlink(dir.path(), &link)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn remove_deletes_link_but_not_its_target() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        let link = dir.path().join("link");
        std::fs::write(&file, "keep").unwrap();
        std::os::unix::fs::symlink(&file, &link).unwrap();

        SystemFileSystemOps.remove(&link).unwrap();
        assert!(link.symlink_metadata().is_err());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "keep");
    }

    #[test]
    fn remove_handles_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        SystemFileSystemOps.remove(&sub).unwrap();
        assert!(!sub.exists());
    }
}

//! Symlink resource.
use std::io;
use std::path::{Path, PathBuf};

use super::LinkStatus;
use crate::operations::FileSystemOps;

/// One declared symlink: `target` should be a link whose value is `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkResource {
    /// The source file/directory (what the symlink points to).
    pub source: PathBuf,
    /// The target path (where the symlink lives).
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Human-readable `target -> source` description.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    /// Classify the current state of the target.
    ///
    /// The stored link value is compared literally against the source, with
    /// no normalisation.
    ///
    /// # Errors
    ///
    /// Returns any error other than "not found" raised while reading the
    /// target's metadata or link value.
    pub fn inspect(&self, fs: &dyn FileSystemOps) -> io::Result<LinkStatus> {
        inspect(fs, &self.target, &self.source)
    }
}

/// Classify `target` against `expected` without mutating anything.
///
/// # Errors
///
/// Returns any error other than "not found" raised while reading `target`.
pub fn inspect(fs: &dyn FileSystemOps, target: &Path, expected: &Path) -> io::Result<LinkStatus> {
    match fs.is_symlink(target) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(LinkStatus::Absent),
        Err(e) => Err(e),
        Ok(false) => Ok(LinkStatus::RegularFileConflict),
        Ok(true) => {
            let actual = fs.read_link(target)?;
            if actual.as_os_str() == expected.as_os_str() {
                Ok(LinkStatus::CorrectSymlink)
            } else {
                Ok(LinkStatus::WrongTargetSymlink { actual })
            }
        }
    }
}

//! Point-in-time backups of individual files and symlinks.
//!
//! A backup root holds one directory per session, named by the session id.
//! Regular files are copied into the session directory under their base
//! name; symlinks only have their link value recorded. The session record is
//! written once, as [`metadata::METADATA_FILE`], after every entry has been
//! captured.
pub mod metadata;

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;

use crate::error::{BackupError, Failure};
use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps, create_symlink};

pub use metadata::{BackupEntry, BackupSession, generate_backup_id};

/// Creates, lists, restores and deletes backup sessions under one root.
#[derive(Debug, Clone)]
pub struct Manager {
    root: PathBuf,
}

impl Manager {
    /// Manager rooted at `root`. Nothing is created until it is needed.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.sok/backups` for the given home directory.
    #[must_use]
    pub fn default_root(home: &Path) -> PathBuf {
        home.join(".sok").join("backups")
    }

    /// The backup root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the backup root if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] if the directory cannot be created.
    pub fn ensure_root(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(&self.root).map_err(|source| BackupError::Io {
            path: self.root.clone(),
            source,
        })
    }

    /// Directory of session `id`, which must name a direct child of the root.
    fn session_dir(&self, id: &str) -> Result<PathBuf, BackupError> {
        let mut components = Path::new(id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !id.contains(['/', '\\']) => {
                Ok(self.root.join(name))
            }
            _ => Err(BackupError::InvalidId(id.to_string())),
        }
    }

    /// Capture `path` into session `session_id`.
    ///
    /// Symlinks are recorded by link value; regular files are copied with
    /// their permission bits. A session holds at most one copied file per
    /// base name.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Snapshot`] if `path` does not exist, cannot be
    /// read, or its base name is already taken in the session,
    /// [`BackupError::InvalidId`] for a malformed `session_id`, and
    /// [`BackupError::Io`] if the session directory cannot be created.
    pub fn create_backup(&self, path: &Path, session_id: &str) -> Result<BackupEntry, BackupError> {
        let snapshot = |source| BackupError::Snapshot {
            path: path.to_path_buf(),
            source,
        };
        let meta = std::fs::symlink_metadata(path).map_err(snapshot)?;

        let session_dir = self.session_dir(session_id)?;
        std::fs::create_dir_all(&session_dir).map_err(|source| BackupError::Io {
            path: session_dir.clone(),
            source,
        })?;
        let name = path.file_name().unwrap_or(path.as_os_str());
        let backup_path = session_dir.join(name);

        let symlink_target = if meta.file_type().is_symlink() {
            Some(std::fs::read_link(path).map_err(snapshot)?)
        } else {
            if name == metadata::METADATA_FILE || backup_path.symlink_metadata().is_ok() {
                return Err(snapshot(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "session {session_id} already holds a file named {}",
                        name.to_string_lossy()
                    ),
                )));
            }
            std::fs::copy(path, &backup_path).map_err(snapshot)?;
            None
        };

        Ok(BackupEntry {
            original_path: path.to_path_buf(),
            backup_path,
            is_symlink: symlink_target.is_some(),
            symlink_target,
            timestamp: Utc::now(),
            file_mode: file_mode(&meta),
        })
    }

    /// Write the session record into its session directory.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::InvalidId`], [`BackupError::Serialize`] or
    /// [`BackupError::Io`].
    pub fn save_metadata(&self, session: &BackupSession) -> Result<(), BackupError> {
        let dir = self.session_dir(&session.id)?;
        std::fs::create_dir_all(&dir).map_err(|source| BackupError::Io {
            path: dir.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(session).map_err(BackupError::Serialize)?;
        let path = dir.join(metadata::METADATA_FILE);
        std::fs::write(&path, json).map_err(|source| BackupError::Io { path, source })
    }

    /// Read the record of session `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::InvalidId`] for a malformed id,
    /// [`BackupError::NotFound`] if the record cannot be read and
    /// [`BackupError::InvalidMetadata`] if it does not parse.
    pub fn load_metadata(&self, id: &str) -> Result<BackupSession, BackupError> {
        let path = self.session_dir(id)?.join(metadata::METADATA_FILE);
        let text = std::fs::read_to_string(&path).map_err(|source| BackupError::NotFound {
            id: id.to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| BackupError::InvalidMetadata {
            id: id.to_string(),
            source,
        })
    }

    /// Every readable session, newest first.
    ///
    /// A missing root yields an empty list. Entries that are not
    /// directories, or whose record is missing or corrupt, are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] if the root exists but cannot be read.
    pub fn list_backups(&self) -> Result<Vec<BackupSession>, BackupError> {
        let dir = match std::fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(BackupError::Io {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut sessions: Vec<BackupSession> = dir
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|e| self.load_metadata(&e.file_name().to_string_lossy()).ok())
            .collect();
        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(sessions)
    }

    /// Put every entry of session `id` back where it was captured.
    ///
    /// Whatever occupies an original path is removed first (absence is
    /// fine). Every entry is attempted even when earlier ones fail.
    ///
    /// Returns the number of entries restored.
    ///
    /// # Errors
    ///
    /// Returns the [`load_metadata`](Self::load_metadata) error if the
    /// session cannot be read, or [`BackupError::Restore`] listing every
    /// entry that failed.
    pub fn restore_backup(&self, id: &str, log: &dyn Log) -> Result<usize, BackupError> {
        let session = self.load_metadata(id)?;
        let mut failures = Vec::new();
        let mut restored = 0;

        for entry in &session.entries {
            match restore_entry(entry) {
                Ok(()) => {
                    log.debug(&format!("restored {}", entry.original_path.display()));
                    restored += 1;
                }
                Err(failure) => {
                    log.debug(&failure.to_string());
                    failures.push(failure);
                }
            }
        }

        if failures.is_empty() {
            Ok(restored)
        } else {
            Err(BackupError::Restore { failures, restored })
        }
    }

    /// Remove session `id` and everything in it. Deleting an absent session
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::InvalidId`] for a malformed id and
    /// [`BackupError::Io`] if the directory exists but cannot be removed.
    pub fn delete_backup(&self, id: &str) -> Result<(), BackupError> {
        let dir = self.session_dir(id)?;
        match std::fs::remove_dir_all(&dir) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(BackupError::Io { path: dir, source: e })
            }
            _ => Ok(()),
        }
    }
}

fn restore_entry(entry: &BackupEntry) -> Result<(), Failure> {
    let path = &entry.original_path;
    match SystemFileSystemOps.remove(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => {
            return Err(Failure::new(path, "remove", e));
        }
        _ => {}
    }

    if let Some(target) = &entry.symlink_target {
        return create_symlink(target, path).map_err(|e| Failure::new(path, "restore symlink", e));
    }
    std::fs::copy(&entry.backup_path, path).map_err(|e| Failure::new(path, "restore file", e))?;
    set_file_mode(path, entry.file_mode).map_err(|e| Failure::new(path, "restore permissions", e))
}

#[cfg(unix)]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    if meta.permissions().readonly() { 0o444 } else { 0o644 }
}

#[cfg(unix)]
fn set_file_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_file_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_readonly(mode & 0o200 == 0);
    std::fs::set_permissions(path, perms)
}

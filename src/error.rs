//! Domain-specific error types for the sok engine.
//!
//! Library modules return typed errors built with [`thiserror`]; command
//! handlers at the CLI boundary convert them to [`anyhow::Error`] via `?`.
//!
//! # Error hierarchy
//!
//! ```text
//! SokError
//! ├── Config(ConfigError)     settings and declarations input
//! ├── Apply(ApplyError)       install aborted on a filesystem write
//! ├── Rollback(RollbackError) aggregated undo failures
//! └── Backup(BackupError)     snapshot, metadata and restore failures
//! ```
//!
//! Best-effort operations (rollback, restore) never stop at the first
//! problem. They collect one [`Failure`] per item and report them together
//! with the number of items that did succeed.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::tasks::Summary;

/// Top-level error type for the sok engine.
#[derive(Error, Debug)]
pub enum SokError {
    /// Settings or declarations could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An install batch was aborted.
    #[error("Apply error: {0}")]
    Apply(#[from] ApplyError),

    /// Undoing an aborted batch did not fully succeed.
    #[error("Rollback error: {0}")]
    Rollback(#[from] RollbackError),

    /// A backup operation failed.
    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),
}

/// Errors that arise while loading settings or the declarations file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The platform identifier is not one of the supported values.
    #[error("Invalid OS '{0}': must be one of linux, darwin, windows")]
    InvalidOs(String),

    /// `config set` was given a key that does not exist.
    #[error("Unknown setting '{0}'")]
    UnknownKey(String),

    /// `config set` was given a value that does not parse for its key.
    #[error("Invalid value '{value}' for setting '{key}'")]
    InvalidValue {
        /// Setting name.
        key: String,
        /// Rejected value.
        value: String,
    },

    /// Neither `HOME` nor the platform home lookup produced a directory.
    #[error("Cannot determine home directory")]
    NoHomeDir,

    /// The declarations file does not exist.
    #[error("Declarations file not found: {}", .0.display())]
    DeclarationsNotFound(PathBuf),

    /// A file contains data that cannot be parsed.
    #[error("Invalid syntax in {}: {message}", .path.display())]
    InvalidSyntax {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading or writing a settings file.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// File that could not be read or written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Settings could not be serialized.
    #[error("Cannot serialize settings: {0}")]
    Serialize(String),
}

/// One item that a best-effort operation could not process.
#[derive(Error, Debug)]
#[error("failed to {operation} {}: {source}", .path.display())]
pub struct Failure {
    /// Path the operation was acting on.
    pub path: PathBuf,
    /// Short verb phrase describing the step (e.g. `"remove"`).
    pub operation: &'static str,
    /// Underlying I/O error.
    pub source: io::Error,
}

impl Failure {
    /// Build a failure record.
    pub fn new(path: impl Into<PathBuf>, operation: &'static str, source: io::Error) -> Self {
        Self {
            path: path.into(),
            operation,
            source,
        }
    }
}

/// Install stopped at the first filesystem write that failed.
///
/// Carries the counters accumulated before the failure so the caller can
/// report partial progress alongside the rollback outcome.
#[derive(Error, Debug)]
#[error("failed to {operation} {}: {source}", .target.display())]
pub struct ApplyError {
    /// Target path whose mutation failed.
    pub target: PathBuf,
    /// Step that failed (e.g. `"create link"`).
    pub operation: &'static str,
    /// Underlying I/O error.
    pub source: io::Error,
    /// Counters for the targets processed before the failure.
    pub summary: Summary,
}

/// Rollback ran to completion but some actions could not be undone.
#[derive(Error, Debug)]
#[error("rollback completed with {} error(s): {}", .failures.len(), join_failures(.failures))]
pub struct RollbackError {
    /// Every action that could not be undone, in the order attempted.
    pub failures: Vec<Failure>,
    /// Number of actions undone successfully.
    pub reverted: usize,
}

/// Errors that arise from backup sessions.
#[derive(Error, Debug)]
pub enum BackupError {
    /// The path to snapshot is missing or unreadable.
    #[error("Cannot back up {}: {source}", .path.display())]
    Snapshot {
        /// Path that could not be captured.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A session id that is not a single plain directory name.
    #[error("Invalid backup id '{0}': must be a plain session name")]
    InvalidId(String),

    /// No metadata could be read for the session.
    #[error("Backup '{id}' not found: {source}")]
    NotFound {
        /// Session identifier.
        id: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The session metadata is not valid JSON for a session.
    #[error("Backup '{id}' has invalid metadata: {source}")]
    InvalidMetadata {
        /// Session identifier.
        id: String,
        /// Parser error.
        source: serde_json::Error,
    },

    /// An I/O error on the backup root or a session directory.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Metadata could not be serialized.
    #[error("Cannot serialize backup metadata: {0}")]
    Serialize(serde_json::Error),

    /// Restore visited every entry but some could not be restored.
    #[error("restore completed with {} error(s): {}", .failures.len(), join_failures(.failures))]
    Restore {
        /// Every entry step that failed.
        failures: Vec<Failure>,
        /// Number of entries restored successfully.
        restored: usize,
    },
}

fn join_failures(failures: &[Failure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    fn not_found() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "no such file")
    }

    // -----------------------------------------------------------------------
    // ConfigError
    // -----------------------------------------------------------------------

    #[test]
    fn config_error_invalid_os_display() {
        let e = ConfigError::InvalidOs("beos".to_string());
        assert_eq!(
            e.to_string(),
            "Invalid OS 'beos': must be one of linux, darwin, windows"
        );
    }

    #[test]
    fn config_error_invalid_value_display() {
        let e = ConfigError::InvalidValue {
            key: "verbose".to_string(),
            value: "maybe".to_string(),
        };
        assert_eq!(e.to_string(), "Invalid value 'maybe' for setting 'verbose'");
    }

    #[test]
    fn config_error_io_has_source() {
        let e = ConfigError::Io {
            path: PathBuf::from("/home/u/.sok/config.toml"),
            source: not_found(),
        };
        assert!(e.to_string().contains("/home/u/.sok/config.toml"));
        assert!(e.source().is_some());
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    #[test]
    fn failure_display_names_operation_and_path() {
        let f = Failure::new("/home/u/.bashrc", "remove", not_found());
        assert_eq!(f.to_string(), "failed to remove /home/u/.bashrc: no such file");
    }

    #[test]
    fn rollback_error_lists_every_failure() {
        let e = RollbackError {
            failures: vec![
                Failure::new("/a", "remove", not_found()),
                Failure::new("/b", "restore link", not_found()),
            ],
            reverted: 3,
        };
        let msg = e.to_string();
        assert!(msg.starts_with("rollback completed with 2 error(s): "));
        assert!(msg.contains("failed to remove /a"));
        assert!(msg.contains("failed to restore link /b"));
    }

    #[test]
    fn restore_error_lists_every_failure() {
        let e = BackupError::Restore {
            failures: vec![Failure::new("/x", "copy", not_found())],
            restored: 0,
        };
        assert_eq!(
            e.to_string(),
            "restore completed with 1 error(s): failed to copy /x: no such file"
        );
    }

    #[test]
    fn apply_error_display_names_target() {
        let e = ApplyError {
            target: PathBuf::from("/home/u/.vimrc"),
            operation: "create link",
            source: not_found(),
            summary: Summary::default(),
        };
        assert_eq!(
            e.to_string(),
            "failed to create link /home/u/.vimrc: no such file"
        );
        assert!(e.source().is_some());
    }

    // -----------------------------------------------------------------------
    // SokError conversions
    // -----------------------------------------------------------------------

    #[test]
    fn sok_error_from_config_error() {
        let e: SokError = ConfigError::NoHomeDir.into();
        assert!(e.to_string().contains("Configuration error"));
    }

    #[test]
    fn sok_error_from_backup_error() {
        let e: SokError = BackupError::NotFound {
            id: "20240101-000000.000".to_string(),
            source: not_found(),
        }
        .into();
        assert!(e.to_string().contains("Backup error"));
        assert!(e.to_string().contains("20240101-000000.000"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<SokError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<ApplyError>();
        assert_send_sync::<RollbackError>();
        assert_send_sync::<BackupError>();
    }

    #[test]
    fn errors_convert_to_anyhow() {
        let _a: anyhow::Error = ConfigError::UnknownKey("x".to_string()).into();
        let _b: anyhow::Error = RollbackError {
            failures: Vec::new(),
            reverted: 0,
        }
        .into();
    }
}

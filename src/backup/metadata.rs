//! On-disk session records.
//!
//! Each session directory holds one `metadata.json` document:
//!
//! ```json
//! {
//!   "id": "20240101-120000.123",
//!   "timestamp": "2024-01-01T12:00:00.123Z",
//!   "entries": [
//!     {
//!       "original_path": "/home/u/.vimrc",
//!       "backup_path": "/home/u/.sok/backups/20240101-120000.123/.vimrc",
//!       "is_symlink": false,
//!       "timestamp": "2024-01-01T12:00:00.123Z",
//!       "file_mode": 420
//!     }
//!   ],
//!   "command": "before upgrade"
//! }
//! ```
use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// File name of the session record inside a session directory.
pub const METADATA_FILE: &str = "metadata.json";

/// One snapshotted path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Where the path lived when it was captured.
    pub original_path: PathBuf,
    /// Where the copied content lives (unused for symlinks).
    pub backup_path: PathBuf,
    /// Whether the captured path was a symlink.
    pub is_symlink: bool,
    /// Link value, present only for symlinks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink_target: Option<PathBuf>,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
    /// Permission bits of the captured path.
    pub file_mode: u32,
}

/// One backup operation: an id, a label and its entries in capture order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSession {
    /// Session identifier, also the session directory name.
    pub id: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Captured paths in the order they were taken.
    #[serde(default)]
    pub entries: Vec<BackupEntry>,
    /// Free-text label.
    #[serde(default)]
    pub command: String,
}

impl BackupSession {
    /// Start an empty session stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now(),
            entries: Vec::new(),
            command: command.into(),
        }
    }
}

/// A millisecond-resolution session id such as `20240101-120000.123`.
///
/// Ids sort lexicographically in creation order. Two sessions created in the
/// same millisecond collide.
#[must_use]
pub fn generate_backup_id() -> String {
    Local::now().format("%Y%m%d-%H%M%S%.3f").to_string()
}

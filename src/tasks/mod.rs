//! Reconciliation of declared symlinks against the filesystem.
//!
//! [`diff`] classifies every resolved target once; [`apply`] acts on that
//! classification for install and uninstall, counting outcomes in a
//! [`Summary`].
pub mod apply;
pub mod diff;

use std::sync::Arc;

use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps};

/// Shared context for reconciliation passes.
pub struct Context {
    /// Logger for output.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (preview changes without applying).
    pub dry_run: bool,
    /// Filesystem operation abstraction (injectable for testing).
    pub fs_ops: Arc<dyn FileSystemOps>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("fs_ops", &self.fs_ops)
            .finish()
    }
}

impl Context {
    /// Creates a context backed by the real filesystem.
    #[must_use]
    pub fn new(log: Arc<dyn Log>, dry_run: bool) -> Self {
        Self {
            log,
            dry_run,
            fs_ops: Arc::new(SystemFileSystemOps),
        }
    }

    /// Replace the filesystem implementation.
    #[must_use]
    pub fn with_fs_ops(mut self, fs_ops: Arc<dyn FileSystemOps>) -> Self {
        self.fs_ops = fs_ops;
        self
    }
}

/// Counters for one install or uninstall pass.
///
/// # Examples
///
/// ```
/// use sok::tasks::Summary;
///
/// let stats = Summary { created: 2, updated: 1, already_correct: 3, conflicts: 1, ..Summary::default() };
/// assert_eq!(stats.install_line(false), "2 created, 1 updated, 3 already ok, 1 conflict");
/// assert_eq!(stats.install_line(true), "2 would create, 1 would update, 3 already ok, 1 conflict");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Links created (or that would be created).
    pub created: u32,
    /// Links repointed (or that would be repointed).
    pub updated: u32,
    /// Links removed (or that would be removed).
    pub removed: u32,
    /// Targets already pointing at their source.
    pub already_correct: u32,
    /// Targets already absent during uninstall.
    pub already_removed: u32,
    /// Targets occupied by something that is not a symlink.
    pub conflicts: u32,
    /// Symlinks left alone because they point elsewhere (uninstall).
    pub wrong_target: u32,
    /// Targets skipped because they could not be inspected.
    pub skipped: u32,
    /// Mutations that failed.
    pub failed: u32,
}

impl Summary {
    /// Total number of targets that were, or would be, changed.
    #[must_use]
    pub const fn changed(&self) -> u32 {
        self.created + self.updated + self.removed
    }

    /// Format the install summary (e.g. "2 created, 1 updated, 3 already ok").
    ///
    /// Conflict, skipped and failed counts are appended only when present.
    #[must_use]
    pub fn install_line(&self, dry_run: bool) -> String {
        let (create, update) = if dry_run {
            ("would create", "would update")
        } else {
            ("created", "updated")
        };
        let mut parts = vec![
            format!("{} {create}", self.created),
            format!("{} {update}", self.updated),
            format!("{} already ok", self.already_correct),
        ];
        if self.conflicts > 0 {
            parts.push(plural(self.conflicts, "conflict"));
        }
        self.push_tail(&mut parts);
        parts.join(", ")
    }

    /// Format the uninstall summary (e.g. "2 removed, 1 already removed").
    ///
    /// # Examples
    ///
    /// ```
    /// use sok::tasks::Summary;
    ///
    /// let stats = Summary { removed: 2, already_removed: 1, wrong_target: 1, ..Summary::default() };
    /// assert_eq!(stats.uninstall_line(false), "2 removed, 1 already removed, 1 wrong target");
    /// ```
    #[must_use]
    pub fn uninstall_line(&self, dry_run: bool) -> String {
        let remove = if dry_run { "would remove" } else { "removed" };
        let mut parts = vec![
            format!("{} {remove}", self.removed),
            format!("{} already removed", self.already_removed),
        ];
        if self.conflicts > 0 {
            parts.push(format!("{} not a symlink", self.conflicts));
        }
        if self.wrong_target > 0 {
            parts.push(format!("{} wrong target", self.wrong_target));
        }
        self.push_tail(&mut parts);
        parts.join(", ")
    }

    fn push_tail(&self, parts: &mut Vec<String>) {
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
    }
}

fn plural(n: u32, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

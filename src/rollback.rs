//! Undo log for symlink mutations.
//!
//! The applier records every mutation it performs on a [`Tracker`]. If the
//! batch aborts, [`Tracker::rollback`] replays the log in reverse so each
//! undo runs against the state its own action left behind.
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Failure, RollbackError};
use crate::logging::Log;
use crate::operations::FileSystemOps;

/// Kind of mutation recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// A new symlink was created where nothing existed.
    Created,
    /// An existing symlink was repointed.
    Updated,
    /// A symlink was removed.
    Removed,
}

/// One recorded mutation with enough prior state to invert it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackAction {
    /// What happened.
    pub kind: ActionKind,
    /// Path of the symlink.
    pub target: PathBuf,
    /// Link value written (created, updated) or removed.
    pub source: PathBuf,
    /// Link value before an update; `None` for other kinds.
    pub previous: Option<PathBuf>,
    /// Whether the target was a symlink before the action.
    pub was_symlink: bool,
}

/// Append-only log of mutations performed in one invocation.
#[derive(Debug)]
pub struct Tracker {
    actions: Vec<RollbackAction>,
    enabled: bool,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    /// Create an enabled tracker with an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            actions: Vec::new(),
            enabled: true,
        }
    }

    /// Resume recording.
    pub const fn enable(&mut self) {
        self.enabled = true;
    }

    /// Stop recording; later `track_*` calls are ignored.
    pub const fn disable(&mut self) {
        self.enabled = false;
    }

    /// Whether `track_*` calls are recorded.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn push(&mut self, action: RollbackAction) {
        if self.enabled {
            self.actions.push(action);
        }
    }

    /// Record that `target` was created pointing at `source`.
    pub fn track_created(&mut self, target: &Path, source: &Path) {
        self.push(RollbackAction {
            kind: ActionKind::Created,
            target: target.to_path_buf(),
            source: source.to_path_buf(),
            previous: None,
            was_symlink: false,
        });
    }

    /// Record that `target` was repointed from `previous` to `source`.
    ///
    /// An empty `previous` means there is nothing to restore on rollback.
    pub fn track_updated(&mut self, target: &Path, source: &Path, previous: &Path) {
        let previous = (!previous.as_os_str().is_empty()).then(|| previous.to_path_buf());
        self.push(RollbackAction {
            kind: ActionKind::Updated,
            target: target.to_path_buf(),
            source: source.to_path_buf(),
            previous,
            was_symlink: true,
        });
    }

    /// Record that the symlink at `target`, pointing at `source`, was removed.
    pub fn track_removed(&mut self, target: &Path, source: &Path) {
        self.push(RollbackAction {
            kind: ActionKind::Removed,
            target: target.to_path_buf(),
            source: source.to_path_buf(),
            previous: None,
            was_symlink: true,
        });
    }

    /// Recorded actions in execution order.
    #[must_use]
    pub fn actions(&self) -> &[RollbackAction] {
        &self.actions
    }

    /// Forget every recorded action.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Number of recorded actions.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Undo every recorded action, newest first.
    ///
    /// Keeps going after a failed step so that earlier actions are still
    /// undone. A disabled tracker does nothing.
    ///
    /// Returns the number of actions reverted.
    ///
    /// # Errors
    ///
    /// Returns [`RollbackError`] listing every step that failed.
    pub fn rollback(&self, fs: &dyn FileSystemOps, log: &dyn Log) -> Result<usize, RollbackError> {
        if !self.enabled {
            return Ok(0);
        }

        let mut failures = Vec::new();
        let mut reverted = 0;
        for action in self.actions.iter().rev() {
            match undo(action, fs) {
                Ok(()) => {
                    reverted += 1;
                    log.debug(&format!(
                        "reverted {:?} {}",
                        action.kind,
                        action.target.display()
                    ));
                }
                Err(failure) => {
                    log.warn(&failure.to_string());
                    failures.push(failure);
                }
            }
        }

        if failures.is_empty() {
            Ok(reverted)
        } else {
            Err(RollbackError { failures, reverted })
        }
    }
}

fn undo(action: &RollbackAction, fs: &dyn FileSystemOps) -> Result<(), Failure> {
    let target = &action.target;
    match action.kind {
        ActionKind::Created => remove_if_present(fs, target),
        ActionKind::Updated => {
            remove_if_present(fs, target)?;
            if let Some(previous) = &action.previous {
                fs.symlink(previous, target)
                    .map_err(|e| Failure::new(target, "restore link", e))?;
            }
            Ok(())
        }
        ActionKind::Removed => fs
            .symlink(&action.source, target)
            .map_err(|e| Failure::new(target, "recreate link", e)),
    }
}

fn remove_if_present(fs: &dyn FileSystemOps, target: &Path) -> Result<(), Failure> {
    match fs.remove(target) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(Failure::new(target, "remove", e)),
        _ => Ok(()),
    }
}

//! `sok restore list | apply <id> | delete <id>`.
use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::backup::{BackupSession, Manager};
use crate::cli::{GlobalOpts, RestoreCommand};
use crate::error::BackupError;
use crate::logging::{Log, Logger};

/// Run a `restore` subcommand.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded or the action fails.
pub fn run(global: &GlobalOpts, action: &RestoreCommand, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let manager = Manager::new(&setup.config.backup_dir);
    let dry_run = setup.config.dry_run;
    match action {
        RestoreCommand::List => list(&manager, log).map(drop),
        RestoreCommand::Apply { id } => apply(&manager, id, dry_run, log).map(drop),
        RestoreCommand::Delete { id } => delete(&manager, id, dry_run, log),
    }
}

/// One line per session: id, creation time, label and entry count.
#[must_use]
pub fn describe(session: &BackupSession) -> String {
    format!(
        "{}  {}  {}  ({} file(s))",
        session.id,
        session.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        session.command,
        session.entries.len()
    )
}

/// Log every session, newest first.
///
/// # Errors
///
/// Returns an error if the backup root exists but cannot be read.
pub fn list(manager: &Manager, log: &dyn Log) -> Result<Vec<BackupSession>> {
    let sessions = manager.list_backups()?;
    if sessions.is_empty() {
        log.info(&format!("no backups in {}", manager.root().display()));
        return Ok(sessions);
    }
    log.stage("Available backups");
    for session in &sessions {
        log.info(&describe(session));
    }
    log.info(&format!("{} backup(s)", sessions.len()));
    Ok(sessions)
}

/// Show what session `id` holds, then restore it.
///
/// Returns the number of entries restored (zero in dry-run mode).
///
/// # Errors
///
/// Returns an error if the session cannot be loaded or any entry fails to
/// restore. Every entry is attempted before the error is returned.
pub fn apply(manager: &Manager, id: &str, dry_run: bool, log: &dyn Log) -> Result<usize> {
    let session = manager.load_metadata(id)?;
    log.stage(&format!("Restoring backup {id}"));
    log.info(&describe(&session));
    for entry in &session.entries {
        let line = entry.symlink_target.as_ref().map_or_else(
            || format!("[file]    {}", entry.original_path.display()),
            |target| {
                format!(
                    "[symlink] {} -> {}",
                    entry.original_path.display(),
                    target.display()
                )
            },
        );
        if dry_run {
            log.dry_run(&format!("would restore {line}"));
        } else {
            log.info(&line);
        }
    }
    if dry_run {
        return Ok(0);
    }

    match manager.restore_backup(id, log) {
        Ok(restored) => {
            log.info(&format!("restored {restored} file(s)"));
            Ok(restored)
        }
        Err(BackupError::Restore { failures, restored }) => {
            for failure in &failures {
                log.error(&failure.to_string());
            }
            Err(BackupError::Restore { failures, restored })
                .with_context(|| format!("restoring backup {id}"))
        }
        Err(err) => Err(err).with_context(|| format!("restoring backup {id}")),
    }
}

/// Delete session `id`. An unknown id is reported but is not an error.
///
/// # Errors
///
/// Returns an error if `id` is not a plain session name, or if the session
/// directory exists but cannot be removed.
pub fn delete(manager: &Manager, id: &str, dry_run: bool, log: &dyn Log) -> Result<()> {
    match manager.load_metadata(id) {
        Ok(session) => log.info(&describe(&session)),
        Err(err @ BackupError::InvalidId(_)) => return Err(err.into()),
        Err(_) => log.info(&format!("no readable metadata for backup {id}")),
    }
    if dry_run {
        log.dry_run(&format!("would delete backup {id}"));
        return Ok(());
    }
    manager.delete_backup(id)?;
    log.info(&format!("deleted backup {id}"));
    Ok(())
}

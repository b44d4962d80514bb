//! `sok backup <path>...`.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::backup::{BackupSession, Manager, generate_backup_id};
use crate::cli::{BackupOpts, GlobalOpts};
use crate::config::expand_home;
use crate::logging::{Log, Logger};

/// Run the backup command.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded or any path cannot be
/// captured.
pub fn run(global: &GlobalOpts, opts: &BackupOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    create(&setup, &opts.paths, &opts.label, log).map(drop)
}

/// Capture every path in `paths` into one new session and persist it.
///
/// All or nothing: if any path cannot be captured, the session directory
/// is removed and no metadata is written.
///
/// # Errors
///
/// Returns an error naming the first path that could not be captured, or
/// the failure to write the session record.
pub fn create(
    setup: &CommandSetup,
    paths: &[PathBuf],
    label: &str,
    log: &dyn Log,
) -> Result<BackupSession> {
    let manager = Manager::new(&setup.config.backup_dir);
    manager.ensure_root()?;

    let mut session = BackupSession::new(generate_backup_id(), label);
    log.stage(&format!("Creating backup {}", session.id));

    for path in paths {
        let path = absolute(path, &setup.home)?;
        match manager.create_backup(&path, &session.id) {
            Ok(entry) => {
                log.info(&format!("captured {}", path.display()));
                session.entries.push(entry);
            }
            Err(err) => {
                if let Err(cleanup) = manager.delete_backup(&session.id) {
                    log.warn(&format!("could not discard partial backup: {cleanup}"));
                }
                return Err(err).context("backup aborted, nothing was saved");
            }
        }
    }

    manager.save_metadata(&session)?;
    log.info(&format!(
        "backup {} saved with {} file(s)",
        session.id,
        session.entries.len()
    ));
    Ok(session)
}

/// Expand `~/` and anchor relative paths at the current directory.
fn absolute(path: &Path, home: &Path) -> Result<PathBuf> {
    let expanded = expand_home(path, home);
    std::path::absolute(&expanded).with_context(|| format!("resolving {}", expanded.display()))
}

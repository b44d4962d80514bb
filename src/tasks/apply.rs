//! Install and uninstall passes over a classified [`Diff`].
use std::io;

use crate::error::ApplyError;
use crate::resources::LinkStatus;
use crate::resources::symlink::SymlinkResource;
use crate::rollback::Tracker;

use super::diff::Diff;
use super::{Context, Summary};

/// Create missing links and repoint wrong ones, in target-path order.
///
/// Stops at the first failed filesystem write. Every successful mutation is
/// recorded on `tracker` so the caller can undo the batch. Regular files
/// are never touched and unreadable targets are skipped. In dry-run mode
/// nothing is written and nothing is recorded.
///
/// # Errors
///
/// Returns [`ApplyError`] naming the target whose mutation failed, together
/// with the counters accumulated so far.
pub fn install(diff: &Diff, ctx: &Context, tracker: &mut Tracker) -> Result<Summary, ApplyError> {
    let mut summary = Summary::default();

    for entry in diff.entries() {
        let link = &entry.link;
        match &entry.status {
            Err(e) => {
                ctx.log.warn(&format!(
                    "skipping {}: cannot inspect: {e}",
                    link.target.display()
                ));
                summary.skipped += 1;
            }
            Ok(LinkStatus::CorrectSymlink) => {
                ctx.log.debug(&format!("ok: {}", link.description()));
                summary.already_correct += 1;
            }
            Ok(LinkStatus::RegularFileConflict) => {
                ctx.log.warn(&format!(
                    "skipping {}: a regular file exists at the target",
                    link.target.display()
                ));
                summary.conflicts += 1;
            }
            Ok(LinkStatus::Absent) => {
                if ctx.dry_run {
                    ctx.log.dry_run(&format!("would link {}", link.description()));
                } else {
                    ctx.fs_ops
                        .symlink(&link.source, &link.target)
                        .map_err(|e| abort(link, "create link", e, &mut summary))?;
                    tracker.track_created(&link.target, &link.source);
                    ctx.log.info(&format!("linked {}", link.description()));
                }
                summary.created += 1;
            }
            Ok(LinkStatus::WrongTargetSymlink { actual }) => {
                if ctx.dry_run {
                    ctx.log.dry_run(&format!(
                        "would relink {} (currently -> {})",
                        link.description(),
                        actual.display()
                    ));
                } else {
                    relink(link, actual, ctx)
                        .map_err(|(op, e)| abort(link, op, e, &mut summary))?;
                    tracker.track_updated(&link.target, &link.source, actual);
                    ctx.log.info(&format!(
                        "relinked {} (was -> {})",
                        link.description(),
                        actual.display()
                    ));
                }
                summary.updated += 1;
            }
        }
    }

    Ok(summary)
}

/// Replace the link at `link.target` (currently `previous`) with one to
/// `link.source`.
///
/// If the new link cannot be created, the old one is put back before
/// returning so that the half-finished step is not left behind.
fn relink(
    link: &SymlinkResource,
    previous: &std::path::Path,
    ctx: &Context,
) -> Result<(), (&'static str, io::Error)> {
    ctx.fs_ops
        .remove(&link.target)
        .map_err(|e| ("remove old link", e))?;
    if let Err(e) = ctx.fs_ops.symlink(&link.source, &link.target) {
        if let Err(restore) = ctx.fs_ops.symlink(previous, &link.target) {
            ctx.log.error(&format!(
                "could not restore {} -> {}: {restore}",
                link.target.display(),
                previous.display()
            ));
        }
        return Err(("create link", e));
    }
    Ok(())
}

fn abort(
    link: &SymlinkResource,
    operation: &'static str,
    source: io::Error,
    summary: &mut Summary,
) -> ApplyError {
    summary.failed += 1;
    ApplyError {
        target: link.target.clone(),
        operation,
        source,
        summary: *summary,
    }
}

/// Remove links that point at their declared source.
///
/// Absent targets count as already removed. Regular files and symlinks
/// pointing elsewhere are left in place. A failed removal is counted and the
/// pass continues; uninstall records nothing for rollback.
#[must_use]
pub fn uninstall(diff: &Diff, ctx: &Context) -> Summary {
    let mut summary = Summary::default();

    for entry in diff.entries() {
        let link = &entry.link;
        let target = link.target.display();
        match &entry.status {
            Err(e) => {
                ctx.log
                    .warn(&format!("skipping {target}: cannot inspect: {e}"));
                summary.skipped += 1;
            }
            Ok(LinkStatus::Absent) => {
                ctx.log.debug(&format!("already removed: {target}"));
                summary.already_removed += 1;
            }
            Ok(LinkStatus::RegularFileConflict) => {
                ctx.log
                    .warn(&format!("skipping {target}: not a symlink, leaving in place"));
                summary.conflicts += 1;
            }
            Ok(LinkStatus::WrongTargetSymlink { actual }) => {
                ctx.log.warn(&format!(
                    "skipping {target}: points to {}, not {}",
                    actual.display(),
                    link.source.display()
                ));
                summary.wrong_target += 1;
            }
            Ok(LinkStatus::CorrectSymlink) => {
                if ctx.dry_run {
                    ctx.log.dry_run(&format!("would remove {}", link.description()));
                    summary.removed += 1;
                } else if let Err(e) = ctx.fs_ops.remove(&link.target) {
                    ctx.log.warn(&format!("failed to remove {target}: {e}"));
                    summary.failed += 1;
                } else {
                    ctx.log.info(&format!("removed {}", link.description()));
                    summary.removed += 1;
                }
            }
        }
    }

    summary
}

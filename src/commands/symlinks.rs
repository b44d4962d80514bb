//! `sok symlinks install | uninstall | list`.
use std::sync::Arc;

use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{GlobalOpts, SymlinksCommand};
use crate::config::declarations::{self, ResolvedLinkSet};
use crate::logging::{Log, Logger};
use crate::rollback::Tracker;
use crate::tasks::diff::{self, StatusReport};
use crate::tasks::{Context, Summary, apply};

/// Run a `symlinks` subcommand.
///
/// # Errors
///
/// Returns an error if settings or declarations cannot be loaded, or if the
/// action itself fails.
pub fn run(global: &GlobalOpts, action: SymlinksCommand, log: &Arc<Logger>) -> Result<()> {
    let setup = CommandSetup::init(global, log.as_ref())?;
    let ctx = Context::new(Arc::clone(log) as Arc<dyn Log>, setup.config.dry_run);
    match action {
        SymlinksCommand::Install => install(&setup, &ctx).map(drop),
        SymlinksCommand::Uninstall => uninstall(&setup, &ctx).map(drop),
        SymlinksCommand::List => list(&setup, &ctx).map(drop),
    }
}

/// Load the declarations file and resolve it for the configured OS.
///
/// # Errors
///
/// Returns an error if the declarations file is missing or malformed.
pub fn resolve_links(setup: &CommandSetup, log: &dyn Log) -> Result<ResolvedLinkSet> {
    let path = &setup.config.symlinks_file;
    log.stage("Loading declarations");
    let decls = declarations::load(path)
        .with_context(|| format!("loading declarations from {}", path.display()))?;
    let resolved = declarations::resolve(&decls, setup.config.os(), &setup.home, log);
    log.info(&format!(
        "{} link(s) declared for {}",
        resolved.len(),
        setup.config.os()
    ));
    Ok(resolved)
}

/// Create and repoint links, rolling back every change if one fails.
///
/// # Errors
///
/// Returns an error if the declarations cannot be loaded or a mutation
/// fails. The error names the failed target and how the rollback went.
pub fn install(setup: &CommandSetup, ctx: &Context) -> Result<Summary> {
    let resolved = resolve_links(setup, ctx.log.as_ref())?;

    ctx.log.stage("Inspecting links");
    let diff = diff::inspect_all(&resolved, ctx);
    ctx.log.debug(&format!(
        "{} to create, {} to update, {} already correct",
        diff.to_create().len(),
        diff.to_update().len(),
        diff.already_correct().len()
    ));

    ctx.log.stage(if ctx.dry_run {
        "Previewing changes"
    } else {
        "Applying links"
    });
    let mut tracker = Tracker::new();
    match apply::install(&diff, ctx, &mut tracker) {
        Ok(summary) => {
            ctx.log.info(&summary.install_line(ctx.dry_run));
            Ok(summary)
        }
        Err(err) => {
            ctx.log.error(&err.to_string());
            ctx.log.info(&err.summary.install_line(false));
            let outcome = roll_back(&tracker, ctx);
            Err(anyhow::Error::new(err).context(format!("install aborted, {outcome}")))
        }
    }
}

/// Undo everything `tracker` recorded and describe the result.
fn roll_back(tracker: &Tracker, ctx: &Context) -> String {
    if tracker.is_empty() {
        return "nothing to roll back".to_string();
    }
    ctx.log.stage("Rolling back");
    match tracker.rollback(ctx.fs_ops.as_ref(), ctx.log.as_ref()) {
        Ok(reverted) => {
            ctx.log.info(&format!("reverted {reverted} change(s)"));
            format!("{reverted} change(s) rolled back")
        }
        Err(err) => {
            for failure in &err.failures {
                ctx.log.error(&format!("rollback: {failure}"));
            }
            format!(
                "rollback incomplete ({} of {} change(s) reverted)",
                err.reverted,
                tracker.len()
            )
        }
    }
}

/// Remove links that point at their declared source.
///
/// Every target is visited even when some removals fail.
///
/// # Errors
///
/// Returns an error if the declarations cannot be loaded or any removal
/// failed.
pub fn uninstall(setup: &CommandSetup, ctx: &Context) -> Result<Summary> {
    let resolved = resolve_links(setup, ctx.log.as_ref())?;

    ctx.log.stage("Inspecting links");
    let diff = diff::inspect_all(&resolved, ctx);

    ctx.log.stage(if ctx.dry_run {
        "Previewing removal"
    } else {
        "Removing links"
    });
    let summary = apply::uninstall(&diff, ctx);
    ctx.log.info(&summary.uninstall_line(ctx.dry_run));

    if summary.failed > 0 {
        anyhow::bail!("{} link(s) could not be removed", summary.failed);
    }
    Ok(summary)
}

/// Print the status of every declared link. Never mutates anything.
///
/// # Errors
///
/// Returns an error if the declarations cannot be loaded.
pub fn list(setup: &CommandSetup, ctx: &Context) -> Result<StatusReport> {
    let resolved = resolve_links(setup, ctx.log.as_ref())?;
    let report = diff::inspect_all(&resolved, ctx).report();

    ctx.log.stage("Symlink status");
    for line in &report.lines {
        ctx.log.info(line);
    }
    ctx.log.info(&report.totals());
    Ok(report)
}

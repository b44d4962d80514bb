//! Classification of resolved links against the filesystem.
use std::io;
use std::path::Path;

use crate::config::declarations::ResolvedLinkSet;
use crate::resources::LinkStatus;
use crate::resources::symlink::{self, SymlinkResource};

use super::Context;

/// One resolved link and what inspecting its target found.
#[derive(Debug)]
pub struct DiffEntry {
    /// The declared link.
    pub link: SymlinkResource,
    /// Inspection result; an error means the target could not be read.
    pub status: io::Result<LinkStatus>,
}

/// Every resolved link classified exactly once, ordered by target path.
#[derive(Debug, Default)]
pub struct Diff {
    entries: Vec<DiffEntry>,
}

/// Inspect every target in `resolved` with `inspect(target, source)`.
///
/// Each target is inspected exactly once, in target-path order.
pub fn diff<F>(resolved: &ResolvedLinkSet, mut inspect: F) -> Diff
where
    F: FnMut(&Path, &Path) -> io::Result<LinkStatus>,
{
    let entries = resolved
        .iter()
        .map(|(target, source)| DiffEntry {
            status: inspect(target, source),
            link: SymlinkResource::new(source, target),
        })
        .collect();
    Diff { entries }
}

/// Inspect every target in `resolved` through the context's filesystem.
pub fn inspect_all(resolved: &ResolvedLinkSet, ctx: &Context) -> Diff {
    diff(resolved, |target, source| {
        symlink::inspect(ctx.fs_ops.as_ref(), target, source)
    })
}

impl Diff {
    /// All entries in target-path order.
    #[must_use]
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    fn with_status(&self, pred: impl Fn(&LinkStatus) -> bool) -> Vec<&SymlinkResource> {
        self.entries
            .iter()
            .filter(|e| e.status.as_ref().is_ok_and(&pred))
            .map(|e| &e.link)
            .collect()
    }

    /// Links whose target is absent.
    #[must_use]
    pub fn to_create(&self) -> Vec<&SymlinkResource> {
        self.with_status(|s| *s == LinkStatus::Absent)
    }

    /// Links whose target points elsewhere, paired with the current value.
    #[must_use]
    pub fn to_update(&self) -> Vec<(&SymlinkResource, &Path)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.status {
                Ok(LinkStatus::WrongTargetSymlink { actual }) => Some((&e.link, actual.as_path())),
                _ => None,
            })
            .collect()
    }

    /// Links already in place.
    #[must_use]
    pub fn already_correct(&self) -> Vec<&SymlinkResource> {
        self.with_status(|s| *s == LinkStatus::CorrectSymlink)
    }

    /// Links whose target is occupied by something that is not a symlink.
    #[must_use]
    pub fn conflicts(&self) -> Vec<&SymlinkResource> {
        self.with_status(|s| *s == LinkStatus::RegularFileConflict)
    }

    /// Links whose target could not be inspected.
    #[must_use]
    pub fn errors(&self) -> Vec<(&SymlinkResource, &io::Error)> {
        self.entries
            .iter()
            .filter_map(|e| e.status.as_ref().err().map(|err| (&e.link, err)))
            .collect()
    }

    /// Four-way status listing for display.
    #[must_use]
    pub fn report(&self) -> StatusReport {
        let mut report = StatusReport::default();
        for entry in &self.entries {
            let (icon, detail) = match &entry.status {
                Ok(LinkStatus::CorrectSymlink) => {
                    report.correct += 1;
                    ("✓", None)
                }
                Ok(LinkStatus::WrongTargetSymlink { actual }) => {
                    report.wrong_target += 1;
                    ("✗", Some(format!("wrong target: {}", actual.display())))
                }
                Ok(LinkStatus::Absent) => {
                    report.not_installed += 1;
                    ("·", Some("not installed".to_string()))
                }
                Ok(LinkStatus::RegularFileConflict) => {
                    report.conflicts += 1;
                    ("!", Some("regular file exists".to_string()))
                }
                Err(e) => {
                    report.errors += 1;
                    ("?", Some(format!("cannot inspect: {e}")))
                }
            };
            let suffix = detail.map_or_else(String::new, |d| format!(" ({d})"));
            report
                .lines
                .push(format!("{icon} {}{suffix}", entry.link.description()));
        }
        report
    }
}

/// Rendered status listing with per-status totals.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// One line per target, in target-path order.
    pub lines: Vec<String>,
    /// Targets pointing at their source.
    pub correct: u32,
    /// Symlinks pointing elsewhere.
    pub wrong_target: u32,
    /// Absent targets.
    pub not_installed: u32,
    /// Targets occupied by something that is not a symlink.
    pub conflicts: u32,
    /// Targets that could not be inspected.
    pub errors: u32,
}

impl StatusReport {
    /// Totals line (e.g. "3 links: 1 correct, 1 wrong target, ...").
    #[must_use]
    pub fn totals(&self) -> String {
        let total =
            self.correct + self.wrong_target + self.not_installed + self.conflicts + self.errors;
        let mut line = format!(
            "{total} links: {} correct, {} wrong target, {} not installed, {} regular file exists",
            self.correct, self.wrong_target, self.not_installed, self.conflicts
        );
        if self.errors > 0 {
            line.push_str(&format!(", {} unreadable", self.errors));
        }
        line
    }
}

//! Read-only filesystem state primitives.
pub mod symlink;

use std::path::PathBuf;

/// Classification of one target path against its declared source.
///
/// # Examples
///
/// ```
/// use sok::resources::LinkStatus;
///
/// let wrong = LinkStatus::WrongTargetSymlink { actual: "/elsewhere".into() };
/// assert_ne!(wrong, LinkStatus::CorrectSymlink);
/// assert_eq!(wrong.label(), "wrong target");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Nothing exists at the target.
    Absent,
    /// The target is a symlink whose stored value equals the source.
    CorrectSymlink,
    /// The target is a symlink pointing somewhere else.
    WrongTargetSymlink {
        /// Link value actually stored at the target.
        actual: PathBuf,
    },
    /// The target exists and is not a symlink.
    RegularFileConflict,
}

impl LinkStatus {
    /// Short human-readable label used in listings.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Absent => "not installed",
            Self::CorrectSymlink => "correct",
            Self::WrongTargetSymlink { .. } => "wrong target",
            Self::RegularFileConflict => "regular file exists",
        }
    }
}

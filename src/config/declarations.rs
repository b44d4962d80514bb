//! Symlink declarations and the OS-scoped resolver.
//!
//! The declarations file is a YAML sequence. Each record may carry an `os`
//! filter plus up to five target → source maps:
//!
//! ```yaml
//! - common:
//!     ~/.gitconfig: ~/dotfiles/git/gitconfig
//!   linux:
//!     ~/.config/i3/config: ~/dotfiles/i3/config
//! - os: darwin
//!   darwin:
//!     ~/Library/Preferences/app.plist: ~/dotfiles/macos/app.plist
//! - link:
//!     ~/.vimrc: ~/dotfiles/vim/vimrc
//! ```
//!
//! Within one record the tiers merge as `common` < OS-specific < `link`.
//! Across records, later records overwrite earlier ones for the same target.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::expand_home;
use crate::error::ConfigError;
use crate::logging::Log;
use crate::platform::Os;

/// Raw target → source map as written in the declarations file.
pub type LinkMap = BTreeMap<String, String>;

/// One parsed entry from the declarations file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymlinkDeclaration {
    /// Exact-match platform filter; empty means unfiltered.
    pub os: String,
    /// Legacy map, highest precedence.
    #[serde(rename = "link")]
    pub legacy_link: LinkMap,
    /// Links for every platform, lowest precedence.
    pub common: LinkMap,
    /// Linux-only links.
    pub linux: LinkMap,
    /// macOS-only links.
    pub darwin: LinkMap,
    /// Windows-only links.
    pub windows: LinkMap,
}

impl SymlinkDeclaration {
    /// The links this declaration contributes on `os`.
    ///
    /// A pure legacy record (non-empty `link`, no `os`) is returned verbatim.
    /// A record filtered to another platform contributes nothing. Otherwise
    /// `common`, the map for `os`, and `link` are layered in that order.
    #[must_use]
    pub fn links_for_os(&self, os: &str) -> LinkMap {
        if !self.legacy_link.is_empty() && self.os.is_empty() {
            return self.legacy_link.clone();
        }
        if !self.os.is_empty() && self.os != os {
            return LinkMap::new();
        }

        let specific = match os {
            "linux" => Some(&self.linux),
            "darwin" => Some(&self.darwin),
            "windows" => Some(&self.windows),
            _ => None,
        };

        let mut result = self.common.clone();
        if let Some(specific) = specific {
            result.extend(specific.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        result.extend(
            self.legacy_link
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        result
    }
}

/// Desired symlinks for one platform: absolute target → source.
///
/// Iteration is ordered by target path, which keeps every pass over the set
/// stable within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLinkSet(BTreeMap<PathBuf, PathBuf>);

impl ResolvedLinkSet {
    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no targets are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Source declared for `target`.
    #[must_use]
    pub fn get(&self, target: &Path) -> Option<&Path> {
        self.0.get(target).map(PathBuf::as_path)
    }

    /// Iterate `(target, source)` pairs sorted by target.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.0.iter().map(|(t, s)| (t.as_path(), s.as_path()))
    }
}

impl FromIterator<(PathBuf, PathBuf)> for ResolvedLinkSet {
    fn from_iter<I: IntoIterator<Item = (PathBuf, PathBuf)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Merge `declarations` into one mapping for `os`.
///
/// Both targets and sources have a leading `~/` replaced by `home`. A target
/// declared twice keeps the value from the later declaration; the override
/// is logged at debug level.
#[must_use]
pub fn resolve(
    declarations: &[SymlinkDeclaration],
    os: Os,
    home: &Path,
    log: &dyn Log,
) -> ResolvedLinkSet {
    let mut links = BTreeMap::new();
    for decl in declarations {
        for (target, source) in decl.links_for_os(os.as_str()) {
            let target = expand_home(Path::new(&target), home);
            let source = expand_home(Path::new(&source), home);
            if let Some(previous) = links.insert(target.clone(), source.clone())
                && previous != source
            {
                log.debug(&format!(
                    "{} redeclared: {} replaces {}",
                    target.display(),
                    source.display(),
                    previous.display()
                ));
            }
        }
    }
    ResolvedLinkSet(links)
}

/// Read and parse the YAML declarations file at `path`.
///
/// An empty file yields no declarations.
///
/// # Errors
///
/// Returns [`ConfigError::DeclarationsNotFound`] if the file is missing,
/// [`ConfigError::Io`] if it cannot be read and
/// [`ConfigError::InvalidSyntax`] if it is not a valid declarations list.
pub fn load(path: &Path) -> Result<Vec<SymlinkDeclaration>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::DeclarationsNotFound(path.to_path_buf())
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    parse(&content).map_err(|e| ConfigError::InvalidSyntax {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn parse(content: &str) -> Result<Vec<SymlinkDeclaration>, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(content)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::{Level, RecordingLog};

    fn map(pairs: &[(&str, &str)]) -> LinkMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn home() -> PathBuf {
        PathBuf::from("/home/u")
    }

    // -----------------------------------------------------------------------
    // links_for_os
    // -----------------------------------------------------------------------

    #[test]
    fn legacy_only_is_returned_verbatim() {
        let decl = SymlinkDeclaration {
            legacy_link: map(&[
                ("~/.bashrc", "~/.dotfiles/bash/bashrc"),
                ("~/.vimrc", "~/.dotfiles/vim/vimrc"),
            ]),
            ..Default::default()
        };
        assert_eq!(decl.links_for_os("linux"), decl.legacy_link);
        assert_eq!(decl.links_for_os("windows"), decl.legacy_link);
    }

    #[test]
    fn legacy_without_os_ignores_other_tiers() {
        let decl = SymlinkDeclaration {
            legacy_link: map(&[("~/.bashrc", "link")]),
            common: map(&[("~/.bashrc", "common"), ("~/.zshrc", "zsh")]),
            linux: map(&[("~/.bashrc", "linux")]),
            ..Default::default()
        };
        assert_eq!(decl.links_for_os("linux"), map(&[("~/.bashrc", "link")]));
    }

    #[test]
    fn common_and_os_specific_merge() {
        let decl = SymlinkDeclaration {
            common: map(&[("~/.gitconfig", "git"), ("~/.vimrc", "vim")]),
            linux: map(&[("~/.config/i3/config", "i3")]),
            darwin: map(&[("~/Library/app.plist", "plist")]),
            ..Default::default()
        };
        assert_eq!(
            decl.links_for_os("linux"),
            map(&[
                ("~/.gitconfig", "git"),
                ("~/.vimrc", "vim"),
                ("~/.config/i3/config", "i3"),
            ])
        );
        assert_eq!(
            decl.links_for_os("darwin"),
            map(&[
                ("~/.gitconfig", "git"),
                ("~/.vimrc", "vim"),
                ("~/Library/app.plist", "plist"),
            ])
        );
    }

    #[test]
    fn precedence_is_common_then_os_then_legacy() {
        let mut decl = SymlinkDeclaration {
            os: "linux".to_string(),
            common: map(&[("/a", "X")]),
            linux: map(&[("/a", "Y")]),
            legacy_link: map(&[("/a", "Z")]),
            ..Default::default()
        };
        assert_eq!(decl.links_for_os("linux"), map(&[("/a", "Z")]));

        decl.legacy_link.clear();
        assert_eq!(decl.links_for_os("linux"), map(&[("/a", "Y")]));
    }

    #[test]
    fn os_filter_mismatch_yields_nothing() {
        let decl = SymlinkDeclaration {
            os: "darwin".to_string(),
            common: map(&[("~/.zshrc", "zsh")]),
            darwin: map(&[("~/.config/x", "x")]),
            legacy_link: map(&[("~/.vimrc", "vim")]),
            ..Default::default()
        };
        assert!(decl.links_for_os("linux").is_empty());
    }

    #[test]
    fn os_filter_with_legacy_goes_through_tiers() {
        let decl = SymlinkDeclaration {
            os: "linux".to_string(),
            legacy_link: map(&[("~/.vimrc", "vim")]),
            ..Default::default()
        };
        assert_eq!(decl.links_for_os("linux"), map(&[("~/.vimrc", "vim")]));
        assert!(decl.links_for_os("windows").is_empty());
    }

    #[test]
    fn unrecognised_os_uses_common_only() {
        let decl = SymlinkDeclaration {
            common: map(&[("~/.gitconfig", "git")]),
            linux: map(&[("~/.bashrc", "bash")]),
            ..Default::default()
        };
        assert_eq!(decl.links_for_os("haiku"), map(&[("~/.gitconfig", "git")]));
    }

    #[test]
    fn empty_declaration_yields_nothing() {
        assert!(SymlinkDeclaration::default().links_for_os("linux").is_empty());
    }

    // -----------------------------------------------------------------------
    // resolve
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_expands_targets_and_sources() {
        let decls = vec![SymlinkDeclaration {
            common: map(&[("~/.vimrc", "~/dotfiles/vimrc"), ("/etc/x~/y", "/opt/z")]),
            ..Default::default()
        }];
        let log = RecordingLog::default();
        let resolved = resolve(&decls, Os::Linux, &home(), &log);

        assert_eq!(resolved.len(), 2);
        assert_eq!(
            resolved.get(&home().join(".vimrc")),
            Some(home().join("dotfiles/vimrc").as_path())
        );
        assert_eq!(
            resolved.get(Path::new("/etc/x~/y")),
            Some(Path::new("/opt/z"))
        );
    }

    #[test]
    fn later_declarations_win_and_are_logged() {
        let decls = vec![
            SymlinkDeclaration {
                common: map(&[("~/.bashrc", "~/first")]),
                ..Default::default()
            },
            SymlinkDeclaration {
                common: map(&[("~/.bashrc", "~/second")]),
                ..Default::default()
            },
        ];
        let log = RecordingLog::default();
        let resolved = resolve(&decls, Os::Linux, &home(), &log);

        assert_eq!(
            resolved.get(&home().join(".bashrc")),
            Some(home().join("second").as_path())
        );
        assert!(log.contains(Level::Debug, "redeclared"));
        assert!(log.messages(Level::Warn).is_empty());
    }

    #[test]
    fn resolve_filters_by_os() {
        let decls = vec![
            SymlinkDeclaration {
                os: "darwin".to_string(),
                common: map(&[("/mac", "/src/mac")]),
                ..Default::default()
            },
            SymlinkDeclaration {
                os: "linux".to_string(),
                common: map(&[("/lin", "/src/lin")]),
                ..Default::default()
            },
        ];
        let log = RecordingLog::default();
        let resolved = resolve(&decls, Os::Linux, &home(), &log);
        let targets: Vec<&Path> = resolved.iter().map(|(t, _)| t).collect();
        assert_eq!(targets, vec![Path::new("/lin")]);
    }

    #[test]
    fn resolved_iteration_is_sorted_by_target() {
        let decls = vec![SymlinkDeclaration {
            common: map(&[("/c", "1"), ("/a", "2"), ("/b", "3")]),
            ..Default::default()
        }];
        let log = RecordingLog::default();
        let resolved = resolve(&decls, Os::Windows, &home(), &log);
        let targets: Vec<&Path> = resolved.iter().map(|(t, _)| t).collect();
        assert_eq!(
            targets,
            vec![Path::new("/a"), Path::new("/b"), Path::new("/c")]
        );
    }

    // -----------------------------------------------------------------------
    // load
    // -----------------------------------------------------------------------

    #[test]
    fn load_parses_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symlinks.yaml");
        std::fs::write(
            &path,
            "- common:\n    ~/.gitconfig: ~/dotfiles/gitconfig\n  linux:\n    ~/.xinitrc: ~/dotfiles/xinitrc\n\
             - os: darwin\n  darwin:\n    ~/.yabairc: ~/dotfiles/yabairc\n\
             - link:\n    ~/.vimrc: ~/dotfiles/vimrc\n",
        )
        .unwrap();

        let decls = load(&path).unwrap();
        assert_eq!(decls.len(), 3);
        assert_eq!(decls[0].common.len(), 1);
        assert_eq!(decls[0].linux.len(), 1);
        assert_eq!(decls[1].os, "darwin");
        assert_eq!(decls[2].legacy_link["~/.vimrc"], "~/dotfiles/vimrc");
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::DeclarationsNotFound(_)));
    }

    #[test]
    fn load_empty_file_yields_no_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symlinks.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symlinks.yaml");
        std::fs::write(&path, "- comon:\n    ~/.a: ~/b\n").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSyntax { .. }));
    }

    #[test]
    fn load_rejects_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symlinks.yaml");
        std::fs::write(&path, "- common: [unclosed\n").unwrap();
        assert!(matches!(
            load(&path).unwrap_err(),
            ConfigError::InvalidSyntax { .. }
        ));
    }
}

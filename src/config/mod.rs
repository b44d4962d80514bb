//! Persisted settings and the declarations input.
//!
//! [`Config`] is the TOML settings store (`~/.sok/config.toml` by default).
//! The [`declarations`] submodule parses the YAML list of desired symlinks
//! and resolves it for one platform.
pub mod declarations;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::platform::Os;

/// Environment variable that overrides the settings file location.
pub const CONFIG_ENV: &str = "SOK_CONFIG";

/// Names accepted by [`Config::set`], in display order.
pub const KEYS: &[&str] = &[
    "dotfiles_dir",
    "symlinks_file",
    "os",
    "verbose",
    "dry_run",
    "language",
    "backup_dir",
];

/// Settings loaded from the TOML settings file, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the managed dotfiles.
    pub dotfiles_dir: PathBuf,
    /// Path of the YAML declarations file.
    pub symlinks_file: PathBuf,
    /// Platform used to select OS-specific declarations.
    pub os: Os,
    /// Show debug output on the console.
    pub verbose: bool,
    /// Preview changes without applying them.
    pub dry_run: bool,
    /// Locale tag for user-facing messages.
    pub language: String,
    /// Root directory for backup sessions.
    pub backup_dir: PathBuf,
}

/// On-disk shape of the settings file. Every key is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    dotfiles_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    symlinks_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup_dir: Option<PathBuf>,
}

impl From<&Config> for RawConfig {
    fn from(c: &Config) -> Self {
        Self {
            dotfiles_dir: Some(c.dotfiles_dir.clone()),
            symlinks_file: Some(c.symlinks_file.clone()),
            os: Some(c.os.as_str().to_string()),
            verbose: Some(c.verbose),
            dry_run: Some(c.dry_run),
            language: Some(c.language.clone()),
            backup_dir: Some(c.backup_dir.clone()),
        }
    }
}

impl Config {
    /// Default settings for a user whose home directory is `home`.
    #[must_use]
    pub fn defaults(home: &Path) -> Self {
        let dotfiles_dir = home.join("dotfiles");
        Self {
            symlinks_file: dotfiles_dir.join("symlinks.yaml"),
            dotfiles_dir,
            os: Os::detect(),
            verbose: false,
            dry_run: false,
            language: "en".to_string(),
            backup_dir: home.join(".sok").join("backups"),
        }
    }

    /// Load settings from `path`, falling back to defaults for missing keys.
    ///
    /// A missing file yields the defaults. Path values starting with `~/`
    /// are expanded against `home`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read,
    /// [`ConfigError::InvalidSyntax`] if it is not valid TOML, and
    /// [`ConfigError::InvalidOs`] if the `os` key is not a supported platform.
    pub fn load(path: &Path, home: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::defaults(home));
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let raw: RawConfig =
            toml::from_str(&content).map_err(|e| ConfigError::InvalidSyntax {
                path: path.to_path_buf(),
                message: e.message().to_string(),
            })?;

        let mut config = Self::defaults(home);
        if let Some(dir) = raw.dotfiles_dir {
            config.dotfiles_dir = expand_home(&dir, home);
        }
        if let Some(file) = raw.symlinks_file {
            config.symlinks_file = expand_home(&file, home);
        }
        if let Some(os) = raw.os {
            config.os = os.parse()?;
        }
        if let Some(verbose) = raw.verbose {
            config.verbose = verbose;
        }
        if let Some(dry_run) = raw.dry_run {
            config.dry_run = dry_run;
        }
        if let Some(language) = raw.language {
            config.language = language;
        }
        if let Some(dir) = raw.backup_dir {
            config.backup_dir = expand_home(&dir, home);
        }
        Ok(config)
    }

    /// Write the settings to `path` as TOML, creating the parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(&RawConfig::from(self))
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Update one setting by name.
    ///
    /// `os` is validated case-insensitively and stored lowercase; booleans
    /// accept `true` or `false`; path values expand a leading `~/`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] for an unrecognised key,
    /// [`ConfigError::InvalidOs`] for an unsupported platform and
    /// [`ConfigError::InvalidValue`] for a malformed boolean.
    pub fn set(&mut self, key: &str, value: &str, home: &Path) -> Result<(), ConfigError> {
        let parse_bool = |v: &str| {
            v.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: v.to_string(),
            })
        };
        match key {
            "dotfiles_dir" => self.dotfiles_dir = expand_home(Path::new(value), home),
            "symlinks_file" => self.symlinks_file = expand_home(Path::new(value), home),
            "os" => self.os = value.parse()?,
            "verbose" => self.verbose = parse_bool(value)?,
            "dry_run" => self.dry_run = parse_bool(value)?,
            "language" => self.language = value.to_string(),
            "backup_dir" => self.backup_dir = expand_home(Path::new(value), home),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// The validated platform identifier.
    #[must_use]
    pub const fn os(&self) -> Os {
        self.os
    }

    /// Settings as `(key, value)` pairs in [`KEYS`] order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("dotfiles_dir", self.dotfiles_dir.display().to_string()),
            ("symlinks_file", self.symlinks_file.display().to_string()),
            ("os", self.os.to_string()),
            ("verbose", self.verbose.to_string()),
            ("dry_run", self.dry_run.to_string()),
            ("language", self.language.clone()),
            ("backup_dir", self.backup_dir.display().to_string()),
        ]
    }
}

/// Resolve the settings file location.
///
/// An explicit `--config` path wins, then `$SOK_CONFIG`, then
/// `~/.sok/config.toml`.
#[must_use]
pub fn resolve_path(explicit: Option<&Path>, home: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => home.join(".sok").join("config.toml"),
    }
}

/// Determine the user's home directory.
///
/// Checks `HOME` (then `USERPROFILE` on Windows) before falling back to the
/// platform lookup.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] if no home directory can be found.
pub fn home_dir() -> Result<PathBuf, ConfigError> {
    let from_env = if cfg!(target_os = "windows") {
        std::env::var_os("USERPROFILE").or_else(|| std::env::var_os("HOME"))
    } else {
        std::env::var_os("HOME")
    };
    from_env
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .ok_or(ConfigError::NoHomeDir)
}

/// Replace a leading `~/` with `home`. Every other path is returned as-is.
#[must_use]
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    path.to_str()
        .and_then(|s| s.strip_prefix("~/"))
        .map_or_else(|| path.to_path_buf(), |rest| home.join(rest))
}

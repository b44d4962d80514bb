//! Top-level subcommand orchestration.
//!
//! Every handler follows the same shape: [`CommandSetup`] locates the home
//! directory and loads settings with the command-line overrides applied, then
//! the handler drives the library modules and reports through the logger.
pub mod backup;
pub mod config;
pub mod restore;
pub mod symlinks;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{self as settings, Config};
use crate::logging::Log;

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates home directory lookup, settings file resolution and
/// settings loading so that each command does not repeat the boilerplate.
#[derive(Debug, Clone)]
pub struct CommandSetup {
    /// The user's home directory, used for `~/` expansion.
    pub home: PathBuf,
    /// Where the settings were loaded from.
    pub config_path: PathBuf,
    /// Loaded settings with `--dry-run` and `--os` applied.
    pub config: Config,
}

impl CommandSetup {
    /// Locate the home directory and load settings.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be found or the settings
    /// file exists but cannot be parsed.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        let home = settings::home_dir()?;
        Self::with_home(global, home, log)
    }

    /// Load settings for an explicit home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file exists but cannot be parsed.
    pub fn with_home(global: &GlobalOpts, home: PathBuf, log: &dyn Log) -> Result<Self> {
        let config_path = settings::resolve_path(global.config.as_deref(), &home);
        log.debug(&format!("settings: {}", config_path.display()));

        let mut config = Config::load(&config_path, &home)
            .with_context(|| format!("loading settings from {}", config_path.display()))?;
        if global.dry_run {
            config.dry_run = true;
        }
        if let Some(os) = global.os {
            config.os = os;
        }
        log.debug(&format!("os: {}, dry run: {}", config.os, config.dry_run));

        Ok(Self {
            home,
            config_path,
            config,
        })
    }
}

/// Whether the persisted settings ask for verbose output.
///
/// Used before logging is initialised, so any problem reading the settings
/// is ignored here and reported later by [`CommandSetup::init`].
#[must_use]
pub fn configured_verbose(global: &GlobalOpts) -> bool {
    settings::home_dir().is_ok_and(|home| {
        let path = settings::resolve_path(global.config.as_deref(), &home);
        Config::load(&path, &home).is_ok_and(|c| c.verbose)
    })
}

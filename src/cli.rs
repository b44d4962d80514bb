//! Command-line interface definitions.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::platform::Os;

/// Top-level CLI entry point for the symlink manager.
#[derive(Parser, Debug)]
#[command(
    name = "sok",
    about = "Declarative dotfile symlink manager with rollback and backups",
    version = option_env!("SOK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Settings file (default: $SOK_CONFIG, then ~/.sok/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Select declarations for this OS instead of the configured one
    #[arg(long, global = true, value_name = "OS")]
    pub os: Option<Os>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage declared symlinks
    Symlinks {
        /// Symlink action.
        #[command(subcommand)]
        action: SymlinksCommand,
    },
    /// Install declared symlinks (same as `symlinks install`)
    Apply,
    /// Snapshot files or symlinks into a new backup session
    Backup(BackupOpts),
    /// List, restore or delete backup sessions
    Restore {
        /// Restore action.
        #[command(subcommand)]
        action: RestoreCommand,
    },
    /// Show or change persisted settings
    Config {
        /// Settings action.
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Print version information
    Version,
}

/// `sok symlinks ...`
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymlinksCommand {
    /// Create missing links and repoint wrong ones, rolling back on failure
    Install,
    /// Remove links that point at their declared source
    Uninstall,
    /// Show the status of every declared link
    List,
}

/// Options for the `backup` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct BackupOpts {
    /// Files or symlinks to capture
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Label stored with the session
    #[arg(short, long, default_value = "backup")]
    pub label: String,
}

/// `sok restore ...`
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RestoreCommand {
    /// List backup sessions, newest first
    List,
    /// Restore every entry of a session
    Apply {
        /// Session id
        id: String,
    },
    /// Delete a session
    Delete {
        /// Session id
        id: String,
    },
}

/// `sok config ...`
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print every setting
    Show,
    /// Print the settings file location
    Path,
    /// Update one setting and save
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },
}

impl Command {
    /// Name used for the per-command log file (e.g. `symlinks-install`).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Symlinks {
                action: SymlinksCommand::Install,
            }
            | Self::Apply => "symlinks-install",
            Self::Symlinks {
                action: SymlinksCommand::Uninstall,
            } => "symlinks-uninstall",
            Self::Symlinks {
                action: SymlinksCommand::List,
            } => "symlinks-list",
            Self::Backup(_) => "backup",
            Self::Restore { .. } => "restore",
            Self::Config { .. } => "config",
            Self::Version => "version",
        }
    }
}

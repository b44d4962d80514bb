//! Declarative dotfile symlink manager.
//!
//! Reads a YAML list of desired symlinks (optionally scoped per OS),
//! reconciles it against the filesystem and creates, repoints or removes
//! links. An install that fails part-way is undone from a log of the
//! mutations it made. Independent backup sessions snapshot arbitrary files
//! and symlinks for later restore.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: settings file and the declarations input
//! - **[`resources`]**: link state classification over [`operations::FileSystemOps`]
//! - **[`tasks`]**: diff and apply passes, counted in a [`tasks::Summary`]
//! - **[`rollback`]**: mutation log that can replay itself in reverse
//! - **[`backup`]**: point-in-time snapshots with JSON metadata
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod backup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod operations;
pub mod platform;
pub mod resources;
pub mod rollback;
pub mod tasks;

//! `sok config show | path | set <key> <value>`.
use anyhow::{Context as _, Result};

use super::CommandSetup;
use crate::cli::{ConfigCommand, GlobalOpts};
use crate::config::Config;
use crate::logging::{Log, Logger};

/// Run a `config` subcommand.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded, or for `set`, if the
/// key or value is invalid or the file cannot be written.
pub fn run(global: &GlobalOpts, action: &ConfigCommand, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    match action {
        ConfigCommand::Show => {
            for line in show(&setup.config) {
                log.info(&line);
            }
            Ok(())
        }
        ConfigCommand::Path => {
            log.info(&setup.config_path.display().to_string());
            Ok(())
        }
        ConfigCommand::Set { key, value } => set(&setup, key, value, log).map(drop),
    }
}

/// `key = value` lines in display order.
#[must_use]
pub fn show(config: &Config) -> Vec<String> {
    config
        .entries()
        .into_iter()
        .map(|(key, value)| format!("{key} = {value}"))
        .collect()
}

/// Update one setting and write the file back.
///
/// The file is re-read without command-line overrides so a `--dry-run` or
/// `--os` on this invocation is not persisted by accident.
///
/// # Errors
///
/// Returns an error for an unknown key, an invalid value, or a write
/// failure.
pub fn set(setup: &CommandSetup, key: &str, value: &str, log: &dyn Log) -> Result<Config> {
    let mut config = Config::load(&setup.config_path, &setup.home)?;
    config.set(key, value, &setup.home)?;
    config
        .save(&setup.config_path)
        .with_context(|| format!("saving {}", setup.config_path.display()))?;
    log.info(&format!("{key} = {value}"));
    Ok(config)
}

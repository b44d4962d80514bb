//! `sok` binary: parse the command line, set up logging and dispatch.
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use sok::cli::{Cli, Command};
use sok::commands;
use sok::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    if matches!(args.command, Command::Version) {
        commands::version::run();
        return Ok(());
    }

    let name = args.command.name();
    init_subscriber(
        args.verbose || commands::configured_verbose(&args.global),
        name,
    );
    let log = Arc::new(Logger::new(name));

    let result = match &args.command {
        Command::Symlinks { action } => commands::symlinks::run(&args.global, *action, &log),
        Command::Apply => {
            commands::symlinks::run(&args.global, sok::cli::SymlinksCommand::Install, &log)
        }
        Command::Backup(opts) => commands::backup::run(&args.global, opts, &log),
        Command::Restore { action } => commands::restore::run(&args.global, action, &log),
        Command::Config { action } => commands::config::run(&args.global, action, &log),
        Command::Version => Ok(()),
    };

    if let Err(e) = &result {
        log.error(&format!("{e:#}"));
        log.print_log_location();
        std::process::exit(1);
    }
    result
}

//! Subscriber wiring: console rendering and the per-command run log.
use std::fs::File;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::MakeWriterExt as _;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::{Context, SubscriberExt as _};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt as _;

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};
use crate::commands::version::version;

/// Target used for stage headers.
pub(super) const STAGE_TARGET: &str = "sok::stage";
/// Target used for dry-run previews.
pub(super) const DRY_RUN_TARGET: &str = "sok::dry_run";

/// How a message is presented, derived from its level and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    DryRun,
    Error,
    Warn,
    Info,
    Debug,
}

impl Kind {
    fn of(event: &Event<'_>) -> Self {
        let meta = event.metadata();
        match (*meta.level(), meta.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    fn console(self, msg: &str) -> String {
        match self {
            Self::Error => format!("\x1b[31mERROR\x1b[0m {msg}"),
            Self::Warn => format!("\x1b[33mWARN\x1b[0m  {msg}"),
            Self::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::DryRun => format!("  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
        }
    }

    /// Tag written between the timestamp and the message in the run log.
    const fn tag(self) -> &'static str {
        match self {
            Self::Stage => "==> ",
            Self::DryRun => "    [dry run] ",
            Self::Error => "    [error] ",
            Self::Warn => "    [warn] ",
            Self::Debug => "    [debug] ",
            Self::Info => "    ",
        }
    }
}

/// The formatted `message` field of `event`.
fn message(event: &Event<'_>) -> String {
    struct Message(String);

    impl Visit for Message {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "message" {
                value.clone_into(&mut self.0);
            }
        }
    }

    let mut visitor = Message(String::new());
    event.record(&mut visitor);
    visitor.0
}

/// Plain-text record of one command run at
/// `$XDG_CACHE_HOME/sok/<command>.log`, truncated at the start of each run.
#[derive(Debug)]
pub(super) struct RunLog {
    file: Mutex<File>,
}

impl RunLog {
    /// Start a fresh run log for `command`, or `None` when the cache
    /// directory is unusable.
    pub(super) fn open(command: &str) -> Option<Self> {
        let mut file = File::create(log_file_path(command)?).ok()?;
        writeln!(
            file,
            "# sok {} {command}, started {} UTC",
            version(),
            format_utc_datetime()
        )
        .ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: Subscriber> Layer<S> for RunLog {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let line = format!(
            "[{}] {}{}",
            format_utc_time(),
            Kind::of(event).tag(),
            strip_ansi(&message(event))
        );
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Colourised console rendering: warnings and errors on stderr, the rest on
/// stdout.
struct Console;

impl<S, N> FormatEvent<S, N> for Console
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        writeln!(writer, "{}", Kind::of(event).console(&message(event)))
    }
}

/// Install the global subscriber for one run of `command`.
///
/// The console shows `INFO` and above, plus `DEBUG` when `verbose` is set.
/// The run log always records `DEBUG` and above. Call once, before the
/// first message is logged.
pub fn init_subscriber(verbose: bool, command: &str) {
    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let streams = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));

    let console = tracing_subscriber::fmt::layer()
        .event_format(Console)
        .with_writer(streams)
        .with_filter(console_level);
    let run_log = RunLog::open(command).map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console)
        .with(run_log)
        .init();
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn run_log_tags_line_up_under_stage_arrows() {
        for kind in [Kind::DryRun, Kind::Error, Kind::Warn, Kind::Debug, Kind::Info] {
            assert!(kind.tag().starts_with("    "), "{kind:?}");
        }
        assert_eq!(Kind::Stage.tag(), "==> ");
    }

    #[test]
    fn console_output_strips_back_to_the_message() {
        let lines: Vec<String> = [Kind::Stage, Kind::DryRun, Kind::Info, Kind::Debug]
            .into_iter()
            .map(|kind| strip_ansi(&kind.console("msg")))
            .collect();
        assert_eq!(lines, ["==> msg", "  [DRY RUN] msg", "  msg", "  msg"]);
        assert_eq!(strip_ansi(&Kind::Warn.console("w")), "WARN  w");
    }
}

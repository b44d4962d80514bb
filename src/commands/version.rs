//! Command: print version information.

/// Version string baked in by the build script, or the package version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("SOK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the sok version to stdout.
///
/// Runs before any subscriber is installed, so it writes directly.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("sok {}", version());
}

// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed home directory and a fluent builder
// so each integration test can set up an isolated environment without
// repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sok::cli::GlobalOpts;
use sok::commands::CommandSetup;
use sok::logging::{Log, Logger};
use sok::platform::Os;
use sok::tasks::Context;

/// An isolated home directory backed by a [`tempfile::TempDir`].
///
/// Layout:
/// - `home/`                     the user's home directory
/// - `home/dotfiles/`            managed sources
/// - `home/dotfiles/symlinks.yaml`
/// - `home/.sok/config.toml`
/// - `home/.sok/backups/`        created on first backup
pub struct IntegrationTestContext {
    /// Temporary directory holding the home directory.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// The isolated home directory.
    pub fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    /// Directory holding the managed sources.
    pub fn dotfiles(&self) -> PathBuf {
        self.home().join("dotfiles")
    }

    /// Settings file written by the builder.
    pub fn config_path(&self) -> PathBuf {
        self.home().join(".sok").join("config.toml")
    }

    /// `rel` inside the home directory.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.home().join(rel)
    }

    /// Load settings the way a command does, with the given flags.
    pub fn setup_with(&self, mut global: GlobalOpts) -> CommandSetup {
        global.config = Some(self.config_path());
        CommandSetup::with_home(&global, self.home(), &Logger::new("test")).expect("load settings")
    }

    /// Load settings with no command-line overrides.
    pub fn setup(&self) -> CommandSetup {
        self.setup_with(GlobalOpts::default())
    }

    /// Reconciliation context over the real filesystem.
    pub fn context(&self, dry_run: bool) -> Context {
        Context::new(Arc::new(Logger::new("test")) as Arc<dyn Log>, dry_run)
    }

    /// Point `rel` (inside home) at `value`, creating parents as needed.
    pub fn symlink(&self, rel: &str, value: impl AsRef<Path>) {
        let link = self.path(rel);
        if let Some(parent) = link.parent() {
            std::fs::create_dir_all(parent).expect("create link parent");
        }
        std::os::unix::fs::symlink(value, link).expect("create symlink");
    }

    /// Current link value of `rel`, or `None` if it is not a symlink.
    pub fn link_value(&self, rel: &str) -> Option<PathBuf> {
        std::fs::read_link(self.path(rel)).ok()
    }

    /// Whether anything (even a dangling link) exists at `rel`.
    pub fn occupied(&self, rel: &str) -> bool {
        std::fs::symlink_metadata(self.path(rel)).is_ok()
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
    declarations: String,
    os: Os,
}

impl TestContextBuilder {
    /// Begin building a new context with an empty declarations file.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let ctx = IntegrationTestContext { root };
        std::fs::create_dir_all(ctx.dotfiles()).expect("create dotfiles dir");
        Self {
            ctx,
            declarations: String::new(),
            os: Os::Linux,
        }
    }

    /// Create a source file `dotfiles/<name>` with `content`.
    pub fn with_source(self, name: &str, content: &str) -> Self {
        let path = self.ctx.dotfiles().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create source parent");
        }
        std::fs::write(path, content).expect("write source file");
        self
    }

    /// Use `yaml` as the declarations file.
    pub fn with_declarations(mut self, yaml: &str) -> Self {
        yaml.clone_into(&mut self.declarations);
        self
    }

    /// Persist `os` in the settings file.
    pub fn with_os(mut self, os: Os) -> Self {
        self.os = os;
        self
    }

    /// Write the declarations and settings files and return the context.
    pub fn build(self) -> IntegrationTestContext {
        let ctx = self.ctx;
        let symlinks_file = ctx.dotfiles().join("symlinks.yaml");
        std::fs::write(&symlinks_file, &self.declarations).expect("write declarations");

        let settings = format!(
            "dotfiles_dir = \"~/dotfiles\"\nsymlinks_file = \"~/dotfiles/symlinks.yaml\"\nos = \"{}\"\nbackup_dir = \"~/.sok/backups\"\n",
            self.os
        );
        let config_path = ctx.config_path();
        std::fs::create_dir_all(config_path.parent().expect("config parent"))
            .expect("create settings dir");
        std::fs::write(config_path, settings).expect("write settings");
        ctx
    }
}

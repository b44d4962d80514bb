#![cfg(unix)]
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for `sok backup` and `sok restore`.

mod common;

use std::path::PathBuf;

use common::TestContextBuilder;
use sok::backup::Manager;
use sok::commands::{backup, restore};
use sok::logging::Logger;

fn manager(ctx: &common::IntegrationTestContext) -> Manager {
    Manager::new(&ctx.setup().config.backup_dir)
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn file_content_comes_back() {
    let ctx = TestContextBuilder::new().build();
    std::fs::write(ctx.path(".bashrc"), "v1").unwrap();
    let log = Logger::new("test");

    let session = backup::create(&ctx.setup(), &[ctx.path(".bashrc")], "manual", &log).unwrap();
    std::fs::write(ctx.path(".bashrc"), "v2").unwrap();
    let restored = restore::apply(&manager(&ctx), &session.id, false, &log).unwrap();

    assert_eq!(restored, 1);
    assert_eq!(std::fs::read_to_string(ctx.path(".bashrc")).unwrap(), "v1");
}

#[test]
fn symlink_is_recreated() {
    let ctx = TestContextBuilder::new().build();
    ctx.symlink(".vimrc", "/src");
    let log = Logger::new("test");

    let session =
        backup::create(&ctx.setup(), &[PathBuf::from("~/.vimrc")], "manual", &log).unwrap();
    std::fs::remove_file(ctx.path(".vimrc")).unwrap();
    restore::apply(&manager(&ctx), &session.id, false, &log).unwrap();

    assert_eq!(ctx.link_value(".vimrc"), Some(PathBuf::from("/src")));
}

#[test]
fn restore_replaces_an_installed_link() {
    let ctx = TestContextBuilder::new().build();
    std::fs::write(ctx.path(".gitconfig"), "[user]").unwrap();
    let log = Logger::new("test");
    let session =
        backup::create(&ctx.setup(), &[ctx.path(".gitconfig")], "pre-install", &log).unwrap();

    std::fs::remove_file(ctx.path(".gitconfig")).unwrap();
    ctx.symlink(".gitconfig", ctx.dotfiles().join("gitconfig"));
    restore::apply(&manager(&ctx), &session.id, false, &log).unwrap();

    assert_eq!(ctx.link_value(".gitconfig"), None);
    assert_eq!(std::fs::read_to_string(ctx.path(".gitconfig")).unwrap(), "[user]");
}

#[test]
fn clashing_base_names_abort_the_whole_backup() {
    let ctx = TestContextBuilder::new().build();
    for (dir, content) in [("a", "A-content"), ("b", "B-content")] {
        std::fs::create_dir_all(ctx.path(&format!(".config/{dir}"))).unwrap();
        std::fs::write(ctx.path(&format!(".config/{dir}/config")), content).unwrap();
    }
    let log = Logger::new("test");

    let err = backup::create(
        &ctx.setup(),
        &[ctx.path(".config/a/config"), ctx.path(".config/b/config")],
        "manual",
        &log,
    )
    .unwrap_err();

    assert!(format!("{err:#}").contains("nothing was saved"), "{err:#}");
    assert!(manager(&ctx).list_backups().unwrap().is_empty());
    assert_eq!(
        std::fs::read_to_string(ctx.path(".config/a/config")).unwrap(),
        "A-content"
    );
}

// ---------------------------------------------------------------------------
// Listing and deletion
// ---------------------------------------------------------------------------

#[test]
fn damaged_session_does_not_hide_healthy_ones() {
    let ctx = TestContextBuilder::new().build();
    std::fs::write(ctx.path(".profile"), "x").unwrap();
    let log = Logger::new("test");
    let session = backup::create(&ctx.setup(), &[ctx.path(".profile")], "ok", &log).unwrap();
    let manager = manager(&ctx);
    std::fs::create_dir_all(manager.root().join("20000101-000000.000")).unwrap();

    let sessions = restore::list(&manager, &log).unwrap();

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, session.id);
    assert_eq!(sessions[0].command, "ok");
}

#[test]
fn delete_removes_session_and_is_repeatable() {
    let ctx = TestContextBuilder::new().build();
    std::fs::write(ctx.path(".profile"), "x").unwrap();
    let log = Logger::new("test");
    let session = backup::create(&ctx.setup(), &[ctx.path(".profile")], "ok", &log).unwrap();
    let manager = manager(&ctx);

    restore::delete(&manager, &session.id, false, &log).unwrap();
    restore::delete(&manager, &session.id, false, &log).unwrap();

    assert!(manager.list_backups().unwrap().is_empty());
    assert!(ctx.path(".profile").exists(), "deleting a backup keeps the original");
}

#[test]
fn delete_refuses_ids_outside_the_backup_root() {
    let ctx = TestContextBuilder::new().build();
    std::fs::write(ctx.path(".profile"), "x").unwrap();
    let log = Logger::new("test");
    let manager = manager(&ctx);
    let home = ctx.home().to_string_lossy().into_owned();

    assert!(restore::delete(&manager, &home, false, &log).is_err());
    assert!(restore::delete(&manager, "../..", false, &log).is_err());
    assert!(ctx.path(".profile").exists());
    assert!(ctx.dotfiles().join("symlinks.yaml").exists());
}

#[test]
fn unknown_session_cannot_be_restored() {
    let ctx = TestContextBuilder::new().build();
    let err = restore::apply(&manager(&ctx), "19990101-000000.000", false, &Logger::new("test"))
        .unwrap_err();
    assert!(format!("{err}").contains("19990101-000000.000"));
}

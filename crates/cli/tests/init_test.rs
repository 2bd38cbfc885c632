// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use assert_cmd::Command;

#[test]
fn init_creates_the_stoneforge_layout() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("sf").unwrap().arg("init").arg(dir.path()).assert().success();

    let root = dir.path().join(".stoneforge");
    assert!(root.join(".worktrees").is_dir());
    assert!(root.join("sync").is_dir());
    assert!(root.join("stoneforge.db").is_file());
}

#[test]
fn init_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = Command::cargo_bin("sf").unwrap();
    first.arg("init").arg(dir.path()).assert().success();
    let mut second = Command::cargo_bin("sf").unwrap();
    second.arg("init").arg(dir.path()).assert().success();
}

#[test]
fn migrate_dry_run_reports_nothing_pending() {
    let output = Command::cargo_bin("sf").unwrap().args(["migrate", "--dry-run"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no schema migrations pending"), "stdout was: {stdout}");
}

//! Integration tests for the `upgrade-code` binary entry point.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

#[test]
fn missing_path_is_a_usage_error() {
    let mut command = cargo_bin_cmd!("upgrade-code");
    command
        .assert()
        .failure()
        .code(2)
        .stderr(contains("<PATH>"));
}

#[test]
fn renames_classes_and_reports_the_summary() {
    let dir = TempDir::new().expect("create temp dir");
    let root = dir.path();
    fs::write(
        root.join(".upgrade.yml"),
        "mappings:\n  Old\\Page: New\\Page\n",
    )
    .expect("write definitions");
    fs::create_dir_all(root.join("app/src")).expect("mkdir");
    fs::write(root.join("app/src/A.php"), "<?php\nnew \\Old\\Page();\n").expect("write php");

    let mut command = cargo_bin_cmd!("upgrade-code");
    command
        .current_dir(root)
        .args(["app", "--write", "--log-filter", "off"])
        .assert()
        .success()
        .stdout(contains("+new \\New\\Page();").and(contains("1 files changed, 0 warnings")));

    assert_eq!(
        fs::read_to_string(root.join("app/src/A.php")).expect("read php"),
        "<?php\nnew \\New\\Page();\n"
    );
}

#[test]
fn invalid_log_filter_is_reported() {
    let dir = TempDir::new().expect("create temp dir");
    fs::create_dir_all(dir.path().join("app")).expect("mkdir");

    let mut command = cargo_bin_cmd!("upgrade-code");
    command
        .current_dir(dir.path())
        .args(["app", "--log-filter", "upgrader=loud"])
        .assert()
        .failure()
        .stderr(contains("invalid log filter"));
}

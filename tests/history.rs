mod common;

use common::{check_output, fileward_cmd};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn history_lists_records_in_file_order() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "v1").unwrap();
    check_output(temp.path(), "a.txt");

    fs::write(temp.path().join("a.txt"), "v2").unwrap();
    check_output(temp.path(), "a.txt");

    fileward_cmd(temp.path())
        .arg("history")
        .arg("a.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("History for a.txt:"))
        .stdout(predicate::str::contains("Record 1:"))
        .stdout(predicate::str::contains("Record 2:"))
        .stdout(predicate::str::contains("Changed Hash: "));
}

#[test]
fn history_for_unknown_filename_prints_nothing() {
    let temp = TempDir::new().unwrap();

    fileward_cmd(temp.path())
        .arg("history")
        .arg("a.txt")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn history_for_unknown_filename_names_the_ledger_at_info() {
    let temp = TempDir::new().unwrap();

    fileward_cmd(temp.path())
        .env("RUST_LOG", "info")
        .arg("history")
        .arg("a.txt")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "No records for a.txt in hash_record.txt",
        ));
}

#[test]
fn history_only_shows_the_requested_filename() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "v1").unwrap();
    fs::write(temp.path().join("b.txt"), "w1").unwrap();
    check_output(temp.path(), "a.txt");
    check_output(temp.path(), "b.txt");

    fileward_cmd(temp.path())
        .arg("history")
        .arg("a.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("History for a.txt:"))
        .stdout(predicate::str::contains("Record 2:").not());
}

#[test]
fn history_respects_custom_ledger_path() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "v1").unwrap();

    fileward_cmd(temp.path())
        .arg("check")
        .arg("a.txt")
        .arg("--ledger")
        .arg("audit.txt")
        .assert()
        .success();

    fileward_cmd(temp.path())
        .arg("history")
        .arg("a.txt")
        .arg("--ledger")
        .arg("audit.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("Record 1:"));
}

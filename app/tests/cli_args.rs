//! Argument-parsing surface: unrecognised flags fail with usage on
//! stderr and exit code 1; --help succeeds without a terminal.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn unknown_flag_exits_one_with_usage() {
    Command::cargo_bin("minase")
        .unwrap()
        .arg("--definitely-not-a-flag")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_prints_usage_and_exits_zero() {
    Command::cargo_bin("minase")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--choosefile"));
}

#[test]
fn conflicting_value_free_flag_fails() {
    Command::cargo_bin("minase")
        .unwrap()
        .arg("--choosefile")
        .assert()
        .code(1);
}

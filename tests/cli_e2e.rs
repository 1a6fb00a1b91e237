//! End-to-end CLI tests for the registry-relay binary.
//!
//! None of these start the listener: they either exit during argument
//! parsing or fail configuration with a cleared environment.

use assert_cmd::Command;
use predicates::prelude::*;

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("registry-relay").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Relay business-registry searches"))
        .stdout(predicate::str::contains("--concurrency"));
}

/// Test that --version displays the package version.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("registry-relay").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Test that an invalid flag returns an error.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("registry-relay").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that out-of-range concurrency is rejected before startup.
#[test]
fn test_binary_concurrency_out_of_range_rejected() {
    let mut cmd = Command::cargo_bin("registry-relay").unwrap();
    cmd.args(["-c", "64"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("64"));
}

/// Test that missing configuration fails with the variable name.
#[test]
fn test_binary_missing_configuration_fails() {
    let mut cmd = Command::cargo_bin("registry-relay").unwrap();
    cmd.env_clear()
        .arg("-q")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SEARCH_API_ENDPOINT"));
}

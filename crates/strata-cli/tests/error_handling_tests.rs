//! Tests for error messages and suggestions.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn strata(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.current_dir(temp.path())
        .env("HOME", temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join(".config"))
        .env("NO_COLOR", "1");
    cmd
}

fn page_config(temp: &TempDir, yaml: &str) {
    let dir = temp.path().join("lib/features/auth/login/json2dart");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("json2dart.yaml"), yaml).unwrap();
}

#[test]
fn test_error_missing_method_suggests_field() {
    let temp = TempDir::new().unwrap();
    page_config(&temp, "login:\n  path: /auth/login\n");

    strata(&temp)
        .arg("generate")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("auth/login/login"))
        .stdout(predicate::str::contains("method"));
}

#[test]
fn test_error_invalid_method_lists_choices() {
    let temp = TempDir::new().unwrap();
    page_config(&temp, "login:\n  method: fetch\n  path: /auth/login\n");

    strata(&temp)
        .arg("generate")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("fetch"));
}

#[test]
fn test_error_unreadable_page_config() {
    let temp = TempDir::new().unwrap();
    page_config(&temp, "login: [unclosed");

    strata(&temp)
        .arg("generate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed units:"))
        .stderr(predicate::str::contains("auth/login"));
}

#[test]
fn test_error_missing_features_dir_suggestion() {
    let temp = TempDir::new().unwrap();

    strata(&temp)
        .arg("generate")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("features_dir"));
}

#[test]
fn test_error_unknown_page() {
    let temp = TempDir::new().unwrap();
    page_config(&temp, "{}\n");

    strata(&temp)
        .args(["generate", "--page", "signup"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Page not found: signup"))
        .stderr(predicate::str::contains("strata list"));
}

#[test]
fn test_error_unknown_config_key() {
    let temp = TempDir::new().unwrap();

    strata(&temp)
        .args(["config", "get", "defaults.lang"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_error_missing_sample_file() {
    let temp = TempDir::new().unwrap();

    strata(&temp)
        .args(["infer", "missing.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read sample"));
}

#[test]
fn test_verbose_shows_cause_chain() {
    let temp = TempDir::new().unwrap();

    strata(&temp)
        .args(["-v", "infer", "missing.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Caused by:"));
}

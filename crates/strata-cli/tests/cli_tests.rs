//! End-to-end tests for the `strata` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const LOGIN_YAML: &str = "\
login:
  method: post
  path: /auth/login
  body: json2dart/json/login_body.json
  response: json2dart/json/login_response.json
refresh:
  method: post
  path: /auth/refresh
  response: json2dart/json/refresh_response.json
";

/// A `strata` invocation isolated from the user's configuration.
fn strata(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn seed_project(root: &Path) {
    let page = "lib/features/auth/login";
    write(root, &format!("{page}/json2dart/json2dart.yaml"), LOGIN_YAML);
    write(
        root,
        &format!("{page}/json2dart/json/login_body.json"),
        r#"{"email": "a@b.c", "password": "secret"}"#,
    );
    write(
        root,
        &format!("{page}/json2dart/json/login_response.json"),
        r#"{"token": "t", "user": {"id": 1, "name": "Ann"}}"#,
    );
    write(
        root,
        &format!("{page}/json2dart/json/refresh_response.json"),
        r#"{"token": "t"}"#,
    );
}

// ── basics ───────────────────────────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("infer"));
}

#[test]
fn version_flag() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let temp = TempDir::new().unwrap();
    strata(temp.path()).arg("frobnicate").assert().code(2);
}

// ── generate ─────────────────────────────────────────────────────────────────

#[test]
fn generate_writes_layers() {
    let temp = TempDir::new().unwrap();
    seed_project(temp.path());

    strata(temp.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth/login/login"))
        .stdout(predicate::str::contains("auth/login/refresh"));

    let page = temp.path().join("lib/features/auth/login");
    assert!(page.join("data/models/body/login_body.dart").exists());
    assert!(page.join("data/models/response/refresh_response.dart").exists());
    assert!(page.join("domain/entities/login_entity.dart").exists());
    assert!(page.join("domain/usecases/refresh_use_case.dart").exists());
    assert!(page.join("data/datasources/login_remote_data_source.dart").exists());
    assert!(page.join("data/mappers/login_mapper.dart").exists());
}

#[test]
fn generate_twice_is_stable() {
    let temp = TempDir::new().unwrap();
    seed_project(temp.path());
    let repository = temp
        .path()
        .join("lib/features/auth/login/domain/repositories/login_repository.dart");

    strata(temp.path()).arg("generate").assert().success();
    let first = fs::read_to_string(&repository).unwrap();
    strata(temp.path()).arg("generate").assert().success();
    assert_eq!(fs::read_to_string(&repository).unwrap(), first);
}

#[test]
fn malformed_sample_fails_one_unit() {
    let temp = TempDir::new().unwrap();
    seed_project(temp.path());
    write(
        temp.path(),
        "lib/features/auth/login/json2dart/json/refresh_response.json",
        "{ not json",
    );

    strata(temp.path())
        .arg("generate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Generation failed for 1 of 2 units"))
        .stderr(predicate::str::contains("auth/login/refresh"));

    let page = temp.path().join("lib/features/auth/login");
    assert!(page.join("data/models/response/login_response.dart").exists());
    assert!(!page.join("data/models/response/refresh_response.dart").exists());
}

#[test]
fn missing_features_dir_is_not_found() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .arg("generate")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Features directory not found"));
}

#[test]
fn unknown_feature_is_not_found() {
    let temp = TempDir::new().unwrap();
    seed_project(temp.path());
    strata(temp.path())
        .args(["generate", "--feature", "billing"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Feature not found: billing"))
        .stderr(predicate::str::contains("auth"));
}

#[test]
fn features_dir_flag_overrides_config() {
    let temp = TempDir::new().unwrap();
    seed_project(temp.path());
    fs::rename(temp.path().join("lib/features"), temp.path().join("features")).unwrap();

    strata(temp.path())
        .args(["generate", "-d", "features"])
        .assert()
        .success();
    assert!(
        temp.path()
            .join("features/auth/login/domain/entities/login_entity.dart")
            .exists()
    );
}

// ── infer ────────────────────────────────────────────────────────────────────

#[test]
fn infer_prints_entity() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "sample.json", r#"{"id": 1, "name": "Ann"}"#);

    strata(temp.path())
        .args(["infer", "sample.json", "--name", "login", "--artifact", "entity"])
        .assert()
        .success()
        .stdout(predicate::str::contains("class LoginEntity"));
}

#[test]
fn infer_rejects_invalid_json() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "sample.json", "[1, 2");

    strata(temp.path())
        .args(["infer", "sample.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid sample"));
}

// ── list ─────────────────────────────────────────────────────────────────────

#[test]
fn list_json_is_parseable() {
    let temp = TempDir::new().unwrap();
    seed_project(temp.path());

    let output = strata(temp.path())
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["api"], "login");
    assert_eq!(rows[0]["method"], "POST");
}

#[test]
fn list_plain_prints_labels() {
    let temp = TempDir::new().unwrap();
    seed_project(temp.path());

    strata(temp.path())
        .args(["ls", "--format", "list"])
        .assert()
        .success()
        .stdout("auth/login/login\nauth/login/refresh\n");
}

// ── init / config ────────────────────────────────────────────────────────────

#[test]
fn init_creates_local_config() {
    let temp = TempDir::new().unwrap();
    strata(temp.path()).arg("init").assert().success();

    let content = fs::read_to_string(temp.path().join("strata.toml")).unwrap();
    assert!(content.contains("features_dir"));

    // second run refuses to overwrite
    strata(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn config_get_reads_local_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "strata.toml", "features_dir = \"app/features\"\n");

    strata(temp.path())
        .args(["config", "get", "features_dir"])
        .assert()
        .success()
        .stdout("app/features\n");
}

#[test]
fn environment_overrides_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "strata.toml", "[generator]\nhttp_client = \"DioClient\"\n");

    strata(temp.path())
        .env("STRATA_GENERATOR__HTTP_CLIENT", "HttpClient")
        .args(["config", "get", "generator.http_client"])
        .assert()
        .success()
        .stdout("HttpClient\n");
}

#[test]
fn broken_config_exits_with_configuration_code() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "strata.toml", "features_dir = [");

    strata(temp.path()).arg("list").assert().code(4);
}

// ── completions ──────────────────────────────────────────────────────────────

#[test]
fn completions_for_bash() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("strata"));
}

//! Smoke tests to verify command wiring (no database required)

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ohmyblog() -> Command {
    let mut cmd = Command::cargo_bin("ohmyblog").unwrap();
    cmd.env_remove("OHMYBLOG_CONFIG").env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("ohmyblog.toml");
    std::fs::write(&path, body).unwrap();
    path
}

fn shipped_locales() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../locales")
        .display()
        .to_string()
}

#[test]
fn test_help_lists_commands() {
    ohmyblog()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("locales"));
}

#[test]
fn test_serve_help() {
    ohmyblog()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Port to listen on"));
}

#[test]
fn test_config_show_redacts_password() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[database]\npassword = \"hunter2\"\nport = 6543\n");

    ohmyblog()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("port = 6543"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_config_path_reports_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    ohmyblog()
        .arg("--config")
        .arg(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ohmyblog.toml"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();

    ohmyblog()
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[database]\nretry_max_attempts = 0\n");

    ohmyblog()
        .arg("--config")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .failure();
}

#[test]
fn test_locales_lists_catalog_and_resolves() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        &format!("[i18n]\nlocales_dir = '{}'\n", shipped_locales()),
    );

    ohmyblog()
        .arg("--config")
        .arg(&path)
        .args(["locales", "--accept-language", "en-GB,en;q=0.9", "--greet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("zh_CN (default)"))
        .stdout(predicate::str::contains("resolved: en_US"))
        .stdout(predicate::str::contains("Hello World"));
}

#[test]
fn test_site_set_rejects_bad_key_before_connecting() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    ohmyblog()
        .arg("--config")
        .arg(&path)
        .args(["site", "set", "Bad Key", "value"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key"));
}

//! Basic CLI tests for the plughost command-line interface.

use assert_cmd::Command;
use plughost_core::extension::BundleWriter;
use predicates::prelude::*;
use tempfile::TempDir;

fn plughost() -> Command {
    let mut cmd = Command::cargo_bin("plughost").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("PLUGHOST_LOG_JSON")
        .env_remove("PLUGHOST_VERBOSE_LOGGING");
    cmd
}

/// Test that the CLI binary exists and shows help.
#[test]
fn test_cli_help() {
    plughost()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("pack"));
}

/// Test that the CLI shows version information.
#[test]
fn test_cli_version() {
    plughost()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("plughost"));
}

/// Test that providing no subcommand shows an error.
#[test]
fn test_no_subcommand_shows_error() {
    plughost().assert().failure().code(2);
}

#[test]
fn test_run_creates_missing_directory_and_config() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("extensions");
    let config = temp.path().join("conf").join("plughost.toml");

    plughost()
        .arg("run")
        .arg("--dir")
        .arg(&dir)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("(created)"))
        .stdout(predicate::str::contains("Registered: 0 extension(s)"));

    assert!(dir.is_dir());
    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains("verbose-logging = false"));
}

#[test]
fn test_run_reports_unloadable_modules_as_json() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("extensions");
    std::fs::create_dir(&dir).unwrap();
    BundleWriter::new()
        .with_type("pkg::Alpha")
        .write_to(&dir.join("alpha.bundle"))
        .unwrap();
    std::fs::write(dir.join("broken.bundle"), b"not a zip").unwrap();

    let output = plughost()
        .arg("run")
        .arg("--dir")
        .arg(&dir)
        .arg("--config")
        .arg(temp.path().join("plughost.toml"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let modules = summary["report"]["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 2);

    let alpha = modules
        .iter()
        .find(|m| m["module"].as_str().unwrap().ends_with("alpha.bundle"))
        .unwrap();
    assert_eq!(alpha["attempts"][0]["outcome"]["skipped"]["reason"], "not_found");

    let broken = modules
        .iter()
        .find(|m| m["module"].as_str().unwrap().ends_with("broken.bundle"))
        .unwrap();
    assert!(broken["index_error"].is_string());
    assert_eq!(summary["extensions"].as_array().unwrap().len(), 0);
}

#[test]
fn test_run_rejects_invalid_config() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("plughost.toml");
    std::fs::write(&config, "verbose-logging = \"loud\"").unwrap();

    plughost()
        .arg("run")
        .arg("--dir")
        .arg(temp.path().join("extensions"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_run_excluded_module_is_not_listed() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("extensions");
    std::fs::create_dir(&dir).unwrap();
    BundleWriter::new()
        .with_type("host::Owned")
        .write_to(&dir.join("host.bundle"))
        .unwrap();

    plughost()
        .arg("run")
        .arg("--dir")
        .arg(&dir)
        .arg("--config")
        .arg(temp.path().join("plughost.toml"))
        .arg("--exclude")
        .arg(dir.join("host.bundle"))
        .assert()
        .success()
        .stdout(predicate::str::contains("host.bundle").not());
}

#[test]
fn test_inspect_lists_descriptors_in_order() {
    let temp = TempDir::new().unwrap();
    let bundle = temp.path().join("demo.bundle");
    BundleWriter::new()
        .with_type("demo::Helper")
        .with_type("demo::Greeter")
        .write_to(&bundle)
        .unwrap();

    plughost()
        .arg("inspect")
        .arg(&bundle)
        .assert()
        .success()
        .stdout(predicate::str::is_match("(?s)demo::Helper.*demo::Greeter").unwrap())
        .stdout(predicate::str::contains("Types: 2"));
}

#[test]
fn test_inspect_requires_path() {
    plughost()
        .arg("inspect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"))
        .stderr(predicate::str::contains("<BUNDLE>"));
}

#[test]
fn test_inspect_broken_bundle_fails() {
    let temp = TempDir::new().unwrap();
    let bundle = temp.path().join("broken.bundle");
    std::fs::write(&bundle, b"garbage").unwrap();

    plughost()
        .arg("inspect")
        .arg(&bundle)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Types: 0"))
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_pack_missing_library_fails_without_output() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out.bundle");

    plughost()
        .arg("pack")
        .arg(temp.path().join("libmissing.so"))
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read type table"));

    assert!(!output.exists());
}

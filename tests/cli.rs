//! Binary-level tests. None of these reach the network.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn ipharvest(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ipharvest"))
        .args(args)
        .output()
        .expect("Failed to execute ipharvest")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_version_command() {
    let output = ipharvest(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("ipharvest "));
}

#[test]
fn test_help_command() {
    let output = ipharvest(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run"));
    assert!(stdout.contains("sources"));
}

#[test]
fn test_missing_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("absent.yaml");
    let output = ipharvest(&["-c", path_str(&config), "run"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.yaml");
    std::fs::write(&config, "sources:\n  feed:\n    kind: plain\n    url: http://example.com\n").unwrap();
    let output = ipharvest(&["-c", path_str(&config), "run"]);
    assert!(!output.status.success());
}

#[test]
fn test_unknown_source_fails_before_dispatch() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.yaml");
    let out = temp_dir.path().join("out");
    assert!(ipharvest(&["-c", path_str(&config), "init"]).status.success());

    let output = ipharvest(&["-c", path_str(&config), "run", "nosuchcloud", "--output", path_str(&out)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nosuchcloud"));
    assert!(!out.exists());
}

#[test]
fn test_init_then_sources() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.yaml");

    assert!(ipharvest(&["-c", path_str(&config), "init"]).status.success());
    assert!(config.exists());
    // Refuses to overwrite without --force
    assert!(!ipharvest(&["-c", path_str(&config), "init"]).status.success());

    let output = ipharvest(&["-c", path_str(&config), "sources"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cloudflare"));
    assert!(stdout.contains("Available kinds:"));
}

#[test]
fn test_bad_format_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.yaml");
    assert!(ipharvest(&["-c", path_str(&config), "init"]).status.success());
    let output = ipharvest(&["-c", path_str(&config), "run", "--format", "xml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown format"));
}

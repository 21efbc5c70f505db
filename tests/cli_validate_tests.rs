//! End-to-end tests for `lazyesp validate`.

use std::path::Path;
use std::process::{Command, Output};

use lazyesp::models::Widget;
use tempfile::TempDir;

mod fixtures;
use fixtures::*;

fn lazyesp_bin() -> String {
    std::env::var("CARGO_BIN_EXE_lazyesp").unwrap_or_else(|_| "target/release/lazyesp".to_string())
}

fn run(args: &[&str], config_dir: &Path) -> Output {
    Command::new(lazyesp_bin())
        .env("LAZYESP_CONFIG_DIR", config_dir)
        .args(args)
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_validate_valid_project() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_project_file(temp_dir.path(), "ok.json", &test_project_pure());

    let output = run(&["validate", "--project", path.to_str().unwrap()], temp_dir.path());
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("✓ Validation passed"));
}

#[test]
fn test_validate_duplicate_ids_fail() {
    let temp_dir = TempDir::new().unwrap();
    let mut project = test_project_pure();
    project.pages[1]
        .widgets
        .push(Widget::new("title", "text", 0, 0, 10, 10));
    let path = write_project_file(temp_dir.path(), "dup.json", &project);

    let output = run(
        &["validate", "--project", path.to_str().unwrap(), "--json"],
        temp_dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));

    let result: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).expect("JSON output");
    assert_eq!(result["valid"], false);
    assert_eq!(result["profile"], "reterminal_e1001");
    let messages = result["messages"].as_array().unwrap();
    assert!(messages
        .iter()
        .any(|m| m["severity"] == "error" && m["widget"] == "title"));
}

#[test]
fn test_validate_strict_fails_on_warnings() {
    let temp_dir = TempDir::new().unwrap();
    let mut project = test_project_pure();
    project.device_model = "unknown_board".to_string();
    let path = write_project_file(temp_dir.path(), "warn.json", &project);
    let path = path.to_str().unwrap();

    let lenient = run(&["validate", "--project", path], temp_dir.path());
    assert_eq!(lenient.status.code(), Some(0));

    let strict = run(&["validate", "--project", path, "--strict"], temp_dir.path());
    assert_eq!(strict.status.code(), Some(1));
}

#[test]
fn test_validate_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let output = run(
        &["validate", "--project", "/nonexistent/project.json"],
        temp_dir.path(),
    );
    assert_eq!(output.status.code(), Some(2));
}

//! End-to-end tests for `lazyesp config` commands.

use std::path::Path;
use std::process::Command;

/// Path to the lazyesp binary
fn lazyesp_bin() -> String {
    std::env::var("CARGO_BIN_EXE_lazyesp").unwrap_or_else(|_| "target/release/lazyesp".to_string())
}

/// Creates a Command with an isolated config directory.
fn isolated_config_command(args: &[&str], config_dir: &Path) -> Command {
    let mut cmd = Command::new(lazyesp_bin());
    cmd.env("LAZYESP_CONFIG_DIR", config_dir);
    cmd.args(args);
    cmd
}

fn show_json(config_dir: &Path) -> serde_json::Value {
    let output = isolated_config_command(&["config", "show", "--json"], config_dir)
        .output()
        .expect("Failed to execute command");
    assert_eq!(output.status.code(), Some(0));
    serde_json::from_str(&String::from_utf8_lossy(&output.stdout))
        .expect("Should parse JSON output")
}

// ============================================================================
// Show Command Tests
// ============================================================================

#[test]
fn test_config_show_default() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let output = isolated_config_command(&["config", "show"], temp_dir.path())
        .output()
        .expect("Failed to execute command");

    assert_eq!(
        output.status.code(),
        Some(0),
        "Show config should succeed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Default Device: reterminal_e1001"));
    assert!(stdout.contains("Hardware Directory: (not configured)"));
}

#[test]
fn test_config_show_json_schema() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let result = show_json(temp_dir.path());

    assert!(result["paths"].is_object());
    assert!(result["compile"]["default_device"].is_string());
    assert_eq!(result["compile"]["default_orientation"], "landscape");
    assert_eq!(result["network"]["fetch_timeout_secs"], 20);
}

// ============================================================================
// Set Command Tests
// ============================================================================

#[test]
fn test_config_set_values_persist() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_dir = temp_dir.path().join("cfg");
    let hardware_dir = temp_dir.path().join("hardware");
    std::fs::create_dir_all(&hardware_dir).unwrap();

    let output = isolated_config_command(
        &[
            "config",
            "set",
            "--hardware-dir",
            hardware_dir.to_str().unwrap(),
            "--default-device",
            "trmnl",
            "--fetch-timeout",
            "5",
        ],
        &config_dir,
    )
    .output()
    .expect("Failed to execute command");
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(config_dir.join("config.toml").exists());

    let result = show_json(&config_dir);
    assert_eq!(result["compile"]["default_device"], "trmnl");
    assert_eq!(result["network"]["fetch_timeout_secs"], 5);
    assert_eq!(
        result["paths"]["hardware_dir"].as_str().unwrap(),
        hardware_dir.to_str().unwrap()
    );
}

#[test]
fn test_config_set_requires_an_option() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let output = isolated_config_command(&["config", "set"], temp_dir.path())
        .output()
        .expect("Failed to execute command");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_config_set_rejects_missing_hardware_dir() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("nope");
    let output = isolated_config_command(
        &["config", "set", "--hardware-dir", missing.to_str().unwrap()],
        temp_dir.path(),
    )
    .output()
    .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert!(!temp_dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_rejects_zero_timeout() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let output =
        isolated_config_command(&["config", "set", "--fetch-timeout", "0"], temp_dir.path())
            .output()
            .expect("Failed to execute command");
    assert_eq!(output.status.code(), Some(1));
}

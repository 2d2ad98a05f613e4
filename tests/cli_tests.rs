//! CLI Integration Tests for deep-research
//!
//! Runs the built binary for the init and config commands and for argument
//! errors. Nothing here reaches the network.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn run_cli(args: &[&str], working_dir: &std::path::Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_deep-research"))
        .args(args)
        .current_dir(working_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_cli(&["--help"], temp_dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("init"));
    assert!(stdout.contains("config"));
}

#[test]
fn test_version_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_cli(&["--version"], temp_dir.path());

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("deep-research"));
}

#[test]
fn test_run_without_topic_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_cli(&["run"], temp_dir.path());
    assert!(!output.status.success());
}

// =============================================================================
// Init Tests
// =============================================================================

#[test]
fn test_init_creates_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_cli(&["--no-color", "init"], temp_dir.path());

    assert!(output.status.success());
    assert!(temp_dir.path().join("research.toml").exists());
    assert!(temp_dir.path().join(".env.example").exists());
    assert!(temp_dir.path().join(".gitignore").exists());

    let env = fs::read_to_string(temp_dir.path().join(".env.example")).unwrap();
    assert!(env.contains("TAVILY_API_KEY"));
    assert!(env.contains("YOUTUBE_API_KEY"));
}

#[test]
fn test_init_with_perplexity_backend() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_cli(&["init", "--search", "perplexity"], temp_dir.path());

    assert!(output.status.success());
    let toml = fs::read_to_string(temp_dir.path().join("research.toml")).unwrap();
    assert!(toml.contains("backend = \"perplexity\""));
}

#[test]
fn test_init_keeps_existing_config_without_force() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("research.toml"), "# mine").unwrap();

    let output = run_cli(&["--no-color", "init"], temp_dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("already exists"));
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("research.toml")).unwrap(),
        "# mine"
    );
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_validate_after_init() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    assert!(run_cli(&["init"], temp_dir.path()).status.success());

    let output = run_cli(&["--no-color", "config", "--validate"], temp_dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("llama3.2"));
    assert!(stdout.contains("Configuration is valid"));
}

#[test]
fn test_config_command_missing_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_cli(&["--no-color", "config"], temp_dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration file not found"));
}

#[test]
fn test_run_rejects_invalid_loop_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    assert!(run_cli(&["init"], temp_dir.path()).status.success());

    let output = run_cli(&["run", "quantum computing", "--max-loops", "500"], temp_dir.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_loops"));
}

#[test]
fn test_init_rejects_unknown_search_backend() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_cli(&["init", "--search", "altavista"], temp_dir.path());

    assert!(!output.status.success());
    assert!(!temp_dir.path().join("research.toml").exists());
}

//! CLI smoke tests for devgen.
//!
//! These tests verify that all CLI commands run without panicking and
//! return appropriate exit codes.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the devgen binary.
fn devgen_cmd() -> Command {
  let mut cmd: Command = cargo_bin_cmd!("devgen");
  cmd.env_remove("RUST_LOG");
  cmd
}

/// Create a temp directory with a config file.
fn temp_config(content: &str) -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("device.yaml"), content).unwrap();
  temp
}

const MINIMAL_CONFIG: &str = r#"
remote_receiver:
  pin: GPIO14
"#;

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  devgen_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  devgen_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("devgen"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["compile", "plan", "graph", "components"] {
    devgen_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn compile_minimal_config() {
  let temp = temp_config(MINIMAL_CONFIG);
  devgen_cmd()
    .arg("compile")
    .arg(temp.path().join("device.yaml"))
    .assert()
    .success()
    .stdout(predicate::str::contains("auto *remote_receiver_1 = new"));
}

#[test]
fn compile_empty_config() {
  let temp = temp_config("");
  devgen_cmd()
    .arg("compile")
    .arg(temp.path().join("device.yaml"))
    .assert()
    .success()
    .stdout(predicate::str::contains("void setup() {\n}"));
}

#[test]
fn compile_missing_file_fails() {
  devgen_cmd()
    .arg("compile")
    .arg("/nonexistent/device.yaml")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to compile config"));
}

#[test]
fn compile_invalid_yaml_fails() {
  let temp = temp_config("remote_receiver: [unclosed");
  devgen_cmd()
    .arg("compile")
    .arg(temp.path().join("device.yaml"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid YAML"));
}

#[test]
fn compile_json_requires_out() {
  let temp = temp_config(MINIMAL_CONFIG);
  devgen_cmd()
    .arg("compile")
    .arg(temp.path().join("device.yaml"))
    .arg("--json")
    .assert()
    .failure();
}

#[test]
fn plan_minimal_config() {
  let temp = temp_config(MINIMAL_CONFIG);
  devgen_cmd()
    .arg("plan")
    .arg(temp.path().join("device.yaml"))
    .assert()
    .success()
    .stdout(predicate::str::contains("remote_receiver_1"));
}

#[test]
fn graph_minimal_config() {
  let temp = temp_config(MINIMAL_CONFIG);
  devgen_cmd()
    .arg("graph")
    .arg(temp.path().join("device.yaml"))
    .assert()
    .success()
    .stdout(predicate::str::starts_with("digraph {"));
}

#[test]
fn components_lists_catalog() {
  devgen_cmd()
    .arg("components")
    .assert()
    .success()
    .stdout(predicate::str::contains("climate.mitsubishi_sez"))
    .stdout(predicate::str::contains("remote_receiver"));
}

#[test]
fn components_json_is_valid() {
  let output = devgen_cmd().arg("components").arg("--json").output().unwrap();
  assert!(output.status.success());

  let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(parsed.as_array().unwrap().len(), 4);
}

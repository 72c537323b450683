//! Plan, graph and components command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn plan_lists_tasks_with_dependencies() {
  let env = TestEnv::from_fixture("climate.yaml");

  env
    .devgen_cmd()
    .arg("plan")
    .arg(&env.config_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("living_room (climate.mitsubishi_sez)"))
    .stdout(predicate::str::contains("ir_tx, living_room_rx, room_temp"))
    .stdout(predicate::str::contains("Tasks: 4"));
}

#[test]
fn plan_json_has_owner_and_includes() {
  let env = TestEnv::from_fixture("climate.yaml");

  let output = env
    .devgen_cmd()
    .arg("plan")
    .arg(&env.config_path)
    .arg("--json")
    .output()
    .unwrap();
  assert!(output.status.success());

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let tasks = plan["tasks"].as_array().unwrap();
  let rx = tasks.iter().find(|t| t["id"] == "living_room_rx").unwrap();
  assert_eq!(rx["owner"], "living_room");
  assert_eq!(rx["root"], false);
  assert_eq!(rx["path"], "climate[0].receiver");
  assert!(plan["cycles"].as_array().unwrap().is_empty());
  assert!(
    plan["includes"]
      .as_array()
      .unwrap()
      .iter()
      .any(|i| i == "esphome/components/remote_receiver/remote_receiver.h")
  );
}

#[test]
fn plan_fails_on_planning_errors() {
  let env = TestEnv::from_fixture("duplicate.yaml");

  env
    .devgen_cmd()
    .arg("plan")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("duplicate identifier 'dev1'"));
}

#[test]
fn graph_has_edges_for_references() {
  let env = TestEnv::from_fixture("shared_receiver.yaml");

  env
    .devgen_cmd()
    .arg("graph")
    .arg(&env.config_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("label = \"ir_rx\""))
    .stdout(predicate::str::contains("->"));
}

//! Compile command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn compile_emits_dependencies_first() {
  let env = TestEnv::from_fixture("climate.yaml");

  let output = env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .output()
    .unwrap();
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

  let cpp = String::from_utf8(output.stdout).unwrap();
  let position = |needle: &str| {
    cpp
      .find(needle)
      .unwrap_or_else(|| panic!("missing {:?} in:\n{}", needle, cpp))
  };

  let tx = position("auto *ir_tx = new remote_transmitter::RemoteTransmitterComponent(4);");
  let sensor = position("auto *room_temp = new template_::TemplateSensor();");
  let rx = position("auto *living_room_rx = new remote_receiver::RemoteReceiverComponent(14);");
  let climate = position("auto *living_room = new mitsubishi_sez::MitsubishiSEZClimate();");
  assert!(tx < sensor && sensor < rx && rx < climate);

  assert!(cpp.contains("  room_temp->set_update_interval(30000);\n"));
  assert!(cpp.contains("  living_room->set_sensor(room_temp);\n"));
  assert!(cpp.contains("  living_room_rx->register_listener(living_room);\n"));
  assert!(cpp.contains("  living_room->set_transmitter(ir_tx);\n"));
  assert!(cpp.contains("  App.register_climate(living_room);\n"));
  assert!(cpp.contains("#include \"esphome/components/climate_ir/climate_ir.h\""));
}

#[test]
fn compile_writes_json_lines_to_file() {
  let env = TestEnv::from_fixture("climate.yaml");
  let out = env.out_path("records.jsonl");

  env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .args(["--format", "json", "--out"])
    .arg(&out)
    .assert()
    .success()
    .stdout(predicate::str::contains("Generated"))
    .stdout(predicate::str::contains("Objects: 4"));

  let ids: Vec<String> = env
    .read_output("records.jsonl")
    .lines()
    .map(|line| {
      let record: serde_json::Value = serde_json::from_str(line).unwrap();
      record["id"].as_str().unwrap().to_string()
    })
    .collect();
  assert_eq!(ids, vec!["ir_tx", "room_temp", "living_room_rx", "living_room"]);
}

#[test]
fn compile_is_idempotent() {
  let env = TestEnv::from_fixture("shared_receiver.yaml");

  let run = |name: &str| {
    env
      .devgen_cmd()
      .arg("compile")
      .arg(&env.config_path)
      .arg("--out")
      .arg(env.out_path(name))
      .assert()
      .success();
    env.read_output(name)
  };

  let first = run("first.cpp");
  let second = run("second.cpp");
  assert_eq!(first, second);
  assert_eq!(first.matches("auto *ir_rx = new").count(), 1);
}

#[test]
fn compile_json_report() {
  let env = TestEnv::from_fixture("duplicate.yaml");

  let output = env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .arg("--out")
    .arg(env.out_path("out.cpp"))
    .arg("--json")
    .output()
    .unwrap();
  assert!(!output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["success"], false);
  assert_eq!(report["emitted"], serde_json::json!(["other"]));
  assert_eq!(report["errors"][0]["kind"], "duplicate_identifier");
  assert_eq!(report["errors"][0]["identifiers"], serde_json::json!(["dev1"]));
}

#[test]
fn compile_reports_duplicate_and_keeps_unrelated() {
  let env = TestEnv::from_fixture("duplicate.yaml");

  env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stdout(predicate::str::contains("auto *other = new"))
    .stdout(predicate::str::contains("auto *dev1").not())
    .stderr(predicate::str::contains(
      "duplicate identifier 'dev1': declared at remote_receiver[0] and again at remote_receiver[1]",
    ));
}

#[test]
fn compile_reports_unknown_reference() {
  let env = TestEnv::from_fixture("unknown_reference.yaml");

  env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stdout(predicate::str::contains("auto *ir_tx = new"))
    .stderr(predicate::str::contains(
      "'ac' field 'receiver' refers to unknown identifier 'missing_rx'",
    ));
}

#[test]
fn compile_checks_requirements() {
  let env = TestEnv::from_fixture("missing_transmitter.yaml");

  env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains(
      "'ac' requires a remote_transmitter component, but none is configured",
    ));
}

#[test]
fn compile_skip_requirements_still_needs_a_transmitter() {
  let env = TestEnv::from_fixture("missing_transmitter.yaml");

  env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .arg("--skip-requirements")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no remote_transmitter is configured"));
}

#[test]
fn compile_skips_dependents_of_invalid_component() {
  let env = TestEnv::from_fixture("invalid_pin.yaml");

  env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stdout(predicate::str::contains("auto *spare_rx = new"))
    .stderr(predicate::str::contains("remote_transmitter.pin: pin 99 is out of range"))
    .stderr(predicate::str::contains("'ac' skipped: dependency 'ir_tx' failed"));
}

#[test]
fn compile_fail_fast_cancels_later_components() {
  let env = TestEnv::from_fixture("invalid_pin.yaml");

  env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .arg("--fail-fast")
    .assert()
    .failure()
    .stdout(predicate::str::contains("auto *spare_rx").not())
    .stderr(predicate::str::contains("'spare_rx' cancelled"));
}

#[test]
fn compile_invalid_config_leaves_no_output_file() {
  let env = TestEnv::from_fixture("climate.yaml");
  std::fs::write(&env.config_path, "climate: [unclosed\n").unwrap();
  let out = env.out_path("out.cpp");

  env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .arg("--out")
    .arg(&out)
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid YAML"));

  assert!(!out.exists());
}

#[test]
fn compile_json_lines_carry_record_hashes() {
  let env = TestEnv::from_fixture("shared_receiver.yaml");
  let out = env.out_path("records.jsonl");

  env
    .devgen_cmd()
    .arg("compile")
    .arg(&env.config_path)
    .args(["--format", "json", "--out"])
    .arg(&out)
    .assert()
    .success();

  for line in env.read_output("records.jsonl").lines() {
    let record: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(record["hash"].as_str().map(str::len), Some(20), "{}", line);
  }
}

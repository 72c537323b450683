//! End-to-end scenarios from YAML to emitted records.

use devgen_lib::config::parse_config;
use devgen_lib::registry::Identifier;
use devgen_lib::schedule::{BuildError, BuildOptions};
use devgen_lib::{EmitFormat, compile_to};

use super::common::{compile_yaml, compile_yaml_with, ids};

#[test]
fn forward_reference_suspends_until_dependency_is_built() {
  let (report, log) = compile_yaml(
    r#"
climate:
  - platform: mitsubishi_sez
    id: ac
    name: AC
    receiver_id: ir_rx
remote_transmitter:
  id: ir_tx
  pin: GPIO4
remote_receiver:
  id: ir_rx
  pin: GPIO14
"#,
  );

  assert!(report.is_success(), "{:?}", report);
  assert_eq!(log.ids(), vec!["ir_rx", "ir_tx", "ac"]);
  let ac = log.get("ac").unwrap();
  let references: Vec<&str> = ac.references().map(Identifier::as_str).collect();
  assert_eq!(references, vec!["ir_rx", "ir_tx"]);
}

#[test]
fn shared_dependency_is_emitted_once() {
  let (report, log) = compile_yaml(
    r#"
remote_transmitter:
  pin: GPIO4
remote_receiver:
  id: ir_rx
  pin: GPIO14
climate:
  - platform: mitsubishi_sez
    name: Bedroom
    receiver_id: ir_rx
  - platform: mitsubishi_sez
    name: Office
    receiver_id: ir_rx
"#,
  );

  assert!(report.is_success(), "{:?}", report);
  assert_eq!(
    log.ids(),
    vec!["remote_transmitter_1", "ir_rx", "climate_1", "climate_2"]
  );
}

#[test]
fn generated_identifiers_skip_explicit_ones() {
  let (report, log) = compile_yaml(
    r#"
remote_receiver:
  - pin: GPIO12
  - id: remote_receiver_1
    pin: GPIO13
"#,
  );

  assert!(report.is_success(), "{:?}", report);
  assert_eq!(log.ids(), vec!["remote_receiver_2", "remote_receiver_1"]);
}

#[test]
fn duplicate_identifier_fails_both_and_keeps_the_rest() {
  let (report, log) = compile_yaml(
    r#"
remote_receiver:
  - id: dev1
    pin: GPIO12
  - id: dev1
    pin: GPIO13
  - id: other
    pin: GPIO14
"#,
  );

  assert_eq!(log.ids(), vec!["other"]);
  assert_eq!(report.errors.len(), 1);
  assert!(matches!(&report.errors[0], BuildError::DuplicateIdentifier(e) if e.id.as_str() == "dev1"));
  assert_eq!(ids(&report.failed), vec!["dev1"]);
}

#[test]
fn unknown_reference_fails_only_the_referrer() {
  let (report, log) = compile_yaml(
    r#"
remote_transmitter:
  id: ir_tx
  pin: GPIO4
climate:
  - platform: mitsubishi_sez
    id: ac
    name: AC
    receiver_id: missing_rx
"#,
  );

  assert_eq!(log.ids(), vec!["ir_tx"]);
  assert_eq!(
    report.errors,
    vec![BuildError::UnknownIdentifier {
      id: "missing_rx".into(),
      referenced_by: "ac".into(),
      field: "receiver".to_string(),
    }]
  );
  assert_eq!(ids(&report.failed), vec!["ac"]);
}

#[test]
fn invalid_dependency_skips_dependents() {
  let (report, log) = compile_yaml(
    r#"
remote_transmitter:
  id: ir_tx
  pin: GPIO99
climate:
  - platform: mitsubishi_sez
    id: ac
    name: AC
remote_receiver:
  id: spare_rx
  pin: GPIO15
"#,
  );

  assert_eq!(log.ids(), vec!["spare_rx"]);
  assert_eq!(report.errors.len(), 1);
  assert_eq!(report.errors[0].kind(), "config");
  assert_eq!(report.skipped.get(&"ac".into()), Some(&"ir_tx".into()));
  assert!(report.cancelled.is_empty());
}

#[test]
fn missing_requirement_can_be_disabled() {
  let yaml = r#"
climate:
  - platform: mitsubishi_sez
    id: ac
    name: AC
"#;

  let (checked, _) = compile_yaml(yaml);
  assert_eq!(checked.errors.len(), 1);
  assert_eq!(checked.errors[0].kind(), "missing_requirement");

  let (unchecked, log) = compile_yaml_with(
    yaml,
    BuildOptions {
      check_requirements: false,
      ..BuildOptions::default()
    },
  );
  assert!(log.ids().is_empty());
  assert_eq!(unchecked.errors.len(), 1);
  assert!(
    unchecked.errors[0]
      .to_string()
      .contains("no remote_transmitter is configured"),
    "{}",
    unchecked.errors[0]
  );
}

#[test]
fn compiling_twice_is_byte_identical() {
  let tree = parse_config(
    r#"
remote_transmitter:
  id: ir_tx
  pin: GPIO4
sensor:
  - platform: template
    id: room_temp
    name: Room
climate:
  - platform: mitsubishi_sez
    id: ac
    name: AC
    sensor: room_temp
    receiver:
      pin: GPIO14
"#,
  )
  .unwrap();

  let render = || {
    let mut out = Vec::new();
    let report = compile_to(&tree, &BuildOptions::default(), EmitFormat::Cpp, &mut out).unwrap();
    (report, out)
  };

  let (first_report, first) = render();
  let (second_report, second) = render();
  assert!(first_report.is_success(), "{:?}", first_report);
  assert_eq!(first, second);
  assert_eq!(first_report.fingerprint, second_report.fingerprint);
  assert_eq!(first_report.emitted, second_report.emitted);
}

#[test]
fn reference_into_a_rejected_node_is_skipped() {
  let (report, log) = compile_yaml(
    r#"
remote_transmitter:
  id: ir_tx
  pin: GPIO4
climate:
  - platform: mitsubishi_sez
    id: ac1
    name: AC 1
    supports_cool: maybe
    receiver:
      id: shared_rx
      pin: GPIO14
  - platform: mitsubishi_sez
    id: ac2
    name: AC 2
    receiver_id: shared_rx
"#,
  );

  assert_eq!(log.ids(), vec!["ir_tx"]);
  assert_eq!(report.errors.len(), 1);
  assert_eq!(report.errors[0].kind(), "config");
  assert_eq!(report.skipped.get(&"ac2".into()), Some(&"shared_rx".into()));
  assert!(ids(&report.failed).contains(&"shared_rx"));
}

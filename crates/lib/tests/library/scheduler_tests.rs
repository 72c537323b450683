//! Scheduler behaviour over hand-built task graphs.

use std::collections::BTreeMap;

use proptest::prelude::*;

use devgen_lib::registry::EntryState;
use devgen_lib::schedule::{BuildError, BuildOptions};

use super::common::{ids, run_nodes};

#[test]
fn dependency_requested_before_its_root_runs_first() {
  let (report, log, _) = run_nodes(&[("a", vec!["b"]), ("b", vec![])], BuildOptions::default());

  assert!(report.is_success());
  assert_eq!(log.ids(), vec!["b", "a"]);
  assert!(log.is_finished());
}

#[test]
fn cycle_fails_members_and_keeps_unrelated_roots() {
  let (report, log, registry) = run_nodes(
    &[("a", vec!["b"]), ("b", vec!["a"]), ("c", vec![])],
    BuildOptions::default(),
  );

  assert_eq!(
    report.errors,
    vec![BuildError::CycleDetected {
      cycle: vec!["a".into(), "b".into()],
    }]
  );
  assert_eq!(ids(&report.failed), vec!["a", "b"]);
  assert_eq!(log.ids(), vec!["c"]);
  assert_eq!(registry.state(&"a".into()), Some(EntryState::Failed));
  assert_eq!(registry.state(&"c".into()), Some(EntryState::Finished));
}

#[test]
fn dependents_of_a_cycle_are_skipped() {
  let (report, log, _) = run_nodes(
    &[("top", vec!["a"]), ("a", vec!["b"]), ("b", vec!["a"])],
    BuildOptions::default(),
  );

  assert_eq!(report.errors.len(), 1);
  assert_eq!(report.skipped.get(&"top".into()), Some(&"a".into()));
  assert!(log.ids().is_empty());
}

#[test]
fn fail_fast_cancels_the_remaining_roots() {
  let (report, log, _) = run_nodes(
    &[("a", vec!["ghost"]), ("b", vec![]), ("c", vec![])],
    BuildOptions {
      fail_fast: true,
      ..BuildOptions::default()
    },
  );

  assert!(log.ids().is_empty());
  assert_eq!(ids(&report.cancelled), vec!["b", "c"]);
  assert_eq!(report.total(), 3);
}

/// A random DAG: `deps[i]` lists indices smaller than `i`, plus a root order.
fn dag() -> impl Strategy<Value = (Vec<Vec<usize>>, Vec<usize>)> {
  (1usize..12).prop_flat_map(|n| {
    let deps = (0..n)
      .map(|i| proptest::sample::subsequence((0..i).collect::<Vec<_>>(), 0..=i))
      .collect::<Vec<_>>();
    let order = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
    (deps, order)
  })
}

proptest! {
  #[test]
  fn every_record_follows_its_dependencies((deps, order) in dag()) {
    let names: Vec<String> = (0..deps.len()).map(|i| format!("n{}", i)).collect();
    let nodes: Vec<(&str, Vec<&str>)> = order
      .iter()
      .map(|&i| (names[i].as_str(), deps[i].iter().map(|&d| names[d].as_str()).collect()))
      .collect();

    let (report, log, _) = run_nodes(&nodes, BuildOptions::default());
    prop_assert!(report.is_success());

    let emitted = log.ids();
    prop_assert_eq!(emitted.len(), names.len());
    let position: BTreeMap<&str, usize> = emitted.iter().enumerate().map(|(p, id)| (*id, p)).collect();
    for (i, needs) in deps.iter().enumerate() {
      for &d in needs {
        prop_assert!(position[names[d].as_str()] < position[names[i].as_str()]);
      }
    }
  }
}

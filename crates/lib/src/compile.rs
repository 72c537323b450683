//! One-call compile pipeline: configuration in, records out.
//!
//! Each call creates its own [`IdentifierRegistry`], so nothing leaks between
//! runs and compiling the same configuration twice yields the same stream.

use std::io::Write;

use tracing::info;

use crate::config::ConfigTree;
use crate::emit::{CppSink, EmissionSink, JsonLinesSink};
use crate::plan::{Plan, Planner};
use crate::registry::IdentifierRegistry;
use crate::schedule::{BuildOptions, BuildReport, RunError, Scheduler};

/// Output format for [`compile_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitFormat {
  /// A C++ `setup()` function.
  #[default]
  Cpp,
  /// One JSON record per line.
  JsonLines,
}

/// Plan `tree` with a fresh registry.
pub fn plan_config(tree: &ConfigTree, options: &BuildOptions) -> (Plan, IdentifierRegistry) {
  let mut registry = IdentifierRegistry::new();
  let plan = Planner::new()
    .check_requirements(options.check_requirements)
    .plan(tree, &mut registry);
  (plan, registry)
}

/// Plan and run `tree`, sending records to `sink`.
pub fn compile(
  tree: &ConfigTree,
  options: &BuildOptions,
  sink: &mut dyn EmissionSink,
) -> Result<BuildReport, RunError> {
  let (plan, mut registry) = plan_config(tree, options);
  Scheduler::from_plan(plan, &mut registry, options.clone()).run(sink)
}

/// Plan and run `tree`, rendering records to `writer` in `format`.
pub fn compile_to<W: Write>(
  tree: &ConfigTree,
  options: &BuildOptions,
  format: EmitFormat,
  writer: W,
) -> Result<BuildReport, RunError> {
  info!(format = ?format, nodes = tree.nodes().len(), "compiling configuration");
  let (plan, mut registry) = plan_config(tree, options);
  match format {
    EmitFormat::Cpp => {
      let mut sink = CppSink::new(writer, plan.includes());
      Scheduler::from_plan(plan, &mut registry, options.clone()).run(&mut sink)
    }
    EmitFormat::JsonLines => {
      let mut sink = JsonLinesSink::new(writer);
      Scheduler::from_plan(plan, &mut registry, options.clone()).run(&mut sink)
    }
  }
}

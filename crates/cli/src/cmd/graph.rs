//! Implementation of the `devgen graph` command: DOT output of the plan.

use std::path::Path;

use anyhow::{Context, Result};

use devgen_lib::config::load_config;
use devgen_lib::plan::graph::PlanGraph;
use devgen_lib::plan_config;
use devgen_lib::schedule::BuildOptions;

pub fn cmd_graph(config: &Path) -> Result<()> {
  let tree = load_config(config).with_context(|| format!("Failed to load config: {}", config.display()))?;
  let (plan, registry) = plan_config(&tree, &BuildOptions::default());
  let graph = PlanGraph::from_plan(&plan, &registry);
  print!("{}", graph.to_dot());
  Ok(())
}

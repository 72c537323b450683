//! Implementation of the `devgen plan` command.
//!
//! Plans a configuration without running it and prints every task with its
//! statically known dependencies.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::json;

use devgen_lib::config::load_config;
use devgen_lib::plan::graph::PlanGraph;
use devgen_lib::plan_config;
use devgen_lib::schedule::BuildOptions;

use crate::output::{self, print_error, print_info, print_json, print_stat, print_warning};

use super::error_json;

pub fn cmd_plan(config: &Path, verbose: bool, json: bool) -> Result<()> {
  let tree = load_config(config).with_context(|| format!("Failed to load config: {}", config.display()))?;
  let (plan, registry) = plan_config(&tree, &BuildOptions::default());
  let graph = PlanGraph::from_plan(&plan, &registry);
  let cycles = graph.cycles();

  if json {
    let tasks: Vec<_> = plan
      .tasks()
      .iter()
      .enumerate()
      .map(|(index, task)| {
        json!({
          "id": task.id(),
          "kind": task.kind(),
          "path": task.origin().to_string(),
          "owner": task.owner().and_then(|owner| plan.task(owner)).map(|owner| owner.id()),
          "root": plan.roots().iter().any(|root| root.index() == index),
          "state": task.state().to_string(),
          "dependencies": graph.dependencies(task.id()),
        })
      })
      .collect();
    print_json(&json!({
      "tasks": tasks,
      "loaded": plan.loaded().collect::<Vec<_>>(),
      "includes": plan.includes(),
      "errors": plan.errors().iter().map(error_json).collect::<Vec<_>>(),
      "cycles": cycles,
    }))?;
  } else {
    print_info(&format!("Plan for {}", config.display()));
    for task in plan.tasks() {
      let dependencies = graph.dependencies(task.id());
      let mut line = format!("  {} {} ({})", output::symbols::INFO, task.id(), task.kind().qualified_name());
      if !dependencies.is_empty() {
        let names: Vec<&str> = dependencies.iter().map(|id| id.as_str()).collect();
        line.push_str(&format!(" {} {}", output::symbols::ARROW, names.join(", ")));
      }
      println!("{}", line);
      if verbose {
        println!("      {} [{}]", task.origin(), task.state());
      }
    }
    println!();
    print_stat("Tasks", &plan.tasks().len().to_string());
    print_stat("Roots", &plan.roots().len().to_string());
    print_stat("Loaded", &plan.loaded().collect::<Vec<_>>().join(", "));

    for error in plan.errors() {
      print_error(&error.to_string());
    }
    for cycle in &cycles {
      let names: Vec<&str> = cycle.iter().map(|id| id.as_str()).collect();
      print_warning(&format!("dependency cycle: {}", names.join(", ")));
    }
  }

  if !plan.is_clean() {
    bail!("plan has {} error(s)", plan.errors().len());
  }
  Ok(())
}

//! Static dependency graph of a plan.
//!
//! The scheduler discovers dependencies while it runs, so it is the authority
//! on ordering and cycles. This graph is the static view of the same
//! relation, built from each task's known references, for inspection:
//! listing cycles up front, exporting DOT, and checking an emitted order.

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::registry::{Identifier, IdentifierRegistry};

use super::Plan;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("dependency cycle through '{0}'")]
  Cycle(Identifier),
}

/// Planned tasks with edges from each dependency to its dependents.
#[derive(Debug, Default)]
pub struct PlanGraph {
  graph: DiGraph<Identifier, ()>,
  nodes: BTreeMap<Identifier, NodeIndex>,
}

impl PlanGraph {
  /// Build the graph for `plan`. References to identifiers that are not
  /// planned tasks are left out.
  pub fn from_plan(plan: &Plan, registry: &IdentifierRegistry) -> Self {
    let mut graph = DiGraph::new();
    let mut nodes = BTreeMap::new();

    for task in plan.tasks() {
      let idx = graph.add_node(task.id().clone());
      nodes.insert(task.id().clone(), idx);
    }

    for task in plan.tasks() {
      let dependent = nodes[task.id()];
      for dependency in task.static_dependencies(registry) {
        if let Some(&dep_idx) = nodes.get(&dependency)
          && !graph.contains_edge(dep_idx, dependent)
        {
          graph.add_edge(dep_idx, dependent, ());
        }
      }
    }

    Self { graph, nodes }
  }

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  /// Direct dependencies of `id`, sorted.
  pub fn dependencies(&self, id: &Identifier) -> Vec<Identifier> {
    self.neighbors(id, Direction::Incoming)
  }

  /// Direct dependents of `id`, sorted.
  pub fn dependents(&self, id: &Identifier) -> Vec<Identifier> {
    self.neighbors(id, Direction::Outgoing)
  }

  fn neighbors(&self, id: &Identifier, direction: Direction) -> Vec<Identifier> {
    let Some(&idx) = self.nodes.get(id) else {
      return Vec::new();
    };
    let mut ids: Vec<Identifier> = self
      .graph
      .neighbors_directed(idx, direction)
      .map(|n| self.graph[n].clone())
      .collect();
    ids.sort();
    ids
  }

  /// Every cycle as a sorted list of members; self references count.
  pub fn cycles(&self) -> Vec<Vec<Identifier>> {
    let mut cycles: Vec<Vec<Identifier>> = tarjan_scc(&self.graph)
      .into_iter()
      .filter(|scc| scc.len() > 1 || scc.iter().any(|&n| self.graph.contains_edge(n, n)))
      .map(|scc| {
        let mut ids: Vec<Identifier> = scc.into_iter().map(|n| self.graph[n].clone()).collect();
        ids.sort();
        ids
      })
      .collect();
    cycles.sort();
    cycles
  }

  /// Identifiers with every dependency before its dependents.
  pub fn topological_ids(&self) -> Result<Vec<Identifier>, GraphError> {
    let sorted = toposort(&self.graph, None).map_err(|cycle| GraphError::Cycle(self.graph[cycle.node_id()].clone()))?;
    Ok(sorted.into_iter().map(|idx| self.graph[idx].clone()).collect())
  }

  /// Check that `order` never places a dependent before its dependency.
  pub fn respects(&self, order: &[Identifier]) -> bool {
    let position: BTreeMap<&Identifier, usize> = order.iter().enumerate().map(|(i, id)| (id, i)).collect();
    self.graph.edge_indices().all(|edge| {
      let Some((from, to)) = self.graph.edge_endpoints(edge) else {
        return true;
      };
      match (position.get(&self.graph[from]), position.get(&self.graph[to])) {
        (Some(dep), Some(dependent)) => dep < dependent,
        (None, Some(_)) => false,
        _ => true,
      }
    })
  }

  /// Graphviz rendering of the graph.
  pub fn to_dot(&self) -> String {
    let dot = Dot::with_attr_getters(
      &self.graph,
      &[Config::EdgeNoLabel, Config::NodeNoLabel],
      &|_, _| String::new(),
      &|_, (_, id)| format!("label = \"{}\"", id),
    );
    format!("{:?}", dot)
  }
}

//! Shared helpers for library integration tests.

use devgen_lib::compile;
use devgen_lib::config::{ConfigPath, parse_config};
use devgen_lib::emit::RecordLog;
use devgen_lib::record::{AssignStyle, ConstructionRecord, FieldAssignment, ObjectKind};
use devgen_lib::registry::{Handle, Identifier, IdentifierRegistry};
use devgen_lib::schedule::{
  BuildCtx, BuildError, BuildOptions, BuildReport, BuildTask, Buildable, DependencyRequest, Scheduler, Step,
};

/// Compile `yaml` with default options, collecting records in memory.
pub fn compile_yaml(yaml: &str) -> (BuildReport, RecordLog) {
  compile_yaml_with(yaml, BuildOptions::default())
}

pub fn compile_yaml_with(yaml: &str, options: BuildOptions) -> (BuildReport, RecordLog) {
  let tree = parse_config(yaml).unwrap();
  let mut log = RecordLog::new();
  let report = compile(&tree, &options, &mut log).unwrap();
  (report, log)
}

pub fn ids(ids: &[Identifier]) -> Vec<&str> {
  ids.iter().map(Identifier::as_str).collect()
}

/// A task that requests `needs` one at a time and references each in its record.
pub struct Node {
  needs: Vec<String>,
  next: usize,
  fields: Vec<FieldAssignment>,
}

impl Node {
  pub fn new(needs: &[&str]) -> Self {
    Self {
      needs: needs.iter().map(|s| s.to_string()).collect(),
      next: 0,
      fields: Vec::new(),
    }
  }
}

impl Buildable for Node {
  fn step(&mut self, ctx: &BuildCtx<'_>, resumed: Option<Handle>) -> Result<Step, BuildError> {
    if let Some(handle) = resumed {
      self
        .fields
        .push(FieldAssignment::reference("input", handle.id, AssignStyle::Setter));
    }
    if let Some(need) = self.needs.get(self.next) {
      self.next += 1;
      return Ok(Step::Await(DependencyRequest::new("input", Identifier::new(need.as_str()))));
    }

    let mut record = ConstructionRecord::new(ctx.id().clone(), kind());
    record.fields = std::mem::take(&mut self.fields);
    Ok(Step::Done(record))
  }

  fn static_dependencies(&self, _registry: &IdentifierRegistry) -> Vec<Identifier> {
    self.needs.iter().map(|n| Identifier::new(n.as_str())).collect()
  }
}

pub fn kind() -> ObjectKind {
  ObjectKind::new("remote_receiver", "remote_receiver::RemoteReceiverComponent")
}

/// Run `nodes` as roots in the given order. Each entry is `(id, needs)`.
pub fn run_nodes(nodes: &[(&str, Vec<&str>)], options: BuildOptions) -> (BuildReport, RecordLog, IdentifierRegistry) {
  let mut registry = IdentifierRegistry::new();
  for (id, _) in nodes {
    registry
      .declare(Identifier::new(*id), kind(), ConfigPath::root().key(id))
      .unwrap();
  }

  let mut log = RecordLog::new();
  let report = {
    let mut scheduler = Scheduler::new(&mut registry, options);
    for (id, needs) in nodes {
      scheduler.add_root(BuildTask::new(
        Identifier::new(*id),
        kind(),
        ConfigPath::root().key(id),
        Box::new(Node::new(needs)),
      ));
    }
    scheduler.run(&mut log).unwrap()
  };
  (report, log, registry)
}

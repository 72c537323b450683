//! Object graph builder.
//!
//! The planner turns a [`ConfigTree`] into a [`Plan`]: an arena of build
//! tasks, the roots to run in document order, and every error found while
//! planning. Planning never stops at the first problem; a failing node only
//! removes its own branch.
//!
//! # Identifiers
//!
//! Every node gets an identifier before it is validated: its `id` key when
//! that is a valid identifier, otherwise `<domain>_<n>`. Generated names skip
//! every `id` written anywhere in the document, so adding an explicit id never
//! renames another object. A node that fails still declares its identifier
//! (as failed), which lets its dependents be skipped instead of reporting a
//! dangling reference.
//!
//! # Nested components
//!
//! A field holding an inline mapping (`receiver: {pin: GPIO14}`) is planned as
//! a child task owned by its parent. The parent requests the child like any
//! other reference, so the child is built right before it is needed.

mod component;
pub mod graph;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::catalog::{Catalog, ComponentDef};
use crate::config::{ConfigMap, ConfigPath, ConfigTree, ConfigValue};
use crate::consts::{AUTO_ID_START, ID_KEY, PLATFORM_KEY};
use crate::record::ObjectKind;
use crate::registry::{DuplicateIdentifierError, EntryState, Identifier, IdentifierRegistry};
use crate::schedule::{BuildError, BuildTask, TaskId, TaskState};
use crate::schema::{FieldType, SchemaValidator, ValidatedValue, Validator};

pub use component::ComponentBuild;
use component::PlannedField;

/// The outcome of planning one configuration.
#[derive(Debug, Default)]
pub struct Plan {
  tasks: Vec<BuildTask>,
  roots: Vec<TaskId>,
  errors: Vec<BuildError>,
  failed: Vec<Identifier>,
  loaded: BTreeSet<String>,
  includes: BTreeSet<String>,
}

impl Plan {
  /// All planned tasks; a task's [`TaskId`] is its index here.
  pub fn tasks(&self) -> &[BuildTask] {
    &self.tasks
  }

  pub fn task(&self, id: TaskId) -> Option<&BuildTask> {
    self.tasks.get(id.index())
  }

  /// Top-level tasks in document order.
  pub fn roots(&self) -> &[TaskId] {
    &self.roots
  }

  pub fn errors(&self) -> &[BuildError] {
    &self.errors
  }

  /// Identifiers that failed during planning.
  pub fn failed(&self) -> &[Identifier] {
    &self.failed
  }

  /// Component names the generated program uses: domains, platforms and
  /// auto-loaded components.
  pub fn loaded(&self) -> impl Iterator<Item = &str> {
    self.loaded.iter().map(String::as_str)
  }

  /// Headers to include for the loaded components, sorted.
  pub fn includes(&self) -> Vec<String> {
    self.includes.iter().cloned().collect()
  }

  /// Returns true if planning found no errors.
  pub fn is_clean(&self) -> bool {
    self.errors.is_empty()
  }

  pub(crate) fn into_parts(self) -> (Vec<BuildTask>, Vec<TaskId>, Vec<BuildError>, Vec<Identifier>) {
    (self.tasks, self.roots, self.errors, self.failed)
  }
}

/// Builds plans from configuration trees.
#[derive(Debug, Clone)]
pub struct Planner<V = SchemaValidator> {
  catalog: Catalog,
  validator: V,
  check_requirements: bool,
}

impl Planner {
  /// A planner over the built-in catalog and schema validator.
  pub fn new() -> Self {
    Self::with_validator(Catalog::builtin(), SchemaValidator)
  }
}

impl Default for Planner {
  fn default() -> Self {
    Self::new()
  }
}

impl<V: Validator> Planner<V> {
  pub fn with_validator(catalog: Catalog, validator: V) -> Self {
    Self {
      catalog,
      validator,
      check_requirements: true,
    }
  }

  /// Whether to fail components whose `requires` domains are absent.
  pub fn check_requirements(mut self, check: bool) -> Self {
    self.check_requirements = check;
    self
  }

  /// Plan every node of `tree`, declaring identifiers in `registry`.
  pub fn plan(&self, tree: &ConfigTree, registry: &mut IdentifierRegistry) -> Plan {
    let mut reserved = BTreeSet::new();
    collect_ids(tree.root(), &mut reserved);

    let mut builder = PlanBuilder {
      planner: self,
      registry,
      reserved,
      counters: BTreeMap::new(),
      index: BTreeMap::new(),
      planned: Vec::new(),
      seen_domains: BTreeSet::new(),
      plan: Plan::default(),
    };

    for node in tree.nodes() {
      match node {
        Ok(node) => {
          let id = builder.assign_id(node.domain, node.map);
          if let Some(task) = builder.plan_node(node.domain, node.map, node.path, None, id) {
            builder.plan.roots.push(task);
          }
        }
        Err(error) => builder.plan.errors.push(error.into()),
      }
    }

    if self.check_requirements {
      builder.check_requirements();
    }
    builder.collect_loaded();

    debug!(
      tasks = builder.plan.tasks.len(),
      roots = builder.plan.roots.len(),
      errors = builder.plan.errors.len(),
      "planned configuration"
    );
    builder.plan
  }
}

/// Working state of one `Planner::plan` call.
struct PlanBuilder<'p, 'r, V> {
  planner: &'p Planner<V>,
  registry: &'r mut IdentifierRegistry,
  /// Every `id` written in the document.
  reserved: BTreeSet<Identifier>,
  counters: BTreeMap<String, usize>,
  index: BTreeMap<Identifier, TaskId>,
  planned: Vec<(TaskId, &'static ComponentDef)>,
  seen_domains: BTreeSet<String>,
  plan: Plan,
}

impl<V: Validator> PlanBuilder<'_, '_, V> {
  /// The node's own `id`, or the next free generated one.
  fn assign_id(&mut self, domain: &str, map: &ConfigMap) -> Identifier {
    if let Some(id) = map.get(ID_KEY).and_then(ConfigValue::as_str) {
      if Identifier::is_valid(id) {
        return Identifier::new(id);
      }
    }

    let counter = self.counters.entry(domain.to_string()).or_insert(AUTO_ID_START);
    loop {
      let candidate = Identifier::new(format!("{}_{}", domain, counter));
      *counter += 1;
      if !self.reserved.contains(&candidate) && self.registry.state(&candidate).is_none() {
        debug!(id = %candidate, domain, "generated identifier");
        return candidate;
      }
    }
  }

  fn plan_node(
    &mut self,
    domain: &str,
    map: &ConfigMap,
    path: ConfigPath,
    owner: Option<TaskId>,
    id: Identifier,
  ) -> Option<TaskId> {
    self.seen_domains.insert(domain.to_string());

    let platform = match map.get(PLATFORM_KEY) {
      None => None,
      Some(ConfigValue::String(platform)) => Some(platform.as_str()),
      Some(other) => {
        let error = BuildError::config(
          &path.key(PLATFORM_KEY),
          format!("expected a platform name, found {}", other.type_name()),
        );
        self.fail_nested(None, map, &path);
        self.reject(id, ObjectKind::new(domain, ""), path, vec![error]);
        return None;
      }
    };

    let def = match self.planner.catalog.lookup(domain, platform) {
      Ok(def) => def,
      Err(error) => {
        let error = BuildError::lookup(&path, error);
        let mut kind = ObjectKind::new(domain, "");
        kind.platform = platform.map(str::to_string);
        self.fail_nested(None, map, &path);
        self.reject(id, kind, path, vec![error]);
        return None;
      }
    };

    let node = match self.planner.validator.validate(def, map, &path) {
      Ok(node) => node,
      Err(errors) => {
        let errors = errors.into_iter().map(BuildError::from).collect();
        self.fail_nested(Some(def), map, &path);
        self.reject(id, def.kind(), path, errors);
        return None;
      }
    };

    if let Err(duplicate) = self.registry.declare(id.clone(), def.kind(), path.clone()) {
      self.duplicate(duplicate);
      self.fail_nested(Some(def), map, &path);
      return None;
    }

    let mut fields = Vec::with_capacity(node.fields.len());
    let mut children = Vec::new();
    for field in node.fields {
      let spec = field.spec;
      let planned = match field.value {
        ValidatedValue::Literal(value) => PlannedField::Literal { spec, value },
        ValidatedValue::Reference(target) => PlannedField::Reference {
          spec,
          id: target,
          nested: false,
          path: field.path,
        },
        ValidatedValue::Nested { domain, map } => {
          let child = self.assign_id(domain, &map);
          let planned = PlannedField::Reference {
            spec,
            id: child.clone(),
            nested: true,
            path: field.path.clone(),
          };
          children.push((domain, map, field.path, child));
          planned
        }
        ValidatedValue::Sole { domain } => PlannedField::Sole {
          spec,
          domain,
          path: field.path,
        },
      };
      fields.push(planned);
    }

    let body = ComponentBuild::new(def, fields);
    let mut task = BuildTask::new(id.clone(), def.kind(), path.clone(), Box::new(body));
    if let Some(owner) = owner {
      task = task.with_owner(owner);
    }

    let task_id = TaskId(self.plan.tasks.len());
    self.plan.tasks.push(task);
    self.index.insert(id.clone(), task_id);
    self.planned.push((task_id, def));
    debug!(id = %id, class = def.class, path = %path, owner = ?owner, "planned component");

    for (domain, map, path, child) in children {
      self.plan_node(domain, &map, path, Some(task_id), child);
    }

    Some(task_id)
  }

  /// Record a node that cannot be planned, declaring its identifier as failed.
  fn reject(&mut self, id: Identifier, kind: ObjectKind, path: ConfigPath, errors: Vec<BuildError>) {
    warn!(id = %id, path = %path, errors = errors.len(), "rejected configuration node");
    self.plan.errors.extend(errors);

    self.declare_failed(id, kind, path);
  }

  fn declare_failed(&mut self, id: Identifier, kind: ObjectKind, path: ConfigPath) {
    match self.registry.declare(id.clone(), kind, path) {
      Ok(_) => {
        if let Err(error) = self.registry.mark_failed(&id) {
          warn!(error = %error, "failed to mark rejected identifier");
        }
        self.plan.failed.push(id);
      }
      Err(duplicate) => self.duplicate(duplicate),
    }
  }

  /// Declare the explicit ids of inline mappings under a node that is not
  /// planned, so references to them are skipped instead of unknown.
  fn fail_nested(&mut self, def: Option<&'static ComponentDef>, map: &ConfigMap, path: &ConfigPath) {
    for (key, value) in map.iter() {
      let ConfigValue::Map(child) = value else {
        continue;
      };
      let child_path = path.key(key);
      let child_def = def
        .and_then(|def| def.field(key))
        .and_then(|spec| match spec.ty {
          FieldType::Nested { domain } => {
            let platform = child.get(PLATFORM_KEY).and_then(ConfigValue::as_str);
            self.planner.catalog.lookup(domain, platform).ok()
          }
          _ => None,
        });

      let explicit = child
        .get(ID_KEY)
        .and_then(ConfigValue::as_str)
        .filter(|id| Identifier::is_valid(id));
      if let Some(id) = explicit {
        let kind = child_def.map_or_else(|| ObjectKind::new(key, ""), ComponentDef::kind);
        debug!(id, path = %child_path, "declaring nested identifier of rejected node as failed");
        self.declare_failed(Identifier::new(id), kind, child_path.clone());
      }
      self.fail_nested(child_def, child, &child_path);
    }
  }

  /// Both declarations of a duplicate identifier fail.
  fn duplicate(&mut self, error: DuplicateIdentifierError) {
    let id = error.id.clone();
    warn!(id = %id, first = %error.first, second = %error.second, "duplicate identifier");
    self.plan.errors.push(BuildError::DuplicateIdentifier(error));

    if self.registry.state(&id) == Some(EntryState::Declared) {
      match self.index.get(&id) {
        Some(&task) => self.prefail(task),
        None => {
          if let Err(error) = self.registry.mark_failed(&id) {
            warn!(error = %error, "failed to mark duplicate identifier");
          }
        }
      }
    }
    if !self.plan.failed.contains(&id) {
      self.plan.failed.push(id);
    }
  }

  /// Fail a planned task before it ever runs.
  fn prefail(&mut self, task: TaskId) {
    let Some(task) = self.plan.tasks.get_mut(task.index()) else {
      return;
    };
    if task.state() != TaskState::Pending {
      return;
    }
    if let Err(error) = task.transition(TaskState::Failed) {
      warn!(error = %error, "failed to fail planned task");
      return;
    }
    if let Err(error) = self.registry.mark_failed(task.id()) {
      warn!(error = %error, "failed to mark planned task");
    }
    debug!(id = %task.id(), "failed planned task");
  }

  /// Fail components whose required domains appear nowhere in the document.
  fn check_requirements(&mut self) {
    for (task, def) in self.planned.clone() {
      let Some(planned) = self.plan.tasks.get(task.index()) else {
        continue;
      };
      if planned.state() != TaskState::Pending {
        continue;
      }

      let id = planned.id().clone();
      let path = planned.origin().clone();
      let missing: Vec<&str> = def
        .requires
        .iter()
        .copied()
        .filter(|domain| !self.seen_domains.contains(*domain))
        .collect();
      if missing.is_empty() {
        continue;
      }

      for domain in missing {
        warn!(id = %id, domain, "missing required component");
        self.plan.errors.push(BuildError::MissingRequirement {
          id: id.clone(),
          path: path.clone(),
          domain: domain.to_string(),
        });
      }
      self.prefail(task);
      self.plan.failed.push(id);
    }
  }

  fn collect_loaded(&mut self) {
    for (task, def) in &self.planned {
      let live = self
        .plan
        .tasks
        .get(task.index())
        .is_some_and(|t| t.state() == TaskState::Pending);
      if !live {
        continue;
      }

      self.plan.loaded.insert(def.domain.to_string());
      self.plan.includes.insert(def.header.to_string());
      if let Some(platform) = def.platform {
        self.plan.loaded.insert(platform.to_string());
      }
      for component in def.auto_load {
        self.plan.loaded.insert(component.to_string());
        self
          .plan
          .includes
          .insert(format!("esphome/components/{0}/{0}.h", component));
      }
    }
  }
}

/// Collect every string `id` written anywhere under `map`.
fn collect_ids(map: &ConfigMap, ids: &mut BTreeSet<Identifier>) {
  for (key, value) in map.iter() {
    match value {
      ConfigValue::String(id) if key == ID_KEY => {
        ids.insert(Identifier::new(id.as_str()));
      }
      ConfigValue::Map(map) => collect_ids(map, ids),
      ConfigValue::List(items) => {
        for item in items {
          if let ConfigValue::Map(map) = item {
            collect_ids(map, ids);
          }
        }
      }
      _ => {}
    }
  }
}

//! Build tasks and the continuation contract.
//!
//! A build task is driven by repeated calls to [`Buildable::step`]. Each call
//! either asks for a dependency ([`Step::Await`]) or hands back the finished
//! record ([`Step::Done`]). After an `Await`, the scheduler calls `step` again
//! with the dependency's [`Handle`] once that dependency has finished; the task
//! never sees an unfinished object.

use std::fmt;

use crate::config::ConfigPath;
use crate::record::{ConstructionRecord, ObjectKind};
use crate::registry::{Handle, Identifier, IdentifierRegistry};

use super::types::{BuildError, TaskState};

/// Index of a task in the scheduler's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
  pub fn index(self) -> usize {
    self.0
  }
}

impl fmt::Display for TaskId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// A running task asks for the object named `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRequest {
  /// Record field the handle will be assigned to.
  pub field: String,
  pub id: Identifier,
  /// Whether `id` is a child planned from an inline mapping.
  pub nested: bool,
}

impl DependencyRequest {
  pub fn new(field: &str, id: Identifier) -> Self {
    Self {
      field: field.to_string(),
      id,
      nested: false,
    }
  }

  pub fn nested(field: &str, id: Identifier) -> Self {
    Self {
      nested: true,
      ..Self::new(field, id)
    }
  }
}

/// Result of advancing a task by one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
  /// Suspend until the requested dependency is finished.
  Await(DependencyRequest),
  /// The task is complete.
  Done(ConstructionRecord),
}

/// Read-only view handed to a task while it runs.
#[derive(Debug, Clone, Copy)]
pub struct BuildCtx<'a> {
  id: &'a Identifier,
  registry: &'a IdentifierRegistry,
}

impl<'a> BuildCtx<'a> {
  pub fn new(id: &'a Identifier, registry: &'a IdentifierRegistry) -> Self {
    Self { id, registry }
  }

  /// Identifier of the running task.
  pub fn id(&self) -> &'a Identifier {
    self.id
  }

  pub fn registry(&self) -> &'a IdentifierRegistry {
    self.registry
  }
}

/// Something the scheduler can build step by step.
pub trait Buildable {
  /// Advance the task.
  ///
  /// `resumed` is `None` on the first call and the handle of the dependency
  /// requested by the previous `Step::Await` on every later call.
  fn step(&mut self, ctx: &BuildCtx<'_>, resumed: Option<Handle>) -> Result<Step, BuildError>;

  /// Identifiers this task is known to request, for static analysis.
  ///
  /// May be incomplete: requests that are only decided while running are
  /// resolved against `registry` where possible and omitted otherwise.
  fn static_dependencies(&self, _registry: &IdentifierRegistry) -> Vec<Identifier> {
    Vec::new()
  }
}

/// One unit of work in the scheduler arena.
pub struct BuildTask {
  pub(crate) id: Identifier,
  pub(crate) kind: ObjectKind,
  pub(crate) origin: ConfigPath,
  pub(crate) owner: Option<TaskId>,
  pub(crate) state: TaskState,
  pub(crate) body: Box<dyn Buildable>,
}

impl BuildTask {
  pub fn new(id: Identifier, kind: ObjectKind, origin: ConfigPath, body: Box<dyn Buildable>) -> Self {
    Self {
      id,
      kind,
      origin,
      owner: None,
      state: TaskState::Pending,
      body,
    }
  }

  /// Mark this task as planned on behalf of `owner`.
  pub fn with_owner(mut self, owner: TaskId) -> Self {
    self.owner = Some(owner);
    self
  }

  pub fn id(&self) -> &Identifier {
    &self.id
  }

  pub fn kind(&self) -> &ObjectKind {
    &self.kind
  }

  pub fn origin(&self) -> &ConfigPath {
    &self.origin
  }

  pub fn owner(&self) -> Option<TaskId> {
    self.owner
  }

  pub fn state(&self) -> TaskState {
    self.state
  }

  pub fn static_dependencies(&self, registry: &IdentifierRegistry) -> Vec<Identifier> {
    self.body.static_dependencies(registry)
  }

  /// Move to `next`, rejecting transitions the lifecycle does not allow.
  pub(crate) fn transition(&mut self, next: TaskState) -> Result<(), InvalidTransition> {
    if !self.state.can_transition_to(next) {
      return Err(InvalidTransition {
        id: self.id.clone(),
        from: self.state,
        to: next,
      });
    }
    self.state = next;
    Ok(())
  }
}

impl fmt::Debug for BuildTask {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BuildTask")
      .field("id", &self.id)
      .field("kind", &self.kind)
      .field("origin", &self.origin)
      .field("owner", &self.owner)
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

/// A task was asked to make a transition its lifecycle forbids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task '{id}' cannot move from {from} to {to}")]
pub struct InvalidTransition {
  pub id: Identifier,
  pub from: TaskState,
  pub to: TaskState,
}

//! Cooperative build scheduler.
//!
//! The scheduler runs build tasks one at a time on the calling thread. A task
//! that needs another object returns [`Step::Await`]; the scheduler suspends it,
//! runs the dependency to completion, emits the dependency's record, and then
//! resumes the waiting task with the dependency's [`Handle`].
//!
//! Execution uses an explicit stack of frames instead of recursion: the top
//! frame is the running task, every frame below it is suspended waiting on the
//! frame directly above.
//!
//! # Ordering
//!
//! - A dependency finishes (and is emitted) before its dependent resumes.
//! - Independent roots run in declaration order.
//!
//! # Failure
//!
//! - A failed task fails every task suspended below it on the stack; those
//!   are reported as skipped, not as new errors.
//! - A request for a task that is already on the stack is a cycle. The cycle
//!   is reported once; every member fails.
//! - Other roots keep running, unless [`BuildOptions::fail_fast`] is set.
//! - Tasks that never started by the end of the run are cancelled.

mod task;
mod types;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::emit::{EmissionSink, EmitError, Emitter};
use crate::plan::Plan;
use crate::record::ConstructionRecord;
use crate::registry::{
  DuplicateIdentifierError, EntryState, Handle, Identifier, IdentifierRegistry, UnknownIdentifierError,
};

pub use task::{BuildCtx, BuildTask, Buildable, DependencyRequest, InvalidTransition, Step, TaskId};
pub use types::{BuildError, BuildOptions, BuildReport, TaskState};

/// Errors that abort a whole run.
///
/// Configuration problems never end up here; they fail their branch and are
/// collected in the [`BuildReport`].
#[derive(Debug, Error)]
pub enum RunError {
  #[error(transparent)]
  Emit(#[from] EmitError),

  #[error(transparent)]
  Transition(#[from] InvalidTransition),

  #[error("task identifier is not declared: {0}")]
  Undeclared(#[from] UnknownIdentifierError),
}

/// One entry of the execution stack.
#[derive(Debug)]
struct Frame {
  task: TaskId,
  /// Handle to deliver on the next step.
  resumed: Option<Handle>,
}

/// What to do with a dependency request.
enum Resolution {
  Ready(Handle),
  Run(TaskId),
  Fail(Failure),
}

/// Why the top of the stack fails.
enum Failure {
  Error(BuildError),
  Skipped { dependency: Identifier },
  /// The cycle spans the stack from `start` to the top.
  Cycle { start: usize },
}

/// Runs build tasks and delivers their records to a sink.
#[derive(Debug)]
pub struct Scheduler<'r> {
  tasks: Vec<BuildTask>,
  roots: Vec<TaskId>,
  index: BTreeMap<Identifier, TaskId>,
  registry: &'r mut IdentifierRegistry,
  options: BuildOptions,
  report: BuildReport,
}

impl<'r> Scheduler<'r> {
  pub fn new(registry: &'r mut IdentifierRegistry, options: BuildOptions) -> Self {
    Self {
      tasks: Vec::new(),
      roots: Vec::new(),
      index: BTreeMap::new(),
      registry,
      options,
      report: BuildReport::default(),
    }
  }

  /// Take over a plan's task arena, roots and planning errors.
  pub fn from_plan(plan: Plan, registry: &'r mut IdentifierRegistry, options: BuildOptions) -> Self {
    let mut scheduler = Self::new(registry, options);
    let (tasks, roots, errors, failed) = plan.into_parts();
    scheduler.report.errors = errors;
    scheduler.report.failed = failed;
    for task in tasks {
      scheduler.add_task(task);
    }
    scheduler.roots = roots;
    scheduler
  }

  /// Add a task to the arena. Its identifier must already be declared.
  ///
  /// A second task with an identifier already in the arena is a duplicate:
  /// both tasks fail before running and the error is reported like any
  /// planning error.
  pub fn add_task(&mut self, mut task: BuildTask) -> TaskId {
    let id = TaskId(self.tasks.len());
    match self.index.get(&task.id) {
      Some(&first) => self.reject_duplicate(first, &mut task),
      None => {
        self.index.insert(task.id.clone(), id);
      }
    }
    self.tasks.push(task);
    id
  }

  fn reject_duplicate(&mut self, first: TaskId, task: &mut BuildTask) {
    let error = DuplicateIdentifierError {
      id: task.id.clone(),
      first: self.tasks[first.0].origin.clone(),
      second: task.origin.clone(),
    };
    warn!(task = %task.id, first = %error.first, second = %error.second, "duplicate task identifier");

    for target in [&mut self.tasks[first.0], task] {
      if target.state == TaskState::Pending
        && let Err(invalid) = target.transition(TaskState::Failed)
      {
        warn!(error = %invalid, "failed to fail duplicate task");
      }
    }
    if let Err(unknown) = self.registry.mark_failed(&error.id) {
      warn!(error = %unknown, "failed to mark duplicate identifier");
    }
    if !self.report.failed.contains(&error.id) {
      self.report.failed.push(error.id.clone());
    }
    self.report.errors.push(BuildError::DuplicateIdentifier(error));
  }

  /// Add a task that is run in its own right, after all earlier roots.
  pub fn add_root(&mut self, task: BuildTask) -> TaskId {
    let id = self.add_task(task);
    self.roots.push(id);
    id
  }

  pub fn tasks(&self) -> &[BuildTask] {
    &self.tasks
  }

  pub fn roots(&self) -> &[TaskId] {
    &self.roots
  }

  /// Run every root in order and report the outcome.
  pub fn run(mut self, sink: &mut dyn EmissionSink) -> Result<BuildReport, RunError> {
    info!(tasks = self.tasks.len(), roots = self.roots.len(), "starting build run");

    let mut emitter = Emitter::new(sink);
    let roots = std::mem::take(&mut self.roots);
    for root in roots {
      if self.options.fail_fast && !self.report.errors.is_empty() {
        debug!("fail fast: not scheduling remaining roots");
        break;
      }
      if self.tasks[root.0].state != TaskState::Pending {
        continue;
      }
      self.drive(root, &mut emitter)?;
    }

    self.cancel_unstarted()?;
    self.report.fingerprint = emitter.finish()?;

    info!(
      emitted = self.report.emitted.len(),
      errors = self.report.errors.len(),
      skipped = self.report.skipped.len(),
      cancelled = self.report.cancelled.len(),
      fingerprint = %self.report.fingerprint,
      "build run complete"
    );
    Ok(self.report)
  }

  /// Run `root` and everything it waits on.
  fn drive(&mut self, root: TaskId, emitter: &mut Emitter<'_>) -> Result<(), RunError> {
    self.start(root)?;
    let mut stack = vec![Frame {
      task: root,
      resumed: None,
    }];

    while let Some(top) = stack.last_mut() {
      let current = top.task;
      let resumed = top.resumed.take();

      let step = {
        let BuildTask { id, body, .. } = &mut self.tasks[current.0];
        let ctx = BuildCtx::new(id, self.registry);
        body.step(&ctx, resumed)
      };

      match step {
        Ok(Step::Done(record)) => {
          let handle = self.finish(current, record, emitter)?;
          stack.pop();
          if let Some(parent) = stack.last_mut() {
            self.tasks[parent.task.0].transition(TaskState::Running)?;
            debug!(task = %self.tasks[parent.task.0].id, dependency = %handle.id, "resuming task");
            parent.resumed = Some(handle);
          }
        }
        Ok(Step::Await(request)) => match self.resolve(current, &request, &stack) {
          Resolution::Ready(handle) => {
            trace!(task = %self.tasks[current.0].id, dependency = %handle.id, "dependency already finished");
            if let Some(top) = stack.last_mut() {
              top.resumed = Some(handle);
            }
          }
          Resolution::Run(dependency) => {
            self.tasks[current.0].transition(TaskState::Suspended)?;
            debug!(
              task = %self.tasks[current.0].id,
              awaiting = %request.id,
              field = %request.field,
              nested = request.nested,
              "suspending task"
            );
            self.start(dependency)?;
            stack.push(Frame {
              task: dependency,
              resumed: None,
            });
          }
          Resolution::Fail(failure) => self.unwind(&mut stack, failure)?,
        },
        Err(error) => self.unwind(&mut stack, Failure::Error(error))?,
      }
    }

    Ok(())
  }

  fn resolve(&self, requester: TaskId, request: &DependencyRequest, stack: &[Frame]) -> Resolution {
    let unknown = || {
      Resolution::Fail(Failure::Error(BuildError::UnknownIdentifier {
        id: request.id.clone(),
        referenced_by: self.tasks[requester.0].id.clone(),
        field: request.field.clone(),
      }))
    };
    let skipped = || {
      Resolution::Fail(Failure::Skipped {
        dependency: request.id.clone(),
      })
    };

    let Ok(handle) = self.registry.resolve(&request.id) else {
      return unknown();
    };
    match self.registry.state(&request.id) {
      Some(EntryState::Finished) => return Resolution::Ready(handle),
      Some(EntryState::Failed) => return skipped(),
      _ => {}
    }

    // Declared but never planned as a task: nothing can ever build it.
    let Some(&dependency) = self.index.get(&request.id) else {
      return unknown();
    };

    match self.tasks[dependency.0].state {
      TaskState::Pending => Resolution::Run(dependency),
      TaskState::Running | TaskState::Suspended => match stack.iter().position(|frame| frame.task == dependency) {
        Some(start) => Resolution::Fail(Failure::Cycle { start }),
        None => skipped(),
      },
      TaskState::Finished => Resolution::Ready(handle),
      TaskState::Failed => skipped(),
    }
  }

  /// Fail the top of the stack and everything suspended below it.
  fn unwind(&mut self, stack: &mut Vec<Frame>, failure: Failure) -> Result<(), RunError> {
    let mut failed = match failure {
      Failure::Error(error) => {
        let Some(frame) = stack.pop() else {
          return Ok(());
        };
        self.fail(frame.task, error)?;
        frame.task
      }
      Failure::Skipped { dependency } => {
        let Some(frame) = stack.pop() else {
          return Ok(());
        };
        self.skip(frame.task, dependency)?;
        frame.task
      }
      Failure::Cycle { start } => {
        let members: Vec<TaskId> = stack.drain(start..).map(|frame| frame.task).collect();
        let Some(&first) = members.first() else {
          return Ok(());
        };

        let cycle: Vec<Identifier> = members.iter().map(|m| self.tasks[m.0].id.clone()).collect();
        let error = BuildError::CycleDetected { cycle };
        error!(error = %error, "dependency cycle detected");
        self.report.errors.push(error);

        for member in members {
          self.abort(member)?;
          self.report.failed.push(self.tasks[member.0].id.clone());
        }
        first
      }
    };

    while let Some(frame) = stack.pop() {
      let dependency = self.tasks[failed.0].id.clone();
      self.skip(frame.task, dependency)?;
      failed = frame.task;
    }
    Ok(())
  }

  fn start(&mut self, task: TaskId) -> Result<(), RunError> {
    let task = &mut self.tasks[task.0];
    task.transition(TaskState::Running)?;
    trace!(task = %task.id, origin = %task.origin, "starting task");
    Ok(())
  }

  fn finish(
    &mut self,
    task: TaskId,
    record: ConstructionRecord,
    emitter: &mut Emitter<'_>,
  ) -> Result<Handle, RunError> {
    let id = self.tasks[task.0].id.clone();
    let handle = self.registry.resolve(&id)?;

    emitter.emit(&record)?;
    self.tasks[task.0].transition(TaskState::Finished)?;
    self.registry.mark_finished(&id)?;

    debug!(task = %id, class = %record.kind, emitted = emitter.count(), "task finished");
    self.report.emitted.push(id);
    Ok(handle)
  }

  fn fail(&mut self, task: TaskId, error: BuildError) -> Result<(), RunError> {
    self.abort(task)?;
    let id = self.tasks[task.0].id.clone();
    error!(task = %id, error = %error, "task failed");
    self.report.failed.push(id);
    self.report.errors.push(error);
    Ok(())
  }

  fn skip(&mut self, task: TaskId, dependency: Identifier) -> Result<(), RunError> {
    self.abort(task)?;
    let id = self.tasks[task.0].id.clone();
    warn!(task = %id, failed_dep = %dependency, "skipping task due to failed dependency");
    self.report.skipped.insert(id, dependency);
    Ok(())
  }

  /// Move a task to `Failed` in both the arena and the registry.
  fn abort(&mut self, task: TaskId) -> Result<(), RunError> {
    let task = &mut self.tasks[task.0];
    task.transition(TaskState::Failed)?;
    self.registry.mark_failed(&task.id)?;
    Ok(())
  }

  fn cancel_unstarted(&mut self) -> Result<(), RunError> {
    for index in 0..self.tasks.len() {
      if self.tasks[index].state != TaskState::Pending {
        continue;
      }
      self.abort(TaskId(index))?;
      let id = self.tasks[index].id.clone();
      debug!(task = %id, "cancelled task that never started");
      self.report.cancelled.push(id);
    }
    Ok(())
  }
}

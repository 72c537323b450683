//! Types for scheduling build tasks.
//!
//! This module defines the error type, the task state machine, the run
//! options and the report produced by one scheduler run.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::catalog::LookupError;
use crate::config::{ConfigError, ConfigPath};
use crate::registry::{DuplicateIdentifierError, Identifier};
use crate::schema::ValidationError;
use crate::util::hash::ObjectHash;

/// Errors that fail a build task or a configuration branch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// Two declarations claim the same identifier.
  #[error(transparent)]
  DuplicateIdentifier(#[from] DuplicateIdentifierError),

  /// A task requested an identifier that was never declared.
  #[error("'{referenced_by}' field '{field}' refers to unknown identifier '{id}'")]
  UnknownIdentifier {
    id: Identifier,
    referenced_by: Identifier,
    field: String,
  },

  /// A dependency chain loops back on itself.
  #[error("dependency cycle detected: {}", CyclePath(.cycle))]
  CycleDetected { cycle: Vec<Identifier> },

  /// A configuration node is invalid.
  #[error("{path}: {message}")]
  Config { path: ConfigPath, message: String },

  /// A component needs another domain that is not configured.
  #[error("{path}: '{id}' requires a {domain} component, but none is configured")]
  MissingRequirement {
    id: Identifier,
    path: ConfigPath,
    domain: String,
  },

  /// A dependency failed, so this task was never completed.
  #[error("'{id}' skipped: dependency '{dependency}' failed")]
  DependencyFailed { id: Identifier, dependency: Identifier },
}

impl BuildError {
  pub fn config(path: &ConfigPath, message: impl Into<String>) -> Self {
    BuildError::Config {
      path: path.clone(),
      message: message.into(),
    }
  }

  pub fn lookup(path: &ConfigPath, error: LookupError) -> Self {
    Self::config(path, error.to_string())
  }

  /// Stable machine-readable name of the error kind.
  pub fn kind(&self) -> &'static str {
    match self {
      BuildError::DuplicateIdentifier(_) => "duplicate_identifier",
      BuildError::UnknownIdentifier { .. } => "unknown_identifier",
      BuildError::CycleDetected { .. } => "cycle_detected",
      BuildError::Config { .. } => "config",
      BuildError::MissingRequirement { .. } => "missing_requirement",
      BuildError::DependencyFailed { .. } => "dependency_failed",
    }
  }

  /// Identifiers the error is about, for diagnostics.
  pub fn identifiers(&self) -> Vec<&Identifier> {
    match self {
      BuildError::DuplicateIdentifier(e) => vec![&e.id],
      BuildError::UnknownIdentifier { id, referenced_by, .. } => vec![referenced_by, id],
      BuildError::CycleDetected { cycle } => cycle.iter().collect(),
      BuildError::Config { .. } => Vec::new(),
      BuildError::MissingRequirement { id, .. } => vec![id],
      BuildError::DependencyFailed { id, dependency } => vec![id, dependency],
    }
  }
}

impl From<ValidationError> for BuildError {
  fn from(error: ValidationError) -> Self {
    BuildError::Config {
      path: error.path,
      message: error.message,
    }
  }
}

impl From<ConfigError> for BuildError {
  fn from(error: ConfigError) -> Self {
    match error {
      ConfigError::Shape { path, found } => BuildError::Config {
        path,
        message: format!("expected a component mapping or a list of them, found {}", found),
      },
      other => BuildError::Config {
        path: ConfigPath::root(),
        message: other.to_string(),
      },
    }
  }
}

/// Renders `a -> b -> a`.
struct CyclePath<'a>(&'a [Identifier]);

impl fmt::Display for CyclePath<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for id in self.0 {
      write!(f, "{} -> ", id)?;
    }
    match self.0.first() {
      Some(first) => write!(f, "{}", first),
      None => Ok(()),
    }
  }
}

/// Lifecycle of a build task.
///
/// ```text
/// Pending ──► Running ──► Finished
///    │         │  ▲
///    │         ▼  │
///    │       Suspended
///    │         │
///    └─────────┴──────► Failed
/// ```
///
/// `Finished` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
  Pending,
  Running,
  Suspended,
  Finished,
  Failed,
}

impl TaskState {
  pub fn is_terminal(self) -> bool {
    matches!(self, TaskState::Finished | TaskState::Failed)
  }

  pub fn can_transition_to(self, next: TaskState) -> bool {
    use TaskState::*;
    matches!(
      (self, next),
      (Pending, Running)
        | (Pending, Failed)
        | (Running, Suspended)
        | (Running, Finished)
        | (Running, Failed)
        | (Suspended, Running)
        | (Suspended, Failed)
    )
  }
}

impl fmt::Display for TaskState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      TaskState::Pending => "pending",
      TaskState::Running => "running",
      TaskState::Suspended => "suspended",
      TaskState::Finished => "finished",
      TaskState::Failed => "failed",
    };
    write!(f, "{}", name)
  }
}

/// Options for one build run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
  /// Stop scheduling further roots after the first error.
  pub fail_fast: bool,

  /// Fail components whose `requires` domains are not configured.
  pub check_requirements: bool,
}

impl Default for BuildOptions {
  fn default() -> Self {
    Self {
      fail_fast: false,
      check_requirements: true,
    }
  }
}

/// Outcome of one build run.
#[derive(Debug, Default)]
pub struct BuildReport {
  /// Identifiers in the order their records were emitted.
  pub emitted: Vec<Identifier>,

  /// Root-cause errors: planning errors first, then run errors.
  pub errors: Vec<BuildError>,

  /// Tasks that failed with a root-cause error (including cycle members and
  /// duplicate declarations).
  pub failed: Vec<Identifier>,

  /// Tasks that failed because a dependency failed.
  /// Maps skipped task -> the failed dependency.
  pub skipped: BTreeMap<Identifier, Identifier>,

  /// Tasks that never started because their branch failed first.
  pub cancelled: Vec<Identifier>,

  /// Hash of the emitted record stream.
  pub fingerprint: ObjectHash,
}

impl BuildReport {
  /// Returns true if every task emitted its record.
  pub fn is_success(&self) -> bool {
    self.errors.is_empty() && self.failed.is_empty() && self.skipped.is_empty() && self.cancelled.is_empty()
  }

  /// Total number of tasks accounted for.
  pub fn total(&self) -> usize {
    self.emitted.len() + self.failed.len() + self.skipped.len() + self.cancelled.len()
  }

  /// Skipped tasks as [`BuildError::DependencyFailed`] values.
  pub fn skipped_errors(&self) -> Vec<BuildError> {
    self
      .skipped
      .iter()
      .map(|(id, dependency)| BuildError::DependencyFailed {
        id: id.clone(),
        dependency: dependency.clone(),
      })
      .collect()
  }
}

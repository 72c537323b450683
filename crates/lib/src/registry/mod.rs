//! Identifier registry.
//!
//! The registry maps every declared identifier to the object it names and
//! tracks whether that object has been constructed yet. It is created at the
//! start of one compile run, passed by reference to the planner and the
//! scheduler, and dropped when the run ends.
//!
//! # Lifecycle of an entry
//!
//! ```text
//! declare ──► Declared ──► Finished
//!                 │
//!                 └──────► Failed
//! ```
//!
//! Dependents may only consume a handle once its entry is `Finished`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{trace, warn};

use crate::config::ConfigPath;
use crate::record::ObjectKind;

/// A unique name for a constructed object.
///
/// Identifiers end up as C++ variable names, so they must match
/// `[A-Za-z_][A-Za-z0-9_]*`; see [`Identifier::is_valid`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Whether `name` is usable as an identifier.
  pub fn is_valid(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
      Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
      _ => false,
    }
  }
}

impl fmt::Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for Identifier {
  fn from(name: &str) -> Self {
    Self::new(name)
  }
}

/// A resolved reference to a declared object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
  pub id: Identifier,
  pub kind: ObjectKind,
}

/// Construction state of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
  /// Declared, not constructed yet.
  Declared,
  /// Constructed and emitted; safe to consume.
  Finished,
  /// Will never be constructed.
  Failed,
}

/// Two declarations claim the same identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate identifier '{id}': declared at {first} and again at {second}")]
pub struct DuplicateIdentifierError {
  pub id: Identifier,
  pub first: ConfigPath,
  pub second: ConfigPath,
}

/// A lookup named an identifier that was never declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown identifier '{id}'")]
pub struct UnknownIdentifierError {
  pub id: Identifier,
}

#[derive(Debug, Clone)]
struct Entry {
  kind: ObjectKind,
  origin: ConfigPath,
  state: EntryState,
}

/// The authoritative map from identifiers to their construction state.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
  entries: BTreeMap<Identifier, Entry>,
  /// Declaration order, for deterministic domain queries.
  order: Vec<Identifier>,
}

impl IdentifierRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a new identifier before its construction begins.
  pub fn declare(
    &mut self,
    id: Identifier,
    kind: ObjectKind,
    origin: ConfigPath,
  ) -> Result<Handle, DuplicateIdentifierError> {
    if let Some(existing) = self.entries.get(&id) {
      return Err(DuplicateIdentifierError {
        id,
        first: existing.origin.clone(),
        second: origin,
      });
    }

    trace!(id = %id, kind = %kind, origin = %origin, "declared identifier");
    let handle = Handle {
      id: id.clone(),
      kind: kind.clone(),
    };
    self.entries.insert(
      id.clone(),
      Entry {
        kind,
        origin,
        state: EntryState::Declared,
      },
    );
    self.order.push(id);
    Ok(handle)
  }

  /// Look up a previously declared identifier.
  pub fn resolve(&self, id: &Identifier) -> Result<Handle, UnknownIdentifierError> {
    self
      .entries
      .get(id)
      .map(|entry| Handle {
        id: id.clone(),
        kind: entry.kind.clone(),
      })
      .ok_or_else(|| UnknownIdentifierError { id: id.clone() })
  }

  /// Record that construction of `id` completed.
  pub fn mark_finished(&mut self, id: &Identifier) -> Result<(), UnknownIdentifierError> {
    let entry = self.entry_mut(id)?;
    match entry.state {
      EntryState::Declared => entry.state = EntryState::Finished,
      EntryState::Finished => {}
      EntryState::Failed => warn!(id = %id, "ignoring finish of a failed identifier"),
    }
    Ok(())
  }

  /// Record that `id` will never be constructed. Finished entries stay finished.
  pub fn mark_failed(&mut self, id: &Identifier) -> Result<(), UnknownIdentifierError> {
    let entry = self.entry_mut(id)?;
    if entry.state == EntryState::Declared {
      entry.state = EntryState::Failed;
    }
    Ok(())
  }

  pub fn state(&self, id: &Identifier) -> Option<EntryState> {
    self.entries.get(id).map(|entry| entry.state)
  }

  pub fn is_finished(&self, id: &Identifier) -> bool {
    self.state(id) == Some(EntryState::Finished)
  }

  /// Where `id` was declared.
  pub fn origin(&self, id: &Identifier) -> Option<&ConfigPath> {
    self.entries.get(id).map(|entry| &entry.origin)
  }

  /// All declared objects of a domain, in declaration order.
  pub fn declared_in_domain(&self, domain: &str) -> Vec<Handle> {
    self
      .order
      .iter()
      .filter_map(|id| {
        let entry = &self.entries[id];
        (entry.kind.domain == domain).then(|| Handle {
          id: id.clone(),
          kind: entry.kind.clone(),
        })
      })
      .collect()
  }

  /// Declared identifiers in declaration order.
  pub fn identifiers(&self) -> impl Iterator<Item = &Identifier> {
    self.order.iter()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  fn entry_mut(&mut self, id: &Identifier) -> Result<&mut Entry, UnknownIdentifierError> {
    self
      .entries
      .get_mut(id)
      .ok_or_else(|| UnknownIdentifierError { id: id.clone() })
  }
}

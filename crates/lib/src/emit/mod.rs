//! Emission of finished construction records.
//!
//! The scheduler hands every finished record to an [`EmissionSink`] through an
//! [`Emitter`], which enforces the ordering contract of the stream:
//!
//! - every identifier a record references was emitted earlier;
//! - no identifier is emitted twice.
//!
//! The emitter also folds each record into a [`StreamHasher`] so two runs can
//! be compared by fingerprint.
//!
//! Sinks:
//!
//! | Sink | Output |
//! |------|--------|
//! | [`RecordLog`] | records kept in memory |
//! | [`JsonLinesSink`] | one JSON object per line |
//! | [`CppSink`] | a C++ `setup()` function |

mod cpp;
mod json;
mod log;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::trace;

use crate::record::ConstructionRecord;
use crate::registry::Identifier;
use crate::util::hash::{HashError, ObjectHash, StreamHasher};

pub use cpp::CppSink;
pub use json::JsonLinesSink;
pub use log::RecordLog;

#[derive(Debug, Error)]
pub enum EmitError {
  #[error("record '{id}' references '{reference}', which has not been emitted")]
  ForwardReference { id: Identifier, reference: Identifier },

  #[error("record '{0}' was already emitted")]
  AlreadyEmitted(Identifier),

  #[error("failed to serialize record: {0}")]
  Serialize(#[from] HashError),

  #[error("failed to write output: {0}")]
  Io(#[from] std::io::Error),
}

/// Receiver of finished construction records, one at a time, in completion order.
pub trait EmissionSink {
  fn emit(&mut self, record: &ConstructionRecord) -> Result<(), EmitError>;

  /// Called once after the last record.
  fn finish(&mut self) -> Result<(), EmitError> {
    Ok(())
  }
}

/// Guards a sink and fingerprints the stream written to it.
pub struct Emitter<'s> {
  sink: &'s mut dyn EmissionSink,
  emitted: BTreeSet<Identifier>,
  hasher: StreamHasher,
}

impl<'s> Emitter<'s> {
  pub fn new(sink: &'s mut dyn EmissionSink) -> Self {
    Self {
      sink,
      emitted: BTreeSet::new(),
      hasher: StreamHasher::new(),
    }
  }

  pub fn emit(&mut self, record: &ConstructionRecord) -> Result<(), EmitError> {
    if self.emitted.contains(&record.id) {
      return Err(EmitError::AlreadyEmitted(record.id.clone()));
    }
    if let Some(reference) = record.references().find(|r| !self.emitted.contains(*r)) {
      return Err(EmitError::ForwardReference {
        id: record.id.clone(),
        reference: reference.clone(),
      });
    }

    self.hasher.update(record)?;
    self.sink.emit(record)?;
    self.emitted.insert(record.id.clone());
    trace!(id = %record.id, position = self.hasher.count(), "emitted record");
    Ok(())
  }

  pub fn is_emitted(&self, id: &Identifier) -> bool {
    self.emitted.contains(id)
  }

  pub fn count(&self) -> usize {
    self.hasher.count()
  }

  /// Finish the sink and return the fingerprint of everything emitted.
  pub fn finish(self) -> Result<ObjectHash, EmitError> {
    self.sink.finish()?;
    Ok(self.hasher.current())
  }
}

impl std::fmt::Debug for Emitter<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Emitter")
      .field("emitted", &self.emitted)
      .field("hasher", &self.hasher)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{AssignStyle, FieldAssignment, ObjectKind};

  fn record(id: &str) -> ConstructionRecord {
    ConstructionRecord::new(id.into(), ObjectKind::new("remote_receiver", "rr::R"))
  }

  fn listening(id: &str, receiver: &str) -> ConstructionRecord {
    record(id).with_field(FieldAssignment::reference("receiver", receiver.into(), AssignStyle::Listener))
  }

  #[test]
  fn forwards_records_in_order() {
    let mut log = RecordLog::new();
    let mut emitter = Emitter::new(&mut log);
    emitter.emit(&record("ir_rx")).unwrap();
    emitter.emit(&listening("ac", "ir_rx")).unwrap();
    assert_eq!(emitter.count(), 2);
    emitter.finish().unwrap();

    assert_eq!(log.ids(), vec!["ir_rx", "ac"]);
  }

  #[test]
  fn rejects_forward_reference() {
    let mut log = RecordLog::new();
    let mut emitter = Emitter::new(&mut log);

    let err = emitter.emit(&listening("ac", "ir_rx")).unwrap_err();
    assert!(matches!(err, EmitError::ForwardReference { ref reference, .. } if reference.as_str() == "ir_rx"));
    assert!(!emitter.is_emitted(&"ac".into()));
  }

  #[test]
  fn rejects_self_reference() {
    let mut log = RecordLog::new();
    let mut emitter = Emitter::new(&mut log);
    assert!(emitter.emit(&listening("ac", "ac")).is_err());
  }

  #[test]
  fn rejects_second_emission() {
    let mut log = RecordLog::new();
    let mut emitter = Emitter::new(&mut log);
    emitter.emit(&record("ir_rx")).unwrap();

    let err = emitter.emit(&record("ir_rx")).unwrap_err();
    assert_eq!(err.to_string(), "record 'ir_rx' was already emitted");
  }

  #[test]
  fn fingerprint_follows_stream() {
    let fingerprint = |ids: &[&str]| {
      let mut log = RecordLog::new();
      let mut emitter = Emitter::new(&mut log);
      for id in ids {
        emitter.emit(&record(id)).unwrap();
      }
      emitter.finish().unwrap()
    };

    assert_eq!(fingerprint(&["a", "b"]), fingerprint(&["a", "b"]));
    assert_ne!(fingerprint(&["a", "b"]), fingerprint(&["b", "a"]));
  }
}

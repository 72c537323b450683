use crate::record::ConstructionRecord;

use super::{EmissionSink, EmitError};

/// Keeps emitted records in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordLog {
  records: Vec<ConstructionRecord>,
  finished: bool,
}

impl RecordLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn records(&self) -> &[ConstructionRecord] {
    &self.records
  }

  pub fn into_records(self) -> Vec<ConstructionRecord> {
    self.records
  }

  /// Emitted identifiers in order.
  pub fn ids(&self) -> Vec<&str> {
    self.records.iter().map(|r| r.id.as_str()).collect()
  }

  pub fn get(&self, id: &str) -> Option<&ConstructionRecord> {
    self.records.iter().find(|r| r.id.as_str() == id)
  }

  pub fn is_finished(&self) -> bool {
    self.finished
  }
}

impl EmissionSink for RecordLog {
  fn emit(&mut self, record: &ConstructionRecord) -> Result<(), EmitError> {
    self.records.push(record.clone());
    Ok(())
  }

  fn finish(&mut self) -> Result<(), EmitError> {
    self.finished = true;
    Ok(())
  }
}

use std::io::Write;

use serde::Serialize;

use crate::record::ConstructionRecord;
use crate::util::hash::{Hashable, ObjectHash};

use super::{EmissionSink, EmitError};

/// One output line: the record's fields plus its content hash.
#[derive(Serialize)]
struct Line<'a> {
  #[serde(flatten)]
  record: &'a ConstructionRecord,
  hash: ObjectHash,
}

/// Writes each record as one line of JSON, tagged with its content hash.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
  writer: W,
}

impl<W: Write> JsonLinesSink<W> {
  pub fn new(writer: W) -> Self {
    Self { writer }
  }

  pub fn into_inner(self) -> W {
    self.writer
  }
}

impl<W: Write> EmissionSink for JsonLinesSink<W> {
  fn emit(&mut self, record: &ConstructionRecord) -> Result<(), EmitError> {
    let line = Line {
      record,
      hash: record.compute_hash()?,
    };
    serde_json::to_writer(&mut self.writer, &line)?;
    self.writer.write_all(b"\n")?;
    Ok(())
  }

  fn finish(&mut self) -> Result<(), EmitError> {
    self.writer.flush()?;
    Ok(())
  }
}

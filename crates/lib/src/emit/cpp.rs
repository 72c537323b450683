use std::io::Write;

use crate::consts::GENERATED_BANNER;
use crate::record::{AssignStyle, ConstructionRecord, FieldValue, Literal};

use super::{EmissionSink, EmitError};

/// Header every generated program includes.
const CORE_INCLUDE: &str = "esphome/core/application.h";

/// Renders records as the body of a C++ `setup()` function.
///
/// ```text
/// auto *ir_rx = new remote_receiver::RemoteReceiverComponent(14);
/// ir_rx->set_tolerance(25);
/// App.register_component(ir_rx);
/// ```
#[derive(Debug)]
pub struct CppSink<W: Write> {
  writer: W,
  includes: Vec<String>,
  started: bool,
}

impl<W: Write> CppSink<W> {
  /// `includes` are written after the core header, in the given order.
  pub fn new(writer: W, includes: Vec<String>) -> Self {
    Self {
      writer,
      includes,
      started: false,
    }
  }

  pub fn into_inner(self) -> W {
    self.writer
  }

  fn start(&mut self) -> Result<(), EmitError> {
    if self.started {
      return Ok(());
    }
    self.started = true;

    writeln!(self.writer, "{}", GENERATED_BANNER)?;
    writeln!(self.writer, "#include \"{}\"", CORE_INCLUDE)?;
    for include in &self.includes {
      writeln!(self.writer, "#include \"{}\"", include)?;
    }
    writeln!(self.writer)?;
    writeln!(self.writer, "using namespace esphome;")?;
    writeln!(self.writer)?;
    writeln!(self.writer, "void setup() {{")?;
    Ok(())
  }
}

impl<W: Write> EmissionSink for CppSink<W> {
  fn emit(&mut self, record: &ConstructionRecord) -> Result<(), EmitError> {
    self.start()?;
    let id = record.id.as_str();

    let args: Vec<String> = record
      .fields
      .iter()
      .filter(|field| field.style == AssignStyle::Constructor)
      .map(|field| render_value(&field.value))
      .collect();

    writeln!(self.writer, "  // {}", record.kind.qualified_name())?;
    writeln!(
      self.writer,
      "  auto *{} = new {}({});",
      id,
      record.kind.class,
      args.join(", ")
    )?;

    for field in &record.fields {
      match field.style {
        AssignStyle::Constructor => {}
        AssignStyle::Setter => {
          writeln!(self.writer, "  {}->set_{}({});", id, field.name, render_value(&field.value))?;
        }
        AssignStyle::Listener => {
          writeln!(self.writer, "  {}->register_listener({});", render_value(&field.value), id)?;
        }
      }
    }

    for registration in &record.registrations {
      writeln!(self.writer, "  App.{}({});", registration, id)?;
    }
    Ok(())
  }

  fn finish(&mut self) -> Result<(), EmitError> {
    self.start()?;
    writeln!(self.writer, "}}")?;
    self.writer.flush()?;
    Ok(())
  }
}

fn render_value(value: &FieldValue) -> String {
  match value {
    FieldValue::Reference(id) => id.to_string(),
    FieldValue::Literal(literal) => render_literal(literal),
  }
}

fn render_literal(literal: &Literal) -> String {
  match literal {
    Literal::Bool(b) => b.to_string(),
    Literal::Int(i) => i.to_string(),
    // JSON string escaping is valid C++ for the characters configs contain.
    Literal::String(s) => serde_json::Value::String(s.clone()).to_string(),
  }
}

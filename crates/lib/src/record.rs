//! Construction records.
//!
//! A [`ConstructionRecord`] is the finished description of one object: which
//! class to instantiate, under which identifier, and which values to assign
//! to it. Records are produced by build tasks and handed to an
//! [`EmissionSink`](crate::emit::EmissionSink) in completion order.
//!
//! # Example
//!
//! ```json
//! {
//!   "id": "living_room",
//!   "kind": { "domain": "climate", "platform": "mitsubishi_sez", "class": "mitsubishi_sez::MitsubishiSEZClimate" },
//!   "fields": [
//!     { "name": "transmitter", "value": { "reference": "ir_tx" }, "style": "setter" },
//!     { "name": "supports_cool", "value": { "literal": { "bool": true } }, "style": "setter" }
//!   ],
//!   "registrations": ["register_component", "register_climate"]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::Identifier;
use crate::util::hash::Hashable;

/// What kind of object a record constructs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectKind {
  /// Component domain, e.g. `climate`.
  pub domain: String,
  /// Implementation within the domain, e.g. `mitsubishi_sez`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub platform: Option<String>,
  /// Fully qualified target class.
  pub class: String,
}

impl ObjectKind {
  pub fn new(domain: &str, class: &str) -> Self {
    Self {
      domain: domain.to_string(),
      platform: None,
      class: class.to_string(),
    }
  }

  pub fn with_platform(mut self, platform: &str) -> Self {
    self.platform = Some(platform.to_string());
    self
  }

  /// `domain.platform`, or just `domain`.
  pub fn qualified_name(&self) -> String {
    match &self.platform {
      Some(platform) => format!("{}.{}", self.domain, platform),
      None => self.domain.clone(),
    }
  }
}

impl fmt::Display for ObjectKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.class)
  }
}

/// A constant value assigned to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
  Bool(bool),
  Int(i64),
  String(String),
}

/// The value of one field assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
  Literal(Literal),
  /// Another constructed object; always emitted before this record.
  Reference(Identifier),
}

/// How an assignment is expressed in generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignStyle {
  /// Passed to the constructor, in field order.
  Constructor,
  /// `obj->set_<name>(value)`.
  Setter,
  /// `value->register_listener(obj)`; the referenced object observes this one.
  Listener,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAssignment {
  pub name: String,
  pub value: FieldValue,
  pub style: AssignStyle,
}

impl FieldAssignment {
  pub fn literal(name: &str, value: Literal, style: AssignStyle) -> Self {
    Self {
      name: name.to_string(),
      value: FieldValue::Literal(value),
      style,
    }
  }

  pub fn reference(name: &str, id: Identifier, style: AssignStyle) -> Self {
    Self {
      name: name.to_string(),
      value: FieldValue::Reference(id),
      style,
    }
  }
}

/// The finished description of one object to emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionRecord {
  pub id: Identifier,
  pub kind: ObjectKind,
  pub fields: Vec<FieldAssignment>,
  /// Application registration calls, e.g. `register_component`.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub registrations: Vec<String>,
}

impl ConstructionRecord {
  pub fn new(id: Identifier, kind: ObjectKind) -> Self {
    Self {
      id,
      kind,
      fields: Vec::new(),
      registrations: Vec::new(),
    }
  }

  pub fn with_field(mut self, field: FieldAssignment) -> Self {
    self.fields.push(field);
    self
  }

  pub fn with_registration(mut self, registration: &str) -> Self {
    self.registrations.push(registration.to_string());
    self
  }

  /// Identifiers this record refers to, in field order.
  pub fn references(&self) -> impl Iterator<Item = &Identifier> {
    self.fields.iter().filter_map(|field| match &field.value {
      FieldValue::Reference(id) => Some(id),
      FieldValue::Literal(_) => None,
    })
  }
}

impl Hashable for ConstructionRecord {}

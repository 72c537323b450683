use thiserror::Error;

use crate::catalog::ComponentDef;
use crate::config::{ConfigMap, ConfigPath};
use crate::record::{AssignStyle, Literal};
use crate::registry::Identifier;

/// Unit a duration field is expressed in once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
  Micros,
  Millis,
}

impl TimeUnit {
  pub fn suffix(self) -> &'static str {
    match self {
      TimeUnit::Micros => "us",
      TimeUnit::Millis => "ms",
    }
  }

  pub(crate) fn micros_per_unit(self) -> i64 {
    match self {
      TimeUnit::Micros => 1,
      TimeUnit::Millis => 1_000,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
  Bool,
  Int { min: i64, max: i64 },
  Str,
  Pin,
  Duration(TimeUnit),
  /// Identifier of an object declared in `domain`.
  Use { domain: &'static str },
  /// Inline component of `domain`, planned as its own object.
  Nested { domain: &'static str },
}

impl FieldType {
  pub fn describe(&self) -> String {
    match self {
      FieldType::Bool => "boolean".to_string(),
      FieldType::Int { min, max } => format!("integer {}..={}", min, max),
      FieldType::Str => "string".to_string(),
      FieldType::Pin => "pin".to_string(),
      FieldType::Duration(unit) => format!("duration ({})", unit.suffix()),
      FieldType::Use { domain } => format!("id of a {}", domain),
      FieldType::Nested { domain } => format!("{} mapping", domain),
    }
  }
}

/// Value used when an optional key is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
  Bool(bool),
  Int(i64),
  /// The only object declared in the field's `Use` domain.
  Sole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
  Required,
  Optional,
  Default(DefaultValue),
}

/// Schema entry for one configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
  /// Key in the configuration mapping.
  pub key: &'static str,
  /// Field name in the construction record.
  pub field: &'static str,
  pub ty: FieldType,
  pub presence: Presence,
  pub style: AssignStyle,
  /// Keys sharing a group are mutually exclusive.
  pub group: Option<&'static str>,
}

impl FieldSpec {
  pub const fn new(key: &'static str, ty: FieldType) -> Self {
    Self {
      key,
      field: key,
      ty,
      presence: Presence::Optional,
      style: AssignStyle::Setter,
      group: None,
    }
  }

  pub const fn required(mut self) -> Self {
    self.presence = Presence::Required;
    self
  }

  pub const fn defaults_to(mut self, value: DefaultValue) -> Self {
    self.presence = Presence::Default(value);
    self
  }

  pub const fn field(mut self, field: &'static str) -> Self {
    self.field = field;
    self
  }

  pub const fn style(mut self, style: AssignStyle) -> Self {
    self.style = style;
    self
  }

  pub const fn group(mut self, group: &'static str) -> Self {
    self.group = Some(group);
    self
  }
}

/// A validated field value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedValue {
  Literal(Literal),
  Reference(Identifier),
  /// Inline mapping for a child component of `domain`.
  Nested { domain: &'static str, map: ConfigMap },
  /// Resolved at build time to the only declared object of `domain`.
  Sole { domain: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedField {
  pub spec: &'static FieldSpec,
  pub value: ValidatedValue,
  pub path: ConfigPath,
}

/// A component mapping that passed validation.
///
/// `fields` holds present keys in document order followed by defaulted keys
/// in schema order.
#[derive(Debug, Clone)]
pub struct ValidatedNode {
  pub def: &'static ComponentDef,
  pub id: Option<Identifier>,
  pub fields: Vec<ValidatedField>,
}

/// One problem found in a component mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
  pub path: ConfigPath,
  pub message: String,
}

impl ValidationError {
  pub fn new(path: &ConfigPath, message: impl Into<String>) -> Self {
    Self {
      path: path.clone(),
      message: message.into(),
    }
  }
}

/// Validates one component mapping against its catalog entry.
pub trait Validator {
  fn validate(
    &self,
    def: &'static ComponentDef,
    map: &ConfigMap,
    path: &ConfigPath,
  ) -> Result<ValidatedNode, Vec<ValidationError>>;
}

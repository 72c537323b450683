//! Component catalog.
//!
//! The catalog is the closed set of component kinds the planner knows how to
//! build. Each [`ComponentDef`] names the target class, the schema of its
//! configuration keys, the application registrations its record carries, and
//! its dependency declarations:
//!
//! - `requires`: domains that must have at least one node somewhere in the
//!   configuration for this component to work.
//! - `auto_load`: additional components whose code the generated program
//!   needs; they only affect the emitted preamble.

use thiserror::Error;

use crate::record::{AssignStyle, ObjectKind};
use crate::schema::{DefaultValue, FieldSpec, FieldType, TimeUnit};

/// A buildable component kind.
#[derive(Debug)]
pub struct ComponentDef {
  pub domain: &'static str,
  /// `None` for domains that have a single implementation.
  pub platform: Option<&'static str>,
  pub class: &'static str,
  pub header: &'static str,
  pub description: &'static str,
  pub fields: &'static [FieldSpec],
  pub registrations: &'static [&'static str],
  pub requires: &'static [&'static str],
  pub auto_load: &'static [&'static str],
}

impl ComponentDef {
  pub fn kind(&self) -> ObjectKind {
    let kind = ObjectKind::new(self.domain, self.class);
    match self.platform {
      Some(platform) => kind.with_platform(platform),
      None => kind,
    }
  }

  pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
    self.fields.iter().find(|spec| spec.key == key)
  }

  pub fn qualified_name(&self) -> String {
    self.kind().qualified_name()
  }
}

/// Errors raised when a node names no known component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
  #[error("unknown component domain '{0}'")]
  UnknownDomain(String),

  #[error("domain '{domain}' requires a platform (available: {available})")]
  MissingPlatform { domain: String, available: String },

  #[error("unknown platform '{platform}' for domain '{domain}' (available: {available})")]
  UnknownPlatform {
    domain: String,
    platform: String,
    available: String,
  },

  #[error("domain '{0}' does not take a platform")]
  UnexpectedPlatform(String),
}

/// Lookup table over component definitions.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
  components: &'static [ComponentDef],
}

impl Catalog {
  /// The components shipped with devgen.
  pub fn builtin() -> Self {
    Self { components: BUILTIN }
  }

  pub fn iter(&self) -> impl Iterator<Item = &'static ComponentDef> {
    self.components.iter()
  }

  /// Find the definition for `domain` and the node's `platform` value.
  pub fn lookup(&self, domain: &str, platform: Option<&str>) -> Result<&'static ComponentDef, LookupError> {
    let candidates: Vec<&'static ComponentDef> = self.iter().filter(|def| def.domain == domain).collect();
    if candidates.is_empty() {
      return Err(LookupError::UnknownDomain(domain.to_string()));
    }

    let available = || {
      candidates
        .iter()
        .filter_map(|def| def.platform)
        .collect::<Vec<_>>()
        .join(", ")
    };

    let takes_platform = candidates.iter().any(|def| def.platform.is_some());
    match (takes_platform, platform) {
      (false, None) => Ok(candidates[0]),
      (false, Some(_)) => Err(LookupError::UnexpectedPlatform(domain.to_string())),
      (true, None) => Err(LookupError::MissingPlatform {
        domain: domain.to_string(),
        available: available(),
      }),
      (true, Some(platform)) => candidates
        .iter()
        .find(|def| def.platform == Some(platform))
        .copied()
        .ok_or_else(|| LookupError::UnknownPlatform {
          domain: domain.to_string(),
          platform: platform.to_string(),
          available: available(),
        }),
    }
  }
}

const REMOTE_TRANSMITTER_FIELDS: &[FieldSpec] = &[
  FieldSpec::new("pin", FieldType::Pin)
    .required()
    .style(AssignStyle::Constructor),
  FieldSpec::new("carrier_duty_percent", FieldType::Int { min: 1, max: 100 }).defaults_to(DefaultValue::Int(50)),
];

const REMOTE_RECEIVER_FIELDS: &[FieldSpec] = &[
  FieldSpec::new("pin", FieldType::Pin)
    .required()
    .style(AssignStyle::Constructor),
  FieldSpec::new("tolerance", FieldType::Int { min: 0, max: 100 }).defaults_to(DefaultValue::Int(25)),
  FieldSpec::new("buffer_size", FieldType::Int { min: 1, max: 65_535 }).defaults_to(DefaultValue::Int(1_000)),
  FieldSpec::new("idle", FieldType::Duration(TimeUnit::Micros)).defaults_to(DefaultValue::Int(10_000)),
  FieldSpec::new("filter", FieldType::Duration(TimeUnit::Micros)).defaults_to(DefaultValue::Int(50)),
];

const TEMPLATE_SENSOR_FIELDS: &[FieldSpec] = &[
  FieldSpec::new("name", FieldType::Str).required(),
  FieldSpec::new("unit_of_measurement", FieldType::Str),
  FieldSpec::new("accuracy_decimals", FieldType::Int { min: 0, max: 10 }),
  FieldSpec::new("update_interval", FieldType::Duration(TimeUnit::Millis)).defaults_to(DefaultValue::Int(60_000)),
];

const MITSUBISHI_SEZ_FIELDS: &[FieldSpec] = &[
  FieldSpec::new("name", FieldType::Str).required(),
  FieldSpec::new("supports_cool", FieldType::Bool).defaults_to(DefaultValue::Bool(true)),
  FieldSpec::new("supports_heat", FieldType::Bool).defaults_to(DefaultValue::Bool(true)),
  FieldSpec::new("sensor", FieldType::Use { domain: "sensor" }),
  FieldSpec::new(
    "receiver_id",
    FieldType::Use {
      domain: "remote_receiver",
    },
  )
  .field("receiver")
  .style(AssignStyle::Listener)
  .group("receiver"),
  FieldSpec::new(
    "receiver",
    FieldType::Nested {
      domain: "remote_receiver",
    },
  )
  .style(AssignStyle::Listener)
  .group("receiver"),
  FieldSpec::new(
    "transmitter_id",
    FieldType::Use {
      domain: "remote_transmitter",
    },
  )
  .field("transmitter")
  .defaults_to(DefaultValue::Sole),
];

static BUILTIN: &[ComponentDef] = &[
  ComponentDef {
    domain: "remote_transmitter",
    platform: None,
    class: "remote_transmitter::RemoteTransmitterComponent",
    header: "esphome/components/remote_transmitter/remote_transmitter.h",
    description: "Infrared/RF transmitter on a GPIO pin",
    fields: REMOTE_TRANSMITTER_FIELDS,
    registrations: &["register_component"],
    requires: &[],
    auto_load: &[],
  },
  ComponentDef {
    domain: "remote_receiver",
    platform: None,
    class: "remote_receiver::RemoteReceiverComponent",
    header: "esphome/components/remote_receiver/remote_receiver.h",
    description: "Infrared/RF receiver on a GPIO pin",
    fields: REMOTE_RECEIVER_FIELDS,
    registrations: &["register_component"],
    requires: &[],
    auto_load: &[],
  },
  ComponentDef {
    domain: "sensor",
    platform: Some("template"),
    class: "template_::TemplateSensor",
    header: "esphome/components/template/sensor/template_sensor.h",
    description: "Sensor whose state is published by the application",
    fields: TEMPLATE_SENSOR_FIELDS,
    registrations: &["register_component", "register_sensor"],
    requires: &[],
    auto_load: &[],
  },
  ComponentDef {
    domain: "climate",
    platform: Some("mitsubishi_sez"),
    class: "mitsubishi_sez::MitsubishiSEZClimate",
    header: "esphome/components/mitsubishi_sez/mitsubishi_sez.h",
    description: "Mitsubishi SEZ ducted air conditioner controlled over IR",
    fields: MITSUBISHI_SEZ_FIELDS,
    registrations: &["register_component", "register_climate"],
    requires: &["remote_transmitter"],
    auto_load: &["climate_ir"],
  },
];

use std::collections::BTreeMap;

use crate::catalog::ComponentDef;
use crate::config::{ConfigMap, ConfigPath, ConfigValue};
use crate::consts::{ID_KEY, PLATFORM_KEY};
use crate::record::Literal;
use crate::registry::Identifier;

use super::types::*;

/// The built-in validator driven by catalog field specs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl Validator for SchemaValidator {
  fn validate(
    &self,
    def: &'static ComponentDef,
    map: &ConfigMap,
    path: &ConfigPath,
  ) -> Result<ValidatedNode, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fields = Vec::new();
    let mut id = None;
    let mut groups: BTreeMap<&str, &str> = BTreeMap::new();

    for (key, value) in map.iter() {
      let key_path = path.key(key);

      if key == ID_KEY {
        match parse_identifier(value, &key_path) {
          Ok(parsed) => id = Some(parsed),
          Err(e) => errors.push(e),
        }
        continue;
      }

      if key == PLATFORM_KEY && def.platform.is_some() {
        continue;
      }

      let Some(spec) = def.field(key) else {
        errors.push(ValidationError::new(
          &key_path,
          format!("unknown key '{}' for {}", key, def.qualified_name()),
        ));
        continue;
      };

      if let Some(group) = spec.group {
        if let Some(other) = groups.insert(group, key) {
          errors.push(ValidationError::new(
            &key_path,
            format!("'{}' and '{}' cannot be used together", other, key),
          ));
          continue;
        }
      }

      match validate_value(spec, value, &key_path) {
        Ok(validated) => fields.push(ValidatedField {
          spec,
          value: validated,
          path: key_path,
        }),
        Err(e) => errors.push(e),
      }
    }

    for spec in def.fields {
      if map.contains_key(spec.key) {
        continue;
      }
      if spec.group.is_some_and(|group| groups.contains_key(group)) {
        continue;
      }
      match spec.presence {
        Presence::Required => errors.push(ValidationError::new(path, format!("missing required key '{}'", spec.key))),
        Presence::Optional => {}
        Presence::Default(default) => {
          let value = match (default, spec.ty) {
            (DefaultValue::Bool(b), _) => ValidatedValue::Literal(Literal::Bool(b)),
            (DefaultValue::Int(i), _) => ValidatedValue::Literal(Literal::Int(i)),
            (DefaultValue::Sole, FieldType::Use { domain }) => ValidatedValue::Sole { domain },
            (DefaultValue::Sole, other) => {
              errors.push(ValidationError::new(
                path,
                format!("key '{}' of type {} cannot default to a sole object", spec.key, other.describe()),
              ));
              continue;
            }
          };
          fields.push(ValidatedField {
            spec,
            value,
            path: path.key(spec.key),
          });
        }
      }
    }

    if errors.is_empty() {
      Ok(ValidatedNode { def, id, fields })
    } else {
      Err(errors)
    }
  }
}

/// Parse an `id` value.
pub fn parse_identifier(value: &ConfigValue, path: &ConfigPath) -> Result<Identifier, ValidationError> {
  match value {
    ConfigValue::String(s) if Identifier::is_valid(s) => Ok(Identifier::new(s.as_str())),
    ConfigValue::String(s) => Err(ValidationError::new(path, format!("'{}' is not a valid identifier", s))),
    other => Err(mismatch(path, "identifier", other)),
  }
}

fn validate_value(spec: &FieldSpec, value: &ConfigValue, path: &ConfigPath) -> Result<ValidatedValue, ValidationError> {
  let literal = |l: Literal| Ok(ValidatedValue::Literal(l));

  match (spec.ty, value) {
    (FieldType::Bool, ConfigValue::Bool(b)) => literal(Literal::Bool(*b)),
    (FieldType::Int { min, max }, ConfigValue::Int(i)) => {
      if (min..=max).contains(i) {
        literal(Literal::Int(*i))
      } else {
        Err(ValidationError::new(
          path,
          format!("{} is out of range {}..={}", i, min, max),
        ))
      }
    }
    (FieldType::Str, ConfigValue::String(s)) => literal(Literal::String(s.clone())),
    (FieldType::Pin, value) => parse_pin(value, path).map(|pin| ValidatedValue::Literal(Literal::Int(pin))),
    (FieldType::Duration(unit), value) => {
      parse_duration(value, unit, path).map(|d| ValidatedValue::Literal(Literal::Int(d)))
    }
    (FieldType::Use { .. }, value) => parse_identifier(value, path).map(ValidatedValue::Reference),
    (FieldType::Nested { domain }, ConfigValue::Map(map)) => Ok(ValidatedValue::Nested {
      domain,
      map: map.clone(),
    }),
    (ty, other) => Err(mismatch(path, &ty.describe(), other)),
  }
}

/// Highest GPIO number accepted for a pin.
const MAX_PIN: i64 = 39;

fn parse_pin(value: &ConfigValue, path: &ConfigPath) -> Result<i64, ValidationError> {
  let number = match value {
    ConfigValue::Int(i) => *i,
    ConfigValue::String(s) => {
      let digits = s
        .strip_prefix("GPIO")
        .or_else(|| s.strip_prefix("gpio"))
        .unwrap_or(s.as_str());
      digits
        .parse::<i64>()
        .map_err(|_| ValidationError::new(path, format!("'{}' is not a pin", s)))?
    }
    other => return Err(mismatch(path, "pin", other)),
  };

  if (0..=MAX_PIN).contains(&number) {
    Ok(number)
  } else {
    Err(ValidationError::new(path, format!("pin {} is out of range 0..={}", number, MAX_PIN)))
  }
}

fn parse_duration(value: &ConfigValue, unit: TimeUnit, path: &ConfigPath) -> Result<i64, ValidationError> {
  let micros = match value {
    ConfigValue::Int(i) if *i >= 0 => return Ok(*i),
    ConfigValue::String(s) => {
      let s = s.trim();
      let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
      let (digits, suffix) = s.split_at(split);
      let amount: i64 = digits
        .parse()
        .map_err(|_| ValidationError::new(path, format!("'{}' is not a duration", s)))?;
      let scale = match suffix.trim() {
        "us" => 1,
        "ms" => 1_000,
        "s" => 1_000_000,
        "min" => 60_000_000,
        other => {
          return Err(ValidationError::new(path, format!("unknown duration unit '{}'", other)));
        }
      };
      amount
        .checked_mul(scale)
        .ok_or_else(|| ValidationError::new(path, format!("duration '{}' is too large", s)))?
    }
    other => return Err(mismatch(path, "duration", other)),
  };

  let per_unit = unit.micros_per_unit();
  if micros % per_unit != 0 {
    return Err(ValidationError::new(
      path,
      format!("duration is not a whole number of {}", unit.suffix()),
    ));
  }
  Ok(micros / per_unit)
}

fn mismatch(path: &ConfigPath, expected: &str, found: &ConfigValue) -> ValidationError {
  ValidationError::new(path, format!("expected {}, found {}", expected, found.type_name()))
}

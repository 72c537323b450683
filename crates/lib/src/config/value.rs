use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A configuration value with key order preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  String(String),
  List(Vec<ConfigValue>),
  Map(ConfigMap),
}

impl ConfigValue {
  /// Short name of the value's type, for diagnostics.
  pub fn type_name(&self) -> &'static str {
    match self {
      ConfigValue::Null => "null",
      ConfigValue::Bool(_) => "boolean",
      ConfigValue::Int(_) => "integer",
      ConfigValue::Float(_) => "float",
      ConfigValue::String(_) => "string",
      ConfigValue::List(_) => "list",
      ConfigValue::Map(_) => "mapping",
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      ConfigValue::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&ConfigMap> {
    match self {
      ConfigValue::Map(m) => Some(m),
      _ => None,
    }
  }
}

impl From<&str> for ConfigValue {
  fn from(value: &str) -> Self {
    ConfigValue::String(value.to_string())
  }
}

impl From<bool> for ConfigValue {
  fn from(value: bool) -> Self {
    ConfigValue::Bool(value)
  }
}

impl From<i64> for ConfigValue {
  fn from(value: i64) -> Self {
    ConfigValue::Int(value)
  }
}

impl From<i32> for ConfigValue {
  fn from(value: i32) -> Self {
    ConfigValue::Int(i64::from(value))
  }
}

impl From<ConfigMap> for ConfigValue {
  fn from(value: ConfigMap) -> Self {
    ConfigValue::Map(value)
  }
}

/// An ordered string-keyed mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigMap(IndexMap<String, ConfigValue>);

/// Stands in for a domain written with no body (`remote_transmitter:`).
pub(crate) static EMPTY_MAP: LazyLock<ConfigMap> = LazyLock::new(ConfigMap::new);

impl ConfigMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style insert, mostly for tests and programmatic configs.
  pub fn with(mut self, key: &str, value: impl Into<ConfigValue>) -> Self {
    self.insert(key, value.into());
    self
  }

  /// Insert or replace a key. Replacing keeps the original position.
  pub fn insert(&mut self, key: &str, value: ConfigValue) {
    self.0.insert(key.to_string(), value);
  }

  pub fn get(&self, key: &str) -> Option<&ConfigValue> {
    self.0.get(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl FromIterator<(String, ConfigValue)> for ConfigMap {
  fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

/// One step in a [`ConfigPath`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathSegment {
  Key(String),
  Index(usize),
}

/// Location of a value inside the configuration, e.g. `climate[0].receiver`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigPath(Vec<PathSegment>);

impl ConfigPath {
  pub fn root() -> Self {
    Self::default()
  }

  pub fn key(&self, key: &str) -> Self {
    let mut segments = self.0.clone();
    segments.push(PathSegment::Key(key.to_string()));
    Self(segments)
  }

  pub fn index(&self, index: usize) -> Self {
    let mut segments = self.0.clone();
    segments.push(PathSegment::Index(index));
    Self(segments)
  }

  pub fn segments(&self) -> &[PathSegment] {
    &self.0
  }

  pub fn is_root(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for ConfigPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.0.is_empty() {
      return write!(f, "<root>");
    }
    for (i, segment) in self.0.iter().enumerate() {
      match segment {
        PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
        PathSegment::Key(key) => write!(f, ".{}", key)?,
        PathSegment::Index(index) => write!(f, "[{}]", index)?,
      }
    }
    Ok(())
  }
}

/// One top-level component node, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode<'a> {
  pub domain: &'a str,
  pub path: ConfigPath,
  pub map: &'a ConfigMap,
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::value::{ConfigMap, ConfigPath, ConfigValue, EMPTY_MAP, RawNode};

/// Errors raised while reading or converting a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The configuration file could not be read.
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The document is not valid YAML.
  #[error("invalid YAML: {0}")]
  Yaml(#[from] serde_yaml::Error),

  /// The document root is not a mapping.
  #[error("configuration root must be a mapping, found {0}")]
  InvalidRoot(&'static str),

  /// A mapping key is not a string.
  #[error("{path}: mapping keys must be strings")]
  NonStringKey { path: ConfigPath },

  /// YAML tags (`!secret`, `!lambda`, ...) are not part of the format.
  #[error("{path}: tagged value '{tag}' is not supported")]
  Tagged { path: ConfigPath, tag: String },

  /// A top-level domain holds something other than component mappings.
  #[error("{path}: expected a component mapping or a list of them, found {found}")]
  Shape { path: ConfigPath, found: &'static str },
}

/// A parsed configuration document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
  root: ConfigMap,
}

impl ConfigTree {
  pub fn new(root: ConfigMap) -> Self {
    Self { root }
  }

  pub fn root(&self) -> &ConfigMap {
    &self.root
  }

  /// Top-level domains in document order.
  pub fn domains(&self) -> impl Iterator<Item = &str> {
    self.root.keys()
  }

  /// Flatten top-level domains into component nodes, in document order.
  ///
  /// A malformed domain yields a [`ConfigError::Shape`] in place of its nodes;
  /// the remaining domains are still returned.
  pub fn nodes(&self) -> Vec<Result<RawNode<'_>, ConfigError>> {
    let mut nodes = Vec::new();

    for (domain, value) in self.root.iter() {
      let path = ConfigPath::root().key(domain);
      match value {
        ConfigValue::Null => nodes.push(Ok(RawNode {
          domain,
          path,
          map: &*EMPTY_MAP,
        })),
        ConfigValue::Map(map) => nodes.push(Ok(RawNode { domain, path, map })),
        ConfigValue::List(items) => {
          for (index, item) in items.iter().enumerate() {
            let path = path.index(index);
            match item {
              ConfigValue::Map(map) => nodes.push(Ok(RawNode { domain, path, map })),
              other => nodes.push(Err(ConfigError::Shape {
                path,
                found: other.type_name(),
              })),
            }
          }
        }
        other => nodes.push(Err(ConfigError::Shape {
          path,
          found: other.type_name(),
        })),
      }
    }

    nodes
  }
}

/// Read and parse a YAML configuration file.
pub fn load_config(path: &Path) -> Result<ConfigTree, ConfigError> {
  let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  debug!(path = %path.display(), bytes = content.len(), "loaded config file");
  parse_config(&content)
}

/// Parse a YAML configuration document.
///
/// An empty document is an empty configuration.
pub fn parse_config(content: &str) -> Result<ConfigTree, ConfigError> {
  let document: serde_yaml::Value = serde_yaml::from_str(content)?;

  match convert(&document, &ConfigPath::root())? {
    ConfigValue::Null => Ok(ConfigTree::default()),
    ConfigValue::Map(root) => Ok(ConfigTree::new(root)),
    other => Err(ConfigError::InvalidRoot(other.type_name())),
  }
}

fn convert(value: &serde_yaml::Value, path: &ConfigPath) -> Result<ConfigValue, ConfigError> {
  use serde_yaml::Value;

  Ok(match value {
    Value::Null => ConfigValue::Null,
    Value::Bool(b) => ConfigValue::Bool(*b),
    Value::Number(n) => match n.as_i64() {
      Some(i) => ConfigValue::Int(i),
      None => ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN)),
    },
    Value::String(s) => ConfigValue::String(s.clone()),
    Value::Sequence(items) => ConfigValue::List(
      items
        .iter()
        .enumerate()
        .map(|(i, item)| convert(item, &path.index(i)))
        .collect::<Result<_, _>>()?,
    ),
    Value::Mapping(mapping) => {
      let map = mapping
        .iter()
        .map(|(key, item)| {
          let key = key
            .as_str()
            .ok_or_else(|| ConfigError::NonStringKey { path: path.clone() })?;
          Ok((key.to_string(), convert(item, &path.key(key))?))
        })
        .collect::<Result<ConfigMap, ConfigError>>()?;
      ConfigValue::Map(map)
    }
    Value::Tagged(tagged) => {
      return Err(ConfigError::Tagged {
        path: path.clone(),
        tag: tagged.tag.to_string(),
      });
    }
  })
}

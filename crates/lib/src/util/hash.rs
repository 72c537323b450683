//! Hashing utilities for deterministic fingerprints.
//!
//! This module provides:
//! - `ObjectHash`: a truncated 20-character hash of a serialized value
//! - `Hashable`: hash any serializable value through its canonical JSON form
//! - `StreamHasher`: fold an ordered sequence of values into one hash
//!
//! Two compile runs over the same configuration must yield the same record
//! stream; comparing stream hashes is the cheap way to check that.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// A content hash identifying a serialized value or stream.
///
/// The hash is a 20-character truncated SHA-256, lowercase hexadecimal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

fn truncate(full: String) -> ObjectHash {
  ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string())
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    Ok(truncate(format!("{:x}", hasher.finalize())))
  }
}

/// Incremental hash over an ordered sequence of serializable values.
///
/// Each value is serialized to JSON and terminated by a newline before being
/// fed to the digest, so `[a, b]` and `[ab]` never collide.
#[derive(Clone, Default)]
pub struct StreamHasher {
  hasher: Sha256,
  count: usize,
}

impl std::fmt::Debug for StreamHasher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StreamHasher").field("count", &self.count).finish()
  }
}

impl StreamHasher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append one value to the stream.
  pub fn update<T: Serialize>(&mut self, value: &T) -> Result<(), HashError> {
    let serialized = serde_json::to_string(value)?;
    self.hasher.update(serialized.as_bytes());
    self.hasher.update(b"\n");
    self.count += 1;
    Ok(())
  }

  /// Number of values folded so far.
  pub fn count(&self) -> usize {
    self.count
  }

  /// Hash of the stream so far. Does not consume the hasher.
  pub fn current(&self) -> ObjectHash {
    truncate(format!("{:x}", self.hasher.clone().finalize()))
  }
}

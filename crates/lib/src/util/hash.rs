//! Hashing utilities for content addressing and archive verification.
//!
//! This module provides:
//! - `ObjectHash`: a SHA-256 digest identifying a descriptor or a build plan
//! - `Hashable`: canonical (key-sorted) hashing of any serializable value
//! - `Checksum`: a declared archive checksum and its verification
//! - `hash_file()` / `hash_bytes()`: raw digests with a chosen algorithm

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha1::Sha1;
use sha2::{Digest, Sha256};

pub type HashError = serde_json::Error;

/// A content-addressed hash identifying a unique object.
///
/// The hash is the full SHA-256 of the canonical JSON serialization, so two
/// values with the same fields in a different order hash identically while
/// any changed value produces a different hash.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string of 64 characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHash(pub String);

impl ObjectHash {
  /// Hash an arbitrary identity string (a plan path or a preset label).
  pub fn of_str(value: &str) -> Self {
    ObjectHash(hash_bytes::<Sha256>(value.as_bytes()))
  }
}

impl fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let canonical = canonical_json(self)?;
    Ok(ObjectHash(hash_bytes::<Sha256>(canonical.as_bytes())))
  }
}

/// Serialize a value to compact JSON with every object's keys sorted.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, HashError> {
  let value = sort_keys(serde_json::to_value(value)?);
  serde_json::to_string(&value)
}

fn sort_keys(value: Value) -> Value {
  match value {
    Value::Object(map) => {
      let mut entries: Vec<(String, Value)> = map.into_iter().collect();
      entries.sort_by(|a, b| a.0.cmp(&b.0));
      Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
    }
    Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
    other => other,
  }
}

/// Expected digest of a downloaded archive.
///
/// Serialized as `{"sha1": "<hex>"}` or `{"sha256": "<hex>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checksum {
  Sha1(String),
  Sha256(String),
}

impl Checksum {
  pub fn algorithm(&self) -> &'static str {
    match self {
      Checksum::Sha1(_) => "sha1",
      Checksum::Sha256(_) => "sha256",
    }
  }

  pub fn expected(&self) -> &str {
    match self {
      Checksum::Sha1(hex) | Checksum::Sha256(hex) => hex,
    }
  }

  /// Digest `data` with this checksum's algorithm.
  pub fn digest_bytes(&self, data: &[u8]) -> String {
    match self {
      Checksum::Sha1(_) => hash_bytes::<Sha1>(data),
      Checksum::Sha256(_) => hash_bytes::<Sha256>(data),
    }
  }

  /// Digest the file at `path` with this checksum's algorithm.
  pub fn digest_file(&self, path: &Path) -> io::Result<String> {
    match self {
      Checksum::Sha1(_) => hash_file::<Sha1>(path),
      Checksum::Sha256(_) => hash_file::<Sha256>(path),
    }
  }

  pub fn matches(&self, actual: &str) -> bool {
    self.expected().eq_ignore_ascii_case(actual)
  }
}

impl fmt::Display for Checksum {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.algorithm(), self.expected())
  }
}

/// Hash a file's contents, streaming it in fixed-size chunks.
pub fn hash_file<D: Digest>(path: &Path) -> io::Result<String> {
  let mut file = fs::File::open(path)?;
  let mut hasher = D::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(hex::encode(hasher.finalize()))
}

/// Hash arbitrary bytes, returning lowercase hex.
pub fn hash_bytes<D: Digest>(data: &[u8]) -> String {
  let mut hasher = D::new();
  hasher.update(data);
  hex::encode(hasher.finalize())
}

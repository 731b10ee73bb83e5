//! Cache document types.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::PackageDescriptor;
use crate::platform::PathError;
use crate::util::hash::ObjectHash;

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("failed to read cache {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse cache {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize cache: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to write cache {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Path(#[from] PathError),

  #[error("failed to hash descriptor for {package}: {source}")]
  Hash {
    package: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("no progress record for descriptor {0}")]
  UnknownRecord(ObjectHash),
}

/// Lifecycle stages in their strict forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  Unpacked,
  Configured,
  Built,
  Installed,
}

impl Stage {
  pub const ALL: [Stage; 4] = [Stage::Unpacked, Stage::Configured, Stage::Built, Stage::Installed];

  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Unpacked => "unpacked",
      Stage::Configured => "configured",
      Stage::Built => "built",
      Stage::Installed => "installed",
    }
  }

  /// The action that reaches this stage, for log messages.
  pub fn verb(&self) -> &'static str {
    match self {
      Stage::Unpacked => "unpack",
      Stage::Configured => "configure",
      Stage::Built => "build",
      Stage::Installed => "install",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Completion flags of one descriptor.
///
/// `installed ⇒ built ⇒ configured ⇒ unpacked` holds as long as flags are
/// only set through the lifecycle driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProgress {
  #[serde(default)]
  pub unpacked: bool,
  #[serde(default)]
  pub configured: bool,
  #[serde(default)]
  pub built: bool,
  #[serde(default)]
  pub installed: bool,
}

impl BuildProgress {
  pub fn is_done(&self, stage: Stage) -> bool {
    match stage {
      Stage::Unpacked => self.unpacked,
      Stage::Configured => self.configured,
      Stage::Built => self.built,
      Stage::Installed => self.installed,
    }
  }

  pub fn set(&mut self, stage: Stage) {
    match stage {
      Stage::Unpacked => self.unpacked = true,
      Stage::Configured => self.configured = true,
      Stage::Built => self.built = true,
      Stage::Installed => self.installed = true,
    }
  }

  /// Forget everything after unpacking.
  pub fn reset(&mut self) {
    self.configured = false;
    self.built = false;
    self.installed = false;
  }

  pub fn reset_all(&mut self) {
    *self = Self::default();
  }
}

/// Progress of one descriptor together with the descriptor it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
  #[serde(flatten)]
  pub progress: BuildProgress,
  pub descriptor: PackageDescriptor,
}

/// All records of one plan, keyed by descriptor digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSection {
  #[serde(default)]
  pub package: BTreeMap<ObjectHash, PackageRecord>,
}

/// The persisted cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDocument {
  pub created: DateTime<Utc>,
  #[serde(default)]
  pub loaded: Option<DateTime<Utc>>,
  #[serde(default)]
  pub saved: Option<DateTime<Utc>>,
  /// Plan identity digest to that plan's records.
  #[serde(default)]
  pub environment: BTreeMap<ObjectHash, PlanSection>,
}

impl CacheDocument {
  pub fn new() -> Self {
    Self {
      created: Utc::now(),
      loaded: None,
      saved: None,
      environment: BTreeMap::new(),
    }
  }
}

impl Default for CacheDocument {
  fn default() -> Self {
    Self::new()
  }
}

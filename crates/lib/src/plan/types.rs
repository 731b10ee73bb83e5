//! Build plan types.
//!
//! Raw plan documents ([`PlanSpec`], [`PackageSpec`]) are what users write and
//! what the built-in catalogue embeds. Resolution turns them into the
//! immutable [`PackageDescriptor`]s and [`BuildLayout`] the build operates on.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::Compression;
use crate::platform::Os;
use crate::util::hash::{Checksum, Hashable};

#[derive(Debug, Error)]
pub enum PlanError {
  #[error("unknown preset: {0}")]
  UnknownPreset(String),

  #[error("plan file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read plan file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse plan {origin}: {source}")]
  Parse {
    origin: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("package {0} declares no remote url")]
  NoMirrors(String),

  #[error("package {package}: cannot infer compression from {filename}")]
  UnknownCompression { package: String, filename: String },

  #[error("unsupported platform: {0}")]
  UnsupportedPlatform(String),
}

/// Mirror list as written in a plan: a single URL or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mirrors {
  One(String),
  Many(Vec<String>),
}

impl Default for Mirrors {
  fn default() -> Self {
    Mirrors::Many(Vec::new())
  }
}

impl Mirrors {
  pub fn into_vec(self) -> Vec<String> {
    match self {
      Mirrors::One(url) => vec![url],
      Mirrors::Many(urls) => urls,
    }
  }
}

/// How a package is configured, built and installed.
///
/// Every variant shares the unpack step. The data carried by a variant names
/// the files it treats specially.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyKind {
  /// `./configure`, `make`, `make install`.
  #[default]
  Make,
  /// Generic make, plus building a versioned shared library from a dedicated
  /// makefile and linking its shorter version names on `platform`.
  SharedLibrary {
    makefile: String,
    library: String,
    platform: Os,
  },
  /// Generic configure and build; install copies prebuilt artifacts into the
  /// layout instead of running `make install`.
  PrebuiltArchive {
    archive: String,
    header: String,
    shared_object: String,
    platform: Os,
  },
  /// Nothing to build; install copies `include_dir` into the include prefix.
  HeaderOnly { include_dir: String },
  /// Generic make with `<flag>=<install prefix>` appended to the configure flags.
  ConfigureWith { flag: String },
}

fn default_install_target() -> String {
  "install".to_string()
}

fn default_clean_target() -> Option<String> {
  Some("clean".to_string())
}

/// Options passed to `configure` and `make`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeOptions {
  #[serde(default)]
  pub configure_flags: Vec<String>,
  #[serde(default)]
  pub build_flags: Vec<String>,
  #[serde(default)]
  pub build_target: Option<String>,
  #[serde(default = "default_install_target")]
  pub install_target: String,
  /// `null` disables the make invocation on clean.
  #[serde(default = "default_clean_target")]
  pub clean_target: Option<String>,
  #[serde(default)]
  pub prefix_in_make: bool,
}

impl Default for MakeOptions {
  fn default() -> Self {
    Self {
      configure_flags: Vec::new(),
      build_flags: Vec::new(),
      build_target: None,
      install_target: default_install_target(),
      clean_target: default_clean_target(),
      prefix_in_make: false,
    }
  }
}

/// A package entry as written in a plan document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageSpec {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default)]
  pub remote_url: Mirrors,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub remote_filename: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sha1: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sha256: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub compression: Option<Compression>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path_in_archive: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub strategy: Option<StrategyKind>,
  #[serde(flatten)]
  pub make: MakeOptions,
}

/// A plan document: layout overrides plus the ordered package list.
///
/// Every path is optional and derived from `home` when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanSpec {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub home: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub platform: Option<Os>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cache_path: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub install_prefix: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub download_prefix: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub package_prefix: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bin_prefix: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub include_prefix: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lib_prefix: Option<String>,
  #[serde(default)]
  pub packages: Vec<PackageSpec>,
}

/// Absolute directories a run reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLayout {
  pub home: PathBuf,
  pub cache_path: PathBuf,
  pub install_prefix: PathBuf,
  pub download_prefix: PathBuf,
  pub package_prefix: PathBuf,
  pub bin_prefix: PathBuf,
  pub include_prefix: PathBuf,
  pub lib_prefix: PathBuf,
}

/// A fully resolved package.
///
/// Immutable once resolved. Its canonical digest keys the package's progress
/// in the cache, so any change here means a fresh build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
  pub name: String,
  pub version: Option<String>,
  pub mirrors: Vec<String>,
  pub remote_filename: String,
  pub checksum: Option<Checksum>,
  pub compression: Compression,
  pub extension: Option<String>,
  pub archive_root: String,
  pub display_name: String,
  pub download_path: PathBuf,
  pub package_path: PathBuf,
  pub strategy: StrategyKind,
  pub make: MakeOptions,
}

impl Hashable for PackageDescriptor {}

//! Built-in preset catalogue.
//!
//! Presets are plan documents shipped inside the library. One package of the
//! catalogue may be revision-tracked: its source is taken from a code host
//! snapshot of a requested revision instead of a release archive.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_REVISION;

use super::types::{Mirrors, PackageSpec, PlanError, PlanSpec};

const BUILTIN_CATALOGUE: &str = include_str!("presets.json");

/// A package whose source follows a requested revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionTracking {
  pub package: String,
  /// Code host prefix; the snapshot lives at `<url_prefix>/zip/<revision>`.
  pub url_prefix: String,
}

impl RevisionTracking {
  /// Point `package` at the snapshot of `revision`.
  pub fn apply(&self, package: &mut PackageSpec, revision: &str) {
    package.remote_url = Mirrors::One(format!("{}/zip/{}", self.url_prefix, revision));
    package.remote_filename = Some(format!("{}-{}.zip", package.name, revision));
    package.version = Some(format!("git-{}", revision));
    package
      .make
      .build_flags
      .push(format!("{}_VERSION=git-{}", package.name.to_uppercase(), revision));
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalogue {
  #[serde(default)]
  pub revision_tracking: Option<RevisionTracking>,
  #[serde(default)]
  pub presets: BTreeMap<String, PlanSpec>,
}

impl Catalogue {
  /// The catalogue embedded in this library.
  pub fn builtin() -> Result<Self, PlanError> {
    Self::parse(BUILTIN_CATALOGUE)
  }

  pub fn parse(content: &str) -> Result<Self, PlanError> {
    serde_json::from_str(content).map_err(|source| PlanError::Parse {
      origin: "built-in presets".to_string(),
      source,
    })
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.presets.keys().map(String::as_str)
  }

  /// Produce the plan document for `name` at `revision`, with its label.
  ///
  /// The label is `<name>-<revision>`; the preset's home gains it as a
  /// subdirectory so different revisions never share build state.
  pub fn instantiate(&self, name: &str, revision: Option<&str>) -> Result<(String, PlanSpec), PlanError> {
    let revision = revision.unwrap_or(DEFAULT_REVISION);
    let label = format!("{}-{}", name, revision);

    let mut spec = self
      .presets
      .get(name)
      .cloned()
      .ok_or_else(|| PlanError::UnknownPreset(name.to_string()))?;

    let home = match &spec.home {
      Some(home) => Path::new(home).join(&label),
      None => Path::new(&label).to_path_buf(),
    };
    spec.home = Some(home.to_string_lossy().into_owned());

    if let Some(tracking) = &self.revision_tracking {
      for package in spec.packages.iter_mut().filter(|p| p.name == tracking.package) {
        tracking.apply(package, revision);
      }
    }

    Ok((label, spec))
  }
}

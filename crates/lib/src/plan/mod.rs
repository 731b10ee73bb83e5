//! Build plans.
//!
//! A plan comes either from a JSON file or from a built-in preset. Resolution
//! expands every path, derives each package's filenames, version and
//! locations, and pins its strategy through the fixed registry, producing a
//! [`BuildPlan`] whose descriptors never change for the rest of the run.

pub mod preset;
pub mod registry;
pub mod types;

pub use preset::{Catalogue, RevisionTracking};
pub use registry::registered_strategy;
pub use types::{
  BuildLayout, MakeOptions, Mirrors, PackageDescriptor, PackageSpec, PlanError, PlanSpec, StrategyKind,
};

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::archive::Compression;
use crate::consts::{CACHE_FILENAME, DEFAULT_HOME};
use crate::fetch::url_to_filename;
use crate::platform::{Os, expand_path};
use crate::util::hash::{Checksum, ObjectHash};

/// Where a plan comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSource {
  File(PathBuf),
  Preset { name: String, revision: Option<String> },
}

/// A resolved plan, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
  /// Digest of the plan's identity; keys this plan's section of the cache.
  pub id: ObjectHash,
  pub label: String,
  pub platform: Os,
  pub layout: BuildLayout,
  pub packages: Vec<PackageDescriptor>,
}

impl BuildPlan {
  /// Load and resolve the plan named by `source`.
  ///
  /// `home` replaces the plan's own home directory when given.
  pub fn load(source: &PlanSource, home: Option<&Path>) -> Result<Self, PlanError> {
    match source {
      PlanSource::File(path) => {
        let resolved = expand_path(&path.to_string_lossy());
        if !resolved.is_file() {
          return Err(PlanError::NotFound(resolved));
        }
        let resolved = dunce::canonicalize(&resolved).unwrap_or(resolved);
        let content = std::fs::read_to_string(&resolved).map_err(|source| PlanError::Read {
          path: resolved.clone(),
          source,
        })?;
        let label = resolved.to_string_lossy().into_owned();
        let spec: PlanSpec = serde_json::from_str(&content).map_err(|source| PlanError::Parse {
          origin: label.clone(),
          source,
        })?;
        Self::from_spec(ObjectHash::of_str(&label), label, spec, home)
      }
      PlanSource::Preset { name, revision } => {
        let (label, spec) = Catalogue::builtin()?.instantiate(name, revision.as_deref())?;
        Self::from_spec(ObjectHash::of_str(&label), label, spec, home)
      }
    }
  }

  /// Resolve a plan document under the given identity.
  pub fn from_spec(id: ObjectHash, label: String, spec: PlanSpec, home: Option<&Path>) -> Result<Self, PlanError> {
    let platform = match spec.platform {
      Some(platform) => platform,
      None => Os::current().ok_or_else(|| PlanError::UnsupportedPlatform(std::env::consts::OS.to_string()))?,
    };
    let layout = BuildLayout::resolve(&spec, home);

    let packages = spec
      .packages
      .into_iter()
      .map(|package| resolve_package(package, &layout))
      .collect::<Result<Vec<_>, _>>()?;

    debug!(plan = %label, id = %id, packages = packages.len(), "plan resolved");

    Ok(Self {
      id,
      label,
      platform,
      layout,
      packages,
    })
  }
}

impl BuildLayout {
  /// Derive the layout from a plan document's overrides.
  pub fn resolve(spec: &PlanSpec, home_override: Option<&Path>) -> Self {
    let home = match home_override {
      Some(home) => expand_path(&home.to_string_lossy()),
      None => expand_path(spec.home.as_deref().unwrap_or(DEFAULT_HOME)),
    };
    let or_under = |value: &Option<String>, base: &Path, name: &str| match value {
      Some(raw) => expand_path(raw),
      None => base.join(name),
    };

    let install_prefix = or_under(&spec.install_prefix, &home, "install");
    Self {
      cache_path: or_under(&spec.cache_path, &home, CACHE_FILENAME),
      download_prefix: or_under(&spec.download_prefix, &home, "download"),
      package_prefix: or_under(&spec.package_prefix, &home, "package"),
      bin_prefix: or_under(&spec.bin_prefix, &install_prefix, "bin"),
      include_prefix: or_under(&spec.include_prefix, &install_prefix, "include"),
      lib_prefix: or_under(&spec.lib_prefix, &install_prefix, "lib"),
      install_prefix,
      home,
    }
  }
}

/// Resolve one package entry against the layout.
pub fn resolve_package(spec: PackageSpec, layout: &BuildLayout) -> Result<PackageDescriptor, PlanError> {
  let mirrors = spec.remote_url.into_vec();
  let Some(first) = mirrors.first() else {
    return Err(PlanError::NoMirrors(spec.name));
  };

  let remote_filename = spec.remote_filename.unwrap_or_else(|| url_to_filename(first));
  let (stem, last_ext) = split_extension(&remote_filename);

  let compression = match spec.compression {
    Some(compression) => compression,
    None => last_ext
      .and_then(Compression::from_extension)
      .ok_or_else(|| PlanError::UnknownCompression {
        package: spec.name.clone(),
        filename: remote_filename.clone(),
      })?,
  };

  let (basename, extension) = match split_extension(stem) {
    (inner, Some("tar")) => (inner, Some("tar".to_string())),
    _ => (stem, None),
  };

  let version = spec.version.or_else(|| derive_version(&spec.name, basename));
  let archive_root = spec.path_in_archive.unwrap_or_else(|| basename.to_string());
  let display_name = spec.display_name.unwrap_or_else(|| match &version {
    Some(version) => format!("{} {}", spec.name, version),
    None => spec.name.clone(),
  });

  let checksum = match (spec.sha256, spec.sha1) {
    (Some(sha256), _) => Some(Checksum::Sha256(sha256)),
    (None, Some(sha1)) => Some(Checksum::Sha1(sha1)),
    (None, None) => None,
  };

  let strategy = registered_strategy(&spec.name)
    .or(spec.strategy)
    .unwrap_or_default();

  Ok(PackageDescriptor {
    download_path: layout.download_prefix.join(&remote_filename),
    package_path: layout.package_prefix.join(&archive_root),
    name: spec.name,
    version,
    mirrors,
    remote_filename,
    checksum,
    compression,
    extension,
    archive_root,
    display_name,
    strategy,
    make: spec.make,
  })
}

/// Split `name` at its last dot, ignoring a leading one.
fn split_extension(name: &str) -> (&str, Option<&str>) {
  match name.rfind('.') {
    Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
    _ => (name, None),
  }
}

/// The version embedded in an archive basename, e.g. `1.2.11` in `zlib-1.2.11`.
///
/// Only an exact leading `name` is removed; a basename that does not start
/// with the package name yields no version.
fn derive_version(name: &str, basename: &str) -> Option<String> {
  let rest = basename.strip_prefix(name)?;
  let rest = rest.strip_prefix('-').unwrap_or(rest);
  if rest.is_empty() { None } else { Some(rest.to_string()) }
}

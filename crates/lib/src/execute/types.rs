//! Types for running a plan.
//!
//! This module defines the aggregated error type, the run request, and the
//! per-package and whole-run results returned by the orchestrator.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheError;
use crate::fetch::DownloadError;
use crate::plan::{PlanError, PlanSource};
use crate::platform::PathError;
use crate::process::ProcessError;
use crate::util::hash::ObjectHash;

/// Errors that can abort a run.
#[derive(Debug, Error)]
pub enum BuildError {
  /// Every mirror of a package failed.
  #[error(transparent)]
  Download(DownloadError),

  /// An external tool exited with a non-zero status.
  #[error(transparent)]
  Process(#[from] ProcessError),

  #[error(transparent)]
  Path(#[from] PathError),

  /// An in-process install copy failed.
  #[error("failed to copy {from} to {to}: {source}")]
  CopyFailed {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Cache(#[from] CacheError),

  #[error(transparent)]
  Plan(#[from] PlanError),

  #[error("I/O error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The run was asked to stop.
  #[error("interrupted")]
  Interrupted,
}

impl From<DownloadError> for BuildError {
  fn from(err: DownloadError) -> Self {
    match err {
      DownloadError::Path(path) => BuildError::Path(path),
      other => BuildError::Download(other),
    }
  }
}

impl BuildError {
  /// Whether a child process died from a signal instead of exiting.
  ///
  /// A terminal Ctrl-C reaches `make` and the compiler as well as us, so the
  /// child can fail before our own signal listener has run.
  pub fn killed_by_signal(&self) -> bool {
    matches!(self, BuildError::Process(ProcessError::CommandFailed { code: None, .. }))
  }
}

/// What to do with every package of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
  /// Bring every package up to installed.
  #[serde(rename = "build")]
  Build,
  /// Run each package's clean target and forget configure, build and install.
  #[serde(rename = "clean")]
  Clean,
  /// Delete each package's extraction directory and forget every stage.
  #[serde(rename = "clean.package")]
  CleanPackage,
}

impl Action {
  pub fn as_str(&self) -> &'static str {
    match self {
      Action::Build => "build",
      Action::Clean => "clean",
      Action::CleanPackage => "clean.package",
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A fully specified run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
  pub action: Action,
  pub source: PlanSource,
  /// Replaces the plan's home directory.
  pub home: Option<PathBuf>,
}

/// What happened to one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageOutcome {
  Installed,
  AlreadyInstalled,
  Cleaned,
  Removed,
}

impl PackageOutcome {
  pub fn as_str(&self) -> &'static str {
    match self {
      PackageOutcome::Installed => "installed",
      PackageOutcome::AlreadyInstalled => "already installed",
      PackageOutcome::Cleaned => "cleaned",
      PackageOutcome::Removed => "removed",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReport {
  pub name: String,
  pub display_name: String,
  pub digest: ObjectHash,
  pub outcome: PackageOutcome,
}

/// Result of a run that went through every package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
  pub action: Action,
  pub plan: String,
  pub plan_id: ObjectHash,
  pub home: PathBuf,
  pub packages: Vec<PackageReport>,
  /// External commands started during the run.
  pub commands_run: usize,
}

impl RunSummary {
  pub fn count(&self, outcome: PackageOutcome) -> usize {
    self.packages.iter().filter(|p| p.outcome == outcome).count()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
  Completed(RunSummary),
  /// Stopped early on request; progress up to the last finished stage is saved.
  Interrupted,
}

//! Persisted build progress.
//!
//! Progress is keyed by content: a descriptor's canonical digest identifies
//! its record, and records are grouped under the digest of the plan that
//! produced them. Changing anything about a package (a flag, a URL, a
//! checksum) therefore starts it from scratch, while an unchanged package
//! resumes wherever the previous run stopped.

pub mod storage;
pub mod types;

pub use types::{BuildProgress, CacheDocument, CacheError, PackageRecord, PlanSection, Stage};

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::plan::PackageDescriptor;
use crate::util::hash::{Hashable, ObjectHash};

/// The cache of the active plan.
#[derive(Debug)]
pub struct DescriptorCache {
  path: PathBuf,
  plan: ObjectHash,
  document: CacheDocument,
}

impl DescriptorCache {
  /// Load the cache at `path` (or start a new one) and select `plan`'s section.
  pub fn open(path: &Path, plan: &ObjectHash) -> Result<Self, CacheError> {
    let mut document = match storage::load(path)? {
      Some(document) => document,
      None => {
        debug!(path = ?path, "creating new cache");
        CacheDocument::new()
      }
    };
    document.loaded = Some(Utc::now());
    document.environment.entry(plan.clone()).or_default();

    Ok(Self {
      path: path.to_path_buf(),
      plan: plan.clone(),
      document,
    })
  }

  fn section(&self) -> Option<&PlanSection> {
    self.document.environment.get(&self.plan)
  }

  fn section_mut(&mut self) -> &mut PlanSection {
    self.document.environment.entry(self.plan.clone()).or_default()
  }

  /// Return the digest of `descriptor`, creating an all-false record for it if needed.
  pub fn track(&mut self, descriptor: &PackageDescriptor) -> Result<ObjectHash, CacheError> {
    let digest = descriptor.compute_hash().map_err(|source| CacheError::Hash {
      package: descriptor.name.clone(),
      source,
    })?;

    self.section_mut().package.entry(digest.clone()).or_insert_with(|| {
      debug!(package = %descriptor.name, digest = %digest, "new descriptor");
      PackageRecord {
        progress: BuildProgress::default(),
        descriptor: descriptor.clone(),
      }
    });

    Ok(digest)
  }

  pub fn progress(&self, digest: &ObjectHash) -> Option<BuildProgress> {
    self.section()?.package.get(digest).map(|record| record.progress)
  }

  fn record_mut(&mut self, digest: &ObjectHash) -> Result<&mut PackageRecord, CacheError> {
    self
      .section_mut()
      .package
      .get_mut(digest)
      .ok_or_else(|| CacheError::UnknownRecord(digest.clone()))
  }

  /// Record that `stage` completed.
  pub fn mark(&mut self, digest: &ObjectHash, stage: Stage) -> Result<(), CacheError> {
    self.record_mut(digest)?.progress.set(stage);
    Ok(())
  }

  /// Forget configure, build and install; keep the unpacked tree.
  pub fn reset(&mut self, digest: &ObjectHash) -> Result<(), CacheError> {
    self.record_mut(digest)?.progress.reset();
    Ok(())
  }

  /// Forget every stage, including unpacking.
  pub fn reset_all(&mut self, digest: &ObjectHash) -> Result<(), CacheError> {
    self.record_mut(digest)?.progress.reset_all();
    Ok(())
  }

  /// Persist the document, stamping the save time.
  pub fn save(&mut self) -> Result<(), CacheError> {
    self.document.saved = Some(Utc::now());
    storage::save(&self.path, &self.document)
  }
}

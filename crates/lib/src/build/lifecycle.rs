//! Resumable stage driver.
//!
//! [`Lifecycle::ensure`] brings a package up to a target stage, performing
//! only the stages whose flags are not yet set, in order. A flag is set only
//! after its work succeeded, and the cache is saved after every flag change,
//! so an aborted run resumes at the first unfinished stage.

use std::fs;

use tracing::{debug, info};

use crate::cache::{BuildProgress, Stage};
use crate::execute::BuildError;
use crate::plan::PackageDescriptor;
use crate::util::hash::ObjectHash;

use super::{BuildContext, BuildStrategy};

/// One package's progress through the stages.
#[derive(Debug, Clone)]
pub struct Lifecycle<'a> {
  strategy: BuildStrategy<'a>,
  digest: ObjectHash,
}

impl<'a> Lifecycle<'a> {
  /// `digest` must already be tracked by the context's cache.
  pub fn new(descriptor: &'a PackageDescriptor, digest: ObjectHash) -> Self {
    Self {
      strategy: BuildStrategy::new(descriptor),
      digest,
    }
  }

  pub fn progress(&self, ctx: &BuildContext<'_>) -> BuildProgress {
    ctx.cache.progress(&self.digest).unwrap_or_default()
  }

  /// Bring the package up to `target`, running every missing earlier stage first.
  pub async fn ensure(&self, target: Stage, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let descriptor = self.strategy.descriptor();
    if self.progress(ctx).is_done(target) {
      debug!(package = %descriptor.name, stage = %target, "already done");
      return Ok(());
    }

    for stage in Stage::ALL.into_iter().filter(|stage| *stage <= target) {
      if self.progress(ctx).is_done(stage) {
        continue;
      }

      ctx.interrupt.check()?;
      info!(package = %descriptor.display_name, stage = stage.verb(), "running stage");

      self.strategy.perform(stage, ctx).await?;

      ctx.cache.mark(&self.digest, stage)?;
      ctx.cache.save()?;
      debug!(package = %descriptor.name, stage = %stage, "stage complete");
    }

    Ok(())
  }

  /// Run the clean target and forget everything after unpacking.
  pub async fn clean(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let descriptor = self.strategy.descriptor();
    info!(package = %descriptor.display_name, "cleaning");

    self.strategy.clean(ctx).await?;
    ctx.cache.reset(&self.digest)?;
    ctx.cache.save()?;
    Ok(())
  }

  /// Delete the extraction directory and forget every stage.
  pub async fn clean_package(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let descriptor = self.strategy.descriptor();
    info!(package = %descriptor.display_name, path = ?descriptor.package_path, "removing package");

    if descriptor.package_path.exists() {
      fs::remove_dir_all(&descriptor.package_path).map_err(|source| BuildError::Io {
        path: descriptor.package_path.clone(),
        source,
      })?;
    }
    ctx.cache.reset_all(&self.digest)?;
    ctx.cache.save()?;
    Ok(())
  }
}

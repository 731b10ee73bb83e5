//! Package lifecycle.
//!
//! Every package moves through the same four stages (unpacked, configured,
//! built, installed) in strict order. What each stage does depends on the
//! package's strategy; when each stage runs is decided by the lifecycle driver
//! from the progress recorded in the cache.
//!
//! # Submodules
//!
//! - [`strategy`] - Stage work per strategy kind
//! - [`lifecycle`] - Resumable stage driver, clean and clean.package
//! - [`install`] - In-process copies and library links

pub mod install;
pub mod lifecycle;
pub mod strategy;

pub use lifecycle::Lifecycle;
pub use strategy::BuildStrategy;

use crate::cache::DescriptorCache;
use crate::execute::Interrupt;
use crate::fetch::Downloader;
use crate::plan::BuildLayout;
use crate::platform::Os;
use crate::process::CommandRunner;

/// Shared state of a run, lent to each package in turn.
pub struct BuildContext<'a> {
  pub layout: &'a BuildLayout,
  pub platform: Os,
  pub runner: &'a mut CommandRunner,
  pub downloader: &'a Downloader,
  pub cache: &'a mut DescriptorCache,
  pub interrupt: &'a Interrupt,
}

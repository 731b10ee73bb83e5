//! Cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::types::BuildError;

/// A shared stop request.
///
/// Signal handlers set it; the lifecycle driver checks it before every stage.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn trigger(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_set(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }

  /// `Err(BuildError::Interrupted)` once a stop was requested.
  pub fn check(&self) -> Result<(), BuildError> {
    if self.is_set() { Err(BuildError::Interrupted) } else { Ok(()) }
  }
}

//! Shared utilities.
//!
//! Common utilities used across the crate including hashing and test helpers.

pub mod hash;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

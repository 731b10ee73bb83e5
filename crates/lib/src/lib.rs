//! depbuild-lib: Core types and logic for depbuild
//!
//! This crate drives a fixed list of third-party source packages through a
//! resumable lifecycle (unpack, configure, build, install) into a private prefix:
//! - `plan`: build plans, package descriptors and the built-in preset catalogue
//! - `fetch`: mirror-fallback downloads with checksum verification
//! - `archive`: extraction dispatched on compression kind
//! - `cache`: content-addressed progress persisted across runs
//! - `build`: per-package strategies and the stage state machine
//! - `execute`: the orchestrator tying a run together

pub mod archive;
pub mod build;
pub mod cache;
pub mod consts;
pub mod execute;
pub mod fetch;
pub mod plan;
pub mod platform;
pub mod process;
pub mod util;

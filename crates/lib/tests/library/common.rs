//! Shared fixtures for library integration tests.

use std::path::{Path, PathBuf};

use depbuild_lib::execute::{Action, Orchestrator, RunOutcome, RunRequest, RunSummary};
use depbuild_lib::plan::PlanSource;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

pub use depbuild_lib::util::testutil::{tar_gz, tool_available};

/// The standard header-only fixture: `demo-1.0/include/demo.h`.
pub fn header_archive() -> Vec<u8> {
  tar_gz("demo-1.0", &[("include/demo.h", "int demo;\n"), ("README", "demo\n")])
}

pub fn sha256_hex(data: &[u8]) -> String {
  hex::encode(Sha256::digest(data))
}

/// A header-only package entry served from `mirrors`.
pub fn header_package(mirrors: Vec<String>, archive: &[u8]) -> Value {
  json!({
    "name": "demo",
    "remote_url": mirrors,
    "remote_filename": "demo-1.0.tar.gz",
    "sha256": sha256_hex(archive),
    "strategy": {"kind": "header_only", "include_dir": "include"},
  })
}

/// Write a plan file rooted at `home` and return its path.
pub fn write_plan(dir: &Path, home: &Path, packages: Vec<Value>) -> PathBuf {
  let path = dir.join("plan.json");
  let plan = json!({
    "home": home.to_string_lossy(),
    "platform": "linux",
    "packages": packages,
  });
  std::fs::write(&path, serde_json::to_string_pretty(&plan).unwrap()).unwrap();
  path
}

pub fn request(action: Action, plan: &Path) -> RunRequest {
  RunRequest {
    action,
    source: PlanSource::File(plan.to_path_buf()),
    home: None,
  }
}

/// Run to completion, panicking on errors or interruption.
pub async fn run_ok(action: Action, plan: &Path) -> RunSummary {
  match Orchestrator::default().run(&request(action, plan)).await {
    Ok(RunOutcome::Completed(summary)) => summary,
    other => panic!("expected a completed run, got {:?}", other),
  }
}

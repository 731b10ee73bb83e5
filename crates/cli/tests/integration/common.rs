//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{Value, json};
use tempfile::TempDir;

use depbuild_lib::util::testutil::tar_gz;
pub use depbuild_lib::util::testutil::tool_available;

/// `rapidjson-1.1.0/include/rapidjson/rapidjson.h`, the shape of a header-only release.
pub fn header_archive() -> Vec<u8> {
  tar_gz(
    "rapidjson-1.1.0",
    &[
      ("include/rapidjson/rapidjson.h", "#define RAPIDJSON 1\n"),
      ("readme.md", "rapidjson\n"),
    ],
  )
}

/// A rapidjson package served from `mirrors`; the registry makes it header-only.
pub fn rapidjson_package(mirrors: Vec<String>) -> Value {
  json!({
    "name": "rapidjson",
    "version": "1.1.0",
    "remote_url": mirrors,
    "remote_filename": "rapidjson-1.1.0.tar.gz",
  })
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the plan file and the
/// home directory the plan builds into.
pub struct TestEnv {
  pub temp: TempDir,
  pub plan_path: PathBuf,
}

impl TestEnv {
  /// Write a plan with `packages`, rooted at this environment's home.
  pub fn with_packages(packages: Vec<Value>) -> Self {
    let temp = TempDir::new().unwrap();
    let plan_path = temp.path().join("plan.json");
    let env = Self { temp, plan_path };
    let plan = json!({
      "home": env.home_path().to_string_lossy(),
      "platform": "linux",
      "packages": packages,
    });
    std::fs::write(&env.plan_path, serde_json::to_string_pretty(&plan).unwrap()).unwrap();
    env
  }

  /// Home directory of the plan.
  pub fn home_path(&self) -> PathBuf {
    let p = self.temp.path().join("home");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Get a pre-configured Command for the depbuild binary running `action` over this plan.
  pub fn depbuild_cmd(&self, action: &str) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("depbuild");
    cmd.arg(action).arg("--config").arg(&self.plan_path);
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Run `action` with JSON output and return the parsed summary.
  pub fn run_json(&self, action: &str) -> Value {
    let output = self.depbuild_cmd(action).args(["--output", "json"]).output().unwrap();
    assert!(
      output.status.success(),
      "{} failed: {}",
      action,
      String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
  }
}

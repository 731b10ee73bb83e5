//! Whole-run behavior: resumption, mirror handling, clean actions, digests.

use depbuild_lib::cache::{BuildProgress, DescriptorCache};
use depbuild_lib::execute::{Action, BuildError, Orchestrator, PackageOutcome, RunOutcome};
use depbuild_lib::fetch::{DownloadError, FetchError};
use depbuild_lib::plan::{BuildPlan, PlanSource};
use depbuild_lib::util::hash::{Hashable, ObjectHash};
use serde_json::json;
use tempfile::TempDir;

use super::common::{header_archive, header_package, request, run_ok, sha256_hex, tar_gz, tool_available, write_plan};

fn progress_of(plan: &BuildPlan, digest: &ObjectHash) -> Option<BuildProgress> {
  DescriptorCache::open(&plan.layout.cache_path, &plan.id)
    .unwrap()
    .progress(digest)
}

fn load(plan_path: &std::path::Path) -> BuildPlan {
  BuildPlan::load(&PlanSource::File(plan_path.to_path_buf()), None).unwrap()
}

#[tokio::test]
async fn second_build_runs_no_commands_and_fetches_nothing() {
  if !tool_available("tar") {
    return;
  }
  let archive = header_archive();
  let mut server = mockito::Server::new_async().await;
  let mock = server
    .mock("GET", "/demo-1.0.tar.gz")
    .with_body(&archive)
    .expect(1)
    .create_async()
    .await;
  let temp = TempDir::new().unwrap();
  let home = temp.path().join("home");
  let plan = write_plan(
    temp.path(),
    &home,
    vec![header_package(vec![format!("{}/demo-1.0.tar.gz", server.url())], &archive)],
  );

  let first = run_ok(Action::Build, &plan).await;
  let second = run_ok(Action::Build, &plan).await;

  assert_eq!(first.count(PackageOutcome::Installed), 1);
  assert_eq!(second.count(PackageOutcome::AlreadyInstalled), 1);
  assert_eq!(second.commands_run, 0);
  assert!(home.join("install/include/demo.h").is_file());
  mock.assert_async().await;
}

#[tokio::test]
async fn failing_first_mirror_falls_back_to_second() {
  if !tool_available("tar") {
    return;
  }
  let archive = header_archive();
  let mut server = mockito::Server::new_async().await;
  let broken = server
    .mock("GET", "/broken/demo-1.0.tar.gz")
    .with_status(500)
    .expect(1)
    .create_async()
    .await;
  let good = server
    .mock("GET", "/good/demo-1.0.tar.gz")
    .with_body(&archive)
    .expect(1)
    .create_async()
    .await;
  let temp = TempDir::new().unwrap();
  let home = temp.path().join("home");
  let plan = write_plan(
    temp.path(),
    &home,
    vec![header_package(
      vec![
        format!("{}/broken/demo-1.0.tar.gz", server.url()),
        format!("{}/good/demo-1.0.tar.gz", server.url()),
      ],
      &archive,
    )],
  );

  let summary = run_ok(Action::Build, &plan).await;

  assert_eq!(summary.count(PackageOutcome::Installed), 1);
  assert_eq!(std::fs::read(home.join("download/demo-1.0.tar.gz")).unwrap(), archive);
  broken.assert_async().await;
  good.assert_async().await;
}

#[tokio::test]
async fn corrupt_mirrors_leave_nothing_behind() {
  let archive = header_archive();
  let mut server = mockito::Server::new_async().await;
  server
    .mock("GET", "/demo-1.0.tar.gz")
    .with_body("definitely not the archive")
    .create_async()
    .await;
  let temp = TempDir::new().unwrap();
  let home = temp.path().join("home");
  let plan_path = write_plan(
    temp.path(),
    &home,
    vec![header_package(vec![format!("{}/demo-1.0.tar.gz", server.url())], &archive)],
  );

  let result = Orchestrator::default().run(&request(Action::Build, &plan_path)).await;

  match result {
    Err(BuildError::Download(DownloadError::Exhausted { package, last })) => {
      assert_eq!(package, "demo");
      assert!(matches!(last, Some(FetchError::ChecksumMismatch { .. })));
    }
    other => panic!("expected exhausted mirrors, got {:?}", other),
  }
  assert!(!home.join("download/demo-1.0.tar.gz").exists());

  let plan = load(&plan_path);
  let digest = plan.packages[0].compute_hash().unwrap();
  assert_eq!(progress_of(&plan, &digest), Some(BuildProgress::default()));
}

#[tokio::test]
async fn clean_keeps_identity_and_unpacked_tree() {
  if !tool_available("tar") {
    return;
  }
  let archive = header_archive();
  let mut server = mockito::Server::new_async().await;
  server
    .mock("GET", "/demo-1.0.tar.gz")
    .with_body(&archive)
    .expect(1)
    .create_async()
    .await;
  let temp = TempDir::new().unwrap();
  let home = temp.path().join("home");
  let plan_path = write_plan(
    temp.path(),
    &home,
    vec![header_package(vec![format!("{}/demo-1.0.tar.gz", server.url())], &archive)],
  );

  let built = run_ok(Action::Build, &plan_path).await;
  let cleaned = run_ok(Action::Clean, &plan_path).await;

  assert_eq!(built.packages[0].digest, cleaned.packages[0].digest);
  assert_eq!(cleaned.count(PackageOutcome::Cleaned), 1);

  let plan = load(&plan_path);
  let progress = progress_of(&plan, &cleaned.packages[0].digest).unwrap();
  assert_eq!(
    progress,
    BuildProgress {
      unpacked: true,
      ..Default::default()
    }
  );
  assert!(home.join("package/demo-1.0/README").is_file());

  // header-only: rebuilding after clean copies again but does not extract
  let rebuilt = run_ok(Action::Build, &plan_path).await;
  assert_eq!(rebuilt.count(PackageOutcome::Installed), 1);
  assert_eq!(rebuilt.commands_run, 0);
}

#[tokio::test]
async fn clean_package_forces_extraction_on_next_build() {
  if !tool_available("tar") {
    return;
  }
  let archive = header_archive();
  let mut server = mockito::Server::new_async().await;
  server
    .mock("GET", "/demo-1.0.tar.gz")
    .with_body(&archive)
    .create_async()
    .await;
  let temp = TempDir::new().unwrap();
  let home = temp.path().join("home");
  let plan_path = write_plan(
    temp.path(),
    &home,
    vec![header_package(vec![format!("{}/demo-1.0.tar.gz", server.url())], &archive)],
  );

  run_ok(Action::Build, &plan_path).await;
  let removed = run_ok(Action::CleanPackage, &plan_path).await;

  assert!(!home.join("package/demo-1.0").exists());
  let plan = load(&plan_path);
  assert_eq!(
    progress_of(&plan, &removed.packages[0].digest),
    Some(BuildProgress::default())
  );

  let rebuilt = run_ok(Action::Build, &plan_path).await;
  assert_eq!(rebuilt.commands_run, 1);
  assert!(home.join("package/demo-1.0/README").is_file());
}

#[tokio::test]
async fn clean_package_downloads_again_when_archive_is_gone() {
  if !tool_available("tar") {
    return;
  }
  let archive = header_archive();
  let mut server = mockito::Server::new_async().await;
  let mock = server
    .mock("GET", "/demo-1.0.tar.gz")
    .with_body(&archive)
    .expect(2)
    .create_async()
    .await;
  let temp = TempDir::new().unwrap();
  let home = temp.path().join("home");
  let plan_path = write_plan(
    temp.path(),
    &home,
    vec![header_package(vec![format!("{}/demo-1.0.tar.gz", server.url())], &archive)],
  );

  run_ok(Action::Build, &plan_path).await;
  run_ok(Action::CleanPackage, &plan_path).await;
  std::fs::remove_file(home.join("download/demo-1.0.tar.gz")).unwrap();

  let rebuilt = run_ok(Action::Build, &plan_path).await;

  assert_eq!(rebuilt.count(PackageOutcome::Installed), 1);
  assert_eq!(std::fs::read(home.join("download/demo-1.0.tar.gz")).unwrap(), archive);
  assert!(home.join("install/include/demo.h").is_file());
  mock.assert_async().await;
}

#[test]
fn changed_build_flags_start_a_fresh_record() {
  let temp = TempDir::new().unwrap();
  let home = temp.path().join("home");
  let archive = header_archive();
  let mirrors = vec!["https://example.com/demo-1.0.tar.gz".to_string()];

  let plan_path = write_plan(temp.path(), &home, vec![header_package(mirrors.clone(), &archive)]);
  let original = load(&plan_path).packages[0].compute_hash().unwrap();
  let reloaded = load(&plan_path).packages[0].compute_hash().unwrap();

  let mut changed = header_package(mirrors, &archive);
  changed["build_flags"] = json!(["CC=clang"]);
  let plan_path = write_plan(temp.path(), &home, vec![changed]);
  let modified = load(&plan_path).packages[0].compute_hash().unwrap();

  assert_eq!(original, reloaded);
  assert_ne!(original, modified);
}

#[tokio::test]
async fn packages_run_in_declaration_order_and_failure_stops_the_run() {
  if !tool_available("tar") {
    return;
  }
  let good = header_archive();
  let other = tar_gz("other-2.0", &[("include/other.h", "int other;\n")]);
  let mut server = mockito::Server::new_async().await;
  server
    .mock("GET", "/demo-1.0.tar.gz")
    .with_body(&good)
    .create_async()
    .await;
  server
    .mock("GET", "/other-2.0.tar.gz")
    .with_status(404)
    .create_async()
    .await;
  let temp = TempDir::new().unwrap();
  let home = temp.path().join("home");
  let third = json!({
    "name": "never",
    "remote_url": format!("{}/never-1.0.tar.gz", server.url()),
  });
  let second = json!({
    "name": "other",
    "remote_url": [format!("{}/other-2.0.tar.gz", server.url())],
    "sha256": sha256_hex(&other),
    "strategy": {"kind": "header_only", "include_dir": "include"},
  });
  let plan_path = write_plan(
    temp.path(),
    &home,
    vec![
      header_package(vec![format!("{}/demo-1.0.tar.gz", server.url())], &good),
      second,
      third,
    ],
  );

  let result = Orchestrator::default().run(&request(Action::Build, &plan_path)).await;

  assert!(matches!(result, Err(BuildError::Download(_))));
  assert!(home.join("install/include/demo.h").is_file());
  let plan = load(&plan_path);
  let never = plan.packages[2].compute_hash().unwrap();
  assert_eq!(progress_of(&plan, &never), None);
}

#[tokio::test]
async fn interrupted_run_reports_interrupted() {
  let temp = TempDir::new().unwrap();
  let home = temp.path().join("home");
  let plan_path = write_plan(
    temp.path(),
    &home,
    vec![header_package(vec!["http://127.0.0.1:1/demo-1.0.tar.gz".to_string()], b"x")],
  );
  let orchestrator = Orchestrator::default();
  orchestrator.interrupt().trigger();

  let outcome = orchestrator.run(&request(Action::Build, &plan_path)).await.unwrap();

  assert_eq!(outcome, RunOutcome::Interrupted);
}

#[cfg(unix)]
#[tokio::test]
async fn command_killed_by_signal_ends_run_as_interrupted() {
  if !tool_available("tar") {
    return;
  }
  let archive = tar_gz(
    "demo-1.0",
    &[("configure", "#!/bin/sh\nkill -KILL $$\n"), ("Makefile", "all:\n\ttrue\n")],
  );
  let mut server = mockito::Server::new_async().await;
  server
    .mock("GET", "/demo-1.0.tar.gz")
    .with_body(&archive)
    .create_async()
    .await;
  let temp = TempDir::new().unwrap();
  let home = temp.path().join("home");
  let plan_path = write_plan(
    temp.path(),
    &home,
    vec![json!({
      "name": "demo",
      "remote_url": [format!("{}/demo-1.0.tar.gz", server.url())],
      "remote_filename": "demo-1.0.tar.gz",
      "sha256": sha256_hex(&archive),
      "strategy": {"kind": "make"},
    })],
  );
  let orchestrator = Orchestrator::default();

  let outcome = orchestrator.run(&request(Action::Build, &plan_path)).await.unwrap();

  assert_eq!(outcome, RunOutcome::Interrupted);
  assert!(orchestrator.interrupt().is_set());
  let plan = load(&plan_path);
  let digest = plan.packages[0].compute_hash().unwrap();
  let progress = progress_of(&plan, &digest).unwrap();
  assert!(progress.unpacked);
  assert!(!progress.configured);
}

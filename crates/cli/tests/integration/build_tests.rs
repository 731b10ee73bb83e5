//! Build command integration tests.

use predicates::prelude::*;

use super::common::{TestEnv, header_archive, rapidjson_package, tool_available};

#[test]
fn build_installs_headers() {
  if !tool_available("tar") {
    return;
  }
  let mut server = mockito::Server::new();
  server
    .mock("GET", "/rapidjson-1.1.0.tar.gz")
    .with_body(header_archive())
    .create();
  let env = TestEnv::with_packages(vec![rapidjson_package(vec![format!(
    "{}/rapidjson-1.1.0.tar.gz",
    server.url()
  )])]);

  env
    .depbuild_cmd("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("build complete"))
    .stdout(predicate::str::contains("rapidjson 1.1.0 installed"));

  let home = env.home_path();
  assert!(home.join("install/include/rapidjson/rapidjson.h").is_file());
  assert!(home.join("download/rapidjson-1.1.0.tar.gz").is_file());
  assert!(home.join("output").exists());
  assert!(home.join("error").exists());
}

#[test]
fn build_is_idempotent() {
  if !tool_available("tar") {
    return;
  }
  let mut server = mockito::Server::new();
  let mock = server
    .mock("GET", "/rapidjson-1.1.0.tar.gz")
    .with_body(header_archive())
    .expect(1)
    .create();
  let env = TestEnv::with_packages(vec![rapidjson_package(vec![format!(
    "{}/rapidjson-1.1.0.tar.gz",
    server.url()
  )])]);

  let first = env.run_json("build");
  let second = env.run_json("build");

  assert_eq!(first["packages"][0]["outcome"], "installed");
  assert_eq!(second["packages"][0]["outcome"], "already_installed");
  assert_eq!(second["commands_run"], 0);
  assert_eq!(first["packages"][0]["digest"], second["packages"][0]["digest"]);
  mock.assert();
}

#[test]
fn build_falls_back_to_next_mirror() {
  if !tool_available("tar") {
    return;
  }
  let mut server = mockito::Server::new();
  server.mock("GET", "/down/rapidjson-1.1.0.tar.gz").with_status(503).create();
  server
    .mock("GET", "/up/rapidjson-1.1.0.tar.gz")
    .with_body(header_archive())
    .create();
  let env = TestEnv::with_packages(vec![rapidjson_package(vec![
    format!("{}/down/rapidjson-1.1.0.tar.gz", server.url()),
    format!("{}/up/rapidjson-1.1.0.tar.gz", server.url()),
  ])]);

  env
    .depbuild_cmd("build")
    .assert()
    .success()
    .stderr(predicate::str::contains("mirror failed"));

  assert!(env.home_path().join("install/include/rapidjson/rapidjson.h").is_file());
}

#[test]
fn build_fails_when_every_mirror_fails() {
  let mut server = mockito::Server::new();
  server.mock("GET", "/rapidjson-1.1.0.tar.gz").with_status(404).create();
  let env = TestEnv::with_packages(vec![rapidjson_package(vec![format!(
    "{}/rapidjson-1.1.0.tar.gz",
    server.url()
  )])]);

  env
    .depbuild_cmd("build")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("failed to download rapidjson from any mirror"))
    .stderr(predicate::str::contains("HTTP 404"));

  assert!(!env.home_path().join("download/rapidjson-1.1.0.tar.gz").exists());
}

#[test]
fn build_without_remote_url_fails() {
  let env = TestEnv::with_packages(vec![serde_json::json!({ "name": "zlib" })]);

  env
    .depbuild_cmd("build")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("package zlib declares no remote url"));
}

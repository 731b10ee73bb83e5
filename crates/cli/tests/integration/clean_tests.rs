//! Clean and clean.package integration tests.

use serde_json::Value;

use super::common::{TestEnv, header_archive, rapidjson_package, tool_available};

/// The single package record stored in the environment's cache.
fn only_record(env: &TestEnv) -> Value {
  let content = std::fs::read_to_string(env.home_path().join("cache.json")).unwrap();
  let cache: Value = serde_json::from_str(&content).unwrap();
  let plans = cache["environment"].as_object().unwrap();
  assert_eq!(plans.len(), 1);
  let records = plans.values().next().unwrap()["package"].as_object().unwrap().clone();
  assert_eq!(records.len(), 1);
  records.into_iter().next().unwrap().1
}

fn built_env(server: &mut mockito::ServerGuard) -> TestEnv {
  server
    .mock("GET", "/rapidjson-1.1.0.tar.gz")
    .with_body(header_archive())
    .create();
  let env = TestEnv::with_packages(vec![rapidjson_package(vec![format!(
    "{}/rapidjson-1.1.0.tar.gz",
    server.url()
  )])]);
  env.depbuild_cmd("build").assert().success();
  env
}

#[test]
fn clean_keeps_unpacked_tree() {
  if !tool_available("tar") {
    return;
  }
  let mut server = mockito::Server::new();
  let env = built_env(&mut server);

  let summary = env.run_json("clean");

  assert_eq!(summary["action"], "clean");
  assert_eq!(summary["packages"][0]["outcome"], "cleaned");
  let record = only_record(&env);
  assert_eq!(record["unpacked"], true);
  assert_eq!(record["configured"], false);
  assert_eq!(record["built"], false);
  assert_eq!(record["installed"], false);
  assert_eq!(record["descriptor"]["name"], "rapidjson");
  assert!(env.home_path().join("package/rapidjson-1.1.0/readme.md").is_file());
}

#[test]
fn clean_package_removes_tree_and_forces_extraction() {
  if !tool_available("tar") {
    return;
  }
  let mut server = mockito::Server::new();
  let env = built_env(&mut server);

  let summary = env.run_json("clean.package");

  assert_eq!(summary["action"], "clean.package");
  assert_eq!(summary["packages"][0]["outcome"], "removed");
  assert!(!env.home_path().join("package/rapidjson-1.1.0").exists());
  assert_eq!(only_record(&env)["unpacked"], false);

  let rebuilt = env.run_json("build");
  assert_eq!(rebuilt["packages"][0]["outcome"], "installed");
  assert_eq!(rebuilt["commands_run"], 1);
}

#[test]
fn cache_document_is_stamped() {
  if !tool_available("tar") {
    return;
  }
  let mut server = mockito::Server::new();
  let env = built_env(&mut server);

  let content = std::fs::read_to_string(env.home_path().join("cache.json")).unwrap();
  let cache: Value = serde_json::from_str(&content).unwrap();

  assert!(cache["created"].is_string());
  assert!(cache["saved"].is_string());
  assert_eq!(only_record(&env)["installed"], true);
}

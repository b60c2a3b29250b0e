//! Scenario file loading tests.

use std::io::Write;

use scenario_mock_server::{MockServer, MockServerError, ScenarioFile};
use serde_json::{json, Value};
use tempfile::NamedTempFile;

const SCENARIOS: &str = r#"{
  "options": { "port": 4010, "cookieMode": false, "parallelContextSize": 4 },
  "groups": { "users": "User flows" },
  "scenarios": {
    "default": [
      { "path": "/api/user/:id", "method": "GET", "response": { "data": { "name": "Alice" } } },
      {
        "path": "/graphql",
        "method": "GRAPHQL",
        "operations": [
          { "type": "query", "name": "Viewer", "response": { "data": { "data": { "viewer": "Alice" } } } }
        ]
      }
    ],
    "missing-user": {
      "name": "Missing user",
      "group": "users",
      "extend": "default",
      "mocks": [
        { "path": { "regex": "^/api/user/.*$" }, "method": "GET", "response": { "status": 404, "data": null } }
      ]
    }
  }
}"#;

fn write_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_scenario_file() {
    let file = write_file(SCENARIOS);

    let (scenarios, options) = ScenarioFile::from_path(file.path())
        .unwrap()
        .into_parts()
        .unwrap();

    assert_eq!(options.port, 4010);
    assert_eq!(options.parallel_context_size, 4);
    assert_eq!(scenarios.len(), 2);
    assert_eq!(scenarios.initial().id, "default");

    let missing = scenarios.get("missing-user").unwrap();
    assert_eq!(missing.name, "Missing user");
    assert_eq!(missing.extend.as_deref(), Some("default"));
    assert_eq!(scenarios.groups()[0].name, "User flows");
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let error = ScenarioFile::from_path(&path).unwrap_err();

    match error {
        MockServerError::ConfigRead { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("Expected ConfigRead, got {other:?}"),
    }
}

#[test]
fn test_invalid_files_are_rejected() {
    let unknown_field = write_file(r#"{ "scenarios": {}, "extra": true }"#);
    assert!(matches!(
        ScenarioFile::from_path(unknown_field.path()),
        Err(MockServerError::ConfigParse(_))
    ));

    let empty = write_file(r#"{ "scenarios": {} }"#);
    let result = ScenarioFile::from_path(empty.path()).unwrap().into_parts();
    assert!(matches!(result, Err(MockServerError::NoScenarios)));

    let cyclic = write_file(
        r#"{ "scenarios": { "a": { "extend": "b" }, "b": { "extend": "a" } } }"#,
    );
    let result = ScenarioFile::from_path(cyclic.path()).unwrap().into_parts();
    assert!(matches!(result, Err(MockServerError::ExtendCycle { .. })));
}

#[test]
fn test_schema_describes_file_format() {
    let schema = serde_json::to_value(ScenarioFile::schema()).unwrap();

    assert_eq!(schema["title"], json!("ScenarioFile"));
    assert!(schema["properties"]["scenarios"].is_object());
    assert!(schema["definitions"]["ServerOptions"].is_object());
}

#[tokio::test]
async fn test_serve_loaded_scenarios() {
    let file = write_file(SCENARIOS);
    let (scenarios, options) = ScenarioFile::from_path(file.path())
        .unwrap()
        .into_parts()
        .unwrap();
    let server = MockServer::start(scenarios, options).await.unwrap();
    let client = reqwest::Client::new();

    let user: Value = client
        .get(format!("{}/api/user/1", server.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user, json!({ "name": "Alice" }));

    client
        .put(format!("{}/select-scenario", server.url()))
        .json(&json!({ "scenarioId": "missing-user" }))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("{}/api/user/1", server.url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert_eq!(response.json::<Value>().await.unwrap(), Value::Null);

    let viewer: Value = client
        .post(format!("{}/graphql", server.url()))
        .json(&json!({ "query": "query Viewer { viewer }" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(viewer, json!({ "data": { "viewer": "Alice" } }));

    server.shutdown().await;
}

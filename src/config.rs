//! Server options and the declarative scenario file.
//!
//! A scenario file is JSON:
//!
//! ```json
//! {
//!   "options": { "port": 3000, "cookieMode": false },
//!   "groups": { "users": "User flows" },
//!   "scenarios": {
//!     "default": [
//!       { "path": "/api/user/:id", "method": "GET", "response": { "data": { "name": "Alice" } } }
//!     ],
//!     "empty": {
//!       "name": "No users",
//!       "group": "users",
//!       "extend": "default",
//!       "context": { "loggedIn": false },
//!       "mocks": [
//!         { "path": { "regex": "^/api/user/.*$" }, "method": "GET", "response": { "status": 404 } },
//!         {
//!           "path": "/graphql",
//!           "method": "GRAPHQL",
//!           "operations": [{ "type": "query", "name": "Users", "response": { "data": { "data": { "users": [] } } } }]
//!         }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! File responses are static descriptors; producers that compute responses
//! are registered through the library API instead.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::{MockServerError, Result};
use crate::response::ResponseDescriptor;
use crate::router::PathPattern;
use crate::scenario::{GraphQlMock, HttpMethod, HttpMock, Mock, Operation, OperationType, Scenario, ScenarioSet};

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default capacity of the parallel-session context cache.
pub const DEFAULT_PARALLEL_CONTEXT_SIZE: usize = 10;

/// Runtime options for a [`MockServer`](crate::MockServer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerOptions {
    pub port: u16,
    /// Route listing scenarios.
    pub scenarios_path: String,
    /// Route selecting the active scenario.
    pub select_scenario_path: String,
    /// Route listing scenario groups.
    pub groups_path: String,
    /// Keep the active scenario and context in a cookie instead of the server.
    pub cookie_mode: bool,
    /// How many header-correlated contexts are kept.
    pub parallel_context_size: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            scenarios_path: "/scenarios".to_string(),
            select_scenario_path: "/select-scenario".to_string(),
            groups_path: "/groups".to_string(),
            cookie_mode: false,
            parallel_context_size: DEFAULT_PARALLEL_CONTEXT_SIZE,
        }
    }
}

impl ServerOptions {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_cookie_mode(mut self, cookie_mode: bool) -> Self {
        self.cookie_mode = cookie_mode;
        self
    }

    pub fn with_parallel_context_size(mut self, size: usize) -> Self {
        self.parallel_context_size = size;
        self
    }
}

/// Root of a scenario file.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    #[serde(default)]
    pub options: ServerOptions,
    /// Display names of scenario groups, keyed by group id.
    #[serde(default)]
    pub groups: IndexMap<String, String>,
    /// Scenarios keyed by id. The first one is active on startup.
    pub scenarios: IndexMap<String, ScenarioEntry>,
}

/// A scenario, or just its list of mocks.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScenarioEntry {
    Mocks(Vec<MockSpec>),
    Full(ScenarioSpec),
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ScenarioSpec {
    pub name: Option<String>,
    pub description: Option<String>,
    pub group: Option<String>,
    pub context: Option<Context>,
    /// Id of the scenario this one inherits context and mocks from.
    pub extend: Option<String>,
    #[serde(default)]
    pub mocks: Vec<MockSpec>,
}

/// A mock, tagged by its `method`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(tag = "method")]
pub enum MockSpec {
    #[serde(rename = "GET")]
    Get(HttpMockSpec),
    #[serde(rename = "POST")]
    Post(HttpMockSpec),
    #[serde(rename = "PUT")]
    Put(HttpMockSpec),
    #[serde(rename = "DELETE")]
    Delete(HttpMockSpec),
    #[serde(rename = "PATCH")]
    Patch(HttpMockSpec),
    #[serde(rename = "GRAPHQL")]
    GraphQl(GraphQlMockSpec),
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HttpMockSpec {
    pub path: PathSpec,
    #[serde(default)]
    pub response: ResponseDescriptor,
}

/// A `:name` template, or `{"regex": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PathSpec {
    Template(String),
    Regex { regex: String },
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GraphQlMockSpec {
    pub path: String,
    #[serde(default)]
    pub operations: Vec<OperationSpec>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OperationSpec {
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub name: String,
    #[serde(default)]
    pub response: ResponseDescriptor,
}

impl ScenarioFile {
    /// Read and parse a scenario file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| MockServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// JSON Schema describing the file format.
    pub fn schema() -> RootSchema {
        schemars::schema_for!(ScenarioFile)
    }

    /// Build the validated scenario set and the file's server options.
    pub fn into_parts(self) -> Result<(ScenarioSet, ServerOptions)> {
        let scenarios = self
            .scenarios
            .into_iter()
            .map(|(id, entry)| entry.into_scenario(id))
            .collect::<Result<Vec<_>>>()?;

        let set = ScenarioSet::new(scenarios)?.with_groups(self.groups);
        Ok((set, self.options))
    }
}

impl ScenarioEntry {
    fn into_scenario(self, id: String) -> Result<Scenario> {
        let spec = match self {
            Self::Mocks(mocks) => ScenarioSpec {
                name: None,
                description: None,
                group: None,
                context: None,
                extend: None,
                mocks,
            },
            Self::Full(spec) => spec,
        };

        let mut scenario = Scenario::new(id);
        if let Some(name) = spec.name {
            scenario = scenario.name(name);
        }
        scenario.description = spec.description;
        scenario.group = spec.group;
        scenario.context = spec.context;
        scenario.extend = spec.extend;

        let mocks = spec
            .mocks
            .into_iter()
            .map(MockSpec::into_mock)
            .collect::<Result<Vec<_>>>()?;
        Ok(scenario.mocks(mocks))
    }
}

impl MockSpec {
    fn into_mock(self) -> Result<Mock> {
        let (method, spec) = match self {
            Self::GraphQl(spec) => {
                let mock = spec
                    .operations
                    .into_iter()
                    .fold(GraphQlMock::new(spec.path), |mock, operation| {
                        mock.operation(
                            Operation::new(operation.operation_type, operation.name)
                                .respond(operation.response),
                        )
                    });
                return Ok(mock.into());
            }
            Self::Get(spec) => (HttpMethod::Get, spec),
            Self::Post(spec) => (HttpMethod::Post, spec),
            Self::Put(spec) => (HttpMethod::Put, spec),
            Self::Delete(spec) => (HttpMethod::Delete, spec),
            Self::Patch(spec) => (HttpMethod::Patch, spec),
        };

        let pattern = match &spec.path {
            PathSpec::Template(template) => PathPattern::template(template)?,
            PathSpec::Regex { regex } => PathPattern::regex(regex)?,
        };
        Ok(HttpMock::with_pattern(method, pattern)
            .respond(spec.response)
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_defaults() {
        let options: ServerOptions = serde_json::from_value(json!({"cookieMode": true})).unwrap();

        assert!(options.cookie_mode);
        assert_eq!(options.port, 3000);
        assert_eq!(options.parallel_context_size, 10);
        assert_eq!(options.scenarios_path, "/scenarios");
    }

    #[test]
    fn test_file_preserves_declaration_order() {
        let file = ScenarioFile::from_json(
            r#"{"scenarios": {"zeta": [], "alpha": {"mocks": []}, "mid": []}}"#,
        )
        .unwrap();
        let (set, _) = file.into_parts().unwrap();

        let ids: Vec<&str> = set.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
        assert_eq!(set.initial().id, "zeta");
    }

    #[test]
    fn test_shorthand_and_full_scenarios() {
        let file = ScenarioFile::from_json(
            &json!({
                "groups": {"g": "Group"},
                "scenarios": {
                    "default": [{"path": "/x", "method": "GET", "response": {"data": {"v": 1}}}],
                    "test": {
                        "name": "Test",
                        "description": "Overrides /x",
                        "group": "g",
                        "extend": "default",
                        "context": {"a": 1},
                        "mocks": [
                            {"path": {"regex": "^/r/(\\d+)$"}, "method": "DELETE"},
                            {"path": "/graphql", "method": "GRAPHQL", "operations": [
                                {"type": "mutation", "name": "Save", "response": {"data": null}}
                            ]}
                        ]
                    }
                }
            })
            .to_string(),
        )
        .unwrap();
        let (set, _) = file.into_parts().unwrap();

        let default = set.get("default").unwrap();
        assert_eq!(default.name, "default");
        assert!(default.context.is_none());
        assert_eq!(default.mocks.len(), 1);

        let test = set.get("test").unwrap();
        assert_eq!(test.name, "Test");
        assert_eq!(test.extend.as_deref(), Some("default"));
        assert_eq!(test.group.as_deref(), Some("g"));
        assert!(matches!(&test.mocks[0], Mock::Http(http) if http.method == HttpMethod::Delete));
        assert!(matches!(&test.mocks[1], Mock::GraphQl(graphql) if graphql.operations.len() == 1));
        assert_eq!(set.groups()[0].name, "Group");
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let result = ScenarioFile::from_json(
            r#"{"scenarios": {"a": [{"path": "/x", "method": "TRACE"}]}}"#,
        );
        assert!(matches!(result, Err(MockServerError::ConfigParse(_))));
    }

    #[test]
    fn test_invalid_regex_path_is_reported() {
        let file = ScenarioFile::from_json(
            r#"{"scenarios": {"a": [{"path": {"regex": "("}, "method": "GET"}]}}"#,
        )
        .unwrap();
        assert!(matches!(file.into_parts(), Err(MockServerError::InvalidPath { .. })));
    }

    #[test]
    fn test_schema_names_root() {
        let schema = serde_json::to_value(ScenarioFile::schema()).unwrap();
        assert_eq!(schema["title"], "ScenarioFile");
        assert!(schema["properties"]["scenarios"].is_object());
    }
}

//! Scenarios and the mocks they bundle.
//!
//! A scenario is a named set of HTTP and GraphQL mocks plus a default
//! context. Scenarios may `extend` a parent, inheriting its context and
//! mocks; see [`chain`] for how the inheritance chain is resolved.
//!
//! # Example
//!
//! ```
//! use scenario_mock_server::{
//!     GraphQlMock, HttpMethod, HttpMock, Operation, ResponseDescriptor, Scenario, ScenarioSet,
//! };
//! use serde_json::json;
//!
//! # fn main() -> scenario_mock_server::Result<()> {
//! let scenarios = ScenarioSet::new(vec![
//!     Scenario::new("default")
//!         .with_context(json!({ "user": "Alice" }))
//!         .mock(HttpMock::new(HttpMethod::Get, "/api/user")?
//!             .respond(ResponseDescriptor::json(json!({ "name": "Alice" })))),
//!     Scenario::new("graphql")
//!         .extend("default")
//!         .mock(GraphQlMock::new("/graphql").operation(
//!             Operation::query("User").respond(ResponseDescriptor::json(json!({ "data": {} }))),
//!         )),
//! ])?;
//!
//! assert_eq!(scenarios.initial().id, "default");
//! # Ok(())
//! # }
//! ```

pub mod chain;

use std::collections::HashSet;
use std::fmt;
use std::future::Future;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{to_context, Context};
use crate::error::{MockServerError, Result};
use crate::request::{GraphQlRequestInput, HttpRequestInput};
use crate::response::{ProducerError, Response, ResponseDescriptor, ResponseInput};
use crate::router::PathPattern;

pub use chain::{flatten_mocks, merge_context, resolve_chain, scenario_context};

/// Scenarios keyed by id, in declaration order.
pub type ScenarioMap = IndexMap<String, Scenario>;

/// Methods an HTTP mock can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mock answering one path and method.
#[derive(Debug, Clone)]
pub struct HttpMock {
    pub path: PathPattern,
    pub method: HttpMethod,
    pub response: Response<HttpRequestInput>,
}

impl HttpMock {
    /// Mock `method` on a `:name` path template, answering `200` with no body.
    pub fn new(method: HttpMethod, path: &str) -> Result<Self> {
        Ok(Self::with_pattern(method, PathPattern::template(path)?))
    }

    pub fn with_pattern(method: HttpMethod, path: PathPattern) -> Self {
        Self {
            path,
            method,
            response: Response::default(),
        }
    }

    pub fn get(path: &str) -> Result<Self> {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: &str) -> Result<Self> {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: &str) -> Result<Self> {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: &str) -> Result<Self> {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn patch(path: &str) -> Result<Self> {
        Self::new(HttpMethod::Patch, path)
    }

    /// Answer with a fixed response.
    pub fn respond(mut self, descriptor: ResponseDescriptor) -> Self {
        self.response = Response::Static(descriptor);
        self
    }

    /// Answer with a response computed per request.
    pub fn respond_with<F, Fut>(mut self, producer: F) -> Self
    where
        F: Fn(ResponseInput<HttpRequestInput>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<ResponseDescriptor, ProducerError>> + Send + 'static,
    {
        self.response = Response::dynamic(producer);
        self
    }
}

/// GraphQL operation kinds a mock can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Query,
    Mutation,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Mutation => f.write_str("mutation"),
        }
    }
}

/// A single named GraphQL query or mutation responder.
#[derive(Debug, Clone)]
pub struct Operation {
    pub operation_type: OperationType,
    pub name: String,
    pub response: Response<GraphQlRequestInput>,
}

impl Operation {
    pub fn new(operation_type: OperationType, name: impl Into<String>) -> Self {
        Self {
            operation_type,
            name: name.into(),
            response: Response::default(),
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(OperationType::Query, name)
    }

    pub fn mutation(name: impl Into<String>) -> Self {
        Self::new(OperationType::Mutation, name)
    }

    pub fn respond(mut self, descriptor: ResponseDescriptor) -> Self {
        self.response = Response::Static(descriptor);
        self
    }

    pub fn respond_with<F, Fut>(mut self, producer: F) -> Self
    where
        F: Fn(ResponseInput<GraphQlRequestInput>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<ResponseDescriptor, ProducerError>> + Send + 'static,
    {
        self.response = Response::dynamic(producer);
        self
    }
}

/// The GraphQL operations served on one path.
#[derive(Debug, Clone)]
pub struct GraphQlMock {
    pub path: String,
    pub operations: Vec<Operation>,
}

impl GraphQlMock {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operations: Vec::new(),
        }
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }
}

/// A registered responder.
#[derive(Debug, Clone)]
pub enum Mock {
    Http(HttpMock),
    GraphQl(GraphQlMock),
}

impl From<HttpMock> for Mock {
    fn from(mock: HttpMock) -> Self {
        Self::Http(mock)
    }
}

impl From<GraphQlMock> for Mock {
    fn from(mock: GraphQlMock) -> Self {
        Self::GraphQl(mock)
    }
}

/// A named, possibly inherited bundle of mocks and default context.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub group: Option<String>,
    pub context: Option<Context>,
    pub mocks: Vec<Mock>,
    pub extend: Option<String>,
}

impl Scenario {
    /// An empty scenario whose name defaults to its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: None,
            group: None,
            context: None,
            mocks: Vec::new(),
            extend: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Default context; a non-object value sets an empty context.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(to_context(context));
        self
    }

    pub fn extend(mut self, parent: impl Into<String>) -> Self {
        self.extend = Some(parent.into());
        self
    }

    pub fn mock(mut self, mock: impl Into<Mock>) -> Self {
        self.mocks.push(mock.into());
        self
    }

    pub fn mocks(mut self, mocks: impl IntoIterator<Item = Mock>) -> Self {
        self.mocks.extend(mocks);
        self
    }

    fn summary(&self, selected: bool) -> ScenarioSummary {
        ScenarioSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            group: self.group.clone(),
            selected,
        }
    }
}

/// A scenario as reported by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub group: Option<String>,
    pub selected: bool,
}

/// A named group of scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
}

/// The validated, immutable scenario configuration of a server.
#[derive(Debug, Clone)]
pub struct ScenarioSet {
    scenarios: ScenarioMap,
    groups: IndexMap<String, String>,
}

impl ScenarioSet {
    /// Validate and index `scenarios`, keeping declaration order.
    ///
    /// # Errors
    ///
    /// Fails when there are no scenarios, an id is repeated, or any
    /// scenario's `extend` chain is cyclic.
    pub fn new(scenarios: impl IntoIterator<Item = Scenario>) -> Result<Self> {
        let mut map = ScenarioMap::new();
        for scenario in scenarios {
            if map.contains_key(&scenario.id) {
                return Err(MockServerError::DuplicateScenario(scenario.id));
            }
            map.insert(scenario.id.clone(), scenario);
        }

        if map.is_empty() {
            return Err(MockServerError::NoScenarios);
        }

        for scenario in map.values() {
            resolve_chain(scenario, &map)?;
        }

        Ok(Self {
            scenarios: map,
            groups: IndexMap::new(),
        })
    }

    /// Attach display names for scenario groups.
    pub fn with_groups<I, K, V>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.groups
            .extend(groups.into_iter().map(|(id, name)| (id.into(), name.into())));
        self
    }

    pub fn map(&self) -> &ScenarioMap {
        &self.scenarios
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenarios.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// The first declared scenario, active when the server starts.
    pub fn initial(&self) -> &Scenario {
        // Construction guarantees at least one scenario.
        &self.scenarios[0]
    }

    /// Listing entries with `selected_id` marked.
    pub fn summaries(&self, selected_id: &str) -> Vec<ScenarioSummary> {
        self.iter()
            .map(|scenario| scenario.summary(scenario.id == selected_id))
            .collect()
    }

    pub fn groups(&self) -> Vec<GroupSummary> {
        self.groups
            .iter()
            .map(|(id, name)| GroupSummary {
                id: id.clone(),
                name: name.clone(),
            })
            .collect()
    }

    /// Group ids referenced by scenarios but missing a display name.
    pub fn unnamed_groups(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.iter()
            .filter_map(|scenario| scenario.group.as_deref())
            .filter(|group| !self.groups.contains_key(*group) && seen.insert(*group))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_configuration_is_rejected() {
        let result = ScenarioSet::new(Vec::new());
        assert!(matches!(result, Err(MockServerError::NoScenarios)));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let result = ScenarioSet::new(vec![Scenario::new("a"), Scenario::new("a")]);
        assert!(matches!(result, Err(MockServerError::DuplicateScenario(id)) if id == "a"));
    }

    #[test]
    fn test_cyclic_extend_is_rejected() {
        let result = ScenarioSet::new(vec![
            Scenario::new("a").extend("b"),
            Scenario::new("b").extend("a"),
        ]);
        assert!(matches!(result, Err(MockServerError::ExtendCycle { .. })));
    }

    #[test]
    fn test_first_declared_scenario_is_initial() {
        let set = ScenarioSet::new(vec![Scenario::new("zeta"), Scenario::new("alpha")]).unwrap();
        assert_eq!(set.initial().id, "zeta");
    }

    #[test]
    fn test_summaries_default_name_and_mark_selection() {
        let set = ScenarioSet::new(vec![
            Scenario::new("default").description("Default mocks"),
            Scenario::new("other").name("Other scenario").group("g1"),
        ])
        .unwrap();

        let summaries = set.summaries("other");

        assert_eq!(summaries[0].name, "default");
        assert_eq!(summaries[0].description.as_deref(), Some("Default mocks"));
        assert!(!summaries[0].selected);
        assert_eq!(summaries[1].name, "Other scenario");
        assert_eq!(summaries[1].group.as_deref(), Some("g1"));
        assert!(summaries[1].selected);
    }

    #[test]
    fn test_unnamed_groups_are_reported_once() {
        let set = ScenarioSet::new(vec![
            Scenario::new("a").group("named"),
            Scenario::new("b").group("orphan"),
            Scenario::new("c").group("orphan"),
        ])
        .unwrap()
        .with_groups([("named", "Named group")]);

        assert_eq!(set.unnamed_groups(), vec!["orphan"]);
        assert_eq!(set.groups()[0].name, "Named group");
    }
}

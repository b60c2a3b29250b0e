//! Scenario-driven mock API server.
//!
//! A library and binary for serving mock HTTP and GraphQL APIs. Mocks are
//! grouped into named scenarios, one of which is active at a time; switching
//! scenarios switches every mocked response at once.
//!
//! # Quick Start
//!
//! ```no_run
//! use scenario_mock_server::{
//!     GraphQlMock, HttpMock, MockServer, Operation, ResponseDescriptor, Scenario, ScenarioSet,
//!     ServerOptions,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> scenario_mock_server::Result<()> {
//!     let scenarios = ScenarioSet::new(vec![
//!         Scenario::new("default")
//!             .with_context(json!({ "visits": 0 }))
//!             .mock(HttpMock::get("/api/user/:id")?.respond_with(|input| async move {
//!                 let visits = input.context.get("visits").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
//!                 input.update_context(json!({ "visits": visits })).await;
//!                 Ok(ResponseDescriptor::json(json!({
//!                     "id": input.request.params["id"],
//!                     "visits": visits,
//!                 })))
//!             }))
//!             .mock(GraphQlMock::new("/graphql").operation(
//!                 Operation::query("Viewer")
//!                     .respond(ResponseDescriptor::json(json!({ "data": { "viewer": null } }))),
//!             )),
//!         Scenario::new("server-error")
//!             .extend("default")
//!             .mock(HttpMock::get("/api/user/:id")?.respond(ResponseDescriptor::empty().with_status(500))),
//!     ])?;
//!
//!     MockServer::run(scenarios, ServerOptions::default()).await
//! }
//! ```
//!
//! # Architecture
//!
//! - [`ScenarioSet`] holds the validated scenarios. Scenarios may `extend`
//!   a parent and inherit its context and mocks.
//! - Each request opens a context session under one of three policies:
//!   the process-wide slot, a cookie (`cookieMode`), or an LRU cache entry
//!   selected with the [`SCENARIO_HEADER`] and [`CONTEXT_HEADER`] headers.
//! - The active scenario's mocks are flattened into registries; GraphQL
//!   paths resolve an operation by kind and name, other paths match HTTP
//!   mocks by method and path pattern.
//! - A [`Response`] is either a fixed [`ResponseDescriptor`] or a
//!   [`Producer`] that reads and updates the session context.
//!
//! # Management routes
//!
//! - `GET /scenarios` lists scenarios with the caller's active one selected.
//! - `PUT /select-scenario` with `{"scenarioId": "..."}` selects a scenario.
//! - `GET /groups` lists scenario groups.
//!
//! The paths are configurable through [`ServerOptions`].

pub mod cli;
pub mod config;
pub mod output;

mod cache;
mod context;
mod error;
mod graphql;
mod mock_server;
mod registry;
mod request;
mod response;
mod router;
mod scenario;

// Re-export core types
pub use cache::LruCache;
pub use config::{ScenarioFile, ServerOptions};
pub use error::{MockServerError, Result};
pub use mock_server::{build_router, MockServer, ServerState};

// Re-export context types
pub use context::{
    to_context, Context, ContextPatch, ContextUpdater, CookiePayload, CONTEXT_COOKIE_NAME,
    CONTEXT_HEADER, SCENARIO_HEADER,
};

// Re-export request/response types
pub use graphql::{resolve_operation, ResolvedOperation};
pub use request::{
    parse_query, GraphQlRequestInput, HttpRequestInput, MockRequest, Query, QueryValue,
    RequestBody,
};
pub use response::{
    MockResult, Producer, ProducerError, Response, ResponseDescriptor, ResponseInput,
};
pub use router::{DispatchError, PathParams, PathPattern, Reply};

// Re-export scenario types
pub use registry::{GraphQlOperations, GraphQlRegistry, HttpRegistry};
pub use scenario::{
    flatten_mocks, merge_context, resolve_chain, scenario_context, GraphQlMock, GroupSummary,
    HttpMethod, HttpMock, Mock, Operation, OperationType, Scenario, ScenarioMap, ScenarioSet,
    ScenarioSummary,
};

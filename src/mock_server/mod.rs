//! HTTP binding of the dispatcher.
//!
//! Serves the scenario management routes and forwards every other request
//! to the active scenario's mocks.
//!
//! # Example
//!
//! ```no_run
//! use scenario_mock_server::{HttpMock, MockServer, ResponseDescriptor, Scenario, ScenarioSet, ServerOptions};
//! use serde_json::json;
//!
//! # async fn run() -> scenario_mock_server::Result<()> {
//! let scenarios = ScenarioSet::new(vec![Scenario::new("default").mock(
//!     HttpMock::get("/api/user")?.respond(ResponseDescriptor::json(json!({ "name": "Alice" }))),
//! )])?;
//!
//! let server = MockServer::start(scenarios, ServerOptions::default()).await?;
//! println!("mocking at {}", server.url());
//! server.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod handlers;
mod server;
mod state;
mod transport;

pub use server::{build_router, MockServer};
pub use state::ServerState;

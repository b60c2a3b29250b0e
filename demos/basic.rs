//! Basic example: dynamic producers, context updates and scenario switching.
//!
//! Run with:
//! ```
//! cargo run --example basic
//! ```
//! then try:
//! ```text
//! curl localhost:3000/api/todos
//! curl -X POST localhost:3000/api/todos -H 'content-type: application/json' -d '{"title":"Write docs"}'
//! curl -X PUT localhost:3000/select-scenario -H 'content-type: application/json' -d '{"scenarioId":"empty"}'
//! ```

use std::time::Duration;

use scenario_mock_server::{
    GraphQlMock, HttpMock, MockServer, Operation, ResponseDescriptor, Scenario, ScenarioSet,
    ServerOptions,
};
use serde_json::{json, Value};

#[tokio::main]
async fn main() -> scenario_mock_server::Result<()> {
    tracing_subscriber::fmt::init();

    let scenarios = ScenarioSet::new(vec![
        Scenario::new("default")
            .name("Two todos")
            .group("todos")
            .with_context(json!({ "todos": [{ "title": "Buy milk" }, { "title": "Walk dog" }] }))
            .mock(HttpMock::get("/api/todos")?.respond_with(|input| async move {
                Ok(ResponseDescriptor::json(
                    input.context.get("todos").cloned().unwrap_or(Value::Null),
                ))
            }))
            .mock(HttpMock::post("/api/todos")?.respond_with(|input| async move {
                let todo = Value::Object(input.request.body.clone());
                input
                    .update_context(scenario_mock_server::ContextPatch::transform(move |ctx| {
                        let mut todos = ctx
                            .get("todos")
                            .and_then(Value::as_array)
                            .cloned()
                            .unwrap_or_default();
                        todos.push(todo);
                        scenario_mock_server::to_context(json!({ "todos": todos }))
                    }))
                    .await;
                Ok(ResponseDescriptor::empty().with_status(201))
            }))
            .mock(GraphQlMock::new("/graphql").operation(
                Operation::query("Todos").respond_with(|input| async move {
                    Ok(ResponseDescriptor::json(json!({ "data": { "todos": input.context.get("todos") } })))
                }),
            )),
        Scenario::new("empty")
            .name("No todos")
            .group("todos")
            .extend("default")
            .with_context(json!({ "todos": [] })),
        Scenario::new("slow")
            .name("Slow API")
            .description("Every todo request takes two seconds")
            .extend("default")
            .mock(HttpMock::get("/api/todos")?.respond(
                ResponseDescriptor::json(json!([])).with_delay(Duration::from_secs(2)),
            )),
    ])?
    .with_groups([("todos", "Todo list states")]);

    MockServer::run(scenarios, ServerOptions::default()).await
}

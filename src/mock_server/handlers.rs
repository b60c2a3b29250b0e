//! HTTP request handlers for the mock server.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use super::state::ServerState;
use super::transport;
use crate::context::CONTEXT_COOKIE_NAME;
use crate::response::MockResult;
use crate::router::Reply;

const UNKNOWN_ERROR: &str = "Unknown error - check logs";

/// GET {scenarios_path}
pub async fn list_scenarios(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Response {
    let cookies = transport::cookies(&headers);
    state
        .list_scenarios(cookies.get(CONTEXT_COOKIE_NAME).map(String::as_str))
        .await
        .into_response()
}

/// PUT {select_scenario_path}
///
/// Accepts `{"scenarioId": "..."}` as JSON or as a form.
pub async fn select_scenario(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok());
    let body = transport::decode_body(content_type, &body);

    let scenario_id = body
        .fields()
        .and_then(|fields| fields.get("scenarioId"))
        .and_then(|value| value.as_str());

    match scenario_id {
        Some(scenario_id) => state.select_scenario(scenario_id).await.into_response(),
        None => Reply::from(MockResult::message(400, "scenarioId must be a string")).into_response(),
    }
}

/// GET {groups_path}
pub async fn list_groups(State(state): State<Arc<ServerState>>) -> Response {
    state.groups().into_response()
}

/// Every other request: answered by the active scenario's mocks.
///
/// Dispatch runs in its own task; a panicking producer becomes a `500`.
pub async fn dispatch(State(state): State<Arc<ServerState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(error) => {
            tracing::warn!(%error, "failed to read request body");
            Bytes::new()
        }
    };
    let request = transport::mock_request(&parts, &body);

    let task = tokio::spawn(async move { state.dispatch(request).await });

    match task.await {
        Ok(Ok(reply)) => reply.into_response(),
        Ok(Err(error)) => {
            tracing::warn!(%error, "response producer failed");
            Reply::from(MockResult::message(500, error.to_string())).into_response()
        }
        Err(error) => {
            tracing::error!(%error, "response producer panicked");
            Reply::from(MockResult::message(500, UNKNOWN_ERROR)).into_response()
        }
    }
}

//! Request dispatch.
//!
//! Every request outside the management routes ends up in [`dispatch`]: it
//! opens the request's context session, materialises the active scenario's
//! registries, routes to a GraphQL operation or an HTTP mock, and evaluates
//! the chosen response.

mod http;
mod path;

pub use path::{PathParams, PathPattern};

use thiserror::Error;

use crate::context::{ContextUpdater, Session, CONTEXT_COOKIE_NAME};
use crate::error::MockServerError;
use crate::graphql::resolve_operation;
use crate::registry::{GraphQlRegistry, HttpRegistry};
use crate::request::{GraphQlRequestInput, MockRequest};
use crate::response::{evaluate, MockResult, ProducerError};
use crate::scenario::{flatten_mocks, resolve_chain};
use crate::mock_server::ServerState;

/// Why a request could not be answered by a mock.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No mock matches; answered with an empty `404`.
    #[error("Not found")]
    NotFound,

    #[error("query \"{0}\" is not a valid GraphQL query")]
    InvalidQuery(String),

    /// Several operations in the document and no `operationName`.
    #[error("operationName required")]
    OperationNameRequired,

    /// The operation to run could not be named.
    #[error("Operation name required")]
    MissingOperationName,

    #[error("Operation \"{0}\" could not be found")]
    OperationNotFound(String),

    #[error("Subscriptions are not supported")]
    SubscriptionUnsupported,

    #[error("Mutations cannot be resolved over GET")]
    MutationOverGet,

    #[error("Cannot use \"sms-scenario-id\" header when cookie mode is enabled")]
    ScenarioHeaderInCookieMode,

    #[error("Scenario id \"{0}\" does not exist")]
    UnknownScenario(String),

    /// The response producer failed.
    #[error("{0}")]
    Producer(ProducerError),

    #[error(transparent)]
    Internal(#[from] MockServerError),
}

impl DispatchError {
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Producer(_) | Self::Internal(_) => 500,
            _ => 400,
        }
    }

    /// The response sent for this error.
    pub fn into_result(self) -> MockResult {
        match self {
            Self::NotFound => MockResult::not_found(),
            error => MockResult::message(error.status(), error.to_string()),
        }
    }
}

/// A dispatch result plus the cookies to set on the response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub result: MockResult,
    pub cookies: Vec<(String, String)>,
}

impl Reply {
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }
}

impl From<MockResult> for Reply {
    fn from(result: MockResult) -> Self {
        Self {
            result,
            cookies: Vec::new(),
        }
    }
}

/// Answer `request` from the mocks of its session's scenario.
///
/// Client errors resolve to `400`/`404` replies. A failing producer is
/// returned as `Err` so the caller decides how to report it; the session
/// cookie is not written in that case.
#[tracing::instrument(skip_all, fields(method = %request.method, path = %request.path))]
pub(crate) async fn dispatch(
    state: &ServerState,
    request: MockRequest,
) -> Result<Reply, ProducerError> {
    let session = match Session::open(state, &request).await {
        Ok(session) => session,
        Err(error) => return Ok(error.into_result().into()),
    };

    let result = match route(state, &session, request).await {
        Ok(result) => result,
        Err(DispatchError::Producer(error)) => return Err(error),
        Err(error) => {
            tracing::debug!(status = error.status(), %error, "request not served by a mock");
            error.into_result()
        }
    };

    let mut reply = Reply::from(result);
    if let Some(cookie) = session.cookie_value().await {
        reply = reply.with_cookie(CONTEXT_COOKIE_NAME, cookie);
    }
    Ok(reply)
}

async fn route(
    state: &ServerState,
    session: &Session,
    request: MockRequest,
) -> Result<MockResult, DispatchError> {
    let scenarios = state.scenarios();
    let scenario = scenarios
        .get(&session.scenario_id)
        .ok_or_else(|| DispatchError::UnknownScenario(session.scenario_id.clone()))?;
    let chain = resolve_chain(scenario, scenarios.map())?;
    let mocks = flatten_mocks(&chain, scenarios.map());

    let updater = ContextUpdater::new(session.slot.clone());

    let graphql = GraphQlRegistry::build(mocks.iter().copied());
    if graphql.operations(&request.path).is_some() {
        let resolved = resolve_operation(&request)?;
        let operation = graphql
            .operation(&request.path, resolved.operation_type, &resolved.name)
            .ok_or(DispatchError::NotFound)?;

        tracing::debug!(
            scenario = %session.scenario_id,
            operation = %resolved.name,
            kind = %resolved.operation_type,
            "matched GraphQL operation"
        );

        let input = GraphQlRequestInput {
            variables: resolved.variables,
            headers: request.headers,
        };
        return evaluate(&operation.response, input, updater)
            .await
            .map_err(DispatchError::Producer);
    }

    let registry = HttpRegistry::build(mocks);
    let (mock, params) = http::find_mock(&registry, &request).ok_or(DispatchError::NotFound)?;

    tracing::debug!(
        scenario = %session.scenario_id,
        mock = %mock.path,
        "matched HTTP mock"
    );

    evaluate(&mock.response, http::request_input(request, params), updater)
        .await
        .map_err(DispatchError::Producer)
}

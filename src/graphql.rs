//! GraphQL operation resolution.
//!
//! The server never executes GraphQL. It parses the document only far enough
//! to find the requested operation's kind and name, which then select a mock
//! operation from the registry.

use graphql_parser::query::{parse_query, Definition, OperationDefinition};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::request::{MockRequest, QueryValue, RequestBody};
use crate::router::DispatchError;
use crate::scenario::OperationType;

const GRAPHQL_CONTENT_TYPE: &str = "application/graphql";

/// The JSON body of a GraphQL-over-HTTP request.
///
/// Bodies that do not fit this shape are treated as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphQlBody {
    query: Option<String>,
    operation_name: Option<String>,
    variables: Option<Map<String, Value>>,
}

impl GraphQlBody {
    fn from_request(body: &RequestBody) -> Self {
        body.fields()
            .and_then(|fields| serde_json::from_value(Value::Object(fields.clone())).ok())
            .unwrap_or_default()
    }
}

/// Operation kinds found in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

/// The operation a GraphQL request asks for.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOperation {
    pub operation_type: OperationType,
    pub name: String,
    pub variables: Map<String, Value>,
}

/// Identify the operation requested by a GraphQL request.
///
/// # Errors
///
/// Returns the `400`/`404` [`DispatchError`] describing why the request
/// cannot name a single supported operation.
pub fn resolve_operation(request: &MockRequest) -> Result<ResolvedOperation, DispatchError> {
    let method = request.method.as_str();
    if method != "GET" && method != "POST" {
        return Err(DispatchError::NotFound);
    }

    let body = GraphQlBody::from_request(&request.body);
    let query = query_text(request, &body);

    let invalid = || DispatchError::InvalidQuery(query.clone());
    if query.trim().is_empty() {
        return Err(invalid());
    }
    let document = parse_query::<&str>(&query).map_err(|_| invalid())?;

    let operations: Vec<(OperationKind, Option<&str>)> = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Operation(operation) => Some(describe(operation)),
            Definition::Fragment(_) => None,
        })
        .collect();

    let body_name = body.operation_name.as_deref().filter(|name| !name.is_empty());
    let query_name = request
        .query
        .get("operationName")
        .filter(|value| value.as_single() != Some(""));

    if operations.len() > 1 && body_name.is_none() && query_name.is_none() {
        return Err(DispatchError::OperationNameRequired);
    }

    let name = match (body_name, query_name) {
        (Some(name), _) => Some(name),
        (None, Some(value)) => value.as_single(),
        (None, None) => operations.first().and_then(|(_, name)| *name),
    }
    .ok_or(DispatchError::MissingOperationName)?;

    let kind = operations
        .iter()
        .find(|(_, candidate)| *candidate == Some(name))
        .map(|(kind, _)| *kind)
        .ok_or_else(|| DispatchError::OperationNotFound(name.to_string()))?;

    let operation_type = match kind {
        OperationKind::Subscription => return Err(DispatchError::SubscriptionUnsupported),
        OperationKind::Mutation if method == "GET" => return Err(DispatchError::MutationOverGet),
        OperationKind::Mutation => OperationType::Mutation,
        OperationKind::Query => OperationType::Query,
    };

    Ok(ResolvedOperation {
        operation_type,
        name: name.to_string(),
        variables: variables(request, body.variables),
    })
}

fn query_text(request: &MockRequest, body: &GraphQlBody) -> String {
    if request.content_type().as_deref() == Some(GRAPHQL_CONTENT_TYPE) {
        return match &request.body {
            RequestBody::Text(text) => text.clone(),
            RequestBody::Fields(_) => String::new(),
        };
    }

    body.query
        .as_deref()
        .filter(|query| !query.is_empty())
        .or_else(|| request.query.get("query").and_then(QueryValue::as_single))
        .unwrap_or_default()
        .to_string()
}

fn describe<'a>(operation: &OperationDefinition<'a, &'a str>) -> (OperationKind, Option<&'a str>) {
    match operation {
        OperationDefinition::SelectionSet(_) => (OperationKind::Query, None),
        OperationDefinition::Query(query) => (OperationKind::Query, query.name),
        OperationDefinition::Mutation(mutation) => (OperationKind::Mutation, mutation.name),
        OperationDefinition::Subscription(subscription) => {
            (OperationKind::Subscription, subscription.name)
        }
    }
}

/// Body variables, else JSON-decoded query-string variables, else empty.
fn variables(request: &MockRequest, body_variables: Option<Map<String, Value>>) -> Map<String, Value> {
    body_variables
        .or_else(|| {
            request
                .query
                .get("variables")
                .and_then(QueryValue::as_single)
                .and_then(|raw| serde_json::from_str(raw).ok())
        })
        .unwrap_or_default()
}

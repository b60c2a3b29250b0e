//! Mock responses and their evaluation.
//!
//! A mock answers either with a fixed [`ResponseDescriptor`] or with a
//! [`Producer`] that computes one from the request and the session context.
//! Evaluation applies the requested delay and normalises the result into a
//! [`MockResult`].

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::context::{Context, ContextPatch, ContextUpdater};

const DEFAULT_STATUS: u16 = 200;
const JSON_CONTENT_TYPE: &str = "application/json";

/// Error returned by a failing response producer. Surfaces as a `500`.
pub type ProducerError = Box<dyn std::error::Error + Send + Sync>;

/// What a mock responds with: status, headers, body data and delay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResponseDescriptor {
    /// HTTP status, `200` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Response body. An explicit `null` is kept and sent as JSON `null`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Milliseconds to wait before responding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ResponseDescriptor {
    /// A `200` with no body.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A `200` carrying `data`, sent as JSON unless a content type is set.
    pub fn json(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// A `200` with a plain-text body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::json(Value::String(body.into())).with_header("content-type", "text/plain")
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    /// Wait out the delay and normalise into a result.
    ///
    /// Header names are lower-cased, a body without an explicit content type
    /// is labelled `application/json`, and the status defaults to `200`.
    pub async fn resolve(self) -> MockResult {
        let mut headers: BTreeMap<String, String> = self
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        if let Some(delay) = self.delay.filter(|ms| *ms > 0) {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.data.is_some() && !headers.contains_key("content-type") {
            headers.insert("content-type".to_string(), JSON_CONTENT_TYPE.to_string());
        }

        MockResult {
            status: self.status.unwrap_or(DEFAULT_STATUS),
            headers,
            data: self.data,
        }
    }
}

/// The normalised outcome handed back to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockResult {
    pub status: u16,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MockResult {
    /// `404` with no body.
    pub fn not_found() -> Self {
        Self {
            status: 404,
            headers: BTreeMap::new(),
            data: None,
        }
    }

    /// `204` with no body.
    pub fn no_content() -> Self {
        Self {
            status: 204,
            headers: BTreeMap::new(),
            data: None,
        }
    }

    /// A JSON body with `status`.
    pub fn json(status: u16, data: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::from([(
                "content-type".to_string(),
                JSON_CONTENT_TYPE.to_string(),
            )]),
            data: Some(data),
        }
    }

    /// A JSON `{message}` body with `status`.
    pub fn message(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "message": message.into() }))
    }

    /// Whether the body should be written as serialised JSON.
    pub fn is_json(&self) -> bool {
        self.headers
            .get("content-type")
            .map(|value| value.trim_start().to_ascii_lowercase().starts_with(JSON_CONTENT_TYPE))
            .unwrap_or(false)
    }
}

/// The input bundle a producer is invoked with.
pub struct ResponseInput<R> {
    /// Request-specific fields.
    pub request: R,
    /// Snapshot of the session context when the producer was invoked.
    pub context: Context,
    updater: ContextUpdater,
}

impl<R> ResponseInput<R> {
    pub(crate) fn new(request: R, context: Context, updater: ContextUpdater) -> Self {
        Self {
            request,
            context,
            updater,
        }
    }

    /// Merge `patch` into the session context and return the new context.
    pub async fn update_context(&self, patch: impl Into<ContextPatch>) -> Context {
        self.updater.update(patch).await
    }

    /// An owned updater, e.g. for a task that keeps updating after the response.
    pub fn updater(&self) -> ContextUpdater {
        self.updater.clone()
    }
}

impl<R: fmt::Debug> fmt::Debug for ResponseInput<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseInput")
            .field("request", &self.request)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Computes a response from the request and session context.
///
/// Implemented for any `Fn(ResponseInput<R>) -> impl Future` closure, so most
/// mocks are written as `|input| async move { ... }`.
#[async_trait]
pub trait Producer<R>: Send + Sync {
    async fn produce(&self, input: ResponseInput<R>) -> Result<ResponseDescriptor, ProducerError>;
}

#[async_trait]
impl<R, F, Fut> Producer<R> for F
where
    R: Send + 'static,
    F: Fn(ResponseInput<R>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ResponseDescriptor, ProducerError>> + Send + 'static,
{
    async fn produce(&self, input: ResponseInput<R>) -> Result<ResponseDescriptor, ProducerError> {
        (self)(input).await
    }
}

/// A mock's response: fixed, or produced per request.
pub enum Response<R> {
    Static(ResponseDescriptor),
    Dynamic(Arc<dyn Producer<R>>),
}

impl<R> Response<R> {
    pub fn dynamic<F, Fut>(f: F) -> Self
    where
        R: Send + 'static,
        F: Fn(ResponseInput<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ResponseDescriptor, ProducerError>> + Send + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }
}

impl<R> Default for Response<R> {
    fn default() -> Self {
        Self::Static(ResponseDescriptor::default())
    }
}

impl<R> Clone for Response<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(descriptor) => Self::Static(descriptor.clone()),
            Self::Dynamic(producer) => Self::Dynamic(producer.clone()),
        }
    }
}

impl<R> fmt::Debug for Response<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(descriptor) => f.debug_tuple("Static").field(descriptor).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl<R> From<ResponseDescriptor> for Response<R> {
    fn from(descriptor: ResponseDescriptor) -> Self {
        Self::Static(descriptor)
    }
}

/// Produce (if dynamic) and resolve a mock's response.
pub(crate) async fn evaluate<R>(
    response: &Response<R>,
    request: R,
    updater: ContextUpdater,
) -> Result<MockResult, ProducerError>
where
    R: Send + 'static,
{
    let descriptor = match response {
        Response::Static(descriptor) => descriptor.clone(),
        Response::Dynamic(producer) => {
            let context = updater.current().await;
            producer
                .produce(ResponseInput::new(request, context, updater))
                .await?
        }
    };

    Ok(descriptor.resolve().await)
}

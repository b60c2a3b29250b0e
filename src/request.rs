//! Request shapes seen by the dispatcher and by response producers.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// A query-string value: repeated keys collect into a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    /// The value when the key appeared exactly once.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multi(_) => None,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => *self = Self::Multi(vec![std::mem::take(first), value]),
            Self::Multi(values) => values.push(value),
        }
    }
}

/// Parsed query string.
pub type Query = HashMap<String, QueryValue>;

/// Parse a raw query string (without the leading `?`).
pub fn parse_query(raw: &str) -> Query {
    let mut query = Query::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match query.get_mut(key.as_ref()) {
            Some(existing) => existing.push(value.into_owned()),
            None => {
                query.insert(key.into_owned(), QueryValue::Single(value.into_owned()));
            }
        }
    }
    query
}

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Raw text, e.g. an `application/graphql` document.
    Text(String),
    /// Fields of a JSON object or form submission.
    Fields(Map<String, Value>),
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::Fields(Map::new())
    }
}

impl RequestBody {
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Fields(fields) => Some(fields),
            Self::Text(_) => None,
        }
    }
}

/// A request as delivered to the dispatcher by the transport layer.
///
/// Header names are lower-case.
#[derive(Debug, Clone, Default)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub query: Query,
    pub body: RequestBody,
    pub cookies: HashMap<String, String>,
}

impl MockRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_query(mut self, raw: &str) -> Self {
        self.query = parse_query(raw);
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = match body {
            Value::Object(fields) => RequestBody::Fields(fields),
            _ => RequestBody::default(),
        };
        self.headers
            .insert("content-type".to_string(), "application/json".to_string());
        self
    }

    pub fn with_text(mut self, content_type: &str, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self.headers
            .insert("content-type".to_string(), content_type.to_string());
        self
    }

    pub fn with_cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies.insert(name.to_string(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Content type without parameters, lower-cased.
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type").map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }
}

/// What an HTTP mock's producer receives about the request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HttpRequestInput {
    pub query: Query,
    /// Body fields; text bodies arrive as an empty object.
    pub body: Map<String, Value>,
    /// Named path parameters captured by the mock's path pattern.
    pub params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
}

/// What a GraphQL operation's producer receives about the request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphQlRequestInput {
    pub variables: Map<String, Value>,
    pub headers: HashMap<String, String>,
}

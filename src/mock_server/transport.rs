//! Conversion between axum requests/responses and dispatcher shapes.

use std::collections::HashMap;

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use cookie::Cookie;
use serde_json::{Map, Value};

use crate::request::{parse_query, MockRequest, RequestBody};
use crate::router::Reply;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Build the dispatcher's view of a request.
pub fn mock_request(parts: &Parts, body: &Bytes) -> MockRequest {
    let headers = header_map(&parts.headers);
    let content_type = headers.get(CONTENT_TYPE.as_str()).map(String::as_str);

    MockRequest {
        method: parts.method.as_str().to_ascii_uppercase(),
        path: parts.uri.path().to_string(),
        query: parse_query(parts.uri.query().unwrap_or_default()),
        body: decode_body(content_type, body),
        cookies: cookies(&parts.headers),
        headers,
    }
}

/// Lower-cased header names to values; non-UTF-8 values are dropped and
/// repeated headers keep the last value.
pub fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

/// Cookies from every `Cookie` header, percent-decoded.
pub fn cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse_encoded)
        .filter_map(|cookie| cookie.ok())
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect()
}

/// Decode a body by content type: JSON objects and forms become fields,
/// anything else is kept as text.
pub fn decode_body(content_type: Option<&str>, body: &Bytes) -> RequestBody {
    let mime = content_type
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase());

    match mime.as_deref() {
        _ if body.is_empty() => RequestBody::default(),
        Some(mime) if mime == "application/json" || mime.ends_with("+json") => {
            match serde_json::from_slice(body) {
                Ok(Value::Object(fields)) => RequestBody::Fields(fields),
                _ => RequestBody::default(),
            }
        }
        Some(FORM_CONTENT_TYPE) => RequestBody::Fields(
            url::form_urlencoded::parse(body)
                .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
                .collect::<Map<_, _>>(),
        ),
        _ => RequestBody::Text(String::from_utf8_lossy(body).into_owned()),
    }
}

/// `Set-Cookie` value for a session cookie.
pub fn set_cookie_value(name: &str, value: &str) -> String {
    Cookie::build((name, value)).path("/").build().encoded().to_string()
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let result = self.result;
        let status = StatusCode::from_u16(result.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match &result.data {
            None => Body::empty(),
            Some(Value::String(text)) if !result.is_json() => Body::from(text.clone()),
            Some(data) => Body::from(serde_json::to_vec(data).unwrap_or_default()),
        };

        let mut response = (status, body).into_response();
        let headers = response.headers_mut();
        for (name, value) in &result.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "skipping invalid response header"),
            }
        }
        for (name, value) in &self.cookies {
            match HeaderValue::from_str(&set_cookie_value(name, value)) {
                Ok(value) => {
                    headers.append(SET_COOKIE, value);
                }
                Err(_) => tracing::warn!(cookie = %name, "skipping invalid response cookie"),
            }
        }

        response
    }
}

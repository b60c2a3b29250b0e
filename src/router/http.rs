//! HTTP mock matching.

use crate::registry::HttpRegistry;
use crate::request::{HttpRequestInput, MockRequest, RequestBody};
use crate::scenario::HttpMock;

use super::PathParams;

/// First mock in registry order whose method and path match `request`.
pub fn find_mock<'a>(
    registry: &HttpRegistry<'a>,
    request: &MockRequest,
) -> Option<(&'a HttpMock, PathParams)> {
    registry
        .iter()
        .filter(|mock| mock.method.as_str() == request.method)
        .find_map(|mock| mock.path.matches(&request.path).map(|params| (mock, params)))
}

/// Producer input for a matched HTTP mock.
pub fn request_input(request: MockRequest, params: PathParams) -> HttpRequestInput {
    let body = match request.body {
        RequestBody::Fields(fields) => fields,
        RequestBody::Text(_) => Default::default(),
    };

    HttpRequestInput {
        query: request.query,
        body,
        params,
        headers: request.headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Mock;
    use crate::PathPattern;
    use serde_json::json;

    fn mocks() -> Vec<Mock> {
        vec![
            HttpMock::post("/users/:id").unwrap().into(),
            HttpMock::get("/users/:id").unwrap().into(),
            HttpMock::get("/users/me").unwrap().into(),
            HttpMock::with_pattern(
                crate::HttpMethod::Get,
                PathPattern::regex(r"^/files/(.+)$").unwrap(),
            )
            .into(),
        ]
    }

    #[test]
    fn test_first_match_in_registry_order() {
        let mocks = mocks();
        let registry = HttpRegistry::build(&mocks);

        let (mock, params) = find_mock(&registry, &MockRequest::new("GET", "/users/me")).unwrap();
        assert_eq!(mock.path.key(), "/users/:id");
        assert_eq!(params.get("id").map(String::as_str), Some("me"));
    }

    #[test]
    fn test_method_must_match() {
        let mocks = mocks();
        let registry = HttpRegistry::build(&mocks);

        assert!(find_mock(&registry, &MockRequest::new("DELETE", "/users/1")).is_none());
        let (mock, _) = find_mock(&registry, &MockRequest::new("post", "/users/1")).unwrap();
        assert_eq!(mock.method, crate::HttpMethod::Post);
    }

    #[test]
    fn test_regex_mock_matches() {
        let mocks = mocks();
        let registry = HttpRegistry::build(&mocks);

        let (_, params) = find_mock(&registry, &MockRequest::new("GET", "/files/a/b.txt")).unwrap();
        assert_eq!(params.get("0").map(String::as_str), Some("a/b.txt"));
    }

    #[test]
    fn test_text_body_becomes_empty_object() {
        let request = MockRequest::new("POST", "/x").with_text("text/plain", "hello");
        let input = request_input(request, PathParams::new());
        assert!(input.body.is_empty());

        let request = MockRequest::new("POST", "/x").with_json(json!({"a": 1}));
        let input = request_input(request, PathParams::new());
        assert_eq!(input.body.get("a"), Some(&json!(1)));
    }
}

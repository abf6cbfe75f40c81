//! Incoming HTTP request type.

use std::collections::HashMap;

use http::{HeaderMap, Method, Uri};

/// An incoming HTTP request together with its matched path parameters.
///
/// Immutable once constructed. Handlers read from it; nothing writes back.
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(parts: http::request::Parts, params: HashMap<String, String>) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full request target as received, including the query string.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Case-insensitive header lookup. `None` for absent headers and for
    /// values that are not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/square/{number}`, `req.param("number")` on `/square/42`
    /// returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn fake(uri: &str, params: &[(&str, &str)]) -> Self {
        let (parts, ()) = http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header("user-agent", "squared-tests")
            .body(())
            .expect("valid test request")
            .into_parts();
        let params = params
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Self::new(parts, params)
    }
}

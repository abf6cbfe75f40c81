//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and return it. That is the entire
//! job description.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use http::StatusCode;
/// use squared::Response;
///
/// Response::text("49");
/// Response::status(StatusCode::INTERNAL_SERVER_ERROR);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use http::StatusCode;
/// use squared::Response;
///
/// Response::builder()
///     .status(StatusCode::OK)
///     .body("text/plain; version=0.0.4", "metric 1\n");
/// ```
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: Vec<(HeaderName, HeaderValue)>,
    pub(crate) body: Bytes,
}

impl Response {
    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            body: Bytes::from(body.into()),
        }
    }

    /// Response with no body.
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder {
            status: StatusCode::OK,
            headers: Vec::new(),
        }
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        builder
            .body(Full::new(self.body))
            .expect("response built from validated parts")
    }
}

/// Fluent builder for [`Response`]. Defaults to `200 OK`. Terminated by a
/// body method.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Append a header.
    ///
    /// # Panics
    ///
    /// Panics on an invalid header name or value. Headers are authored at
    /// startup, never derived from request data.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::try_from(name)
            .unwrap_or_else(|e| panic!("invalid header name `{name}`: {e}"));
        let value = HeaderValue::try_from(value)
            .unwrap_or_else(|e| panic!("invalid header value for `{name}`: {e}"));
        self.headers.push((name, value));
        self
    }

    /// Terminate with a typed body.
    pub fn body(mut self, content_type: &str, body: impl Into<Bytes>) -> Response {
        let content_type = HeaderValue::try_from(content_type)
            .unwrap_or_else(|e| panic!("invalid content type `{content_type}`: {e}"));
        self.headers.insert(0, (CONTENT_TYPE, content_type));
        Response {
            status: self.status,
            headers: self.headers,
            body: body.into(),
        }
    }

}

/// Conversion into an HTTP [`Response`].
///
/// Implemented for [`Response`] itself, bare strings, and [`StatusCode`], so
/// handlers can return whichever reads best.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}

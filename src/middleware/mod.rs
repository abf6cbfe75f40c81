//! Middleware layer.
//!
//! Middleware intercepts requests before the matched handler runs and is the
//! right place for cross-cutting concerns: structured logging, request-id
//! injection, authentication-header inspection.
//!
//! A middleware is a decorator over [`BoxedHandler`]: it receives the next
//! handler in the chain and returns a wrapped one. The chain is composed
//! once, when the router is finalized — nothing is rebuilt per request.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;

/// A handler decorator, applied to every route when the router is finalized.
pub type Middleware = Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync>;

/// Logs one line per routed request: method, URI, user-agent, and elapsed
/// time, before the wrapped handler runs and regardless of its outcome.
///
/// The reference instant is captured once, here, at construction. The logged
/// `elapsed` field therefore grows monotonically across requests — it is the
/// age of the middleware, not per-request latency. Kept as-is for
/// compatibility with existing log consumers; see DESIGN.md before relying
/// on it.
pub fn logging() -> Middleware {
    let started = Instant::now();
    Arc::new(move |next: BoxedHandler| {
        let log = move |req: Request| {
            let next = Arc::clone(&next);
            async move {
                info!(
                    method = %req.method(),
                    uri = %req.uri(),
                    user_agent = req.header("user-agent").unwrap_or(""),
                    elapsed = ?started.elapsed(),
                    "request"
                );
                next.call(req).await
            }
        };
        log.into_boxed_handler()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

    async fn ok(_req: Request) -> Response {
        Response::text("ok")
    }

    #[tokio::test]
    async fn logging_passes_the_response_through() {
        let wrapped = logging()(ok.into_boxed_handler());
        let res = wrapped.call(Request::fake("/square/3", &[])).await;
        assert_eq!(res.status, http::StatusCode::OK);
        assert_eq!(&res.body[..], b"ok");
    }

    #[tokio::test]
    async fn logging_tolerates_a_missing_user_agent() {
        let (parts, ()) = http::Request::builder()
            .uri("/metrics")
            .body(())
            .unwrap()
            .into_parts();
        let req = Request::new(parts, std::collections::HashMap::new());
        let wrapped = logging()(ok.into_boxed_handler());
        let res = wrapped.call(req).await;
        assert_eq!(&res.body[..], b"ok");
    }
}

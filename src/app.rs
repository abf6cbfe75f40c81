//! Route construction and the application handlers.

use std::sync::Arc;

use http::StatusCode;

use crate::metrics::Metrics;
use crate::middleware;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Builds the application router: request logging on every route, the
/// metrics scrape endpoint, and the squaring endpoint.
pub fn router(metrics: Arc<Metrics>) -> Router {
    let on_square = {
        let metrics = Arc::clone(&metrics);
        move |req: Request| {
            let metrics = Arc::clone(&metrics);
            async move { square(req, &metrics) }
        }
    };
    let on_scrape = move |_req: Request| {
        let metrics = Arc::clone(&metrics);
        async move { scrape(&metrics) }
    };

    Router::new()
        .layer(middleware::logging())
        .get("/metrics", on_scrape)
        .get("/square/{number}", on_square)
}

/// `GET /square/{number}` — squares a 32-bit signed integer.
///
/// The call is counted on entry, before the input is looked at, so the
/// counter tracks attempts rather than successes. Input that is missing,
/// non-numeric, or outside the `i32` range is answered with
/// `500 Internal Server Error` and an empty body — the status existing
/// callers expect, kept as-is (see DESIGN.md).
fn square(req: Request, metrics: &Metrics) -> Response {
    metrics.record_square_call();

    let Some(Ok(number)) = req.param("number").map(str::parse::<i32>) else {
        return Response::status(StatusCode::INTERNAL_SERVER_ERROR);
    };

    // Widened before multiplying so inputs near the i32 boundary square
    // without overflow.
    let number = i64::from(number);
    Response::text((number * number).to_string())
}

/// `GET /metrics` — Prometheus scrape endpoint.
fn scrape(metrics: &Metrics) -> Response {
    Response::builder().body(prometheus::TEXT_FORMAT, metrics.render())
}

//! # squared
//!
//! A minimal HTTP service that squares integers. Nothing more. Nothing less.
//!
//! ## The surface
//!
//! | Method | Path | Behavior |
//! |---|---|---|
//! | GET | `/square/{number}` | `200` with the decimal square of a 32-bit integer; `500` with an empty body on bad input |
//! | GET | `/metrics` | Prometheus text exposition, including `square_endpoint_total_calls` |
//!
//! Every route runs behind the logging middleware. Unmatched paths get a
//! `404`; known paths under the wrong method get a `405`.
//!
//! ## The lifecycle
//!
//! The binary reads `PORT` (default 8080), binds the listener, and serves on
//! a background task while the main task waits for SIGTERM or Ctrl-C. On a
//! signal the listener closes and in-flight requests get a 5-second grace
//! period; overrunning it is a fatal error, as is failing to bind.
//!
//! ## Using the pieces directly
//!
//! The server and router are ordinary library types, which is how the
//! integration tests drive them:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use squared::{app, metrics::Metrics, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), squared::Error> {
//!     let metrics = Arc::new(Metrics::new()?);
//!     let server = Server::bind(([0, 0, 0, 0], 8080).into()).await?;
//!     server.serve(app::router(metrics), squared::shutdown::signal()).await
//! }
//! ```

pub mod app;
pub mod config;
mod error;
mod handler;
pub mod metrics;
pub mod middleware;
mod request;
mod response;
mod router;
mod server;
pub mod shutdown;

pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::{IO_TIMEOUT, SHUTDOWN_GRACE, Server};

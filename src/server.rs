//! HTTP server: accept loop, connection deadlines, graceful shutdown.
//!
//! The server does not install signal handlers itself. [`Server::serve`]
//! takes a caller-supplied shutdown future; when it resolves the listener
//! closes immediately and in-flight connections get a bounded grace period
//! to finish. The entrypoint wires that future to SIGTERM/SIGINT (see
//! [`shutdown`](crate::shutdown)), tests wire it to whatever they like.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::{RouteTable, Router};

/// Per-connection read/write deadline.
pub const IO_TIMEOUT: Duration = Duration::from_secs(15);

/// Grace period for draining in-flight connections at shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
    addr: SocketAddr,
    io_timeout: Duration,
    grace: Duration,
}

impl Server {
    /// Binds the listener on `addr`.
    ///
    /// # Errors
    ///
    /// Fails when the address cannot be bound — the caller treats this as a
    /// startup failure.
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        Ok(Self {
            listener,
            addr,
            io_timeout: IO_TIMEOUT,
            grace: SHUTDOWN_GRACE,
        })
    }

    /// The address the listener actually bound — useful when binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Overrides the per-connection read/write deadline.
    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Overrides the shutdown grace period.
    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Accepts connections and dispatches them through `router` until
    /// `shutdown` resolves, then drains in-flight connections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutdownTimeout`] when the drain outlives the grace
    /// period; whatever is still running is abandoned.
    pub async fn serve(
        self,
        router: Router,
        shutdown: impl Future<Output = ()> + Send,
    ) -> Result<(), Error> {
        let Self {
            listener,
            addr,
            io_timeout,
            grace,
        } = self;

        // Finalized once, shared across connection tasks without copying the
        // routing table.
        let table = Arc::new(router.finalize());

        info!(addr = %addr, "listening");

        let builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();

        // JoinSet tracks every spawned connection task so stragglers are
        // aborted when the grace period runs out.
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a termination signal
                // stops the accept loop even when connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let table = Arc::clone(&table);
                    // TokioIo adapts tokio's AsyncRead/AsyncWrite to the
                    // hyper IO traits.
                    let io = TokioIo::new(stream);

                    // `service_fn` is called once per request on the
                    // connection, not once per connection.
                    let svc = service_fn(move |req| {
                        let table = Arc::clone(&table);
                        async move { dispatch(table, req).await }
                    });

                    // `auto` negotiates HTTP/1.1 or HTTP/2 per client. The
                    // graceful handle stops keep-alive connections from
                    // idling past shutdown.
                    let conn = graceful.watch(builder.serve_connection(io, svc).into_owned());

                    tasks.spawn(async move {
                        match tokio::time::timeout(io_timeout, conn).await {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => error!(peer = %remote_addr, "connection error: {e}"),
                            Err(_) => warn!(
                                peer = %remote_addr,
                                timeout = ?io_timeout,
                                "connection exceeded the io deadline"
                            ),
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not
                // grow without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // No new connections from here on.
        drop(listener);

        tokio::select! {
            () = graceful.shutdown() => {}
            () = tokio::time::sleep(grace) => return Err(Error::ShutdownTimeout),
        }

        // Connections are done; their tasks finish momentarily.
        while tasks.join_next().await.is_some() {}

        info!("stopped");
        Ok(())
    }
}

/// Core hot path: routes one request and produces one response.
///
/// The error type is [`Infallible`](std::convert::Infallible) — every
/// failure becomes an HTTP status (404, 405, 500) so hyper never sees an
/// error.
async fn dispatch(
    table: Arc<RouteTable>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let (parts, _body) = req.into_parts();

    let response = match table.lookup(&parts.method, parts.uri.path()) {
        Some((handler, params)) => handler.call(Request::new(parts, params)).await,
        None if table.allows_other_method(&parts.method, parts.uri.path()) => {
            Response::status(StatusCode::METHOD_NOT_ALLOWED)
        }
        None => Response::status(StatusCode::NOT_FOUND),
    };

    Ok(response.into_http())
}

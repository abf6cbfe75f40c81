//! Process entrypoint: configuration, startup, coordinated shutdown.

use std::process;
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use squared::config::Config;
use squared::metrics::Metrics;
use squared::{SHUTDOWN_GRACE, Server, app, shutdown};

#[tokio::main]
async fn main() {
    // JSON lines to stdout, debug level unless RUST_LOG says otherwise.
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let config = Config::from_env();

    let metrics = match Metrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            error!("failed to register metrics: {e}");
            process::exit(1);
        }
    };
    let router = app::router(Arc::clone(&metrics));

    let server = match Server::bind(config.addr()).await {
        Ok(server) => server,
        Err(e) => {
            error!("failed to start the server: {e}");
            process::exit(1);
        }
    };
    info!(addr = %server.local_addr(), "running");

    // Single-slot handoff between the signal watcher here and the serve task.
    let trigger = Arc::new(Notify::new());
    let mut serving = tokio::spawn({
        let trigger = Arc::clone(&trigger);
        server.serve(router, async move { trigger.notified().await })
    });

    tokio::select! {
        () = shutdown::signal() => {
            info!(grace = ?SHUTDOWN_GRACE, "shutting down");
            trigger.notify_one();
            match serving.await {
                Ok(Ok(())) => info!("shutdown completed"),
                Ok(Err(e)) => {
                    error!("shutdown failed: {e}");
                    process::exit(1);
                }
                Err(e) => {
                    error!("server task failed: {e}");
                    process::exit(1);
                }
            }
        }

        // The serve task never finishes on its own; reaching here means it
        // died before any signal arrived.
        res = &mut serving => {
            match res {
                Ok(Ok(())) => error!("server exited unexpectedly"),
                Ok(Err(e)) => error!("server failed: {e}"),
                Err(e) => error!("server task failed: {e}"),
            }
            process::exit(1);
        }
    }
}

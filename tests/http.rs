//! End-to-end tests: a real listener, raw TCP clients, real signals wired to
//! a [`Notify`] trigger instead of the OS.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use squared::metrics::Metrics;
use squared::{Error, Request, Response, Router, Server, app};

struct TestServer {
    addr: SocketAddr,
    trigger: Arc<Notify>,
    serving: JoinHandle<Result<(), Error>>,
}

impl TestServer {
    async fn start(router: Router) -> Self {
        Self::start_with(router, |server| server).await
    }

    async fn start_with(router: Router, tune: impl FnOnce(Server) -> Server) -> Self {
        let server = Server::bind(([127, 0, 0, 1], 0).into()).await.expect("bind");
        let server = tune(server);
        let addr = server.local_addr();
        let trigger = Arc::new(Notify::new());
        let serving = tokio::spawn({
            let trigger = Arc::clone(&trigger);
            server.serve(router, async move { trigger.notified().await })
        });
        Self {
            addr,
            trigger,
            serving,
        }
    }

    async fn shut_down(self) -> Result<(), Error> {
        self.trigger.notify_one();
        self.serving.await.expect("serve task")
    }
}

fn service() -> Router {
    app::router(Arc::new(Metrics::new().expect("metrics")))
}

/// Issues one request with `connection: close` and returns (status, body).
async fn request(addr: SocketAddr, method: &str, target: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(
            format!("{method} {target} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n")
                .as_bytes(),
        )
        .await
        .expect("write request");

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read response");
    let raw = String::from_utf8(raw).expect("utf-8 response");

    let status = raw
        .split(' ')
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status line");
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_owned())
        .unwrap_or_default();
    (status, body)
}

async fn get(addr: SocketAddr, target: &str) -> (u16, String) {
    request(addr, "GET", target).await
}

fn counter_value(exposition: &str) -> u64 {
    exposition
        .lines()
        .find(|line| line.starts_with("square_endpoint_total_calls"))
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
        .expect("counter missing from exposition")
}

#[tokio::test]
async fn squares_valid_input() {
    let server = TestServer::start(service()).await;

    for (target, expected) in [
        ("/square/7", "49"),
        ("/square/-5", "25"),
        ("/square/0", "0"),
        ("/square/70000", "4900000000"),
        ("/square/2147483647", "4611686014132420609"),
    ] {
        let (status, body) = get(server.addr, target).await;
        assert_eq!(status, 200, "{target}");
        assert_eq!(body, expected, "{target}");
    }
}

#[tokio::test]
async fn rejects_bad_input_with_500_and_empty_body() {
    let server = TestServer::start(service()).await;

    for target in ["/square/abc", "/square/99999999999", "/square/12.5"] {
        let (status, body) = get(server.addr, target).await;
        assert_eq!(status, 500, "{target}");
        assert!(body.is_empty(), "{target}");
    }
}

#[tokio::test]
async fn unmatched_routes_get_404_or_405() {
    let server = TestServer::start(service()).await;

    let (status, _) = get(server.addr, "/nope").await;
    assert_eq!(status, 404);

    let (status, _) = request(server.addr, "POST", "/square/3").await;
    assert_eq!(status, 405);
}

#[tokio::test]
async fn metrics_counts_square_calls_only() {
    let server = TestServer::start(service()).await;

    let (status, body) = get(server.addr, "/metrics").await;
    assert_eq!(status, 200);
    assert_eq!(counter_value(&body), 0);

    get(server.addr, "/square/3").await;
    get(server.addr, "/square/abc").await; // failures count too

    let (_, body) = get(server.addr, "/metrics").await;
    assert_eq!(counter_value(&body), 2);

    // Scraping does not move the counter.
    let (_, body) = get(server.addr, "/metrics").await;
    assert_eq!(counter_value(&body), 2);
}

#[tokio::test]
async fn concurrent_calls_are_all_counted() {
    const CALLS: usize = 32;

    let server = TestServer::start(service()).await;

    let clients: Vec<_> = (0..CALLS)
        .map(|_| tokio::spawn(get(server.addr, "/square/12")))
        .collect();
    for client in clients {
        let (status, body) = client.await.expect("client task");
        assert_eq!(status, 200);
        assert_eq!(body, "144");
    }

    let (_, body) = get(server.addr, "/metrics").await;
    assert_eq!(counter_value(&body), CALLS as u64);
}

#[tokio::test]
async fn shutdown_waits_for_in_flight_requests() {
    async fn slow(_req: Request) -> &'static str {
        tokio::time::sleep(Duration::from_millis(200)).await;
        "done"
    }

    let router = Router::new().get("/slow", slow);
    let server = TestServer::start(router).await;

    let addr = server.addr;
    let client = tokio::spawn(async move { get(addr, "/slow").await });

    // Let the request get in flight, then pull the plug.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let result = server.shut_down().await;

    let (status, body) = client.await.expect("client task");
    assert_eq!(status, 200);
    assert_eq!(body, "done");
    assert!(result.is_ok());
}

#[tokio::test]
async fn shutdown_gives_up_after_the_grace_period() {
    async fn hang(_req: Request) -> Response {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Response::text("never")
    }

    let router = Router::new().get("/hang", hang);
    let server =
        TestServer::start_with(router, |s| s.grace(Duration::from_millis(100))).await;

    let addr = server.addr;
    tokio::spawn(async move {
        // This client is abandoned along with its request.
        let _ = get(addr, "/hang").await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let result = server.shut_down().await;
    assert!(matches!(result, Err(Error::ShutdownTimeout)));
}

#[tokio::test]
async fn idle_connections_hit_the_io_deadline() {
    let server =
        TestServer::start_with(service(), |s| s.io_timeout(Duration::from_millis(200))).await;

    let mut stream = TcpStream::connect(server.addr).await.expect("connect");

    // Send nothing; the server should close the connection on its own well
    // before this read times out.
    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf)).await;
    match read {
        Ok(Ok(0)) | Ok(Err(_)) => {}
        Ok(Ok(n)) => panic!("unexpected {n} bytes from an idle connection"),
        Err(_) => panic!("connection was not closed by the io deadline"),
    }
}

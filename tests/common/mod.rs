//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use director_proxy::config::{ProxyConfig, RouteDescriptor};
use director_proxy::director::{Deployment, Instance, Topology};
use director_proxy::http::HttpServer;
use director_proxy::lifecycle::Shutdown;
use director_proxy::routing::RouteTable;

pub fn route(host: &str, prefix: &str, job: &str) -> RouteDescriptor {
    RouteDescriptor {
        route: host.to_string(),
        deployment: None,
        deployment_prefix: Some(prefix.to_string()),
        job: job.to_string(),
    }
}

pub fn instance(job: &str, ips: &[&str]) -> Instance {
    Instance {
        id: format!("{}-id", job),
        agent_id: format!("{}-agent", job),
        job: job.to_string(),
        index: Some(0),
        ips: ips.iter().map(|ip| ip.to_string()).collect(),
    }
}

pub fn topology(deployments: Vec<(&str, Vec<Instance>)>) -> Topology {
    Topology::new(
        deployments
            .into_iter()
            .map(|(name, instances)| Deployment::new(name, instances))
            .collect(),
    )
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig, table: Arc<RouteTable>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, table);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}

/// Start a backend that records the first bytes of each connection, then closes it.
///
/// It does not speak TLS, so the proxy's handshake always fails.
pub async fn start_capture_backend() -> (SocketAddr, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                if let Ok(Ok(n)) = tokio::time::timeout(Duration::from_secs(5), socket.read(&mut buf)).await {
                    buf.truncate(n);
                    let _ = tx.send(buf);
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// What an HTTPS backend received.
#[derive(Debug)]
pub struct Received {
    pub method: String,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: String,
}

pub const BACKEND_BODY: &str = "hello from backend";

/// Start an HTTPS backend with a self-signed certificate.
///
/// It records each request and answers `201` with [`BACKEND_BODY`].
pub async fn start_tls_backend() -> (SocketAddr, mpsc::UnboundedReceiver<Received>) {
    let tls = RustlsConfig::from_pem_file(
        concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/backend-cert.pem"),
        concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/backend-key.pem"),
    )
    .await
    .unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    let record = move |request: Request<Body>| {
        let tx = tx.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = to_bytes(body, 1 << 20).await.unwrap();
            let _ = tx.send(Received {
                method: parts.method.to_string(),
                path_and_query: parts.uri.path_and_query().map(|p| p.to_string()).unwrap_or_default(),
                headers: parts.headers,
                body: String::from_utf8_lossy(&body).into_owned(),
            });

            let mut response: Response = (StatusCode::CREATED, BACKEND_BODY).into_response();
            response.headers_mut().insert("x-backend", "blue".parse().unwrap());
            response.headers_mut().insert("keep-alive", "timeout=5".parse().unwrap());
            response
        }
    };
    let app = axum::Router::new()
        .route("/", any(record.clone()))
        .route("/{*path}", any(record));

    let handle = axum_server::Handle::new();
    let listening = handle.clone();
    tokio::spawn(async move {
        let _ = axum_server::bind_rustls("127.0.0.1:0".parse().unwrap(), tls)
            .handle(handle)
            .serve(app.into_make_service())
            .await;
    });
    let addr = listening.listening().await.expect("backend failed to bind");

    (addr, rx)
}

/// Minimal parsed HTTP/1.1 response.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Send a GET with the given Host header over a fresh connection.
pub async fn get(proxy: SocketAddr, host: &str, path: &str) -> RawResponse {
    send(
        proxy,
        &format!("GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", path, host),
    )
    .await
}

/// Write a raw request over a fresh connection and read until close.
pub async fn send(proxy: SocketAddr, request: &str) -> RawResponse {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(60), stream.read_to_end(&mut raw))
        .await
        .expect("proxy response timed out")
        .unwrap();

    parse_response(&String::from_utf8_lossy(&raw))
}

fn parse_response(raw: &str) -> RawResponse {
    let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body: body.to_string(),
    }
}

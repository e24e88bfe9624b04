//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use edge_proxy::config::{ProxyConfig, RouteConfig, RoutesConfig};
use edge_proxy::proxy::client::{api_client_builder, download_client_builder};
use edge_proxy::proxy::Upstreams;
use edge_proxy::HttpServer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Hostname that passes the SSRF guard; tests pin it to a local mock.
pub const PUBLIC_HOST: &str = "public-cdn.example.com";

/// A mock upstream that records every request it receives.
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    /// Raw requests (head and body, lossy UTF-8) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a programmable upstream. `respond` gets the raw request and returns
/// the raw HTTP response bytes.
pub async fn start_upstream<F>(respond: F) -> MockUpstream
where
    F: Fn(&str) -> Vec<u8> + Send + Sync + 'static,
{
    start_delayed_upstream(Duration::ZERO, respond).await
}

/// Like [`start_upstream`], but waits `delay` after reading each request
/// before answering.
pub async fn start_delayed_upstream<F>(delay: Duration, respond: F) -> MockUpstream
where
    F: Fn(&str) -> Vec<u8> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let respond = respond.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                recorded.lock().unwrap().push(request.clone());
                let response = respond(&request);
                tokio::time::sleep(delay).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockUpstream { addr, requests }
}

/// Start an upstream that always answers with the same response.
pub async fn start_fixed_upstream(response: Vec<u8>) -> MockUpstream {
    start_upstream(move |_| response.clone()).await
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::from_utf8_lossy(&buf).into_owned(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Serialize a `Connection: close` HTTP/1.1 response.
pub fn http_response(status: u16, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let mut out = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str("\r\n");

    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// Default config with `douyin` pointed at a plain-HTTP mock.
pub fn config_for(upstream: SocketAddr) -> ProxyConfig {
    let mut route = RouteConfig::new("douyin", upstream.to_string());
    route.scheme = "http".into();

    let mut config = ProxyConfig::default();
    config.routes = RoutesConfig(vec![
        route,
        RouteConfig::new("ttwid", "ttwid.bytedance.com"),
    ]);
    config
}

/// Upstream clients that ignore proxy env vars and send [`PUBLIC_HOST`]
/// to `download_target` when given.
pub fn upstreams(config: &ProxyConfig, download_target: Option<SocketAddr>) -> Upstreams {
    let api = api_client_builder(config).no_proxy().build().unwrap();
    let mut download = download_client_builder(config).no_proxy();
    if let Some(addr) = download_target {
        download = download.resolve(PUBLIC_HOST, addr);
    }
    Upstreams::new(api, download.build().unwrap())
}

/// The proxy's router, ready for `oneshot`.
pub fn proxy_router(config: &ProxyConfig, download_target: Option<SocketAddr>) -> Router {
    HttpServer::with_upstreams(config.clone(), upstreams(config, download_target)).router()
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

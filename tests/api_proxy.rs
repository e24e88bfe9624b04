//! API path: routing, header sanitization and base64 envelopes.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use base64::{engine::general_purpose::STANDARD, Engine};
use edge_proxy::http::response::{ApiErrorBody, ProxyEnvelope};
use edge_proxy::lifecycle::Shutdown;
use edge_proxy::HttpServer;
use tower::ServiceExt;

mod common;

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn envelope(response: Response) -> ProxyEnvelope {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_upstream_status_and_utf8_bytes_preserved() {
    let payload = "{\"msg\":\"未找到资源 — ✓ 🎵\"}".as_bytes().to_vec();
    let upstream = common::start_fixed_upstream(common::http_response(
        404,
        &[("Content-Type", "application/json; charset=utf-8")],
        &payload,
    ))
    .await;
    let app = common::proxy_router(&common::config_for(upstream.addr), None);

    let response = app
        .oneshot(Request::get("/douyin/api/ping?aid=6383&msToken=x%2By").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let envelope = envelope(response).await;
    assert_eq!(envelope.encoding, "base64");
    assert_eq!(STANDARD.decode(envelope.data).unwrap(), payload);

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    assert!(
        requests[0].starts_with("GET /api/ping?aid=6383&msToken=x%2By HTTP/1.1\r\n"),
        "unexpected request line: {}",
        requests[0]
    );
}

#[tokio::test]
async fn test_non_utf8_payload_roundtrip() {
    let payload = vec![0xff, 0xfe, 0x00, 0x80, b'a', 0xc3, 0x28, 0x89, 0x50, 0x4e, 0x47];
    let upstream = common::start_fixed_upstream(common::http_response(
        200,
        &[("Content-Type", "application/octet-stream")],
        &payload,
    ))
    .await;
    let app = common::proxy_router(&common::config_for(upstream.addr), None);

    let response = app
        .oneshot(Request::get("/douyin/blob").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let envelope = envelope(response).await;
    assert_eq!(STANDARD.decode(envelope.data).unwrap(), payload);
}

#[tokio::test]
async fn test_infra_headers_stripped_and_host_rewritten() {
    let upstream = common::start_fixed_upstream(common::http_response(200, &[], b"ok")).await;
    let app = common::proxy_router(&common::config_for(upstream.addr), None);

    let request = Request::get("/douyin/aweme/v1/web/aweme/detail/")
        .header("Host", "proxy.workers.dev")
        .header("CF-Connecting-IP", "203.0.113.7")
        .header("cf-ipcountry", "CN")
        .header("Cf-Ray", "8a1b2c3d4e5f-HKG")
        .header("CF-VISITOR", "{\"scheme\":\"https\"}")
        .header("User-Agent", "Mozilla/5.0 test")
        .header("Cookie", "ttwid=abc; msToken=def")
        .header("Referer", "https://www.douyin.com/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = upstream.requests()[0].to_ascii_lowercase();
    assert!(!seen.contains("cf-"), "infra header leaked: {seen}");
    assert!(seen.contains(&format!("host: {}\r\n", upstream.addr)));
    assert!(!seen.contains("proxy.workers.dev"));
    assert!(seen.contains("user-agent: mozilla/5.0 test\r\n"));
    assert!(seen.contains("cookie: ttwid=abc; mstoken=def\r\n"));
    assert!(seen.contains("referer: https://www.douyin.com/\r\n"));
}

#[tokio::test]
async fn test_method_and_body_forwarded() {
    let upstream = common::start_fixed_upstream(common::http_response(201, &[], b"{}")).await;
    let app = common::proxy_router(&common::config_for(upstream.addr), None);

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/douyin/api/item")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from("a=1&b=%E4%BD%A0"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let seen = &upstream.requests()[0];
    assert!(seen.starts_with("PUT /api/item HTTP/1.1\r\n"));
    assert!(seen.to_ascii_lowercase().contains("content-length: 15\r\n"));
    assert!(seen.ends_with("\r\n\r\na=1&b=%E4%BD%A0"));
}

#[tokio::test]
async fn test_redirects_followed() {
    let upstream = common::start_upstream(|request| {
        if request.starts_with("GET /start ") {
            common::http_response(302, &[("Location", "/final")], b"")
        } else {
            common::http_response(200, &[], b"landed")
        }
    })
    .await;
    let app = common::proxy_router(&common::config_for(upstream.addr), None);

    let response = app
        .oneshot(Request::get("/douyin/start").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(STANDARD.decode(envelope(response).await.data).unwrap(), b"landed");
    assert_eq!(upstream.requests().len(), 2);
}

#[tokio::test]
async fn test_cross_host_redirect_sends_new_host() {
    let landing = common::start_fixed_upstream(common::http_response(200, &[], b"moved")).await;
    let location = format!("http://{}/landed", landing.addr);
    let origin = common::start_fixed_upstream(common::http_response(
        302,
        &[("Location", location.as_str())],
        b"",
    ))
    .await;
    let app = common::proxy_router(&common::config_for(origin.addr), None);

    let request = Request::get("/douyin/start")
        .header("Host", "proxy.workers.dev")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(STANDARD.decode(envelope(response).await.data).unwrap(), b"moved");

    let first = origin.requests()[0].to_ascii_lowercase();
    assert!(first.contains(&format!("host: {}\r\n", origin.addr)));
    assert!(!first.contains("proxy.workers.dev"));

    let second = landing.requests()[0].to_ascii_lowercase();
    assert!(second.starts_with("get /landed http/1.1\r\n"));
    assert!(second.contains(&format!("host: {}\r\n", landing.addr)), "{second}");
    assert!(!second.contains(&format!("host: {}", origin.addr)));
}

#[tokio::test]
async fn test_oversized_response_is_bad_gateway() {
    let upstream =
        common::start_fixed_upstream(common::http_response(200, &[], &[b'x'; 64])).await;
    let mut config = common::config_for(upstream.addr);
    config.limits.max_buffered_response_bytes = 16;
    let app = common::proxy_router(&config, None);

    let response = app
        .oneshot(Request::get("/douyin/big").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let body: ApiErrorBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.error, "proxy request failed");
    assert!(body.message.contains("exceeded 16 bytes"));
}

#[tokio::test]
async fn test_unreachable_upstream_is_internal_error() {
    let config = common::config_for(common::closed_port().await);
    let app = common::proxy_router(&config, None);

    let response = app
        .oneshot(Request::get("/douyin/api/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "proxy request failed");
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn test_slow_upstream_is_internal_error() {
    let upstream = common::start_delayed_upstream(Duration::from_secs(3), |_| {
        common::http_response(200, &[], b"late")
    })
    .await;
    let mut config = common::config_for(upstream.addr);
    config.timeouts.request_secs = 1;
    let app = common::proxy_router(&config, None);

    let response = app
        .oneshot(Request::get("/douyin/api/slow").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let body: ApiErrorBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.error, "proxy request failed");
    assert!(!body.message.is_empty());
}

#[tokio::test]
async fn test_unknown_path_is_plain_bad_request() {
    let app = common::proxy_router(&common::config_for(common::closed_port().await), None);

    for (method, uri) in [
        (Method::GET, "/unknown/path"),
        (Method::GET, "/douyin"),
        (Method::PATCH, "/douyin/api"),
        (Method::GET, "/download"),
    ] {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.contains("Invalid path"), "{text}");
        assert!(text.contains("/douyin/*"));
    }
}

#[tokio::test]
async fn test_preflight_is_idempotent() {
    let app = common::proxy_router(&common::config_for(common::closed_port().await), None);

    let mut seen = Vec::new();
    for _ in 0..3 {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/douyin/api/ping")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = body_bytes(response).await;
        seen.push((status, headers, body));
    }

    assert_eq!(seen[0].0, StatusCode::OK);
    assert_eq!(seen[0].1[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
    assert!(seen[0].2.is_empty());
    assert!(seen.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn test_served_over_socket() {
    let upstream = common::start_fixed_upstream(common::http_response(200, &[], b"pong")).await;
    let config = common::config_for(upstream.addr);
    let server = HttpServer::with_upstreams(config.clone(), common::upstreams(&config, None));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy_addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{proxy_addr}/douyin/ping"))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    let envelope: ProxyEnvelope = serde_json::from_slice(&res.bytes().await.unwrap()).unwrap();
    assert_eq!(STANDARD.decode(envelope.data).unwrap(), b"pong");

    drop(client);
    shutdown.trigger();
    let stopped = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after shutdown");
    assert!(stopped.unwrap().is_ok());
}

//! PHP probe telemetry and forwarding tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use probe_shim::cache::MemoryKvStore;
use probe_shim::config::Destination;
use probe_shim::telemetry::EventSink;
use probe_shim::{HttpServer, ShimConfig, Shutdown};
use tower::ServiceExt;

mod common;

use common::{FailingSink, PanickingSink, RecordingSink};

fn test_config(origin: SocketAddr) -> ShimConfig {
    let mut config = ShimConfig::default();
    config.reporting.token = Some("s3cret".to_string());
    config.routing.origin = origin.to_string();
    config
}

fn server_with_sink(config: ShimConfig, sink: Arc<dyn EventSink>) -> HttpServer {
    HttpServer::with_components(config, sink, Arc::new(MemoryKvStore::new())).unwrap()
}

fn request(host: &str, path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::HOST, host)
        .header(header::USER_AGENT, "A".repeat(300))
        .header("cf-ipcountry", "NL")
        .header("cf-asn", "1136")
        .body(Body::empty())
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_php_probe_recorded_once_and_forwarded() {
    let origin = common::start_mock_backend(200, "origin says hi").await;
    let sink = Arc::new(RecordingSink::default());
    let server = server_with_sink(test_config(origin.addr), sink.clone());

    let response = server
        .router()
        .oneshot(request("example.com", "/wp-login.php"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "origin says hi");

    server.background_tasks().drain().await;
    let points = sink.points();
    assert_eq!(points.len(), 1);

    let blobs = &points[0].blobs;
    assert_eq!(blobs[0], "/wp-login.php");
    assert_eq!(blobs[1], "NL");
    assert_eq!(blobs[2], "");
    assert_eq!(blobs[3].chars().count(), 140);
    assert_eq!(blobs[4], "1136");
    assert_eq!(points[0].doubles, vec![1.0]);
    assert_eq!(points[0].indexes.len(), 1);
}

#[tokio::test]
async fn test_forwarded_request_keeps_path_query_and_host() {
    let origin = common::start_mock_backend(200, "ok").await;
    let server = server_with_sink(test_config(origin.addr), Arc::new(RecordingSink::default()));

    let response = server
        .router()
        .oneshot(request("example.com", "/x.php/y?a=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let raw = &origin.requests()[0];
    assert!(raw.starts_with("GET /x.php/y?a=1 HTTP/1.1"));
    assert!(raw.to_ascii_lowercase().contains("host: example.com"));
    assert!(raw.to_ascii_lowercase().contains("x-request-id:"));
}

#[tokio::test]
async fn test_non_php_path_is_not_recorded() {
    let origin = common::start_mock_backend(200, "ok").await;
    let sink = Arc::new(RecordingSink::default());
    let server = server_with_sink(test_config(origin.addr), sink.clone());

    for path in ["/", "/index.html", "/aphp", "/a.phps"] {
        let response = server.router().oneshot(request("example.com", path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    server.background_tasks().drain().await;
    assert!(sink.points().is_empty());
    assert_eq!(origin.hits(), 4);
}

#[tokio::test]
async fn test_sink_failure_does_not_change_response() {
    let origin = common::start_mock_backend(404, "no such page").await;

    let failing = server_with_sink(test_config(origin.addr), Arc::new(FailingSink));
    let response = failing
        .router()
        .oneshot(request("example.com", "/admin.php"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "no such page");
    failing.background_tasks().drain().await;

    let panicking = server_with_sink(test_config(origin.addr), Arc::new(PanickingSink));
    let response = panicking
        .router()
        .oneshot(request("example.com", "/admin.php"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "no such page");
    assert!(panicking
        .background_tasks()
        .drain_timeout(Duration::from_secs(1))
        .await);
}

#[tokio::test]
async fn test_telemetry_disabled() {
    let origin = common::start_mock_backend(200, "ok").await;
    let sink = Arc::new(RecordingSink::default());
    let mut config = test_config(origin.addr);
    config.telemetry.enabled = false;
    let server = server_with_sink(config, sink.clone());

    let response = server.router().oneshot(request("example.com", "/a.php")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    server.background_tasks().drain().await;
    assert!(sink.points().is_empty());
}

#[tokio::test]
async fn test_host_routing() {
    let origin = common::start_mock_backend(200, "from origin").await;
    let internal = common::start_mock_backend(200, "from internal").await;

    let mut config = test_config(origin.addr);
    config.routing.internal_service = Some(internal.addr.to_string());
    config
        .routing
        .hosts
        .insert("api.example.com".to_string(), Destination::Internal);
    let server = server_with_sink(config, Arc::new(RecordingSink::default()));

    let response = server.router().oneshot(request("api.example.com", "/v1/items")).await.unwrap();
    assert_eq!(body_text(response).await, "from internal");

    let response = server.router().oneshot(request("api.example.com:8080", "/v1/items")).await.unwrap();
    assert_eq!(body_text(response).await, "from internal");

    let response = server.router().oneshot(request("www.example.com", "/v1/items")).await.unwrap();
    assert_eq!(body_text(response).await, "from origin");

    assert_eq!(internal.hits(), 2);
    assert_eq!(origin.hits(), 1);
}

#[tokio::test]
async fn test_unreachable_destination_is_502() {
    let server = server_with_sink(
        test_config("127.0.0.1:9".parse().unwrap()),
        Arc::new(RecordingSink::default()),
    );

    let response = server.router().oneshot(request("example.com", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let origin = common::start_mock_backend(200, "ok").await;
    let server = server_with_sink(test_config(origin.addr), Arc::new(RecordingSink::default()));

    let response = server.router().oneshot(request("example.com", "/")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_shutdown_drains_pending_telemetry() {
    let origin = common::start_mock_backend(200, "ok").await;
    let sink = Arc::new(RecordingSink::default());
    let server = server_with_sink(test_config(origin.addr), sink.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/xmlrpc.php", addr))
        .send()
        .await
        .expect("shim unreachable");
    assert_eq!(res.status(), 200);
    drop(res);
    drop(client);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();

    assert_eq!(sink.points().len(), 1);
}

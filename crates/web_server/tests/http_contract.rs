use std::{net::SocketAddr, path::PathBuf};

use axum::http::HeaderValue;
use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use reqwest::{header, Method, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use web_server::{app, ServerConfig, CONTENT_SECURITY_POLICY};

const CLIENT_ORIGIN: &str = "http://localhost:3000";

async fn spawn_server(config: ServerConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let router = app(&config);
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

fn dev_config() -> ServerConfig {
    ServerConfig {
        session_secret: "test-secret".to_string(),
        ..ServerConfig::default()
    }
}

async fn call(addr: SocketAddr, method: &str, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/{method}"))
        .json(&body)
        .send()
        .await
        .expect("request");
    let status = response.status();
    (status, response.json().await.expect("json body"))
}

#[tokio::test]
async fn health_reports_status_and_timestamp() {
    let addr = spawn_server(dev_config()).await;
    let body: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["status"], "ok");
    let timestamp = body["timestamp"].as_str().expect("timestamp string");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn api_methods_answer_with_placeholder_defaults() {
    let addr = spawn_server(dev_config()).await;
    let sql = json!({"sql": "SELECT * FROM apps", "params": []});

    assert_eq!(call(addr, "db:initialize", json!({})).await, (StatusCode::OK, json!({"success": true})));
    assert_eq!(call(addr, "db:query", sql.clone()).await, (StatusCode::OK, json!([])));
    assert_eq!(call(addr, "db:get", sql.clone()).await, (StatusCode::OK, Value::Null));
    assert_eq!(call(addr, "db:execute", sql).await, (StatusCode::OK, json!({"success": true})));
    assert_eq!(call(addr, "fs:exists", json!({"path": "/a"})).await, (StatusCode::OK, json!(false)));
    assert_eq!(call(addr, "fs:readDir", json!({"path": "/"})).await, (StatusCode::OK, json!([])));
}

#[tokio::test]
async fn failing_methods_return_500_with_error_message() {
    let addr = spawn_server(dev_config()).await;
    assert_eq!(
        call(addr, "fs:readFile", json!({"path": "/a.txt"})).await,
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "File operations require server-side storage setup"})
        )
    );
    assert_eq!(
        call(addr, "fs:createDir", json!({"path": "/d"})).await,
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Directory operations require server-side storage setup"})
        )
    );
    assert_eq!(
        call(addr, "cache:clear", json!({})).await,
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Unknown IPC method: cache:clear"})
        )
    );
}

#[tokio::test]
async fn empty_body_is_accepted_and_malformed_body_fails() {
    let addr = spawn_server(dev_config()).await;
    let client = reqwest::Client::new();

    let empty = client
        .post(format!("http://{addr}/api/db:query"))
        .send()
        .await
        .expect("request");
    assert_eq!(empty.status(), StatusCode::OK);

    let malformed = client
        .post(format!("http://{addr}/api/db:query"))
        .header(header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request");
    assert_eq!(malformed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = malformed.json().await.expect("json");
    assert!(body["error"].as_str().is_some_and(|m| m.starts_with("invalid JSON body")));
}

#[tokio::test]
async fn oversized_body_is_a_json_500() {
    let addr = spawn_server(dev_config()).await;
    let payload = format!("\"{}\"", "x".repeat(web_server::MAX_BODY_BYTES + 1024));
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/db:execute"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.expect("json error body");
    assert!(body["error"]
        .as_str()
        .is_some_and(|m| m.contains("length limit exceeded")));
}

#[tokio::test]
async fn responses_carry_security_headers_and_session_cookie() {
    let addr = spawn_server(dev_config()).await;
    let response = reqwest::get(format!("http://{addr}/health")).await.expect("request");
    let headers = response.headers();

    assert_eq!(
        headers.get(header::CONTENT_SECURITY_POLICY).expect("csp"),
        CONTENT_SECURITY_POLICY
    );
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).expect("nosniff"), "nosniff");
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).expect("frame"), "SAMEORIGIN");

    let cookie = headers
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("session cookie");
    assert!(cookie.starts_with("sid="));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn valid_session_cookie_is_not_reissued() {
    let addr = spawn_server(dev_config()).await;
    let client = reqwest::Client::new();
    let first = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .expect("request");
    let issued = first
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .expect("cookie pair")
        .to_string();

    let second = client
        .get(format!("http://{addr}/health"))
        .header(header::COOKIE, issued)
        .send()
        .await
        .expect("request");
    assert!(second.headers().get(header::SET_COOKIE).is_none());

    let tampered = client
        .get(format!("http://{addr}/health"))
        .header(header::COOKIE, "sid=forged.0000")
        .send()
        .await
        .expect("request");
    assert!(tampered.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn cors_preflight_allows_configured_client_with_credentials() {
    let addr = spawn_server(dev_config()).await;
    let response = reqwest::Client::new()
        .request(Method::OPTIONS, format!("http://{addr}/api/db:query"))
        .header(header::ORIGIN, CLIENT_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .send()
        .await
        .expect("preflight");

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).expect("allow origin"),
        CLIENT_ORIGIN
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .expect("allow credentials"),
        "true"
    );
}

#[tokio::test]
async fn production_mode_serves_bundle_with_spa_fallback_and_secure_cookie() {
    let dist = tempfile::tempdir().expect("tempdir");
    std::fs::write(dist.path().join("index.html"), "<html>shell</html>").expect("index");
    std::fs::write(dist.path().join("app.js"), "console.log(1);").expect("asset");

    let addr = spawn_server(ServerConfig {
        production: true,
        static_dir: PathBuf::from(dist.path()),
        client_origin: HeaderValue::from_static("https://app.example.com"),
        ..dev_config()
    })
    .await;

    let asset = reqwest::get(format!("http://{addr}/app.js")).await.expect("asset");
    assert_eq!(asset.status(), StatusCode::OK);
    assert_eq!(asset.text().await.expect("text"), "console.log(1);");

    let deep_link = reqwest::get(format!("http://{addr}/apps/notes/42"))
        .await
        .expect("deep link");
    assert_eq!(deep_link.status(), StatusCode::OK);
    let cookie = deep_link
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("cookie")
        .to_string();
    assert!(cookie.contains("Secure"));
    assert_eq!(deep_link.text().await.expect("text"), "<html>shell</html>");

    let health = reqwest::get(format!("http://{addr}/health")).await.expect("health");
    let body: Value = health.json().await.expect("json");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn development_mode_does_not_serve_static_files() {
    let addr = spawn_server(dev_config()).await;
    let response = reqwest::get(format!("http://{addr}/index.html")).await.expect("request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn websocket_channel_accepts_frames_without_replying() {
    let addr = spawn_server(dev_config()).await;
    let (mut socket, response) = connect_async(format!("ws://{addr}/ws/notifications"))
        .await
        .expect("connect");
    assert_eq!(response.status().as_u16(), 101);

    socket
        .send(Message::Text(r#"{"type":"ping"}"#.to_string()))
        .await
        .expect("send");
    socket.close(None).await.expect("close");

    while let Some(frame) = socket.next().await {
        match frame {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(other) => panic!("unexpected frame {other:?}"),
        }
    }
}

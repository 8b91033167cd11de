use std::time::Duration;

use probe_adapters::{HttpServiceClient, WebFrontendSurface};
use probe_core::{ClientSurface, ProbeError, ServiceClient, ServiceRequest};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_test::assert_ok;

/// Responde un único request con `status` y `body`; devuelve el request crudo.
async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text.lines()
                                 .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().to_string()))
                                 .and_then(|v| v.parse::<usize>().ok())
                                 .unwrap_or(0);
                if raw.len() >= end + 4 + length || n == 0 {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        let response = format!("HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                               body.len());
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&raw).to_string()
    });
    (format!("http://{addr}"), handle)
}

#[tokio::test]
async fn sends_json_with_headers_and_decodes_response() {
    let (base, server) = serve_once(201, r#"{"id":5,"status":"SCHEDULED"}"#).await;
    let client = HttpServiceClient::new(&base, Duration::from_secs(5)).unwrap();
    let request = ServiceRequest::post("/api/appointments", json!({"doctorId": 2})).with_header("Authorization", "Bearer t0k");

    let response = assert_ok!(client.send(request).await);
    assert_eq!(response.status, 201);
    assert_eq!(response.body["id"], 5);

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/appointments HTTP/1.1"));
    assert!(raw.to_ascii_lowercase().contains("authorization: bearer t0k"));
    assert!(raw.contains(r#"{"doctorId":2}"#));
}

#[tokio::test]
async fn error_statuses_are_responses_not_errors() {
    let (base, _server) = serve_once(400, r#"{"error":"overlap"}"#).await;
    let client = HttpServiceClient::new(&base, Duration::from_secs(5)).unwrap();
    let response = client.send(ServiceRequest::post("/api/appointments", json!({}))).await.unwrap();
    assert_eq!(response.status, 400);
    assert_eq!(response.body["error"], "overlap");
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = HttpServiceClient::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = client.send(ServiceRequest::get("/api/health")).await.unwrap_err();
    assert!(matches!(err, ProbeError::Transport(_)));
}

#[tokio::test]
async fn frontend_surface_checks_routes() {
    let (base, server) = serve_once(200, "<html></html>").await;
    let surface = WebFrontendSurface::new(&base, Duration::from_secs(5)).unwrap();
    let out = surface.perform("book", &json!({})).await.unwrap();
    assert_eq!(out["route"], "/appointments/book");
    assert!(server.await.unwrap().starts_with("GET /appointments/book"));

    let (base, _server) = serve_once(404, "").await;
    let surface = WebFrontendSurface::new(&base, Duration::from_secs(5)).unwrap();
    let err = surface.perform("visit", &json!({"route": "/chat"})).await.unwrap_err();
    assert!(matches!(err, ProbeError::Transport(m) if m.contains("404")));

    assert!(matches!(surface.perform("dance", &json!({})).await, Err(ProbeError::InvalidScenario(_))));
}

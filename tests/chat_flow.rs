//! End-to-end tests for the chat relay, speech synthesis and status routes.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

use common::{memory_store, spawn_proxy, start_mock_upstream, test_config};

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn chat_reply() -> String {
    json!({
        "id": "chatcmpl-dialog",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": "Guten Tag! Wie kann ich Ihnen helfen?" },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 9, "total_tokens": 21 }
    })
    .to_string()
}

fn chat_body(session: Option<&str>) -> Value {
    let mut body = json!({
        "model": "gpt-4o-mini",
        "messages": [
            { "role": "system", "content": "Du bist Sachbearbeiter im Bürgeramt." },
            { "role": "user", "content": "Ich möchte mich ummelden." }
        ],
        "temperature": 0.7
    });
    if let Some(session) = session {
        body["sessionId"] = json!(session);
    }
    body
}

#[tokio::test]
async fn test_chat_relay_strips_session_id() {
    let upstream = start_mock_upstream(|_, _| async { (200, chat_reply()) }).await;
    let (proxy, _shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;

    let res = client()
        .post(format!("http://{}/api/chat", proxy))
        .json(&chat_body(Some("dialog-1")))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["choices"][0]["message"]["content"], "Guten Tag! Wie kann ich Ihnen helfen?");
    assert_eq!(body["usage"]["total_tokens"], 21);

    let (path, sent) = upstream.last_request().unwrap();
    assert_eq!(path, "/v1/chat/completions");
    assert!(sent.get("sessionId").is_none());
    assert_eq!(sent["model"], "gpt-4o-mini");
    assert_eq!(sent["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_chat_requires_messages() {
    let upstream = start_mock_upstream(|_, _| async { (200, chat_reply()) }).await;
    let (proxy, _shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;

    let res = client()
        .post(format!("http://{}/api/chat", proxy))
        .json(&json!({ "model": "gpt-4o-mini", "sessionId": "x" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "messages");
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_chat_burst_is_rate_limited() {
    let upstream = start_mock_upstream(|_, _| async { (200, chat_reply()) }).await;
    let (proxy, _shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;
    let url = format!("http://{}/api/chat", proxy);

    let first = client().post(&url).json(&chat_body(Some("burst"))).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = client().post(&url).json(&chat_body(Some("burst"))).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["retryAfter"], 2);

    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_anonymous_sessions_do_not_share_a_window() {
    let upstream = start_mock_upstream(|_, _| async { (200, chat_reply()) }).await;
    let (proxy, _shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;
    let url = format!("http://{}/api/chat", proxy);

    for _ in 0..2 {
        let res = client().post(&url).json(&chat_body(None)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_message_quota_resets_after_exhaustion() {
    let upstream = start_mock_upstream(|_, _| async { (200, chat_reply()) }).await;
    let mut config = test_config(&upstream);
    config.rate_limit.window_secs = 1;
    config.chat.message_limit = 1;
    let (proxy, _shutdown) = spawn_proxy(config, memory_store()).await;
    let url = format!("http://{}/api/chat", proxy);

    let first = client().post(&url).json(&chat_body(Some("quota"))).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let second = client().post(&url).json(&chat_body(Some("quota"))).send().await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["limitReached"], true);

    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let third = client().post(&url).json(&chat_body(Some("quota"))).send().await.unwrap();
    assert_eq!(third.status(), StatusCode::OK);

    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_chat_upstream_error_is_mirrored() {
    let upstream = start_mock_upstream(|_, _| async {
        (429, json!({ "error": { "message": "Rate limit reached for gpt-4o-mini" } }).to_string())
    })
    .await;
    let (proxy, _shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;

    let res = client()
        .post(format!("http://{}/api/chat", proxy))
        .json(&chat_body(Some("mirror")))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["details"]["error"]["message"], "Rate limit reached for gpt-4o-mini");
}

#[tokio::test]
async fn test_tts_returns_audio() {
    let upstream = start_mock_upstream(|_, _| async { (200, "ID3-fake-mp3-frames".to_string()) }).await;
    let (proxy, _shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;

    let res = client()
        .post(format!("http://{}/api/tts", proxy))
        .json(&json!({ "text": "Guten Morgen, ich habe einen Termin." }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "audio/mpeg");
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"ID3-fake-mp3-frames");

    let (path, sent) = upstream.last_request().unwrap();
    assert_eq!(path, "/v1/audio/speech");
    assert_eq!(sent["model"], "tts-1");
    assert_eq!(sent["voice"], "nova");
    assert_eq!(sent["input"], "Guten Morgen, ich habe einen Termin.");
    assert!((sent["speed"].as_f64().unwrap() - 0.95).abs() < 1e-6);
}

#[tokio::test]
async fn test_tts_honours_requested_voice() {
    let upstream = start_mock_upstream(|_, _| async { (200, "mp3".to_string()) }).await;
    let (proxy, _shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;

    let res = client()
        .post(format!("http://{}/api/tts", proxy))
        .json(&json!({ "text": "Hallo", "voice": "onyx" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let (_, sent) = upstream.last_request().unwrap();
    assert_eq!(sent["voice"], "onyx");
}

#[tokio::test]
async fn test_tts_requires_text() {
    let upstream = start_mock_upstream(|_, _| async { (200, "mp3".to_string()) }).await;
    let (proxy, _shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;

    let res = client()
        .post(format!("http://{}/api/tts", proxy))
        .json(&json!({ "voice": "nova" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["field"], "text");
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_health_and_debug() {
    let upstream = start_mock_upstream(|_, _| async { (200, String::new()) }).await;
    let (proxy, _shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;

    let health: Value = client()
        .get(format!("http://{}/api/health", proxy))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let debug: Value = client()
        .get(format!("http://{}/api/debug", proxy))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(debug["ok"], true);
    assert_eq!(debug["hasOpenAI"], true);
    assert_eq!(debug["hasUpstash"], false);
    assert_eq!(debug["rateLimitStore"], "memory");
    assert!(!debug.to_string().contains("sk-test"));

    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_wrong_method_is_json_405() {
    let upstream = start_mock_upstream(|_, _| async { (200, String::new()) }).await;
    let (proxy, _shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;

    for path in ["/api/schreiben", "/api/chat", "/api/tts"] {
        let res = client().get(format!("http://{}{}", proxy, path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Method not allowed");
    }

    let res = client()
        .post(format!("http://{}/api/health", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_shutdown_stops_the_server() {
    let upstream = start_mock_upstream(|_, _| async { (200, String::new()) }).await;
    let (proxy, shutdown) = spawn_proxy(test_config(&upstream), memory_store()).await;

    let res = client().get(format!("http://{}/api/health", proxy)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(client().get(format!("http://{}/api/health", proxy)).send().await.is_err());
}

#[tokio::test]
async fn test_stalled_upload_gets_json_504() {
    let upstream = start_mock_upstream(|_, _| async { (200, "mp3".to_string()) }).await;
    let mut config = test_config(&upstream);
    config.timeouts.request_secs = 1;
    let (proxy, _shutdown) = spawn_proxy(config, memory_store()).await;

    // Promise 100 bytes, send a few, then go quiet.
    let mut socket = TcpStream::connect(proxy).await.unwrap();
    socket
        .write_all(
            b"POST /api/tts HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"text\":",
        )
        .await
        .unwrap();

    let start = Instant::now();
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    let read = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            if String::from_utf8_lossy(&raw).contains("Request timeout") {
                break;
            }
        }
    })
    .await;
    assert!(read.is_ok(), "no response before the client gave up");

    let response = String::from_utf8_lossy(&raw).to_lowercase();
    assert!(response.starts_with("http/1.1 504"), "{}", response);
    assert!(response.contains("content-type: application/json"));
    assert!(response.contains("x-request-id"));
    assert!(String::from_utf8_lossy(&raw).contains(r#"{"error":"Request timeout"}"#));
    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(upstream.calls(), 0);
}

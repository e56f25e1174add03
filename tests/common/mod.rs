//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{body::Bytes, http::StatusCode, http::Uri, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use dtz_proxy::config::ProxyConfig;
use dtz_proxy::lifecycle::Shutdown;
use dtz_proxy::store::{CounterStore, MemoryStore};
use dtz_proxy::HttpServer;

/// A mock OpenAI endpoint that records what it was sent.
pub struct MockUpstream {
    pub addr: SocketAddr,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockUpstream {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Path and JSON body of the most recent call.
    pub fn last_request(&self) -> Option<(String, Value)> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }
}

/// Start a programmable upstream. `respond` gets the request path and body
/// and returns the status and raw response body.
pub async fn start_mock_upstream<F, Fut>(respond: F) -> MockUpstream
where
    F: Fn(String, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let (c, r) = (calls.clone(), requests.clone());
    let app = Router::new().fallback(move |uri: Uri, body: Bytes| {
        let (calls, requests, respond) = (c.clone(), r.clone(), respond.clone());
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            let path = uri.path().to_string();
            requests.lock().unwrap().push((path.clone(), json.clone()));

            let (status, body) = respond(path, json).await;
            (StatusCode::from_u16(status).unwrap(), body)
        }
    });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        addr,
        calls,
        requests,
    }
}

/// Config pointing at `upstream`, with a test key and a 2s window.
pub fn test_config(upstream: &MockUpstream) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = upstream.base_url();
    config.upstream.api_key = Some("sk-test".into());
    config.upstream.timeout_ms = 2_000;
    config
}

pub fn memory_store() -> Option<Arc<dyn CounterStore>> {
    Some(Arc::new(MemoryStore::new()))
}

/// Run the proxy on an ephemeral port. Keep the returned [`Shutdown`] alive
/// for as long as the proxy should serve.
pub async fn spawn_proxy(
    config: ProxyConfig,
    store: Option<Arc<dyn CounterStore>>,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::with_store(config, store).unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    (addr, shutdown)
}

/// An OpenAI chat completion whose message content is `content` as JSON text.
pub fn completion(content: &Value) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content.to_string() },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// A letter of exactly `words` words.
pub fn letter(words: usize) -> String {
    let mut text = String::from("Sehr");
    for i in 1..words {
        text.push_str(if i % 7 == 0 { " Termin" } else { " geehrte" });
    }
    text
}

pub fn letter_prompt() -> Value {
    json!({
        "title": "Termin absagen",
        "situation": "Sie können einen Termin beim Arzt nicht wahrnehmen.",
        "recipient": "Praxis Dr. Schmidt",
        "contentPoints": ["Grund", "neuer Termin", "Entschuldigung"]
    })
}

pub fn correction_body(text: &str, session: Option<&str>) -> Value {
    let mut body = json!({
        "text": text,
        "prompt": letter_prompt(),
        "type": "formal",
    });
    if let Some(session) = session {
        body["sessionId"] = json!(session);
    }
    body
}

/// A report the examiner model could plausibly return.
pub fn examiner_report() -> Value {
    json!({
        "corrected": "Sehr geehrte Damen und Herren, ...",
        "errors": [{
            "type": "grammar",
            "original": "ich habe gekommen",
            "corrected": "ich bin gekommen",
            "explanation": "Bewegungsverben bilden das Perfekt mit sein."
        }],
        "score": { "content": 4, "communication": 4, "accuracy": 3, "total": 11 },
        "contentPoints": [true, false, true],
        "feedback": {
            "strengths": ["Klare Struktur"],
            "improvements": ["Perfekt mit sein"],
            "suggestions": ["Mehr Konnektoren"]
        }
    })
}

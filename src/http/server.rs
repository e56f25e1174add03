//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the counter store, limiters and upstream client
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, CORS, body limit, deadline, metrics)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request, State},
    http::{HeaderValue, Method},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{ListenerConfig, ProxyConfig, StoreKind};
use crate::http::handlers::{chat, schreiben, status, tts};
use crate::http::request::{self, RequestIdExt};
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::resilience::with_deadline;
use crate::security::{MessageQuota, RateLimiter};
use crate::store::{self, CounterStore, MemoryStore, StoreError};
use crate::upstream::{UpstreamClient, UpstreamError};

/// Errors while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("counter store: {0}")]
    Store(#[from] StoreError),

    #[error("upstream client: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub upstream: UpstreamClient,
    pub schreiben_limiter: RateLimiter,
    pub chat_limiter: RateLimiter,
    pub chat_quota: MessageQuota,
    pub store_name: Option<&'static str>,
}

impl AppState {
    pub fn new(config: ProxyConfig, store: Option<Arc<dyn CounterStore>>) -> Result<Self, ServerError> {
        let upstream = UpstreamClient::new(&config.upstream)?;
        let window = Duration::from_secs(config.rate_limit.window_secs);

        Ok(Self {
            upstream,
            schreiben_limiter: RateLimiter::new(store.clone(), "schreiben", window),
            chat_limiter: RateLimiter::new(store.clone(), "chat", window),
            chat_quota: MessageQuota::new(
                store.clone(),
                "chat",
                config.chat.message_limit,
                Duration::from_secs(config.chat.session_ttl_secs),
            ),
            store_name: store.as_ref().map(|s| s.name()),
            config: Arc::new(config),
        })
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ProxyConfig>,
    sweeper: Option<MemoryStore>,
}

impl HttpServer {
    /// Create a server with the counter store named in the configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let memory = (config.rate_limit.store == StoreKind::Memory).then(MemoryStore::new);
        let store = match &memory {
            Some(m) => Some(Arc::new(m.clone()) as Arc<dyn CounterStore>),
            None => store::from_config(&config.rate_limit)?,
        };

        let mut server = Self::with_store(config, store)?;
        server.sweeper = memory;
        Ok(server)
    }

    /// Create a server around an explicit counter store (`None` disables
    /// rate limiting).
    pub fn with_store(config: ProxyConfig, store: Option<Arc<dyn CounterStore>>) -> Result<Self, ServerError> {
        match store.as_ref() {
            Some(s) => tracing::info!(
                store = s.name(),
                window_secs = config.rate_limit.window_secs,
                "Rate limiting enabled"
            ),
            None => tracing::warn!("No counter store configured, rate limiting disabled"),
        }

        let state = AppState::new(config, store)?;
        if !state.upstream.has_credentials() {
            tracing::warn!("OPENAI_API_KEY not set, upstream endpoints will answer 500");
        }

        let config = state.config.clone();
        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            sweeper: None,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/health", get(status::health).fallback(status::method_not_allowed))
            .route("/api/debug", get(status::debug).fallback(status::method_not_allowed))
            .route(
                "/api/schreiben",
                post(schreiben::correct_letter).fallback(status::method_not_allowed),
            )
            .route(
                "/api/schreiben/correct",
                post(schreiben::correct_letter).fallback(status::method_not_allowed),
            )
            .route("/api/chat", post(chat::relay_chat).fallback(status::method_not_allowed))
            .route("/api/tts", post(tts::synthesize).fallback(status::method_not_allowed))
            .with_state(state)
            .layer(middleware::from_fn(track_requests))
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(request::set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(request::propagate_request_id_layer())
                    .layer(cors_layer(&config.listener))
                    .layer(middleware::from_fn_with_state(
                        Duration::from_secs(config.timeouts.request_secs),
                        enforce_deadline,
                    )),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(memory) = self.sweeper.clone() {
            let interval = Duration::from_secs(self.config.rate_limit.sweep_interval_secs);
            let sweeper_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                memory.run_sweeper(interval, sweeper_shutdown).await;
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

fn cors_layer(config: &ListenerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Answer 504 once a request outlives `deadline`, body upload included.
async fn enforce_deadline(State(deadline): State<Duration>, request: Request, next: Next) -> Response {
    let request_id = request.headers().request_id().to_string();
    let path = request.uri().path().to_string();

    match with_deadline(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(request_id = %request_id, path = %path, ?deadline, "Request deadline exceeded");
            ApiError::RequestTimeout(deadline).into_response()
        }
    }
}

/// Record count and latency per matched route.
async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&route, response.status().as_u16(), start);
    response
}

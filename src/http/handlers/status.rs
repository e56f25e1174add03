//! `GET /api/health`, `GET /api/debug` and the JSON 405 fallback.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
}

/// Presence of credentials only, never their values.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugStatus {
    pub ok: bool,
    #[serde(rename = "hasOpenAI")]
    pub has_openai: bool,
    pub has_upstash: bool,
    pub rate_limit_store: Option<&'static str>,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        message: "DTZ proxy running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn debug(State(state): State<AppState>) -> Json<DebugStatus> {
    Json(DebugStatus {
        ok: true,
        has_openai: state.upstream.has_credentials(),
        has_upstash: state.config.rate_limit.has_upstash(),
        rate_limit_store: state.store_name,
    })
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

//! `POST /api/tts`: text-to-speech relay.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::request::RequestIdExt;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::http::validation::{optional_text, parse_object, require_text};
use crate::upstream::SpeechRequest;

pub async fn synthesize(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request_id = headers.request_id();

    let body = parse_object(&body)?;
    let text = require_text(&body, "text")?;
    let voice = optional_text(&body, "voice")?.unwrap_or(state.config.speech.default_voice.as_str());

    tracing::info!(request_id = %request_id, chars = text.chars().count(), voice, "TTS requested");

    let request = SpeechRequest {
        model: state.config.speech.model.clone(),
        voice: voice.to_string(),
        input: text.to_string(),
        speed: state.config.speech.speed,
    };

    let audio = state.upstream.speech(&request).await.map_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "TTS upstream call failed");
        ApiError::from(e)
    })?;

    tracing::info!(request_id = %request_id, bytes = audio.len(), "TTS audio ready");

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "audio/mpeg")], Body::from(audio)).into_response())
}

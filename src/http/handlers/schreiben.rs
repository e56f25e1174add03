//! `POST /api/schreiben` and `/api/schreiben/correct`.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};

use crate::http::request::RequestIdExt;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::http::validation::parse_object;
use crate::schreiben::{prompt, validate_correction, CorrectionReport, CorrectionResponse};
use crate::security::{Decision, SessionId};

/// Validate, rate limit, then ask the examiner model for a correction.
pub async fn correct_letter(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CorrectionResponse>, ApiError> {
    let request_id = headers.request_id();

    let body = parse_object(&body)?;
    let request = validate_correction(&body, state.config.schreiben.min_words)?;
    let session = SessionId::resolve(request.session_id.as_deref());

    tracing::info!(
        request_id = %request_id,
        session = %session,
        word_count = request.word_count,
        letter_type = request.letter_type.as_str(),
        "Correction requested"
    );

    if let Decision::Rejected { retry_after_secs } =
        state.schreiben_limiter.check_and_increment(&session).await
    {
        return Err(ApiError::RateLimitExceeded { retry_after_secs });
    }

    let completion = prompt::completion_request(&request, &state.config.schreiben);
    let report: CorrectionReport = state.upstream.complete_json(&completion).await.map_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "Correction upstream call failed");
        ApiError::from(e)
    })?;

    tracing::info!(
        request_id = %request_id,
        total = %report.score.total,
        errors = report.errors.len(),
        "Correction completed"
    );

    Ok(Json(CorrectionResponse::new(request, report)))
}

//! POST /api/analyze-cv

use axum::{
    extract::{rejection::BytesRejection, State},
    http::HeaderMap,
    Json,
};
use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::analysis::AnalysisResult;
use crate::persistence::{record_in_background, Submission};
use crate::state::AppState;
use crate::validation::{body_rejection, client_identifier, disallowed_origin, parse_request};

/// POST /api/analyze-cv
///
/// Rate limit → origin (logged only) → credential → body → one model call.
/// The submission log, when configured, runs after the response is decided.
pub async fn handle_analyze_cv(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let client = client_identifier(&headers);

    if !state.rate_limiter.allow(&client).await {
        return Err(AppError::RateLimited);
    }

    if let Some(origin) = disallowed_origin(&headers, &state.allowed_origins) {
        warn!("Request from unauthorized origin: {origin} (client: {client})");
    }

    if !state.analyzer.is_configured() {
        return Err(AppError::Configuration(
            "GEMINI_API_KEY not configured".to_string(),
        ));
    }

    let body = body.map_err(body_rejection)?;
    let request = parse_request(&body)?;

    let result = state.analyzer.analyze(&request.payload).await?;

    info!(
        "CV analyzed successfully for client: {client}, name: {}, payload: {} bytes",
        result.cv_data.full_name,
        request.payload.encoded_len()
    );

    if let Some(sink) = &state.sink {
        record_in_background(
            sink.clone(),
            Submission::new(&result, request.payload, request.file_name),
        );
    }

    Ok(Json(result))
}

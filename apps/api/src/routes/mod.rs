pub mod analyze;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::state::AppState;
use crate::validation::MAX_FILE_DATA_LEN;

/// Request body ceiling. Above the `fileData` limit so oversized payloads get
/// the endpoint's own 400 instead of a bare 413.
const MAX_BODY_BYTES: usize = MAX_FILE_DATA_LEN + 6 * 1024 * 1024;

async fn method_not_allowed() -> Result<(), AppError> {
    Err(AppError::MethodNotAllowed)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/analyze-cv",
            post(analyze::handle_analyze_cv).fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

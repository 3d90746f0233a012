use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::persistence::SubmissionSink;
use crate::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Direct Gemini orchestrator in production; swapped for fakes in tests.
    pub analyzer: Arc<dyn Analyzer>,
    /// In-process sliding window by default, Redis when `REDIS_URL` is set.
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Present only when both Postgres and S3 are configured.
    pub sink: Option<Arc<dyn SubmissionSink>>,
    /// Precomputed from `Config::allowed_origins`.
    pub allowed_origins: Arc<Vec<String>>,
}

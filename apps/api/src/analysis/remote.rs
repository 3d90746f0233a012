//! Call-through-backend binding: sends the payload to a running `/api/analyze-cv`
//! endpoint instead of calling Gemini directly. The reply is validated against the
//! same response schema as direct calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::orchestrator::parse_analysis;
use crate::analysis::{AnalysisError, Analyzer};
use crate::encoding::EncodedPayload;
use crate::models::analysis::AnalysisResult;

pub const ANALYZE_PATH: &str = "/api/analyze-cv";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeBody<'a> {
    file_data: &'a str,
    mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct RemoteAnalyzer {
    client: Client,
    endpoint: String,
}

impl RemoteAnalyzer {
    /// `base_url` may be the server root (`http://host:8080`) or the full endpoint URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: endpoint_url(base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn endpoint_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with(ANALYZE_PATH) {
        base.to_string()
    } else {
        format!("{base}{ANALYZE_PATH}")
    }
}

#[async_trait]
impl Analyzer for RemoteAnalyzer {
    async fn analyze(&self, payload: &EncodedPayload) -> Result<AnalysisResult, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeBody {
                file_data: payload.data(),
                mime_type: payload.media_type(),
                file_name: payload.file_name(),
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("Server error: {}", status.as_u16()));
            return Err(AnalysisError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        debug!(endpoint = %self.endpoint, bytes = body.len(), "Backend analysis received");
        parse_analysis(&body)
    }
}

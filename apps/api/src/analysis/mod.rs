// CV analysis: the response contract, the prompt, and the two transport bindings.
// Gemini calls go through llm_client only; the remote binding calls our own endpoint.

pub mod orchestrator;
pub mod prompts;
pub mod remote;
pub mod schema;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use thiserror::Error;

use crate::encoding::EncodedPayload;
use crate::llm_client::LlmError;
use crate::models::analysis::AnalysisResult;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Analysis service is not configured: {0}")]
    Configuration(String),

    #[error("Model call failed: {0}")]
    Model(LlmError),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Response does not match the analysis schema: {0}")]
    Schema(String),

    #[error("Backend rejected the analysis (status {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<LlmError> for AnalysisError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => AnalysisError::Configuration(err.to_string()),
            LlmError::EmptyContent => AnalysisError::EmptyResponse,
            other => AnalysisError::Model(other),
        }
    }
}

/// One analysis interface, several transports. Carried in `AppState` as `Arc<dyn Analyzer>`.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// False when the transport lacks the credential or endpoint it needs.
    fn is_configured(&self) -> bool {
        true
    }

    /// Runs exactly one analysis round trip for the payload.
    async fn analyze(&self, payload: &EncodedPayload) -> Result<AnalysisResult, AnalysisError>;
}

//! Analysis Orchestrator, the direct binding: one schema-constrained Gemini call per CV.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::analysis::prompts::ANALYSIS_INSTRUCTION;
use crate::analysis::schema::{validate_response, MODEL_SCHEMA};
use crate::analysis::{AnalysisError, Analyzer};
use crate::encoding::EncodedPayload;
use crate::llm_client::{strip_json_fences, GenerativeModel, StructuredRequest};
use crate::models::analysis::AnalysisResult;

pub struct Orchestrator {
    model: Arc<dyn GenerativeModel>,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Analyzer for Orchestrator {
    fn is_configured(&self) -> bool {
        self.model.is_configured()
    }

    async fn analyze(&self, payload: &EncodedPayload) -> Result<AnalysisResult, AnalysisError> {
        if !self.model.is_configured() {
            return Err(AnalysisError::Configuration(
                "GEMINI_API_KEY is not configured".to_string(),
            ));
        }

        let request = StructuredRequest {
            instruction: ANALYSIS_INSTRUCTION,
            media_type: payload.media_type(),
            data: payload.data(),
            schema: &MODEL_SCHEMA,
        };

        let text = self.model.generate_json(request).await?;
        let result = parse_analysis(&text)?;

        info!(candidate = %result.cv_data.full_name, "CV analysis completed");
        Ok(result)
    }
}

/// Parses model (or backend) output at the trust boundary:
/// JSON syntax, then the response schema, then the typed model.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(text)?;
    validate_response(&value).map_err(AnalysisError::Schema)?;

    let mut result: AnalysisResult = serde_json::from_value(value)?;

    let reported = result.ranking.nivel;
    if result.ranking.reconcile_nivel() {
        warn!(
            score = result.ranking.score,
            reported = reported.label(),
            corrected = result.ranking.nivel.label(),
            "Model nivel disagrees with score band"
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{sample_payload, sample_response, FakeModel};
    use crate::models::analysis::{Nivel, PerfilInteres};

    #[tokio::test]
    async fn test_analyze_makes_exactly_one_model_call() {
        let model = Arc::new(FakeModel::replying(sample_response()));
        let orchestrator = Orchestrator::new(model.clone());

        let result = orchestrator.analyze(&sample_payload()).await.unwrap();

        assert_eq!(model.calls(), 1);
        assert_eq!(result.cv_data.full_name, "Lucía Fernández");
        assert!(PerfilInteres::ALL.contains(&result.tracking.perfil_interes));
    }

    #[tokio::test]
    async fn test_request_carries_instruction_payload_and_schema() {
        let model = Arc::new(FakeModel::replying(sample_response()));
        let orchestrator = Orchestrator::new(model.clone());

        orchestrator.analyze(&sample_payload()).await.unwrap();

        let seen = model.last_request().unwrap();
        assert_eq!(seen.instruction, ANALYSIS_INSTRUCTION);
        assert_eq!(seen.media_type, "application/pdf");
        assert_eq!(seen.data, sample_payload().data());
        assert_eq!(seen.schema, *MODEL_SCHEMA);
    }

    #[tokio::test]
    async fn test_unconfigured_model_is_never_called() {
        let model = Arc::new(FakeModel::unconfigured());
        let orchestrator = Orchestrator::new(model.clone());

        let err = orchestrator.analyze(&sample_payload()).await.unwrap_err();

        assert!(matches!(err, AnalysisError::Configuration(_)));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_surfaces_as_model_error() {
        let model = Arc::new(FakeModel::failing(503));
        let orchestrator = Orchestrator::new(model.clone());

        let err = orchestrator.analyze(&sample_payload()).await.unwrap_err();

        assert!(matches!(err, AnalysisError::Model(_)));
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn test_parse_rejects_empty_response() {
        assert!(matches!(parse_analysis("   "), Err(AnalysisError::EmptyResponse)));
        assert!(matches!(parse_analysis("```json\n```"), Err(AnalysisError::EmptyResponse)));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(matches!(
            parse_analysis("{\"feedback\": "),
            Err(AnalysisError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_schema_violation() {
        let err = parse_analysis(r#"{"feedback": {}, "cvData": {}}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(_)));
    }

    #[test]
    fn test_parse_accepts_fenced_json() {
        let fenced = format!("```json\n{}\n```", sample_response());
        let result = parse_analysis(&fenced).unwrap();
        assert_eq!(result.tracking.ciudad, "Córdoba");
    }

    #[test]
    fn test_parse_corrects_nivel_to_score_band() {
        let mut value: Value = serde_json::from_str(&sample_response()).unwrap();
        value["ranking"]["score"] = serde_json::json!(70);
        value["ranking"]["nivel"] = serde_json::json!("💎 Excepcional");

        let result = parse_analysis(&value.to_string()).unwrap();

        assert_eq!(result.ranking.score, 70.0);
        assert_eq!(result.ranking.nivel, Nivel::Competitivo);
    }
}

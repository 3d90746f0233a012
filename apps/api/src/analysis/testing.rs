//! Test doubles and fixtures shared by the analysis, route and session tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::encoding::{EncodedPayload, PDF_MEDIA_TYPE};
use crate::llm_client::{GenerativeModel, LlmError, StructuredRequest};
use crate::models::analysis::AnalysisResult;
use crate::persistence::{PersistenceError, Submission, SubmissionSink};

/// A complete, schema-valid model response.
pub const SAMPLE_RESPONSE: &str = r#"{
    "feedback": {
        "strengths": ["Experiencia sólida en análisis de datos", "Logros cuantificados"],
        "improvements": ["Agregar un resumen profesional más concreto", "Unificar el formato de fechas"],
        "actionPlan": ["Reescribir el resumen en tres líneas", "Listar herramientas por nivel"],
        "conclusion": "Tu CV tiene una base muy buena; con algunos ajustes vas a destacar."
    },
    "cvData": {
        "fullName": "Lucía Fernández",
        "contactInfo": {
            "email": "lucia.fernandez@example.com",
            "linkedin": "linkedin.com/in/luciafernandez",
            "location": "Córdoba, Argentina"
        },
        "professionalSummary": "Analista de datos con 5 años de experiencia en retail.",
        "experience": [
            {
                "role": "Analista de Datos",
                "company": "Comercial Andina",
                "dates": "2021 - Actualidad",
                "description": ["Automatizó reportes semanales reduciendo 10 horas de trabajo manual"]
            }
        ],
        "education": [
            {"degree": "Licenciatura en Economía", "institution": "Universidad Nacional de Córdoba", "year": "2019"}
        ],
        "skills": ["SQL", "Python", "Power BI"],
        "languages": ["Español", "Inglés"]
    },
    "tracking": {
        "perfilInteres": "Alto",
        "ciudad": "Córdoba",
        "pais": "Argentina",
        "puestosAfines": ["Data Analyst", "BI Analyst", "Analytics Engineer"]
    },
    "ranking": {
        "score": 72,
        "nivel": "✨ Competitivo",
        "mensaje": "Estás en un nivel competitivo. Sumá métricas de impacto para llegar a Destacado."
    }
}"#;

pub fn sample_response() -> String {
    SAMPLE_RESPONSE.to_string()
}

pub fn sample_result() -> AnalysisResult {
    serde_json::from_str(SAMPLE_RESPONSE).expect("sample response to deserialize")
}

/// Raw bytes behind `sample_payload`.
pub const SAMPLE_PDF: &[u8] = b"%PDF-1.4\n%test";

/// Writes `SAMPLE_PDF` to a fresh file in the temp directory.
pub async fn write_sample_pdf() -> PathBuf {
    let path = std::env::temp_dir().join(format!("cv-analyzer-{}.pdf", uuid::Uuid::new_v4()));
    tokio::fs::write(&path, SAMPLE_PDF).await.unwrap();
    path
}

pub fn sample_payload() -> EncodedPayload {
    // "%PDF-1.4\n%test"
    EncodedPayload::new("JVBERi0xLjQKJXRlc3Q=", PDF_MEDIA_TYPE)
}

/// What a `FakeModel` saw on its last call.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub instruction: String,
    pub media_type: String,
    pub data: String,
    pub schema: Value,
}

enum Reply {
    Text(String),
    Status(u16),
}

/// In-memory `GenerativeModel` that counts calls and replays a canned reply.
pub struct FakeModel {
    reply: Reply,
    configured: bool,
    calls: AtomicUsize,
    last: Mutex<Option<SeenRequest>>,
}

impl FakeModel {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Reply::Text(text.into()),
            configured: true,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Reply::Status(status),
            ..Self::replying("")
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::replying(SAMPLE_RESPONSE)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SeenRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate_json(&self, request: StructuredRequest<'_>) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(SeenRequest {
            instruction: request.instruction.to_string(),
            media_type: request.media_type.to_string(),
            data: request.data.to_string(),
            schema: request.schema.clone(),
        });
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Status(status) => Err(LlmError::Api {
                status: *status,
                message: "upstream unavailable".to_string(),
            }),
        }
    }
}

/// `SubmissionSink` that keeps what it receives, or fails every write.
pub struct RecordingSink {
    fail: bool,
    attempts: AtomicUsize,
    recorded: Mutex<Vec<Submission>>,
}

impl RecordingSink {
    pub fn recording() -> Self {
        Self {
            fail: false,
            attempts: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::recording()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<Submission> {
        self.recorded.lock().unwrap().clone()
    }

    /// Background writes land after the response; poll until `n` have been attempted.
    pub async fn wait_for_attempts(&self, n: usize) {
        for _ in 0..200 {
            if self.attempts() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {n} sink attempts, saw {}", self.attempts());
    }
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    async fn record(&self, submission: Submission) -> Result<(), PersistenceError> {
        if self.fail {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            return Err(PersistenceError::Storage("bucket unavailable".to_string()));
        }
        self.recorded.lock().unwrap().push(submission);
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

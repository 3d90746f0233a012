use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::analysis::AnalysisResult;

/// Flattened subset of an analysis handed to the persistence sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub location: Option<String>,
    pub perfil_interes: String,
    pub ciudad: String,
    pub pais: String,
    pub puestos_afines: Vec<String>,
    pub score: f64,
    pub nivel: String,
}

impl SubmissionSummary {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let contact = result.cv_data.contact_info.clone().unwrap_or_default();
        Self {
            full_name: result.cv_data.full_name.clone(),
            email: contact.email,
            phone: contact.phone,
            linkedin: contact.linkedin,
            location: contact.location,
            perfil_interes: result.tracking.perfil_interes.as_str().to_string(),
            ciudad: result.tracking.ciudad.clone(),
            pais: result.tracking.pais.clone(),
            puestos_afines: result.tracking.puestos_afines.clone(),
            score: result.ranking.score,
            nivel: result.ranking.nivel.label().to_string(),
        }
    }
}

/// Row stored in `cv_submissions`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub location: Option<String>,
    pub perfil_interes: String,
    pub ciudad: String,
    pub pais: String,
    pub puestos_afines: Vec<String>,
    pub score: f64,
    pub nivel: String,
    pub file_name: String,
    pub s3_key: String,
    pub created_at: DateTime<Utc>,
}

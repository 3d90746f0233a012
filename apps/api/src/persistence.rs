//! Optional submission log: the original CV goes to S3, a flattened summary to Postgres.
//!
//! Recording is fire-and-forget. Nothing here may affect the HTTP response; every
//! failure ends as a `warn!` line.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use sqlx::PgPool;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::encoding::{EncodedPayload, EncodingError};
use crate::models::analysis::AnalysisResult;
use crate::models::submission::{SubmissionRow, SubmissionSummary};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("S3 error: {0}")]
    Storage(String),

    #[error("Could not recover original file: {0}")]
    Encoding(#[from] EncodingError),
}

/// Everything the sink receives for one successful analysis.
#[derive(Debug, Clone)]
pub struct Submission {
    pub summary: SubmissionSummary,
    pub payload: EncodedPayload,
    pub file_name: String,
}

impl Submission {
    pub fn new(result: &AnalysisResult, payload: EncodedPayload, file_name: String) -> Self {
        Self {
            summary: SubmissionSummary::from_result(result),
            payload,
            file_name,
        }
    }
}

#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn record(&self, submission: Submission) -> Result<(), PersistenceError>;
}

/// Records a submission in the background; failures are logged and dropped.
pub fn record_in_background(sink: Arc<dyn SubmissionSink>, submission: Submission) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = sink.record(submission).await {
            warn!("Failed to record CV submission: {e}");
        }
    })
}

pub struct PostgresS3Sink {
    pool: PgPool,
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl PostgresS3Sink {
    pub fn new(pool: PgPool, s3: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { pool, s3, bucket }
    }
}

#[async_trait]
impl SubmissionSink for PostgresS3Sink {
    async fn record(&self, submission: Submission) -> Result<(), PersistenceError> {
        let Submission {
            summary,
            payload,
            file_name,
        } = submission;

        let id = Uuid::new_v4();
        let bytes = payload.decode()?;
        let s3_key = object_key(id, &file_name);

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&s3_key)
            .body(ByteStream::from(bytes))
            .content_type(payload.media_type())
            .send()
            .await
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;

        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO cv_submissions
                (id, full_name, email, phone, linkedin, location, perfil_interes,
                 ciudad, pais, puestos_afines, score, nivel, file_name, s3_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&summary.full_name)
        .bind(&summary.email)
        .bind(&summary.phone)
        .bind(&summary.linkedin)
        .bind(&summary.location)
        .bind(&summary.perfil_interes)
        .bind(&summary.ciudad)
        .bind(&summary.pais)
        .bind(&summary.puestos_afines)
        .bind(summary.score)
        .bind(&summary.nivel)
        .bind(&file_name)
        .bind(&s3_key)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Recorded CV submission {} (s3://{}/{}) at {}",
            row.id, self.bucket, row.s3_key, row.created_at
        );
        Ok(())
    }
}

/// `cv-submissions/<id>/<file name>`, with path separators removed from the name.
fn object_key(id: Uuid, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("cv-submissions/{id}/{safe}")
}

//! Client-side state for one upload-and-analyze flow.
//!
//! Idle → Analyzing on file selection, Analyzing → Success | Error when the
//! analysis settles, Success | Error → Idle on reset. A new selection is only
//! accepted from Idle.

use std::path::Path;

use thiserror::Error;
use tracing::error;

use crate::analysis::Analyzer;
use crate::encoding::UploadedFile;
use crate::models::analysis::AnalysisResult;

/// Shown to the user whenever an analysis fails, whatever the cause.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Hubo un error al analizar el CV. Por favor, probá de nuevo. \
     Asegurate de que el archivo sea un PDF o texto legible.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Analyzing,
    Success,
    Error,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("An analysis is already in progress")]
    Busy,

    #[error("Reset the previous result before analyzing another file")]
    NotIdle,
}

#[derive(Debug)]
pub struct AnalysisSession {
    phase: Phase,
    result: Option<AnalysisResult>,
    error: Option<String>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            result: None,
            error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// File selection is disabled while an analysis is in flight.
    pub fn accepts_selection(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Idle → Analyzing.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Analyzing;
                self.error = None;
                Ok(())
            }
            Phase::Analyzing => Err(SessionError::Busy),
            Phase::Success | Phase::Error => Err(SessionError::NotIdle),
        }
    }

    /// Analyzing → Success | Error. The raw failure is logged, never stored.
    /// Ignored unless an analysis is in flight.
    pub fn settle<E: std::fmt::Display>(&mut self, outcome: Result<AnalysisResult, E>) {
        if self.phase != Phase::Analyzing {
            return;
        }
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.phase = Phase::Success;
            }
            Err(e) => {
                error!("CV analysis failed: {e}");
                self.result = None;
                self.error = Some(ANALYSIS_FAILED_MESSAGE.to_string());
                self.phase = Phase::Error;
            }
        }
    }

    /// Back to Idle, clearing the previous result and error.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.result = None;
        self.error = None;
    }

    /// Runs a full selection: read and encode the file, analyze it once, settle
    /// the state. A file that cannot be read settles to Error like any other failure.
    pub async fn submit(
        &mut self,
        path: &Path,
        analyzer: &dyn Analyzer,
    ) -> Result<Phase, SessionError> {
        self.begin()?;
        match UploadedFile::read(path).await {
            Ok(file) => {
                let payload = file.encode();
                let outcome = analyzer.analyze(&payload).await;
                self.settle(outcome);
            }
            Err(e) => self.settle(Err::<AnalysisResult, _>(e)),
        }
        Ok(self.phase)
    }
}

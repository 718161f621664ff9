use thiserror::Error;

use crate::core::process::ProcessError;
use crate::download::gallery_dl_errors::GalleryDlErrorType;

/// Structured error type for the extraction step.
///
/// Carries enough of gallery-dl's own report (exit status, classified type,
/// stderr excerpt) that callers never need to re-run the tool to debug.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// gallery-dl is not installed or not on PATH
    #[error("gallery-dl binary not found: {0}")]
    BinaryNotFound(String),

    /// Spawning or waiting on the process failed
    #[error("{0}")]
    Process(String),

    #[error("gallery-dl timed out after {0}s")]
    TimedOut(u64),

    /// Non-zero exit status
    #[error("gallery-dl failed ({kind}, exit code {}): {stderr}", code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
    Failed {
        code: Option<i32>,
        kind: GalleryDlErrorType,
        stderr: String,
    },

    /// Output could not be read as gallery-dl JSON
    #[error("unreadable gallery-dl output: {0}")]
    InvalidOutput(String),

    /// The tool succeeded but produced no items (usually private content)
    #[error("no content returned; the content may be private or require login")]
    NoContent,
}

impl ExtractionError {
    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            ExtractionError::BinaryNotFound(_) => "binary_not_found",
            ExtractionError::Process(_) => "process",
            ExtractionError::TimedOut(_) => "timeout",
            ExtractionError::Failed { .. } => "failed",
            ExtractionError::InvalidOutput(_) => "invalid_output",
            ExtractionError::NoContent => "no_content",
        }
    }

    /// True when the content most likely exists but needs an authenticated session.
    pub fn is_private_content(&self) -> bool {
        match self {
            ExtractionError::NoContent => true,
            ExtractionError::Failed { kind, .. } => kind.is_private_content(),
            _ => false,
        }
    }
}

impl From<ProcessError> for ExtractionError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::NotFound(program) => ExtractionError::BinaryNotFound(program),
            ProcessError::TimedOut { timeout, .. } => ExtractionError::TimedOut(timeout.as_secs()),
            other @ ProcessError::Io { .. } => ExtractionError::Process(other.to_string()),
        }
    }
}

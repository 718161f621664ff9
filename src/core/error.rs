use std::fmt;
use thiserror::Error;

use crate::conversion::TranscodeError;
use crate::core::validation::ValidationError;
use crate::download::error::ExtractionError;
use crate::download::normalizer::NormalizeError;

/// Pipeline stage an error originated from.
///
/// Most failures come from tools outside this crate, so every error names the
/// step that was running when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    UrlValidation,
    Extraction,
    Normalization,
    Thumbnail,
    Transcoding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Setup => write!(f, "setup"),
            Stage::UrlValidation => write!(f, "url validation"),
            Stage::Extraction => write!(f, "extraction"),
            Stage::Normalization => write!(f, "normalization"),
            Stage::Thumbnail => write!(f, "thumbnail"),
            Stage::Transcoding => write!(f, "transcoding"),
        }
    }
}

/// Centralized error type for the library
///
/// Every public operation returns this enum. Each variant maps to exactly one
/// [`Stage`]; the display text starts with the stage name.
///
/// # Example
///
/// ```no_run
/// use igdora::core::error::AppError;
///
/// fn report(err: &AppError) {
///     eprintln!("{} failed: {}", err.stage(), err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// URL is malformed or not an Instagram content URL (checked before extraction)
    #[error("url validation: {0}")]
    InvalidUrl(#[from] ValidationError),

    /// gallery-dl failed (network, auth, not found, rate limit, timeout)
    #[error("extraction: {0}")]
    Extraction(#[from] ExtractionError),

    /// Raw items could not be merged into one record
    #[error("normalization: {0}")]
    Normalize(#[from] NormalizeError),

    /// ffmpeg failed
    #[error("transcoding: {0}")]
    Transcode(#[from] TranscodeError),

    /// Thumbnail HTTP fetch failed
    #[error("thumbnail: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP status code errors from the thumbnail fetch
    #[error("thumbnail: request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    /// Invalid configuration (proxy, paths)
    #[error("setup: {0}")]
    Config(String),

    /// IO errors outside of the external tools (session dirs, copies)
    #[error("setup: IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing a record as JSON failed
    #[error("setup: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Stage the error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            AppError::InvalidUrl(_) => Stage::UrlValidation,
            AppError::Extraction(_) => Stage::Extraction,
            AppError::Normalize(_) => Stage::Normalization,
            AppError::Transcode(_) => Stage::Transcoding,
            AppError::Http(_) | AppError::HttpStatus(_) => Stage::Thumbnail,
            AppError::Config(_) | AppError::Io(_) | AppError::Json(_) => Stage::Setup,
        }
    }

    /// True for `MalformedBatch` normalization failures.
    pub fn is_malformed_batch(&self) -> bool {
        matches!(self, AppError::Normalize(NormalizeError::MalformedBatch(_)))
    }

    /// True for `UnknownContentType` normalization failures.
    pub fn is_unknown_content_type(&self) -> bool {
        matches!(self, AppError::Normalize(NormalizeError::UnknownContentType(_)))
    }
}

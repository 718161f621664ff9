//! Media conversion through ffmpeg.
//!
//! Only one conversion exists: re-encoding downloaded videos to a widely
//! playable H.264/AAC MP4. Decoding and encoding are ffmpeg's job; this module
//! builds the command line and reports failures.

pub mod video;

use std::path::Path;
use thiserror::Error;

use crate::core::process::ProcessError;

pub use video::{TranscodeOptions, Transcoder};

/// Errors that can occur during transcoding
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("ffmpeg binary not found: {0}")]
    BinaryNotFound(String),

    #[error("FFmpeg error (exit code {code:?}): {stderr}")]
    FfmpegError { code: Option<i32>, stderr: String },

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Output creation failed: {0}")]
    OutputFailed(String),

    #[error("ffmpeg timed out after {0}s")]
    TimedOut(u64),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type TranscodeResult<T> = Result<T, TranscodeError>;

impl From<ProcessError> for TranscodeError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::NotFound(program) => TranscodeError::BinaryNotFound(program),
            ProcessError::TimedOut { timeout, .. } => TranscodeError::TimedOut(timeout.as_secs()),
            ProcessError::Io { source, .. } => TranscodeError::IoError(source),
        }
    }
}

/// Check if ffmpeg is available
pub async fn check_ffmpeg(binary: &str) -> bool {
    tokio::process::Command::new(binary)
        .arg("-version")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Get file size in bytes
pub async fn get_file_size<P: AsRef<Path>>(path: P) -> TranscodeResult<u64> {
    let metadata = tokio::fs::metadata(path).await?;
    Ok(metadata.len())
}

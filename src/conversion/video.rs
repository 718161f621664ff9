//! Video re-encoding
//!
//! Instagram serves reels in encodings some players choke on. `Transcoder`
//! re-encodes them to H.264/AAC with the moov atom up front.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use super::{TranscodeError, TranscodeResult};
use crate::core::config::{self, DownloaderConfig};
use crate::core::process::{run_with_timeout, stderr_excerpt};

/// Suffix placed before `.mp4` on transcoder outputs
pub const CONVERTED_SUFFIX: &str = "converted";

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOptions {
    pub video_codec: String,
    /// Constant Rate Factor (quality)
    pub crf: u8,
    /// Encoding speed/compression ratio
    pub preset: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// `-movflags +faststart` for progressive playback
    pub faststart: bool,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            crf: 23,
            preset: "medium".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
            faststart: true,
        }
    }
}

/// `dir/clip.mp4` -> `dir/clip.converted.mp4`
pub fn converted_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    input.with_file_name(format!("{}.{}.mp4", stem, CONVERTED_SUFFIX))
}

/// ffmpeg arguments (without the binary). Always overwrites the output.
pub fn build_ffmpeg_args(input: &Path, output: &Path, options: &TranscodeOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        input.as_os_str().to_os_string(),
        "-c:v".into(),
        options.video_codec.clone().into(),
        "-crf".into(),
        options.crf.to_string().into(),
        "-preset".into(),
        options.preset.clone().into(),
        "-c:a".into(),
        options.audio_codec.clone().into(),
        "-b:a".into(),
        options.audio_bitrate.clone().into(),
    ];
    if options.faststart {
        args.push("-movflags".into());
        args.push("+faststart".into());
    }
    args.push("-y".into());
    args.push(output.as_os_str().to_os_string());
    args
}

/// Runs ffmpeg with a configured binary and timeout.
#[derive(Debug, Clone)]
pub struct Transcoder {
    binary: String,
    timeout: Duration,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self::new("ffmpeg", Duration::from_secs(config::transcode::DEFAULT_TIMEOUT_SECS))
    }
}

impl Transcoder {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &DownloaderConfig) -> Self {
        Self::new(config.ffmpeg_bin.clone(), config.transcode_timeout)
    }

    /// Re-encode `input` next to itself as `<stem>.converted.mp4`.
    ///
    /// # Returns
    /// Path to the new file. The input is left untouched.
    pub async fn transcode(&self, input: &Path, options: &TranscodeOptions) -> TranscodeResult<PathBuf> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(TranscodeError::InputNotFound(input.display().to_string()));
        }

        let output_path = converted_output_path(input);
        log::info!("Transcoding {} -> {}", input.display(), output_path.display());

        let mut cmd = Command::new(&self.binary);
        cmd.args(build_ffmpeg_args(input, &output_path, options));
        let output = run_with_timeout(&mut cmd, self.timeout).await?;

        if !output.status.success() {
            let stderr = stderr_excerpt(&output.stderr, config::transcode::STDERR_EXCERPT_CHARS);
            log::error!("FFmpeg transcode error for {}: {}", input.display(), stderr);
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(TranscodeError::FfmpegError {
                code: output.status.code(),
                stderr,
            });
        }

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(TranscodeError::OutputFailed(output_path.display().to_string()));
        }

        Ok(output_path)
    }

    /// Transcode and replace the input with the result.
    ///
    /// # Returns
    /// The input path, now holding the re-encoded video.
    pub async fn reformat_in_place(&self, input: &Path, options: &TranscodeOptions) -> TranscodeResult<PathBuf> {
        let converted = self.transcode(input, options).await?;
        tokio::fs::rename(&converted, input).await?;
        log::info!("Reformatted video in place: {}", input.display());
        Ok(input.to_path_buf())
    }
}

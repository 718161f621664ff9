//! igdora - Instagram content downloader
//!
//! Drives gallery-dl to fetch posts, reels, stories and highlights, merges the
//! raw metadata into one [`UnifiedContentRecord`] per URL and optionally
//! re-encodes videos with ffmpeg.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, URL validation, process helpers
//! - `download`: extraction backends, normalization, temp files, thumbnails
//! - `conversion`: ffmpeg transcoding
//! - `cli`: command-line interface of the `igdora` binary
//!
//! # Example
//!
//! ```no_run
//! use igdora::{DownloaderConfig, InstagramDownloader};
//!
//! # async fn run() -> igdora::AppResult<()> {
//! let mut downloader = InstagramDownloader::new(DownloaderConfig::from_env()?);
//! let record = downloader.download_content("https://www.instagram.com/p/ABC123/").await?;
//! for file in &record.media_files {
//!     println!("{} {:?}", file.kind, file.local_path);
//! }
//! downloader.cleanup();
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod cli;
pub mod conversion;
pub mod core;
pub mod download;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult, ContentType, DownloaderConfig, MediaKind, Stage};
pub use conversion::{TranscodeOptions, Transcoder};
pub use download::{InstagramDownloader, MediaFile, UnifiedContentRecord, UserRef};

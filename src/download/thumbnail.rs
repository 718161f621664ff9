//! Reel thumbnail download.
//!
//! gallery-dl only saves the video of a reel. The still frame Instagram shows
//! in the feed is fetched separately over HTTP, through the same proxy.

use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::core::config;
use crate::core::error::AppError;
use crate::core::types::MediaKind;
use crate::core::validation::sanitize_filename;
use crate::download::proxy::ProxyUrl;
use crate::download::record::UnifiedContentRecord;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// URL of the still image to use as thumbnail: the first video's
/// `thumbnail_url`, else the first image.
pub fn thumbnail_source(record: &UnifiedContentRecord) -> Option<&str> {
    record
        .media_files
        .iter()
        .find_map(|file| file.thumbnail_url.as_deref())
        .or_else(|| {
            record
                .media_files
                .iter()
                .find(|file| file.kind == MediaKind::Image)
                .map(|file| file.url.as_str())
        })
}

/// `<shortcode or id>_thumbnail.<ext>`, extension taken from the URL path.
pub fn thumbnail_file_name(record: &UnifiedContentRecord, url: &str) -> String {
    let stem = if record.shortcode.is_empty() {
        record.id.as_str()
    } else {
        record.shortcode.as_str()
    };
    let ext = url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .and_then(|last| last.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()))
        .filter(|ext| MediaKind::from_extension(ext) == Some(MediaKind::Image))
        .unwrap_or_else(|| "jpg".to_string());
    sanitize_filename(&format!("{}_thumbnail.{}", stem, ext))
}

/// HTTP client for thumbnail downloads.
pub struct ThumbnailFetcher {
    client: reqwest::Client,
}

impl ThumbnailFetcher {
    pub fn new(proxy: Option<&ProxyUrl>) -> Result<Self, AppError> {
        let mut client_builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config::thumbnail::timeout())
            .connect_timeout(std::time::Duration::from_secs(15));

        if let Some(proxy) = proxy {
            log::debug!("Thumbnail requests go through {}", proxy);
            client_builder = client_builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }

        Ok(Self {
            client: client_builder.build()?,
        })
    }

    /// Stream `url` into `dest`. Returns the number of bytes written.
    ///
    /// A partially written file is removed on failure.
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, AppError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            log::error!("Thumbnail download failed: HTTP {} for {}", response.status(), url);
            return Err(AppError::HttpStatus(response.status()));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let result = write_stream(response, dest).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(dest).await;
        }
        let written = result?;

        log::info!("Downloaded thumbnail to {} ({} bytes)", dest.display(), written);
        Ok(written)
    }

    /// Download the thumbnail of `record` into `dir`.
    ///
    /// `Ok(None)` when the record has no usable image URL.
    pub async fn fetch_for_record(&self, record: &UnifiedContentRecord, dir: &Path) -> Result<Option<PathBuf>, AppError> {
        let Some(url) = thumbnail_source(record) else {
            log::warn!("No image found for thumbnail of {}", record.id);
            return Ok(None);
        };
        let dest = dir.join(thumbnail_file_name(record, url));
        self.fetch(url, &dest).await?;
        Ok(Some(dest))
    }
}

async fn write_stream(response: reqwest::Response, dest: &Path) -> Result<u64, AppError> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

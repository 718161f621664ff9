//! `InstagramDownloader`: the entry point callers use.
//!
//! Validates the URL, runs the extractor into a fresh session directory,
//! normalizes what comes back and keeps track of every temporary path until
//! [`InstagramDownloader::cleanup`].

use std::path::{Path, PathBuf};

use crate::conversion::{TranscodeOptions, Transcoder};
use crate::core::config::DownloaderConfig;
use crate::core::error::AppResult;
use crate::core::types::ContentType;
use crate::core::validation::{validate_instagram_url, InstagramUrl};
use crate::download::normalizer::normalize;
use crate::download::record::{RawRecord, UnifiedContentRecord};
use crate::download::session::TempFiles;
use crate::download::source::{ContentExtractor, ExtractionRequest, GalleryDlExtractor};
use crate::download::thumbnail::ThumbnailFetcher;

pub struct InstagramDownloader {
    config: DownloaderConfig,
    extractor: Box<dyn ContentExtractor>,
    transcoder: Transcoder,
    temp_files: TempFiles,
    session_dir: Option<PathBuf>,
    raw_records: Vec<RawRecord>,
}

impl InstagramDownloader {
    /// Downloader backed by gallery-dl and ffmpeg as configured.
    pub fn new(config: DownloaderConfig) -> Self {
        let extractor = Box::new(GalleryDlExtractor::from_config(&config));
        Self::with_extractor(config, extractor)
    }

    /// Downloader with a custom extraction backend.
    pub fn with_extractor(config: DownloaderConfig, extractor: Box<dyn ContentExtractor>) -> Self {
        let transcoder = Transcoder::from_config(&config);
        Self {
            config,
            extractor,
            transcoder,
            temp_files: TempFiles::new(),
            session_dir: None,
            raw_records: Vec::new(),
        }
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Session directory of the last `download_content` call, until cleanup.
    pub fn session_dir(&self) -> Option<&Path> {
        self.session_dir.as_deref()
    }

    /// Raw items behind the last successful extraction, as the extractor returned them.
    pub fn raw_records(&self) -> &[RawRecord] {
        &self.raw_records
    }

    /// Paths that the next `cleanup` will remove.
    pub fn temp_files(&self) -> &[PathBuf] {
        self.temp_files.tracked()
    }

    /// Download all media of `url` and return the normalized record.
    ///
    /// Media lands in a new `<temp_root>/instagram_<uuid>/` directory that
    /// stays on disk until [`cleanup`](Self::cleanup), also when extraction
    /// or normalization fails.
    pub async fn download_content(&mut self, url: &str) -> AppResult<UnifiedContentRecord> {
        let url = validate_instagram_url(url)?;
        log::info!("Downloading {} ({})", url.original(), describe(&url));

        let dir = self.temp_files.create_session_dir(&self.config.temp_root).await?;
        self.session_dir = Some(dir.clone());

        let request = self.request_for(&url, Some(dir));
        self.run(&url, &request).await
    }

    /// Same as [`download_content`](Self::download_content) without writing
    /// media. Every `local_path` in the result is `None`.
    pub async fn fetch_metadata(&mut self, url: &str) -> AppResult<UnifiedContentRecord> {
        let url = validate_instagram_url(url)?;
        log::info!("Fetching metadata for {} ({})", url.original(), describe(&url));

        let request = self.request_for(&url, None);
        self.run(&url, &request).await
    }

    /// Fetch the still image of a reel next to its media.
    ///
    /// `Ok(None)` for anything that is not a reel, or a reel without an image URL.
    pub async fn download_thumbnail(&mut self, record: &UnifiedContentRecord) -> AppResult<Option<PathBuf>> {
        if record.content_type != ContentType::Reel {
            log::debug!("Skipping thumbnail for {} {}", record.content_type, record.id);
            return Ok(None);
        }

        let dir = match &self.session_dir {
            Some(dir) => dir.clone(),
            None => {
                let dir = self.temp_files.create_session_dir(&self.config.temp_root).await?;
                self.session_dir = Some(dir.clone());
                dir
            }
        };

        let fetcher = ThumbnailFetcher::new(self.config.proxy.as_ref())?;
        let path = fetcher.fetch_for_record(record, &dir).await?;
        if let Some(path) = &path {
            self.temp_files.track(path.clone());
        }
        Ok(path)
    }

    /// Re-encode `input` to `<stem>.converted.mp4`. The output is tracked for cleanup.
    pub async fn transcode(&mut self, input: &Path, options: &TranscodeOptions) -> AppResult<PathBuf> {
        let output = self.transcoder.transcode(input, options).await?;
        self.temp_files.track(output.clone());
        Ok(output)
    }

    /// Re-encode `input` and replace it with the result.
    pub async fn reformat(&mut self, input: &Path, options: &TranscodeOptions) -> AppResult<PathBuf> {
        Ok(self.transcoder.reformat_in_place(input, options).await?)
    }

    /// Reformat every downloaded video of `record` in place.
    ///
    /// Stops at the first failure. Returns the number of videos reformatted.
    pub async fn reformat_videos(&mut self, record: &UnifiedContentRecord, options: &TranscodeOptions) -> AppResult<usize> {
        let mut count = 0;
        for path in record.videos().filter_map(|file| file.local_path.as_deref()) {
            self.reformat(path, options).await?;
            count += 1;
        }
        Ok(count)
    }

    /// Remove every tracked temporary path. Safe to call any number of times.
    pub fn cleanup(&mut self) {
        self.temp_files.cleanup();
        self.session_dir = None;
    }

    fn request_for(&self, url: &InstagramUrl, output_dir: Option<PathBuf>) -> ExtractionRequest {
        ExtractionRequest {
            url: url.as_url().clone(),
            cookies_path: self.usable_cookies(),
            proxy: self.config.proxy.clone(),
            output_dir,
        }
    }

    /// Cookies path if the file exists. A missing file means anonymous access.
    fn usable_cookies(&self) -> Option<PathBuf> {
        let path = self.config.cookies_path.as_ref()?;
        if path.is_file() {
            Some(path.clone())
        } else {
            log::warn!(
                "Cookies file {} not found, continuing without authentication (public content only)",
                path.display()
            );
            None
        }
    }

    async fn run(&mut self, url: &InstagramUrl, request: &ExtractionRequest) -> AppResult<UnifiedContentRecord> {
        self.raw_records.clear();
        let records = match self.extractor.extract(request).await {
            Ok(records) => records,
            Err(e) => {
                log::error!("{} failed [{}]: {}", self.extractor.name(), e.subcategory(), e);
                return Err(e.into());
            }
        };
        log::debug!("{} returned {} raw items", self.extractor.name(), records.len());

        let record = normalize(url, &records);
        self.raw_records = records;
        let record = record?;
        log::info!(
            "Normalized {} {} ({} media files, {} owners)",
            record.content_type,
            record.id,
            record.media_files.len(),
            record.owners.len()
        );
        Ok(record)
    }
}

fn describe(url: &InstagramUrl) -> String {
    url.content_type()
        .map(|kind| kind.to_string())
        .unwrap_or_else(|| "type from metadata".to_string())
}

//! GalleryDlExtractor: runs gallery-dl and turns its output into raw records.
//!
//! Two modes:
//! - download: `--directory <dir> --write-metadata`, one `<file>.json` sidecar
//!   per downloaded file; the sidecars are the records.
//! - metadata only: `--dump-json --resolve-json`, the printed message list is
//!   decoded and every URL message becomes a record. A run that only queues
//!   another URL (share links) is followed once.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use url::Url;

use crate::core::config::{self, DownloaderConfig};
use crate::core::process::{run_with_timeout, stderr_excerpt};
use crate::download::error::ExtractionError;
use crate::download::gallery_dl_errors::{analyze_gallery_dl_error, get_fix_recommendations};
use crate::download::record::RawRecord;
use crate::download::source::{ContentExtractor, ExtractionRequest};

/// gallery-dl `--dump-json` message codes
mod message {
    pub const ERROR: i64 = -1;
    pub const DIRECTORY: i64 = 2;
    pub const URL: i64 = 3;
    pub const QUEUE: i64 = 6;
}

/// Extraction backend powered by gallery-dl.
#[derive(Debug, Clone)]
pub struct GalleryDlExtractor {
    binary: String,
    timeout: Duration,
}

impl Default for GalleryDlExtractor {
    fn default() -> Self {
        Self::new(
            "gallery-dl",
            Duration::from_secs(config::extraction::DEFAULT_TIMEOUT_SECS),
        )
    }
}

impl GalleryDlExtractor {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &DownloaderConfig) -> Self {
        Self::new(config.gallery_dl_bin.clone(), config.extraction_timeout)
    }

    /// Command line arguments for a request (without the binary).
    pub fn build_args(request: &ExtractionRequest) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();

        match &request.output_dir {
            Some(dir) => {
                args.push("--directory".to_string());
                args.push(dir.to_string_lossy().to_string());
                args.push("--write-metadata".to_string());
                args.push("--no-part".to_string());
            }
            None => {
                args.push("--dump-json".to_string());
                args.push("--resolve-json".to_string());
            }
        }

        if let Some(cookies) = &request.cookies_path {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().to_string());
        }

        if let Some(proxy) = &request.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.as_str().to_string());
        }

        args.push(request.url.to_string());
        args
    }

    /// Run gallery-dl once; a non-zero exit becomes `ExtractionError::Failed`.
    async fn run(&self, request: &ExtractionRequest) -> Result<Output, ExtractionError> {
        let args = Self::build_args(request);
        log::info!(
            "Running {} ({}) for {}",
            self.binary,
            if request.is_metadata_only() { "metadata" } else { "download" },
            request.url
        );
        if let Some(proxy) = &request.proxy {
            log::debug!("gallery-dl proxy: {}", proxy);
        }

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args);
        let output = run_with_timeout(&mut cmd, self.timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let kind = analyze_gallery_dl_error(output.status.code(), &stderr);
            log::error!(
                "gallery-dl exited with {:?} ({}) for {}",
                output.status.code(),
                kind,
                request.url
            );
            log::error!("{}", get_fix_recommendations(kind));
            return Err(ExtractionError::Failed {
                code: output.status.code(),
                kind,
                stderr: stderr_excerpt(&output.stderr, config::extraction::STDERR_EXCERPT_CHARS),
            });
        }
        Ok(output)
    }

    async fn dump_metadata(&self, request: &ExtractionRequest) -> Result<Vec<RawRecord>, ExtractionError> {
        let output = self.run(request).await?;
        let dump = parse_dump_json(&output.stdout)?;

        let Some(target) = dump.follow_target() else {
            return Ok(dump.records);
        };
        log::info!("{} only queued {}, following it", request.url, target);
        let followed = ExtractionRequest {
            url: target,
            ..request.clone()
        };
        let output = self.run(&followed).await?;
        Ok(parse_dump_json(&output.stdout)?.records)
    }
}

#[async_trait]
impl ContentExtractor for GalleryDlExtractor {
    fn name(&self) -> &str {
        "gallery-dl"
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<Vec<RawRecord>, ExtractionError> {
        let records = match &request.output_dir {
            Some(dir) => {
                self.run(request).await?;
                collect_sidecars(dir).await?
            }
            None => self.dump_metadata(request).await?,
        };

        if records.is_empty() {
            log::warn!("gallery-dl returned no items for {}, content may be private", request.url);
            return Err(ExtractionError::NoContent);
        }

        log::info!("gallery-dl returned {} items for {}", records.len(), request.url);
        Ok(records)
    }
}

/// Decoded `--dump-json` output.
#[derive(Debug, Default)]
pub struct DumpOutput {
    /// URL messages, in emission order
    pub records: Vec<RawRecord>,
    /// URLs gallery-dl would hand to another extractor
    pub queued: Vec<String>,
}

impl DumpOutput {
    /// The queued URL to run next, when the run produced no records itself.
    pub fn follow_target(&self) -> Option<Url> {
        if !self.records.is_empty() {
            return None;
        }
        self.queued.iter().find_map(|queued| match Url::parse(queued) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Skipping queued URL {}: {}", queued, e);
                None
            }
        })
    }
}

/// Decode `--dump-json` output, keeping records in emission order.
pub fn parse_dump_json(stdout: &[u8]) -> Result<DumpOutput, ExtractionError> {
    let messages: Vec<Value> =
        serde_json::from_slice(stdout).map_err(|e| ExtractionError::InvalidOutput(e.to_string()))?;

    let mut dump = DumpOutput::default();
    for message in messages {
        let Some(parts) = message.as_array() else {
            return Err(ExtractionError::InvalidOutput(format!("message is not an array: {}", message)));
        };
        let code = parts.first().and_then(Value::as_i64);

        match code {
            Some(message::URL) => {
                let kwdict = parts
                    .get(2)
                    .filter(|value| value.is_object())
                    .cloned()
                    .ok_or_else(|| ExtractionError::InvalidOutput("URL message without metadata".to_string()))?;
                dump.records.push(RawRecord::new(kwdict));
            }
            Some(message::ERROR) => {
                let text = parts.get(1).map(Value::to_string).unwrap_or_default();
                let kind = analyze_gallery_dl_error(None, &text);
                return Err(ExtractionError::Failed {
                    code: None,
                    kind,
                    stderr: text,
                });
            }
            Some(message::DIRECTORY) => {}
            Some(message::QUEUE) => match parts.get(1).and_then(Value::as_str) {
                Some(url) => dump.queued.push(url.to_string()),
                None => log::debug!("Queue message without URL: {}", message),
            },
            _ => log::debug!("Ignoring gallery-dl message {}", message),
        }
    }

    Ok(dump)
}

/// Read the `--write-metadata` sidecars in `dir`, ordered by `num` then file name.
pub async fn collect_sidecars(dir: &Path) -> Result<Vec<RawRecord>, ExtractionError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ExtractionError::InvalidOutput(format!("cannot read {}: {}", dir.display(), e)))?;

    let mut sidecars: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ExtractionError::InvalidOutput(format!("cannot read {}: {}", dir.display(), e)))?
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            sidecars.push(path);
        }
    }

    let mut records = Vec::with_capacity(sidecars.len());
    for sidecar in sidecars {
        let bytes = tokio::fs::read(&sidecar)
            .await
            .map_err(|e| ExtractionError::InvalidOutput(format!("cannot read {}: {}", sidecar.display(), e)))?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ExtractionError::InvalidOutput(format!("{}: {}", sidecar.display(), e)))?;

        // `123_456.jpg.json` describes `123_456.jpg`
        let media_path = sidecar.with_extension("");
        let record = RawRecord::new(value);
        let record = if tokio::fs::try_exists(&media_path).await.unwrap_or(false) {
            record.with_local_path(media_path)
        } else {
            log::warn!("Metadata without media file: {}", sidecar.display());
            record
        };
        records.push((sidecar, record));
    }

    records.sort_by(|(a_path, a), (b_path, b)| {
        let a_num = a.value.get("num").and_then(Value::as_u64).unwrap_or(u64::MAX);
        let b_num = b.value.get("num").and_then(Value::as_u64).unwrap_or(u64::MAX);
        a_num.cmp(&b_num).then_with(|| a_path.cmp(b_path))
    });

    Ok(records.into_iter().map(|(_, record)| record).collect())
}

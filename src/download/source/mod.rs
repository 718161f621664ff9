//! Content extraction abstraction layer.
//!
//! Provides the `ContentExtractor` trait the downloader talks to. The only
//! built-in backend is `GalleryDlExtractor`; tests plug in their own.

pub mod gallery_dl;

use async_trait::async_trait;
use std::path::PathBuf;
use url::Url;

use crate::download::error::ExtractionError;
use crate::download::proxy::ProxyUrl;
use crate::download::record::RawRecord;

pub use gallery_dl::GalleryDlExtractor;

/// Request parameters for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Validated Instagram URL
    pub url: Url,
    /// Netscape cookies file, only set when the file exists
    pub cookies_path: Option<PathBuf>,
    pub proxy: Option<ProxyUrl>,
    /// Where to write media files. `None` asks for metadata only.
    pub output_dir: Option<PathBuf>,
}

impl ExtractionRequest {
    pub fn metadata_only(url: Url) -> Self {
        Self {
            url,
            cookies_path: None,
            proxy: None,
            output_dir: None,
        }
    }

    pub fn is_metadata_only(&self) -> bool {
        self.output_dir.is_none()
    }
}

/// Trait for extraction backends.
///
/// One call is one run of the external tool. Failures are terminal: no
/// retries happen at this layer.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Human-readable name of this backend (e.g., "gallery-dl")
    fn name(&self) -> &str;

    /// Extract raw records in the tool's emission order.
    async fn extract(&self, request: &ExtractionRequest) -> Result<Vec<RawRecord>, ExtractionError>;
}

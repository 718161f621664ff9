//! Instagram content download: extraction, normalization and temp files

pub mod cookies;
pub mod downloader;
pub mod error;
pub mod gallery_dl_errors;
pub mod normalizer;
pub mod proxy;
pub mod record;
pub mod session;
pub mod source;
pub mod thumbnail;

// Re-exports for convenience
pub use downloader::InstagramDownloader;
pub use error::ExtractionError;
pub use normalizer::{normalize, NormalizeError};
pub use proxy::{ProxyProtocol, ProxyUrl};
pub use record::{MediaFile, RawRecord, UnifiedContentRecord, UserRef};
pub use source::{ContentExtractor, ExtractionRequest, GalleryDlExtractor};

//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod logging;
pub mod process;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use config::DownloaderConfig;
pub use error::{AppError, AppResult, Stage};
pub use logging::{init_logger, log_cookies_configuration};
pub use types::{ContentType, MediaKind};
pub use validation::{clean_url, validate_instagram_url, InstagramUrl, UrlClass};

//! Environment-backed defaults and the explicit downloader configuration.
//!
//! Every static is read once on first use. None of them is consulted by the
//! library directly: they only seed [`DownloaderConfig::from_env`], so a
//! caller that builds its own config never depends on process environment.

use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::AppError;
use crate::download::proxy::ProxyUrl;

/// gallery-dl binary path
/// Read from GALLERY_DL_BIN environment variable or defaults to "gallery-dl"
pub static GALLERY_DL_BIN: Lazy<String> =
    Lazy::new(|| env::var("GALLERY_DL_BIN").unwrap_or_else(|_| "gallery-dl".to_string()));

/// ffmpeg binary path
/// Read from FFMPEG_BIN environment variable or defaults to "ffmpeg"
pub static FFMPEG_BIN: Lazy<String> = Lazy::new(|| env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()));

/// Path to a Netscape cookies file for Instagram authentication
/// Read from INSTAGRAM_COOKIES_FILE environment variable
/// Without it only public content is reachable
pub static INSTAGRAM_COOKIES_FILE: Lazy<Option<String>> = Lazy::new(|| {
    env::var("INSTAGRAM_COOKIES_FILE")
        .ok()
        .filter(|s| !s.trim().is_empty())
});

/// Proxy for gallery-dl and thumbnail requests
/// Read from INSTAGRAM_PROXY environment variable
/// Example: socks5://127.0.0.1:10808
pub static INSTAGRAM_PROXY: Lazy<Option<String>> = Lazy::new(|| {
    env::var("INSTAGRAM_PROXY")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "none" && s != "disabled")
});

/// Root for per-download session directories
/// Read from TEMP_FILES_DIR environment variable
/// Defaults to the OS temp dir, supports tilde (~) expansion
pub static TEMP_FILES_DIR: Lazy<String> = Lazy::new(|| {
    env::var("TEMP_FILES_DIR").unwrap_or_else(|_| env::temp_dir().to_string_lossy().to_string())
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: igdora.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "igdora.log".to_string()));

/// gallery-dl timeout in seconds
/// Read from GALLERY_DL_TIMEOUT_SECS, default 300
pub static GALLERY_DL_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
    env::var("GALLERY_DL_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(extraction::DEFAULT_TIMEOUT_SECS)
});

/// ffmpeg timeout in seconds
/// Read from FFMPEG_TIMEOUT_SECS, default 600
pub static FFMPEG_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
    env::var("FFMPEG_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(transcode::DEFAULT_TIMEOUT_SECS)
});

/// Extraction configuration
pub mod extraction {
    /// Timeout for one gallery-dl run (in seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// How much gallery-dl stderr is kept in error messages
    pub const STDERR_EXCERPT_CHARS: usize = 500;
}

/// Transcoding configuration
pub mod transcode {
    /// Timeout for one ffmpeg run (in seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

    /// How much ffmpeg stderr is kept in error messages
    pub const STDERR_EXCERPT_CHARS: usize = 800;
}

/// Thumbnail fetch configuration
pub mod thumbnail {
    use super::Duration;

    /// Request timeout (in seconds)
    pub const TIMEOUT_SECS: u64 = 30;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(TIMEOUT_SECS)
    }
}

/// Prefix of every session directory created under the temp root
pub const SESSION_DIR_PREFIX: &str = "instagram_";

/// Expand `~` in a configured path.
pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw.trim()).to_string())
}

/// Explicit configuration for an [`InstagramDownloader`](crate::download::InstagramDownloader).
///
/// Constructed by the caller and handed over at construction time; the
/// downloader never reads process-wide state after that.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Netscape cookies file. `None` means anonymous access (public content only).
    pub cookies_path: Option<PathBuf>,
    /// Proxy URL (http, https, socks4, socks5).
    pub proxy: Option<ProxyUrl>,
    /// Directory under which session directories are created.
    pub temp_root: PathBuf,
    pub gallery_dl_bin: String,
    pub ffmpeg_bin: String,
    pub extraction_timeout: Duration,
    pub transcode_timeout: Duration,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            cookies_path: None,
            proxy: None,
            temp_root: env::temp_dir(),
            gallery_dl_bin: "gallery-dl".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            extraction_timeout: Duration::from_secs(extraction::DEFAULT_TIMEOUT_SECS),
            transcode_timeout: Duration::from_secs(transcode::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl DownloaderConfig {
    /// Build a config from the environment defaults above.
    ///
    /// Fails only when `INSTAGRAM_PROXY` is set to something that is not a
    /// supported proxy URL.
    pub fn from_env() -> Result<Self, AppError> {
        let proxy = match INSTAGRAM_PROXY.as_deref() {
            Some(raw) => Some(ProxyUrl::parse(raw)?),
            None => None,
        };

        Ok(Self {
            cookies_path: INSTAGRAM_COOKIES_FILE.as_deref().map(expand_path),
            proxy,
            temp_root: expand_path(&TEMP_FILES_DIR),
            gallery_dl_bin: GALLERY_DL_BIN.clone(),
            ffmpeg_bin: FFMPEG_BIN.clone(),
            extraction_timeout: Duration::from_secs(*GALLERY_DL_TIMEOUT_SECS),
            transcode_timeout: Duration::from_secs(*FFMPEG_TIMEOUT_SECS),
        })
    }

    /// Set the cookies file.
    pub fn with_cookies<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cookies_path = Some(path.into());
        self
    }

    /// Parse and set the proxy.
    pub fn with_proxy(mut self, proxy: &str) -> Result<Self, AppError> {
        self.proxy = Some(ProxyUrl::parse(proxy)?);
        Ok(self)
    }

    /// Set the temp root.
    pub fn with_temp_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.temp_root = root.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_anonymous() {
        let config = DownloaderConfig::default();
        assert!(config.cookies_path.is_none());
        assert!(config.proxy.is_none());
        assert_eq!(config.gallery_dl_bin, "gallery-dl");
        assert_eq!(config.ffmpeg_bin, "ffmpeg");
        assert_eq!(config.extraction_timeout, Duration::from_secs(300));
        assert_eq!(config.transcode_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_with_proxy_rejects_unknown_scheme() {
        let result = DownloaderConfig::default().with_proxy("ftp://127.0.0.1:21");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_proxy_accepts_socks() {
        let config = DownloaderConfig::default()
            .with_proxy("socks5://127.0.0.1:10808")
            .unwrap();
        assert_eq!(config.proxy.unwrap().as_str(), "socks5://127.0.0.1:10808");
    }

    #[test]
    fn test_expand_path_keeps_absolute() {
        assert_eq!(expand_path("/tmp/cookies.txt"), PathBuf::from("/tmp/cookies.txt"));
    }

    #[test]
    fn test_builder_methods() {
        let config = DownloaderConfig::default()
            .with_cookies("/tmp/ig_cookies.txt")
            .with_temp_root("/tmp/igdora");
        assert_eq!(config.cookies_path, Some(PathBuf::from("/tmp/ig_cookies.txt")));
        assert_eq!(config.temp_root, PathBuf::from("/tmp/igdora"));
    }
}

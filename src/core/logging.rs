//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Cookies and proxy configuration logging at startup

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config::DownloaderConfig;
use crate::download::cookies::diagnose_cookies_file;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the file or a logger is already set
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Debug, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the authentication and proxy setup of a downloader config.
///
/// A missing or incomplete cookies file is only a warning: public content is
/// still reachable anonymously.
pub fn log_cookies_configuration(config: &DownloaderConfig) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🍪 Instagram configuration check");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match &config.cookies_path {
        Some(path) => {
            let diagnostic = diagnose_cookies_file(path);
            if !diagnostic.file_exists {
                log::warn!("⚠️  Cookies file not found: {}", path.display());
                log::warn!("   Continuing without authentication, private content will fail");
            } else if diagnostic.is_valid {
                log::info!("✅ Cookies file: {}", path.display());
                log::info!("   {} Instagram cookies found", diagnostic.instagram_cookies);
            } else {
                log::warn!("⚠️  Cookies file: {} has problems", path.display());
                for issue in &diagnostic.issues {
                    log::warn!("   - {}", issue);
                }
            }
        }
        None => {
            log::warn!("⚠️  No cookies file configured, only public content is reachable");
        }
    }

    match &config.proxy {
        Some(proxy) => log::info!("🌐 Proxy: {}", proxy),
        None => log::info!("🌐 Proxy: none"),
    }

    log::info!("🔧 gallery-dl: {}, ffmpeg: {}", config.gallery_dl_bin, config.ffmpeg_bin);
    log::info!("📁 Temp root: {}", config.temp_root.display());
}

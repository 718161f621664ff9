use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use igdora::cli::{Cli, Commands};
use igdora::conversion::{get_file_size, TranscodeOptions};
use igdora::core::validation::sanitize_filename;
use igdora::core::{config, init_logger, log_cookies_configuration, DownloaderConfig};
use igdora::download::cookies::diagnose_cookies_file;
use igdora::download::{InstagramDownloader, RawRecord, UnifiedContentRecord};

/// Entry point of the `igdora` binary
///
/// Parses CLI arguments and dispatches to the subcommand. Downloads run one
/// at a time on a single-threaded runtime.
///
/// # Errors
/// Returns an error if logging setup, configuration or the command fails.
fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // .env must be loaded before the config statics are first read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;

    match cli.command {
        Commands::Download {
            url,
            cookies,
            proxy,
            output,
            keep_files,
            reformat,
            thumbnail,
            raw,
        } => {
            let config = build_config(cookies, proxy)?;
            let options = DownloadOptions {
                output,
                keep_files,
                reformat,
                thumbnail,
                raw,
            };
            runtime.block_on(run_download(config, &url, &options))
        }
        Commands::Info { url, cookies, proxy } => {
            let config = build_config(cookies, proxy)?;
            runtime.block_on(run_info(config, &url))
        }
        Commands::CheckCookies { file } => run_check_cookies(file),
    }
}

struct DownloadOptions {
    output: PathBuf,
    keep_files: bool,
    reformat: bool,
    thumbnail: bool,
    raw: bool,
}

/// Environment defaults, overridden by command-line flags.
fn build_config(cookies: Option<PathBuf>, proxy: Option<String>) -> Result<DownloaderConfig> {
    let mut config = DownloaderConfig::from_env()?;
    if let Some(path) = cookies {
        config = config.with_cookies(path);
    }
    if let Some(proxy) = proxy {
        config = config.with_proxy(&proxy)?;
    }
    log_cookies_configuration(&config);
    Ok(config)
}

async fn run_download(config: DownloaderConfig, url: &str, options: &DownloadOptions) -> Result<()> {
    let mut downloader = InstagramDownloader::new(config);
    let result = download_into(&mut downloader, url, options).await;
    downloader.cleanup();
    result
}

async fn download_into(downloader: &mut InstagramDownloader, url: &str, options: &DownloadOptions) -> Result<()> {
    let record = downloader.download_content(url).await?;

    if options.reformat {
        let count = downloader.reformat_videos(&record, &TranscodeOptions::default()).await?;
        log::info!("Reformatted {} videos", count);
    }

    let thumbnail = if options.thumbnail {
        downloader.download_thumbnail(&record).await?
    } else {
        None
    };

    print_summary(&record).await;

    let raw = options.raw.then(|| downloader.raw_records());
    write_outputs(&record, thumbnail.as_deref(), raw, options).await?;
    Ok(())
}

/// Write the record JSON (and the raw items) into the output directory,
/// copying media first when `keep_files` is set.
///
/// The session directory is removed after the command, so the written record
/// points at the copies, or carries no `local_path` at all.
async fn write_outputs(
    record: &UnifiedContentRecord,
    thumbnail: Option<&Path>,
    raw: Option<&[RawRecord]>,
    options: &DownloadOptions,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(&options.output)
        .await
        .with_context(|| format!("Failed to create {}", options.output.display()))?;

    let mut copies = HashMap::new();
    if options.keep_files {
        for source in record.local_files().map(PathBuf::as_path).chain(thumbnail) {
            let dest = copy_into(source, &options.output).await?;
            println!("💾 {}", dest.display());
            copies.insert(source.to_path_buf(), dest);
        }
    }
    let output_record = record.relocated(|path| copies.get(path).cloned());

    let json_path = options.output.join(record_file_name(record));
    let json = serde_json::to_string_pretty(&output_record)?;
    tokio::fs::write(&json_path, json).await?;
    println!("📝 Record: {}", json_path.display());

    if let Some(raw) = raw {
        let raw_path = options.output.join(format!("raw_{}", record_file_name(record)));
        let values: Vec<&serde_json::Value> = raw.iter().map(|r| &r.value).collect();
        tokio::fs::write(&raw_path, serde_json::to_string_pretty(&values)?).await?;
        println!("📝 Raw items: {}", raw_path.display());
    }

    Ok(json_path)
}

async fn run_info(config: DownloaderConfig, url: &str) -> Result<()> {
    let mut downloader = InstagramDownloader::new(config);
    let record = downloader.fetch_metadata(url).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn run_check_cookies(file: Option<PathBuf>) -> Result<()> {
    let path = file
        .or_else(|| config::INSTAGRAM_COOKIES_FILE.as_deref().map(config::expand_path))
        .context("No cookies file given and INSTAGRAM_COOKIES_FILE is not set")?;

    let diagnostic = diagnose_cookies_file(&path);
    println!("Cookies file: {}", path.display());
    println!("{}", diagnostic.format_report());
    Ok(())
}

async fn print_summary(record: &UnifiedContentRecord) {
    println!("📸 {} {}", record.content_type, record.shortcode);
    println!("=====================");
    println!("URL: {}", record.cleaned_url);
    let owners: Vec<&str> = record.owners.iter().map(|owner| owner.username.as_str()).collect();
    println!("Owners: {}", owners.join(", "));
    if let Some(taken_at) = record.taken_at {
        println!("Taken at: {}", taken_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if !record.caption.is_empty() {
        println!("Caption: {}", record.caption);
    }
    if !record.tagged_users.is_empty() {
        println!("Tagged: {}", record.tagged_users.len());
    }
    println!(
        "Media: {} files ({} videos){}",
        record.media_files.len(),
        record.videos().count(),
        if record.is_private { ", private" } else { "" }
    );
    for (index, file) in record.media_files.iter().enumerate() {
        let Some(path) = &file.local_path else {
            continue;
        };
        let size = match get_file_size(path).await {
            Ok(bytes) => format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0)),
            Err(e) => {
                log::warn!("Cannot stat {}: {}", path.display(), e);
                "? MB".to_string()
            }
        };
        println!("  {}. {} {} ({})", index + 1, file.kind, path.display(), size);
    }
}

/// `<shortcode>.json`, or `<id>.json` when there is no shortcode.
fn record_file_name(record: &UnifiedContentRecord) -> String {
    let stem = if record.shortcode.is_empty() {
        &record.id
    } else {
        &record.shortcode
    };
    sanitize_filename(&format!("{}.json", stem))
}

async fn copy_into(source: &Path, dir: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .with_context(|| format!("No file name in {}", source.display()))?;
    let dest = dir.join(name);
    tokio::fs::copy(source, &dest)
        .await
        .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))?;
    Ok(dest)
}

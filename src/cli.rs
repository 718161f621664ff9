use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "igdora")]
#[command(author, version, about = "Download Instagram posts, reels, stories and highlights", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a post, reel, story or highlight
    Download {
        /// Instagram URL
        url: String,

        /// Path to a Netscape cookies file (overrides INSTAGRAM_COOKIES_FILE)
        #[arg(short, long)]
        cookies: Option<PathBuf>,

        /// Proxy URL, e.g. socks5://127.0.0.1:1080 (overrides INSTAGRAM_PROXY)
        #[arg(short, long)]
        proxy: Option<String>,

        /// Directory for the record JSON and kept media
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Copy downloaded media into the output directory
        #[arg(long)]
        keep_files: bool,

        /// Re-encode videos to H.264/AAC
        #[arg(long)]
        reformat: bool,

        /// Also fetch the thumbnail of a reel
        #[arg(long)]
        thumbnail: bool,

        /// Also write the raw extractor items as raw_<name>.json
        #[arg(long)]
        raw: bool,
    },

    /// Print the metadata of a URL as JSON without downloading media
    Info {
        /// Instagram URL
        url: String,

        #[arg(short, long)]
        cookies: Option<PathBuf>,

        #[arg(short, long)]
        proxy: Option<String>,
    },

    /// Check a cookies file for the Instagram session cookies
    CheckCookies {
        /// Cookies file (defaults to INSTAGRAM_COOKIES_FILE)
        file: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

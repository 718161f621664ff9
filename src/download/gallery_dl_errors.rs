/// gallery-dl failure classification
///
/// gallery-dl reports failures through a bitmask exit status and a free-form
/// stderr. This module maps both onto a small set of error types so callers
/// can tell "log in first" apart from "try again later".
use strum::{AsRefStr, Display};

/// Exit status bits set by gallery-dl (several may be OR-ed together).
pub mod exit_bits {
    pub const HTTP: i32 = 4;
    pub const NOT_FOUND: i32 = 8;
    pub const AUTH: i32 = 16;
    pub const FORMAT: i32 = 32;
    pub const NO_EXTRACTOR: i32 = 64;
}

/// gallery-dl error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GalleryDlErrorType {
    /// Login required: private account, expired or missing cookies
    AuthRequired,
    /// Post deleted, wrong shortcode or expired story
    NotFound,
    /// Instagram throttled the session (HTTP 429, "please wait a few minutes")
    RateLimited,
    /// Timeouts, DNS, refused connections, proxy failures
    Network,
    /// gallery-dl has no extractor for the URL
    UnsupportedUrl,
    Unknown,
}

impl GalleryDlErrorType {
    /// Content that exists but is hidden from this session.
    pub fn is_private_content(&self) -> bool {
        matches!(self, GalleryDlErrorType::AuthRequired)
    }
}

/// Analyzes gallery-dl exit status and stderr and determines the error type
///
/// Stderr patterns are checked first because they are more specific than the
/// exit bits: a redirect to the login page is reported as an HTTP error.
pub fn analyze_gallery_dl_error(exit_code: Option<i32>, stderr: &str) -> GalleryDlErrorType {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("429")
        || stderr_lower.contains("too many requests")
        || stderr_lower.contains("rate limit")
        || stderr_lower.contains("please wait a few minutes")
    {
        return GalleryDlErrorType::RateLimited;
    }

    if stderr_lower.contains("login required")
        || stderr_lower.contains("redirect to login page")
        || stderr_lower.contains("private profile")
        || stderr_lower.contains("account is private")
        || stderr_lower.contains("authorizationerror")
        || stderr_lower.contains("authenticationerror")
        || stderr_lower.contains("401 unauthorized")
        || stderr_lower.contains("403 forbidden")
        || stderr_lower.contains("http error 401")
        || stderr_lower.contains("http error 403")
    {
        return GalleryDlErrorType::AuthRequired;
    }

    if stderr_lower.contains("unsupported url") || stderr_lower.contains("no suitable extractor") {
        return GalleryDlErrorType::UnsupportedUrl;
    }

    if stderr_lower.contains("404 not found")
        || stderr_lower.contains("http error 404")
        || stderr_lower.contains("notfounderror")
        || stderr_lower.contains("requested resource could not be found")
        || stderr_lower.contains("media not found")
    {
        return GalleryDlErrorType::NotFound;
    }

    if stderr_lower.contains("timed out")
        || stderr_lower.contains("timeout")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("name resolution")
        || stderr_lower.contains("proxyerror")
        || stderr_lower.contains("ssl")
    {
        return GalleryDlErrorType::Network;
    }

    match exit_code {
        Some(code) if code & exit_bits::AUTH != 0 => GalleryDlErrorType::AuthRequired,
        Some(code) if code & exit_bits::NO_EXTRACTOR != 0 => GalleryDlErrorType::UnsupportedUrl,
        Some(code) if code & exit_bits::NOT_FOUND != 0 => GalleryDlErrorType::NotFound,
        Some(code) if code & exit_bits::HTTP != 0 => GalleryDlErrorType::Network,
        _ => GalleryDlErrorType::Unknown,
    }
}

/// Returns fix recommendations for logs
pub fn get_fix_recommendations(error_type: GalleryDlErrorType) -> &'static str {
    match error_type {
        GalleryDlErrorType::AuthRequired => {
            "Export fresh Instagram cookies (sessionid, csrftoken, ds_user_id) in Netscape format \
             and pass them with --cookies or INSTAGRAM_COOKIES_FILE"
        }
        GalleryDlErrorType::NotFound => "Content was deleted, expired or the link is wrong; nothing to fix",
        GalleryDlErrorType::RateLimited => "Wait a few minutes or switch to another proxy",
        GalleryDlErrorType::Network => "Check connectivity to instagram.com and the proxy configuration",
        GalleryDlErrorType::UnsupportedUrl => "Update gallery-dl; the installed version does not recognize this link",
        GalleryDlErrorType::Unknown => "Run gallery-dl manually with --verbose on the same URL to see the full error",
    }
}

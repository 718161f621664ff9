//! URL and filename validation utilities
//!
//! Provides input checks that run before any external tool is started:
//! - Instagram URL validation (whitelist-based) and content classification
//! - Query-string stripping for the `cleaned_url` field
//! - Filename sanitization for files the CLI writes

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::core::types::ContentType;

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Invalid URL format, non-Instagram domain or unsupported path
    #[error("Invalid Instagram URL: {0}")]
    InvalidUrl(String),
}

/// Hosts accepted as Instagram.
const INSTAGRAM_HOSTS: &[&str] = &["instagram.com", "www.instagram.com", "m.instagram.com"];

/// Base64 of "highlight". `/s/<id>` share links for highlights start with it.
const HIGHLIGHT_MARKER: &str = "aGlnaGxpZ2h0";

/// Shortcodes, media ids, usernames: letters, digits, `_`, `-`, `.`
static SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-=]+$").expect("Failed to compile path segment regex"));

/// What the URL path says about the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlClass {
    /// The path alone determines the content type.
    Known(ContentType),
    /// Recognized Instagram link whose path does not reveal the type
    /// (share links, non-highlight `/s/` links).
    Ambiguous,
}

/// A validated Instagram content URL.
#[derive(Debug, Clone)]
pub struct InstagramUrl {
    original: String,
    parsed: Url,
    class: UrlClass,
}

impl InstagramUrl {
    /// URL as the caller supplied it, without surrounding whitespace.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Parsed form (scheme added when the caller omitted it).
    pub fn as_url(&self) -> &Url {
        &self.parsed
    }

    pub fn class(&self) -> UrlClass {
        self.class
    }

    /// Content type if the path determines it.
    pub fn content_type(&self) -> Option<ContentType> {
        match self.class {
            UrlClass::Known(ct) => Some(ct),
            UrlClass::Ambiguous => None,
        }
    }
}

/// Validates that a URL is an Instagram content URL and classifies it.
///
/// # Security
/// Uses whitelist approach:
/// - Only HTTP/HTTPS schemes allowed (a missing scheme is read as https)
/// - Only instagram.com, www.instagram.com, m.instagram.com
/// - Only known content paths; profile pages and everything else are rejected
///
/// # Examples
/// ```
/// use igdora::core::types::ContentType;
/// use igdora::core::validation::validate_instagram_url;
///
/// let url = validate_instagram_url("https://www.instagram.com/p/ABC123/").unwrap();
/// assert_eq!(url.content_type(), Some(ContentType::Post));
///
/// assert!(validate_instagram_url("https://www.instagram.com/username").is_err());
/// assert!(validate_instagram_url("https://www.example.com").is_err());
/// ```
pub fn validate_instagram_url(url: &str) -> Result<InstagramUrl, ValidationError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidUrl("(empty)".to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|_| ValidationError::InvalidUrl(url.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(format!(
            "{} (invalid scheme: {})",
            url,
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ValidationError::InvalidUrl(format!("{} (no host)", url)))?
        .to_lowercase();

    if !INSTAGRAM_HOSTS.contains(&host.as_str()) {
        return Err(ValidationError::InvalidUrl(format!(
            "{} (not an Instagram domain: {})",
            url, host
        )));
    }

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let class = classify_path(&segments)
        .ok_or_else(|| ValidationError::InvalidUrl(format!("{} (not a post, reel, story or highlight)", url)))?;

    Ok(InstagramUrl {
        original: trimmed.to_string(),
        parsed,
        class,
    })
}

/// Classify non-empty path segments. `None` means not a content URL.
fn classify_path(segments: &[&str]) -> Option<UrlClass> {
    let valid = |seg: &&str| SEGMENT_RE.is_match(seg);

    match segments {
        ["p" | "tv", code, ..] if valid(code) => Some(UrlClass::Known(ContentType::Post)),
        ["reel" | "reels", code, ..] if valid(code) => Some(UrlClass::Known(ContentType::Reel)),
        ["stories", "highlights", id, ..] if valid(id) => Some(UrlClass::Known(ContentType::Highlight)),
        ["stories", "highlights", ..] => None,
        ["stories", user, ..] if valid(user) => Some(UrlClass::Known(ContentType::Story)),
        ["s", code, ..] if valid(code) => {
            if code.starts_with(HIGHLIGHT_MARKER) {
                Some(UrlClass::Known(ContentType::Highlight))
            } else {
                Some(UrlClass::Ambiguous)
            }
        }
        ["share", rest @ ..] if !rest.is_empty() && rest.iter().all(valid) => Some(UrlClass::Ambiguous),
        // /<username>/p/<code>/ and /<username>/reel/<code>/
        [user, "p" | "tv", code, ..] if valid(user) && valid(code) => Some(UrlClass::Known(ContentType::Post)),
        [user, "reel" | "reels", code, ..] if valid(user) && valid(code) => {
            Some(UrlClass::Known(ContentType::Reel))
        }
        _ => None,
    }
}

/// Strip the query string: everything from the first `?` onward.
///
/// A URL without a query string is returned unchanged, which makes the
/// function idempotent.
///
/// # Examples
/// ```
/// use igdora::core::validation::clean_url;
///
/// assert_eq!(
///     clean_url("https://www.instagram.com/p/ABC123/?utm_source=ig_web_copy_link"),
///     "https://www.instagram.com/p/ABC123/"
/// );
/// ```
pub fn clean_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}

/// Sanitizes a filename by removing filesystem-unsafe characters.
///
/// Removes path separators, reserved characters (`:`, `*`, `?`, `"`, `<`,
/// `>`, `|`) and control characters.
///
/// # Examples
/// ```
/// use igdora::core::validation::sanitize_filename;
///
/// assert_eq!(sanitize_filename("ABC123.json"), "ABC123.json");
/// assert_eq!(sanitize_filename("a/b:c.json"), "abc.json");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !['/', '\\', ':', '*', '?', '"', '<', '>', '|'].contains(c))
        .filter(|c| !c.is_control())
        .collect()
}

//! Instagram cookies file check.
//!
//! gallery-dl reads the cookies file itself. This only looks for the session
//! cookies Instagram requires, so a missing or expired `sessionid` shows up
//! before a download fails with "login required".

use chrono::Utc;
use std::path::Path;

/// Cookies Instagram needs for an authenticated session
pub const REQUIRED_IG_AUTH_COOKIES: &[&str] = &["sessionid", "csrftoken", "ds_user_id"];

/// Browsers export HttpOnly cookies (sessionid among them) with this prefix.
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// The fields of a Netscape cookie line this check looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCookie {
    pub domain: String,
    pub name: String,
    /// Unix timestamp, 0 means session cookie
    pub expires: i64,
}

impl ParsedCookie {
    /// Parse one line of a Netscape cookies file. Comments and blank lines yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        let line = line.strip_prefix(HTTP_ONLY_PREFIX).unwrap_or(line);
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 7 {
            return None;
        }

        Some(Self {
            domain: parts[0].to_string(),
            expires: parts[4].parse().unwrap_or(0),
            name: parts[5].to_string(),
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires > 0 && self.expires < Utc::now().timestamp()
    }

    pub fn is_instagram(&self) -> bool {
        let domain = self.domain.trim_start_matches('.').to_lowercase();
        domain == "instagram.com" || domain.ends_with(".instagram.com")
    }
}

/// Result of checking a cookies file
#[derive(Debug, Clone, Default)]
pub struct CookiesDiagnostic {
    pub file_exists: bool,
    pub instagram_cookies: usize,
    pub auth_cookies_found: Vec<String>,
    pub auth_cookies_missing: Vec<String>,
    pub auth_cookies_expired: Vec<String>,
    pub issues: Vec<String>,
    pub is_valid: bool,
}

impl CookiesDiagnostic {
    /// Format as human-readable report
    pub fn format_report(&self) -> String {
        if !self.file_exists {
            return "❌ Cookies file not found".to_string();
        }

        let mut report = format!("🍪 {} cookies for instagram.com\n", self.instagram_cookies);
        for &name in REQUIRED_IG_AUTH_COOKIES {
            let status = if self.auth_cookies_expired.iter().any(|n| n == name) {
                "⚠️ expired"
            } else if self.auth_cookies_found.iter().any(|n| n == name) {
                "✅"
            } else {
                "❌ missing"
            };
            report.push_str(&format!("  {} {}\n", name, status));
        }

        for issue in &self.issues {
            report.push_str(&format!("  • {}\n", issue));
        }

        if self.is_valid {
            report.push_str("✅ Cookies look usable");
        } else {
            report.push_str("❌ Cookies are not usable, export them again");
        }
        report
    }
}

/// Check cookies file content for the required Instagram session cookies
pub fn diagnose_cookies_content(content: &str) -> CookiesDiagnostic {
    let mut diagnostic = CookiesDiagnostic {
        file_exists: true,
        ..Default::default()
    };

    for cookie in content.lines().filter_map(ParsedCookie::parse_line) {
        if !cookie.is_instagram() {
            continue;
        }
        diagnostic.instagram_cookies += 1;

        if REQUIRED_IG_AUTH_COOKIES.contains(&cookie.name.as_str()) {
            if cookie.is_expired() {
                diagnostic.auth_cookies_expired.push(cookie.name.clone());
            }
            diagnostic.auth_cookies_found.push(cookie.name);
        }
    }

    for &required in REQUIRED_IG_AUTH_COOKIES {
        if !diagnostic.auth_cookies_found.iter().any(|n| n == required) {
            diagnostic.auth_cookies_missing.push(required.to_string());
        }
    }

    if diagnostic.instagram_cookies == 0 {
        diagnostic.issues.push("No instagram.com cookies found".to_string());
    }
    if !diagnostic.auth_cookies_missing.is_empty() {
        diagnostic.issues.push(format!(
            "Missing required cookies: {}",
            diagnostic.auth_cookies_missing.join(", ")
        ));
    }
    if !diagnostic.auth_cookies_expired.is_empty() {
        diagnostic.issues.push(format!(
            "Expired cookies: {}",
            diagnostic.auth_cookies_expired.join(", ")
        ));
    }

    // sessionid alone decides whether gallery-dl gets a logged-in session
    let has_sessionid = diagnostic.auth_cookies_found.iter().any(|n| n == "sessionid");
    diagnostic.is_valid = has_sessionid && diagnostic.auth_cookies_expired.is_empty();

    diagnostic
}

/// Read and check a cookies file. A missing or unreadable file is reported, not returned as an error.
pub fn diagnose_cookies_file(path: &Path) -> CookiesDiagnostic {
    match std::fs::read_to_string(path) {
        Ok(content) => diagnose_cookies_content(&content),
        Err(e) => {
            let mut diagnostic = CookiesDiagnostic::default();
            if e.kind() != std::io::ErrorKind::NotFound {
                diagnostic.file_exists = true;
                diagnostic.issues.push(format!("Cannot read {}: {}", path.display(), e));
            }
            diagnostic
        }
    }
}

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Kind of Instagram content unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Post,
    Reel,
    Story,
    Highlight,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Reel => "reel",
            ContentType::Story => "story",
            ContentType::Highlight => "highlight",
        }
    }

    /// Map a gallery-dl `subcategory` to a content type.
    ///
    /// gallery-dl uses plural names for its story extractors ("stories",
    /// "highlights"); both spellings are accepted.
    pub fn from_subcategory(subcategory: &str) -> Option<Self> {
        match subcategory.trim().to_lowercase().as_str() {
            "post" | "p" | "tv" => Some(ContentType::Post),
            "reel" | "reels" | "clips" => Some(ContentType::Reel),
            "story" | "stories" => Some(ContentType::Story),
            "highlight" | "highlights" => Some(ContentType::Highlight),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(ContentType::Post),
            "reel" => Ok(ContentType::Reel),
            "story" => Ok(ContentType::Story),
            "highlight" => Ok(ContentType::Highlight),
            _ => Err(format!("Unknown content type: {}", s)),
        }
    }
}

/// Media file kind
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Infer the kind from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "heic" | "gif" => Some(MediaKind::Image),
            "mp4" | "mov" | "webm" | "m4v" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// Infer the kind from a MIME type such as `video/mp4`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_lowercase();
        if mime.starts_with("image/") {
            Some(MediaKind::Image)
        } else if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_roundtrip_names() {
        for ct in [
            ContentType::Post,
            ContentType::Reel,
            ContentType::Story,
            ContentType::Highlight,
        ] {
            assert_eq!(ct.as_str().parse::<ContentType>().unwrap(), ct);
        }
        assert!("tagged".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_content_type_from_subcategory() {
        assert_eq!(ContentType::from_subcategory("post"), Some(ContentType::Post));
        assert_eq!(ContentType::from_subcategory("stories"), Some(ContentType::Story));
        assert_eq!(ContentType::from_subcategory("highlights"), Some(ContentType::Highlight));
        assert_eq!(ContentType::from_subcategory("Reels"), Some(ContentType::Reel));
        assert_eq!(ContentType::from_subcategory("tagged"), None);
    }

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("jpg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension(".MP4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("webp"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("txt"), None);
    }

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_mime("image/jpeg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_mime("application/json"), None);
    }

    #[test]
    fn test_media_kind_strings() {
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!("image".parse::<MediaKind>().unwrap(), MediaKind::Image);
        assert_eq!(
            serde_json::to_value(ContentType::Highlight).unwrap(),
            serde_json::json!("highlight")
        );
    }
}

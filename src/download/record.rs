//! Raw extraction records and the unified content record.
//!
//! `RawRecord` is what an extractor hands back: an untyped JSON object plus the
//! file it describes, if one was written. `RawItem` is the typed view of that
//! object. It understands gallery-dl's metadata fields (`post_id`,
//! `post_shortcode`, `owner_id`, `tagged_users`, ...) and the fields of raw
//! Instagram API items (`pk`, `code`, `owner`, `usertags`, `caption.text`, ...),
//! since gallery-dl passes the latter through for some extractors.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::core::types::{ContentType, MediaKind};

/// One item as returned by an extractor, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub value: Value,
    /// Downloaded file this item describes (download mode only).
    pub local_path: Option<PathBuf>,
}

impl RawRecord {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            local_path: None,
        }
    }

    pub fn with_local_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.local_path = Some(path.into());
        self
    }
}

/// A user object as it appears in raw items (owner, coauthor, tagged user).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub pk: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
}

impl RawUser {
    /// `None` when the user carries no id: dedup is keyed by id.
    pub fn to_user_ref(&self) -> Option<UserRef> {
        let user_id = self.id.clone().or_else(|| self.pk.clone())?;
        Some(UserRef {
            username: self.username.clone().unwrap_or_default(),
            user_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUserTag {
    pub user: RawUser,
}

/// `usertags: {"in": [{"user": {...}}]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUserTags {
    #[serde(rename = "in", default)]
    pub entries: Vec<RawUserTag>,
}

/// API captions are objects, gallery-dl flattens them to `description`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCaption {
    Text(String),
    Object {
        #[serde(default)]
        text: Option<String>,
    },
}

impl RawCaption {
    pub fn text(&self) -> Option<&str> {
        match self {
            RawCaption::Text(text) => Some(text),
            RawCaption::Object { text } => text.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMediaVersion {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImageVersions {
    #[serde(default)]
    pub candidates: Vec<RawMediaVersion>,
}

/// Typed view of one raw record.
///
/// Unknown fields are ignored; known fields with the wrong JSON type make
/// deserialization fail, which the normalizer reports as a malformed batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    // identity
    #[serde(default, deserialize_with = "de_opt_id")]
    pub post_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub pk: Option<String>,
    #[serde(default)]
    pub post_shortcode: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    /// API highlight reels carry `id: "highlight:<n>"` instead of `pk`
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,

    // people
    #[serde(default, deserialize_with = "de_opt_id")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub owner: Option<RawUser>,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub coauthors: Vec<RawUser>,
    #[serde(default)]
    pub coauthor_producers: Vec<RawUser>,
    #[serde(default)]
    pub tagged_users: Vec<RawUser>,
    #[serde(default)]
    pub usertags: Option<RawUserTags>,

    // text
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub caption: Option<RawCaption>,
    #[serde(default)]
    pub highlight_title: Option<String>,
    #[serde(default)]
    pub title: Option<String>,

    // classification
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub is_private: Option<bool>,

    // time
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub post_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub taken_at: Option<DateTime<Utc>>,

    // media
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub display_url: Option<String>,
    #[serde(default)]
    pub video_versions: Vec<RawMediaVersion>,
    #[serde(default)]
    pub image_versions2: Option<RawImageVersions>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub num: Option<u32>,

    // nested media: API carousel slides, story and highlight reel items
    #[serde(default)]
    pub carousel_media: Vec<RawItem>,
    #[serde(default)]
    pub items: Vec<RawItem>,
}

/// Where a media URL came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMedia {
    pub url: String,
    /// Came from a video field, so the kind is known to be video.
    pub from_video_field: bool,
    /// Still image reported next to a video.
    pub thumbnail_url: Option<String>,
}

impl RawItem {
    /// Content id. Highlight reel ids (`highlight:123`) are reduced to the number.
    pub fn id(&self) -> Option<String> {
        self.post_id
            .as_deref()
            .or(self.pk.as_deref())
            .or(self.id.as_deref())
            .map(|id| id.rsplit(':').next().unwrap_or(id).to_string())
            .filter(|id| !id.is_empty())
    }

    pub fn shortcode(&self) -> Option<String> {
        self.post_shortcode
            .as_deref()
            .or(self.code.as_deref())
            .filter(|code| !code.is_empty())
            .map(str::to_string)
    }

    /// The account that posted the item.
    pub fn owner(&self) -> Option<UserRef> {
        if let Some(user_id) = &self.owner_id {
            return Some(UserRef {
                username: self.username.clone().unwrap_or_default(),
                user_id: user_id.clone(),
            });
        }
        self.owner
            .as_ref()
            .or(self.user.as_ref())
            .and_then(RawUser::to_user_ref)
    }

    /// Collab post co-owners, in declaration order.
    pub fn coauthors(&self) -> impl Iterator<Item = UserRef> + '_ {
        self.coauthors
            .iter()
            .chain(self.coauthor_producers.iter())
            .filter_map(RawUser::to_user_ref)
    }

    pub fn tagged(&self) -> impl Iterator<Item = UserRef> + '_ {
        let usertags = self.usertags.iter().flat_map(|tags| tags.entries.iter().map(|tag| &tag.user));
        self.tagged_users
            .iter()
            .chain(usertags)
            .filter_map(RawUser::to_user_ref)
    }

    /// Caption candidate: description, API caption text, then highlight title
    /// (gallery-dl or API spelling).
    pub fn caption_text(&self) -> Option<&str> {
        let candidates = [
            self.description.as_deref(),
            self.caption.as_ref().and_then(RawCaption::text),
            self.highlight_title.as_deref(),
            self.title.as_deref(),
        ];
        candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|text| !text.is_empty())
    }

    /// Content type declared by the item itself.
    pub fn declared_content_type(&self) -> Option<ContentType> {
        if self.product_type.as_deref() == Some("clips") {
            return Some(ContentType::Reel);
        }
        self.subcategory.as_deref().and_then(ContentType::from_subcategory)
    }

    pub fn is_private_flagged(&self) -> bool {
        self.private.unwrap_or(false)
            || self.is_private.unwrap_or(false)
            || self.owner.as_ref().and_then(|o| o.is_private).unwrap_or(false)
            || self.user.as_ref().and_then(|u| u.is_private).unwrap_or(false)
    }

    /// Post date, falling back to the per-media date, then to the first nested item.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.post_date
            .or(self.date)
            .or(self.taken_at)
            .or_else(|| self.children().iter().find_map(RawItem::timestamp))
    }

    /// Nested media items in display order. Empty for a single-media item.
    pub fn children(&self) -> &[RawItem] {
        if self.carousel_media.is_empty() {
            &self.items
        } else {
            &self.carousel_media
        }
    }

    /// Direct media URL, preferring video over the still image.
    pub fn media(&self) -> Option<RawMedia> {
        let image_url = self.display_url.clone().or_else(|| {
            self.image_versions2
                .as_ref()
                .and_then(|versions| versions.candidates.first())
                .map(|candidate| candidate.url.clone())
        });
        let video_url = self
            .video_url
            .clone()
            .or_else(|| self.video_versions.first().map(|version| version.url.clone()));

        match (video_url, image_url) {
            (Some(url), thumbnail_url) => Some(RawMedia {
                url,
                from_video_field: true,
                thumbnail_url,
            }),
            (None, Some(url)) => Some(RawMedia {
                url,
                from_video_field: false,
                thumbnail_url: None,
            }),
            (None, None) => None,
        }
    }

    /// Kind of the media file: declared extension, declared MIME type, video
    /// field, then URL path.
    pub fn media_kind(&self, media: &RawMedia) -> Option<MediaKind> {
        if let Some(kind) = self.extension.as_deref().and_then(MediaKind::from_extension) {
            return Some(kind);
        }
        if let Some(kind) = self.mime_type.as_deref().and_then(MediaKind::from_mime) {
            return Some(kind);
        }
        if media.from_video_field {
            return Some(MediaKind::Video);
        }
        url_path_extension(&media.url).and_then(|ext| MediaKind::from_extension(&ext))
    }
}

/// `https://cdn/x/123_n.jpg?stp=...` -> `jpg`
fn url_path_extension(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    let last = parsed.path_segments()?.next_back()?.to_string();
    let (_, ext) = last.rsplit_once('.')?;
    Some(ext.to_string())
}

/// A user reference in the unified record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UserRef {
    pub username: String,
    pub user_id: String,
}

/// One media file of a content unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaFile {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub local_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// 1-based carousel position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num: Option<u32>,
}

impl MediaFile {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Normalized metadata of one post, reel, story or highlight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedContentRecord {
    pub content_type: ContentType,
    /// Owner first, then collab coauthors; unique by `user_id`.
    pub owners: Vec<UserRef>,
    pub original_url: String,
    pub cleaned_url: String,
    pub caption: String,
    /// Unique by `user_id`, first-seen order.
    pub tagged_users: Vec<UserRef>,
    pub media_files: Vec<MediaFile>,
    pub is_private: bool,
    pub id: String,
    pub shortcode: String,
    pub taken_at: Option<DateTime<Utc>>,
}

impl UnifiedContentRecord {
    pub fn videos(&self) -> impl Iterator<Item = &MediaFile> {
        self.media_files.iter().filter(|file| file.is_video())
    }

    /// Files that were written to disk.
    pub fn local_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.media_files.iter().filter_map(|file| file.local_path.as_ref())
    }

    /// Copy of the record with every `local_path` passed through `relocate`.
    /// Paths it maps to `None` are dropped.
    pub fn relocated<F>(&self, mut relocate: F) -> UnifiedContentRecord
    where
        F: FnMut(&Path) -> Option<PathBuf>,
    {
        let mut record = self.clone();
        for file in &mut record.media_files {
            file.local_path = file.local_path.as_deref().and_then(&mut relocate);
        }
        record
    }
}

/// Ids arrive as JSON strings or numbers depending on the source.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected string or number id, got {}", other))),
    }
}

fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_timestamp(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unrecognized timestamp: {}", value))),
    }
}

/// Parse epoch seconds, RFC 3339 or `YYYY-MM-DD HH:MM:SS` (read as UTC).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_opt(secs, 0).single()
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<i64>() {
                return Utc.timestamp_opt(secs, 0).single();
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}

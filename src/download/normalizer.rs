//! Merges the raw items of one content unit into a [`UnifiedContentRecord`].
//!
//! Pure: no IO, only `log::debug!` output.

use std::collections::HashSet;
use thiserror::Error;

use crate::core::validation::{clean_url, InstagramUrl};
use crate::download::record::{MediaFile, RawItem, RawRecord, UnifiedContentRecord, UserRef};

/// Normalization errors
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The batch is empty, has mixed ids, or an item does not fit the schema
    #[error("malformed batch: {0}")]
    MalformedBatch(String),

    /// Neither the URL nor any item says what kind of content this is
    #[error("unknown content type for {0}")]
    UnknownContentType(String),
}

/// Merge raw records into one unified record.
///
/// All records must describe the same content unit: same id and, where
/// present, the same shortcode. The content type comes from the URL; when the
/// URL is ambiguous the first item that declares a type decides.
pub fn normalize(url: &InstagramUrl, records: &[RawRecord]) -> Result<UnifiedContentRecord, NormalizeError> {
    if records.is_empty() {
        return Err(NormalizeError::MalformedBatch("no raw items".to_string()));
    }

    let items = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value::<RawItem>(record.value.clone())
                .map_err(|e| NormalizeError::MalformedBatch(format!("item {}: {}", index, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (id, shortcode) = shared_identity(&items)?;

    let content_type = url
        .content_type()
        .or_else(|| items.iter().find_map(RawItem::declared_content_type))
        .ok_or_else(|| NormalizeError::UnknownContentType(url.original().to_string()))?;

    let mut owners = UniqueUsers::default();
    let mut tagged_users = UniqueUsers::default();
    for item in &items {
        if let Some(owner) = item.owner() {
            owners.insert(owner);
        }
        for coauthor in item.coauthors() {
            owners.insert(coauthor);
        }
        for user in item.tagged() {
            tagged_users.insert(user);
        }
        for child in item.children() {
            for user in child.tagged() {
                tagged_users.insert(user);
            }
        }
    }

    let caption = items
        .iter()
        .find_map(RawItem::caption_text)
        .unwrap_or_default()
        .to_string();

    let mut media_files = Vec::with_capacity(items.len());
    for (index, (item, record)) in items.iter().zip(records).enumerate() {
        if let Some(file) = media_file(item, index, record.local_path.clone(), item.num)? {
            media_files.push(file);
            continue;
        }
        let children = item.children();
        if children.is_empty() {
            log::debug!("Raw item {} of {} has no media URL", index, id);
            continue;
        }
        // API objects nest the slides; they were never downloaded individually
        for (position, child) in children.iter().enumerate() {
            let num = child.num.or(Some(position as u32 + 1));
            match media_file(child, index, None, num)? {
                Some(file) => media_files.push(file),
                None => log::debug!("Nested item {} of raw item {} has no media URL", position, index),
            }
        }
    }

    let is_private = items.iter().any(RawItem::is_private_flagged);
    let taken_at = items.iter().find_map(RawItem::timestamp);

    log::debug!(
        "Normalized {} {} from {} raw items: {} owners, {} tagged, {} media files",
        content_type,
        id,
        items.len(),
        owners.len(),
        tagged_users.len(),
        media_files.len()
    );

    Ok(UnifiedContentRecord {
        content_type,
        owners: owners.into_vec(),
        original_url: url.original().to_string(),
        cleaned_url: clean_url(url.original()),
        caption,
        tagged_users: tagged_users.into_vec(),
        media_files,
        is_private,
        id,
        shortcode,
        taken_at,
    })
}

fn media_file(
    item: &RawItem,
    index: usize,
    local_path: Option<std::path::PathBuf>,
    num: Option<u32>,
) -> Result<Option<MediaFile>, NormalizeError> {
    let Some(media) = item.media() else {
        return Ok(None);
    };
    let kind = item.media_kind(&media).ok_or_else(|| {
        NormalizeError::MalformedBatch(format!("item {}: cannot infer media type of {}", index, media.url))
    })?;
    Ok(Some(MediaFile {
        url: media.url,
        kind,
        local_path,
        thumbnail_url: media.thumbnail_url,
        num,
    }))
}

/// Every item must carry the same id; shortcodes must agree where present.
fn shared_identity(items: &[RawItem]) -> Result<(String, String), NormalizeError> {
    let mut id: Option<String> = None;
    let mut shortcode: Option<String> = None;

    for (index, item) in items.iter().enumerate() {
        let item_id = item
            .id()
            .ok_or_else(|| NormalizeError::MalformedBatch(format!("item {} has no id", index)))?;
        match &id {
            Some(expected) if *expected != item_id => {
                return Err(NormalizeError::MalformedBatch(format!(
                    "mixed ids: {} and {}",
                    expected, item_id
                )));
            }
            Some(_) => {}
            None => id = Some(item_id),
        }

        if let Some(item_code) = item.shortcode() {
            match &shortcode {
                Some(expected) if *expected != item_code => {
                    return Err(NormalizeError::MalformedBatch(format!(
                        "mixed shortcodes: {} and {}",
                        expected, item_code
                    )));
                }
                Some(_) => {}
                None => shortcode = Some(item_code),
            }
        }
    }

    // Non-empty batch: the loop either returned or set the id.
    let id = id.ok_or_else(|| NormalizeError::MalformedBatch("no raw items".to_string()))?;
    Ok((id, shortcode.unwrap_or_default()))
}

/// Insertion-ordered set of users keyed by user_id.
#[derive(Default)]
struct UniqueUsers {
    seen: HashSet<String>,
    users: Vec<UserRef>,
}

impl UniqueUsers {
    fn insert(&mut self, user: UserRef) {
        if self.seen.insert(user.user_id.clone()) {
            self.users.push(user);
        }
    }

    fn len(&self) -> usize {
        self.users.len()
    }

    fn into_vec(self) -> Vec<UserRef> {
        self.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ContentType, MediaKind};
    use crate::core::validation::validate_instagram_url;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn url(raw: &str) -> InstagramUrl {
        validate_instagram_url(raw).unwrap()
    }

    fn records(values: Vec<Value>) -> Vec<RawRecord> {
        values.into_iter().map(RawRecord::new).collect()
    }

    fn carousel_item(num: u32, ext: &str) -> Value {
        let video_url = match ext {
            "mp4" => json!(format!("https://cdn.example.com/{}.mp4", num)),
            _ => Value::Null,
        };
        json!({
            "post_id": "3000000000000000001",
            "post_shortcode": "ABC123",
            "owner_id": "100",
            "username": "owner",
            "description": "Carousel caption",
            "num": num,
            "extension": ext,
            "display_url": format!("https://cdn.example.com/{}.jpg", num),
            "video_url": video_url,
            "tagged_users": [{"id": "200", "username": "friend"}],
            "post_date": "2024-01-02 03:04:05"
        })
    }

    #[test]
    fn test_carousel_merges_into_one_record() {
        let batch = records(vec![carousel_item(1, "jpg"), carousel_item(2, "mp4"), carousel_item(3, "jpg")]);
        let record = normalize(&url("https://www.instagram.com/p/ABC123/?img_index=1"), &batch).unwrap();

        assert_eq!(record.content_type, ContentType::Post);
        assert_eq!(record.id, "3000000000000000001");
        assert_eq!(record.shortcode, "ABC123");
        assert_eq!(record.media_files.len(), 3);
        assert_eq!(
            record.media_files.iter().map(|f| f.num).collect::<Vec<_>>(),
            vec![Some(1), Some(2), Some(3)]
        );
        assert_eq!(record.media_files[1].kind, MediaKind::Video);
        assert_eq!(record.media_files[1].url, "https://cdn.example.com/2.mp4");
        assert_eq!(
            record.media_files[1].thumbnail_url.as_deref(),
            Some("https://cdn.example.com/2.jpg")
        );
        assert_eq!(record.media_files[0].kind, MediaKind::Image);
        assert_eq!(record.caption, "Carousel caption");
        assert_eq!(record.original_url, "https://www.instagram.com/p/ABC123/?img_index=1");
        assert_eq!(record.cleaned_url, "https://www.instagram.com/p/ABC123/");
        assert_eq!(record.taken_at.unwrap().to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert!(!record.is_private);
    }

    #[test]
    fn test_repeated_users_are_deduplicated() {
        let batch = records(vec![carousel_item(1, "jpg"), carousel_item(2, "jpg")]);
        let record = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap();

        assert_eq!(
            record.owners,
            vec![UserRef {
                username: "owner".into(),
                user_id: "100".into()
            }]
        );
        assert_eq!(record.tagged_users.len(), 1);
        assert_eq!(record.tagged_users[0].user_id, "200");
    }

    #[test]
    fn test_coauthors_follow_owner() {
        let batch = records(vec![json!({
            "post_id": "1",
            "owner_id": "100",
            "username": "owner",
            "coauthors": [
                {"id": "100", "username": "owner"},
                {"id": "300", "username": "collab"}
            ],
            "extension": "jpg",
            "display_url": "https://cdn.example.com/1.jpg"
        })]);
        let record = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap();
        let ids: Vec<_> = record.owners.iter().map(|o| o.user_id.as_str()).collect();
        assert_eq!(ids, vec!["100", "300"]);
    }

    #[test]
    fn test_tagged_users_keep_first_seen_order() {
        let batch = records(vec![
            json!({"post_id": "1", "tagged_users": [{"id": "b", "username": "bee"}, {"id": "a", "username": "ay"}]}),
            json!({"post_id": "1", "tagged_users": [{"id": "c", "username": "sea"}, {"id": "b", "username": "bee"}]}),
        ]);
        let record = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap();
        let ids: Vec<_> = record.tagged_users.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(record.media_files.is_empty());
    }

    #[test]
    fn test_empty_caption_is_empty_string() {
        let batch = records(vec![
            json!({"post_id": "1", "description": ""}),
            json!({"post_id": "1", "description": "   "}),
        ]);
        let record = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap();
        assert_eq!(record.caption, "");
    }

    #[test]
    fn test_first_non_empty_caption_wins() {
        let batch = records(vec![
            json!({"post_id": "1"}),
            json!({"post_id": "1", "description": "second"}),
            json!({"post_id": "1", "description": "third"}),
        ]);
        let record = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap();
        assert_eq!(record.caption, "second");
    }

    #[test]
    fn test_mixed_ids_are_malformed() {
        let batch = records(vec![json!({"post_id": "1"}), json!({"post_id": "2"})]);
        let err = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedBatch(_)));
    }

    #[test]
    fn test_mixed_shortcodes_are_malformed() {
        let batch = records(vec![
            json!({"post_id": "1", "post_shortcode": "AAA"}),
            json!({"post_id": "1", "post_shortcode": "BBB"}),
        ]);
        let err = normalize(&url("https://www.instagram.com/p/AAA/"), &batch).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedBatch(_)));
    }

    #[test]
    fn test_numeric_and_string_ids_match() {
        let batch = records(vec![json!({"post_id": 42}), json!({"post_id": "42"})]);
        let record = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap();
        assert_eq!(record.id, "42");
    }

    #[test]
    fn test_empty_batch_and_missing_id_are_malformed() {
        let err = normalize(&url("https://www.instagram.com/p/ABC123/"), &[]).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedBatch(_)));

        let batch = records(vec![json!({"description": "no id"})]);
        let err = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedBatch(_)));
    }

    #[test]
    fn test_non_object_item_is_malformed() {
        let batch = records(vec![json!(["not", "an", "object"])]);
        let err = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedBatch(_)));
    }

    #[test]
    fn test_uninferable_media_type_is_malformed() {
        let batch = records(vec![json!({"post_id": "1", "display_url": "https://cdn.example.com/blob"})]);
        let err = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedBatch(_)));
    }

    #[test]
    fn test_url_classification() {
        let batch = records(vec![json!({"post_id": "1"})]);
        for (raw, expected) in [
            ("https://www.instagram.com/p/ABC123/", ContentType::Post),
            ("https://www.instagram.com/reel/ABC123/", ContentType::Reel),
            ("https://www.instagram.com/stories/user/123/", ContentType::Story),
            ("https://www.instagram.com/stories/highlights/123/", ContentType::Highlight),
        ] {
            let record = normalize(&url(raw), &batch).unwrap();
            assert_eq!(record.content_type, expected, "for {}", raw);
        }
    }

    #[test]
    fn test_ambiguous_url_uses_item_flag() {
        let share = url("https://www.instagram.com/share/BAHsd8Kx1/");

        let batch = records(vec![json!({"post_id": "1", "product_type": "clips"})]);
        assert_eq!(normalize(&share, &batch).unwrap().content_type, ContentType::Reel);

        let batch = records(vec![json!({"post_id": "1", "subcategory": "post"})]);
        assert_eq!(normalize(&share, &batch).unwrap().content_type, ContentType::Post);

        let batch = records(vec![json!({"post_id": "1"})]);
        let err = normalize(&share, &batch).unwrap_err();
        assert!(matches!(err, NormalizeError::UnknownContentType(_)));
    }

    #[test]
    fn test_url_wins_over_item_flag() {
        let batch = records(vec![json!({"post_id": "1", "subcategory": "post", "product_type": "clips"})]);
        let record = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap();
        assert_eq!(record.content_type, ContentType::Post);
    }

    #[test]
    fn test_highlight_title_is_caption() {
        let batch = records(vec![
            json!({"post_id": "17947396444962429", "highlight_title": "Summer", "username": "u", "owner_id": "5",
                   "extension": "jpg", "display_url": "https://cdn.example.com/1.jpg"}),
            json!({"post_id": "17947396444962429", "highlight_title": "Summer", "username": "u", "owner_id": "5",
                   "extension": "mp4", "video_url": "https://cdn.example.com/2.mp4"}),
        ]);
        let record = normalize(&url("https://www.instagram.com/stories/highlights/17947396444962429/"), &batch).unwrap();
        assert_eq!(record.content_type, ContentType::Highlight);
        assert_eq!(record.caption, "Summer");
        assert_eq!(record.media_files.len(), 2);
        assert_eq!(record.shortcode, "");
        assert!(record.taken_at.is_none());
    }

    #[test]
    fn test_api_carousel_expands_slides() {
        let batch = records(vec![json!({
            "pk": "3001",
            "code": "ABC123",
            "user": {"pk": "100", "username": "owner"},
            "caption": {"text": "Two slides"},
            "carousel_media": [
                {"pk": "3002", "image_versions2": {"candidates": [{"url": "https://cdn.example.com/s1.jpg"}]},
                 "usertags": {"in": [{"user": {"pk": "200", "username": "friend"}}]}},
                {"pk": "3003", "video_versions": [{"url": "https://cdn.example.com/s2.mp4"}],
                 "image_versions2": {"candidates": [{"url": "https://cdn.example.com/s2.jpg"}]}}
            ]
        })]);
        let record = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap();

        assert_eq!(record.id, "3001");
        assert_eq!(record.caption, "Two slides");
        assert_eq!(record.media_files.len(), 2);
        assert_eq!(record.media_files[0].url, "https://cdn.example.com/s1.jpg");
        assert_eq!(record.media_files[0].kind, MediaKind::Image);
        assert_eq!(record.media_files[1].url, "https://cdn.example.com/s2.mp4");
        assert_eq!(record.media_files[1].kind, MediaKind::Video);
        assert_eq!(
            record.media_files.iter().map(|f| f.num).collect::<Vec<_>>(),
            vec![Some(1), Some(2)]
        );
        assert_eq!(record.local_files().count(), 0);
        assert_eq!(record.tagged_users.len(), 1);
        assert_eq!(record.tagged_users[0].user_id, "200");
    }

    #[test]
    fn test_api_highlight_reel_items() {
        let batch = records(vec![json!({
            "id": "highlight:17947396444962429",
            "title": "Trips",
            "user": {"pk": "5", "username": "u"},
            "items": [
                {"pk": "1", "taken_at": 1700000000,
                 "image_versions2": {"candidates": [{"url": "https://cdn.example.com/h1.jpg"}]}},
                {"pk": "2", "taken_at": 1700000100,
                 "video_versions": [{"url": "https://cdn.example.com/h2.mp4"}]}
            ]
        })]);
        let record = normalize(&url("https://www.instagram.com/stories/highlights/17947396444962429/"), &batch).unwrap();

        assert_eq!(record.content_type, ContentType::Highlight);
        assert_eq!(record.id, "17947396444962429");
        assert_eq!(record.caption, "Trips");
        assert_eq!(record.owners[0].username, "u");
        assert_eq!(record.media_files.len(), 2);
        assert_eq!(record.media_files[1].kind, MediaKind::Video);
        assert_eq!(record.taken_at.unwrap().timestamp(), 1700000000);
    }

    #[test]
    fn test_private_flag_from_any_item() {
        let batch = records(vec![
            json!({"post_id": "1"}),
            json!({"post_id": "1", "owner": {"id": "9", "username": "p", "is_private": true}}),
        ]);
        let record = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap();
        assert!(record.is_private);
    }

    #[test]
    fn test_local_paths_are_carried() {
        let batch = vec![
            RawRecord::new(carousel_item(1, "jpg")).with_local_path("/tmp/instagram_x/1.jpg"),
            RawRecord::new(carousel_item(2, "jpg")),
        ];
        let record = normalize(&url("https://www.instagram.com/p/ABC123/"), &batch).unwrap();
        assert_eq!(
            record.media_files[0].local_path.as_deref(),
            Some(std::path::Path::new("/tmp/instagram_x/1.jpg"))
        );
        assert!(record.media_files[1].local_path.is_none());
        assert_eq!(record.local_files().count(), 1);
    }
}

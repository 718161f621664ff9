//! Raw items shaped like gallery-dl's Instagram metadata.

#![allow(dead_code)]

use serde_json::{json, Value};

pub fn user(id: &str, username: &str) -> Value {
    json!({ "id": id, "username": username })
}

/// One image of a post. `num` is the 1-based position in the carousel.
pub fn post_item(id: &str, shortcode: &str, num: u32) -> Value {
    json!({
        "category": "instagram",
        "subcategory": "post",
        "post_id": id,
        "post_shortcode": shortcode,
        "owner_id": "1001",
        "username": "alice",
        "fullname": "Alice",
        "description": "sunset at the pier",
        "date": "2024-05-01 18:30:00",
        "post_date": "2024-05-01 18:30:00",
        "display_url": format!("https://scontent.cdninstagram.com/v/{}_{}.jpg?stp=dst-jpg", id, num),
        "extension": "jpg",
        "num": num,
        "tagged_users": [],
        "coauthors": []
    })
}

/// `count` images of the same post.
pub fn carousel(id: &str, shortcode: &str, count: u32) -> Vec<Value> {
    (1..=count).map(|num| post_item(id, shortcode, num)).collect()
}

pub fn reel_item(id: &str, shortcode: &str) -> Value {
    json!({
        "category": "instagram",
        "subcategory": "reel",
        "post_id": id,
        "post_shortcode": shortcode,
        "owner_id": "1001",
        "username": "alice",
        "description": "",
        "post_date": 1714588200,
        "video_url": format!("https://scontent.cdninstagram.com/o1/v/{}.mp4?efg=x", id),
        "display_url": format!("https://scontent.cdninstagram.com/v/{}_thumb.jpg", id),
        "extension": "mp4",
        "num": 1
    })
}

/// One frame of a user's story reel. Every frame shares the reel's
/// `post_id` and carries its own `media_id`.
pub fn story_item(reel_id: &str, num: u32) -> Value {
    let media_id = format!("{}{:03}", reel_id, num);
    let (extension, video_url) = if num % 2 == 0 {
        ("mp4", json!(format!("https://scontent.cdninstagram.com/o1/v/{}.mp4", media_id)))
    } else {
        ("jpg", Value::Null)
    };
    json!({
        "category": "instagram",
        "subcategory": "stories",
        "post_id": reel_id,
        "post_shortcode": format!("St{}", reel_id),
        "media_id": media_id,
        "owner_id": "1001",
        "username": "alice",
        "date": 1714588200 + num,
        "display_url": format!("https://scontent.cdninstagram.com/v/{}.jpg", media_id),
        "video_url": video_url,
        "extension": extension,
        "num": num
    })
}

/// Frames `1..=count` of one story reel.
pub fn story_reel(reel_id: &str, count: u32) -> Vec<Value> {
    (1..=count).map(|num| story_item(reel_id, num)).collect()
}

pub fn highlight_item(reel_id: &str, title: &str, num: u32) -> Value {
    json!({
        "category": "instagram",
        "subcategory": "highlights",
        "post_id": format!("highlight:{}", reel_id),
        "owner_id": "1001",
        "username": "alice",
        "highlight_title": title,
        "date": 1714588200,
        "display_url": format!("https://scontent.cdninstagram.com/v/h{}_{}.jpg", reel_id, num),
        "extension": "jpg",
        "num": num
    })
}

//! Unit tests for raw feed item conversion against realistic payloads

use crate::support::{carousel_item, image_item, video_item};
use post_archiver::fetcher::{FetcherError, PostConverter, RawFeedPage, RawItem};
use post_archiver::{MediaKind, MediaType};
use serde_json::json;

fn raw(value: serde_json::Value) -> RawItem {
    serde_json::from_value(value).unwrap()
}

#[test]
fn test_full_payload_with_unknown_fields_converts() {
    // Feed items carry far more keys than the converter reads
    let item = raw(json!({
        "id": "3141592653589793238_42",
        "pk": 3141592653589793238u64,
        "code": "CzAbc",
        "media_type": 1,
        "taken_at": 1_700_000_000,
        "device_timestamp": 170000000012345u64,
        "caption": { "text": "Sunset #travel #sea", "user_id": 42, "pk": "9" },
        "like_count": 1024,
        "comment_count": 33,
        "user": { "pk": 42, "username": "someone" },
        "image_versions2": {
            "candidates": [{ "url": "https://cdn.example.com/a.jpg", "width": 1440, "height": 1800 }],
            "additional_candidates": {}
        },
        "original_width": 1440,
        "original_height": 1800
    }));

    let post = PostConverter::convert(&item).unwrap();

    assert_eq!(post.id, "3141592653589793238_42");
    assert_eq!(post.media_type, MediaType::Image);
    assert_eq!(post.permalink, "https://www.instagram.com/p/CzAbc/");
    assert_eq!(post.timestamp.timestamp(), 1_700_000_000);
    assert_eq!(post.likes_count, Some(1024));
    assert_eq!(post.comments_count, Some(33));
    assert_eq!(post.hashtags, vec!["travel", "sea"]);
    assert_eq!(post.media_files[0].dimensions(), Some((1440, 1800)));
    assert!(!post.is_archived);
    assert!(post.local_path.is_none());
}

#[test]
fn test_numeric_id_is_accepted() {
    let mut value = image_item("1", 1_700_000_000);
    value["id"] = json!(987654321u64);

    let post = PostConverter::convert(&raw(value)).unwrap();
    assert_eq!(post.id, "987654321");
}

#[test]
fn test_video_prefers_video_rendition_over_cover() {
    let post = PostConverter::convert(&raw(video_item("7", 1_700_000_000))).unwrap();

    assert_eq!(post.media_type, MediaType::Video);
    assert_eq!(post.media_files.len(), 1);
    assert_eq!(post.media_files[0].kind, MediaKind::Video);
    assert_eq!(post.media_files[0].url, "https://cdn.example.com/7.mp4");
    assert!(post.caption.is_none());
    assert!(post.hashtags.is_empty());
}

#[test]
fn test_carousel_children_keep_order_and_kinds() {
    let post = PostConverter::convert(&raw(carousel_item("9", 1_700_000_000))).unwrap();

    assert_eq!(post.media_type, MediaType::CarouselAlbum);
    let kinds: Vec<MediaKind> = post.media_files.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![MediaKind::Image, MediaKind::Video]);
    assert_eq!(post.media_files[0].url, "https://cdn.example.com/9_0.jpg");

    let location = post.location.unwrap();
    assert_eq!(location.id.as_deref(), Some("777"));
    assert_eq!(location.name.as_deref(), Some("Harbour"));
    assert_eq!(location.latitude, Some(59.9));
}

#[test]
fn test_carousel_with_broken_child_is_malformed() {
    let mut value = carousel_item("9", 1_700_000_000);
    value["carousel_media"][1]["video_versions"] = json!([]);

    let err = PostConverter::convert(&raw(value)).unwrap_err();
    assert!(matches!(err, FetcherError::MalformedItem(ref m) if m.contains("9c1")));
}

#[test]
fn test_unknown_discriminator_is_treated_as_image() {
    let mut value = image_item("5", 1_700_000_000);
    value["media_type"] = json!(99);

    let post = PostConverter::convert(&raw(value)).unwrap();
    assert_eq!(post.media_type, MediaType::Image);
    assert_eq!(post.media_files[0].kind, MediaKind::Image);
}

#[test]
fn test_page_of_mixed_items_converts_in_order() {
    let page: RawFeedPage = serde_json::from_value(json!({
        "items": [
            image_item("1", 1_700_000_300),
            video_item("2", 1_700_000_200),
            carousel_item("3", 1_700_000_100)
        ],
        "more_available": false
    }))
    .unwrap();

    let posts: Vec<_> = page
        .items
        .iter()
        .map(PostConverter::convert)
        .collect::<Result<_, _>>()
        .unwrap();

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(posts.iter().map(|p| p.media_files.len()).sum::<usize>(), 4);
}

#[test]
fn test_hashtag_edge_cases() {
    assert_eq!(
        PostConverter::extract_hashtags("#one two #three #one"),
        vec!["one", "three", "one"]
    );
    // Only the leading '#' is stripped
    assert_eq!(
        PostConverter::extract_hashtags("# ## c# ##double"),
        vec!["", "#", "#double"]
    );
    assert!(PostConverter::extract_hashtags("").is_empty());
    assert_eq!(PostConverter::extract_hashtags("line\n#next"), vec!["next"]);
}

//! Unit tests for media file placement

use crate::support::carousel_item;
use post_archiver::fetcher::PostConverter;
use post_archiver::output::local::{LocalArchiveSink, METADATA_DIR};
use post_archiver::output::path::sanitize_component;
use post_archiver::output::{ArchiveSink, MediaPathBuilder};
use post_archiver::MediaKind;
use std::path::PathBuf;

#[test]
fn test_timestamp_prefix_is_utc() {
    let builder = MediaPathBuilder::new(PathBuf::from("/archive"));
    // 2024-01-01T00:00:59Z
    let taken = chrono::DateTime::from_timestamp(1_704_067_259, 0).unwrap();

    assert_eq!(
        builder.build("123_456", taken, 0, MediaKind::Image),
        PathBuf::from("/archive/images/20240101_000059_123_456.jpg")
    );
}

#[test]
fn test_hostile_ids_stay_inside_the_kind_directory() {
    let builder = MediaPathBuilder::new(PathBuf::from("/archive"));
    let taken = chrono::DateTime::from_timestamp(0, 0).unwrap();

    let path = builder.build("../../etc/x", taken, 0, MediaKind::Video);

    assert_eq!(path.parent().unwrap(), PathBuf::from("/archive/videos"));
    assert!(!sanitize_component("a/../b").contains('/'));
}

#[tokio::test]
async fn test_sink_creates_layout_and_writes_carousel_files() {
    let dir = tempfile::tempdir().unwrap();
    let sink = LocalArchiveSink::new(dir.path()).unwrap();

    for sub in ["images", "videos", METADATA_DIR] {
        assert!(dir.path().join(sub).is_dir(), "{sub} was not created");
    }

    let post =
        PostConverter::convert(&serde_json::from_value(carousel_item("77", 1_700_000_000)).unwrap())
            .unwrap();

    let first = sink
        .write_media(&post, 0, b"jpeg", post.media_files[0].kind)
        .await
        .unwrap();
    let second = sink
        .write_media(&post, 1, b"mp4", post.media_files[1].kind)
        .await
        .unwrap();

    assert_eq!(
        first,
        dir.path().join("images").join("20231114_221320_77.jpg")
    );
    assert_eq!(
        second,
        dir.path().join("videos").join("20231114_221320_77_1.mp4")
    );
    assert_eq!(std::fs::read(&first).unwrap(), b"jpeg");
    assert_eq!(std::fs::read(&second).unwrap(), b"mp4");
}

//! Raw item to [`Post`] conversion
//!
//! Stateless: every function maps a deserialized [`RawItem`] onto the typed
//! model without I/O. Structure required by an item's discriminator (variant
//! lists, id, code, capture time) is checked here and reported as
//! [`FetcherError::MalformedItem`]; optional fields degrade to `None`.

use crate::fetcher::raw::{RawItem, RawLocation, RawVariant};
use crate::fetcher::{FetcherError, FetcherResult};
use crate::{Location, MediaFile, MediaKind, MediaType, Post};
use chrono::{DateTime, Utc};

/// Public post URL prefix
pub const PERMALINK_BASE: &str = "https://www.instagram.com/p/";

/// Stateless converter for raw feed items
pub struct PostConverter;

impl PostConverter {
    /// Convert one raw feed item into a [`Post`]
    ///
    /// Carousel albums (discriminator 8) yield one media file per child in
    /// child order. Videos (2) use the first video rendition. Anything else is
    /// treated as an image and uses the first image candidate.
    ///
    /// # Errors
    /// [`FetcherError::MalformedItem`] when the id, code, capture time or the
    /// renditions required by the discriminator are missing, or when a
    /// carousel has no children.
    pub fn convert(item: &RawItem) -> FetcherResult<Post> {
        if item.id.is_empty() {
            return Err(FetcherError::MalformedItem("item has no id".to_string()));
        }

        let code = item
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| FetcherError::MalformedItem(format!("item {} has no code", item.id)))?;

        let taken_at = item.taken_at.ok_or_else(|| {
            FetcherError::MalformedItem(format!("item {} has no taken_at", item.id))
        })?;
        let timestamp = DateTime::<Utc>::from_timestamp(taken_at, 0).ok_or_else(|| {
            FetcherError::MalformedItem(format!(
                "item {} has out-of-range taken_at {taken_at}",
                item.id
            ))
        })?;

        let media_type = MediaType::from_discriminator(item.media_type);
        let media_files = match media_type {
            MediaType::CarouselAlbum => {
                let children = item.carousel_media.as_deref().unwrap_or_default();
                if children.is_empty() {
                    return Err(FetcherError::MalformedItem(format!(
                        "carousel {} has no children",
                        item.id
                    )));
                }
                children
                    .iter()
                    .map(Self::extract_media)
                    .collect::<FetcherResult<Vec<_>>>()?
            }
            _ => vec![Self::extract_media(item)?],
        };

        let caption = item.caption.as_ref().and_then(|c| c.text.clone());
        let hashtags = caption
            .as_deref()
            .map(Self::extract_hashtags)
            .unwrap_or_default();

        Ok(Post {
            id: item.id.clone(),
            caption,
            media_type,
            media_files,
            timestamp,
            permalink: Self::permalink(code),
            likes_count: item.like_count,
            comments_count: item.comment_count,
            hashtags,
            location: item.location.as_ref().map(Self::convert_location),
            is_archived: false,
            local_path: None,
        })
    }

    /// Extract the single media file of a non-carousel item or carousel child
    ///
    /// # Errors
    /// [`FetcherError::MalformedItem`] when the required rendition list is
    /// absent or empty.
    pub fn extract_media(item: &RawItem) -> FetcherResult<MediaFile> {
        if item.media_type == MediaType::VIDEO_DISCRIMINATOR {
            let variant = item
                .video_versions
                .as_deref()
                .and_then(|versions| versions.first())
                .ok_or_else(|| {
                    FetcherError::MalformedItem(format!("video {} has no video_versions", item.id))
                })?;
            Ok(Self::media_file(variant, MediaKind::Video))
        } else {
            let variant = item
                .image_versions2
                .as_ref()
                .and_then(|versions| versions.candidates.first())
                .ok_or_else(|| {
                    FetcherError::MalformedItem(format!("image {} has no candidates", item.id))
                })?;
            Ok(Self::media_file(variant, MediaKind::Image))
        }
    }

    /// Hashtags in a caption, in order, duplicates kept
    ///
    /// Only the first `#` of a token is removed, so `##tag` yields `#tag` and
    /// a bare `#` yields an empty tag.
    ///
    /// # Examples
    /// ```
    /// use post_archiver::fetcher::PostConverter;
    ///
    /// assert_eq!(
    ///     PostConverter::extract_hashtags("hello #foo #bar baz"),
    ///     vec!["foo", "bar"]
    /// );
    /// ```
    pub fn extract_hashtags(caption: &str) -> Vec<String> {
        caption
            .split_whitespace()
            .filter_map(|token| token.strip_prefix('#'))
            .map(str::to_string)
            .collect()
    }

    /// Public URL for a shortcode
    pub fn permalink(code: &str) -> String {
        format!("{PERMALINK_BASE}{code}/")
    }

    fn media_file(variant: &RawVariant, kind: MediaKind) -> MediaFile {
        let (width, height) = match (variant.width, variant.height) {
            (Some(w), Some(h)) => (Some(w), Some(h)),
            _ => (None, None),
        };
        MediaFile {
            url: variant.url.clone(),
            kind,
            width,
            height,
        }
    }

    fn convert_location(raw: &RawLocation) -> Location {
        Location {
            id: raw.pk.clone(),
            name: raw.name.clone(),
            latitude: raw.lat,
            longitude: raw.lng,
        }
    }
}

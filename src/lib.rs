//! # Post Archiver Library
//!
//! Archives a user's social-media post history: pages through the private
//! platform feed under a request budget, converts raw feed items into typed
//! [`Post`] records, marks each post archived remotely, downloads its media
//! and exports the metadata as JSON and CSV.
//!
//! ## Quick Start
//!
//! ```no_run
//! use post_archiver::archiver::{ArchiveOrchestrator, RateLimiter};
//! use post_archiver::config::ArchiveConfig;
//! use post_archiver::fetcher::http::HttpPlatformClient;
//! use post_archiver::fetcher::media::HttpMediaFetcher;
//! use post_archiver::output::local::LocalArchiveSink;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ArchiveConfig::default();
//! let limiter = Arc::new(RateLimiter::from_config(&config)?);
//! let api = Arc::new(HttpPlatformClient::from_config(&config)?);
//! let media = Arc::new(HttpMediaFetcher::from_config(&config)?);
//! let sink = Arc::new(LocalArchiveSink::new(&config.archive_base_path)?);
//!
//! let orchestrator = ArchiveOrchestrator::new(api, media, sink, limiter, &config);
//! let report = orchestrator.run(&config.credentials()).await?;
//! println!("{} posts persisted", report.total());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`shortcode`] - Public shortcode <-> numeric media id codec
//! - [`fetcher`] - Remote API seam, raw schema, conversion and feed pagination
//! - [`archiver`] - Request pacing and the fault-isolated archive pipeline
//! - [`output`] - Media files and metadata export
//! - [`config`] - Run configuration assembled once at startup
//! - [`cli`] - Command line surface

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Fault-isolated archive pipeline and request pacing
pub mod archiver;

/// CLI command implementations
pub mod cli;

/// Run configuration
pub mod config;

/// Remote API access, raw schema and conversion
pub mod fetcher;

/// Metrics recording and Prometheus exporter
pub mod metrics;

/// Media and metadata writers
pub mod output;

/// Shortcode codec
pub mod shortcode;

/// Graceful shutdown signalling
pub mod shutdown;

pub use shortcode::ShortcodeError;

/// Kind of a whole post as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    /// Single image
    #[serde(rename = "IMAGE")]
    Image,
    /// Single video
    #[serde(rename = "VIDEO")]
    Video,
    /// Ordered album of images and videos
    #[serde(rename = "CAROUSEL_ALBUM")]
    CarouselAlbum,
}

impl MediaType {
    /// Platform discriminator for carousel albums
    pub const CAROUSEL_DISCRIMINATOR: i64 = 8;

    /// Platform discriminator for videos
    pub const VIDEO_DISCRIMINATOR: i64 = 2;

    /// Map the platform's numeric media type onto a post kind.
    ///
    /// Anything that is neither a carousel nor a video is treated as an image.
    pub fn from_discriminator(value: i64) -> Self {
        match value {
            Self::CAROUSEL_DISCRIMINATOR => MediaType::CarouselAlbum,
            Self::VIDEO_DISCRIMINATOR => MediaType::Video,
            _ => MediaType::Image,
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
            MediaType::CarouselAlbum => "CAROUSEL_ALBUM",
        };
        write!(f, "{s}")
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IMAGE" => Ok(MediaType::Image),
            "VIDEO" => Ok(MediaType::Video),
            "CAROUSEL_ALBUM" => Ok(MediaType::CarouselAlbum),
            _ => Err(format!("Invalid media type: {s}")),
        }
    }
}

/// Kind of a single downloadable media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image, stored as `.jpg`
    Image,
    /// Video, stored as `.mp4`
    Video,
}

impl MediaKind {
    /// File extension (with leading dot) used when storing this kind
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => ".jpg",
            MediaKind::Video => ".mp4",
        }
    }

    /// Directory name under the archive root for this kind
    pub fn directory(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// One downloadable media variant of a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaFile {
    /// Source URL
    pub url: String,
    /// Image or video
    pub kind: MediaKind,
    /// Width in pixels, present only together with `height`
    pub width: Option<u32>,
    /// Height in pixels, present only together with `width`
    pub height: Option<u32>,
}

impl MediaFile {
    /// Width and height when the source supplied both
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }

    /// Validate media file integrity
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Media URL cannot be empty".to_string());
        }

        if self.width.is_some() != self.height.is_some() {
            return Err(format!(
                "Width and height must be present together, got width={:?} height={:?}",
                self.width, self.height
            ));
        }

        Ok(())
    }
}

/// Location tagged on a post
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Platform location id
    pub id: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
}

/// A converted post
///
/// Created once per raw feed item. Only `is_archived` and `local_path` change
/// afterwards, set by the archive and download steps respectively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Platform media id
    pub id: String,
    /// Caption text
    pub caption: Option<String>,
    /// Post kind
    pub media_type: MediaType,
    /// Media files in display order, never empty
    pub media_files: Vec<MediaFile>,
    /// Capture time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Public URL of the post
    pub permalink: String,
    /// Like count, if exposed
    pub likes_count: Option<u64>,
    /// Comment count, if exposed
    pub comments_count: Option<u64>,
    /// Hashtags found in the caption, in order, duplicates kept
    pub hashtags: Vec<String>,
    /// Tagged location
    pub location: Option<Location>,
    /// Whether the remote archive call succeeded
    #[serde(default)]
    pub is_archived: bool,
    /// Local path of the downloaded media, set once every file was written
    #[serde(default)]
    pub local_path: Option<PathBuf>,
}

impl Post {
    /// Validate post integrity
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("Post id cannot be empty".to_string());
        }

        if self.media_files.is_empty() {
            return Err(format!("Post {} has no media files", self.id));
        }

        if self.media_type != MediaType::CarouselAlbum && self.media_files.len() != 1 {
            return Err(format!(
                "Post {} of type {} must have exactly one media file, got {}",
                self.id,
                self.media_type,
                self.media_files.len()
            ));
        }

        for media in &self.media_files {
            media.validate()?;
        }

        Ok(())
    }
}

//! Media file naming
//!
//! Files land under a per-kind directory of the archive root:
//!
//! ```text
//! {root}/images/{YYYYMMDD_HHMMSS}_{post_id}.jpg
//! {root}/videos/{YYYYMMDD_HHMMSS}_{post_id}.mp4
//! {root}/images/{YYYYMMDD_HHMMSS}_{post_id}_{index}.jpg   (album children after the first)
//! ```
//!
//! # Usage Example
//!
//! ```rust
//! use post_archiver::output::MediaPathBuilder;
//! use post_archiver::MediaKind;
//! use chrono::{DateTime, Utc};
//! use std::path::PathBuf;
//!
//! let builder = MediaPathBuilder::new(PathBuf::from("archive"));
//! let taken = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
//!
//! let path = builder.build("3141_42", taken, 0, MediaKind::Video);
//! assert_eq!(path, PathBuf::from("archive/videos/20231114_221320_3141_42.mp4"));
//! ```

use crate::MediaKind;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Timestamp prefix format for media file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Builds media file paths under an archive root
#[derive(Debug, Clone)]
pub struct MediaPathBuilder {
    root_dir: PathBuf,
}

impl MediaPathBuilder {
    /// Create a builder rooted at `root_dir`
    pub fn new(root_dir: PathBuf) -> Self {
        Self { root_dir }
    }

    /// Archive root
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Directory holding files of `kind`
    pub fn kind_dir(&self, kind: MediaKind) -> PathBuf {
        self.root_dir.join(kind.directory())
    }

    /// File name for the `index`-th media file of a post
    pub fn file_name(
        &self,
        post_id: &str,
        taken_at: DateTime<Utc>,
        index: usize,
        kind: MediaKind,
    ) -> String {
        let stamp = taken_at.format(FILE_TIMESTAMP_FORMAT);
        let id = sanitize_component(post_id);
        if index == 0 {
            format!("{stamp}_{id}{}", kind.extension())
        } else {
            format!("{stamp}_{id}_{index}{}", kind.extension())
        }
    }

    /// Full path for the `index`-th media file of a post
    pub fn build(
        &self,
        post_id: &str,
        taken_at: DateTime<Utc>,
        index: usize,
        kind: MediaKind,
    ) -> PathBuf {
        self.kind_dir(kind)
            .join(self.file_name(post_id, taken_at, index, kind))
    }
}

/// Make an identifier safe to use as part of a file name
///
/// Characters `/`, `\`, `:` and `..` are replaced with `_`.
pub fn sanitize_component(name: &str) -> String {
    name.replace("..", "__").replace(['/', '\\', ':'], "_")
}

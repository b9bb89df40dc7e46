//! Media and metadata writers

use crate::{MediaKind, Post};
use async_trait::async_trait;
use std::path::PathBuf;

pub mod local;
pub mod metadata;
pub mod path;

pub use local::LocalArchiveSink;
pub use metadata::MetadataRecord;
pub use path::MediaPathBuilder;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for downloaded media and the run's metadata export
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Store one media file of `post`
    ///
    /// `index` is the file's position in `post.media_files`.
    /// Returns the path the bytes were written to.
    async fn write_media(
        &self,
        post: &Post,
        index: usize,
        bytes: &[u8],
        kind: MediaKind,
    ) -> OutputResult<PathBuf>;

    /// Export one metadata record per post, replacing any previous export
    async fn write_metadata(&self, posts: &[Post]) -> OutputResult<()>;
}

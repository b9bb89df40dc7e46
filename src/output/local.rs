//! Filesystem archive sink

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::metadata::{self, MetadataRecord};
use super::path::MediaPathBuilder;
use super::{ArchiveSink, OutputError, OutputResult};
use crate::{MediaKind, Post};

/// Metadata directory under the archive root
pub const METADATA_DIR: &str = "metadata";

/// JSON metadata file name
pub const METADATA_JSON: &str = "posts_metadata.json";

/// CSV metadata file name
pub const METADATA_CSV: &str = "posts_metadata.csv";

/// Writes media and metadata below a local archive root
#[derive(Debug, Clone)]
pub struct LocalArchiveSink {
    paths: MediaPathBuilder,
    metadata_dir: PathBuf,
}

impl LocalArchiveSink {
    /// Create the sink, creating `images/`, `videos/` and `metadata/` under `root`
    pub fn new(root: impl AsRef<Path>) -> OutputResult<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = MediaPathBuilder::new(root.clone());
        let metadata_dir = root.join(METADATA_DIR);

        for dir in [
            paths.kind_dir(MediaKind::Image),
            paths.kind_dir(MediaKind::Video),
            metadata_dir.clone(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                OutputError::IoError(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }

        debug!(root = %root.display(), "Archive directories ready");
        Ok(Self {
            paths,
            metadata_dir,
        })
    }

    /// Archive root
    pub fn root(&self) -> &Path {
        self.paths.root_dir()
    }

    /// Path of the JSON metadata export
    pub fn json_path(&self) -> PathBuf {
        self.metadata_dir.join(METADATA_JSON)
    }

    /// Path of the CSV metadata export
    pub fn csv_path(&self) -> PathBuf {
        self.metadata_dir.join(METADATA_CSV)
    }
}

#[async_trait]
impl ArchiveSink for LocalArchiveSink {
    async fn write_media(
        &self,
        post: &Post,
        index: usize,
        bytes: &[u8],
        kind: MediaKind,
    ) -> OutputResult<PathBuf> {
        let path = self.paths.build(&post.id, post.timestamp, index, kind);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| OutputError::IoError(format!("Failed to write {}: {e}", path.display())))?;

        debug!(post_id = %post.id, index, path = %path.display(), bytes = bytes.len(), "Media written");
        Ok(path)
    }

    async fn write_metadata(&self, posts: &[Post]) -> OutputResult<()> {
        let download_date = Utc::now();
        let records: Vec<MetadataRecord> = posts
            .iter()
            .map(|post| MetadataRecord::from_post(post, download_date))
            .collect();

        let count = records.len();
        let (json_path, csv_path) = (self.json_path(), self.csv_path());

        // Both writers sync to disk
        tokio::task::spawn_blocking(move || {
            metadata::write_json(&json_path, &records)?;
            metadata::write_csv(&csv_path, &records)
        })
        .await
        .map_err(|e| OutputError::IoError(format!("Metadata writer task failed: {e}")))??;

        info!(
            posts = count,
            dir = %self.metadata_dir.display(),
            "Metadata exported"
        );
        Ok(())
    }
}

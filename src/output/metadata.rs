//! Flattened metadata export
//!
//! Every post becomes one [`MetadataRecord`]. The same records are written
//! as a pretty-printed JSON array and as a CSV file with an identical column
//! set. Both files are written to a temporary sibling first and renamed into
//! place, so a failed export never leaves a truncated file behind.

use crate::Post;
use chrono::{DateTime, SecondsFormat, Utc};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{OutputError, OutputResult};

const DEFAULT_BUFFER_SIZE: usize = 8192;

/// One exported post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Post id
    pub id: String,
    /// Caption text
    pub caption: Option<String>,
    /// `IMAGE`, `VIDEO` or `CAROUSEL_ALBUM`
    pub media_type: String,
    /// Capture time, ISO-8601 UTC
    pub timestamp: String,
    /// Public URL
    pub permalink: String,
    /// Like count
    pub likes_count: Option<u64>,
    /// Comment count
    pub comments_count: Option<u64>,
    /// Hashtags joined with commas
    pub hashtags: String,
    /// Location name
    pub location_name: Option<String>,
    /// Location latitude
    pub location_lat: Option<f64>,
    /// Location longitude
    pub location_lng: Option<f64>,
    /// Whether the remote archive call succeeded
    pub is_archived: bool,
    /// Local media path
    pub local_path: Option<String>,
    /// Number of media files
    pub media_count: usize,
    /// Export time, ISO-8601 UTC
    pub download_date: String,
}

impl MetadataRecord {
    /// Column names, in export order
    pub const COLUMNS: [&'static str; 15] = [
        "id",
        "caption",
        "media_type",
        "timestamp",
        "permalink",
        "likes_count",
        "comments_count",
        "hashtags",
        "location_name",
        "location_lat",
        "location_lng",
        "is_archived",
        "local_path",
        "media_count",
        "download_date",
    ];

    /// Flatten `post`, stamping it with `download_date`
    pub fn from_post(post: &Post, download_date: DateTime<Utc>) -> Self {
        let location = post.location.as_ref();
        Self {
            id: post.id.clone(),
            caption: post.caption.clone(),
            media_type: post.media_type.to_string(),
            timestamp: iso8601(post.timestamp),
            permalink: post.permalink.clone(),
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            hashtags: post.hashtags.join(","),
            location_name: location.and_then(|l| l.name.clone()),
            location_lat: location.and_then(|l| l.latitude),
            location_lng: location.and_then(|l| l.longitude),
            is_archived: post.is_archived,
            local_path: post
                .local_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            media_count: post.media_files.len(),
            download_date: iso8601(download_date),
        }
    }
}

/// Render a UTC time as ISO-8601 with an explicit offset
pub fn iso8601(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Write `records` as a pretty JSON array to `path`
pub fn write_json(path: &Path, records: &[MetadataRecord]) -> OutputResult<()> {
    let tmp = temp_path(path);
    let file = File::create(&tmp)
        .map_err(|e| OutputError::IoError(format!("Failed to create {}: {e}", tmp.display())))?;
    let mut writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

    serde_json::to_writer_pretty(&mut writer, records)
        .map_err(|e| OutputError::SerializationError(e.to_string()))?;
    writer
        .flush()
        .map_err(|e| OutputError::IoError(format!("Failed to flush: {e}")))?;
    sync(writer)?;

    persist(&tmp, path)?;
    debug!(path = %path.display(), records = records.len(), "JSON metadata written");
    Ok(())
}

/// Write `records` as CSV with a header row to `path`
///
/// The header is written even when there are no records.
pub fn write_csv(path: &Path, records: &[MetadataRecord]) -> OutputResult<()> {
    let tmp = temp_path(path);
    let file = File::create(&tmp)
        .map_err(|e| OutputError::IoError(format!("Failed to create {}: {e}", tmp.display())))?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file));

    writer
        .write_record(MetadataRecord::COLUMNS)
        .map_err(|e| OutputError::CsvError(format!("Failed to write header: {e}")))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| OutputError::CsvError(format!("Failed to write record {}: {e}", record.id)))?;
    }

    writer
        .flush()
        .map_err(|e| OutputError::IoError(format!("Failed to flush: {e}")))?;
    let buf_writer = writer
        .into_inner()
        .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;
    sync(buf_writer)?;

    persist(&tmp, path)?;
    debug!(path = %path.display(), records = records.len(), "CSV metadata written");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn sync(writer: BufWriter<File>) -> OutputResult<()> {
    let file = writer
        .into_inner()
        .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;
    file.sync_all()
        .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))
}

fn persist(tmp: &Path, path: &Path) -> OutputResult<()> {
    fs::rename(tmp, path).map_err(|e| {
        OutputError::IoError(format!(
            "Failed to move {} to {}: {e}",
            tmp.display(),
            path.display()
        ))
    })
}

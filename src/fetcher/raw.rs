//! Raw private API payloads
//!
//! Shapes of the JSON bodies returned by the feed, media detail and archive
//! endpoints. Only the fields the pipeline reads are modelled; everything
//! else is ignored. Ids that the platform emits either as numbers or as
//! strings are normalised to strings here.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One media item from the feed or a carousel child
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawItem {
    /// Media id (`{media_pk}_{owner_pk}` on feed items)
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    /// Public shortcode; carousel children usually omit it
    #[serde(default)]
    pub code: Option<String>,
    /// Kind discriminator: 1 image, 2 video, 8 carousel
    #[serde(default)]
    pub media_type: i64,
    /// Capture time, epoch seconds
    #[serde(default)]
    pub taken_at: Option<i64>,
    /// Caption container, `null` when the post has no caption
    #[serde(default)]
    pub caption: Option<RawCaption>,
    /// Like count, hidden on some posts
    #[serde(default)]
    pub like_count: Option<u64>,
    /// Comment count, hidden on some posts
    #[serde(default)]
    pub comment_count: Option<u64>,
    /// Tagged location
    #[serde(default)]
    pub location: Option<RawLocation>,
    /// Image renditions, largest first
    #[serde(default)]
    pub image_versions2: Option<RawImageVersions>,
    /// Video renditions, largest first
    #[serde(default)]
    pub video_versions: Option<Vec<RawVariant>>,
    /// Album children in display order
    #[serde(default)]
    pub carousel_media: Option<Vec<RawItem>>,
}

/// Caption container
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawCaption {
    /// Caption text
    #[serde(default)]
    pub text: Option<String>,
}

/// Location container
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawLocation {
    /// Location id
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub pk: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Latitude
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude
    #[serde(default)]
    pub lng: Option<f64>,
}

/// Image rendition list
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawImageVersions {
    /// Candidates, largest first
    #[serde(default)]
    pub candidates: Vec<RawVariant>,
}

/// One rendition of an image or video
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawVariant {
    /// Source URL
    pub url: String,
    /// Width in pixels
    #[serde(default)]
    pub width: Option<u32>,
    /// Height in pixels
    #[serde(default)]
    pub height: Option<u32>,
}

/// One page of the user feed
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawFeedPage {
    /// Items on this page, newest first
    pub items: Vec<RawItem>,
    /// Whether another page follows
    #[serde(default)]
    pub more_available: bool,
    /// Continuation token for the next page
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub next_max_id: Option<String>,
}

/// Single media detail response
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawItemDetail {
    /// Zero or one item
    #[serde(default)]
    pub items: Vec<RawItem>,
}

/// Generic status envelope
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawStatus {
    /// `"ok"` on success
    pub status: String,
    /// Error description on failure
    #[serde(default)]
    pub message: Option<String>,
}

impl RawStatus {
    /// Whether the platform reported success
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Login response
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawLoginResponse {
    /// Present when the login succeeded
    #[serde(default)]
    pub logged_in_user: Option<RawUser>,
    /// `"ok"` on success
    #[serde(default)]
    pub status: Option<String>,
    /// Error description on failure
    #[serde(default)]
    pub message: Option<String>,
}

/// Account summary inside a login response
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RawUser {
    /// Numeric account id
    #[serde(default, deserialize_with = "string_or_number")]
    pub pk: String,
    /// Username
    #[serde(default)]
    pub username: String,
}

fn value_to_string(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(format!("expected string or number, got {other}")),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_string(value)
        .map(Option::unwrap_or_default)
        .map_err(serde::de::Error::custom)
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_string(value).map_err(serde::de::Error::custom)
}

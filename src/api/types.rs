//! API response type definitions.

use serde::{Deserialize, Serialize};

/// Authenticated user, from `account/verify_credentials`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub screen_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A tweet from a user timeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tweet {
    pub id: u64,
    #[serde(default)]
    pub id_str: String,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub extended_entities: Option<ExtendedEntities>,
}

impl Tweet {
    /// Attached media entities, empty when the tweet carries none.
    pub fn media(&self) -> &[MediaEntity] {
        self.extended_entities
            .as_ref()
            .map(|e| e.media.as_slice())
            .unwrap_or(&[])
    }
}

/// Extended entities carry every attached media item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<MediaEntity>,
}

/// An attached photo, video or animated GIF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaEntity {
    pub id: u64,
    #[serde(default)]
    pub id_str: String,
    pub media_url_https: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

impl MediaEntity {
    /// Platform asset identifier.
    pub fn asset_id(&self) -> String {
        if self.id_str.is_empty() {
            self.id.to_string()
        } else {
            self.id_str.clone()
        }
    }
}

/// Video encodings for a media entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub variants: Vec<VideoVariant>,
}

/// One encoding of a video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoVariant {
    /// Absent for streaming playlists.
    #[serde(default)]
    pub bitrate: Option<u64>,
    pub content_type: String,
    pub url: String,
}

/// Error payload returned by the REST API.
#[derive(Debug, Deserialize)]
pub struct ApiErrors {
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub code: i64,
    pub message: String,
}

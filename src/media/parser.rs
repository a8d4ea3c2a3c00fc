//! Media reference parsing: variant selection and naming.

use crate::api::types::{MediaEntity, Tweet, VideoVariant};
use crate::error::{Error, Result};
use crate::fs::naming::{asset_filename, sanitize_filename, url_basename};
use crate::media::item::MediaKind;

/// Only this container is considered when picking a video variant.
const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Extension used for video file names.
const VIDEO_EXTENSION: &str = "mp4";

/// Where to fetch an asset and what to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    pub kind: MediaKind,
    pub url: String,
    pub file_name: String,
}

/// Pick the highest bitrate mp4 variant. Ties keep the first one seen.
pub fn select_best_variant(variants: &[VideoVariant]) -> Option<&VideoVariant> {
    let mut best: Option<&VideoVariant> = None;

    for variant in variants {
        if variant.content_type != VIDEO_CONTENT_TYPE {
            continue;
        }

        let better = match best {
            None => true,
            Some(current) => variant.bitrate.unwrap_or(0) > current.bitrate.unwrap_or(0),
        };
        if better {
            best = Some(variant);
        }
    }

    best
}

/// Media entities of supported kinds, in the order the tweet lists them.
pub fn media_references(tweet: &Tweet) -> Vec<&MediaEntity> {
    tweet
        .media()
        .iter()
        .filter(|media| {
            let supported = MediaKind::from_platform(&media.kind).is_some();
            if !supported {
                tracing::debug!(
                    tweet = tweet.id,
                    kind = %media.kind,
                    "Skipping unsupported media type"
                );
            }
            supported
        })
        .collect()
}

/// Resolve a media entity to a download URL and file name.
pub fn resolve_reference(media: &MediaEntity) -> Result<MediaReference> {
    let kind = MediaKind::from_platform(&media.kind)
        .ok_or_else(|| Error::Media(format!("unknown media type: {}", media.kind)))?;

    if !kind.has_variants() {
        let file_name = sanitize_filename(&url_basename(&media.media_url_https)?)?;
        return Ok(MediaReference {
            kind,
            url: media.media_url_https.clone(),
            file_name,
        });
    }

    let variants = media
        .video_info
        .as_ref()
        .map(|info| info.variants.as_slice())
        .unwrap_or(&[]);
    let variant = select_best_variant(variants).ok_or_else(|| {
        Error::Media(format!(
            "no {} variant for {} {}",
            VIDEO_CONTENT_TYPE,
            kind,
            media.asset_id()
        ))
    })?;

    Ok(MediaReference {
        kind,
        url: variant.url.clone(),
        file_name: asset_filename(&media.asset_id(), VIDEO_EXTENSION)?,
    })
}

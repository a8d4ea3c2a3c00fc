//! Media item representation.

use std::fmt;

/// Kind of attached media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Photo,
    Video,
    /// Served by the platform as a looping mp4.
    AnimatedGif,
}

impl MediaKind {
    /// Parse the platform's media type discriminator.
    pub fn from_platform(kind: &str) -> Option<Self> {
        match kind {
            "photo" => Some(MediaKind::Photo),
            "video" => Some(MediaKind::Video),
            "animated_gif" => Some(MediaKind::AnimatedGif),
            _ => None,
        }
    }

    /// Whether the asset is delivered as video variants.
    pub fn has_variants(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::AnimatedGif)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::AnimatedGif => write!(f, "animated_gif"),
        }
    }
}

/// A named, downloaded media blob ready for export.
///
/// Immutable once built; destinations only ever borrow it.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaItem {
    name: String,
    kind: MediaKind,
    payload: Vec<u8>,
}

impl MediaItem {
    pub fn new(name: impl Into<String>, kind: MediaKind, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind,
            payload,
        }
    }

    /// File name, unique within an export batch.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// MIME type guessed from the file name.
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

impl fmt::Debug for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaItem")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("bytes", &self.payload.len())
            .finish()
    }
}

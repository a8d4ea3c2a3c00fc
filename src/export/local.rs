//! Local filesystem destination.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;
use crate::export::Exporter;
use crate::fs::naming::sanitize_filename;
use crate::fs::paths::ensure_dir;
use crate::media::MediaItem;

/// Writes each item to `<root>/<name>`, replacing any existing file.
#[derive(Debug, Clone)]
pub struct LocalExporter {
    root: PathBuf,
}

impl LocalExporter {
    /// Create the exporter, creating the root directory if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Exporter for LocalExporter {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn export(&self, media: &MediaItem) -> Result<()> {
        let path = self.root.join(sanitize_filename(media.name())?);
        tokio::fs::write(&path, media.payload()).await?;
        tracing::debug!(path = %path.display(), bytes = media.len(), "Wrote media file");
        Ok(())
    }
}

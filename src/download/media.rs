//! Media file downloading.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

use crate::api::types::MediaEntity;
use crate::error::{Error, Phase, PhaseExt, Result};
use crate::media::{resolve_reference, MediaItem};
use crate::output::progress::create_download_bar;

/// Minimum file size to show progress bar (20 MB).
const PROGRESS_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Turns a media reference into a downloaded item.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, media: &MediaEntity) -> Result<MediaItem>;
}

/// Downloads assets with a single GET, no retry.
#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
    show_progress: bool,
}

impl HttpDownloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            show_progress: false,
        }
    }

    /// Show a progress bar for large payloads.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Fetch a URL into memory. Every failure is reported as a fetch failure.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.download(url).await.during(Phase::Fetch)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let content_length = response.content_length();
        let progress = content_length
            .filter(|len| self.show_progress && *len > PROGRESS_THRESHOLD)
            .map(create_download_bar);

        let mut payload = Vec::with_capacity(content_length.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", e)))?;
            payload.extend_from_slice(&chunk);

            if let Some(ref pb) = progress {
                pb.set_position(payload.len() as u64);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(payload)
    }
}

#[async_trait]
impl MediaResolver for HttpDownloader {
    async fn resolve(&self, media: &MediaEntity) -> Result<MediaItem> {
        let reference = resolve_reference(media).during(Phase::Fetch)?;
        let payload = self.fetch(&reference.url).await?;

        tracing::debug!(
            media = %reference.file_name,
            kind = %reference.kind,
            bytes = payload.len(),
            "Downloaded media"
        );

        Ok(MediaItem::new(reference.file_name, reference.kind, payload))
    }
}

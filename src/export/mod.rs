//! Export module: delivering media items to storage destinations.
//!
//! This module provides:
//! - The `Exporter` trait every destination implements
//! - Sequential fan-out over the registered destinations
//! - Local filesystem and Google Photos destinations

pub mod gphotos;
pub mod local;

use std::time::Instant;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::media::MediaItem;

pub use gphotos::{GooglePhotosExporter, GooglePhotosSettings};
pub use local::LocalExporter;

/// A sink that durably stores media items.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Short destination identifier used in logs and errors.
    fn kind(&self) -> &'static str;

    async fn export(&self, media: &MediaItem) -> Result<()>;
}

/// Registered destinations, invoked in registration order.
pub struct Destinations {
    exporters: Vec<Box<dyn Exporter>>,
}

impl Destinations {
    /// Register destinations. At least one is required.
    pub fn new(exporters: Vec<Box<dyn Exporter>>) -> Result<Self> {
        if exporters.is_empty() {
            return Err(Error::NoDestinations);
        }
        Ok(Self { exporters })
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.exporters.iter().map(|e| e.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.exporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exporters.is_empty()
    }

    /// Export one item to every destination, one after the other.
    ///
    /// The first failure stops the fan-out; destinations that already
    /// succeeded keep their copy.
    pub async fn dispatch(&self, media: &MediaItem) -> Result<()> {
        for exporter in &self.exporters {
            let start = Instant::now();

            exporter
                .export(media)
                .await
                .map_err(|source| Error::Export {
                    destination: exporter.kind().to_string(),
                    media: media.name().to_string(),
                    source: Box::new(source),
                })?;

            tracing::info!(
                destination = exporter.kind(),
                media = media.name(),
                elapsed = ?start.elapsed(),
                "success"
            );
        }

        Ok(())
    }
}

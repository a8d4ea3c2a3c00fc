//! Twitter Media Backup - relays new tweet media to backup destinations.
//!
//! The library polls one Twitter account for tweets newer than a cursor,
//! downloads their photos, videos and animated GIFs, and exports each item
//! to every enabled destination in turn.
//!
//! # Features
//!
//! - Incremental polling with a persisted high-water mark
//! - Highest-bitrate MP4 selection for videos and GIFs
//! - Local directory destination
//! - Google Photos album destination with OAuth2 consent on first run
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use twitter_media_backup::{
//!     api::{OAuth1Credentials, TwitterApi},
//!     download::{HttpDownloader, Poller, PollerSettings},
//!     export::{Destinations, LocalExporter},
//!     relay::{self, RelayStats},
//!     Config,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("config.toml"))?;
//!     let api = Arc::new(TwitterApi::new(OAuth1Credentials::from(&config.twitter))?);
//!     let downloader = Arc::new(HttpDownloader::new(api.http_client()));
//!
//!     let destinations = Destinations::new(vec![Box::new(LocalExporter::new("/srv/backup")?)])?;
//!     let stream = Poller::new(api, downloader, PollerSettings::default()).await?.start();
//!
//!     let mut stats = RelayStats::new(stream.cursor());
//!     relay::run(stream, &destinations, &mut stats, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod export;
pub mod fs;
pub mod gphotos;
pub mod media;
pub mod oauth;
pub mod output;
pub mod relay;

// Re-exports for convenience
pub use api::TwitterApi;
pub use config::Config;
pub use download::{Cursor, MediaStream, Poller, PollerSettings};
pub use error::{Error, Phase, Result};
pub use export::{Destinations, Exporter};
pub use media::{MediaItem, MediaKind};

//! Google Photos Library API access.
//!
//! Provides:
//! - The `AlbumService` operations the cloud destination relies on
//! - A REST client for uploads, albums and media item creation

pub mod client;
pub mod types;

pub use client::{AlbumService, GooglePhotosClient};
pub use types::Album;

//! Twitter API module.
//!
//! This module provides:
//! - HTTP client for the Twitter REST API
//! - OAuth 1.0a request signing
//! - API response types

pub mod auth;
pub mod client;
pub mod types;

pub use auth::OAuth1Credentials;
pub use client::{TimelineSource, TwitterApi, TIMELINE_PAGE_SIZE};
pub use types::*;

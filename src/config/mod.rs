//! Configuration module for twitter-media-backup.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{Config, GPhotosConfig, LocalConfig, LoggingConfig, PollerConfig, TwitterConfig};
pub use validation::{validate_config, validate_redirect_url, validate_screen_name};

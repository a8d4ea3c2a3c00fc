//! Filesystem module.
//!
//! Provides:
//! - Default paths and private directory creation
//! - Filename derivation and sanitizing

pub mod naming;
pub mod paths;

pub use naming::{asset_filename, sanitize_filename, url_basename};
pub use paths::{default_local_root, default_token_path, ensure_dir, ensure_private_dir};

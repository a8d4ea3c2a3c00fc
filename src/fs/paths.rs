//! Default locations and directory management.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::Result;

/// Application name used for directories.
pub const APP_NAME: &str = "twitter-media-backup";

/// Default root for the local destination.
pub fn default_local_root() -> PathBuf {
    std::env::temp_dir()
}

/// Default location of the Google Photos OAuth2 token.
///
/// Uses the platform config directory, falling back to the temp dir.
pub fn default_token_path() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
        .join("gphotos")
        .join("token.json")
}

/// Create a directory (and parents) readable only by the owner.
pub fn ensure_private_dir(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path)?;
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

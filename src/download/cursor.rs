//! High-water mark tracking for the poller.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fs::paths::ensure_dir;

/// ID of the most recent tweet already processed.
///
/// Only ever moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(u64);

impl Cursor {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }

    /// Move to `max(self, id)`. Returns true when the cursor moved.
    pub fn advance(&mut self, id: u64) -> bool {
        if id > self.0 {
            self.0 = id;
            true
        } else {
            false
        }
    }

    /// `since_id` query value, `None` for a zero cursor.
    pub fn since(&self) -> Option<u64> {
        (self.0 > 0).then_some(self.0)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the initial cursor comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorSeed {
    /// Start after this tweet ID.
    Explicit(u64),
    /// Start after the account's most recent tweet.
    #[default]
    Latest,
}

impl From<Option<u64>> for CursorSeed {
    fn from(since_id: Option<u64>) -> Self {
        since_id.map(CursorSeed::Explicit).unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CursorRecord {
    since_id: u64,
}

/// JSON file holding the cursor between runs.
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored cursor, `None` when nothing was stored yet.
    pub fn load(&self) -> Result<Option<Cursor>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };

        let record: CursorRecord = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Corrupt cursor file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(Some(Cursor::new(record.since_id)))
    }

    /// Persist the cursor, replacing the file atomically.
    pub async fn save(&self, cursor: Cursor) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }

        let content = serde_json::to_string(&CursorRecord {
            since_id: cursor.id(),
        })?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

//! OAuth2 token record and its on-disk store.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fs::paths::ensure_private_dir;

/// Seconds before the real expiry at which a token is treated as expired.
const EXPIRY_MARGIN_SECONDS: i64 = 10;

/// An OAuth2 access token with its refresh metadata.
///
/// Serialized with the same field names golang.org/x/oauth2 uses, so token
/// files written by other tools load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl OAuthToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            refresh_token: None,
            expiry: None,
        }
    }

    /// Whether the token is expired, or about to be, at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_MARGIN_SECONDS) >= expiry,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        // Some providers answer "bearer"; the header wants the canonical casing.
        let token_type = if self.token_type.eq_ignore_ascii_case("bearer") || self.token_type.is_empty() {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{} {}", token_type, self.access_token)
    }
}

/// Persisted credential location.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored token.
    ///
    /// Fails when the file is missing, unreadable, or holds no access token.
    pub fn load(&self) -> Result<OAuthToken> {
        let content = std::fs::read_to_string(&self.path)?;
        let token: OAuthToken = serde_json::from_str(&content)?;

        if token.access_token.trim().is_empty() {
            return Err(Error::OAuth(format!(
                "Token file {} has an empty access token",
                self.path.display()
            )));
        }

        Ok(token)
    }

    /// Write the token, readable only by the owner.
    pub fn save(&self, token: &OAuthToken) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_private_dir(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(serde_json::to_string(token)?.as_bytes())?;
        file.flush()?;

        tracing::info!(path = %self.path.display(), "Saved OAuth2 token");
        Ok(())
    }
}

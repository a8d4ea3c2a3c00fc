//! Configuration structures and loading logic.

use crate::error::{Error, Result};
use crate::fs::paths::{default_local_root, default_token_path};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub twitter: TwitterConfig,

    #[serde(default)]
    pub poller: PollerConfig,

    #[serde(default)]
    pub local: LocalConfig,

    #[serde(default)]
    pub gphotos: GPhotosConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Twitter application and user credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterConfig {
    /// Application (consumer) key.
    #[serde(default)]
    pub application_key: String,

    /// Application (consumer) secret.
    #[serde(default)]
    pub application_secret: String,

    /// User access token.
    #[serde(default)]
    pub access_token: String,

    /// User access token secret.
    #[serde(default)]
    pub access_token_secret: String,

    /// Account to watch. Defaults to the authenticated account.
    #[serde(default)]
    pub screen_name: Option<String>,
}

/// Polling behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Seconds to wait between two polls.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,

    /// Only relay tweets newer than this ID. Seeds from the latest tweet when unset.
    #[serde(default)]
    pub since_id: Option<u64>,

    /// File where the cursor is persisted between runs.
    #[serde(default)]
    pub cursor_file: Option<PathBuf>,

    /// Show a progress bar for large downloads.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            since_id: None,
            cursor_file: None,
            show_progress: true,
        }
    }
}

/// Local filesystem destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Directory media files are written to.
    #[serde(default = "default_local_root")]
    pub root_path: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            root_path: default_local_root(),
        }
    }
}

/// Google Photos destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GPhotosConfig {
    #[serde(default)]
    pub enabled: bool,

    /// OAuth2 client ID.
    #[serde(default)]
    pub client_id: String,

    /// OAuth2 client secret.
    #[serde(default)]
    pub client_secret: String,

    /// Album title media is added to.
    #[serde(default)]
    pub album: String,

    /// Where the OAuth2 token is stored.
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// Redirect URL registered for the OAuth2 client.
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,

    /// Port the local callback listener binds when no token exists yet.
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,

    /// How long to wait for the consent callback. 0 waits forever.
    #[serde(default = "default_consent_timeout")]
    pub consent_timeout_seconds: u64,
}

impl Default for GPhotosConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            client_id: String::new(),
            client_secret: String::new(),
            album: String::new(),
            token_path: default_token_path(),
            redirect_url: default_redirect_url(),
            callback_port: default_callback_port(),
            consent_timeout_seconds: default_consent_timeout(),
        }
    }
}

/// Logging options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing level when RUST_LOG is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    10
}

fn default_redirect_url() -> String {
    "http://localhost:8080/callback".to_string()
}

fn default_callback_port() -> u16 {
    8080
}

fn default_consent_timeout() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}. Create one from config.example.toml",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Interval between two polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poller.interval_seconds)
    }

    /// Consent wait limit, `None` when waiting forever.
    pub fn consent_timeout(&self) -> Option<Duration> {
        match self.gphotos.consent_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Names of the enabled destinations, in registration order.
    pub fn enabled_destinations(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.local.enabled {
            names.push("local");
        }
        if self.gphotos.enabled {
            names.push("gphotos");
        }
        names
    }
}

//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Twitter media backup CLI.
#[derive(Parser, Debug)]
#[command(
    name = "twitter-media-backup",
    version,
    about = "Back up Twitter media somewhere else",
    long_about = "Watches a Twitter account and copies every new photo, video and animated GIF \
                  to the enabled destinations.\n\n\
                  Supported destinations: local directory, Google Photos album."
)]
pub struct Args {
    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Log level used when RUST_LOG is not set.
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Twitter application (consumer) key.
    #[arg(long = "twitter-application-key", env = "TWITTER_APPLICATION_KEY")]
    pub twitter_application_key: Option<String>,

    /// Twitter application (consumer) secret.
    #[arg(long = "twitter-application-secret", env = "TWITTER_APPLICATION_SECRET", hide_env_values = true)]
    pub twitter_application_secret: Option<String>,

    /// Twitter user access token.
    #[arg(long = "twitter-access-token", env = "TWITTER_ACCESS_TOKEN")]
    pub twitter_access_token: Option<String>,

    /// Twitter user access token secret.
    #[arg(long = "twitter-access-token-secret", env = "TWITTER_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub twitter_access_token_secret: Option<String>,

    /// Account to watch instead of the authenticated one.
    #[arg(short = 'u', long = "screen-name")]
    pub screen_name: Option<String>,

    /// Only relay tweets newer than this ID.
    #[arg(long = "since-id")]
    pub since_id: Option<u64>,

    /// Seconds between two polls.
    #[arg(long = "poll-interval")]
    pub poll_interval: Option<u64>,

    /// Persist the cursor to this file between runs.
    #[arg(long = "cursor-file")]
    pub cursor_file: Option<PathBuf>,

    /// Hide download progress bars.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable the local directory destination.
    #[arg(long)]
    pub local: bool,

    /// Directory the local destination writes to.
    #[arg(long = "local-root-path")]
    pub local_root_path: Option<PathBuf>,

    /// Enable the Google Photos destination.
    #[arg(long)]
    pub gphotos: bool,

    /// Google OAuth2 client ID.
    #[arg(long = "gphotos-client-id", env = "GPHOTOS_CLIENT_ID")]
    pub gphotos_client_id: Option<String>,

    /// Google OAuth2 client secret.
    #[arg(long = "gphotos-client-secret", env = "GPHOTOS_CLIENT_SECRET", hide_env_values = true)]
    pub gphotos_client_secret: Option<String>,

    /// Google Photos album title.
    #[arg(long = "gphotos-album")]
    pub gphotos_album: Option<String>,

    /// Where the Google OAuth2 token is stored.
    #[arg(long = "gphotos-token-path")]
    pub gphotos_token_path: Option<PathBuf>,

    /// OAuth2 redirect URL, used when no token is stored yet.
    #[arg(long = "gphotos-redirect-url")]
    pub gphotos_redirect_url: Option<String>,

    /// Port the OAuth2 callback listener binds.
    #[arg(long = "gphotos-callback-port")]
    pub gphotos_callback_port: Option<u16>,

    /// Seconds to wait for consent, 0 waits forever.
    #[arg(long = "gphotos-consent-timeout")]
    pub gphotos_consent_timeout: Option<u64>,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if self.debug {
            config.logging.level = "debug".to_string();
        }

        // Twitter
        if let Some(key) = self.twitter_application_key {
            config.twitter.application_key = key;
        }
        if let Some(secret) = self.twitter_application_secret {
            config.twitter.application_secret = secret;
        }
        if let Some(token) = self.twitter_access_token {
            config.twitter.access_token = token;
        }
        if let Some(secret) = self.twitter_access_token_secret {
            config.twitter.access_token_secret = secret;
        }
        if let Some(name) = self.screen_name {
            config.twitter.screen_name = Some(name);
        }

        // Poller
        if let Some(since_id) = self.since_id {
            config.poller.since_id = Some(since_id);
        }
        if let Some(interval) = self.poll_interval {
            config.poller.interval_seconds = interval;
        }
        if let Some(path) = self.cursor_file {
            config.poller.cursor_file = Some(path);
        }
        if self.quiet {
            config.poller.show_progress = false;
        }

        // Destinations (flags only switch on)
        if self.local {
            config.local.enabled = true;
        }
        if let Some(root) = self.local_root_path {
            config.local.root_path = root;
        }

        if self.gphotos {
            config.gphotos.enabled = true;
        }
        if let Some(id) = self.gphotos_client_id {
            config.gphotos.client_id = id;
        }
        if let Some(secret) = self.gphotos_client_secret {
            config.gphotos.client_secret = secret;
        }
        if let Some(album) = self.gphotos_album {
            config.gphotos.album = album;
        }
        if let Some(path) = self.gphotos_token_path {
            config.gphotos.token_path = path;
        }
        if let Some(url) = self.gphotos_redirect_url {
            config.gphotos.redirect_url = url;
        }
        if let Some(port) = self.gphotos_callback_port {
            config.gphotos.callback_port = port;
        }
        if let Some(timeout) = self.gphotos_consent_timeout {
            config.gphotos.consent_timeout_seconds = timeout;
        }
    }
}

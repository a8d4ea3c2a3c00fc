//! Configuration validation logic.

use crate::config::loader::{Config, GPhotosConfig, TwitterConfig};
use crate::error::{Error, Result};
use regex::Regex;
use url::Url;

/// Maximum screen name length accepted by Twitter.
const MAX_SCREEN_NAME_LENGTH: usize = 15;

/// Validate the entire configuration.
///
/// Runs before any network access; every failure here is fatal at startup.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_twitter(&config.twitter)?;

    if config.poller.interval_seconds == 0 {
        return Err(Error::ConfigValidation {
            field: "poller.interval_seconds".to_string(),
            message: "Poll interval must be at least one second".to_string(),
        });
    }

    if config.enabled_destinations().is_empty() {
        return Err(Error::NoDestinations);
    }

    if config.gphotos.enabled {
        validate_gphotos(&config.gphotos)?;
    }

    Ok(())
}

/// Validate Twitter credentials and the optional watched account.
pub fn validate_twitter(twitter: &TwitterConfig) -> Result<()> {
    let required = [
        ("twitter.application_key", &twitter.application_key),
        ("twitter.application_secret", &twitter.application_secret),
        ("twitter.access_token", &twitter.access_token),
        ("twitter.access_token_secret", &twitter.access_token_secret),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(Error::MissingConfig(field.to_string()));
        }
    }

    if let Some(screen_name) = &twitter.screen_name {
        validate_screen_name(screen_name)?;
    }

    Ok(())
}

/// Validate a Twitter screen name (with or without a leading @).
pub fn validate_screen_name(screen_name: &str) -> Result<()> {
    let clean = screen_name.trim_start_matches('@');

    if clean.is_empty() || clean.len() > MAX_SCREEN_NAME_LENGTH {
        return Err(Error::ConfigValidation {
            field: "twitter.screen_name".to_string(),
            message: format!(
                "Screen name '{}' must be 1 to {} characters",
                screen_name, MAX_SCREEN_NAME_LENGTH
            ),
        });
    }

    let pattern = Regex::new(r"^[A-Za-z0-9_]+$").expect("valid screen name pattern");
    if !pattern.is_match(clean) {
        return Err(Error::ConfigValidation {
            field: "twitter.screen_name".to_string(),
            message: format!(
                "Screen name '{}' contains invalid characters. Only letters, digits and underscores allowed.",
                screen_name
            ),
        });
    }

    Ok(())
}

/// Validate Google Photos settings.
pub fn validate_gphotos(gphotos: &GPhotosConfig) -> Result<()> {
    if gphotos.client_id.trim().is_empty() {
        return Err(Error::MissingConfig("gphotos.client_id".to_string()));
    }

    if gphotos.client_secret.trim().is_empty() {
        return Err(Error::MissingConfig("gphotos.client_secret".to_string()));
    }

    if gphotos.album.trim().is_empty() {
        return Err(Error::MissingConfig("gphotos.album".to_string()));
    }

    validate_redirect_url(&gphotos.redirect_url)?;

    if gphotos.callback_port == 0 {
        return Err(Error::ConfigValidation {
            field: "gphotos.callback_port".to_string(),
            message: "Callback port must be non-zero".to_string(),
        });
    }

    Ok(())
}

/// Validate the OAuth2 redirect URL and return it parsed.
pub fn validate_redirect_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::ConfigValidation {
        field: "gphotos.redirect_url".to_string(),
        message: format!("Invalid redirect URL '{}': {}", raw, e),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::ConfigValidation {
            field: "gphotos.redirect_url".to_string(),
            message: format!("Redirect URL must use http or https (got '{}')", url.scheme()),
        });
    }

    Ok(url)
}

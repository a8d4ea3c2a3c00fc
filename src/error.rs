//! Error types for the twitter-media-backup application.

use std::fmt;

use thiserror::Error;

/// Pipeline phase a failure is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Config,
    Fetch,
    Export,
    Auth,
    /// Anything outside the tagged phases.
    Io,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Config => "config",
            Phase::Fetch => "fetch",
            Phase::Export => "export",
            Phase::Auth => "auth",
            Phase::Io => "io",
        }
    }

    /// Process exit code for a run that failed in this phase.
    pub fn exit_code(self) -> i32 {
        match self {
            Phase::Config => exit_codes::CONFIG_ERROR,
            Phase::Fetch => exit_codes::FETCH_ERROR,
            Phase::Export => exit_codes::EXPORT_ERROR,
            Phase::Auth => exit_codes::AUTH_ERROR,
            Phase::Io => exit_codes::UNEXPECTED_ERROR,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("At least one export destination must be enabled")]
    NoDestinations,

    // API errors
    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    // Download errors
    #[error("Download failed: {0}")]
    Download(String),

    // Media errors
    #[error("Invalid media: {0}")]
    Media(String),

    // Export errors
    #[error("Cannot export '{media}' to {destination}: {source}")]
    Export {
        destination: String,
        media: String,
        #[source]
        source: Box<Error>,
    },

    // An error tagged with the phase it escaped from
    #[error("{source}")]
    Phased { phase: Phase, source: Box<Error> },

    // OAuth2 errors
    #[error("OAuth2 error: {0}")]
    OAuth(String),

    #[error("OAuth2 callback listener failed: {0}")]
    CallbackListener(String),

    #[error("No OAuth2 callback received within {0} seconds")]
    ConsentTimeout(u64),

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Phase this error is reported under.
    ///
    /// A tag set with [`Error::during`] wins; untagged errors fall back to
    /// the phase their variant usually comes from.
    pub fn phase(&self) -> Phase {
        match self {
            Error::Phased { phase, .. } => *phase,
            Error::Export { .. } => Phase::Export,
            Error::Config(_)
            | Error::ConfigValidation { .. }
            | Error::MissingConfig(_)
            | Error::NoDestinations
            | Error::TomlParse(_) => Phase::Config,
            Error::Api(_)
            | Error::Authentication(_)
            | Error::RateLimited(_)
            | Error::Download(_)
            | Error::Media(_) => Phase::Fetch,
            Error::OAuth(_) | Error::CallbackListener(_) | Error::ConsentTimeout(_) => Phase::Auth,
            Error::InvalidFilename(_)
            | Error::Io(_)
            | Error::Http(_)
            | Error::Json(_)
            | Error::UrlParse(_) => Phase::Io,
        }
    }

    /// Tag this error with the phase it is leaving.
    ///
    /// The innermost tag is kept, as is the destination context of an
    /// export failure. Configuration errors stay configuration errors.
    pub fn during(self, phase: Phase) -> Self {
        match self {
            Error::Phased { .. } | Error::Export { .. } => self,
            source if source.phase() == Phase::Config => source,
            source => Error::Phased {
                phase,
                source: Box::new(source),
            },
        }
    }

    /// The error without its phase tag.
    pub fn underlying(&self) -> &Error {
        match self {
            Error::Phased { source, .. } => source.underlying(),
            other => other,
        }
    }
}

/// [`Error::during`] for results.
pub trait PhaseExt<T> {
    fn during(self, phase: Phase) -> Result<T>;
}

impl<T> PhaseExt<T> for Result<T> {
    fn during(self, phase: Phase) -> Result<T> {
        self.map_err(|e| e.during(phase))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const FETCH_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const EXPORT_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const AUTH_ERROR: i32 = 6;
}

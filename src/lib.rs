//! GIBDD crash scraper
//!
//! This crate retrieves road-incident statistics from the stat.gibdd.ru
//! website: it resolves the OKATO region directory, fetches crash cards for
//! date ranges and regions with a probe-then-fetch pagination strategy, and
//! flattens the nested cards into relational records for export.

pub mod config;
pub mod crashes;
pub mod normalize;
pub mod output;
pub mod region;
pub mod transport;

use thiserror::Error;

/// Main error type for crash retrieval operations
#[derive(Debug, Error)]
pub enum GibddError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connection failure or timeout after the retry budget was spent
    #[error("Unable to reach {url}: {source}")]
    Unreachable { url: String, source: reqwest::Error },

    /// Non-2xx response, never retried
    #[error("Request to {url} failed with status {status}: {body}")]
    RequestFailed {
        url: String,
        status: u16,
        body: String,
    },

    /// A sized fetch came back empty although the probe reported records
    #[error("Crashes not found for {context}")]
    CrashesNotFound { context: String },

    #[error("Malformed response for {context}: {message}")]
    MalformedResponse { context: String, message: String },

    /// The directory carries a region without an OKATO code
    #[error("No okato code for region '{region}', refresh the region directory cache")]
    MissingOkato { region: String },

    #[error("Invalid period: end {end} is earlier than start {start}")]
    InvalidPeriod {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Failed to fetch {window} for subregion {subregion} of region {region}: {source}")]
    Fetch {
        region: String,
        subregion: String,
        window: String,
        source: Box<GibddError>,
    },

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GibddError {
    /// Returns the innermost error, skipping context wrappers
    pub fn root_cause(&self) -> &GibddError {
        match self {
            GibddError::Fetch { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crash retrieval operations
pub type Result<T> = std::result::Result<T, GibddError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crashes::{
    split_range, CardWindow, CrashPage, DateWindow, PageFetcher, PageOutcome, RegionFanOut,
    SubregionAggregator,
};
pub use region::{CountryDirectory, FederalRegion, Region, RegionCode};
pub use transport::Transport;

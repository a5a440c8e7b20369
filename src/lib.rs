//! Spread-Mapper: maps who amplifies a set of URLs
//!
//! This crate searches recent posts referencing each target URL, fetches the
//! followers of every original poster, and then the recent posts of each of
//! those followers. Every call is paced against the remote service's quota
//! signals and every stage appends its results to JSON-lines files.

pub mod config;
pub mod crawler;
pub mod input;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Remote service returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Returns true if the failure came from talking to the remote service
    /// (error status, transport failure or undecodable body)
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Self::Remote { .. } | Self::Http { .. } | Self::Decode { .. }
        )
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

    #[error("Missing bearer token (set BEARER_TOKEN or pass --bearer-token)")]
    MissingToken,
}

/// Errors raised while reading the target URL list
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Column '{column}' not found in input file")]
    MissingColumn { column: String },

    #[error("No urls found in column '{column}'")]
    NoUrls { column: String },

    #[error("No input file configured (pass --file or set [input] file)")]
    NoFile,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for input operations
pub type InputResult<T> = std::result::Result<T, InputError>;

// Re-export commonly used types
pub use config::Config;
pub use input::load_target_urls;
pub use state::{ClassState, CrawlPhase, EndpointClass, RateSignal};

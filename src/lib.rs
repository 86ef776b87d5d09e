//! Stack-Scrape: a Stack Exchange-shaped API over scraped Stack Overflow pages
//!
//! This crate fetches the rendered HTML of questions, answers and collectives,
//! follows the secondary pages a record needs (timeline, owner profile,
//! collective pages), and reshapes the result into the item format of the
//! public Stack Exchange REST API.

pub mod api;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod parser;
pub mod query;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for scraping operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    MissingField(#[from] MissingFieldError),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Unrecognised date '{value}'")]
    Date { value: String },

    #[error("Expected a number for {field}, got '{value}'")]
    Number { field: &'static str, value: String },

    #[error("Invalid stage transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::AssemblyStage,
        to: state::AssemblyStage,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a number parsing error for the named field.
    pub fn number(field: &'static str, value: impl Into<String>) -> Self {
        Self::Number {
            field,
            value: value.into(),
        }
    }
}

/// A failed page fetch
///
/// `retryable` is what the fetcher's retry policy keys on: network failures,
/// 5xx and 429 are retryable, every other 4xx is terminal.
#[derive(Debug, Clone, Error)]
#[error("fetch of {url} failed: {message}")]
pub struct FetchError {
    pub url: String,
    pub status: Option<u16>,
    pub retryable: bool,
    pub message: String,
}

impl FetchError {
    /// Error for a non-success HTTP status.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            retryable: status == 429 || !(400..500).contains(&status),
            message: format!("unexpected status {status}"),
        }
    }

    /// Error raised after honouring a 429 `Retry-After` pause.
    pub fn rate_limited(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: Some(429),
            retryable: true,
            message: "rate limited (429)".to_string(),
        }
    }

    /// Network-level error (connect, timeout, body read).
    pub fn network(url: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            url: url.into(),
            status: None,
            retryable: true,
            message: error.to_string(),
        }
    }
}

/// Expected markup was not found by any selector of an extraction chain
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("missing field '{field}' (tried: {})", .tried.join(", "))]
pub struct MissingFieldError {
    pub field: &'static str,
    pub tried: Vec<String>,
}

/// Rejected request input
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A query parameter is malformed; the message names the parameter
    #[error("{0}")]
    BadParameter(String),

    /// An id is not a number, or the route does not exist
    #[error("no method found with this name")]
    NotFound,
}

impl ValidationError {
    pub fn bad_parameter(message: impl Into<String>) -> Self {
        Self::BadParameter(message.into())
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

/// Result type alias for scraping operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Fetcher, PageSource};
pub use model::{Answer, Collective, Owner, Question};
pub use query::{Direction, FilterMode, QueryParams, SortOrder};

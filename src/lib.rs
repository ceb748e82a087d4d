//! Catalog-Ripple: site-specific product catalog crawlers
//!
//! This crate walks the category trees of retail websites, follows their
//! listing pages, fetches each product detail once, and fans every product
//! out into normalized per-color records with their sizes.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod sites;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Ripple operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Record for {url} is missing required field '{field}'")]
    MissingRequiredField { url: String, field: &'static str },

    #[error("No site is enabled for this run")]
    NoSites,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Extraction problems that are always recovered where they occur
///
/// None of these abort a page: the caller substitutes an absent value,
/// an empty payload, or skips the directive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Selector '{selector}' matched nothing")]
    MissingField { selector: String },

    #[error("Malformed structured payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid link '{0}'")]
    InvalidLink(String),
}

/// Result type alias for Catalog-Ripple operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use catalog::{BaseProduct, CategoryPath, NormalizedRecord, Record, SummaryRecord};
pub use config::Config;
pub use crawler::{crawl, Dispatcher};
pub use sites::SiteKind;

//! Sumi-Scraper: paginated HTML scraping with rate-limit tolerance
//!
//! This crate fetches web pages, retrying rate-limited requests with exponential
//! backoff and jitter, and streams elements extracted by CSS selector across
//! sequentially linked or numbered pages.

pub mod config;
pub mod crawler;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Scraper operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to visit {url}: {reason}")]
    Visit { url: String, reason: String },

    #[error("failed to scrape {url} after {attempts} attempts: rate limited")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("failed to extract elements from page {url}: {source}")]
    PageExtract { url: String, source: ExtractError },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
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

    #[error("next-page-url-pattern must be provided when using last-page-selector")]
    MissingUrlPattern,

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Errors raised while pulling values out of HTML
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("failed to convert '{text}' to {target}")]
    ParseNumber { text: String, target: &'static str },

    #[error("failed to parse date '{text}' with format '{format}': {message}")]
    ParseDate {
        text: String,
        format: String,
        message: String,
    },

    #[error("failed to get date text")]
    MissingText,

    #[error("date format is required")]
    MissingFormat,
}

/// Result type alias for Sumi-Scraper operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for extraction operations
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use config::{FetchOptions, PaginationConfig, PaginationStrategy, ScraperConfig};
pub use crawler::{PageStream, Scraper, StreamItem};

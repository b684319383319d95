//! Configuration module for Sumi-Scraper
//!
//! This module holds the fetch options and pagination settings, and loads them
//! from TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Scraper will retry up to {} times", config.options.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    FetchOptions, PaginationConfig, PaginationStrategy, ScraperConfig, DEFAULT_MAX_RETRIES,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};

// Re-export validation for configs assembled outside a file
pub use validation::validate;

//! Integration tests for the scraper
//!
//! These tests use wiremock to create mock HTTP servers and exercise fetching,
//! retrying and pagination end-to-end.

mod pagination_tests;
mod scrape_tests;

use std::sync::Arc;
use sumi_scraper::crawler::FixedJitter;
use sumi_scraper::{FetchOptions, Scraper};

/// Options with short backoff so retry tests finish quickly against a real server
pub fn fast_options() -> FetchOptions {
    FetchOptions {
        user_agent: "TestBot/1.0".to_string(),
        max_retries: 3,
        initial_backoff_ms: 10,
        max_jitter_ms: 0,
        ..FetchOptions::default()
    }
}

/// Builds an HTTP scraper with no random jitter
pub fn test_scraper(options: FetchOptions) -> Scraper {
    Scraper::new(options)
        .expect("Failed to create scraper")
        .with_jitter(Arc::new(FixedJitter::default()))
}

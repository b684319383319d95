//! Crawler module for page fetching and extraction
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with rate-limit retries
//! - Element extraction by CSS selector
//! - Page scheduling for counted pagination
//! - Streaming delivery of paginated results

mod coordinator;
mod extract;
mod fetcher;
mod retry;
mod scheduler;
mod stream;

pub use coordinator::Scraper;
pub use extract::{
    attr_name, get_float, get_int, get_outer_html, get_text, get_text_single, get_time,
    split_selectors, RELATIVE_DATE_FORMAT, RFC3339_FORMAT, SELECTOR_SEPARATOR,
};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher, HttpFetcher};
pub use retry::{fetch_with_retry, FetchAttempt, FixedJitter, Jitter, RandomJitter, RetryPolicy};
pub use scheduler::PageScheduler;
pub use stream::{PageStream, StreamItem};

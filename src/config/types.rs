use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Attempts made per fetch when `max-retries` is left at zero
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScraperConfig {
    #[serde(default)]
    pub options: FetchOptions,

    #[serde(default)]
    pub pagination: PaginationConfig,
}

/// Fetch behaviour shared by every request a scraper makes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchOptions {
    /// User agent header value
    pub user_agent: String,

    /// Domains requests may target; empty allows any. Supports `*.example.com`.
    pub allowed_domains: Vec<String>,

    /// Maximum number of pages followed by a sequential crawl (0 = unlimited)
    pub max_depth: u32,

    /// Whether numbered pages are fetched concurrently
    pub concurrent: bool,

    /// Maximum number of attempts per fetch
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds), doubled on every attempt
    pub initial_backoff_ms: u64,

    /// Upper bound (exclusive) of the random delay added to each backoff (milliseconds)
    pub max_jitter_ms: u64,

    /// Cap on numbered pages fetched at the same time (unbounded when unset)
    pub max_concurrent_pages: Option<usize>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            allowed_domains: Vec::new(),
            max_depth: 0,
            concurrent: true,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: 1000,
            max_jitter_ms: 1000,
            max_concurrent_pages: None,
        }
    }
}

impl FetchOptions {
    /// Fills in defaults for values left empty or zero
    ///
    /// After normalization the user agent is non-empty and `max_retries >= 1`.
    pub fn normalized(mut self) -> Self {
        if self.user_agent.trim().is_empty() {
            self.user_agent = DEFAULT_USER_AGENT.to_string();
        }
        if self.max_retries == 0 {
            self.max_retries = DEFAULT_MAX_RETRIES;
        }
        self.allowed_domains = self
            .allowed_domains
            .into_iter()
            .map(|d| d.trim().to_lowercase())
            .collect();
        self
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }
}

/// Raw pagination settings as written by the caller
///
/// Exactly one strategy is derived from the populated fields, see
/// [`PaginationConfig::strategy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PaginationConfig {
    /// Selector for the "next page" link; no match stops the crawl
    pub next_page_selector: Option<String>,

    /// Selector whose text is the number of the last page
    pub last_page_selector: Option<String>,

    /// URL template for numbered pages, `::page::` is replaced by the page number.
    /// Mandatory when `last_page_selector` is set.
    pub next_page_url_pattern: Option<String>,
}

/// A resolved pagination strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// Follow the next-page link until it disappears
    Sequential { next_page_selector: Option<String> },

    /// Read the page count from the first page, then fetch the rest in parallel
    Counted {
        last_page_selector: String,
        url_pattern: String,
    },
}

impl PaginationConfig {
    /// Sequential pagination following `selector`
    pub fn next_page(selector: impl Into<String>) -> Self {
        Self {
            next_page_selector: Some(selector.into()),
            ..Self::default()
        }
    }

    /// Counted pagination reading the page count from `selector`
    pub fn last_page(selector: impl Into<String>, url_pattern: impl Into<String>) -> Self {
        Self {
            last_page_selector: Some(selector.into()),
            next_page_url_pattern: Some(url_pattern.into()),
            ..Self::default()
        }
    }

    /// Resolves the populated fields into a single strategy
    ///
    /// A last-page selector selects the counted strategy and then requires a URL
    /// pattern. Anything else is sequential.
    pub fn strategy(&self) -> Result<PaginationStrategy, ConfigError> {
        match non_empty(&self.last_page_selector) {
            Some(last_page_selector) => {
                let url_pattern =
                    non_empty(&self.next_page_url_pattern).ok_or(ConfigError::MissingUrlPattern)?;
                Ok(PaginationStrategy::Counted {
                    last_page_selector,
                    url_pattern,
                })
            }
            None => Ok(PaginationStrategy::Sequential {
                next_page_selector: non_empty(&self.next_page_selector),
            }),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

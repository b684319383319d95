//! Scrape coordinator - page fetching and pagination orchestration
//!
//! This module contains [`Scraper`], which ties together:
//! - Retrying fetches of single pages
//! - Extraction of elements by CSS selector
//! - Sequential pagination (follow the next-page link)
//! - Counted pagination (read the page count, then fetch the rest in parallel)
//! - Delivery of results through a [`PageStream`]

use crate::config::{FetchOptions, PaginationConfig, PaginationStrategy};
use crate::crawler::extract::{get_int, get_outer_html, get_text_single};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::retry::{fetch_with_retry, Jitter, RandomJitter, RetryPolicy};
use crate::crawler::scheduler::PageScheduler;
use crate::crawler::stream::{channel, ItemSender, PageStream, StreamItem};
use crate::url::{page_url, resolve_url};
use crate::ScrapeError;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Outcome of fetching and extracting one page
enum PageOutcome {
    /// Items were delivered; carries the page HTML for the pagination cue
    Delivered(String),

    /// The page failed and its error was delivered
    Failed,

    /// The consumer dropped the stream
    ConsumerGone,
}

/// HTML scraper with retrying fetches and paginated streaming
///
/// Cloning is cheap; clones share options, fetcher and jitter source.
#[derive(Clone)]
pub struct Scraper {
    options: Arc<FetchOptions>,
    fetcher: Arc<dyn Fetcher>,
    jitter: Arc<dyn Jitter>,
}

impl fmt::Debug for Scraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scraper")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Scraper {
    /// Creates a scraper that fetches over HTTP
    ///
    /// Options are normalized first: an empty user agent gets the default and
    /// `max_retries` is at least one.
    ///
    /// # Returns
    ///
    /// * `Ok(Scraper)` - Ready to scrape
    /// * `Err(ScrapeError::Client)` - The HTTP client could not be built
    pub fn new(options: FetchOptions) -> Result<Self, ScrapeError> {
        let options = options.normalized();
        let fetcher = HttpFetcher::new(&options)?;
        Ok(Self::with_fetcher(options, Arc::new(fetcher)))
    }

    /// Creates a scraper with default options
    pub fn new_default() -> Result<Self, ScrapeError> {
        Self::new(FetchOptions::default())
    }

    /// Creates a scraper around any [`Fetcher`]
    pub fn with_fetcher(options: FetchOptions, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            options: Arc::new(options.normalized()),
            fetcher,
            jitter: Arc::new(RandomJitter),
        }
    }

    /// Replaces the jitter source used between retries
    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    /// The normalized options in effect
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(self.options.as_ref())
    }

    /// Fetches the complete HTML of a page
    ///
    /// Rate-limited responses (HTTP 429) are retried with exponential backoff;
    /// any other failure is returned at once.
    pub async fn scrape_html(&self, url: &str) -> Result<String, ScrapeError> {
        fetch_with_retry(
            self.fetcher.as_ref(),
            url,
            &self.retry_policy(),
            self.jitter.as_ref(),
        )
        .await
    }

    /// Fetches a page and returns the outer HTML of every element matching `selector`
    pub async fn scrape_outer_html(
        &self,
        url: &str,
        selector: &str,
    ) -> Result<Vec<String>, ScrapeError> {
        let html = self.scrape_html(url).await?;
        Ok(get_outer_html(&html, selector)?)
    }

    /// Streams the outer HTML of elements matching `selector` across pages
    ///
    /// The pagination config is validated before anything is fetched; an invalid
    /// config is returned as an error and no stream is produced. Otherwise a
    /// background task is started and the stream is returned immediately. The
    /// stream closes once every page has been handled.
    ///
    /// Page-level failures arrive as `Err` items. A sequential crawl stops after
    /// its first failed page.
    ///
    /// # Errors
    ///
    /// `ScrapeError::Config` when `config` does not resolve to a strategy, for
    /// example a last-page selector without a URL pattern. The error stands in
    /// for an already-closed, empty stream: no task is spawned and no page is
    /// requested.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sumi_scraper::{PaginationConfig, Scraper};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let scraper = Scraper::new_default()?;
    /// let config = PaginationConfig::next_page("li.next a[href]");
    /// let mut stream = scraper.scrape_paginated("https://quotes.toscrape.com/", "div.quote", &config)?;
    /// while let Some(item) = stream.next_item().await {
    ///     match item {
    ///         Ok(quote) => println!("{}", quote),
    ///         Err(e) => eprintln!("{}", e),
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn scrape_paginated(
        &self,
        url: &str,
        selector: &str,
        config: &PaginationConfig,
    ) -> Result<PageStream, ScrapeError> {
        let strategy = config.strategy()?;
        let (tx, stream) = channel();

        let scraper = self.clone();
        let url = url.to_string();
        let selector = selector.to_string();

        tokio::spawn(async move {
            match strategy {
                PaginationStrategy::Sequential { next_page_selector } => {
                    scraper
                        .run_sequential(url, selector, next_page_selector, tx)
                        .await
                }
                PaginationStrategy::Counted {
                    last_page_selector,
                    url_pattern,
                } => {
                    scraper
                        .run_counted(url, selector, last_page_selector, url_pattern, tx)
                        .await
                }
            }
        });

        Ok(stream)
    }

    /// Fetches one page and delivers its matched elements
    async fn push_page_contents(&self, url: &str, selector: &str, tx: &ItemSender) -> PageOutcome {
        let html = match self.scrape_html(url).await {
            Ok(html) => html,
            Err(e) => return deliver_failure(tx, e).await,
        };

        let fragments = match get_outer_html(&html, selector) {
            Ok(fragments) => fragments,
            Err(source) => {
                let error = ScrapeError::PageExtract {
                    url: url.to_string(),
                    source,
                };
                return deliver_failure(tx, error).await;
            }
        };

        tracing::debug!("Extracted {} elements from {}", fragments.len(), url);

        let items: Vec<StreamItem> = fragments.into_iter().map(Ok).collect();
        if tx.send_batch(items).await {
            PageOutcome::Delivered(html)
        } else {
            PageOutcome::ConsumerGone
        }
    }

    /// Follows the next-page link until it disappears
    ///
    /// Pages are fetched one at a time in discovery order. The crawl ends at the
    /// first failed page, when the next-page cue is missing, after `max_depth`
    /// pages, or when the next link points back to a visited page.
    async fn run_sequential(
        self,
        start_url: String,
        selector: String,
        next_page_selector: Option<String>,
        tx: ItemSender,
    ) {
        tracing::info!("Starting sequential pagination at {}", start_url);

        let max_depth = self.options.max_depth;
        let mut visited = HashSet::new();
        let mut current = start_url;
        let mut pages = 0u32;

        loop {
            visited.insert(current.clone());
            pages += 1;

            let html = match self.push_page_contents(&current, &selector, &tx).await {
                PageOutcome::Delivered(html) => html,
                PageOutcome::Failed | PageOutcome::ConsumerGone => break,
            };

            let Some(next_selector) = next_page_selector.as_deref() else {
                break;
            };

            if max_depth > 0 && pages >= max_depth {
                tracing::debug!("Reached max depth {} at {}", max_depth, current);
                break;
            }

            let link = match get_text_single(&html, next_selector) {
                Ok(link) if !link.is_empty() => link,
                Ok(_) => break,
                Err(e) => {
                    tracing::debug!("Next page lookup failed on {}: {}", current, e);
                    break;
                }
            };

            let next = resolve_url(&current, &link);
            if visited.contains(&next) {
                tracing::warn!("Next page {} was already visited, stopping", next);
                break;
            }

            tracing::debug!("Following next page {} -> {}", current, next);
            current = next;
        }

        tracing::info!("Sequential pagination finished after {} pages", pages);
    }

    /// Fetches page 1, reads the page count, then fetches pages 2..=N
    ///
    /// A missing or unparseable count, or a count below two, ends the crawl after
    /// page 1 without an error.
    async fn run_counted(
        self,
        start_url: String,
        selector: String,
        last_page_selector: String,
        url_pattern: String,
        tx: ItemSender,
    ) {
        tracing::info!("Starting counted pagination at {}", start_url);

        let html = match self.push_page_contents(&start_url, &selector, &tx).await {
            PageOutcome::Delivered(html) => html,
            PageOutcome::Failed | PageOutcome::ConsumerGone => return,
        };

        let last_page = match get_int(&html, &last_page_selector) {
            Ok(n) if n >= 2 => u32::try_from(n).unwrap_or(u32::MAX),
            Ok(n) => {
                tracing::debug!("Page count {} on {}, nothing more to fetch", n, start_url);
                return;
            }
            Err(e) => {
                tracing::debug!("No usable page count on {}: {}", start_url, e);
                return;
            }
        };

        tracing::info!("Fetching pages 2..={} from {}", last_page, start_url);

        let scheduler = PageScheduler::new(&self.options);
        scheduler
            .run(2..=last_page, |page| {
                let scraper = self.clone();
                let url = page_url(&start_url, &url_pattern, page);
                let selector = selector.clone();
                let tx = tx.clone();
                async move {
                    !matches!(
                        scraper.push_page_contents(&url, &selector, &tx).await,
                        PageOutcome::ConsumerGone
                    )
                }
            })
            .await;

        tracing::info!("Counted pagination finished, {} pages", last_page);
    }
}

async fn deliver_failure(tx: &ItemSender, error: ScrapeError) -> PageOutcome {
    if tx.send(Err(error)).await {
        PageOutcome::Failed
    } else {
        PageOutcome::ConsumerGone
    }
}

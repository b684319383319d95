//! URL handling module for Sumi-Scraper
//!
//! This module resolves links found on pages, builds numbered page URLs from a
//! template, and checks hosts against the allowed-domain list.

mod domain;

pub use domain::{extract_domain, is_allowed_domain, matches_wildcard};

use url::Url;

/// Placeholder replaced by the page number in a page URL template
pub const PAGE_PLACEHOLDER: &str = "::page::";

/// Returns the scheme and authority of an absolute HTTP(S) URL
///
/// Anything that is not an absolute HTTP(S) URL is returned unchanged.
///
/// # Examples
///
/// ```
/// use sumi_scraper::url::base_url;
///
/// assert_eq!(base_url("https://example.com:8080/path"), "https://example.com:8080");
/// assert_eq!(base_url("not-a-url"), "not-a-url");
/// ```
pub fn base_url(full_url: &str) -> String {
    match Url::parse(full_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            url.origin().ascii_serialization()
        }
        _ => full_url.to_string(),
    }
}

/// Resolves a (possibly relative) link against the page it was found on
///
/// Absolute links are returned as-is. When `base` itself cannot be parsed the
/// link is returned unchanged.
///
/// # Examples
///
/// ```
/// use sumi_scraper::url::resolve_url;
///
/// assert_eq!(
///     resolve_url("https://example.com/list/page1", "/list/page2"),
///     "https://example.com/list/page2"
/// );
/// assert_eq!(
///     resolve_url("https://example.com/list/page1", "page2"),
///     "https://example.com/list/page2"
/// );
/// ```
pub fn resolve_url(base: &str, link: &str) -> String {
    let link = link.trim();
    match Url::parse(base).and_then(|base| base.join(link)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => link.to_string(),
    }
}

/// Builds the URL of a numbered page from a template
///
/// Every occurrence of [`PAGE_PLACEHOLDER`] in `pattern` is replaced by `page`,
/// and the result is resolved against `base`.
pub fn page_url(base: &str, pattern: &str, page: u32) -> String {
    let link = pattern.replace(PAGE_PLACEHOLDER, &page.to_string());
    resolve_url(base, &link)
}

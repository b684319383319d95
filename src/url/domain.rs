use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scraper::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks a host against a domain pattern
///
/// `example.com` matches only itself. `*.example.com` matches the bare domain
/// and any subdomain of it, at any depth.
///
/// # Examples
///
/// ```
/// use sumi_scraper::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "blog.example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "myexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Decides whether a request to `url` is permitted by the allowed-domain list
///
/// An empty list allows every URL. Otherwise the URL must parse, have a host,
/// and that host must match at least one pattern.
pub fn is_allowed_domain(url: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }

    Url::parse(url)
        .ok()
        .and_then(|u| extract_domain(&u))
        .is_some_and(|host| allowed.iter().any(|p| matches_wildcard(p, &host)))
}

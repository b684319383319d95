use crate::config::types::{FetchOptions, PaginationConfig, PaginationStrategy, ScraperConfig};
use crate::url::PAGE_PLACEHOLDER;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_fetch_options(&config.options)?;
    validate_pagination(&config.pagination)?;
    Ok(())
}

/// Validates fetch options (expects normalized options)
fn validate_fetch_options(options: &FetchOptions) -> Result<(), ConfigError> {
    if options.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if options.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            options.max_retries
        )));
    }

    if options.max_concurrent_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-concurrent-pages must be >= 1 when set".to_string(),
        ));
    }

    for domain in &options.allowed_domains {
        validate_domain_pattern(domain)?;
    }

    Ok(())
}

/// Validates that pagination resolves to a usable strategy
fn validate_pagination(pagination: &PaginationConfig) -> Result<(), ConfigError> {
    if let PaginationStrategy::Counted { url_pattern, .. } = pagination.strategy()? {
        if !url_pattern.contains(PAGE_PLACEHOLDER) {
            return Err(ConfigError::Validation(format!(
                "next-page-url-pattern '{}' must contain the '{}' placeholder",
                url_pattern, PAGE_PLACEHOLDER
            )));
        }
    }
    Ok(())
}

/// Validates a domain pattern (supports a leading wildcard)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let base = pattern.strip_prefix("*.").unwrap_or(pattern);

    if base.is_empty() || base.contains('*') {
        return Err(ConfigError::InvalidPattern(format!(
            "Wildcard is only allowed as a leading '*.', got '{}'",
            pattern
        )));
    }

    if base.contains('/') || base.contains(' ') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain pattern must be a bare host, got '{}'",
            pattern
        )));
    }

    Ok(())
}

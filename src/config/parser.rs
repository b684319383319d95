use crate::config::types::ScraperConfig;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Fetch options are normalized before validation, so omitted or zero values
/// take their defaults.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(ScraperConfig)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_scraper::config::load_config;
///
/// let config = load_config(Path::new("scraper.toml")).unwrap();
/// println!("Max retries: {}", config.options.max_retries);
/// ```
pub fn load_config(path: &Path) -> Result<ScraperConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<ScraperConfig, ConfigError> {
    let mut config: ScraperConfig = toml::from_str(content)?;
    config.options = config.options.normalized();

    validate(&config)?;

    Ok(config)
}

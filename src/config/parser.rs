use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use stack_scrape::config::load_config;
///
/// let config = load_config(Path::new("stack-scrape.toml")).unwrap();
/// println!("Scraping {}", config.site.base_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// SHA-256 fingerprint of configuration text, hex encoded
///
/// Logged at startup so two server instances can be told apart by the
/// configuration they run with.
pub fn config_fingerprint(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration and returns it with the fingerprint of the file
/// it was read from
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, config_fingerprint(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[site]
base-url = "https://stackoverflow.com"

[fetcher]
max-concurrent = 10
rate-window-ms = 1000
retry-budget-secs = 30
default-retry-after-secs = 5
request-timeout-secs = 10
max-listing-pages = 2

[user-agent]
crawler-name = "TestScraper"
crawler-version = "1.0"
contact-url = "https://example.com/about"

[server]
host = "0.0.0.0"
port = 8080

[output]
dump-dir = "./dumps"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetcher.max_concurrent, 10);
        assert_eq!(config.fetcher.rate_window_ms, 1000);
        assert_eq!(config.fetcher.max_listing_pages, 2);
        assert_eq!(config.user_agent.crawler_name, "TestScraper");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.output.dump_dir.as_deref(), Some("./dumps"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.site.base_url, "https://stackoverflow.com");
        assert_eq!(config.fetcher.max_concurrent, 50);
        assert_eq!(config.fetcher.rate_window_ms, 60_000);
        assert_eq!(config.fetcher.retry_budget_secs, 500);
        assert_eq!(config.fetcher.default_retry_after_secs, 60);
        assert_eq!(config.server.port, 5000);
        assert!(config.output.dump_dir.is_none());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse_config("[fetcher]\nmax-concurrent = 4\n").unwrap();

        assert_eq!(config.fetcher.max_concurrent, 4);
        assert_eq!(config.fetcher.retry_budget_secs, 500);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[fetcher]\nmax-concurrent = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_fingerprint_matches_file_content() {
        let content = "[server]\nport = 6000\n";
        let file = create_temp_config(content);

        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.server.port, 6000);
        assert_eq!(hash, config_fingerprint(content));
        assert_ne!(hash, config_fingerprint("[server]\nport = 6001\n"));
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        assert_eq!(
            config_fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

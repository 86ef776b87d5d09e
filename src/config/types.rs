use serde::Deserialize;

/// Main configuration structure for Stack-Scrape
///
/// Every section is optional; `Config::default()` is what the server runs
/// with when no configuration file is given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The site being scraped
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root URL every relative link is resolved against
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://stackoverflow.com".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Fetch pacing and retry behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Maximum number of requests in flight at once
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: u32,

    /// Window over which `max-concurrent` requests may be dispatched (milliseconds).
    /// Successive dispatches are spaced by `rate-window-ms / max-concurrent`.
    #[serde(rename = "rate-window-ms")]
    pub rate_window_ms: u64,

    /// Cumulative time a single fetch may spend retrying (seconds)
    #[serde(rename = "retry-budget-secs")]
    pub retry_budget_secs: u64,

    /// Pause applied on HTTP 429 when the response has no `Retry-After` (seconds)
    #[serde(rename = "default-retry-after-secs")]
    pub default_retry_after_secs: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Number of listing pages walked for `/questions`
    #[serde(rename = "max-listing-pages")]
    pub max_listing_pages: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 50,
            rate_window_ms: 60_000,
            retry_budget_secs: 500,
            default_retry_after_secs: 60,
            request_timeout_secs: 30,
            max_listing_pages: 5,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "stack-scrape".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/stack-scrape/stack-scrape".to_string(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Directory the last response of each endpoint is written to, if set
    #[serde(rename = "dump-dir", default)]
    pub dump_dir: Option<String>,
}

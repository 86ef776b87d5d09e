//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building HTTP clients with proper user agent strings
//! - Admission through the `Scheduler` before every attempt
//! - Honouring `Retry-After` on HTTP 429
//! - Exponential backoff for retryable failures, bounded by a time budget

use crate::config::{Config, UserAgentConfig};
use crate::crawler::scheduler::Scheduler;
use crate::FetchError;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use std::time::{Duration, Instant};

/// Anything that can turn a URL into page text
///
/// The assembler only depends on this trait, so record assembly can be
/// driven by a mock server or by canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches one page and returns its body text
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use stack_scrape::config::UserAgentConfig;
/// use stack_scrape::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL)
    let user_agent = format!(
        "{}/{} (+{})",
        config.crawler_name, config.crawler_version, config.contact_url
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited, retrying page fetcher
pub struct Fetcher {
    client: Client,
    scheduler: Scheduler,
    backoff: ExponentialBuilder,
    retry_budget: Duration,
    default_retry_after: Duration,
}

impl Fetcher {
    /// Creates a fetcher from the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Fetcher)` - Ready to fetch
    /// * `Err(reqwest::Error)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let fetcher = &config.fetcher;
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(fetcher.request_timeout_secs),
        )?;

        // The time budget below is what ends retrying; the attempt cap only
        // keeps the builder finite.
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(60))
            .with_max_times(64)
            .with_jitter();

        Ok(Self {
            client,
            scheduler: Scheduler::from_config(fetcher),
            backoff,
            retry_budget: Duration::from_secs(fetcher.retry_budget_secs),
            default_retry_after: Duration::from_secs(fetcher.default_retry_after_secs),
        })
    }

    /// The admission gate shared by every fetch
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// One admitted attempt, without retries
    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let _slot = self
            .scheduler
            .admit()
            .await
            .ok_or_else(|| FetchError::network(url, "admission gate closed"))?;

        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let wait = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(self.default_retry_after);

            tracing::warn!("Rate limited on {}, pausing {:?}", url, wait);
            tokio::time::sleep(wait).await;
            return Err(FetchError::rate_limited(url));
        }

        if !status.is_success() {
            return Err(FetchError::status(url, status.as_u16()));
        }

        response.text().await.map_err(|e| FetchError::network(url, e))
    }
}

#[async_trait]
impl PageSource for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let started = Instant::now();
        let budget = self.retry_budget;

        let result = (|| self.fetch_once(url))
            .retry(self.backoff)
            .sleep(tokio::time::sleep)
            .when(|err: &FetchError| err.retryable && started.elapsed() < budget)
            .notify(|err: &FetchError, delay: Duration| {
                tracing::warn!(
                    url,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying page request"
                );
            })
            .await;

        if let Err(err) = &result {
            tracing::warn!(
                url,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "giving up on page request"
            );
        }
        result
    }
}

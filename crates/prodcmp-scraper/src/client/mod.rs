//! HTTP client for marketplace product and search pages.

mod origin;

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use reqwest::Client;
use url::Url;

use prodcmp_core::{AppConfig, Asin};

use crate::error::ScraperError;
use crate::extract::{extract_product_page, extract_search_results};
use crate::retry::{retry_with_backoff_hinted, RetryPolicy};
use crate::rules::{CompiledRules, ExtractionRules};
use crate::types::{ExtractionMeta, RawExtraction};

pub use origin::{extract_domain, marketplace_origin, product_url, search_url};

/// Desktop browser user agents rotated per request when none is configured.
pub(super) const USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
];

const ACCEPT_LANGUAGE: &str = "en-IN,en;q=0.9";

/// Connection-level settings for [`MarketplaceClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub timeout_secs: u64,
    /// Fixed user agent; `None` rotates through [`USER_AGENT_POOL`].
    pub user_agent: Option<String>,
    pub retry: RetryPolicy,
    /// Mean pause before each page fetch (jittered ±50 %). `0` disables it.
    pub inter_request_delay_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: None,
            retry: RetryPolicy::default(),
            inter_request_delay_ms: 0,
        }
    }
}

impl From<&AppConfig> for ClientOptions {
    fn from(config: &AppConfig) -> Self {
        let defaults = RetryPolicy::default();
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                backoff_base_ms: config.retry_backoff_base_ms,
                max_delay_ms: defaults.max_delay_ms.min(config.retry_max_total_wait_ms),
                max_total_wait_ms: config.retry_max_total_wait_ms,
            },
            inter_request_delay_ms: config.inter_request_delay_ms,
        }
    }
}

/// A fetched HTML page that passed block detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// HTTP client for one marketplace.
///
/// Handles block pages, rate limiting (429), not-found (404), and other
/// non-2xx responses as typed errors. Transient errors (429, 5xx, network
/// failures) are retried with exponential backoff per the configured
/// [`RetryPolicy`]; block pages are never retried.
pub struct MarketplaceClient {
    client: Client,
    origin: Url,
    rules: CompiledRules,
    options: ClientOptions,
}

impl MarketplaceClient {
    /// Creates a client for the marketplace at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] for a malformed base URL, or
    /// [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed (e.g., invalid TLS config).
    pub fn new(
        base_url: &str,
        options: ClientOptions,
        rules: CompiledRules,
    ) -> Result<Self, ScraperError> {
        let origin = marketplace_origin(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(options.timeout_secs.min(10)))
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            origin,
            rules,
            options,
        })
    }

    /// Builds a client from application config, loading extraction rules from
    /// `extraction_rules_path` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Rules`] or [`ScraperError::InvalidSelector`]
    /// for unusable rules, plus the errors of [`MarketplaceClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let rules = match &config.extraction_rules_path {
            Some(path) => ExtractionRules::load(path)?,
            None => ExtractionRules::default(),
        };
        Self::new(
            &config.marketplace_base_url,
            ClientOptions::from(config),
            rules.compile()?,
        )
    }

    /// Marketplace origin, e.g. `https://www.amazon.in/`.
    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Marketplace host name, used to recognise marketplace URLs.
    #[must_use]
    pub fn host(&self) -> &str {
        self.origin.host_str().unwrap_or_default()
    }

    #[must_use]
    pub fn product_url(&self, asin: &Asin) -> String {
        product_url(&self.origin, asin)
    }

    #[must_use]
    pub fn search_url(&self, keyword: &str) -> String {
        search_url(&self.origin, keyword)
    }

    /// Fetches and extracts one product page.
    ///
    /// `asin` is recorded on the extraction; when `None` it is read from the
    /// final page URL if possible. `strategy` labels the record's metadata.
    ///
    /// # Errors
    ///
    /// Propagates every [`MarketplaceClient::fetch_page`] error.
    pub async fn fetch_product(
        &self,
        url: &str,
        asin: Option<&Asin>,
        strategy: &str,
    ) -> Result<RawExtraction, ScraperError> {
        let page = self.fetch_page(url).await?;
        let asin = asin.cloned().or_else(|| Asin::from_url(&page.url));
        let product = extract_product_page(&page.body, &self.rules, asin.as_ref());

        tracing::debug!(
            url = %page.url,
            strategy,
            has_title = product.fields.title.is_some(),
            related = product.related_asins.len(),
            "extracted product page"
        );

        Ok(RawExtraction {
            url: asin
                .as_ref()
                .map_or_else(|| page.url.clone(), |a| self.product_url(a)),
            asin,
            fields: product.fields,
            related_asins: product.related_asins,
            meta: ExtractionMeta {
                strategy: strategy.to_owned(),
                retrieved_at: Utc::now(),
                http_status: page.status,
            },
        })
    }

    /// Runs a keyword search and returns result ASINs in page order.
    ///
    /// # Errors
    ///
    /// Propagates every [`MarketplaceClient::fetch_page`] error.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Asin>, ScraperError> {
        let url = self.search_url(keyword);
        let page = self.fetch_page(&url).await?;
        let asins = extract_search_results(&page.body, &self.rules, &self.origin);
        tracing::debug!(keyword, results = asins.len(), "parsed search results");
        Ok(asins)
    }

    /// Fetches one page, with automatic retry on transient errors.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Blocked`]: the body matched a block signature (not retried).
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries exhausted.
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status (5xx retried, 4xx not).
    /// - [`ScraperError::Http`]: network or TLS failure after all retries exhausted.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, ScraperError> {
        self.pace().await;

        retry_with_backoff_hinted(
            &self.options.retry,
            ScraperError::is_transient,
            ScraperError::retry_after_ms,
            || {
                let url = url.to_owned();
                let user_agent = self.pick_user_agent();
                async move {
                    let response = self
                        .client
                        .get(&url)
                        .header(reqwest::header::USER_AGENT, user_agent)
                        .header(
                            reqwest::header::ACCEPT,
                            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                        )
                        .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
                        .header(reqwest::header::CACHE_CONTROL, "no-cache")
                        .send()
                        .await?;

                    let status = response.status();
                    let final_url = response.url().to_string();
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok());
                    let body = response.text().await?;

                    // Block pages are often served with 503, so check the body first.
                    if let Some(signature) = self.rules.block_signature(&body) {
                        return Err(ScraperError::Blocked {
                            domain: extract_domain(&url),
                            url,
                            signature: signature.to_owned(),
                        });
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        return Err(ScraperError::RateLimited {
                            domain: extract_domain(&url),
                            retry_after_secs: retry_after_secs.unwrap_or(60),
                        });
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(ScraperError::NotFound { url });
                    }

                    if !status.is_success() {
                        return Err(ScraperError::UnexpectedStatus {
                            status: status.as_u16(),
                            url,
                        });
                    }

                    Ok(FetchedPage {
                        url: final_url,
                        status: status.as_u16(),
                        body,
                    })
                }
            },
        )
        .await
    }

    fn pick_user_agent(&self) -> String {
        self.options.user_agent.clone().unwrap_or_else(|| {
            let idx = rand::rng().random_range(0..USER_AGENT_POOL.len());
            USER_AGENT_POOL[idx].to_owned()
        })
    }

    async fn pace(&self) {
        let mean = self.options.inter_request_delay_ms;
        if mean == 0 {
            return;
        }
        let delay_ms = rand::rng().random_range(mean / 2..=mean + mean / 2);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;

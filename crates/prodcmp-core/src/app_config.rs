use std::path::PathBuf;

use crate::weights::WeightOverrides;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Marketplace origin, e.g. `https://www.amazon.in`.
    pub marketplace_base_url: String,
    /// ISO currency assumed when a price carries no symbol or code.
    pub default_currency: String,
    pub request_timeout_secs: u64,
    /// Fixed user agent; `None` rotates through a browser pool.
    pub user_agent: Option<String>,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub retry_max_total_wait_ms: u64,
    pub max_concurrent_strategies: usize,
    pub max_concurrent_requests: usize,
    pub inter_request_delay_ms: u64,
    /// Maximum raw extractions one strategy may contribute.
    pub strategy_budget: usize,
    /// Maximum candidates kept in a comparison (never below the minimum).
    pub max_candidates: usize,
    pub pipeline_timeout_secs: u64,
    pub extraction_rules_path: Option<PathBuf>,
    pub weight_overrides: WeightOverrides,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("marketplace_base_url", &self.marketplace_base_url)
            .field("default_currency", &self.default_currency)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("retry_max_total_wait_ms", &self.retry_max_total_wait_ms)
            .field("max_concurrent_strategies", &self.max_concurrent_strategies)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("strategy_budget", &self.strategy_budget)
            .field("max_candidates", &self.max_candidates)
            .field("pipeline_timeout_secs", &self.pipeline_timeout_secs)
            .field("extraction_rules_path", &self.extraction_rules_path)
            .field("weight_overrides", &self.weight_overrides)
            .finish()
    }
}

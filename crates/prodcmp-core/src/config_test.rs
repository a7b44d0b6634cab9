use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.marketplace_base_url, "https://www.amazon.in");
    assert_eq!(cfg.default_currency, "INR");
    assert_eq!(cfg.request_timeout_secs, 15);
    assert!(cfg.user_agent.is_none());
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert_eq!(cfg.retry_max_total_wait_ms, 30_000);
    assert_eq!(cfg.max_concurrent_strategies, 2);
    assert_eq!(cfg.max_concurrent_requests, 3);
    assert_eq!(cfg.inter_request_delay_ms, 500);
    assert_eq!(cfg.strategy_budget, 10);
    assert_eq!(cfg.max_candidates, 8);
    assert_eq!(cfg.pipeline_timeout_secs, 120);
    assert!(cfg.extraction_rules_path.is_none());
    assert!(cfg.weight_overrides.is_empty());
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_MARKETPLACE_BASE_URL", "https://www.amazon.com/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.marketplace_base_url, "https://www.amazon.com");
}

#[test]
fn base_url_must_be_http() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_MARKETPLACE_BASE_URL", "ftp://www.amazon.in");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRODCMP_MARKETPLACE_BASE_URL"),
        "expected InvalidEnvVar(PRODCMP_MARKETPLACE_BASE_URL), got: {result:?}"
    );
}

#[test]
fn base_url_must_parse() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_MARKETPLACE_BASE_URL", "not a url");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn currency_is_uppercased() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_DEFAULT_CURRENCY", "usd");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.default_currency, "USD");
}

#[test]
fn currency_must_be_three_letters() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_DEFAULT_CURRENCY", "RUPEE");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRODCMP_DEFAULT_CURRENCY"),
        "expected InvalidEnvVar(PRODCMP_DEFAULT_CURRENCY), got: {result:?}"
    );
}

#[test]
fn request_timeout_override() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_REQUEST_TIMEOUT_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 60);
}

#[test]
fn request_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_REQUEST_TIMEOUT_SECS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRODCMP_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(PRODCMP_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn user_agent_override() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_USER_AGENT", "custom-agent/2.0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.user_agent.as_deref(), Some("custom-agent/2.0"));
}

#[test]
fn blank_user_agent_means_rotation() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_USER_AGENT", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.user_agent.is_none());
}

#[test]
fn max_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRODCMP_MAX_RETRIES"),
        "expected InvalidEnvVar(PRODCMP_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn max_concurrent_requests_override() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_MAX_CONCURRENT_REQUESTS", "6");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_concurrent_requests, 6);
}

#[test]
fn max_candidates_below_minimum_is_rejected() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_MAX_CANDIDATES", "4");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRODCMP_MAX_CANDIDATES"),
        "expected InvalidEnvVar(PRODCMP_MAX_CANDIDATES), got: {result:?}"
    );
}

#[test]
fn extraction_rules_path_is_read() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_EXTRACTION_RULES_PATH", "./config/extraction_rules.yaml");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.extraction_rules_path.as_deref(),
        Some(std::path::Path::new("./config/extraction_rules.yaml"))
    );
}

#[test]
fn weight_overrides_are_parsed() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_WEIGHT_PRICE", "0.3");
    map.insert("PRODCMP_WEIGHT_FEATURE", " 0.05 ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.weight_overrides.price, Some(0.3));
    assert_eq!(cfg.weight_overrides.feature, Some(0.05));
    assert!(cfg.weight_overrides.rating.is_none());
}

#[test]
fn weight_override_invalid_number() {
    let mut map = HashMap::new();
    map.insert("PRODCMP_WEIGHT_RATING", "heavy");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRODCMP_WEIGHT_RATING"),
        "expected InvalidEnvVar(PRODCMP_WEIGHT_RATING), got: {result:?}"
    );
}

#[test]
fn load_app_config_needs_no_variables() {
    // Every setting has a default, so a bare environment must load.
    let result = load_app_config();
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

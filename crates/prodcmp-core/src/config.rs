use crate::app_config::AppConfig;
use crate::weights::WeightOverrides;
use crate::{ConfigError, MIN_CANDIDATES};

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_weight = |var: &str| -> Result<Option<f64>, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|e| invalid(var, e.to_string())),
            Err(_) => Ok(None),
        }
    };

    let log_level = or_default("PRODCMP_LOG_LEVEL", "info");

    let marketplace_base_url = or_default("PRODCMP_MARKETPLACE_BASE_URL", "https://www.amazon.in")
        .trim_end_matches('/')
        .to_string();
    match url::Url::parse(&marketplace_base_url) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => {}
        Ok(u) => {
            return Err(invalid(
                "PRODCMP_MARKETPLACE_BASE_URL",
                format!("unsupported scheme \"{}\"", u.scheme()),
            ))
        }
        Err(e) => return Err(invalid("PRODCMP_MARKETPLACE_BASE_URL", e.to_string())),
    }

    let default_currency = or_default("PRODCMP_DEFAULT_CURRENCY", "INR").to_ascii_uppercase();
    if default_currency.len() != 3 || !default_currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid(
            "PRODCMP_DEFAULT_CURRENCY",
            format!("\"{default_currency}\" is not a 3-letter ISO currency code"),
        ));
    }

    let request_timeout_secs = parse_u64("PRODCMP_REQUEST_TIMEOUT_SECS", "15")?;
    let user_agent = lookup("PRODCMP_USER_AGENT")
        .ok()
        .filter(|ua| !ua.trim().is_empty());
    let max_retries = parse_u32("PRODCMP_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("PRODCMP_RETRY_BACKOFF_BASE_MS", "1000")?;
    let retry_max_total_wait_ms = parse_u64("PRODCMP_RETRY_MAX_TOTAL_WAIT_MS", "30000")?;
    let max_concurrent_strategies = parse_usize("PRODCMP_MAX_CONCURRENT_STRATEGIES", "2")?;
    let max_concurrent_requests = parse_usize("PRODCMP_MAX_CONCURRENT_REQUESTS", "3")?;
    let inter_request_delay_ms = parse_u64("PRODCMP_INTER_REQUEST_DELAY_MS", "500")?;
    let strategy_budget = parse_usize("PRODCMP_STRATEGY_BUDGET", "10")?;
    let pipeline_timeout_secs = parse_u64("PRODCMP_PIPELINE_TIMEOUT_SECS", "120")?;

    let max_candidates = parse_usize("PRODCMP_MAX_CANDIDATES", "8")?;
    if max_candidates < MIN_CANDIDATES {
        return Err(invalid(
            "PRODCMP_MAX_CANDIDATES",
            format!("must be at least {MIN_CANDIDATES}, got {max_candidates}"),
        ));
    }

    let extraction_rules_path = lookup("PRODCMP_EXTRACTION_RULES_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let weight_overrides = WeightOverrides {
        price: parse_weight("PRODCMP_WEIGHT_PRICE")?,
        rating: parse_weight("PRODCMP_WEIGHT_RATING")?,
        review: parse_weight("PRODCMP_WEIGHT_REVIEW")?,
        feature: parse_weight("PRODCMP_WEIGHT_FEATURE")?,
    };

    Ok(AppConfig {
        log_level,
        marketplace_base_url,
        default_currency,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        retry_max_total_wait_ms,
        max_concurrent_strategies,
        max_concurrent_requests,
        inter_request_delay_ms,
        strategy_budget,
        max_candidates,
        pipeline_timeout_secs,
        extraction_rules_path,
        weight_overrides,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

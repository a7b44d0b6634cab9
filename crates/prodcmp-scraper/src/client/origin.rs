//! Marketplace URL construction and host utilities.

use prodcmp_core::Asin;
use url::Url;

use crate::error::ScraperError;

/// Parses the configured marketplace origin, dropping any trailing slash,
/// path, query, or fragment.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] when `base_url` is not an absolute
/// `http(s)` URL.
pub fn marketplace_origin(base_url: &str) -> Result<Url, ScraperError> {
    let invalid = |reason: String| ScraperError::InvalidUrl {
        url: base_url.to_owned(),
        reason,
    };
    let parsed = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme \"{}\"", parsed.scheme())));
    }
    let origin = parsed.origin().ascii_serialization();
    Url::parse(&origin).map_err(|e| invalid(e.to_string()))
}

/// Canonical product page: `{origin}/dp/{ASIN}`.
#[must_use]
pub fn product_url(origin: &Url, asin: &Asin) -> String {
    format!("{}/dp/{asin}", origin_str(origin))
}

/// Keyword search page: `{origin}/s?k={keyword}`.
#[must_use]
pub fn search_url(origin: &Url, keyword: &str) -> String {
    let mut url = origin.clone();
    url.set_path("/s");
    url.query_pairs_mut().clear().append_pair("k", keyword);
    url.to_string()
}

/// Extracts the hostname from a URL for use in errors and logs.
///
/// Falls back to the full URL string if parsing fails.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

fn origin_str(origin: &Url) -> &str {
    origin.as_str().trim_end_matches('/')
}

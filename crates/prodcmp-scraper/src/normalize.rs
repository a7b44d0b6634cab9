//! Normalization from [`RawExtraction`] to [`prodcmp_core::Product`].
//!
//! Price, rating, and review parsing is delegated to [`crate::parse`]; this
//! module focuses on assembling a canonical record. Normalization is
//! deterministic and idempotent: feeding a normalized product back through
//! [`RawFields::from`] and [`normalize_extraction`] yields the same product.

use prodcmp_core::{synthetic_product_id, Price, Product};

use crate::error::ScraperError;
use crate::parse::{
    collapse_whitespace, detect_currency, parse_price_amount, parse_rating, parse_review_count,
};
use crate::types::{RawExtraction, RawFields};

/// Characters that separate several features packed into one bullet.
const FEATURE_SEPARATORS: &[char] = &['•', '|', ';', '\n', '\r'];

/// Result of normalizing a batch of raw extractions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeOutcome {
    /// Normalized products in input order, complete or not.
    pub products: Vec<Product>,
    /// Records dropped because no title survived cleaning.
    pub discarded: usize,
    /// Products kept but missing both price and rating.
    pub incomplete: usize,
}

/// Normalizes one raw extraction.
///
/// `default_currency` is used when the price text carries no symbol or code.
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] when the record has no usable
/// title. Every other malformed field is nulled, never fatal.
pub fn normalize_extraction(
    raw: &RawExtraction,
    default_currency: &str,
) -> Result<Product, ScraperError> {
    let title = raw
        .fields
        .title
        .as_deref()
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ScraperError::Normalization {
            source_url: raw.url.clone(),
            reason: "missing title".into(),
        })?;

    let id = raw.asin.as_ref().map_or_else(
        || synthetic_product_id(&raw.url, &title),
        |asin| asin.as_str().to_owned(),
    );

    let price = raw.fields.price.as_deref().and_then(|text| {
        parse_price_amount(text).map(|amount| Price {
            amount,
            currency: detect_currency(text)
                .unwrap_or(default_currency)
                .to_owned(),
        })
    });

    Ok(Product {
        id,
        title,
        brand: raw.fields.brand.as_deref().and_then(normalize_brand),
        price,
        rating: raw.fields.rating.as_deref().and_then(parse_rating),
        review_count: raw.fields.review_count.as_deref().and_then(parse_review_count),
        features: normalize_features(&raw.fields.features),
        source_url: raw.url.clone(),
    })
}

/// Normalizes a batch, counting discards instead of failing.
#[must_use]
pub fn normalize_all(raws: &[RawExtraction], default_currency: &str) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();
    for raw in raws {
        match normalize_extraction(raw, default_currency) {
            Ok(product) => {
                if !product.is_complete() {
                    outcome.incomplete += 1;
                }
                outcome.products.push(product);
            }
            Err(e) => {
                tracing::debug!(
                    url = %raw.url,
                    strategy = %raw.meta.strategy,
                    error = %e,
                    "discarding raw extraction"
                );
                outcome.discarded += 1;
            }
        }
    }
    outcome
}

/// Splits packed bullets, lower-cases, collapses whitespace, and removes
/// empties and duplicates while keeping first-seen order.
#[must_use]
pub fn normalize_features(bullets: &[String]) -> Vec<String> {
    let mut features: Vec<String> = Vec::new();
    for piece in bullets.iter().flat_map(|b| b.split(FEATURE_SEPARATORS)) {
        let feature = collapse_whitespace(piece).to_lowercase();
        if !feature.is_empty() && !features.contains(&feature) {
            features.push(feature);
        }
    }
    features
}

/// Strips byline decorations: `"Visit the Samsung Store"` and
/// `"Brand: Samsung"` both become `"Samsung"`.
#[must_use]
pub fn normalize_brand(raw: &str) -> Option<String> {
    let collapsed = collapse_whitespace(raw);

    let stripped = strip_prefix_ignore_case(&collapsed, "visit the ")
        .and_then(|rest| strip_suffix_ignore_case(rest, " store"))
        .or_else(|| strip_prefix_ignore_case(&collapsed, "brand:"))
        .unwrap_or(&collapsed);

    let brand = collapse_whitespace(stripped);
    (!brand.is_empty()).then_some(brand)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    let tail = s.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &s[..split])
}

impl From<&Product> for RawFields {
    /// Renders a normalized product back into raw text fields.
    fn from(product: &Product) -> Self {
        Self {
            title: Some(product.title.clone()),
            brand: product.brand.clone(),
            price: product.price.as_ref().map(ToString::to_string),
            rating: product.rating.map(|r| r.to_string()),
            review_count: product.review_count.map(|c| c.to_string()),
            features: product.features.clone(),
        }
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

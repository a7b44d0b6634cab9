//! Raw records produced by the scraper, before normalization.

use chrono::{DateTime, Utc};
use serde::Serialize;

use prodcmp_core::Asin;

/// Raw field values as they appeared in the page. Every field may be missing
/// or malformed; the normalizer decides what survives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawFields {
    pub title: Option<String>,
    pub brand: Option<String>,
    /// Price text including currency, e.g. `"₹50,990.00"`.
    pub price: Option<String>,
    /// Rating text, e.g. `"4.3 out of 5 stars"`.
    pub rating: Option<String>,
    /// Review count text, e.g. `"1,234 ratings"` or `"1.2K"`.
    pub review_count: Option<String>,
    /// Feature bullet texts in page order.
    pub features: Vec<String>,
}

/// Metadata describing where a [`RawExtraction`] came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionMeta {
    /// Label of the strategy that produced the record (e.g. `"related_items"`).
    pub strategy: String,
    pub retrieved_at: DateTime<Utc>,
    pub http_status: u16,
}

/// One scraped product page. Ephemeral: consumed by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawExtraction {
    /// Canonical product page URL.
    pub url: String,
    pub asin: Option<Asin>,
    pub fields: RawFields,
    /// Related/also-viewed ASINs listed on the same page, page order, base
    /// ASIN excluded.
    pub related_asins: Vec<Asin>,
    pub meta: ExtractionMeta,
}

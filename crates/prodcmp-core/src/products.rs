use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A positive price in a specific currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., `"INR"`).
    pub currency: String,
}

impl Price {
    /// Display symbol for the currency, falling back to the ISO code.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self.currency.as_str() {
            "INR" => "₹",
            "USD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            other => other,
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.currency, self.amount.normalize())
    }
}

/// A scraped product after cleaning, ready for scoring.
///
/// Constructed once by the normalizer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// ASIN when known, otherwise a synthetic key (see [`synthetic_product_id`]).
    pub id: String,
    pub title: String,
    pub brand: Option<String>,
    pub price: Option<Price>,
    /// Average star rating in `[0, 5]`.
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    /// Lower-cased feature phrases, duplicates removed, first-seen order kept.
    pub features: Vec<String>,
    pub source_url: String,
}

impl Product {
    /// A product missing both price and rating cannot be ranked meaningfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.price.is_some() || self.rating.is_some()
    }

    /// Price amount as `f64`, for scoring.
    #[must_use]
    pub fn price_value(&self) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;
        self.price.as_ref().and_then(|p| p.amount.to_f64())
    }
}

/// Stable identifier for products without an ASIN: `syn-` plus the first 16
/// hex digits of SHA-256 over the source URL and lower-cased title.
#[must_use]
pub fn synthetic_product_id(source_url: &str, title: &str) -> String {
    use sha2::{Digest, Sha256};
    let input = format!("{}\x00{}", source_url.trim(), title.trim().to_lowercase());
    let digest = format!("{:x}", Sha256::digest(input.as_bytes()));
    format!("syn-{}", &digest[..16])
}

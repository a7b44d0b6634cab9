//! Maps a classified [`ProductReference`] onto what to fetch first.
//!
//! No network access happens here.

use prodcmp_core::{Asin, ProductReference};
use serde::Serialize;
use url::Url;

use crate::client::product_url;

/// The first page to fetch for a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchTarget {
    /// A product page. `asin` is `None` for marketplace URLs without an
    /// extractable ASIN; those are fetched exactly as given.
    ProductPage { url: String, asin: Option<Asin> },
    /// A keyword search.
    Search { keyword: String },
}

impl FetchTarget {
    /// The ASIN the target points at, if known.
    #[must_use]
    pub fn asin(&self) -> Option<&Asin> {
        match self {
            Self::ProductPage { asin, .. } => asin.as_ref(),
            Self::Search { .. } => None,
        }
    }
}

/// Resolves a reference against the marketplace origin.
///
/// - ASIN: canonical product page `{origin}/dp/{ASIN}`.
/// - URL containing an ASIN (`/dp/…`, `/gp/product/…`, or a `B0…` code):
///   canonical product page for that ASIN.
/// - URL without an ASIN: the URL itself.
/// - Name: keyword search.
#[must_use]
pub fn resolve_target(reference: &ProductReference, origin: &Url) -> FetchTarget {
    match reference {
        ProductReference::ByAsin(asin) => FetchTarget::ProductPage {
            url: product_url(origin, asin),
            asin: Some(asin.clone()),
        },
        ProductReference::ByUrl(raw) => match Asin::from_url(raw) {
            Some(asin) => FetchTarget::ProductPage {
                url: product_url(origin, &asin),
                asin: Some(asin),
            },
            None => FetchTarget::ProductPage {
                url: raw.clone(),
                asin: None,
            },
        },
        ProductReference::ByName(name) => FetchTarget::Search {
            keyword: name.clone(),
        },
    }
}

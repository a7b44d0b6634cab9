//! Fetch strategies: independent ways of turning a target into raw product
//! extractions.
//!
//! Each strategy runs with a budget (the most extractions it may contribute)
//! and fails on its own. A failing strategy never aborts its siblings; the
//! comparator decides what to do with the aggregate.

mod keywords;

use futures::stream::{self, StreamExt};
use prodcmp_core::{Asin, Product};

use crate::client::MarketplaceClient;
use crate::error::ScraperError;
use crate::resolve::FetchTarget;
use crate::types::RawExtraction;

pub use keywords::{significant_tokens, KeywordVariant, STOPWORDS};

/// Per-run limits shared by every strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyLimits {
    /// Maximum raw extractions one strategy may return.
    pub budget: usize,
    /// Concurrent product-page fetches inside one strategy.
    pub max_concurrent_requests: usize,
}

impl Default for StrategyLimits {
    fn default() -> Self {
        Self {
            budget: 10,
            max_concurrent_requests: 3,
        }
    }
}

/// One way of obtaining raw product extractions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Fetch a single known product page.
    DirectLookup { url: String, asin: Option<Asin> },
    /// Search a keyword and return the first result page that yields a title.
    SearchByName { keyword: String },
    /// Fetch the related / also-viewed products listed on the base page.
    RelatedItems { asins: Vec<Asin> },
    /// Search a keyword derived from the base product and fetch the results.
    KeywordSearch {
        variant: KeywordVariant,
        keyword: String,
    },
}

impl Strategy {
    /// The strategy that locates the base product for a resolved target.
    #[must_use]
    pub fn for_target(target: &FetchTarget) -> Self {
        match target {
            FetchTarget::ProductPage { url, asin } => Self::DirectLookup {
                url: url.clone(),
                asin: asin.clone(),
            },
            FetchTarget::Search { keyword } => Self::SearchByName {
                keyword: keyword.clone(),
            },
        }
    }

    /// Stable label used in logs, diagnostics, and extraction metadata.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::DirectLookup { .. } => "direct_lookup".to_owned(),
            Self::SearchByName { .. } => "search_by_name".to_owned(),
            Self::RelatedItems { .. } => "related_items".to_owned(),
            Self::KeywordSearch { variant, .. } => format!("keyword_search:{}", variant.as_str()),
        }
    }

    /// Runs the strategy.
    ///
    /// Candidate strategies fetch their product pages concurrently, bounded
    /// by `limits.max_concurrent_requests`, and return extractions in result
    /// order. Individual page failures are logged and skipped; the strategy
    /// fails only when nothing was extracted and at least one fetch failed,
    /// in which case a block error is preferred over other errors.
    ///
    /// # Errors
    ///
    /// Returns the [`ScraperError`] that prevented the strategy from
    /// producing anything (search page blocked, product page not found, …).
    pub async fn run(
        &self,
        client: &MarketplaceClient,
        exclude: Option<&Asin>,
        limits: StrategyLimits,
    ) -> Result<Vec<RawExtraction>, ScraperError> {
        let label = self.label();
        match self {
            Self::DirectLookup { url, asin } => {
                let raw = client.fetch_product(url, asin.as_ref(), &label).await?;
                Ok(vec![raw])
            }
            Self::SearchByName { keyword } => {
                let asins = client.search(keyword).await?;
                for asin in asins.iter().take(limits.budget) {
                    let url = client.product_url(asin);
                    match client.fetch_product(&url, Some(asin), &label).await {
                        Ok(raw) if raw.fields.title.is_some() => return Ok(vec![raw]),
                        Ok(_) => {
                            tracing::debug!(%asin, keyword = %keyword, "search result page has no title");
                        }
                        Err(e) if e.is_blocked() => return Err(e),
                        Err(e) => {
                            tracing::warn!(%asin, keyword = %keyword, error = %e, "search result page failed");
                        }
                    }
                }
                Ok(Vec::new())
            }
            Self::RelatedItems { asins } => {
                let asins = pick(asins, exclude, limits.budget);
                fetch_products(client, &asins, &label, limits).await
            }
            Self::KeywordSearch { keyword, .. } => {
                let found = client.search(keyword).await?;
                let asins = pick(&found, exclude, limits.budget);
                fetch_products(client, &asins, &label, limits).await
            }
        }
    }
}

/// Primary and fallback candidate strategies for a base product, in
/// priority order.
///
/// Keyword variants that cannot be formed, or whose query repeats an earlier
/// one, are skipped.
#[must_use]
pub fn candidate_strategies(base: &Product, related: &[Asin]) -> (Vec<Strategy>, Vec<Strategy>) {
    let mut seen: Vec<String> = Vec::new();
    let mut keyword_strategy = |variant: KeywordVariant| {
        let keyword = variant.keyword(&base.title, base.brand.as_deref())?;
        let key = keyword.to_lowercase();
        if seen.contains(&key) {
            return None;
        }
        seen.push(key);
        Some(Strategy::KeywordSearch { variant, keyword })
    };

    let mut primary = Vec::new();
    if !related.is_empty() {
        primary.push(Strategy::RelatedItems {
            asins: related.to_vec(),
        });
    }
    primary.extend(
        [
            KeywordVariant::FullTitle,
            KeywordVariant::ShortTitle,
            KeywordVariant::BrandShort,
        ]
        .into_iter()
        .filter_map(&mut keyword_strategy),
    );

    let fallback = [KeywordVariant::Relaxed, KeywordVariant::BrandOnly]
        .into_iter()
        .filter_map(&mut keyword_strategy)
        .collect();

    (primary, fallback)
}

/// First `budget` ASINs, excluding `exclude` and repeats.
fn pick(asins: &[Asin], exclude: Option<&Asin>, budget: usize) -> Vec<Asin> {
    let mut picked: Vec<Asin> = Vec::new();
    for asin in asins {
        if picked.len() >= budget {
            break;
        }
        if Some(asin) != exclude && !picked.contains(asin) {
            picked.push(asin.clone());
        }
    }
    picked
}

async fn fetch_products(
    client: &MarketplaceClient,
    asins: &[Asin],
    label: &str,
    limits: StrategyLimits,
) -> Result<Vec<RawExtraction>, ScraperError> {
    let results: Vec<Result<RawExtraction, ScraperError>> = stream::iter(asins)
        .map(|asin| async move {
            let url = client.product_url(asin);
            client.fetch_product(&url, Some(asin), label).await
        })
        .buffered(limits.max_concurrent_requests.max(1))
        .collect()
        .await;

    let mut records = Vec::new();
    let mut failure: Option<ScraperError> = None;
    for (asin, result) in asins.iter().zip(results) {
        match result {
            Ok(raw) => records.push(raw),
            Err(e) => {
                tracing::warn!(strategy = label, %asin, error = %e, "candidate page failed");
                let replace = match &failure {
                    None => true,
                    Some(prev) => e.is_blocked() && !prev.is_blocked(),
                };
                if replace {
                    failure = Some(e);
                }
            }
        }
    }

    match failure {
        Some(e) if records.is_empty() => Err(e),
        _ => Ok(records),
    }
}

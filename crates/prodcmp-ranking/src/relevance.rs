//! Relevance of a candidate to the base product, and tiered selection.

use std::collections::HashSet;

use prodcmp_core::{Product, MIN_CANDIDATES};
use prodcmp_scraper::strategy::significant_tokens;

/// Relevance at or above which a candidate is a strict match.
pub const STRICT_THRESHOLD: f64 = 0.30;
/// Relevance at or above which a candidate is a loose match.
pub const LOOSE_THRESHOLD: f64 = 0.15;

const TITLE_WEIGHT: f64 = 0.55;
const BRAND_WEIGHT: f64 = 0.20;
const RATING_WEIGHT: f64 = 0.15;
const REVIEWS_WEIGHT: f64 = 0.10;

/// Share of the base title's significant tokens that also appear in the
/// candidate title, in `[0, 1]`.
#[must_use]
pub fn title_similarity(base_title: &str, candidate_title: &str) -> f64 {
    let base: HashSet<String> = significant_tokens(base_title).into_iter().collect();
    let candidate: HashSet<String> = significant_tokens(candidate_title).into_iter().collect();
    if base.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let similarity = base.intersection(&candidate).count() as f64 / base.len() as f64;
    similarity
}

/// `0.55·title_similarity + 0.20·brand_match + 0.15·rating/5 + 0.10·has_reviews`.
///
/// The brand matches when both brands are equal ignoring case, or when the
/// candidate title mentions the base brand.
#[must_use]
pub fn relevance(base: &Product, candidate: &Product) -> f64 {
    let brand_match = base.brand.as_deref().is_some_and(|brand| {
        let brand = brand.to_lowercase();
        candidate
            .brand
            .as_deref()
            .is_some_and(|b| b.to_lowercase() == brand)
            || candidate.title.to_lowercase().contains(&brand)
    });
    let rating = candidate.rating.map_or(0.0, |r| (r / 5.0).clamp(0.0, 1.0));
    let has_reviews = candidate.review_count.is_some_and(|c| c > 0);

    TITLE_WEIGHT * title_similarity(&base.title, &candidate.title)
        + BRAND_WEIGHT * f64::from(u8::from(brand_match))
        + RATING_WEIGHT * rating
        + REVIEWS_WEIGHT * f64::from(u8::from(has_reviews))
}

/// Picks candidates for the comparison.
///
/// Uses the strict tier when it yields at least the minimum candidate count,
/// else the loose tier under the same condition, else every candidate. The
/// chosen candidates are ordered by descending relevance (ties keep input
/// order) and capped at `max_candidates`.
#[must_use]
pub fn select_candidates(
    base: &Product,
    candidates: Vec<Product>,
    max_candidates: usize,
) -> Vec<(Product, f64)> {
    let scored: Vec<(Product, f64)> = candidates
        .into_iter()
        .map(|c| {
            let r = relevance(base, &c);
            (c, r)
        })
        .collect();

    let count_at = |threshold: f64| scored.iter().filter(|(_, r)| *r >= threshold).count();
    let threshold = if count_at(STRICT_THRESHOLD) >= MIN_CANDIDATES {
        Some(STRICT_THRESHOLD)
    } else if count_at(LOOSE_THRESHOLD) >= MIN_CANDIDATES {
        Some(LOOSE_THRESHOLD)
    } else {
        None
    };

    let mut selected: Vec<(Product, f64)> = scored
        .into_iter()
        .filter(|(_, r)| threshold.is_none_or(|t| *r >= t))
        .collect();
    selected.sort_by(|a, b| b.1.total_cmp(&a.1));
    selected.truncate(max_candidates);

    tracing::debug!(
        tier = threshold.map_or("all", |t| if t >= STRICT_THRESHOLD { "strict" } else { "loose" }),
        selected = selected.len(),
        "selected candidates"
    );
    selected
}

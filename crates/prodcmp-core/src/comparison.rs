//! Output of one comparison request, consumed by presentation and export
//! collaborators.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::products::Product;

/// Per-component scores for one product. Component scores are in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub product_id: String,
    pub price_score: f64,
    pub rating_score: f64,
    pub review_score: f64,
    pub feature_score: f64,
    /// Weighted composite, rounded and clamped to `[0, 100]`.
    pub total_score: u8,
    /// 1-based position in the ranking.
    pub rank: usize,
}

/// A product placed in the ranking together with its score.
#[derive(Debug, Clone, Serialize)]
pub struct RankedProduct {
    pub product: Product,
    pub score: ScoreBreakdown,
    /// Similarity to the base product in `[0, 1]` (`1.0` for the base itself).
    pub relevance: f64,
    pub is_base: bool,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

/// What happened while gathering candidates. Reported on success and attached
/// to insufficient-data failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Strategy labels in the order they were attempted.
    pub strategies_attempted: Vec<String>,
    /// Strategies that failed outright (network, status, parse).
    pub strategies_failed: Vec<String>,
    /// Strategies that hit a block/CAPTCHA page.
    pub strategies_blocked: Vec<String>,
    /// Raw records dropped by the normalizer (no title).
    pub records_discarded: usize,
    /// Normalized candidates dropped for having neither price nor rating.
    pub records_incomplete: usize,
    /// Whether the fallback strategies had to run.
    pub escalated: bool,
    /// Whether the pipeline deadline cut candidate collection short.
    pub timed_out: bool,
}

/// The ranked comparison handed to external collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub base: Product,
    /// Ranked products ordered by rank; includes the base when it is complete.
    pub ranked: Vec<RankedProduct>,
    /// The rank-1 product.
    pub best: Product,
    /// One-sentence justification for [`ComparisonResult::best`].
    pub recommendation: String,
    pub diagnostics: Diagnostics,
}

impl ComparisonResult {
    /// Ranked entries excluding the base product.
    pub fn candidates(&self) -> impl Iterator<Item = &RankedProduct> {
        self.ranked.iter().filter(|r| !r.is_base)
    }

    /// Flat rows in rank order, one per ranked product.
    #[must_use]
    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.ranked
            .iter()
            .map(|r| ExportRow {
                title: r.product.title.clone(),
                price: r.product.price.as_ref().map(|p| p.amount),
                rating: r.product.rating,
                review_count: r.product.review_count,
                total_score: r.score.total_score,
                rank: r.score.rank,
            })
            .collect()
    }
}

/// The export shape the CSV collaborator relies on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub title: String,
    pub price: Option<Decimal>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub total_score: u8,
    pub rank: usize,
}

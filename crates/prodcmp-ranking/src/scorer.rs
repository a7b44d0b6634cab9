//! Weighted multi-factor scoring of a comparison set.
//!
//! Scores are relative: each factor is normalized against the other products
//! in the same set, so the cheapest product always earns the full price
//! score and the most-reviewed product the full review score. Scores are not
//! comparable across different comparison sets.
//!
//! | Factor  | Score (0–100)                             | Missing value |
//! |---------|-------------------------------------------|---------------|
//! | price   | `min_price / price · 100`                 | 0             |
//! | rating  | `rating / 5 · 100`                        | 0             |
//! | review  | `ln(1 + count) / ln(1 + max_count) · 100` | 0             |
//! | feature | `features / max_features · 100`           | 0             |
//!
//! The total is the weighted sum, rounded and clamped to `[0, 100]`.

use std::cmp::Ordering;

use prodcmp_core::{Product, ScoreBreakdown, ScoringWeights};

/// Scores every product in `products` and assigns 1-based ranks.
///
/// The returned breakdowns are in input order. Ranks follow descending total
/// score; ties go to more reviews, then lower price, then earlier input
/// position.
#[must_use]
pub fn score_set(products: &[Product], weights: &ScoringWeights) -> Vec<ScoreBreakdown> {
    let min_price = products
        .iter()
        .filter_map(Product::price_value)
        .filter(|p| *p > 0.0)
        .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |m| m.min(p))));
    let max_reviews = products
        .iter()
        .filter_map(|p| p.review_count)
        .max()
        .unwrap_or(0);
    let max_features = products.iter().map(|p| p.features.len()).max().unwrap_or(0);

    let mut scores: Vec<ScoreBreakdown> = products
        .iter()
        .map(|product| {
            let price_score = price_score(product.price_value(), min_price);
            let rating_score = product.rating.map_or(0.0, |r| (r / 5.0 * 100.0).clamp(0.0, 100.0));
            let review_score = review_score(product.review_count, max_reviews);
            let feature_score = feature_score(product.features.len(), max_features);

            let weighted = price_score * weights.price()
                + rating_score * weights.rating()
                + review_score * weights.review()
                + feature_score * weights.feature();

            ScoreBreakdown {
                product_id: product.id.clone(),
                price_score,
                rating_score,
                review_score,
                feature_score,
                total_score: clamp_total(weighted),
                rank: 0,
            }
        })
        .collect();

    for (position, index) in ranking_order(products, &scores).into_iter().enumerate() {
        scores[index].rank = position + 1;
    }
    scores
}

/// Indexes of `products` from best to worst.
fn ranking_order(products: &[Product], scores: &[ScoreBreakdown]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..products.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .total_score
            .cmp(&scores[a].total_score)
            .then_with(|| {
                let reviews = |i: usize| products[i].review_count.unwrap_or(0);
                reviews(b).cmp(&reviews(a))
            })
            .then_with(|| compare_price(products[a].price_value(), products[b].price_value()))
            .then_with(|| a.cmp(&b))
    });
    order
}

/// Lower price first; a missing price sorts after any known price.
fn compare_price(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn price_score(price: Option<f64>, min_price: Option<f64>) -> f64 {
    match (price, min_price) {
        (Some(p), Some(min)) if p > 0.0 => (min / p * 100.0).clamp(0.0, 100.0),
        _ => 0.0,
    }
}

fn review_score(count: Option<u64>, max_count: u64) -> f64 {
    match count {
        Some(c) if max_count > 0 => {
            #[allow(clippy::cast_precision_loss)]
            let (c, max) = (c as f64, max_count as f64);
            (c.ln_1p() / max.ln_1p() * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}

fn feature_score(count: usize, max_count: usize) -> f64 {
    if max_count == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = count as f64 / max_count as f64;
    (ratio * 100.0).clamp(0.0, 100.0)
}

fn clamp_total(weighted: f64) -> u8 {
    if !weighted.is_finite() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = weighted.round().clamp(0.0, 100.0) as u8;
    total
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use prodcmp_core::Price;
    use rust_decimal::Decimal;

    use super::*;

    fn product(
        id: &str,
        price: Option<&str>,
        rating: Option<f64>,
        reviews: Option<u64>,
        features: usize,
    ) -> Product {
        Product {
            id: id.to_owned(),
            title: format!("Product {id}"),
            brand: None,
            price: price.map(|p| Price {
                amount: Decimal::from_str(p).unwrap(),
                currency: "INR".to_owned(),
            }),
            rating,
            review_count: reviews,
            features: (0..features).map(|i| format!("feature {i}")).collect(),
            source_url: format!("https://www.amazon.in/dp/{id}"),
        }
    }

    fn ranks(scores: &[ScoreBreakdown]) -> Vec<(String, usize)> {
        let mut out: Vec<(String, usize)> = scores
            .iter()
            .map(|s| (s.product_id.clone(), s.rank))
            .collect();
        out.sort_by_key(|(_, rank)| *rank);
        out
    }

    #[test]
    fn factor_scores_follow_documented_formulas() {
        let products = vec![
            product("A", Some("1000"), Some(4.2), Some(99), 4),
            product("B", Some("2000"), Some(5.0), Some(9_999), 1),
        ];
        let scores = score_set(&products, &ScoringWeights::default());

        assert!((scores[0].price_score - 100.0).abs() < 1e-9);
        assert!((scores[1].price_score - 50.0).abs() < 1e-9);
        assert!((scores[0].rating_score - 84.0).abs() < 1e-9);
        assert!((scores[1].rating_score - 100.0).abs() < 1e-9);
        // ln(100) / ln(10_000) = 0.5
        assert!((scores[0].review_score - 50.0).abs() < 1e-9);
        assert!((scores[1].review_score - 100.0).abs() < 1e-9);
        assert!((scores[0].feature_score - 100.0).abs() < 1e-9);
        assert!((scores[1].feature_score - 25.0).abs() < 1e-9);

        // A: 25 + 33.6 + 12.5 + 10 = 81.1; B: 12.5 + 40 + 25 + 2.5 = 80
        assert_eq!(scores[0].total_score, 81);
        assert_eq!(scores[1].total_score, 80);
        assert_eq!(ranks(&scores), vec![("A".into(), 1), ("B".into(), 2)]);
    }

    #[test]
    fn all_review_counts_missing_gives_zero_review_score() {
        let products = vec![
            product("A", Some("500"), Some(4.2), None, 1),
            product("B", Some("700"), Some(4.6), None, 3),
            product("C", None, Some(3.9), None, 0),
        ];
        let scores = score_set(&products, &ScoringWeights::default());
        assert!(scores.iter().all(|s| s.review_score == 0.0));
        assert!(scores.iter().all(|s| s.total_score <= 100));
        let mut seen: Vec<usize> = scores.iter().map(|s| s.rank).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn missing_fields_score_zero() {
        let products = vec![
            product("A", None, Some(4.0), Some(0), 0),
            product("B", Some("10"), None, Some(0), 0),
        ];
        let scores = score_set(&products, &ScoringWeights::default());
        assert_eq!(scores[0].price_score, 0.0);
        assert_eq!(scores[1].rating_score, 0.0);
        // max review count of 0 means no product has review signal
        assert_eq!(scores[0].review_score, 0.0);
        assert_eq!(scores[0].feature_score, 0.0);
    }

    #[test]
    fn totals_stay_within_bounds_for_single_factor_weights() {
        let products = vec![
            product("A", Some("1"), Some(5.0), Some(1_000_000), 50),
            product("B", Some("99999"), Some(0.0), Some(0), 0),
        ];
        for weights in [
            ScoringWeights::new(1.0, 0.0, 0.0, 0.0).unwrap(),
            ScoringWeights::new(0.0, 1.0, 0.0, 0.0).unwrap(),
            ScoringWeights::new(0.0, 0.0, 1.0, 0.0).unwrap(),
            ScoringWeights::new(0.0, 0.0, 0.0, 1.0).unwrap(),
        ] {
            let scores = score_set(&products, &weights);
            assert_eq!(scores[0].total_score, 100);
            assert!(scores[1].total_score <= 100);
        }
    }

    #[test]
    fn ties_broken_by_reviews_then_price_then_input_order() {
        let weights = ScoringWeights::new(0.0, 1.0, 0.0, 0.0).unwrap();
        let products = vec![
            product("first", Some("300"), Some(4.0), Some(10), 0),
            product("cheap", Some("100"), Some(4.0), Some(10), 0),
            product("popular", Some("900"), Some(4.0), Some(50), 0),
            product("twin", Some("300"), Some(4.0), Some(10), 0),
            product("unpriced", None, Some(4.0), Some(10), 0),
        ];
        let scores = score_set(&products, &weights);
        assert!(scores.iter().all(|s| s.total_score == 80));
        assert_eq!(
            ranks(&scores),
            vec![
                ("popular".into(), 1),
                ("cheap".into(), 2),
                ("first".into(), 3),
                ("twin".into(), 4),
                ("unpriced".into(), 5),
            ]
        );
    }

    #[test]
    fn rank_order_is_consistent_with_totals() {
        let products = vec![
            product("A", Some("1500"), Some(3.9), Some(120), 2),
            product("B", Some("1200"), Some(4.4), Some(8_000), 5),
            product("C", Some("999"), Some(4.1), Some(2_500), 1),
            product("D", None, Some(4.8), None, 0),
            product("E", Some("2500"), None, Some(40), 6),
        ];
        let scores = score_set(&products, &ScoringWeights::default());
        let mut by_rank: Vec<&ScoreBreakdown> = scores.iter().collect();
        by_rank.sort_by_key(|s| s.rank);
        for pair in by_rank.windows(2) {
            assert!(pair[0].total_score >= pair[1].total_score);
        }
    }

    #[test]
    fn empty_set_scores_nothing() {
        assert!(score_set(&[], &ScoringWeights::default()).is_empty());
    }
}

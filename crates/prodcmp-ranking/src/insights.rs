//! Pros, cons, and the recommendation sentence.
//!
//! These are display helpers derived from the same fields the scorer uses;
//! they never influence ranking.

use prodcmp_core::{Price, Product, RankedProduct};

const NO_DRAWBACKS: &str = "No major drawbacks identified from available data";

/// Set-level reference values for cons.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SetMedians {
    pub price: Option<f64>,
    pub rating: Option<f64>,
}

impl SetMedians {
    /// Medians over the known prices and ratings of `products`.
    #[must_use]
    pub fn of(products: &[Product]) -> Self {
        Self {
            price: median(products.iter().filter_map(Product::price_value).collect()),
            rating: median(products.iter().filter_map(|p| p.rating).collect()),
        }
    }
}

/// Pros and cons for one product relative to its comparison set.
///
/// A product always gets at least one con; when nothing compares badly the
/// con says so explicitly.
#[must_use]
pub fn pros_and_cons(product: &Product, medians: &SetMedians) -> (Vec<String>, Vec<String>) {
    let mut pros = Vec::new();
    let mut cons = Vec::new();

    match product.rating {
        Some(r) if r >= 4.4 => pros.push("Highly rated by buyers".to_owned()),
        Some(r) if r >= 4.0 => pros.push("Good overall rating".to_owned()),
        _ => {}
    }

    match product.review_count {
        Some(c) if c >= 5_000 => pros.push("Very popular (5K+ reviews)".to_owned()),
        Some(c) if c >= 1_000 => pros.push("Reasonable number of reviews".to_owned()),
        _ => {}
    }

    if let Some(price) = &product.price {
        pros.push(format!("Price around {}", format_price(price)));
    }

    if let (Some(r), Some(median)) = (product.rating, medians.rating) {
        if r < median {
            cons.push("Rating is lower than some alternatives".to_owned());
        }
    }

    if let (Some(p), Some(median)) = (product.price_value(), medians.price) {
        if p > median {
            cons.push("Relatively expensive compared to similar options".to_owned());
        }
    }

    if cons.is_empty() {
        cons.push(NO_DRAWBACKS.to_owned());
    }

    (pros, cons)
}

/// One sentence explaining why the top-ranked product was picked.
#[must_use]
pub fn recommendation(best: &RankedProduct) -> String {
    let product = &best.product;

    let mut reasons = Vec::new();
    if let Some(r) = product.rating.filter(|r| *r > 0.0) {
        reasons.push(format!("a high rating of {r:.1}★"));
    }
    if let Some(c) = product.review_count.filter(|c| *c > 0) {
        reasons.push(format!("{} customer reviews", group_thousands(&c.to_string())));
    }
    if let Some(price) = &product.price {
        reasons.push(format!("a competitive price (~{})", format_price(price)));
    }

    let score = best.score.total_score;
    if reasons.is_empty() {
        return format!(
            "We recommend {} as the best overall value with a score of {score}/100.",
            product.title
        );
    }
    format!(
        "We recommend {} as the best overall value because it combines {} (score {score}/100).",
        product.title,
        join_reasons(&reasons)
    )
}

/// `"₹50,990"`, `"$19.99"`: currency symbol plus grouped amount.
#[must_use]
pub fn format_price(price: &Price) -> String {
    let amount = price.amount.normalize().to_string();
    let (whole, fraction) = amount
        .split_once('.')
        .map_or((amount.as_str(), None), |(w, f)| (w, Some(f)));
    let mut formatted = format!("{}{}", price.symbol(), group_thousands(whole));
    if let Some(fraction) = fraction {
        formatted.push('.');
        formatted.push_str(fraction);
    }
    formatted
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn join_reasons(reasons: &[String]) -> String {
    match reasons {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

//! `compare` command: runs the comparison pipeline and prints the ranking.

use std::fmt::Write as _;
use std::time::Duration;

use clap::Args;
use prodcmp_core::{ComparisonResult, Diagnostics, RankedProduct, WeightOverrides};
use prodcmp_ranking::{format_price, CompareError, CompareRequest, Comparator};

const TITLE_WIDTH: usize = 60;

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Product name, ASIN, or marketplace product URL
    pub input: String,

    /// Weight of the price factor (0-1)
    #[arg(long)]
    pub price_weight: Option<f64>,

    /// Weight of the rating factor (0-1)
    #[arg(long)]
    pub rating_weight: Option<f64>,

    /// Weight of the review-count factor (0-1)
    #[arg(long)]
    pub review_weight: Option<f64>,

    /// Weight of the feature-count factor (0-1)
    #[arg(long)]
    pub feature_weight: Option<f64>,

    /// Give up after this many seconds, keeping what was collected
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the full result as JSON
    #[arg(long, conflicts_with = "rows")]
    pub json: bool,

    /// Print flat export rows as JSON
    #[arg(long)]
    pub rows: bool,
}

impl CompareArgs {
    fn request(&self) -> CompareRequest {
        CompareRequest {
            input: self.input.clone(),
            weights: WeightOverrides {
                price: self.price_weight,
                rating: self.rating_weight,
                review: self.review_weight,
                feature: self.feature_weight,
            },
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Run one comparison and print it.
///
/// # Errors
///
/// Returns an error for invalid weights or input, when the marketplace
/// client cannot be built, or when too few comparable products were found.
/// In the last case the strategy diagnostics are printed to stderr first.
pub(crate) async fn run_compare(
    config: &prodcmp_core::AppConfig,
    args: &CompareArgs,
) -> anyhow::Result<()> {
    let comparator = Comparator::from_config(config)?;

    let result = match comparator.compare(&args.request()).await {
        Ok(result) => result,
        Err(CompareError::InsufficientData {
            found,
            required,
            diagnostics,
        }) => {
            eprint!("{}", format_diagnostics(&diagnostics));
            anyhow::bail!(
                "found only {found} comparable products (need {required}); \
                 try a shorter product name or a different listing"
            );
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        base = %result.base.id,
        best = %result.best.id,
        candidates = result.candidates().count(),
        "comparison complete"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if args.rows {
        println!("{}", serde_json::to_string_pretty(&result.export_rows())?);
    } else {
        print!("{}", format_report(&result));
    }
    Ok(())
}

/// Plain-text ranking table followed by the recommendation.
fn format_report(result: &ComparisonResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Base: {} ({})", result.base.title, result.base.id);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<6}{:<7}{:<14}{:<8}{:<10}TITLE",
        "RANK", "SCORE", "PRICE", "RATING", "REVIEWS"
    );
    for ranked in &result.ranked {
        let _ = writeln!(out, "{}", format_row(ranked));
    }
    let _ = writeln!(out);

    if let Some(best) = result.ranked.first() {
        let _ = writeln!(out, "Pros: {}", best.pros.join("; "));
        let _ = writeln!(out, "Cons: {}", best.cons.join("; "));
    }
    let _ = writeln!(out, "{}", result.recommendation);

    if result.diagnostics.timed_out {
        let _ = writeln!(out, "note: stopped at the deadline; results may be partial");
    }
    if !result.diagnostics.strategies_blocked.is_empty() {
        let _ = writeln!(
            out,
            "note: blocked by the marketplace during {}",
            result.diagnostics.strategies_blocked.join(", ")
        );
    }
    out
}

fn format_row(ranked: &RankedProduct) -> String {
    let product = &ranked.product;
    let rank = if ranked.is_base {
        format!("{}*", ranked.score.rank)
    } else {
        ranked.score.rank.to_string()
    };
    let price = product.price.as_ref().map_or_else(|| "-".to_owned(), format_price);
    let rating = product.rating.map_or_else(|| "-".to_owned(), |r| format!("{r:.1}"));
    let reviews = product
        .review_count
        .map_or_else(|| "-".to_owned(), |c| c.to_string());
    let title = if product.title.chars().count() > TITLE_WIDTH {
        format!("{}...", product.title.chars().take(TITLE_WIDTH).collect::<String>())
    } else {
        product.title.clone()
    };
    format!(
        "{:<6}{:<7}{:<14}{:<8}{:<10}{}",
        rank, ranked.score.total_score, price, rating, reviews, title
    )
}

fn format_diagnostics(diagnostics: &Diagnostics) -> String {
    let list = |labels: &[String]| {
        if labels.is_empty() {
            "none".to_owned()
        } else {
            labels.join(", ")
        }
    };
    let mut out = String::new();
    let _ = writeln!(out, "strategies attempted: {}", list(&diagnostics.strategies_attempted));
    let _ = writeln!(out, "strategies blocked:   {}", list(&diagnostics.strategies_blocked));
    let _ = writeln!(out, "strategies failed:    {}", list(&diagnostics.strategies_failed));
    let _ = writeln!(
        out,
        "records discarded: {}, incomplete: {}",
        diagnostics.records_discarded, diagnostics.records_incomplete
    );
    if diagnostics.escalated {
        let _ = writeln!(out, "fallback strategies were used");
    }
    if diagnostics.timed_out {
        let _ = writeln!(out, "the pipeline deadline was reached");
    }
    out
}

#[cfg(test)]
#[path = "compare_test.rs"]
mod tests;

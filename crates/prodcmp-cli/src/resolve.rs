use prodcmp_ranking::Comparator;
use prodcmp_scraper::FetchTarget;

/// Print how `input` classifies and what the pipeline would fetch first.
///
/// # Errors
///
/// Returns an error if the marketplace client cannot be built or the input is
/// not a usable product reference.
pub(crate) fn run_resolve(config: &prodcmp_core::AppConfig, input: &str) -> anyhow::Result<()> {
    let comparator = Comparator::from_config(config)?;
    let (reference, target) = comparator.resolve(input)?;

    println!("input:  {}", input.trim());
    println!("kind:   {}", reference.kind());
    println!("fetch:  {}", describe_target(&target));
    Ok(())
}

fn describe_target(target: &FetchTarget) -> String {
    match target {
        FetchTarget::ProductPage { url, asin: Some(asin) } => format!("product page {url} (ASIN {asin})"),
        FetchTarget::ProductPage { url, asin: None } => format!("product page {url}"),
        FetchTarget::Search { keyword } => format!("search for \"{keyword}\""),
    }
}

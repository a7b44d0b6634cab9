//! HTML field extraction driven by [`CompiledRules`].
//!
//! Everything here is synchronous: `scraper::Html` is not `Send`, so a
//! document is parsed, read, and dropped before the caller awaits anything.

use prodcmp_core::Asin;
use scraper::{ElementRef, Html};
use url::Url;

use crate::normalize::normalize_brand;
use crate::parse::{collapse_whitespace, parse_price_amount, parse_rating, parse_review_count};
use crate::rules::{CompiledRule, CompiledRules};
use crate::types::RawFields;

/// Fields and related-item ASINs read from one product page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPage {
    pub fields: RawFields,
    /// Related ASINs in page order, deduplicated, excluding the page's own.
    pub related_asins: Vec<Asin>,
}

/// Reads a product page.
///
/// Each field walks its rules in order and keeps the first value that is
/// non-empty and well-typed (a price with a positive amount, a rating in
/// range, a count with digits). A field whose rules are exhausted stays
/// `None`; other fields are unaffected.
#[must_use]
pub fn extract_product_page(html: &str, rules: &CompiledRules, own: Option<&Asin>) -> ProductPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let fields = RawFields {
        title: first_match(root, &rules.title, |v| !v.is_empty()),
        brand: first_match(root, &rules.brand, |v| normalize_brand(v).is_some()),
        price: first_match(root, &rules.price, |v| parse_price_amount(v).is_some()),
        rating: first_match(root, &rules.rating, |v| parse_rating(v).is_some()),
        review_count: first_match(root, &rules.review_count, |v| {
            parse_review_count(v).is_some()
        }),
        features: first_list(root, &rules.features),
    };

    let mut related_asins: Vec<Asin> = Vec::new();
    for rule in &rules.related_asin {
        for element in root.select(&rule.selector) {
            let Some(asin) = read_value(element, rule.attr.as_deref()).and_then(|v| Asin::parse(&v))
            else {
                continue;
            };
            if Some(&asin) != own && !related_asins.contains(&asin) {
                related_asins.push(asin);
            }
        }
    }

    ProductPage {
        fields,
        related_asins,
    }
}

/// Reads a search results page and returns the ASINs of organic results in
/// page order. Only links pointing at a `/dp/` product page count.
#[must_use]
pub fn extract_search_results(html: &str, rules: &CompiledRules, base: &Url) -> Vec<Asin> {
    let document = Html::parse_document(html);

    let mut asins: Vec<Asin> = Vec::new();
    for card in document.select(&rules.search_result) {
        let href = rules.search_result_link.iter().find_map(|rule| {
            card.select(&rule.selector)
                .filter_map(|link| read_value(link, rule.attr.as_deref()))
                .find(|href| href.contains("/dp/"))
        });
        let Some(href) = href else {
            continue;
        };
        let absolute = base
            .join(&href)
            .map_or_else(|_| href.clone(), |u| u.to_string());
        if let Some(asin) = Asin::from_url(&absolute) {
            if !asins.contains(&asin) {
                asins.push(asin);
            }
        }
    }
    asins
}

/// Text of the element, or the named attribute, whitespace-collapsed.
fn read_value(element: ElementRef<'_>, attr: Option<&str>) -> Option<String> {
    let raw = match attr {
        Some(name) => element.value().attr(name)?.to_owned(),
        None => element.text().collect::<String>(),
    };
    let value = collapse_whitespace(&raw);
    (!value.is_empty()).then_some(value)
}

fn first_match<F>(root: ElementRef<'_>, rules: &[CompiledRule], accept: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    rules.iter().find_map(|rule| {
        root.select(&rule.selector)
            .filter_map(|element| read_value(element, rule.attr.as_deref()))
            .find(|value| accept(value))
    })
}

fn first_list(root: ElementRef<'_>, rules: &[CompiledRule]) -> Vec<String> {
    rules
        .iter()
        .map(|rule| {
            root.select(&rule.selector)
                .filter_map(|element| read_value(element, rule.attr.as_deref()))
                .collect::<Vec<_>>()
        })
        .find(|values| !values.is_empty())
        .unwrap_or_default()
}

//! Pluggable field-extraction rules.
//!
//! The marketplace's markup changes independently of this crate, so selectors
//! are data, not code: [`ExtractionRules::default`] carries the built-in set
//! and [`ExtractionRules::load`] replaces it from a YAML file. Rules are
//! compiled once into [`CompiledRules`]; a bad selector fails at load time,
//! never mid-scrape.

use std::path::Path;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

/// One candidate way of reading a field: a CSS selector and, optionally, the
/// attribute to read instead of the element text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorRule {
    pub selector: String,
    #[serde(default)]
    pub attr: Option<String>,
}

impl SelectorRule {
    fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_owned(),
            attr: None,
        }
    }

    fn attr(selector: &str, attr: &str) -> Self {
        Self {
            selector: selector.to_owned(),
            attr: Some(attr.to_owned()),
        }
    }
}

/// Ordered rules per product-page field. Earlier rules win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPageRules {
    pub title: Vec<SelectorRule>,
    #[serde(default)]
    pub brand: Vec<SelectorRule>,
    #[serde(default)]
    pub price: Vec<SelectorRule>,
    #[serde(default)]
    pub rating: Vec<SelectorRule>,
    #[serde(default)]
    pub review_count: Vec<SelectorRule>,
    #[serde(default)]
    pub features: Vec<SelectorRule>,
}

/// Rules for pages that list other products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRules {
    /// One element per organic search result.
    pub search_result: String,
    /// Link inside a search result pointing at the product page.
    pub search_result_link: Vec<SelectorRule>,
    /// Elements on a product page that carry related-item ASINs.
    pub related_asin: Vec<SelectorRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRules {
    pub product: ProductPageRules,
    pub listing: ListingRules,
    /// Lower-case substrings that identify a CAPTCHA / access-denied page.
    pub block_signatures: Vec<String>,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            product: ProductPageRules {
                title: vec![
                    SelectorRule::text("#productTitle"),
                    SelectorRule::text("#title"),
                    SelectorRule::attr("meta[property='og:title']", "content"),
                ],
                brand: vec![
                    SelectorRule::text("#bylineInfo"),
                    SelectorRule::text("tr.po-brand td.a-span9 span"),
                    SelectorRule::text("a#brand"),
                ],
                price: vec![
                    SelectorRule::text("#corePrice_feature_div span.a-price span.a-offscreen"),
                    SelectorRule::text("span.a-price span.a-offscreen"),
                    SelectorRule::text("#priceblock_ourprice"),
                    SelectorRule::text("#priceblock_dealprice"),
                    SelectorRule::text("#priceblock_saleprice"),
                    SelectorRule::text("span.a-price-whole"),
                ],
                rating: vec![
                    SelectorRule::attr("#acrPopover", "title"),
                    SelectorRule::text("span.a-icon-alt"),
                ],
                review_count: vec![
                    SelectorRule::text("#acrCustomerReviewText"),
                    SelectorRule::text("span[data-hook='total-review-count']"),
                ],
                features: vec![
                    SelectorRule::text("#feature-bullets ul li span.a-list-item"),
                    SelectorRule::text("#feature-bullets li"),
                ],
            },
            listing: ListingRules {
                search_result: "div[data-component-type='s-search-result']".to_owned(),
                search_result_link: vec![
                    SelectorRule::attr("a.a-link-normal.s-no-outline", "href"),
                    SelectorRule::attr("a.a-link-normal.a-text-normal", "href"),
                    SelectorRule::attr("h2 a", "href"),
                ],
                related_asin: vec![
                    SelectorRule::attr("li[data-asin]", "data-asin"),
                    SelectorRule::attr("div[data-asin]", "data-asin"),
                ],
            },
            block_signatures: vec![
                "/errors/validatecaptcha".to_owned(),
                "enter the characters you see below".to_owned(),
                "to discuss automated access to amazon data".to_owned(),
                "sorry, we just need to make sure you're not a robot".to_owned(),
                "attention required! | cloudflare".to_owned(),
                "/cdn-cgi/challenge-platform/".to_owned(),
                "<title>access denied</title>".to_owned(),
            ],
        }
    }
}

impl ExtractionRules {
    /// Parses rules from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Rules`] when the YAML does not match the rule
    /// schema.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ScraperError> {
        serde_yaml::from_str(yaml).map_err(|e| ScraperError::Rules {
            path: "<inline>".to_owned(),
            reason: e.to_string(),
        })
    }

    /// Loads rules from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Rules`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ScraperError> {
        let content = std::fs::read_to_string(path).map_err(|e| ScraperError::Rules {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ScraperError::Rules {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Compiles every selector.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] naming the first selector
    /// that does not parse, or [`ScraperError::Rules`] if the title rule list
    /// is empty.
    pub fn compile(&self) -> Result<CompiledRules, ScraperError> {
        if self.product.title.is_empty() {
            return Err(ScraperError::Rules {
                path: "<rules>".to_owned(),
                reason: "at least one title rule is required".to_owned(),
            });
        }

        Ok(CompiledRules {
            title: compile_all("title", &self.product.title)?,
            brand: compile_all("brand", &self.product.brand)?,
            price: compile_all("price", &self.product.price)?,
            rating: compile_all("rating", &self.product.rating)?,
            review_count: compile_all("review_count", &self.product.review_count)?,
            features: compile_all("features", &self.product.features)?,
            search_result: compile_selector("search_result", &self.listing.search_result)?,
            search_result_link: compile_all(
                "search_result_link",
                &self.listing.search_result_link,
            )?,
            related_asin: compile_all("related_asin", &self.listing.related_asin)?,
            block_signatures: self
                .block_signatures
                .iter()
                .map(|s| s.to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}

/// A selector ready for matching, plus the attribute to read.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub(crate) selector: Selector,
    pub(crate) attr: Option<String>,
}

/// Parsed selectors, built once per client.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub(crate) title: Vec<CompiledRule>,
    pub(crate) brand: Vec<CompiledRule>,
    pub(crate) price: Vec<CompiledRule>,
    pub(crate) rating: Vec<CompiledRule>,
    pub(crate) review_count: Vec<CompiledRule>,
    pub(crate) features: Vec<CompiledRule>,
    pub(crate) search_result: Selector,
    pub(crate) search_result_link: Vec<CompiledRule>,
    pub(crate) related_asin: Vec<CompiledRule>,
    pub(crate) block_signatures: Vec<String>,
}

impl CompiledRules {
    /// Returns the first block signature found in `body`, if any.
    #[must_use]
    pub fn block_signature<'a>(&'a self, body: &str) -> Option<&'a str> {
        let lowered = body.to_lowercase();
        self.block_signatures
            .iter()
            .find(|sig| lowered.contains(sig.as_str()))
            .map(String::as_str)
    }
}

fn compile_selector(field: &str, selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|_| ScraperError::InvalidSelector {
        field: field.to_owned(),
        selector: selector.to_owned(),
    })
}

fn compile_all(field: &str, rules: &[SelectorRule]) -> Result<Vec<CompiledRule>, ScraperError> {
    rules
        .iter()
        .map(|rule| {
            Ok(CompiledRule {
                selector: compile_selector(field, &rule.selector)?,
                attr: rule.attr.clone(),
            })
        })
        .collect()
}

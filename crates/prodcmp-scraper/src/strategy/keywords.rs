//! Search keyword derivation from a base product's title and brand.

use serde::Serialize;

/// Words that carry no identity on their own: connectives, units, colours,
/// and generic product nouns.
pub const STOPWORDS: &[&str] = &[
    "with", "for", "and", "the", "inch", "cm", "gb", "green", "black", "white", "blue", "phone",
    "smartphone", "series", "model", "new",
];

/// Number of leading title words in a short-title query.
const SHORT_TITLE_WORDS: usize = 4;

/// How a keyword-search strategy builds its query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordVariant {
    /// The base title as-is.
    FullTitle,
    /// The first four words of the title.
    ShortTitle,
    /// Brand followed by the first two non-brand title words.
    BrandShort,
    /// The two most significant title tokens, stopwords removed.
    Relaxed,
    /// The brand alone.
    BrandOnly,
}

impl KeywordVariant {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullTitle => "full_title",
            Self::ShortTitle => "short_title",
            Self::BrandShort => "brand_short",
            Self::Relaxed => "relaxed",
            Self::BrandOnly => "brand_only",
        }
    }

    /// Builds this variant's query, or `None` when it cannot be formed
    /// (e.g. brand variants without a brand).
    #[must_use]
    pub fn keyword(self, title: &str, brand: Option<&str>) -> Option<String> {
        let words: Vec<&str> = title.split_whitespace().collect();
        let brand = brand.map(str::trim).filter(|b| !b.is_empty());

        let keyword = match self {
            Self::FullTitle => words.join(" "),
            Self::ShortTitle => words
                .iter()
                .take(SHORT_TITLE_WORDS)
                .copied()
                .collect::<Vec<_>>()
                .join(" "),
            Self::BrandShort => {
                let brand = brand?;
                let brand_lower = brand.to_lowercase();
                let rest: Vec<&str> = words
                    .iter()
                    .copied()
                    .filter(|w| !brand_lower.contains(&w.to_lowercase()))
                    .take(2)
                    .collect();
                if rest.is_empty() {
                    return None;
                }
                format!("{brand} {}", rest.join(" "))
            }
            Self::Relaxed => significant_tokens(title)
                .into_iter()
                .take(2)
                .collect::<Vec<_>>()
                .join(" "),
            Self::BrandOnly => brand?.to_owned(),
        };

        let keyword = keyword.trim().to_owned();
        (!keyword.is_empty()).then_some(keyword)
    }
}

/// Lower-cased alphanumeric title tokens with stopwords and single
/// characters removed, in title order.
#[must_use]
pub fn significant_tokens(title: &str) -> Vec<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() > 1 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

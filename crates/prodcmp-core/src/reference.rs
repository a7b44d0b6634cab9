//! User-supplied product references and ASIN handling.
//!
//! Classification is purely structural: no network access happens here.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CoreError;

static ASIN_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:dp|gp/product)/([A-Za-z0-9]{10})(?:[/?#]|$)").expect("valid regex")
});
static LOOSE_ASIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9])(B0[A-Z0-9]{8})(?:[^A-Za-z0-9]|$)").expect("valid regex")
});

/// Length of a marketplace ASIN.
pub const ASIN_LEN: usize = 10;

/// Validated 10-character alphanumeric product identifier, stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asin(String);

impl Asin {
    /// Parses `raw` as an ASIN. Surrounding whitespace is ignored.
    ///
    /// At least one digit is required so ten-letter words such as
    /// `"headphones"` stay free-text names.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == ASIN_LEN
            && trimmed.chars().all(|c| c.is_ascii_alphanumeric())
            && trimmed.chars().any(|c| c.is_ascii_digit())
        {
            Some(Self(trimmed.to_ascii_uppercase()))
        } else {
            None
        }
    }

    /// Extracts an ASIN from a product URL.
    ///
    /// Recognizes `/dp/<ASIN>` and `/gp/product/<ASIN>` path segments first,
    /// then falls back to any `B0`-prefixed code anywhere in the URL.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        if let Some(cap) = ASIN_PATH_RE.captures(url) {
            return cap.get(1).and_then(|m| Self::parse(m.as_str()));
        }

        LOOSE_ASIN_RE
            .captures(url)
            .and_then(|cap| cap.get(1))
            .and_then(|m| Self::parse(m.as_str()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Asin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A product reference exactly as the user meant it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProductReference {
    ByName(String),
    ByAsin(Asin),
    ByUrl(String),
}

impl ProductReference {
    /// Classifies raw user input as an ASIN, a marketplace URL, or a free-text
    /// name.
    ///
    /// `extra_hosts` lists additional hosts accepted as marketplace URLs on top
    /// of any `amazon.*` domain (e.g. the configured base URL's host).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidReference`] when the input is empty, when a
    /// name contains no alphanumeric characters, or when it is an `http(s)`
    /// URL that does not point at the marketplace.
    pub fn classify(input: &str, extra_hosts: &[&str]) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidReference(
                "input is empty; enter a product name, a 10-character ASIN, or a marketplace product URL"
                    .to_owned(),
            ));
        }

        if let Some(asin) = Asin::parse(trimmed) {
            return Ok(Self::ByAsin(asin));
        }

        if let Ok(url) = url::Url::parse(trimmed) {
            if matches!(url.scheme(), "http" | "https") {
                let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
                if is_marketplace_host(&host, extra_hosts) {
                    return Ok(Self::ByUrl(trimmed.to_owned()));
                }
                return Err(CoreError::InvalidReference(format!(
                    "\"{host}\" is not a supported marketplace; paste a product URL such as https://www.amazon.in/dp/B09XS7JWHH"
                )));
            }
        }

        let name = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
        if !name.chars().any(char::is_alphanumeric) {
            return Err(CoreError::InvalidReference(format!(
                "\"{name}\" does not contain any searchable words"
            )));
        }
        Ok(Self::ByName(name))
    }

    /// Short label used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ByName(_) => "name",
            Self::ByAsin(_) => "asin",
            Self::ByUrl(_) => "url",
        }
    }
}

fn is_marketplace_host(host: &str, extra_hosts: &[&str]) -> bool {
    host.split('.').any(|label| label == "amazon")
        || extra_hosts
            .iter()
            .any(|extra| extra.eq_ignore_ascii_case(host))
}

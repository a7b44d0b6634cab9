use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The marketplace served a CAPTCHA or access-denied page.
    #[error("blocked by {domain} while fetching {url} ({signature})")]
    Blocked {
        domain: String,
        url: String,
        signature: String,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("normalization error for {source_url}: {reason}")]
    Normalization { source_url: String, reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("could not load extraction rules from {path}: {reason}")]
    Rules { path: String, reason: String },

    #[error("invalid selector \"{selector}\" for {field}")]
    InvalidSelector { field: String, selector: String },
}

impl ScraperError {
    /// The wait the server asked for, when it sent a `Retry-After`.
    #[must_use]
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited {
                retry_after_secs, ..
            } => Some(retry_after_secs.saturating_mul(1_000)),
            _ => None,
        }
    }

    /// Transient failures worth retrying: timeouts and connection errors,
    /// HTTP 5xx, and HTTP 429.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            Self::RateLimited { .. } => true,
            Self::UnexpectedStatus { status, .. } => (500..600).contains(status),
            Self::Blocked { .. }
            | Self::NotFound { .. }
            | Self::Normalization { .. }
            | Self::InvalidUrl { .. }
            | Self::Rules { .. }
            | Self::InvalidSelector { .. } => false,
        }
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

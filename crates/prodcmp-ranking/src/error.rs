use prodcmp_core::{ConfigError, CoreError, Diagnostics};
use prodcmp_scraper::ScraperError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    /// The input could not be classified, or no base product could be
    /// obtained for it.
    #[error("invalid product reference: {0}")]
    InvalidReference(String),

    /// Fewer comparable candidates than required after every strategy ran.
    #[error(
        "insufficient data: found {found} comparable products, need at least {required} \
         ({} strategies attempted, {} blocked, {} failed)",
        .diagnostics.strategies_attempted.len(),
        .diagnostics.strategies_blocked.len(),
        .diagnostics.strategies_failed.len()
    )]
    InsufficientData {
        found: usize,
        required: usize,
        diagnostics: Box<Diagnostics>,
    },

    /// Scoring weights or environment settings are invalid.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// The marketplace client could not be built (bad base URL or rules).
    #[error("could not set up marketplace client: {0}")]
    Client(#[from] ScraperError),
}

impl From<CoreError> for CompareError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidReference(reason) => Self::InvalidReference(reason),
        }
    }
}

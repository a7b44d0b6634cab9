pub mod client;
pub mod error;
pub mod extract;
pub mod normalize;
mod parse;
pub mod resolve;
pub mod retry;
pub mod rules;
pub mod strategy;
pub mod types;

pub use client::{ClientOptions, FetchedPage, MarketplaceClient};
pub use error::ScraperError;
pub use normalize::{normalize_all, normalize_extraction, NormalizeOutcome};
pub use resolve::{resolve_target, FetchTarget};
pub use retry::{retry_with_backoff, retry_with_backoff_hinted, RetryPolicy};
pub use rules::{CompiledRules, ExtractionRules, SelectorRule};
pub use strategy::{candidate_strategies, KeywordVariant, Strategy, StrategyLimits};
pub use types::{ExtractionMeta, RawExtraction, RawFields};

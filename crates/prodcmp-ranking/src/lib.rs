//! Candidate selection, scoring, and ranking for product comparisons.
//!
//! [`Comparator::compare`] drives the whole pipeline: it resolves the input,
//! locates the base product, runs fetch strategies until at least
//! [`prodcmp_core::MIN_CANDIDATES`] comparable products are known, scores the
//! set with weighted factors, and returns the ranked result with a
//! recommendation.

pub mod comparator;
pub mod error;
pub mod guarantee;
pub mod insights;
pub mod relevance;
pub mod scorer;

pub use comparator::{CompareOptions, CompareRequest, Comparator, Stage};
pub use error::CompareError;
pub use guarantee::{check_minimum, Shortfall};
pub use insights::{format_price, pros_and_cons, recommendation, SetMedians};
pub use relevance::{relevance, select_candidates, title_similarity};
pub use scorer::score_set;

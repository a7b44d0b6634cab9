pub mod app_config;
pub mod comparison;
pub mod config;
pub mod products;
pub mod reference;
pub mod weights;

pub use app_config::AppConfig;
pub use comparison::{ComparisonResult, Diagnostics, ExportRow, RankedProduct, ScoreBreakdown};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{synthetic_product_id, Price, Product};
pub use reference::{Asin, ProductReference};
pub use weights::{ScoringWeights, WeightOverrides};

use thiserror::Error;

/// Minimum number of comparable candidates (excluding the base product) a
/// successful comparison must contain.
pub const MIN_CANDIDATES: usize = 5;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid product reference: {0}")]
    InvalidReference(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid scoring weights: {0}")]
    InvalidWeights(String),
}

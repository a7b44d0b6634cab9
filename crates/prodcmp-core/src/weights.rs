//! Scoring weight configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Allowed deviation of the weight sum from exactly `1.0`.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Validated weights for the composite score. Each weight is in `[0, 1]` and
/// the four weights sum to `1.0` (within [`WEIGHT_SUM_EPSILON`]).
///
/// Fields are private so an unvalidated set cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringWeights {
    price: f64,
    rating: f64,
    review: f64,
    feature: f64,
}

impl ScoringWeights {
    /// Builds a weight set, validating range and sum.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWeights`] if any weight is outside `[0, 1]`
    /// (or not finite) or the weights do not sum to `1.0`.
    pub fn new(price: f64, rating: f64, review: f64, feature: f64) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("price", price),
            ("rating", rating),
            ("review", review),
            ("feature", feature),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidWeights(format!(
                    "{name} weight {value} is outside [0, 1]"
                )));
            }
        }

        let sum = price + rating + review + feature;
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::InvalidWeights(format!(
                "weights must sum to 1.0, got {sum}"
            )));
        }

        Ok(Self {
            price,
            rating,
            review,
            feature,
        })
    }

    #[must_use]
    pub fn price(&self) -> f64 {
        self.price
    }

    #[must_use]
    pub fn rating(&self) -> f64 {
        self.rating
    }

    #[must_use]
    pub fn review(&self) -> f64 {
        self.review
    }

    #[must_use]
    pub fn feature(&self) -> f64 {
        self.feature
    }
}

impl Default for ScoringWeights {
    /// Rating-led defaults: rating 0.40, price 0.25, reviews 0.25, features 0.10.
    fn default() -> Self {
        Self {
            price: 0.25,
            rating: 0.40,
            review: 0.25,
            feature: 0.10,
        }
    }
}

/// Partial weight overrides supplied by the caller (CLI flags or env).
/// Unset weights keep their default value; the merged set is then validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct WeightOverrides {
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub review: Option<f64>,
    pub feature: Option<f64>,
}

impl WeightOverrides {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.rating.is_none()
            && self.review.is_none()
            && self.feature.is_none()
    }

    /// Layers `other` on top of `self`: values set in `other` win.
    #[must_use]
    pub fn merged_with(self, other: Self) -> Self {
        Self {
            price: other.price.or(self.price),
            rating: other.rating.or(self.rating),
            review: other.review.or(self.review),
            feature: other.feature.or(self.feature),
        }
    }

    /// Applies the overrides to the default weights and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWeights`] when the merged set is invalid.
    pub fn resolve(&self) -> Result<ScoringWeights, ConfigError> {
        let defaults = ScoringWeights::default();
        ScoringWeights::new(
            self.price.unwrap_or(defaults.price),
            self.rating.unwrap_or(defaults.rating),
            self.review.unwrap_or(defaults.review),
            self.feature.unwrap_or(defaults.feature),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let w = ScoringWeights::default();
        let sum = w.price() + w.rating() + w.review() + w.feature();
        assert!((sum - 1.0).abs() <= WEIGHT_SUM_EPSILON);
        assert!(ScoringWeights::new(w.price(), w.rating(), w.review(), w.feature()).is_ok());
    }

    #[test]
    fn accepts_sum_within_epsilon() {
        assert!(ScoringWeights::new(0.3, 0.3, 0.2, 0.2 + 5e-7).is_ok());
    }

    #[test]
    fn rejects_sum_above_one() {
        let err = ScoringWeights::new(0.5, 0.5, 0.1, 0.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights(ref m) if m.contains("sum")));
    }

    #[test]
    fn rejects_sum_below_one() {
        assert!(matches!(
            ScoringWeights::new(0.2, 0.2, 0.2, 0.2),
            Err(ConfigError::InvalidWeights(_))
        ));
    }

    #[test]
    fn rejects_negative_weight() {
        let err = ScoringWeights::new(-0.1, 0.6, 0.3, 0.2).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeights(ref m) if m.contains("price")));
    }

    #[test]
    fn rejects_nan_weight() {
        assert!(ScoringWeights::new(f64::NAN, 0.5, 0.25, 0.25).is_err());
    }

    #[test]
    fn overrides_apply_over_defaults() {
        let overrides = WeightOverrides {
            price: Some(0.35),
            feature: Some(0.0),
            ..WeightOverrides::default()
        };
        let w = overrides.resolve().unwrap();
        assert!((w.price() - 0.35).abs() < f64::EPSILON);
        assert!((w.rating() - 0.40).abs() < f64::EPSILON);
        assert!((w.feature() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_override_breaking_sum_is_rejected() {
        let overrides = WeightOverrides {
            rating: Some(0.9),
            ..WeightOverrides::default()
        };
        assert!(matches!(overrides.resolve(), Err(ConfigError::InvalidWeights(_))));
    }

    #[test]
    fn merged_with_prefers_other() {
        let env = WeightOverrides {
            price: Some(0.1),
            rating: Some(0.5),
            ..WeightOverrides::default()
        };
        let cli = WeightOverrides {
            price: Some(0.2),
            ..WeightOverrides::default()
        };
        let merged = env.merged_with(cli);
        assert_eq!(merged.price, Some(0.2));
        assert_eq!(merged.rating, Some(0.5));
        assert!(merged.review.is_none());
    }
}

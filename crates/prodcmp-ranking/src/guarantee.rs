//! The minimum-candidate invariant.
//!
//! A comparison is only meaningful with at least [`MIN_CANDIDATES`]
//! comparable products besides the base. Every place that asks "do we have
//! enough?" goes through [`check_minimum`].

use prodcmp_core::MIN_CANDIDATES;

/// How far short of the minimum a candidate set is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub found: usize,
    pub required: usize,
}

impl Shortfall {
    #[must_use]
    pub fn missing(&self) -> usize {
        self.required.saturating_sub(self.found)
    }
}

/// Checks `found` complete, deduplicated candidates (base excluded) against
/// the minimum.
///
/// # Errors
///
/// Returns the [`Shortfall`] when fewer than [`MIN_CANDIDATES`] were found.
pub fn check_minimum(found: usize) -> Result<(), Shortfall> {
    if found >= MIN_CANDIDATES {
        Ok(())
    } else {
        Err(Shortfall {
            found,
            required: MIN_CANDIDATES,
        })
    }
}

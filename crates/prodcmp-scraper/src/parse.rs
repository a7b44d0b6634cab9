//! Low-level string parsing for raw marketplace field text.
//!
//! Character-level scanners for the numeric fields. See
//! [`crate::normalize`] for how they compose into full product
//! normalization.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Symbol and code markers mapped to ISO currency codes. Checked in order.
const CURRENCY_MARKERS: &[(&str, &str)] = &[
    ("₹", "INR"),
    ("INR", "INR"),
    ("RS.", "INR"),
    ("€", "EUR"),
    ("EUR", "EUR"),
    ("£", "GBP"),
    ("GBP", "GBP"),
    ("$", "USD"),
    ("USD", "USD"),
];

/// Detects the ISO currency code a price text is written in.
///
/// Returns `None` when the text carries no recognisable symbol or code.
#[must_use]
pub(crate) fn detect_currency(text: &str) -> Option<&'static str> {
    let upper = text.to_uppercase();
    CURRENCY_MARKERS
        .iter()
        .find(|(marker, _)| upper.contains(marker))
        .map(|(_, code)| *code)
}

/// Parses the first numeric run of a price text into a positive amount.
///
/// Separator rules:
/// - both `,` and `.` present: the one appearing last is the decimal
///   separator, the other is a thousands separator;
/// - only `,`: decimal when it occurs once and is followed by exactly two
///   digits (`"12,50"`), otherwise thousands (`"50,990"`, `"1,00,000"`);
/// - only `.`: decimal when it occurs once, otherwise thousands.
///
/// Returns `None` for negative, zero, or unparsable amounts.
#[must_use]
pub(crate) fn parse_price_amount(text: &str) -> Option<Decimal> {
    let (run, negative) = first_numeric_run(text)?;
    if negative {
        return None;
    }

    let commas = run.matches(',').count();
    let dots = run.matches('.').count();

    let canonical: String = match (commas, dots) {
        (0, 0) => run.to_owned(),
        (_, 0) => {
            let decimal_comma = commas == 1
                && run
                    .rsplit_once(',')
                    .is_some_and(|(_, tail)| tail.len() == 2);
            if decimal_comma {
                run.replace(',', ".")
            } else {
                run.replace(',', "")
            }
        }
        (0, _) => {
            if dots == 1 {
                run.to_owned()
            } else {
                run.replace('.', "")
            }
        }
        _ => {
            let last_comma = run.rfind(',').unwrap_or(0);
            let last_dot = run.rfind('.').unwrap_or(0);
            if last_comma > last_dot {
                run.replace('.', "").replace(',', ".")
            } else {
                run.replace(',', "")
            }
        }
    };

    let amount = Decimal::from_str(&canonical).ok()?;
    (amount > Decimal::ZERO).then(|| amount.normalize())
}

/// Parses a star rating such as `"4.3 out of 5 stars"` or `"4,3"`.
///
/// Only the first numeric token counts. Values outside `[0, 5]` are
/// rejected rather than clamped.
#[must_use]
pub(crate) fn parse_rating(text: &str) -> Option<f64> {
    let (run, negative) = first_numeric_run(text)?;
    if negative {
        return None;
    }
    // "4.3" / "4,3"; anything with more than one separator is not a rating.
    let canonical = run.replace(',', ".");
    if canonical.matches('.').count() > 1 {
        return None;
    }
    let value = canonical.parse::<f64>().ok()?;
    (value.is_finite() && (0.0..=5.0).contains(&value)).then_some(value)
}

/// Parses a review count such as `"1,234 ratings"`, `"(2,345)"` or `"1.2K"`.
///
/// `K` and `M` suffixes scale the number; otherwise every separator is
/// treated as a thousands separator.
#[must_use]
pub(crate) fn parse_review_count(text: &str) -> Option<u64> {
    let (run, negative) = first_numeric_run(text)?;
    if negative {
        return None;
    }

    let after_run = text
        .split_once(run)
        .map(|(_, rest)| rest.trim_start())
        .unwrap_or_default();
    let multiplier: u64 = match after_run.chars().next() {
        Some('k' | 'K') if !starts_word(after_run, 1) => 1_000,
        Some('m' | 'M') if !starts_word(after_run, 1) => 1_000_000,
        _ => 1,
    };

    if multiplier == 1 {
        let digits: String = run.chars().filter(char::is_ascii_digit).collect();
        return digits.parse::<u64>().ok();
    }

    let scaled = Decimal::from_str(&run.replace(',', ".")).ok()? * Decimal::from(multiplier);
    scaled.round().to_u64()
}

/// Trims and collapses runs of whitespace to single spaces.
#[must_use]
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Finds the first run of digits, `,` and `.` that starts with a digit.
///
/// Trailing separators are dropped (`"50,990."` yields `"50,990"`). The
/// boolean reports whether the run is immediately preceded by a minus sign.
fn first_numeric_run(text: &str) -> Option<(&str, bool)> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let len = text[start..]
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(text.len() - start);
    let run = text[start..start + len].trim_end_matches([',', '.']);
    let negative = text[..start].trim_end().ends_with('-');
    Some((run, negative))
}

/// True when the character at byte `idx` of `s` is alphabetic, i.e. the
/// suffix letter is the start of a longer word ("1,234 ratings").
fn starts_word(s: &str, idx: usize) -> bool {
    s.get(idx..)
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_alphabetic)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;

//! Decimal coercion and rounding rules.
//!
//! # Scales
//!
//! - Amounts are currency and always round to [`AMOUNT_DP`] (cents).
//! - A row's percent is derived to [`ROW_PERCENT_DP`] places.
//! - The aggregate sum and the remaining ratio are carried at
//!   [`AGGREGATE_DP`] places before display rounding.
//!
//! All rounding is half-up (midpoint away from zero), so `0.125` → `0.13`.
//!
//! # Coercion
//!
//! User input arrives as raw text from an input surface. Coercion never
//! fails: blank or non-numeric text becomes zero and negative values take
//! their absolute value. Callers can tell a blank input from a typed zero via
//! [`Coerced::cleared`].

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency granularity for amounts.
pub const AMOUNT_DP: u32 = 2;

/// Precision of a row's derived percent.
pub const ROW_PERCENT_DP: u32 = 4;

/// Internal precision of the aggregate sum and remaining ratio.
pub const AGGREGATE_DP: u32 = 6;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Result of coercing raw user input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Coerced {
    /// Non-negative value.
    pub value: Decimal,
    /// `true` when the input was absent or blank.
    pub cleared: bool,
}

/// Coerce raw text to a non-negative decimal.
///
/// Accepted forms: plain decimals (`"400"`, `"12.50"`, `"-3"`) and scientific
/// notation (`"1e3"`). Anything else yields zero.
pub fn coerce_non_negative(raw: Option<&str>) -> Coerced {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return Coerced {
            value: Decimal::ZERO,
            cleared: true,
        };
    }

    let parsed = trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO);

    Coerced {
        value: parsed.abs(),
        cleared: false,
    }
}

/// Half-up rounding to `dp` decimal places.
#[inline]
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Half-up rounding that also pads the scale to exactly `dp`, so `40`
/// carries as `40.0000` at four places.
pub fn round_to_scale(value: Decimal, dp: u32) -> Decimal {
    let mut v = round_half_up(value, dp);
    v.rescale(dp);
    v
}

/// `amount * 100 / total`, rounded and scaled to [`ROW_PERCENT_DP`].
///
/// Returns zero when `total` is zero or the arithmetic overflows; a derived
/// percent is never undefined.
pub fn percent_of(amount: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return round_to_scale(Decimal::ZERO, ROW_PERCENT_DP);
    }
    let p = amount
        .checked_mul(HUNDRED)
        .and_then(|scaled| scaled.checked_div(total))
        .unwrap_or(Decimal::ZERO);
    round_to_scale(p, ROW_PERCENT_DP)
}

/// `percent / 100 * total`, rounded and scaled to [`AMOUNT_DP`].
pub fn amount_of(percent: Decimal, total: Decimal) -> Decimal {
    let a = percent
        .checked_div(HUNDRED)
        .and_then(|fraction| fraction.checked_mul(total))
        .unwrap_or(Decimal::ZERO);
    round_to_scale(a, AMOUNT_DP)
}

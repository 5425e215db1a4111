//! Currency amounts.
//!
//! Amounts travel through the API as [`Decimal`] and are stored as integer
//! cents. Aggregation sums cents, so no rounding happens before formatting.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Number of fractional digits kept for every stored amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Converts a non-negative amount with at most two decimal places into cents.
///
/// # Errors
/// - [`Error::InvalidAmount`] if the amount is negative or does not fit in `i64` cents
/// - [`Error::Validation`] if the amount has sub-cent precision
pub fn to_cents(amount: Decimal) -> Result<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidAmount { amount });
    }

    if amount.normalize().scale() > CURRENCY_SCALE {
        return Err(Error::validation(format!(
            "Amount {amount} has more than {CURRENCY_SCALE} decimal places"
        )));
    }

    (amount * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or(Error::InvalidAmount { amount })
}

/// Converts stored cents back into a two-decimal amount.
#[must_use]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, CURRENCY_SCALE)
}

/// Converts a summed cent total into an amount.
///
/// Totals are summed as `i128` so adding `i64` amounts cannot overflow. Values
/// beyond the range of [`Decimal`] saturate at its bounds.
#[must_use]
pub fn from_cents_total(cents: i128) -> Decimal {
    Decimal::try_from_i128_with_scale(cents, CURRENCY_SCALE).unwrap_or(if cents < 0 {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// Formats an amount for display, e.g. `"35.00 EUR"`.
#[must_use]
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {currency}", amount.round_dp(CURRENCY_SCALE))
}

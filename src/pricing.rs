//! Pricing
//!
//! All amounts are whole minor units (US cents). Conversion to [`Money`] only happens at the
//! edges, for display.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

/// Flat fee charged for each shop order that is delivered.
pub const DELIVERY_FEE: u64 = 3_99;

/// Sales tax rate applied to every order subtotal.
pub const TAX_RATE: f64 = 0.08;

/// Currency used for every price in the marketplace.
pub const CURRENCY: &Currency = iso::USD;

/// Errors that can occur while pricing a cart or order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// A percentage calculation could not be represented in minor units.
    #[error("percentage conversion overflowed")]
    PercentConversion,

    /// An amount is too large to be represented as money.
    #[error("amount {0} is out of range")]
    OutOfRange(u64),

    /// Adding or multiplying amounts overflowed.
    #[error("amount is too large")]
    Overflow,
}

/// The configured sales tax rate.
pub fn tax_rate() -> Percentage {
    Percentage::from(TAX_RATE)
}

/// Price of `quantity` units at `price` each.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the product does not fit.
pub fn line_total(price: u64, quantity: u32) -> Result<u64, PricingError> {
    price
        .checked_mul(u64::from(quantity))
        .ok_or(PricingError::Overflow)
}

/// Add up minor unit amounts.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the sum does not fit.
pub fn checked_sum(amounts: impl IntoIterator<Item = u64>) -> Result<u64, PricingError> {
    amounts.into_iter().try_fold(0_u64, |total, amount| {
        total.checked_add(amount).ok_or(PricingError::Overflow)
    })
}

/// Calculate a percentage of a minor unit amount, rounding half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] when the result cannot be represented.
pub fn percent_of_minor(percent: &Percentage, minor: u64) -> Result<u64, PricingError> {
    let minor = Decimal::from_u64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(PricingError::PercentConversion)
}

/// Tax owed on a subtotal at [`TAX_RATE`].
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] when the result cannot be represented.
pub fn tax_on(subtotal: u64) -> Result<u64, PricingError> {
    percent_of_minor(&tax_rate(), subtotal)
}

/// Convert a minor unit amount into [`Money`] in the marketplace currency.
///
/// # Errors
///
/// Returns [`PricingError::OutOfRange`] when the amount does not fit in an `i64`.
pub fn to_money(minor: u64) -> Result<Money<'static, Currency>, PricingError> {
    let signed = i64::try_from(minor).map_err(|_err| PricingError::OutOfRange(minor))?;

    Ok(Money::from_minor(signed, CURRENCY))
}

/// Format a minor unit amount for display, e.g. `$14.79`.
pub fn format_minor(minor: u64) -> String {
    to_money(minor).map_or_else(|_err| format!("{minor}¢"), |money| money.to_string())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn tax_is_eight_percent() -> TestResult {
        assert_eq!(tax_on(10_00)?, 80);
        assert_eq!(tax_on(35_00)?, 2_80);

        Ok(())
    }

    #[test]
    fn tax_rounds_half_away_from_zero() -> TestResult {
        // 8% of 1.25 is 0.10; 8% of 0.19 is 0.0152, which rounds to 0.02
        assert_eq!(tax_on(1_25)?, 10);
        assert_eq!(tax_on(19)?, 2);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);
        let result = percent_of_minor(&percent, u64::MAX);

        assert_eq!(result, Err(PricingError::PercentConversion));
    }

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        assert_eq!(line_total(2_50, 4), Ok(10_00));
        assert_eq!(line_total(0, u32::MAX), Ok(0));
    }

    #[test]
    fn overflowing_amounts_are_reported() {
        assert_eq!(line_total(u64::MAX, 2), Err(PricingError::Overflow));
        assert_eq!(
            checked_sum([u64::MAX / 2 + 1, u64::MAX / 2 + 1]),
            Err(PricingError::Overflow)
        );
        assert_eq!(checked_sum([14_00, 79, 0]), Ok(14_79));
    }

    #[test]
    fn formats_as_dollars() {
        assert_eq!(format_minor(14_79), "$14.79");
    }

    #[test]
    fn to_money_rejects_out_of_range_amounts() {
        assert_eq!(
            to_money(u64::MAX),
            Err(PricingError::OutOfRange(u64::MAX))
        );
    }
}

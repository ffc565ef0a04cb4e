//! Cent rounding for monetary amounts.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds an amount to cents, half away from zero, with a fixed scale of 2.
///
/// # Examples
///
/// ```
/// use travel_allowance_engine::calculation::round_to_cents;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_to_cents(Decimal::from_str("2.345").unwrap()).to_string(), "2.35");
/// assert_eq!(round_to_cents(Decimal::from(30)).to_string(), "30.00");
/// ```
pub fn round_to_cents(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

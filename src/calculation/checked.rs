//! Overflow-checked amount arithmetic.
//!
//! Trip inputs are only checked for sign, so a very large distance or
//! expense can exceed the decimal range. These helpers turn that into
//! [`EngineError::AmountOutOfRange`] instead of a panic.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};

fn out_of_range(field: &str) -> EngineError {
    EngineError::AmountOutOfRange {
        field: field.to_string(),
    }
}

/// Multiplies two amounts, failing with the name of the computed field.
pub(crate) fn checked_product(field: &str, a: Decimal, b: Decimal) -> EngineResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| out_of_range(field))
}

/// Sums amounts, failing with the name of the computed field.
pub(crate) fn checked_sum<I>(field: &str, amounts: I) -> EngineResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount).ok_or_else(|| out_of_range(field))
    })
}

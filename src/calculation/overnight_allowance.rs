//! Overnight allowance calculation.
//!
//! Lodging is reimbursed either at the jurisdiction's flat nightly rate or
//! at the receipt amount, never both.

use rust_decimal::Decimal;

use crate::config::{JurisdictionRates, OvernightRules};
use crate::error::EngineResult;
use crate::models::{AuditStep, MealsProvided, OvernightMode};

use super::checked::checked_product;
use super::rounding::round_to_cents;

/// The rule reference for the overnight allowance.
pub const OVERNIGHT_RULE_REF: &str = "§ 26 Z 4 lit. c EStG 1988";

/// The result of calculating the overnight allowance, including the audit step.
#[derive(Debug, Clone)]
pub struct OvernightAllowanceResult {
    /// The allowance, rounded to cents.
    pub amount: Decimal,
    /// Breakfast offset removed from a receipt amount.
    pub breakfast_offset: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the overnight allowance for a trip.
///
/// In flat-rate mode the allowance is `overnight_rate × nights`. In receipt
/// mode it is the receipt amount, reduced by the breakfast offset for each
/// night (at least one) when the receipt bundles breakfast and breakfast was
/// also marked as provided. The receipt reduction is floored at zero.
///
/// # Errors
///
/// Returns [`EngineError::AmountOutOfRange`](crate::error::EngineError::AmountOutOfRange)
/// when the nightly amount times the number of nights cannot be represented.
///
/// # Examples
///
/// ```
/// use travel_allowance_engine::calculation::calculate_overnight_allowance;
/// use travel_allowance_engine::config::{
///     JurisdictionRates, MealDeductions, OvernightRules, TieringPolicy,
/// };
/// use travel_allowance_engine::models::{MealsProvided, OvernightMode};
/// use rust_decimal::Decimal;
///
/// let rates = JurisdictionRates {
///     name: "Österreich".to_string(),
///     aliases: vec![],
///     full_day_rate: Decimal::from(30),
///     partial_day_rate: Decimal::from(30),
///     hourly_rate: None,
///     overnight_rate: Decimal::from(17),
///     tiering: TieringPolicy::MultiDay { minimum_hours: Decimal::from(8) },
///     deductions: MealDeductions {
///         breakfast: Decimal::ZERO,
///         lunch: Decimal::ZERO,
///         dinner: Decimal::ZERO,
///         breakfast_exempt: false,
///         combined: None,
///     },
/// };
/// let rules = OvernightRules { breakfast_offset: Decimal::new(450, 2) };
///
/// let result = calculate_overnight_allowance(
///     &OvernightMode::FlatRate,
///     2,
///     &rates,
///     &rules,
///     &MealsProvided::default(),
///     5,
/// )
/// .unwrap();
/// assert_eq!(result.amount, Decimal::from(34));
/// ```
pub fn calculate_overnight_allowance(
    mode: &OvernightMode,
    nights: u32,
    rates: &JurisdictionRates,
    rules: &OvernightRules,
    meals: &MealsProvided,
    step_number: u32,
) -> EngineResult<OvernightAllowanceResult> {
    let (amount, breakfast_offset, input, reasoning) = match mode {
        OvernightMode::FlatRate => {
            let amount = round_to_cents(checked_product(
                "overnight_allowance",
                rates.overnight_rate,
                Decimal::from(nights),
            )?);
            (
                amount,
                Decimal::ZERO,
                serde_json::json!({
                    "mode": "flat_rate",
                    "nights": nights,
                    "overnight_rate": rates.overnight_rate.normalize().to_string()
                }),
                format!(
                    "{} night(s) × €{} = €{}",
                    nights,
                    rates.overnight_rate.normalize(),
                    amount
                ),
            )
        }
        OvernightMode::Receipt {
            amount: receipt,
            includes_breakfast,
        } => {
            let offset_applies = *includes_breakfast && meals.breakfast;
            let breakfast_offset = if offset_applies {
                checked_product(
                    "overnight_breakfast_offset",
                    rules.breakfast_offset,
                    Decimal::from(nights.max(1)),
                )?
            } else {
                Decimal::ZERO
            };
            let amount = round_to_cents((*receipt - breakfast_offset).max(Decimal::ZERO));
            let reasoning = if offset_applies {
                format!(
                    "Receipt €{} includes breakfast already marked as provided: €{} - {} × €{} = €{}",
                    receipt.normalize(),
                    receipt.normalize(),
                    nights.max(1),
                    rules.breakfast_offset.normalize(),
                    amount
                )
            } else {
                format!("Receipt amount €{} reimbursed", amount)
            };
            (
                amount,
                breakfast_offset,
                serde_json::json!({
                    "mode": "receipt",
                    "nights": nights,
                    "receipt_amount": receipt.normalize().to_string(),
                    "includes_breakfast": includes_breakfast,
                    "breakfast_provided": meals.breakfast
                }),
                reasoning,
            )
        }
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "overnight_allowance".to_string(),
        rule_name: "Overnight Allowance".to_string(),
        rule_ref: OVERNIGHT_RULE_REF.to_string(),
        input,
        output: serde_json::json!({
            "breakfast_offset": breakfast_offset.normalize().to_string(),
            "amount": amount.to_string()
        }),
        reasoning,
    };

    Ok(OvernightAllowanceResult {
        amount,
        breakfast_offset,
        audit_step,
    })
}

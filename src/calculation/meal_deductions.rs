//! Provided-meal deductions.
//!
//! Each meal provided free of charge reduces the meal allowance by a
//! fraction of the jurisdiction's full-day rate. A jurisdiction may instead
//! define a combined rule that retains a fixed share of the allowance once
//! enough meals are provided.

use rust_decimal::Decimal;

use crate::config::{JurisdictionRates, MealDeductions};
use crate::models::{AuditStep, Meal, MealsProvided};

use super::rounding::round_to_cents;

/// The rule reference for meal deductions.
pub const MEAL_DEDUCTION_RULE_REF: &str = "§ 26 Z 4 lit. b EStG 1988; § 13 RGV";

/// The result of applying meal deductions, including the audit step.
#[derive(Debug, Clone)]
pub struct MealDeductionResult {
    /// Net allowance, rounded to cents and never negative.
    pub net_amount: Decimal,
    /// Amount actually removed from the gross allowance.
    pub deducted_amount: Decimal,
    /// Meals that counted toward the deduction.
    pub deducted_meals: Vec<Meal>,
    /// True if the combined rule replaced per-meal deductions.
    pub combined_applied: bool,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

fn fraction_for(deductions: &MealDeductions, meal: Meal) -> Decimal {
    match meal {
        Meal::Breakfast => deductions.breakfast,
        Meal::Lunch => deductions.lunch,
        Meal::Dinner => deductions.dinner,
    }
}

/// Applies provided-meal deductions to a gross meal allowance.
///
/// Per-meal deductions are fractions of `full_day_rate`, not of the reduced
/// allowance, and are summed before subtraction. When the jurisdiction has a
/// combined rule and at least `minimum_meals` deductible meals were provided,
/// the allowance is reduced to `retained_fraction` of the gross instead.
/// Breakfast is ignored when the jurisdiction exempts it. The result is
/// floored at zero.
///
/// # Examples
///
/// ```no_run
/// use travel_allowance_engine::calculation::apply_meal_deductions;
/// use travel_allowance_engine::config::ConfigLoader;
/// use travel_allowance_engine::models::MealsProvided;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::load("./config/at-2025").unwrap();
/// let table = config.rate_table_for(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()).unwrap();
///
/// let meals = MealsProvided { breakfast: true, lunch: true, dinner: false };
/// let result = apply_meal_deductions(table.domestic(), Decimal::from(30), &meals, 4);
/// assert_eq!(result.net_amount, Decimal::from(18));
/// ```
pub fn apply_meal_deductions(
    rates: &JurisdictionRates,
    gross_amount: Decimal,
    meals: &MealsProvided,
    step_number: u32,
) -> MealDeductionResult {
    let deductions = &rates.deductions;
    let deducted_meals: Vec<Meal> = meals
        .iter()
        .filter(|meal| !(*meal == Meal::Breakfast && deductions.breakfast_exempt))
        .collect();

    let combined = deductions
        .combined
        .as_ref()
        .filter(|rule| deducted_meals.len() >= usize::from(rule.minimum_meals));

    let (unfloored, reasoning) = if deducted_meals.is_empty() {
        (gross_amount, "No deductible meals provided".to_string())
    } else if let Some(rule) = combined {
        let retained = gross_amount * rule.retained_fraction;
        (
            retained,
            format!(
                "{} meals provided (combined rule from {}): €{} × {} retained",
                deducted_meals.len(),
                rule.minimum_meals,
                gross_amount.normalize(),
                rule.retained_fraction.round_dp(4).normalize()
            ),
        )
    } else {
        let total_fraction: Decimal = deducted_meals
            .iter()
            .map(|meal| fraction_for(deductions, *meal))
            .sum();
        let deduction = total_fraction * rates.full_day_rate;
        let names: Vec<&str> = deducted_meals.iter().map(|m| m.as_str()).collect();
        (
            gross_amount - deduction,
            format!(
                "{} provided: €{} - {} × €{} = €{}",
                names.join(" + "),
                gross_amount.normalize(),
                total_fraction.normalize(),
                rates.full_day_rate.normalize(),
                (gross_amount - deduction).normalize()
            ),
        )
    };

    let floored = unfloored.max(Decimal::ZERO);
    let net_amount = round_to_cents(floored);
    let deducted_amount = round_to_cents(gross_amount) - net_amount;
    let reasoning = if unfloored < Decimal::ZERO {
        format!("{} (floored at €0)", reasoning)
    } else {
        reasoning
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "meal_deduction".to_string(),
        rule_name: "Provided Meal Deduction".to_string(),
        rule_ref: MEAL_DEDUCTION_RULE_REF.to_string(),
        input: serde_json::json!({
            "gross_amount": gross_amount.normalize().to_string(),
            "meals_provided": meals.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            "breakfast_exempt": deductions.breakfast_exempt
        }),
        output: serde_json::json!({
            "deducted_meals": deducted_meals.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            "combined_applied": combined.is_some(),
            "deducted_amount": deducted_amount.to_string(),
            "net_amount": net_amount.to_string()
        }),
        reasoning,
    };

    MealDeductionResult {
        net_amount,
        deducted_amount,
        combined_applied: combined.is_some(),
        deducted_meals,
        audit_step,
    }
}

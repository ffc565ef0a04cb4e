//! Trip aggregation.
//!
//! Runs every calculator for one trip in order (duration, jurisdiction,
//! tiering, deductions, overnight, distance, expenses) and sums the
//! cent-rounded components into a [`TripResult`].

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::RateTable;
use crate::error::EngineResult;
use crate::models::{AuditStep, AuditTrace, Trip, TripResult};

use super::checked::checked_sum;
use super::distance_allowance::calculate_distance_allowance;
use super::duration::calculate_duration;
use super::jurisdiction::resolve_jurisdiction;
use super::meal_allowance::calculate_meal_allowance;
use super::meal_deductions::apply_meal_deductions;
use super::overnight_allowance::calculate_overnight_allowance;
use super::rounding::round_to_cents;

/// The rule reference for reimbursable out-of-pocket expenses.
pub const EXPENSE_RULE_REF: &str = "§ 26 Z 4 EStG 1988";

/// Calculates the full reimbursement for one trip.
///
/// The trip is validated first, so a trip deserialized without going
/// through [`TripBuilder`](crate::models::TripBuilder) is held to the same
/// rules. Each component is rounded to cents before it is added to the
/// total.
///
/// # Errors
///
/// - [`EngineError::NegativeInput`](crate::error::EngineError::NegativeInput)
///   if any amount or distance is negative
/// - [`EngineError::InvalidRange`](crate::error::EngineError::InvalidRange)
///   if the return precedes departure beyond the one-day rollover
/// - [`EngineError::AmountOutOfRange`](crate::error::EngineError::AmountOutOfRange)
///   if an amount or the total exceeds the decimal range
///
/// # Examples
///
/// ```no_run
/// use travel_allowance_engine::calculation::calculate_trip;
/// use travel_allowance_engine::config::ConfigLoader;
/// use travel_allowance_engine::models::TripBuilder;
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::load("./config/at-2025").unwrap();
/// let trip = TripBuilder::new("trip_001")
///     .departure(NaiveDateTime::parse_from_str("2025-03-10 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap())
///     .return_at(NaiveDateTime::parse_from_str("2025-03-10 17:00:00", "%Y-%m-%d %H:%M:%S").unwrap())
///     .build()
///     .unwrap();
/// let table = config.rate_table_for(trip.departure.date()).unwrap();
///
/// let result = calculate_trip(&trip, table).unwrap();
/// assert_eq!(result.meal_allowance, Decimal::from(30));
/// assert_eq!(result.total, Decimal::from(30));
/// ```
pub fn calculate_trip(trip: &Trip, table: &RateTable) -> EngineResult<TripResult> {
    trip.validate()?;

    let mut steps: Vec<AuditStep> = Vec::new();
    let mut warnings = Vec::new();
    let mut step_number: u32 = 1;

    let duration_result = calculate_duration(trip.departure, trip.return_at, step_number)?;
    let duration = duration_result.duration;
    steps.push(duration_result.audit_step);
    step_number += 1;

    let jurisdiction = resolve_jurisdiction(&trip.destination, table, step_number);
    steps.push(jurisdiction.audit_step);
    warnings.extend(jurisdiction.warning);
    step_number += 1;

    let tiering = calculate_meal_allowance(jurisdiction.rates, &duration, step_number);
    steps.push(tiering.audit_step);
    step_number += 1;

    let deduction = apply_meal_deductions(
        jurisdiction.rates,
        tiering.gross_amount,
        &trip.meals_provided,
        step_number,
    );
    steps.push(deduction.audit_step);
    step_number += 1;

    let overnight = calculate_overnight_allowance(
        &trip.overnight_mode,
        trip.nights,
        jurisdiction.rates,
        table.overnight(),
        &trip.meals_provided,
        step_number,
    )?;
    steps.push(overnight.audit_step);
    step_number += 1;

    let distance = calculate_distance_allowance(
        trip.distance_km,
        trip.passenger_count,
        table.vehicle(),
        step_number,
    )?;
    steps.push(distance.audit_step);
    step_number += 1;

    let expense_sum = checked_sum("expense_subtotal", trip.expenses.values().map(|e| e.amount))?;
    let expense_subtotal = round_to_cents(expense_sum);
    let expense_inputs: BTreeMap<&str, String> = trip
        .expenses
        .iter()
        .map(|(category, expense)| (category.as_str(), expense.amount.normalize().to_string()))
        .collect();
    steps.push(AuditStep {
        step_number,
        rule_id: "expense_subtotal".to_string(),
        rule_name: "Out-of-Pocket Expenses".to_string(),
        rule_ref: EXPENSE_RULE_REF.to_string(),
        input: serde_json::json!({ "expenses": expense_inputs }),
        output: serde_json::json!({ "expense_subtotal": expense_subtotal.to_string() }),
        reasoning: if trip.expenses.is_empty() {
            "No out-of-pocket expenses".to_string()
        } else {
            format!(
                "{} expense categor{} = €{}",
                trip.expenses.len(),
                if trip.expenses.len() == 1 { "y" } else { "ies" },
                expense_subtotal
            )
        },
    });
    step_number += 1;

    let meal_allowance = round_to_cents(deduction.net_amount);
    let overnight_allowance = round_to_cents(overnight.amount);
    let distance_allowance = round_to_cents(distance.amount);
    let total = checked_sum(
        "total",
        [meal_allowance, overnight_allowance, distance_allowance, expense_subtotal],
    )?;

    steps.push(AuditStep {
        step_number,
        rule_id: "trip_total".to_string(),
        rule_name: "Trip Total".to_string(),
        rule_ref: EXPENSE_RULE_REF.to_string(),
        input: serde_json::json!({
            "meal_allowance": meal_allowance.to_string(),
            "overnight_allowance": overnight_allowance.to_string(),
            "distance_allowance": distance_allowance.to_string(),
            "expense_subtotal": expense_subtotal.to_string()
        }),
        output: serde_json::json!({ "total": total.to_string() }),
        reasoning: format!(
            "€{} + €{} + €{} + €{} = €{}",
            meal_allowance, overnight_allowance, distance_allowance, expense_subtotal, total
        ),
    });

    debug!(
        trip_id = %trip.id,
        jurisdiction = %jurisdiction.key,
        fallback = jurisdiction.fallback_applied,
        hours = %duration.hours.normalize(),
        total = %total,
        "Trip calculated"
    );

    Ok(TripResult {
        trip_id: trip.id.clone(),
        jurisdiction: jurisdiction.key.to_string(),
        jurisdiction_fallback: jurisdiction.fallback_applied,
        duration_hours: duration.hours,
        calendar_days: duration.calendar_days,
        meal_allowance,
        overnight_allowance,
        distance_allowance,
        expense_subtotal,
        total,
        audit_trace: AuditTrace { steps, warnings },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateConfig;
    use crate::error::EngineError;
    use crate::models::{Destination, ExpenseCategory, Meal, OvernightMode, TripBuilder};
    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn table() -> RateTable {
        let config: RateConfig =
            serde_yaml::from_str(include_str!("../../config/at-2025/rates/2025-01-01.yaml"))
                .unwrap();
        RateTable::from_config(config).unwrap()
    }

    fn domestic_day() -> TripBuilder {
        TripBuilder::new("trip_001")
            .departure(make_datetime("2025-03-10", "08:00:00"))
            .return_at(make_datetime("2025-03-10", "17:00:00"))
    }

    #[test]
    fn test_domestic_nine_hour_day() {
        let result = calculate_trip(&domestic_day().build().unwrap(), &table()).unwrap();

        assert_eq!(result.meal_allowance, dec("30.00"));
        assert_eq!(result.overnight_allowance, Decimal::ZERO);
        assert_eq!(result.total, dec("30.00"));
        assert_eq!(result.jurisdiction, "domestic");
        assert!(!result.jurisdiction_fallback);
        assert_eq!(result.calendar_days, 1);
    }

    #[test]
    fn test_domestic_with_breakfast_and_lunch() {
        let trip = domestic_day()
            .meal(Meal::Breakfast)
            .meal(Meal::Lunch)
            .build()
            .unwrap();
        let result = calculate_trip(&trip, &table()).unwrap();

        assert_eq!(result.meal_allowance, dec("18.00"));
    }

    #[test]
    fn test_foreign_three_calendar_days() {
        let trip = TripBuilder::new("trip_002")
            .destination(Destination::Foreign {
                country: "Deutschland".to_string(),
            })
            .departure(make_datetime("2025-03-10", "06:00:00"))
            .return_at(make_datetime("2025-03-12", "20:00:00"))
            .nights(2)
            .build()
            .unwrap();
        let result = calculate_trip(&trip, &table()).unwrap();

        // 1 × 58 + 2 × 34; foreign flat overnight rate is 0
        assert_eq!(result.meal_allowance, dec("126.00"));
        assert_eq!(result.overnight_allowance, Decimal::ZERO);
        assert_eq!(result.calendar_days, 3);
    }

    #[test]
    fn test_unknown_country_sets_fallback_flag() {
        let trip = domestic_day()
            .destination(Destination::Foreign {
                country: "Atlantis".to_string(),
            })
            .build()
            .unwrap();
        let result = calculate_trip(&trip, &table()).unwrap();

        assert_eq!(result.jurisdiction, "other");
        assert!(result.jurisdiction_fallback);
        // One partial day at the "Andere" rate
        assert_eq!(result.meal_allowance, dec("33.00"));
        assert_eq!(result.audit_trace.warnings.len(), 1);
    }

    #[test]
    fn test_total_sums_all_components() {
        let trip = domestic_day()
            .distance_km(dec("123.45"))
            .passengers(1)
            .nights(1)
            .expense(ExpenseCategory::Parking, dec("7.50"), None)
            .expense(ExpenseCategory::Tolls, dec("9.90"), Some("vignette.pdf".to_string()))
            .build()
            .unwrap();
        let result = calculate_trip(&trip, &table()).unwrap();

        // 123.45 × 0.65 = 80.2425
        assert_eq!(result.distance_allowance, dec("80.24"));
        assert_eq!(result.overnight_allowance, dec("17.00"));
        assert_eq!(result.expense_subtotal, dec("17.40"));
        assert_eq!(result.total, dec("144.64"));
        assert_eq!(result.component_sum(), result.total);
    }

    #[test]
    fn test_receipt_overnight_with_breakfast_offset() {
        let trip = domestic_day()
            .meal(Meal::Breakfast)
            .nights(1)
            .overnight(OvernightMode::Receipt {
                amount: dec("95.00"),
                includes_breakfast: true,
            })
            .build()
            .unwrap();
        let result = calculate_trip(&trip, &table()).unwrap();

        assert_eq!(result.overnight_allowance, dec("90.50"));
        assert_eq!(result.meal_allowance, dec("25.50"));
    }

    #[test]
    fn test_overnight_wrap_is_not_negative() {
        let trip = TripBuilder::new("trip_003")
            .departure(make_datetime("2025-03-10", "23:00:00"))
            .return_at(make_datetime("2025-03-10", "02:00:00"))
            .build()
            .unwrap();
        let result = calculate_trip(&trip, &table()).unwrap();

        assert_eq!(result.duration_hours, dec("3"));
        assert_eq!(result.meal_allowance, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        let trip = TripBuilder::new("trip_004")
            .departure(make_datetime("2025-03-10", "08:00:00"))
            .return_at(make_datetime("2025-03-08", "17:00:00"))
            .build()
            .unwrap();

        assert!(matches!(
            calculate_trip(&trip, &table()),
            Err(EngineError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_negative_input_on_unbuilt_trip_is_rejected() {
        let mut trip = domestic_day().build().unwrap();
        trip.distance_km = dec("-10");

        assert!(matches!(
            calculate_trip(&trip, &table()),
            Err(EngineError::NegativeInput { .. })
        ));
    }

    #[test]
    fn test_distance_beyond_decimal_range_is_rejected() {
        let trip = domestic_day()
            .distance_km(dec("30000000000000000000000000000"))
            .passengers(4)
            .build()
            .unwrap();

        match calculate_trip(&trip, &table()) {
            Err(EngineError::AmountOutOfRange { field }) => {
                assert_eq!(field, "distance_allowance")
            }
            other => panic!("Expected AmountOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_expenses_beyond_decimal_range_are_rejected() {
        let huge = dec("50000000000000000000000000000");
        let trip = domestic_day()
            .expense(ExpenseCategory::Parking, huge, None)
            .expense(ExpenseCategory::Tolls, huge, None)
            .build()
            .unwrap();

        match calculate_trip(&trip, &table()) {
            Err(EngineError::AmountOutOfRange { field }) => assert_eq!(field, "expense_subtotal"),
            other => panic!("Expected AmountOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_components_that_fit_but_total_does_not_are_rejected() {
        // 5 × 10^27 distance allowance plus 7.9 × 10^28 expenses
        let trip = domestic_day()
            .distance_km(dec("10000000000000000000000000000"))
            .expense(ExpenseCategory::Parking, dec("79000000000000000000000000000"), None)
            .build()
            .unwrap();

        assert!(matches!(
            calculate_trip(&trip, &table()),
            Err(EngineError::AmountOutOfRange { field }) if field == "total"
        ));
    }

    #[test]
    fn test_audit_trace_is_sequential() {
        let result = calculate_trip(&domestic_day().build().unwrap(), &table()).unwrap();
        let steps = &result.audit_trace.steps;

        assert_eq!(steps.len(), 8);
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.step_number, i as u32 + 1);
        }
        assert_eq!(steps[0].rule_id, "trip_duration");
        assert_eq!(steps[7].rule_id, "trip_total");
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let trip = domestic_day().meal(Meal::Dinner).distance_km(dec("42")).build().unwrap();
        let table = table();

        assert_eq!(
            calculate_trip(&trip, &table).unwrap(),
            calculate_trip(&trip, &table).unwrap()
        );
    }
}

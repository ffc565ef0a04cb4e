//! Trip result models for the travel allowance engine.
//!
//! This module contains the [`TripResult`] type and the explanation
//! structures that show how each allowance was derived. The explanation
//! travels with the result it describes; nothing here is persisted, and the
//! spreadsheet export leaves it out.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single step of the calculation explanation.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// Reference to the statutory provision for this rule.
    pub rule_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate conditions that don't prevent calculation but should
/// be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The calculation explanation attached to one trip result.
///
/// Rebuilt on every calculation, so it always matches the amounts next to
/// it. It is not a history of edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

/// The computed reimbursement for one trip.
///
/// Derived entirely from a [`Trip`](super::Trip) and a rate table; the same
/// inputs always yield the same result. Every monetary field is rounded to
/// cents and `total` is the sum of the four component fields.
///
/// # Example
///
/// ```
/// use travel_allowance_engine::models::{AuditTrace, TripResult};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let result = TripResult {
///     trip_id: "trip_001".to_string(),
///     jurisdiction: "domestic".to_string(),
///     jurisdiction_fallback: false,
///     duration_hours: Decimal::from(9),
///     calendar_days: 1,
///     meal_allowance: Decimal::from_str("30.00").unwrap(),
///     overnight_allowance: Decimal::ZERO,
///     distance_allowance: Decimal::from_str("60.00").unwrap(),
///     expense_subtotal: Decimal::ZERO,
///     total: Decimal::from_str("90.00").unwrap(),
///     audit_trace: AuditTrace::default(),
/// };
/// assert_eq!(result.component_sum(), result.total);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripResult {
    /// The ID of the trip this result belongs to.
    pub trip_id: String,
    /// Key of the jurisdiction whose rates were applied.
    pub jurisdiction: String,
    /// True when an unrecognized destination fell back to the "other" rates.
    pub jurisdiction_fallback: bool,
    /// Elapsed trip time in hours, after overnight rollover.
    pub duration_hours: Decimal,
    /// Calendar days touched by the trip.
    pub calendar_days: u32,
    /// Net meal allowance.
    pub meal_allowance: Decimal,
    /// Overnight allowance.
    pub overnight_allowance: Decimal,
    /// Vehicle reimbursement.
    pub distance_allowance: Decimal,
    /// Sum of ad-hoc expenses.
    pub expense_subtotal: Decimal,
    /// Trip total.
    pub total: Decimal,
    /// Step-by-step explanation of how the amounts were derived.
    pub audit_trace: AuditTrace,
}

impl TripResult {
    /// Sums the four reimbursement components.
    pub fn component_sum(&self) -> Decimal {
        self.meal_allowance
            + self.overnight_allowance
            + self.distance_allowance
            + self.expense_subtotal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_result() -> TripResult {
        TripResult {
            trip_id: "trip_001".to_string(),
            jurisdiction: "other".to_string(),
            jurisdiction_fallback: true,
            duration_hours: dec("9"),
            calendar_days: 1,
            meal_allowance: dec("33.00"),
            overnight_allowance: dec("0.00"),
            distance_allowance: dec("12.50"),
            expense_subtotal: dec("4.00"),
            total: dec("49.50"),
            audit_trace: AuditTrace {
                steps: vec![],
                warnings: vec![AuditWarning {
                    code: "UNKNOWN_JURISDICTION_FALLBACK".to_string(),
                    message: "Narnia is not in the rate table".to_string(),
                    severity: "medium".to_string(),
                }],
            },
        }
    }

    #[test]
    fn test_component_sum_matches_total() {
        let result = sample_result();
        assert_eq!(result.component_sum(), result.total);
    }

    #[test]
    fn test_result_serializes_plain_field_names() {
        let json = serde_json::to_value(sample_result()).unwrap();

        for field in [
            "meal_allowance",
            "overnight_allowance",
            "distance_allowance",
            "expense_subtotal",
            "total",
        ] {
            assert!(json[field].is_string(), "{} should serialize as a string", field);
        }
        assert_eq!(json["jurisdiction_fallback"], true);
        assert_eq!(json["calendar_days"], 1);
        assert_eq!(
            json["audit_trace"]["warnings"][0]["code"],
            "UNKNOWN_JURISDICTION_FALLBACK"
        );
    }

    #[test]
    fn test_result_round_trips_through_json() {
        let result = sample_result();
        let json = serde_json::to_string(&result).unwrap();
        let back: TripResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}

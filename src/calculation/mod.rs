//! Calculation logic for the travel allowance engine.
//!
//! This module contains the calculators that turn a trip into a
//! reimbursement: duration measurement with overnight rollover,
//! jurisdiction resolution with fallback, meal allowance tiering,
//! provided-meal deductions, overnight and kilometer allowances, and the
//! trip and period aggregators.

mod checked;
mod distance_allowance;
mod duration;
mod jurisdiction;
mod meal_allowance;
mod meal_deductions;
mod overnight_allowance;
mod period_total;
mod rounding;
mod trip_total;

pub use distance_allowance::{
    DISTANCE_RULE_REF, DistanceAllowanceResult, calculate_distance_allowance,
};
pub use duration::{DURATION_RULE_REF, DurationResult, TripDuration, calculate_duration};
pub use jurisdiction::{
    FALLBACK_WARNING_CODE, JURISDICTION_RULE_REF, JurisdictionLookupResult, resolve_jurisdiction,
};
pub use meal_allowance::{
    DayCredit, HOURLY_ACCRUAL_DAY_HOURS, MEAL_ALLOWANCE_RULE_REF, MealAllowanceResult,
    calculate_meal_allowance, day_credit,
};
pub use meal_deductions::{MEAL_DEDUCTION_RULE_REF, MealDeductionResult, apply_meal_deductions};
pub use overnight_allowance::{
    OVERNIGHT_RULE_REF, OvernightAllowanceResult, calculate_overnight_allowance,
};
pub use period_total::{replace_trip, submit_trip, summarize_period};
pub use rounding::round_to_cents;
pub use trip_total::{EXPENSE_RULE_REF, calculate_trip};

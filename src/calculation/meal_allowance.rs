//! Meal allowance (Taggeld) tiering.
//!
//! Converts a trip duration into full days, partial days, and accrued hours
//! according to the jurisdiction's [`TieringPolicy`], and prices them into a
//! gross allowance before meal deductions.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::config::{JurisdictionRates, TieringPolicy};
use crate::models::AuditStep;

use super::duration::TripDuration;

/// The rule reference for the meal allowance.
pub const MEAL_ALLOWANCE_RULE_REF: &str = "§ 26 Z 4 lit. b EStG 1988";

/// Length of the day block used by hourly accrual.
pub const HOURLY_ACCRUAL_DAY_HOURS: Decimal = Decimal::from_parts(24, 0, 0, false, 0);

/// How many day units a trip earns under a tiering policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCredit {
    /// Days paid at the full-day rate.
    pub full_days: u32,
    /// Days paid at the partial-day rate.
    pub partial_days: u32,
    /// Started hours paid at the hourly rate.
    pub accrued_hours: u32,
}

/// The result of tiering a trip, including the audit step.
#[derive(Debug, Clone)]
pub struct MealAllowanceResult {
    /// The day units earned.
    pub credit: DayCredit,
    /// Allowance before meal deductions.
    pub gross_amount: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Determines the day units earned for a trip duration.
///
/// # Examples
///
/// ```
/// use travel_allowance_engine::calculation::day_credit;
/// use travel_allowance_engine::config::TieringPolicy;
/// use rust_decimal::Decimal;
///
/// let policy = TieringPolicy::MultiDay { minimum_hours: Decimal::from(8) };
/// let credit = day_credit(&policy, Decimal::from(62), 3);
/// assert_eq!(credit.full_days, 1);
/// assert_eq!(credit.partial_days, 2);
/// ```
pub fn day_credit(policy: &TieringPolicy, hours: Decimal, calendar_days: u32) -> DayCredit {
    match policy {
        TieringPolicy::DayBucket {
            minimum_hours,
            full_day_hours,
        } => {
            let (full_days, remainder) = split_days(hours, *full_day_hours);
            DayCredit {
                full_days,
                partial_days: u32::from(remainder >= *minimum_hours),
                accrued_hours: 0,
            }
        }
        TieringPolicy::MultiDay { minimum_hours } => {
            if hours < *minimum_hours {
                return DayCredit::default();
            }
            match calendar_days {
                0 => DayCredit::default(),
                1 => DayCredit {
                    full_days: 0,
                    partial_days: 1,
                    accrued_hours: 0,
                },
                days => DayCredit {
                    full_days: days - 2,
                    partial_days: 2,
                    accrued_hours: 0,
                },
            }
        }
        TieringPolicy::HourlyAccrual { minimum_hours } => {
            let (full_days, remainder) = split_days(hours, HOURLY_ACCRUAL_DAY_HOURS);
            let accrued_hours = if remainder > *minimum_hours {
                whole_hours(remainder.ceil())
            } else {
                0
            };
            DayCredit {
                full_days,
                partial_days: 0,
                accrued_hours,
            }
        }
    }
}

fn split_days(hours: Decimal, day_hours: Decimal) -> (u32, Decimal) {
    if day_hours <= Decimal::ZERO || hours <= Decimal::ZERO {
        return (0, hours.max(Decimal::ZERO));
    }
    let blocks = (hours / day_hours).floor();
    (whole_hours(blocks), hours - blocks * day_hours)
}

fn whole_hours(value: Decimal) -> u32 {
    value.trunc().to_u32().unwrap_or(u32::MAX)
}

/// Calculates the gross meal allowance for a trip.
///
/// Full days earn `full_day_rate`, partial days earn `partial_day_rate`, and
/// accrued hours earn `hourly_rate` each, capped at one `full_day_rate`.
/// Deductions for provided meals are applied separately by
/// [`apply_meal_deductions`](super::apply_meal_deductions).
///
/// # Examples
///
/// ```no_run
/// use travel_allowance_engine::calculation::{calculate_duration, calculate_meal_allowance};
/// use travel_allowance_engine::config::ConfigLoader;
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::load("./config/at-2025").unwrap();
/// let departure = NaiveDateTime::parse_from_str("2025-03-10 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let return_at = NaiveDateTime::parse_from_str("2025-03-10 17:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let table = config.rate_table_for(departure.date()).unwrap();
///
/// let duration = calculate_duration(departure, return_at, 1).unwrap().duration;
/// let result = calculate_meal_allowance(table.domestic(), &duration, 3);
/// assert_eq!(result.gross_amount, Decimal::from(30));
/// ```
pub fn calculate_meal_allowance(
    rates: &JurisdictionRates,
    duration: &TripDuration,
    step_number: u32,
) -> MealAllowanceResult {
    let credit = day_credit(&rates.tiering, duration.hours, duration.calendar_days);

    let full_amount = Decimal::from(credit.full_days) * rates.full_day_rate;
    let partial_amount = Decimal::from(credit.partial_days) * rates.partial_day_rate;
    let hourly_rate = rates.hourly_rate.unwrap_or(Decimal::ZERO);
    let accrued_amount =
        (Decimal::from(credit.accrued_hours) * hourly_rate).min(rates.full_day_rate);
    let gross_amount = full_amount + partial_amount + accrued_amount;

    let (policy, reasoning) = match &rates.tiering {
        TieringPolicy::DayBucket { minimum_hours, .. } if gross_amount.is_zero() => (
            "day_bucket",
            format!(
                "{}h is below the {}h minimum - no meal allowance",
                duration.hours.normalize(),
                minimum_hours.normalize()
            ),
        ),
        TieringPolicy::MultiDay { minimum_hours } if gross_amount.is_zero() => (
            "multi_day",
            format!(
                "{}h is below the {}h minimum - no meal allowance",
                duration.hours.normalize(),
                minimum_hours.normalize()
            ),
        ),
        TieringPolicy::DayBucket { .. } => (
            "day_bucket",
            format!(
                "{}h = {} full day(s) × €{} + {} partial day(s) × €{} = €{}",
                duration.hours.normalize(),
                credit.full_days,
                rates.full_day_rate.normalize(),
                credit.partial_days,
                rates.partial_day_rate.normalize(),
                gross_amount.normalize()
            ),
        ),
        TieringPolicy::MultiDay { .. } => (
            "multi_day",
            format!(
                "{} calendar day(s) = {} full day(s) × €{} + {} partial day(s) × €{} = €{}",
                duration.calendar_days,
                credit.full_days,
                rates.full_day_rate.normalize(),
                credit.partial_days,
                rates.partial_day_rate.normalize(),
                gross_amount.normalize()
            ),
        ),
        TieringPolicy::HourlyAccrual { .. } => (
            "hourly_accrual",
            format!(
                "{}h = {} full day(s) × €{} + {} started hour(s) × €{} (capped at €{}) = €{}",
                duration.hours.normalize(),
                credit.full_days,
                rates.full_day_rate.normalize(),
                credit.accrued_hours,
                hourly_rate.normalize(),
                rates.full_day_rate.normalize(),
                gross_amount.normalize()
            ),
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "meal_allowance_tiering".to_string(),
        rule_name: "Meal Allowance Tiering".to_string(),
        rule_ref: MEAL_ALLOWANCE_RULE_REF.to_string(),
        input: serde_json::json!({
            "policy": policy,
            "hours": duration.hours.normalize().to_string(),
            "calendar_days": duration.calendar_days,
            "full_day_rate": rates.full_day_rate.normalize().to_string(),
            "partial_day_rate": rates.partial_day_rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "full_days": credit.full_days,
            "partial_days": credit.partial_days,
            "accrued_hours": credit.accrued_hours,
            "gross_amount": gross_amount.normalize().to_string()
        }),
        reasoning,
    };

    MealAllowanceResult {
        credit,
        gross_amount,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MealDeductions;
    use chrono::NaiveDateTime;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day_bucket() -> TieringPolicy {
        TieringPolicy::DayBucket {
            minimum_hours: dec("8"),
            full_day_hours: dec("24"),
        }
    }

    fn rates(full: &str, partial: &str, tiering: TieringPolicy) -> JurisdictionRates {
        JurisdictionRates {
            name: "Test".to_string(),
            aliases: vec![],
            full_day_rate: dec(full),
            partial_day_rate: dec(partial),
            hourly_rate: Some(dec("2.50")),
            overnight_rate: dec("17.00"),
            tiering,
            deductions: MealDeductions {
                breakfast: dec("0.15"),
                lunch: dec("0.25"),
                dinner: dec("0.25"),
                breakfast_exempt: false,
                combined: None,
            },
        }
    }

    fn duration(hours: &str, calendar_days: u32) -> TripDuration {
        let departure =
            NaiveDateTime::parse_from_str("2025-03-10 06:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        TripDuration {
            departure,
            effective_return: departure,
            hours: dec(hours),
            calendar_days,
            rolled_over: false,
        }
    }

    #[test]
    fn test_day_bucket_below_minimum_earns_nothing() {
        let credit = day_credit(&day_bucket(), dec("7.99"), 1);
        assert_eq!(credit, DayCredit::default());
    }

    #[test]
    fn test_day_bucket_at_minimum_earns_partial_day() {
        let credit = day_credit(&day_bucket(), dec("8"), 1);
        assert_eq!(credit.full_days, 0);
        assert_eq!(credit.partial_days, 1);
    }

    #[test]
    fn test_day_bucket_full_days_plus_remainder() {
        // 58h = 2 full days + 10h remainder
        let credit = day_credit(&day_bucket(), dec("58"), 3);
        assert_eq!(credit.full_days, 2);
        assert_eq!(credit.partial_days, 1);

        // 31h = 1 full day + 7h remainder below minimum
        let credit = day_credit(&day_bucket(), dec("31"), 2);
        assert_eq!(credit.full_days, 1);
        assert_eq!(credit.partial_days, 0);
    }

    #[test]
    fn test_multi_day_apportionment() {
        let policy = TieringPolicy::MultiDay {
            minimum_hours: dec("8"),
        };

        assert_eq!(day_credit(&policy, dec("9"), 1).partial_days, 1);

        let two = day_credit(&policy, dec("20"), 2);
        assert_eq!((two.full_days, two.partial_days), (0, 2));

        let five = day_credit(&policy, dec("100"), 5);
        assert_eq!((five.full_days, five.partial_days), (3, 2));
    }

    #[test]
    fn test_multi_day_below_minimum_earns_nothing() {
        let policy = TieringPolicy::MultiDay {
            minimum_hours: dec("8"),
        };
        assert_eq!(day_credit(&policy, dec("5"), 2), DayCredit::default());
    }

    #[test]
    fn test_hourly_accrual_counts_started_hours() {
        let policy = TieringPolicy::HourlyAccrual {
            minimum_hours: dec("3"),
        };

        let credit = day_credit(&policy, dec("5.25"), 1);
        assert_eq!(credit.full_days, 0);
        assert_eq!(credit.accrued_hours, 6);

        let credit = day_credit(&policy, dec("27"), 2);
        assert_eq!(credit.full_days, 1);
        assert_eq!(credit.accrued_hours, 0);
    }

    #[test]
    fn test_domestic_nine_hours_earns_full_rate() {
        let rates = rates("30.00", "30.00", day_bucket());
        let result = calculate_meal_allowance(&rates, &duration("9", 1), 3);

        assert_eq!(result.gross_amount, dec("30.00"));
        assert_eq!(result.audit_step.rule_id, "meal_allowance_tiering");
        assert_eq!(result.audit_step.output["partial_days"], 1);
    }

    #[test]
    fn test_foreign_three_days() {
        let rates = rates(
            "58.00",
            "34.00",
            TieringPolicy::MultiDay {
                minimum_hours: dec("8"),
            },
        );
        let result = calculate_meal_allowance(&rates, &duration("62", 3), 3);

        // 1 × 58 + 2 × 34
        assert_eq!(result.gross_amount, dec("126.00"));
    }

    #[test]
    fn test_hourly_accrual_is_capped_at_full_day() {
        let rates = rates(
            "30.00",
            "30.00",
            TieringPolicy::HourlyAccrual {
                minimum_hours: dec("3"),
            },
        );

        // 5 started hours × 2.50
        let result = calculate_meal_allowance(&rates, &duration("4.5", 1), 3);
        assert_eq!(result.gross_amount, dec("12.50"));

        // 20 started hours × 2.50 = 50, capped at 30
        let result = calculate_meal_allowance(&rates, &duration("20", 1), 3);
        assert_eq!(result.gross_amount, dec("30.00"));
    }

    #[test]
    fn test_below_minimum_reasoning() {
        let rates = rates("30.00", "30.00", day_bucket());
        let result = calculate_meal_allowance(&rates, &duration("4", 1), 3);

        assert_eq!(result.gross_amount, Decimal::ZERO);
        assert!(result.audit_step.reasoning.contains("below the 8h minimum"));
    }
}

//! Trip duration calculation.
//!
//! Turns a departure/return pair into elapsed hours and touched calendar
//! days. A return clock time earlier than the departure on the same date is
//! read as the early hours of the following day.

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::AuditStep;

/// The rule reference for duration measurement.
pub const DURATION_RULE_REF: &str = "§ 26 Z 4 lit. b EStG 1988";

/// Elapsed time of a trip after overnight rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDuration {
    /// Departure timestamp.
    pub departure: NaiveDateTime,
    /// Return timestamp after rollover.
    pub effective_return: NaiveDateTime,
    /// Elapsed hours, fractional.
    pub hours: Decimal,
    /// Calendar days from departure date to return date, inclusive.
    pub calendar_days: u32,
    /// True if the return was moved to the following day.
    pub rolled_over: bool,
}

/// The result of measuring a trip, including the audit step.
#[derive(Debug, Clone)]
pub struct DurationResult {
    /// The measured duration.
    pub duration: TripDuration,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Measures the duration of a trip.
///
/// If `return_at` is earlier than `departure` and both fall on the same
/// date, the return is advanced by one day before measuring.
///
/// # Errors
///
/// Returns [`EngineError::InvalidRange`] when the return still precedes the
/// departure after the rollover.
///
/// # Examples
///
/// ```
/// use travel_allowance_engine::calculation::calculate_duration;
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let departure = NaiveDateTime::parse_from_str("2025-03-10 23:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let return_at = NaiveDateTime::parse_from_str("2025-03-10 02:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
///
/// let result = calculate_duration(departure, return_at, 1).unwrap();
/// assert_eq!(result.duration.hours, Decimal::from(3));
/// assert_eq!(result.duration.calendar_days, 2);
/// assert!(result.duration.rolled_over);
/// ```
pub fn calculate_duration(
    departure: NaiveDateTime,
    return_at: NaiveDateTime,
    step_number: u32,
) -> EngineResult<DurationResult> {
    let rolled_over = return_at < departure && return_at.date() == departure.date();
    let effective_return = if rolled_over {
        return_at + Duration::days(1)
    } else {
        return_at
    };

    if effective_return < departure {
        return Err(EngineError::InvalidRange {
            departure,
            return_at,
        });
    }

    let seconds = (effective_return - departure).num_seconds();
    let hours = Decimal::new(seconds, 0) / Decimal::new(3600, 0);
    let day_span = (effective_return.date() - departure.date()).num_days() + 1;
    let calendar_days = u32::try_from(day_span).unwrap_or(u32::MAX);

    let reasoning = if rolled_over {
        format!(
            "Return {} precedes departure on the same day; read as {} ({}h over {} calendar days)",
            return_at.format("%H:%M"),
            effective_return,
            hours.normalize(),
            calendar_days
        )
    } else {
        format!(
            "{} to {}: {}h over {} calendar day(s)",
            departure,
            effective_return,
            hours.normalize(),
            calendar_days
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "trip_duration".to_string(),
        rule_name: "Trip Duration".to_string(),
        rule_ref: DURATION_RULE_REF.to_string(),
        input: serde_json::json!({
            "departure": departure.to_string(),
            "return": return_at.to_string()
        }),
        output: serde_json::json!({
            "effective_return": effective_return.to_string(),
            "hours": hours.normalize().to_string(),
            "calendar_days": calendar_days,
            "rolled_over": rolled_over
        }),
        reasoning,
    };

    Ok(DurationResult {
        duration: TripDuration {
            departure,
            effective_return,
            hours,
            calendar_days,
            rolled_over,
        },
        audit_step,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    #[test]
    fn test_same_day_trip() {
        let result = calculate_duration(
            make_datetime("2025-03-10", "08:00:00"),
            make_datetime("2025-03-10", "17:00:00"),
            1,
        )
        .unwrap();

        assert_eq!(result.duration.hours, dec("9"));
        assert_eq!(result.duration.calendar_days, 1);
        assert!(!result.duration.rolled_over);
    }

    #[test]
    fn test_fractional_hours() {
        let result = calculate_duration(
            make_datetime("2025-03-10", "08:15:00"),
            make_datetime("2025-03-10", "16:45:00"),
            1,
        )
        .unwrap();

        assert_eq!(result.duration.hours, dec("8.5"));
    }

    #[test]
    fn test_seconds_count_toward_hours() {
        let result = calculate_duration(
            make_datetime("2025-03-10", "08:00:00"),
            make_datetime("2025-03-10", "16:00:30"),
            1,
        )
        .unwrap();

        assert!(result.duration.hours > dec("8"));
        assert_eq!(result.duration.hours.round_dp(4), dec("8.0083"));
    }

    #[test]
    fn test_same_day_clock_wrap_rolls_over() {
        let result = calculate_duration(
            make_datetime("2025-03-10", "23:00:00"),
            make_datetime("2025-03-10", "02:00:00"),
            1,
        )
        .unwrap();

        assert_eq!(result.duration.hours, dec("3"));
        assert_eq!(result.duration.calendar_days, 2);
        assert_eq!(
            result.duration.effective_return,
            make_datetime("2025-03-11", "02:00:00")
        );
        assert!(result.duration.rolled_over);
    }

    #[test]
    fn test_earlier_date_is_rejected() {
        let departure = make_datetime("2025-03-10", "08:00:00");
        let return_at = make_datetime("2025-03-09", "17:00:00");

        match calculate_duration(departure, return_at, 1) {
            Err(EngineError::InvalidRange {
                departure: d,
                return_at: r,
            }) => {
                assert_eq!(d, departure);
                assert_eq!(r, return_at);
            }
            _ => panic!("Expected InvalidRange error"),
        }
    }

    #[test]
    fn test_zero_length_trip() {
        let at = make_datetime("2025-03-10", "08:00:00");
        let result = calculate_duration(at, at, 1).unwrap();

        assert_eq!(result.duration.hours, Decimal::ZERO);
        assert_eq!(result.duration.calendar_days, 1);
        assert!(!result.duration.rolled_over);
    }

    #[test]
    fn test_multi_day_counts_calendar_days() {
        let result = calculate_duration(
            make_datetime("2025-03-10", "06:00:00"),
            make_datetime("2025-03-12", "20:00:00"),
            1,
        )
        .unwrap();

        assert_eq!(result.duration.hours, dec("62"));
        assert_eq!(result.duration.calendar_days, 3);
    }

    #[test]
    fn test_audit_step_records_rollover() {
        let result = calculate_duration(
            make_datetime("2025-03-10", "22:30:00"),
            make_datetime("2025-03-10", "01:00:00"),
            4,
        )
        .unwrap();

        assert_eq!(result.audit_step.step_number, 4);
        assert_eq!(result.audit_step.rule_id, "trip_duration");
        assert_eq!(result.audit_step.output["rolled_over"], true);
        assert_eq!(result.audit_step.output["hours"], "2.5");
    }
}

//! Period aggregation.
//!
//! Trips enter a [`Period`] only after they are fully calculated, and the
//! period totals fold over the frozen results without recomputing them.

use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::config::RateTable;
use crate::error::{EngineError, EngineResult};
use crate::models::{ExportRow, Period, PeriodSummary, RecordedTrip, ReportingWindow, Trip};

use super::checked::checked_sum;
use super::trip_total::calculate_trip;

/// Calculates a trip and appends it to the period.
///
/// Nothing is appended if the calculation fails.
///
/// # Examples
///
/// ```no_run
/// use travel_allowance_engine::calculation::submit_trip;
/// use travel_allowance_engine::config::ConfigLoader;
/// use travel_allowance_engine::models::{Period, TripBuilder};
/// use chrono::NaiveDateTime;
///
/// let config = ConfigLoader::load("./config/at-2025").unwrap();
/// let trip = TripBuilder::new("trip_001")
///     .departure(NaiveDateTime::parse_from_str("2025-03-10 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap())
///     .return_at(NaiveDateTime::parse_from_str("2025-03-10 17:00:00", "%Y-%m-%d %H:%M:%S").unwrap())
///     .build()
///     .unwrap();
/// let table = config.rate_table_for(trip.departure.date()).unwrap();
///
/// let mut period = Period::new();
/// let entry_id = submit_trip(&mut period, trip, table).unwrap();
/// assert!(period.get(entry_id).is_some());
/// ```
pub fn submit_trip(period: &mut Period, trip: Trip, table: &RateTable) -> EngineResult<Uuid> {
    let result = calculate_trip(&trip, table)?;
    Ok(period.push(RecordedTrip::new(trip, result)))
}

/// Recalculates a corrected trip and swaps it in for an existing entry.
///
/// The entry keeps its ID and position. On error the period is unchanged.
/// Returns the entry that was replaced.
pub fn replace_trip(
    period: &mut Period,
    entry_id: Uuid,
    trip: Trip,
    table: &RateTable,
) -> EngineResult<RecordedTrip> {
    if period.get(entry_id).is_none() {
        return Err(EngineError::TripNotFound { entry_id });
    }
    let result = calculate_trip(&trip, table)?;
    period.replace(entry_id, RecordedTrip::new(trip, result))
}

/// Totals the trips whose departure falls within `window`.
///
/// # Errors
///
/// Returns [`EngineError::AmountOutOfRange`] if a running total exceeds the
/// decimal range.
pub fn summarize_period(period: &Period, window: &ReportingWindow) -> EngineResult<PeriodSummary> {
    let mut summary = PeriodSummary {
        window: *window,
        trip_count: 0,
        fallback_count: 0,
        meal_total: Decimal::ZERO,
        overnight_total: Decimal::ZERO,
        distance_total: Decimal::ZERO,
        expense_total: Decimal::ZERO,
        period_total: Decimal::ZERO,
        rows: Vec::new(),
    };

    for entry in period.in_window(window) {
        let result = &entry.result;
        summary.trip_count += 1;
        if result.jurisdiction_fallback {
            summary.fallback_count += 1;
        }
        summary.meal_total =
            checked_sum("meal_total", [summary.meal_total, result.meal_allowance])?;
        summary.overnight_total = checked_sum(
            "overnight_total",
            [summary.overnight_total, result.overnight_allowance],
        )?;
        summary.distance_total = checked_sum(
            "distance_total",
            [summary.distance_total, result.distance_allowance],
        )?;
        summary.expense_total = checked_sum(
            "expense_total",
            [summary.expense_total, result.expense_subtotal],
        )?;
        summary.period_total = checked_sum("period_total", [summary.period_total, result.total])?;
        summary.rows.push(ExportRow::from(entry));
    }

    debug!(
        start = %window.start,
        end = %window.end,
        trips = summary.trip_count,
        total = %summary.period_total,
        "Period summarized"
    );

    Ok(summary)
}

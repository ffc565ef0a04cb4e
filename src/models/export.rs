//! Flat export rows for spreadsheet output.
//!
//! [`ExportRow`] is the contract toward spreadsheet export: fixed snake_case
//! column names and plain string/number values only. Field order is column
//! order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Destination, RecordedTrip};
use crate::error::{EngineError, EngineResult};

/// One trip flattened for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    /// Period entry ID.
    pub entry_id: Uuid,
    /// Trip ID.
    pub trip_id: String,
    /// Departure month as `YYYY-MM`.
    pub month: String,
    /// Traveler name.
    pub traveler: String,
    /// Project name.
    pub project: String,
    /// "domestic" or "foreign".
    pub destination_kind: String,
    /// Country as entered; empty for domestic trips.
    pub country: String,
    /// Key of the applied jurisdiction.
    pub jurisdiction: String,
    /// Whether the fallback jurisdiction was applied.
    pub jurisdiction_fallback: bool,
    /// Place of departure.
    pub origin: String,
    /// Place of destination.
    pub destination: String,
    /// Intermediate stops, comma separated.
    pub stops: String,
    /// Departure timestamp.
    pub departure: String,
    /// Return timestamp as entered.
    #[serde(rename = "return")]
    pub return_at: String,
    /// Calendar days touched by the trip.
    pub calendar_days: u32,
    /// Duration in hours, rounded to two decimals.
    pub duration_hours: Decimal,
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
}

impl From<&RecordedTrip> for ExportRow {
    fn from(entry: &RecordedTrip) -> Self {
        let trip = &entry.trip;
        let result = &entry.result;
        let (destination_kind, country) = match &trip.destination {
            Destination::Domestic => ("domestic", String::new()),
            Destination::Foreign { country } => ("foreign", country.clone()),
        };

        ExportRow {
            entry_id: entry.entry_id,
            trip_id: trip.id.clone(),
            month: trip.departure.format("%Y-%m").to_string(),
            traveler: trip.details.traveler.clone(),
            project: trip.details.project.clone(),
            destination_kind: destination_kind.to_string(),
            country,
            jurisdiction: result.jurisdiction.clone(),
            jurisdiction_fallback: result.jurisdiction_fallback,
            origin: trip.details.origin.clone(),
            destination: trip.details.destination_place.clone(),
            stops: trip.details.stops.join(", "),
            departure: trip.departure.format("%Y-%m-%d %H:%M").to_string(),
            return_at: trip.return_at.format("%Y-%m-%d %H:%M").to_string(),
            calendar_days: result.calendar_days,
            duration_hours: result.duration_hours.round_dp(2),
            meal_allowance: result.meal_allowance,
            overnight_allowance: result.overnight_allowance,
            distance_allowance: result.distance_allowance,
            expense_subtotal: result.expense_subtotal,
            total: result.total,
        }
    }
}

/// Renders rows as CSV, header first.
///
/// The header is taken from the serde field names of the first row, so an
/// empty slice renders as an empty document.
pub(crate) fn write_csv(rows: &[ExportRow]) -> EngineResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(export_failed)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| export_failed(e.into_error()))?;
    String::from_utf8(bytes).map_err(export_failed)
}

fn export_failed(error: impl std::fmt::Display) -> EngineError {
    EngineError::ExportFailed {
        message: error.to_string(),
    }
}

//! Period and reporting window models.
//!
//! A [`Period`] is the session's ordered collection of recorded trips.
//! Windows such as a calendar month are applied on read; they never split
//! the collection.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::export::{ExportRow, write_csv};
use super::{Trip, TripResult};

/// An inclusive date range that selects trips by departure date.
///
/// # Example
///
/// ```
/// use travel_allowance_engine::models::ReportingWindow;
/// use chrono::NaiveDate;
///
/// let march = ReportingWindow::month(2025, 3).unwrap();
/// assert!(march.contains(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()));
/// assert!(!march.contains(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    /// First day of the window (inclusive).
    pub start: NaiveDate,
    /// Last day of the window (inclusive).
    pub end: NaiveDate,
}

impl ReportingWindow {
    /// Creates a window, rejecting one that ends before it starts.
    pub fn new(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        if end < start {
            return Err(EngineError::InvalidWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Creates the window covering one calendar month.
    pub fn month(year: i32, month: u32) -> EngineResult<Self> {
        let invalid = || EngineError::InvalidWindow {
            start: format!("{:04}-{:02}", year, month),
            end: format!("{:04}-{:02}", year, month),
        };
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(invalid)?;
        let end = next.pred_opt().ok_or_else(invalid)?;
        Ok(Self { start, end })
    }

    /// Checks if a date falls within the window (inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// A trip together with its frozen result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedTrip {
    /// Identifier of this entry within the period.
    pub entry_id: Uuid,
    /// The trip as submitted.
    pub trip: Trip,
    /// The result computed at submission.
    pub result: TripResult,
}

impl RecordedTrip {
    /// Pairs a trip with its computed result under a fresh entry ID.
    pub fn new(trip: Trip, result: TripResult) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            trip,
            result,
        }
    }
}

/// The ordered collection of recorded trips for one session.
///
/// Entries are only ever appended, removed, or replaced whole; an entry is
/// never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    entries: Vec<RecordedTrip>,
}

impl Period {
    /// Creates an empty period.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns its ID.
    pub fn push(&mut self, entry: RecordedTrip) -> Uuid {
        let id = entry.entry_id;
        self.entries.push(entry);
        id
    }

    /// Returns all entries in submission order.
    pub fn entries(&self) -> &[RecordedTrip] {
        &self.entries
    }

    /// Looks up an entry by ID.
    pub fn get(&self, entry_id: Uuid) -> Option<&RecordedTrip> {
        self.entries.iter().find(|e| e.entry_id == entry_id)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no trips have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes an entry, returning it.
    pub fn remove(&mut self, entry_id: Uuid) -> EngineResult<RecordedTrip> {
        let index = self.position(entry_id)?;
        Ok(self.entries.remove(index))
    }

    /// Swaps an entry for a replacement at the same position, returning the
    /// old entry. The replacement keeps the original entry ID.
    pub fn replace(
        &mut self,
        entry_id: Uuid,
        mut replacement: RecordedTrip,
    ) -> EngineResult<RecordedTrip> {
        let index = self.position(entry_id)?;
        replacement.entry_id = entry_id;
        Ok(std::mem::replace(&mut self.entries[index], replacement))
    }

    /// Iterates over entries whose departure falls within `window`.
    pub fn in_window<'a>(
        &'a self,
        window: &'a ReportingWindow,
    ) -> impl Iterator<Item = &'a RecordedTrip> + 'a {
        self.entries
            .iter()
            .filter(move |e| window.contains(e.trip.departure.date()))
    }

    /// Lists the calendar months that contain at least one departure,
    /// oldest first.
    pub fn reporting_months(&self) -> Vec<ReportingWindow> {
        let mut months: Vec<(i32, u32)> = self
            .entries
            .iter()
            .map(|e| (e.trip.departure.year(), e.trip.departure.month()))
            .collect();
        months.sort_unstable();
        months.dedup();
        months
            .into_iter()
            .filter_map(|(y, m)| ReportingWindow::month(y, m).ok())
            .collect()
    }

    fn position(&self, entry_id: Uuid) -> EngineResult<usize> {
        self.entries
            .iter()
            .position(|e| e.entry_id == entry_id)
            .ok_or(EngineError::TripNotFound { entry_id })
    }
}

/// Totals for the trips of one reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// The window that selected the trips.
    pub window: ReportingWindow,
    /// Number of trips in the window.
    pub trip_count: usize,
    /// Number of those trips that used the fallback jurisdiction.
    pub fallback_count: usize,
    /// Sum of meal allowances.
    pub meal_total: Decimal,
    /// Sum of overnight allowances.
    pub overnight_total: Decimal,
    /// Sum of vehicle reimbursements.
    pub distance_total: Decimal,
    /// Sum of ad-hoc expenses.
    pub expense_total: Decimal,
    /// Sum of trip totals.
    pub period_total: Decimal,
    /// One export row per trip, in submission order.
    pub rows: Vec<ExportRow>,
}

impl PeriodSummary {
    /// Renders the rows as CSV with a header line.
    ///
    /// # Errors
    ///
    /// Returns `ExportFailed` if the CSV writer rejects a row.
    pub fn to_csv(&self) -> EngineResult<String> {
        write_csv(&self.rows)
    }
}

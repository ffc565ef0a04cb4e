//! Core data models for the travel allowance engine.
//!
//! This module contains the trip, result, period, and export types used
//! throughout the engine.

mod export;
mod period;
mod trip;
mod trip_result;

pub use export::ExportRow;
pub use period::{Period, PeriodSummary, RecordedTrip, ReportingWindow};
pub use trip::{
    AdHocExpense, Destination, ExpenseCategory, Meal, MealsProvided, OvernightMode, Trip,
    TripBuilder, TripDetails,
};
pub use trip_result::{AuditStep, AuditTrace, AuditWarning, TripResult};

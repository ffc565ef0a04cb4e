//! Error types for the travel allowance engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while loading rate tables and
//! computing trip reimbursements.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the travel allowance engine.
///
/// Every engine error is local and recoverable: the caller re-prompts for
/// input or fixes the configuration. Nothing here is fatal to the process.
///
/// # Example
///
/// ```
/// use travel_allowance_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/schedule.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/schedule.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A rate table parsed but violates a structural rule.
    #[error("Invalid rate table effective {effective_date}: {message}")]
    InvalidRateTable {
        /// The effective date of the offending table.
        effective_date: NaiveDate,
        /// What is wrong with the table.
        message: String,
    },

    /// No rate table is effective on the requested date.
    #[error("No rate table effective on {date}")]
    RateTableNotFound {
        /// The date for which a table was requested.
        date: NaiveDate,
    },

    /// The return timestamp precedes departure beyond the one-day rollover.
    #[error("Return {return_at} precedes departure {departure}")]
    InvalidRange {
        /// The departure timestamp as entered.
        departure: NaiveDateTime,
        /// The return timestamp as entered.
        return_at: NaiveDateTime,
    },

    /// A quantity that must be non-negative was supplied as negative.
    #[error("Negative value for '{field}': {value}")]
    NegativeInput {
        /// The input field that was negative.
        field: String,
        /// The rejected value.
        value: Decimal,
    },

    /// An amount grew beyond what a decimal can represent.
    #[error("Amount for '{field}' is out of range")]
    AmountOutOfRange {
        /// The amount being computed when the overflow occurred.
        field: String,
    },

    /// Export rows could not be written.
    #[error("Failed to write export: {message}")]
    ExportFailed {
        /// A description of the writer error.
        message: String,
    },

    /// A trip could not be built from the supplied input.
    #[error("Invalid trip '{trip_id}': {message}")]
    InvalidTrip {
        /// The ID of the trip under construction.
        trip_id: String,
        /// A description of what is missing or inconsistent.
        message: String,
    },

    /// A reporting window is empty or malformed.
    #[error("Invalid reporting window {start} to {end}")]
    InvalidWindow {
        /// The requested start of the window.
        start: String,
        /// The requested end of the window.
        end: String,
    },

    /// A period entry referenced by ID does not exist.
    #[error("Trip entry not found: {entry_id}")]
    TripNotFound {
        /// The entry ID that was not found.
        entry_id: Uuid,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

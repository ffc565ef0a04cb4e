//! Request types for the travel allowance API.
//!
//! Counts arrive as signed integers so that a negative value reaches the
//! engine's validation and is reported as such, rather than failing JSON
//! deserialization.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Destination, ExpenseCategory, MealsProvided, OvernightMode, ReportingWindow, Trip,
    TripBuilder, TripDetails,
};

/// Request body for `/trips/calculate`, and one element of a period request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    /// Identifier of the trip.
    pub id: String,
    /// Where the trip goes.
    #[serde(default)]
    pub destination: Destination,
    /// Departure timestamp.
    pub departure: NaiveDateTime,
    /// Return timestamp.
    #[serde(rename = "return")]
    pub return_at: NaiveDateTime,
    /// Meals provided free of charge.
    #[serde(default)]
    pub meals_provided: MealsProvided,
    /// Kilometers driven in a private vehicle.
    #[serde(default)]
    pub distance_km: Decimal,
    /// Passengers carried.
    #[serde(default)]
    pub passenger_count: i64,
    /// Nights away from home.
    #[serde(default)]
    pub nights: i64,
    /// How lodging is reimbursed.
    #[serde(default)]
    pub overnight_mode: OvernightMode,
    /// Out-of-pocket expenses by category.
    #[serde(default)]
    pub expenses: BTreeMap<ExpenseCategory, ExpenseRequest>,
    /// Descriptive data.
    #[serde(default)]
    pub details: TripDetails,
}

/// One out-of-pocket expense in a trip request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRequest {
    /// The amount spent.
    pub amount: Decimal,
    /// Reference to a supporting document.
    #[serde(default)]
    pub document: Option<String>,
}

impl TryFrom<TripRequest> for Trip {
    type Error = EngineError;

    fn try_from(req: TripRequest) -> EngineResult<Self> {
        let builder = TripBuilder::new(req.id)
            .destination(req.destination)
            .departure(req.departure)
            .return_at(req.return_at)
            .meals(req.meals_provided)
            .distance_km(req.distance_km)
            .passengers(req.passenger_count)
            .nights(req.nights)
            .overnight(req.overnight_mode)
            .details(req.details);

        req.expenses
            .into_iter()
            .fold(builder, |builder, (category, expense)| {
                builder.expense(category, expense.amount, expense.document)
            })
            .build()
    }
}

/// The reporting window of a period request.
///
/// Either an explicit inclusive date range or a calendar month as `YYYY-MM`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindowRequest {
    /// An explicit inclusive range.
    Range {
        /// First day of the window.
        start: NaiveDate,
        /// Last day of the window.
        end: NaiveDate,
    },
    /// A calendar month.
    Month {
        /// The month as `YYYY-MM`.
        month: String,
    },
}

impl TryFrom<WindowRequest> for ReportingWindow {
    type Error = EngineError;

    fn try_from(req: WindowRequest) -> EngineResult<Self> {
        match req {
            WindowRequest::Range { start, end } => ReportingWindow::new(start, end),
            WindowRequest::Month { month } => {
                let invalid = || EngineError::InvalidWindow {
                    start: month.clone(),
                    end: month.clone(),
                };
                let (year, number) = month.split_once('-').ok_or_else(invalid)?;
                let year: i32 = year.parse().map_err(|_| invalid())?;
                let number: u32 = number.parse().map_err(|_| invalid())?;
                ReportingWindow::month(year, number)
            }
        }
    }
}

/// Request body for `/periods/summary` and `/periods/export`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodRequest {
    /// The window to total.
    pub window: WindowRequest,
    /// Trips in submission order.
    pub trips: Vec<TripRequest>,
}

/// Query parameters for `/rates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesQuery {
    /// The date whose effective table is requested.
    pub date: NaiveDate,
}
